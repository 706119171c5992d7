use std::path::PathBuf;
use thiserror::Error;

/// Bad configuration: unreadable or malformed config, missing SSO settings
pub const EXIT_CONFIG: i32 = 80;
/// No browser profile matched the configured identifier
pub const EXIT_PROFILE_NOT_FOUND: i32 = 81;
/// The external SSO login flow exited non-zero
pub const EXIT_LOGIN_FAILED: i32 = 82;
/// Login completed but the cache still holds no usable credentials
pub const EXIT_STILL_INVALID: i32 = 83;
pub const EXIT_NOT_EXECUTABLE: i32 = 126;
pub const EXIT_NOT_FOUND: i32 = 127;
pub const EXIT_INTERRUPTED: i32 = 130;
pub const EXIT_USAGE: i32 = 2;

#[derive(Error, Debug)]
pub enum WrapperError {
    #[error("{0}")]
    Usage(String),

    #[error(
        "No browser profile found for '{identifier}' (searched: {searched}). \
         Sign in to Chrome with an account matching '{identifier}', set CHROME_PROFILE_IDENTIFIER \
         to a domain or email of an existing profile, or run with --list-browser-profiles"
    )]
    ProfileNotFound { identifier: String, searched: String },

    #[error("SSO login failed ({status}){}", format_diagnostics(.diagnostics))]
    LoginFailed { status: String, diagnostics: String },

    #[error(
        "SSO credentials are still invalid after a successful login. \
         Check that {cache_dir} is the cache the login flow writes to and that the system clock is correct"
    )]
    StillInvalidAfterLogin { cache_dir: PathBuf },

    #[error("Invalid SSO configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Interrupted")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_diagnostics(diagnostics: &str) -> String {
    let trimmed = diagnostics.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(":\n{}", trimmed)
    }
}

impl WrapperError {
    /// Process exit code reported for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            WrapperError::Usage(_) => EXIT_USAGE,
            WrapperError::ProfileNotFound { .. } => EXIT_PROFILE_NOT_FOUND,
            WrapperError::LoginFailed { .. } => EXIT_LOGIN_FAILED,
            WrapperError::StillInvalidAfterLogin { .. } => EXIT_STILL_INVALID,
            WrapperError::Spawn { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => EXIT_NOT_FOUND,
                _ => EXIT_NOT_EXECUTABLE,
            },
            WrapperError::Interrupted => EXIT_INTERRUPTED,
            WrapperError::InvalidConfig(_)
            | WrapperError::ConfigError(_)
            | WrapperError::Io(_)
            | WrapperError::Json(_) => EXIT_CONFIG,
        }
    }
}

pub type Result<T> = std::result::Result<T, WrapperError>;
