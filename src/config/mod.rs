// Configuration management
use crate::error::{Result, WrapperError};
use crate::expiry::DEFAULT_SAFETY_MARGIN_SECONDS;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_LOGIN_COMMAND: &str = "aws sso login";
/// Upper bound for `validity.margin_seconds` (one day)
const MAX_MARGIN_SECONDS: i64 = 86_400;

/// Optional `config.toml` contents
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    pub profile_identifier: Option<String>,
    #[serde(default)]
    pub login: LoginSettings,
    #[serde(default)]
    pub validity: ValiditySettings,
    #[serde(default)]
    pub browser: BrowserSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoginSettings {
    /// Shell-style command line, e.g. "aws sso login --sso-session corp"
    pub command: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValiditySettings {
    #[serde(default = "default_margin_seconds")]
    pub margin_seconds: i64,
}

fn default_margin_seconds() -> i64 {
    DEFAULT_SAFETY_MARGIN_SECONDS
}

impl Default for ValiditySettings {
    fn default() -> Self {
        Self {
            margin_seconds: default_margin_seconds(),
        }
    }
}

/// Overrides which Chrome-family installation is scanned and launched
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BrowserSettings {
    pub user_data_dir: Option<PathBuf>,
    pub program: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Values taken from the command line or the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub profile_identifier: Option<String>,
    pub config_file: Option<PathBuf>,
    pub aws_profile: Option<String>,
    pub sso_cache_path: Option<PathBuf>,
    pub cli_cache_dir: Option<PathBuf>,
}

/// Everything a run needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct WrapperConfig {
    pub profile_identifier: Option<String>,
    /// AWS config file read for SSO settings
    pub config_file: PathBuf,
    pub aws_profile: String,
    pub sso_cache_dir: PathBuf,
    pub login_command: Vec<String>,
    pub safety_margin: Duration,
    pub browser: BrowserSettings,
}

impl WrapperConfig {
    /// Layer overrides over the config file over defaults
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            WrapperError::ConfigError("Could not determine home directory".to_string())
        })?;
        let file = FileConfig::load()?;
        Self::resolve(overrides, file, &home)
    }

    pub fn resolve(overrides: ConfigOverrides, file: FileConfig, home: &Path) -> Result<Self> {
        let profile_identifier = non_empty(overrides.profile_identifier)
            .or_else(|| non_empty(file.profile_identifier));

        let config_file = overrides
            .config_file
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| home.join(".aws").join("config"));

        let aws_profile =
            non_empty(overrides.aws_profile).unwrap_or_else(|| "default".to_string());

        let sso_cache_dir = sso_cache_dir(
            overrides.sso_cache_path.as_deref(),
            overrides.cli_cache_dir.as_deref(),
            home,
        );

        let command_line = file
            .login
            .command
            .as_deref()
            .unwrap_or(DEFAULT_LOGIN_COMMAND);
        let login_command = shlex::split(command_line)
            .filter(|parts| !parts.is_empty())
            .ok_or_else(|| {
                WrapperError::ConfigError(format!("Invalid login command: '{}'", command_line))
            })?;

        let margin_seconds = file.validity.margin_seconds;
        if !(0..=MAX_MARGIN_SECONDS).contains(&margin_seconds) {
            return Err(WrapperError::ConfigError(format!(
                "validity.margin_seconds must be between 0 and {} (got {})",
                MAX_MARGIN_SECONDS, margin_seconds
            )));
        }
        let safety_margin = Duration::try_seconds(margin_seconds).ok_or_else(|| {
            WrapperError::ConfigError(format!(
                "validity.margin_seconds is out of range (got {})",
                margin_seconds
            ))
        })?;

        Ok(Self {
            profile_identifier,
            config_file,
            aws_profile,
            sso_cache_dir,
            login_command,
            safety_margin,
            browser: file.browser,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// SSO token cache location
///
/// Priority:
/// 1. AWS_SSO_CACHE_PATH/cache
/// 2. AWS_CLI_CACHE_DIR/sso/cache
/// 3. ~/.aws/sso/cache
pub fn sso_cache_dir(sso_cache_path: Option<&Path>, cli_cache_dir: Option<&Path>, home: &Path) -> PathBuf {
    if let Some(path) = sso_cache_path.filter(|p| !p.as_os_str().is_empty()) {
        return path.join("cache");
    }
    if let Some(path) = cli_cache_dir.filter(|p| !p.as_os_str().is_empty()) {
        return path.join("sso").join("cache");
    }
    home.join(".aws").join("sso").join("cache")
}

impl FileConfig {
    /// Get the config directory path
    ///
    /// Priority:
    /// 1. XDG_CONFIG_HOME/aws-sso-wrapper (if env var is set)
    /// 2. ~/.config/aws-sso-wrapper (if ~/.config exists)
    /// 3. ~/.aws-sso-wrapper (fallback on Unix, doesn't create ~/.config)
    /// 4. Platform default on Windows
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            if !xdg_config.is_empty() {
                return Ok(PathBuf::from(xdg_config).join("aws-sso-wrapper"));
            }
        }

        #[cfg(unix)]
        {
            if let Some(home_dir) = dirs::home_dir() {
                let xdg_config = home_dir.join(".config");

                if xdg_config.exists() {
                    return Ok(xdg_config.join("aws-sso-wrapper"));
                }

                return Ok(home_dir.join(".aws-sso-wrapper"));
            }
        }

        #[cfg(not(unix))]
        {
            if let Some(config_dir) = dirs::config_dir() {
                return Ok(config_dir.join("aws-sso-wrapper"));
            }
        }

        Err(WrapperError::ConfigError(
            "Could not determine config directory".to_string(),
        ))
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the config file, or defaults when it does not exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        tracing::debug!("Loading config from: {}", config_path.display());
        let contents = fs::read_to_string(config_path)
            .map_err(|e| WrapperError::ConfigError(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents).map_err(|e| {
            WrapperError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                config_path.display(),
                e
            ))
        })
    }
}
