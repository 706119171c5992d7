use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which kind of cache record a token was read from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// SSO-OIDC access token (`accessToken` / `expiresAt`)
    SsoAccessToken,
    /// Temporary role credentials (`Credentials.Expiration`)
    RoleCredentials,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::SsoAccessToken => "sso-token",
            TokenKind::RoleCredentials => "role-credentials",
        }
    }
}

/// A record from the SSO cache. Read-only: the login flow owns these files.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub kind: TokenKind,
    pub expires_at: DateTime<Utc>,
    pub start_url: Option<String>,
    /// File the record was read from
    pub source: PathBuf,
}

impl CachedToken {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn expires_in_seconds(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }

    pub fn expires_in_minutes(&self) -> i64 {
        self.expires_in_seconds() / 60
    }

    /// Format expiration time as human-readable string
    pub fn expiration_display(&self) -> String {
        let mins = self.expires_in_minutes();

        if mins >= 60 {
            let hours = mins / 60;
            let remaining_mins = mins % 60;
            if remaining_mins > 0 {
                format!("{}h {}m", hours, remaining_mins)
            } else {
                format!("{}h", hours)
            }
        } else if mins > 0 {
            format!("{} minutes", mins)
        } else {
            "EXPIRED".to_string()
        }
    }
}

/// A signed-in account found in a browser profile directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProfile {
    /// Installation the profile belongs to (e.g. "Google Chrome")
    pub browser: String,
    pub directory_path: PathBuf,
    pub account_email: String,
    pub account_domain: String,
}

impl BrowserProfile {
    pub fn new(browser: &str, directory_path: PathBuf, account_email: &str) -> Self {
        let account_domain = account_email
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_ascii_lowercase())
            .unwrap_or_default();

        Self {
            browser: browser.to_string(),
            directory_path,
            account_email: account_email.to_string(),
            account_domain,
        }
    }

    /// Profile directory name as Chrome expects it for `--profile-directory`
    pub fn directory_name(&self) -> String {
        self.directory_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Exact email match or `@domain` suffix match, both case-insensitive
    pub fn matches(&self, identifier: &str) -> bool {
        let identifier = identifier.trim().to_ascii_lowercase();
        if identifier.is_empty() {
            return false;
        }

        self.account_email.to_ascii_lowercase() == identifier || self.account_domain == identifier
    }
}

/// Invocation that opens a URL in one browser profile's isolated session.
/// The URL is appended as the final argument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Full argument list for opening `url`
    pub fn args_for(&self, url: &str) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(url.to_string());
        args
    }

    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
