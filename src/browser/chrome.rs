use super::ProfileLookup;
use crate::config::BrowserSettings;
use crate::error::{Result, WrapperError};
use crate::models::{BrowserProfile, LaunchCommand};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// A Chrome-family install: where its profiles live and how to launch it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromeInstallation {
    pub name: String,
    pub user_data_dir: PathBuf,
    pub program: String,
    /// Arguments placed before `--profile-directory=...`
    pub args: Vec<String>,
}

impl ChromeInstallation {
    /// Launch command for one profile directory of this installation
    pub fn launch_command(&self, profile: &BrowserProfile) -> LaunchCommand {
        let mut args = self.args.clone();
        args.push(format!("--profile-directory={}", profile.directory_name()));
        LaunchCommand::new(self.program.clone(), args)
    }

    /// Standard install locations for the current platform
    pub fn platform_defaults() -> Vec<Self> {
        let mut installations = Vec::new();

        #[cfg(target_os = "macos")]
        {
            if let Some(home) = dirs::home_dir() {
                installations.push(Self {
                    name: "Google Chrome".to_string(),
                    user_data_dir: home.join("Library/Application Support/Google/Chrome"),
                    program: "open".to_string(),
                    args: vec![
                        "-na".to_string(),
                        "Google Chrome".to_string(),
                        "--args".to_string(),
                    ],
                });
            }
        }

        #[cfg(all(unix, not(target_os = "macos")))]
        {
            if let Some(config) = dirs::config_dir() {
                installations.push(Self {
                    name: "Google Chrome".to_string(),
                    user_data_dir: config.join("google-chrome"),
                    program: "google-chrome".to_string(),
                    args: Vec::new(),
                });
                installations.push(Self {
                    name: "Chromium".to_string(),
                    user_data_dir: config.join("chromium"),
                    program: "chromium".to_string(),
                    args: Vec::new(),
                });
            }
        }

        #[cfg(windows)]
        {
            if let Some(local) = dirs::data_local_dir() {
                let program_files = std::env::var("ProgramFiles")
                    .unwrap_or_else(|_| r"C:\Program Files".to_string());
                installations.push(Self {
                    name: "Google Chrome".to_string(),
                    user_data_dir: local.join("Google").join("Chrome").join("User Data"),
                    program: format!(r"{}\Google\Chrome\Application\chrome.exe", program_files),
                    args: Vec::new(),
                });
            }
        }

        installations
    }

    /// Installations to scan, honouring a `[browser]` override
    pub fn from_settings(settings: &BrowserSettings) -> Vec<Self> {
        let Some(user_data_dir) = &settings.user_data_dir else {
            return Self::platform_defaults();
        };

        let program = settings.program.clone().unwrap_or_else(|| {
            Self::platform_defaults()
                .into_iter()
                .next()
                .map(|installation| installation.program)
                .unwrap_or_else(|| "google-chrome".to_string())
        });

        vec![Self {
            name: "Custom".to_string(),
            user_data_dir: user_data_dir.clone(),
            program,
            args: settings.args.clone(),
        }]
    }
}

/// Finds browser profiles by scanning Chrome `Preferences` files
pub struct ChromeProfileResolver {
    installations: Vec<ChromeInstallation>,
}

impl ChromeProfileResolver {
    pub fn new(installations: Vec<ChromeInstallation>) -> Self {
        Self { installations }
    }

    /// Every (installation, profile) pair with a signed-in account.
    ///
    /// Installations are visited in order, profile directories in sorted
    /// name order, so the first match for an identifier is stable.
    pub fn discover(&self) -> Vec<(&ChromeInstallation, BrowserProfile)> {
        let mut found = Vec::new();

        for installation in &self.installations {
            let root = &installation.user_data_dir;
            let entries = match fs::read_dir(root) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::debug!("Skipping {} ({}): {}", installation.name, root.display(), e);
                    continue;
                }
            };

            let mut profile_dirs: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_dir())
                .collect();
            profile_dirs.sort();

            for profile_dir in profile_dirs {
                let prefs_file = profile_dir.join("Preferences");
                if !prefs_file.is_file() {
                    continue;
                }

                for email in read_account_emails(&prefs_file) {
                    found.push((
                        installation,
                        BrowserProfile::new(&installation.name, profile_dir.clone(), &email),
                    ));
                }
            }
        }

        found
    }

    fn searched_locations(&self) -> String {
        if self.installations.is_empty() {
            return "no known browser locations".to_string();
        }
        self.installations
            .iter()
            .map(|installation| installation.user_data_dir.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl ProfileLookup for ChromeProfileResolver {
    fn resolve(&self, identifier: &str) -> Result<LaunchCommand> {
        let matched = self
            .discover()
            .into_iter()
            .find(|(_, profile)| profile.matches(identifier));

        match matched {
            Some((installation, profile)) => {
                tracing::info!(
                    "Using {} profile '{}' ({}) for '{}'",
                    profile.browser,
                    profile.directory_name(),
                    profile.account_email,
                    identifier
                );
                Ok(installation.launch_command(&profile))
            }
            None => Err(WrapperError::ProfileNotFound {
                identifier: identifier.to_string(),
                searched: self.searched_locations(),
            }),
        }
    }
}

/// Account emails recorded in a profile's `Preferences`, deduplicated,
/// signed-in accounts first. Unreadable or malformed files yield nothing.
fn read_account_emails(prefs_file: &Path) -> Vec<String> {
    let prefs: Value = match fs::read_to_string(prefs_file)
        .ok()
        .and_then(|contents| serde_json::from_str(&contents).ok())
    {
        Some(prefs) => prefs,
        None => {
            tracing::debug!("Skipping unreadable preferences {}", prefs_file.display());
            return Vec::new();
        }
    };

    let mut emails: Vec<String> = Vec::new();
    let mut push = |candidate: Option<&str>| {
        if let Some(email) = candidate.map(str::trim).filter(|e| e.contains('@')) {
            if !emails.iter().any(|known| known.eq_ignore_ascii_case(email)) {
                emails.push(email.to_string());
            }
        }
    };

    if let Some(accounts) = prefs.get("account_info").and_then(Value::as_array) {
        for account in accounts {
            push(account.get("email").and_then(Value::as_str));
        }
    }

    push(prefs.pointer("/google/services/last_username").and_then(Value::as_str));
    push(prefs.pointer("/signin/last_username").and_then(Value::as_str));
    push(prefs.pointer("/signin/username").and_then(Value::as_str));

    emails
}
