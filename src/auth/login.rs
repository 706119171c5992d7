use crate::aws_config::read_sso_settings;
use crate::browser::{hook, ProfileLookup};
use crate::config::WrapperConfig;
use crate::error::{Result, WrapperError};
use crate::process::{ProcessRunner, ProcessSpec};
use std::path::{Path, PathBuf};

/// Drives the external `aws sso login` flow
pub struct LoginOrchestrator<'a, L, R> {
    lookup: &'a L,
    runner: &'a R,
    config: &'a WrapperConfig,
    /// Executable the login flow runs to open URLs (normally this binary)
    hook_program: &'a Path,
}

impl<'a, L: ProfileLookup, R: ProcessRunner> LoginOrchestrator<'a, L, R> {
    pub fn new(lookup: &'a L, runner: &'a R, config: &'a WrapperConfig, hook_program: &'a Path) -> Self {
        Self {
            lookup,
            runner,
            config,
            hook_program,
        }
    }

    /// Run the login flow once, opening the browser through the profile
    /// matching `identifier` (or the system default when `None`).
    ///
    /// Blocks until the login subprocess exits; there is no timeout.
    pub async fn ensure_login(&self, identifier: Option<&str>) -> Result<()> {
        let launch = match identifier {
            Some(identifier) => Some(self.lookup.resolve(identifier)?),
            None => {
                tracing::info!("No browser profile identifier configured, using the default browser");
                None
            }
        };

        let settings = read_sso_settings(&self.config.config_file, &self.config.aws_profile)?
            .ok_or_else(|| {
                WrapperError::InvalidConfig(format!(
                    "No SSO start URL found for profile '{}' in {}",
                    self.config.aws_profile,
                    self.config.config_file.display()
                ))
            })?;
        tracing::debug!(
            "SSO start URL {} in {} (session: {})",
            settings.start_url,
            settings.region.as_deref().unwrap_or("default region"),
            settings.session_name.as_deref().unwrap_or("legacy")
        );

        let mut env = vec![
            ("AWS_PROFILE".to_string(), self.config.aws_profile.clone()),
            (
                "AWS_CONFIG_FILE".to_string(),
                self.config.config_file.display().to_string(),
            ),
        ];
        if let Some(launch) = &launch {
            env.extend(hook::hook_environment(self.hook_program, launch)?);
        }

        let (program, args) = self
            .config
            .login_command
            .split_first()
            .ok_or_else(|| WrapperError::ConfigError("Login command is empty".to_string()))?;

        let spec = ProcessSpec {
            program: program.clone(),
            args: args.to_vec(),
            env,
            capture_stderr: true,
        };

        tracing::info!("Starting SSO login: {}", self.config.login_command.join(" "));
        let outcome = match self.runner.run(&spec).await {
            Ok(outcome) => outcome,
            Err(WrapperError::Spawn { program, source }) => {
                return Err(WrapperError::LoginFailed {
                    status: "could not start".to_string(),
                    diagnostics: format!("Failed to run '{}': {}", program, source),
                })
            }
            Err(e) => return Err(e),
        };

        if !outcome.success() && outcome.interrupted {
            return Err(WrapperError::Interrupted);
        }

        if !outcome.success() {
            return Err(WrapperError::LoginFailed {
                status: outcome.describe(),
                diagnostics: outcome.stderr,
            });
        }

        // Successful logins may still warn on stderr; pass it on.
        if !outcome.stderr.trim().is_empty() {
            eprint!("{}", outcome.stderr);
        }

        tracing::info!("SSO login completed");
        Ok(())
    }
}

/// The executable to register as the login flow's browser
pub fn current_hook_program() -> Result<PathBuf> {
    Ok(std::env::current_exe()?)
}
