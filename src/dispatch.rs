// Runs the wrapped command once SSO credentials are usable
use crate::auth::{LoginOrchestrator, TokenCache};
use crate::browser::ProfileLookup;
use crate::config::WrapperConfig;
use crate::error::{Result, WrapperError};
use crate::expiry;
use crate::process::{ProcessRunner, ProcessSpec};
use chrono::Utc;
use std::path::PathBuf;

pub struct Dispatcher<L, R> {
    config: WrapperConfig,
    cache: TokenCache,
    lookup: L,
    runner: R,
    hook_program: PathBuf,
}

impl<L: ProfileLookup, R: ProcessRunner> Dispatcher<L, R> {
    pub fn new(config: WrapperConfig, lookup: L, runner: R, hook_program: PathBuf) -> Self {
        let cache = TokenCache::new(config.sso_cache_dir.clone());
        Self {
            config,
            cache,
            lookup,
            runner,
            hook_program,
        }
    }

    /// Whether the cache currently holds a usable token
    pub fn credentials_valid(&self) -> Result<bool> {
        let tokens = self.cache.read_tokens()?;
        let now = Utc::now();

        let valid = expiry::is_valid(&tokens, now, self.config.safety_margin);
        if let Some(token) = expiry::freshest(&tokens, now, self.config.safety_margin) {
            tracing::debug!(
                "Cached {} from {} valid for {}",
                token.kind.as_str(),
                token.source.display(),
                expiry::format_time_remaining(&token.expires_at, now)
            );
        }
        Ok(valid)
    }

    /// Ensure credentials, then run `command` with inherited stdio.
    /// Returns the exit code to leave with.
    pub async fn run(&self, command: &[String]) -> Result<i32> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| WrapperError::Usage("No command specified".to_string()))?;

        if self.credentials_valid()? {
            tracing::debug!("SSO credentials valid, skipping login");
        } else {
            tracing::info!("SSO credentials missing or expired, logging in");
            LoginOrchestrator::new(&self.lookup, &self.runner, &self.config, &self.hook_program)
                .ensure_login(self.config.profile_identifier.as_deref())
                .await?;

            if !self.credentials_valid()? {
                return Err(WrapperError::StillInvalidAfterLogin {
                    cache_dir: self.cache.cache_dir().to_path_buf(),
                });
            }
        }

        let outcome = self
            .runner
            .run(&ProcessSpec::passthrough(program, args))
            .await?;
        Ok(outcome.exit_code())
    }
}
