// CLI interface
pub mod commands;

use crate::config::{ConfigOverrides, WrapperConfig};
use crate::error::{Result, WrapperError};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0         wrapped command succeeded
  <n>       wrapped command's own exit code, unchanged
  2         usage error
  80        configuration error
  81        no browser profile matches CHROME_PROFILE_IDENTIFIER
  82        SSO login failed
  83        credentials still invalid after a successful login
  126/127   wrapped command not executable / not found
  130       interrupted";

#[derive(Parser, Debug)]
#[command(name = "aws-sso-wrapper")]
#[command(
    about = "Ensure a valid AWS SSO session, logging in through a chosen Chrome profile, then run a command",
    long_about = None
)]
#[command(version)]
#[command(override_usage = "aws-sso-wrapper [OPTIONS] -- <COMMAND> [ARGS]...")]
#[command(after_help = EXIT_CODES_HELP)]
pub struct Cli {
    /// Domain or email selecting the Chrome profile used for login
    #[arg(long, env = "CHROME_PROFILE_IDENTIFIER", value_name = "DOMAIN|EMAIL")]
    pub profile_identifier: Option<String>,

    /// AWS config file holding the SSO settings
    #[arg(long, env = "AWS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// AWS profile to log in with
    #[arg(long, env = "AWS_PROFILE", value_name = "NAME")]
    pub aws_profile: Option<String>,

    /// SSO cache root (tokens are read from <PATH>/cache)
    #[arg(long, env = "AWS_SSO_CACHE_PATH", value_name = "PATH")]
    pub sso_cache_path: Option<PathBuf>,

    /// AWS CLI cache root (tokens are read from <PATH>/sso/cache)
    #[arg(long, env = "AWS_CLI_CACHE_DIR", value_name = "PATH")]
    pub cli_cache_dir: Option<PathBuf>,

    /// Report whether cached SSO credentials are valid, then exit
    #[arg(long, conflicts_with_all = ["list_browser_profiles", "completions", "command"])]
    pub status: bool,

    /// Output --status as JSON
    #[arg(long, requires = "status")]
    pub json: bool,

    /// List discovered browser profiles and their accounts, then exit
    #[arg(long, conflicts_with_all = ["completions", "command"])]
    pub list_browser_profiles: bool,

    /// Print a shell completion script, then exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Enable verbose/debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to run once credentials are valid (after --)
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Cli {
    fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            profile_identifier: self.profile_identifier.clone(),
            config_file: self.config_file.clone(),
            aws_profile: self.aws_profile.clone(),
            sso_cache_path: self.sso_cache_path.clone(),
            cli_cache_dir: self.cli_cache_dir.clone(),
        }
    }
}

/// Run the selected mode and return the process exit code
pub async fn execute(args: Cli) -> Result<i32> {
    if let Some(shell) = args.completions {
        commands::completions::execute(shell);
        return Ok(0);
    }

    if args.command.is_empty() && !args.status && !args.list_browser_profiles {
        return Err(WrapperError::Usage(
            "No command specified. Usage: aws-sso-wrapper [OPTIONS] -- <COMMAND> [ARGS]...".to_string(),
        ));
    }

    let config = WrapperConfig::load(args.config_overrides())?;

    if args.status {
        return commands::status::execute(&config, args.json);
    }

    if args.list_browser_profiles {
        return commands::profiles::execute(&config);
    }

    commands::run::execute(config, args.command).await
}
