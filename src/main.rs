// aws-sso-wrapper - ensure an AWS SSO session, then run a command

mod auth;
mod aws_config;
mod browser;
mod cli;
mod config;
mod dispatch;
mod error;
mod expiry;
mod models;
mod process;

use clap::Parser;
use error::{Result, WrapperError};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("aws-sso-wrapper: {}", e);
            e.exit_code()
        }
    };

    std::process::exit(code);
}

async fn run() -> Result<i32> {
    // Started by the login flow as its BROWSER: open the URL and leave
    if let Some(launch) = browser::hook::pending_launch()? {
        init_tracing(false);
        let url = std::env::args().nth(1).unwrap_or_default();
        browser::hook::open_url(&launch, &url)?;
        return Ok(0);
    }

    let args = match cli::Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version print and exit 0; real usage errors exit 2
            let code = e.exit_code();
            e.print().map_err(WrapperError::Io)?;
            return Ok(code);
        }
    };

    init_tracing(args.verbose);

    cli::execute(args).await
}

/// Logs go to stderr; stdout belongs to the wrapped command
fn init_tracing(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
