//! The binary doubles as the `BROWSER` program for the login subprocess.
//!
//! The login flow is started with `BROWSER` pointing at this executable and
//! the resolved launch command serialized into [`LAUNCH_ENV`]. When the flow
//! wants a URL opened it runs `<this exe> <url>`, and `main` dispatches here
//! instead of parsing the normal command line.

use crate::error::{Result, WrapperError};
use crate::models::LaunchCommand;
use std::path::Path;
use std::process::{Command, Stdio};

/// Carries the JSON-encoded launch command into the browser hook
pub const LAUNCH_ENV: &str = "AWS_SSO_WRAPPER_LAUNCH";

/// Environment overrides that route "open this URL" through `hook_program`
pub fn hook_environment(hook_program: &Path, launch: &LaunchCommand) -> Result<Vec<(String, String)>> {
    Ok(vec![
        ("BROWSER".to_string(), hook_program.display().to_string()),
        (LAUNCH_ENV.to_string(), serde_json::to_string(launch)?),
    ])
}

/// Launch command handed to us by a parent wrapper, if we are running as its hook
pub fn pending_launch() -> Result<Option<LaunchCommand>> {
    match std::env::var(LAUNCH_ENV) {
        Ok(encoded) if !encoded.trim().is_empty() => Ok(Some(decode(&encoded)?)),
        _ => Ok(None),
    }
}

fn decode(encoded: &str) -> Result<LaunchCommand> {
    serde_json::from_str(encoded).map_err(|e| {
        WrapperError::ConfigError(format!("Malformed {} value: {}", LAUNCH_ENV, e))
    })
}

/// Open `url` with the launch command. Does not wait for the browser.
///
/// The browser must not inherit our stderr, which is the login flow's
/// captured pipe; the wrapper reads that pipe until every holder closes it.
pub fn open_url(launch: &LaunchCommand, url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(WrapperError::Usage(
            "browser hook invoked without a URL".to_string(),
        ));
    }

    tracing::info!("Opening {} with {}", url, launch.display());
    Command::new(&launch.program)
        .args(launch.args_for(url))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| WrapperError::Spawn {
            program: launch.program.clone(),
            source,
        })?;

    Ok(())
}
