// Browser profile resolution and the "open this URL" hook
mod chrome;
pub mod hook;

pub use chrome::{ChromeInstallation, ChromeProfileResolver};

use crate::error::Result;
use crate::models::LaunchCommand;

/// Maps a profile identifier (domain or email) to a launch command.
///
/// Implementations must fail with `WrapperError::ProfileNotFound` when
/// nothing matches and must not start any process while resolving.
#[cfg_attr(test, mockall::automock)]
pub trait ProfileLookup {
    fn resolve(&self, identifier: &str) -> Result<LaunchCommand>;
}
