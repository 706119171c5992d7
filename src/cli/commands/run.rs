use crate::auth::current_hook_program;
use crate::browser::{ChromeInstallation, ChromeProfileResolver};
use crate::config::WrapperConfig;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::process::SystemRunner;

pub async fn execute(config: WrapperConfig, command: Vec<String>) -> Result<i32> {
    let resolver = ChromeProfileResolver::new(ChromeInstallation::from_settings(&config.browser));
    let dispatcher = Dispatcher::new(config, resolver, SystemRunner, current_hook_program()?);

    dispatcher.run(&command).await
}
