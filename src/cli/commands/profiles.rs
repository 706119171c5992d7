use crate::browser::{ChromeInstallation, ChromeProfileResolver};
use crate::config::WrapperConfig;
use crate::error::Result;

pub fn execute(config: &WrapperConfig) -> Result<i32> {
    let installations = ChromeInstallation::from_settings(&config.browser);
    let resolver = ChromeProfileResolver::new(installations.clone());
    let profiles = resolver.discover();

    if profiles.is_empty() {
        println!("No signed-in browser profiles found. Searched:");
        for installation in &installations {
            println!("  {}", installation.user_data_dir.display());
        }
        return Ok(0);
    }

    println!("{:<16} {:<20} ACCOUNT", "BROWSER", "PROFILE");
    for (installation, profile) in profiles {
        let marker = match &config.profile_identifier {
            Some(identifier) if profile.matches(identifier) => " *",
            _ => "",
        };
        println!(
            "{:<16} {:<20} {}{}",
            installation.name,
            profile.directory_name(),
            profile.account_email,
            marker
        );
    }

    Ok(0)
}
