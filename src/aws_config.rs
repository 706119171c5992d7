// Read-only access to the SSO settings in the AWS config file
use crate::error::{Result, WrapperError};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// SSO settings for one AWS profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoSettings {
    pub start_url: String,
    pub region: Option<String>,
    /// Set when the profile uses the `[sso-session name]` format
    pub session_name: Option<String>,
}

type Sections = HashMap<String, HashMap<String, String>>;

/// Look up the SSO settings `profile` uses in the config file at `path`.
///
/// Returns `Ok(None)` when the file is missing, the profile is absent, or it
/// has no SSO settings.
pub fn read_sso_settings(path: &Path, profile: &str) -> Result<Option<SsoSettings>> {
    if !path.exists() {
        tracing::debug!("AWS config file {} does not exist", path.display());
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        WrapperError::ConfigError(format!(
            "Failed to read AWS config file {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(sso_settings_from_str(&content, profile))
}

fn sso_settings_from_str(content: &str, profile: &str) -> Option<SsoSettings> {
    let sections = parse_sections(content);
    let section = profile_section(&sections, profile)?;

    // Legacy format: everything lives in the profile section
    if let Some(start_url) = section.get("sso_start_url") {
        return Some(SsoSettings {
            start_url: start_url.clone(),
            region: section.get("sso_region").cloned(),
            session_name: None,
        });
    }

    let session_name = section.get("sso_session")?;
    let session = sections.get(&format!("sso-session {}", session_name))?;
    Some(SsoSettings {
        start_url: session.get("sso_start_url")?.clone(),
        region: session.get("sso_region").cloned(),
        session_name: Some(session_name.clone()),
    })
}

/// `[default]` is preferred for the default profile, `[profile default]` is also accepted
fn profile_section<'s>(sections: &'s Sections, profile: &str) -> Option<&'s HashMap<String, String>> {
    let qualified = sections.get(&format!("profile {}", profile));
    if profile == "default" {
        sections.get("default").or(qualified)
    } else {
        qualified
    }
}

/// Section name (whitespace-normalised) to its key/value pairs
fn parse_sections(content: &str) -> Sections {
    let mut sections = Sections::new();
    let mut current_section: Option<String> = None;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            let name = trimmed[1..trimmed.len() - 1]
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            sections.entry(name.clone()).or_default();
            current_section = Some(name);
        } else if let Some(section) = &current_section {
            if let Some(eq_pos) = trimmed.find('=') {
                let key = trimmed[..eq_pos].trim().to_string();
                let value = trimmed[eq_pos + 1..].trim().to_string();
                if let Some(values) = sections.get_mut(section) {
                    values.insert(key, value);
                }
            }
        }
    }

    sections
}
