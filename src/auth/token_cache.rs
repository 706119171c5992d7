use crate::error::Result;
use crate::models::{CachedToken, TokenKind};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Read-only view of the AWS CLI v2 SSO cache (~/.aws/sso/cache by default)
pub struct TokenCache {
    cache_dir: PathBuf,
}

/// SSO-OIDC token record written by `aws sso login`
#[derive(Deserialize)]
struct SsoTokenRecord {
    #[serde(rename = "accessToken")]
    #[allow(dead_code)]
    access_token: String,
    #[serde(rename = "expiresAt")]
    expires_at: String,
    #[serde(rename = "startUrl", default)]
    start_url: Option<String>,
}

#[derive(Deserialize)]
struct RoleCredentialsRecord {
    #[serde(rename = "Credentials")]
    credentials: RoleCredentialsBody,
}

#[derive(Deserialize)]
struct RoleCredentialsBody {
    #[serde(rename = "Expiration")]
    expiration: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CacheRecord {
    SsoToken(SsoTokenRecord),
    RoleCredentials(RoleCredentialsRecord),
}

impl TokenCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// All well-formed records, in file-name order. Malformed files are skipped.
    pub fn read_tokens(&self) -> Result<Vec<CachedToken>> {
        let mut tokens = Vec::new();

        if !self.cache_dir.is_dir() {
            tracing::debug!("SSO cache {} does not exist", self.cache_dir.display());
            return Ok(tokens);
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.cache_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        paths.sort();

        for path in paths {
            let contents = match fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(e) => {
                    tracing::debug!("Skipping unreadable cache file {}: {}", path.display(), e);
                    continue;
                }
            };

            match parse_record(&contents, &path) {
                Some(token) => tokens.push(token),
                None => tracing::debug!("Skipping unrecognised cache file {}", path.display()),
            }
        }

        tracing::debug!(
            "Read {} cached token(s) from {}",
            tokens.len(),
            self.cache_dir.display()
        );
        Ok(tokens)
    }
}

fn parse_record(contents: &str, path: &Path) -> Option<CachedToken> {
    let record: CacheRecord = serde_json::from_str(contents).ok()?;

    let (kind, expires_at, start_url) = match record {
        CacheRecord::SsoToken(token) => (
            TokenKind::SsoAccessToken,
            parse_timestamp(&token.expires_at)?,
            token.start_url,
        ),
        CacheRecord::RoleCredentials(record) => (
            TokenKind::RoleCredentials,
            parse_timestamp(&record.credentials.expiration)?,
            None,
        ),
    };

    Some(CachedToken {
        kind,
        expires_at,
        start_url,
        source: path.to_path_buf(),
    })
}

/// Parse the timestamp flavours found in AWS caches:
/// RFC 3339, `2024-01-15T12:00:00Z`, `2024-01-15T12:00:00UTC`, and naive UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = value
        .strip_suffix("UTC")
        .or_else(|| value.strip_suffix('Z'))
        .unwrap_or(value)
        .trim_end();

    NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc())
}
