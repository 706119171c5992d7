// Credential validity decisions
use crate::models::CachedToken;
use chrono::{DateTime, Duration, Utc};

/// Tokens this close to expiry count as expired, so the wrapped command
/// does not start with credentials that lapse mid-call.
pub const DEFAULT_SAFETY_MARGIN_SECONDS: i64 = 60;

/// True iff some token expires strictly after `now + margin`.
pub fn is_valid(tokens: &[CachedToken], now: DateTime<Utc>, margin: Duration) -> bool {
    freshest(tokens, now, margin).is_some()
}

/// The usable token that expires last, if any
pub fn freshest(tokens: &[CachedToken], now: DateTime<Utc>, margin: Duration) -> Option<&CachedToken> {
    let threshold = now.checked_add_signed(margin)?;
    tokens
        .iter()
        .filter(|token| token.expires_at > threshold)
        .max_by_key(|token| token.expires_at)
}

pub fn format_time_remaining(expires_at: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    if *expires_at <= now {
        return "EXPIRED".to_string();
    }

    let duration = (*expires_at - now).num_seconds();
    let hours = duration / 3600;
    let minutes = (duration % 3600) / 60;
    let seconds = duration % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
