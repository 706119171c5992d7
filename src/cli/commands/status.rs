use crate::auth::TokenCache;
use crate::config::WrapperConfig;
use crate::error::Result;
use crate::expiry;
use chrono::Utc;
use serde_json::json;

/// Report cache validity. Exit code 0 when valid, 1 otherwise.
pub fn execute(config: &WrapperConfig, json: bool) -> Result<i32> {
    let cache = TokenCache::new(config.sso_cache_dir.clone());
    let tokens = cache.read_tokens()?;
    let now = Utc::now();

    match expiry::freshest(&tokens, now, config.safety_margin) {
        Some(token) => {
            if json {
                println!(
                    "{}",
                    json!({
                        "active": true,
                        "kind": token.kind,
                        "expires_at": token.expires_at,
                        "expires_in_minutes": token.expires_in_minutes(),
                        "start_url": token.start_url,
                    })
                );
            } else {
                println!(
                    "SSO session active (expires in {}, {})",
                    token.expiration_display(),
                    token.kind.as_str()
                );
            }
            Ok(0)
        }
        None => {
            let reason = if tokens.is_empty() {
                "no_session"
            } else if tokens.iter().all(|token| token.is_expired()) {
                "expired"
            } else {
                "expiring"
            };
            if json {
                println!("{}", json!({ "active": false, "reason": reason }));
            } else {
                match reason {
                    "no_session" => {
                        println!("No SSO session found in {}", cache.cache_dir().display())
                    }
                    "expired" => println!("SSO session expired"),
                    _ => println!(
                        "SSO session expires within {}s",
                        config.safety_margin.num_seconds()
                    ),
                }
            }
            Ok(1)
        }
    }
}
