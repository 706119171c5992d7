// SSO session: cache inspection and the external login flow
mod login;
mod token_cache;

pub use login::{current_hook_program, LoginOrchestrator};
pub use token_cache::TokenCache;
