mod pipeline;
mod refresh_coordinator;
mod token_validity;

pub use pipeline::*;
pub use refresh_coordinator::*;
pub use token_validity::*;

use crate::domain_port::CredentialStore;

/// Whether the stored credentials amount to a session for routing purposes:
/// a usable access token, or a refresh token that has not expired by its own
/// `exp` claim.
pub fn session_present(credentials: &dyn CredentialStore, validator: &TokenValidator) -> bool {
    let pair = credentials.snapshot();
    let access_valid = pair
        .access_token
        .as_ref()
        .is_some_and(|t| !validator.is_expired(Some(t.as_str())));
    let refresh_valid = pair
        .refresh_token
        .as_ref()
        .is_some_and(|t| !is_expired(Some(t.as_str())));
    access_valid || refresh_valid
}
