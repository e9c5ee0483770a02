//! Client-side expiry check for access and refresh tokens.
//!
//! The payload is decoded WITHOUT verifying the signature. This check only
//! saves a round trip to the server; authorization is enforced server-side.
//!
//! Clock skew: the comparison uses the local wall clock. A client clock that
//! runs ahead of the server refreshes early, one that runs behind sends
//! tokens the server already considers expired. `leeway` shifts the
//! comparison forward to refresh a little before the real expiry.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: f64,
}

/// Reads the `exp` claim. `None` if the token is malformed or has no
/// numeric `exp`.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let header = decode_header(token).ok()?;
    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    let data = decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    let millis = data.claims.exp * 1000.0;
    if !millis.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}

/// `true` if the token is absent, undecodable, or `exp * 1000 <= now`.
pub fn is_expired_at(token: Option<&str>, now: DateTime<Utc>) -> bool {
    match token.and_then(expires_at) {
        Some(exp) => exp <= now,
        None => true,
    }
}

pub fn is_expired(token: Option<&str>) -> bool {
    is_expired_at(token, Utc::now())
}

/// Expiry check with a configurable safety margin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenValidator {
    leeway: Duration,
}

impl TokenValidator {
    pub fn new(leeway: std::time::Duration) -> Self {
        TokenValidator {
            leeway: Duration::from_std(leeway).unwrap_or(Duration::zero()),
        }
    }

    pub fn is_expired(&self, token: Option<&str>) -> bool {
        is_expired_at(token, Utc::now() + self.leeway)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
    }

    fn token_with_exp(exp: i64) -> String {
        let claims = Claims {
            sub: "user-1".to_owned(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"any-secret"),
        )
        .unwrap()
    }

    #[test]
    fn absent_token_is_expired() {
        assert!(is_expired(None));
    }

    #[test]
    fn malformed_token_is_expired() {
        assert!(is_expired(Some("")));
        assert!(is_expired(Some("not-a-jwt")));
        assert!(is_expired(Some("a.b.c")));
    }

    #[test]
    fn token_without_exp_is_expired() {
        #[derive(Serialize)]
        struct NoExp {
            sub: String,
        }
        let token = encode(
            &Header::default(),
            &NoExp {
                sub: "user-1".to_owned(),
            },
            &EncodingKey::from_secret(b"k"),
        )
        .unwrap();
        assert!(is_expired(Some(&token)));
    }

    #[test]
    fn future_exp_is_valid_and_past_exp_is_expired() {
        let now = Utc::now();
        let fresh = token_with_exp((now + Duration::minutes(15)).timestamp());
        let stale = token_with_exp((now - Duration::seconds(1)).timestamp());
        assert!(!is_expired_at(Some(&fresh), now));
        assert!(is_expired_at(Some(&stale), now));
    }

    #[test]
    fn exp_equal_to_now_is_expired() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let token = token_with_exp(1_700_000_000);
        assert!(is_expired_at(Some(&token), now));
        assert!(!is_expired_at(Some(&token), now - Duration::milliseconds(1)));
    }

    #[test]
    fn signature_is_not_checked() {
        let token = token_with_exp((Utc::now() + Duration::hours(1)).timestamp());
        let (unsigned, _) = token.rsplit_once('.').unwrap();
        let forged = format!("{unsigned}.c2lnbmF0dXJl");
        assert!(!is_expired(Some(&forged)));
    }

    #[test]
    fn leeway_expires_tokens_early() {
        let token = token_with_exp((Utc::now() + Duration::seconds(30)).timestamp());
        assert!(!TokenValidator::default().is_expired(Some(&token)));
        let cautious = TokenValidator::new(std::time::Duration::from_secs(60));
        assert!(cautious.is_expired(Some(&token)));
    }
}
