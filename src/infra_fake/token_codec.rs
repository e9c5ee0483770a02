use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

const FAKE_SIGNING_KEY: &[u8] = b"keeper-fake-signing-key";
const FAKE_ISSUER: &str = "keeper-fake";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FakeClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,
    pub kind: TokenKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FakeTokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
    #[error("failed to sign token: {0}")]
    Sign(String),
}

/// HS256 tokens with a fixed key, so tokens stay verifiable across
/// processes that use the fake backend.
#[derive(Debug, Clone, Default)]
pub struct FakeTokenCodec;

impl FakeTokenCodec {
    pub fn issue(
        &self,
        sub: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<(String, String, DateTime<Utc>), FakeTokenError> {
        let iat_dt = Utc::now();
        let exp_dt = iat_dt + ttl;
        let jti = uuid::Uuid::new_v4().to_string();
        let claims = FakeClaims {
            sub: sub.to_owned(),
            exp: exp_dt.timestamp(),
            iat: iat_dt.timestamp(),
            iss: FAKE_ISSUER.to_owned(),
            jti: jti.clone(),
            kind,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(FAKE_SIGNING_KEY),
        )
        .map_err(|e| FakeTokenError::Sign(e.to_string()))?;
        Ok((token, jti, exp_dt))
    }

    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<FakeClaims, FakeTokenError> {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = true;
        v.leeway = 0;
        v.set_issuer(&[FAKE_ISSUER]);
        let data = decode::<FakeClaims>(token, &DecodingKey::from_secret(FAKE_SIGNING_KEY), &v)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => FakeTokenError::Expired,
                _ => FakeTokenError::Invalid,
            })?;
        if data.claims.kind != kind {
            return Err(FakeTokenError::Invalid);
        }
        Ok(data.claims)
    }
}

/// A signed access token for `sub` expiring `ttl` from now. A negative `ttl`
/// yields an already expired token.
pub fn mint_token(sub: &str, ttl: Duration) -> String {
    FakeTokenCodec
        .issue(sub, TokenKind::Access, ttl)
        .map(|(token, _, _)| token)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_checks_kind_and_expiry() {
        let codec = FakeTokenCodec;
        let (access, _, _) = codec.issue("u1", TokenKind::Access, Duration::minutes(5)).unwrap();
        assert_eq!(codec.verify(&access, TokenKind::Access).unwrap().sub, "u1");
        assert_eq!(
            codec.verify(&access, TokenKind::Refresh).unwrap_err(),
            FakeTokenError::Invalid
        );

        let stale = mint_token("u1", Duration::seconds(-10));
        assert_eq!(
            codec.verify(&stale, TokenKind::Access).unwrap_err(),
            FakeTokenError::Expired
        );
    }
}
