//! Credentials held in a cookie jar, the way a browser keeps them.
//!
//! Each token class is its own cookie with its own expiry horizon. That
//! horizon is independent of the token's `exp` claim: a cookie past its
//! horizon reads as absent even when the token inside is still valid.

use crate::domain_model::{AccessToken, RefreshToken};
use crate::domain_port::{CredentialStore, CredentialStoreError};
use crate::infra_storage::persist::{read_if_exists, remove_if_exists, write_atomically};
use cookie::{Cookie, CookieJar, SameSite};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::warn;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// 15 minutes.
pub const DEFAULT_ACCESS_COOKIE_TTL: Duration = Duration::from_secs(15 * 60);
/// Two years.
pub const DEFAULT_REFRESH_COOKIE_TTL: Duration = Duration::from_secs(2 * 365 * 24 * 60 * 60);

pub struct CookieCredentialStore {
    jar: Mutex<CookieJar>,
    access_ttl: time::Duration,
    refresh_ttl: time::Duration,
    /// Where the jar is saved as `Set-Cookie` lines, if anywhere.
    path: Option<PathBuf>,
}

impl CookieCredentialStore {
    pub fn new(access_ttl: Duration, refresh_ttl: Duration) -> Self {
        CookieCredentialStore {
            jar: Mutex::new(CookieJar::new()),
            access_ttl: to_time(access_ttl),
            refresh_ttl: to_time(refresh_ttl),
            path: None,
        }
    }

    /// A jar saved to `path` after every change and restored from it here.
    pub fn persistent(access_ttl: Duration, refresh_ttl: Duration, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut jar = CookieJar::new();
        if let Some(bytes) = read_if_exists(&path) {
            match serde_json::from_slice::<Vec<String>>(&bytes) {
                Ok(lines) => {
                    for line in lines {
                        match Cookie::parse(line) {
                            Ok(cookie) => jar.add_original(cookie),
                            Err(e) => warn!(error = %e, "skipping unparsable cookie"),
                        }
                    }
                }
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring corrupt cookie file"),
            }
        }
        CookieCredentialStore {
            jar: Mutex::new(jar),
            access_ttl: to_time(access_ttl),
            refresh_ttl: to_time(refresh_ttl),
            path: Some(path),
        }
    }

    /// The live cookie named `name`, with all its attributes.
    pub fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        let jar = self.lock();
        live(&jar, name).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, CookieJar> {
        self.jar.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn value(&self, name: &str) -> Option<String> {
        self.cookie(name).map(|c| c.value().to_owned())
    }

    fn set(&self, name: &'static str, value: &str, ttl: time::Duration) -> Result<(), CredentialStoreError> {
        let cookie = Cookie::build((name, value.to_owned()))
            .path("/")
            .secure(true)
            .same_site(SameSite::Strict)
            .expires(OffsetDateTime::now_utc() + ttl)
            .build();
        let mut jar = self.lock();
        jar.add(cookie);
        self.save(&jar)
    }

    fn remove(&self, name: &'static str) -> Result<(), CredentialStoreError> {
        let mut jar = self.lock();
        jar.remove(Cookie::build(name).path("/"));
        self.save(&jar)
    }

    fn save(&self, jar: &CookieJar) -> Result<(), CredentialStoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let lines: Vec<String> = jar.iter().map(|c| c.to_string()).collect();
        if lines.is_empty() {
            return remove_if_exists(path);
        }
        write_atomically(path, &serde_json::to_vec(&lines)?)
    }
}

impl Default for CookieCredentialStore {
    fn default() -> Self {
        CookieCredentialStore::new(DEFAULT_ACCESS_COOKIE_TTL, DEFAULT_REFRESH_COOKIE_TTL)
    }
}

impl CredentialStore for CookieCredentialStore {
    fn get_access(&self) -> Option<AccessToken> {
        self.value(ACCESS_TOKEN_COOKIE).map(AccessToken)
    }

    fn get_refresh(&self) -> Option<RefreshToken> {
        self.value(REFRESH_TOKEN_COOKIE).map(RefreshToken)
    }

    fn set_access(&self, token: &AccessToken) -> Result<(), CredentialStoreError> {
        self.set(ACCESS_TOKEN_COOKIE, token.as_str(), self.access_ttl)
    }

    fn set_refresh(&self, token: &RefreshToken) -> Result<(), CredentialStoreError> {
        self.set(REFRESH_TOKEN_COOKIE, token.as_str(), self.refresh_ttl)
    }

    fn clear_access(&self) -> Result<(), CredentialStoreError> {
        self.remove(ACCESS_TOKEN_COOKIE)
    }

    fn clear_refresh(&self) -> Result<(), CredentialStoreError> {
        self.remove(REFRESH_TOKEN_COOKIE)
    }
}

// A cookie without an expiry lives for the session, i.e. this process.
fn live<'a>(jar: &'a CookieJar, name: &str) -> Option<&'a Cookie<'static>> {
    let cookie = jar.get(name)?;
    match cookie.expires_datetime() {
        Some(expires) if expires <= OffsetDateTime::now_utc() => None,
        _ => Some(cookie),
    }
}

fn to_time(ttl: Duration) -> time::Duration {
    time::Duration::try_from(ttl).unwrap_or(time::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_fake::mint_token;

    #[test]
    fn round_trip_with_browser_flags() {
        let store = CookieCredentialStore::default();
        store.set_access(&AccessToken::new("a1")).unwrap();
        assert_eq!(store.get_access(), Some(AccessToken::new("a1")));

        let cookie = store.cookie(ACCESS_TOKEN_COOKIE).unwrap();
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        let horizon = cookie.expires_datetime().unwrap() - OffsetDateTime::now_utc();
        assert!(horizon <= time::Duration::minutes(15));
        assert!(horizon > time::Duration::minutes(14));

        store.clear_access().unwrap();
        assert_eq!(store.get_access(), None);
    }

    #[test]
    fn refresh_cookie_has_long_horizon() {
        let store = CookieCredentialStore::default();
        store.set_refresh(&RefreshToken::new("r1")).unwrap();
        let cookie = store.cookie(REFRESH_TOKEN_COOKIE).unwrap();
        let horizon = cookie.expires_datetime().unwrap() - OffsetDateTime::now_utc();
        assert!(horizon > time::Duration::days(700));
    }

    #[test]
    fn expired_cookie_reads_absent_even_with_valid_token() {
        let store = CookieCredentialStore::new(Duration::ZERO, DEFAULT_REFRESH_COOKIE_TTL);
        let token = mint_token("user-1", chrono::Duration::hours(1));
        store.set_access(&AccessToken::new(token)).unwrap();
        assert_eq!(store.get_access(), None);
    }

    #[test]
    fn persistent_jar_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        let store = CookieCredentialStore::persistent(
            DEFAULT_ACCESS_COOKIE_TTL,
            DEFAULT_REFRESH_COOKIE_TTL,
            &path,
        );
        store.set_access(&AccessToken::new("a1")).unwrap();
        store.set_refresh(&RefreshToken::new("r1")).unwrap();

        let reopened = CookieCredentialStore::persistent(
            DEFAULT_ACCESS_COOKIE_TTL,
            DEFAULT_REFRESH_COOKIE_TTL,
            &path,
        );
        assert_eq!(reopened.get_access(), Some(AccessToken::new("a1")));
        assert_eq!(reopened.get_refresh(), Some(RefreshToken::new("r1")));
        assert_eq!(
            reopened.cookie(REFRESH_TOKEN_COOKIE).unwrap().same_site(),
            Some(SameSite::Strict)
        );

        reopened.clear_all().unwrap();
        assert!(reopened.snapshot().is_empty());
        assert!(!path.exists());
        let emptied = CookieCredentialStore::persistent(
            DEFAULT_ACCESS_COOKIE_TTL,
            DEFAULT_REFRESH_COOKIE_TTL,
            &path,
        );
        assert!(emptied.snapshot().is_empty());
    }
}
