use crate::domain_model::{AccessToken, CredentialPair, RefreshToken};
use crate::domain_port::{CredentialStore, CredentialStoreError};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Process-local credentials; gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    pair: Mutex<CredentialPair>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CredentialPair> {
        self.pair.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get_access(&self) -> Option<AccessToken> {
        self.lock().access_token.clone()
    }

    fn get_refresh(&self) -> Option<RefreshToken> {
        self.lock().refresh_token.clone()
    }

    fn set_access(&self, token: &AccessToken) -> Result<(), CredentialStoreError> {
        self.lock().access_token = Some(token.clone());
        Ok(())
    }

    fn set_refresh(&self, token: &RefreshToken) -> Result<(), CredentialStoreError> {
        self.lock().refresh_token = Some(token.clone());
        Ok(())
    }

    fn clear_access(&self) -> Result<(), CredentialStoreError> {
        self.lock().access_token = None;
        Ok(())
    }

    fn clear_refresh(&self) -> Result<(), CredentialStoreError> {
        self.lock().refresh_token = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_clear() {
        let store = MemoryCredentialStore::new();
        assert!(store.snapshot().is_empty());

        store.set_access(&AccessToken::new("a1")).unwrap();
        store.set_refresh(&RefreshToken::new("r1")).unwrap();
        assert_eq!(store.get_access(), Some(AccessToken::new("a1")));
        assert_eq!(store.get_refresh(), Some(RefreshToken::new("r1")));

        store.clear_access().unwrap();
        assert_eq!(store.get_access(), None);
        assert_eq!(store.get_refresh(), Some(RefreshToken::new("r1")));

        store.clear_all().unwrap();
        assert!(store.snapshot().is_empty());
    }
}
