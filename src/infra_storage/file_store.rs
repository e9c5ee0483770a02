use crate::domain_model::{AccessToken, CredentialPair, RefreshToken};
use crate::domain_port::{CredentialStore, CredentialStoreError};
use crate::infra_storage::persist::{read_if_exists, remove_if_exists, write_atomically};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCredentials {
    #[serde(rename = "accessToken", default, skip_serializing_if = "Option::is_none")]
    access_token: Option<AccessToken>,
    #[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<RefreshToken>,
}

/// Persistent key-value storage in a JSON file. Entries have no expiry of
/// their own; validity is governed by the tokens' `exp` claims alone.
pub struct FileCredentialStore {
    path: PathBuf,
    pair: Mutex<CredentialPair>,
}

impl FileCredentialStore {
    /// Loads whatever `path` holds. A missing or corrupt file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stored = read_if_exists(&path)
            .and_then(|bytes| match serde_json::from_slice::<StoredCredentials>(&bytes) {
                Ok(stored) => Some(stored),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring corrupt credential file");
                    None
                }
            })
            .unwrap_or_default();
        FileCredentialStore {
            path,
            pair: Mutex::new(CredentialPair {
                access_token: stored.access_token,
                refresh_token: stored.refresh_token,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, CredentialPair> {
        self.pair.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, apply: impl FnOnce(&mut CredentialPair)) -> Result<(), CredentialStoreError> {
        let mut pair = self.lock();
        apply(&mut pair);
        if pair.is_empty() {
            return remove_if_exists(&self.path);
        }
        let stored = StoredCredentials {
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
        };
        write_atomically(&self.path, &serde_json::to_vec(&stored)?)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get_access(&self) -> Option<AccessToken> {
        self.lock().access_token.clone()
    }

    fn get_refresh(&self) -> Option<RefreshToken> {
        self.lock().refresh_token.clone()
    }

    fn set_access(&self, token: &AccessToken) -> Result<(), CredentialStoreError> {
        self.update(|pair| pair.access_token = Some(token.clone()))
    }

    fn set_refresh(&self, token: &RefreshToken) -> Result<(), CredentialStoreError> {
        self.update(|pair| pair.refresh_token = Some(token.clone()))
    }

    fn clear_access(&self) -> Result<(), CredentialStoreError> {
        self.update(|pair| pair.access_token = None)
    }

    fn clear_refresh(&self) -> Result<(), CredentialStoreError> {
        self.update(|pair| pair.refresh_token = None)
    }
}
