use crate::domain_model::{AccessToken, CredentialPair, RefreshToken};

/// Durable holder of the two token classes.
///
/// Reads never fail: a missing, expired or unreadable entry is `None`.
/// Mutations take effect in memory before they are persisted, so a read
/// right after a write observes it even when persisting failed.
pub trait CredentialStore: Send + Sync {
    fn get_access(&self) -> Option<AccessToken>;
    fn get_refresh(&self) -> Option<RefreshToken>;
    fn set_access(&self, token: &AccessToken) -> Result<(), CredentialStoreError>;
    fn set_refresh(&self, token: &RefreshToken) -> Result<(), CredentialStoreError>;
    fn clear_access(&self) -> Result<(), CredentialStoreError>;
    fn clear_refresh(&self) -> Result<(), CredentialStoreError>;

    fn snapshot(&self) -> CredentialPair {
        CredentialPair {
            access_token: self.get_access(),
            refresh_token: self.get_refresh(),
        }
    }

    /// Clears both slots. Both are attempted even if the first one fails.
    fn clear_all(&self) -> Result<(), CredentialStoreError> {
        let access = self.clear_access();
        let refresh = self.clear_refresh();
        access.and(refresh)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    #[error("failed to persist credentials to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode credentials: {0}")]
    Encode(#[from] serde_json::Error),
}
