use crate::application_port::{ApiError, ApiKeyService};
use crate::domain_model::{ApiKey, ApiKeyInput, CreatedApiKey};
use crate::domain_port::Notifier;
use crate::store::report;
use std::sync::Arc;
use tokio::sync::watch;

/// API keys of the signed-in user. A freshly created key stays "active"
/// until cleared, since its raw value is never shown again.
pub struct ApiKeyStore {
    service: Arc<dyn ApiKeyService>,
    notifier: Arc<dyn Notifier>,
    keys: watch::Sender<Vec<ApiKey>>,
    loading: watch::Sender<bool>,
    active: watch::Sender<Option<CreatedApiKey>>,
}

impl ApiKeyStore {
    pub fn new(service: Arc<dyn ApiKeyService>, notifier: Arc<dyn Notifier>) -> Self {
        ApiKeyStore {
            service,
            notifier,
            keys: watch::channel(Vec::new()).0,
            loading: watch::channel(false).0,
            active: watch::channel(None).0,
        }
    }

    pub fn api_keys(&self) -> Vec<ApiKey> {
        self.keys.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ApiKey>> {
        self.keys.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn apikey(&self, id: &str) -> Option<ApiKey> {
        self.keys.borrow().iter().find(|k| k.id == id).cloned()
    }

    pub fn active_key_id(&self) -> Option<String> {
        self.active.borrow().as_ref().map(|k| k.id.clone())
    }

    pub fn active_key(&self) -> Option<CreatedApiKey> {
        self.active.borrow().clone()
    }

    pub fn clear_active_key(&self) {
        self.active.send_replace(None);
    }

    pub async fn fetch_api_keys(&self) -> Result<Vec<ApiKey>, ApiError> {
        self.loading.send_replace(true);
        let result = self.service.list_api_keys().await;
        match &result {
            Ok(keys) => {
                self.keys.send_replace(keys.clone());
            }
            Err(e) => {
                report(&*self.notifier, "fetch api keys", e);
                self.keys.send_replace(Vec::new());
            }
        }
        self.loading.send_replace(false);
        result
    }

    pub async fn fetch_api_key(&self, id: &str) -> Result<ApiKey, ApiError> {
        let key = self
            .service
            .find_api_key(id)
            .await
            .inspect_err(|e| report(&*self.notifier, "fetch api key", e))?;
        self.keys.send_modify(|keys| match keys.iter_mut().find(|k| k.id == id) {
            Some(slot) => *slot = key.clone(),
            None => keys.push(key.clone()),
        });
        Ok(key)
    }

    pub async fn create_api_key(&self, input: ApiKeyInput) -> Result<CreatedApiKey, ApiError> {
        let created = self
            .service
            .create_api_key(input)
            .await
            .inspect_err(|e| report(&*self.notifier, "create api key", e))?;
        self.notifier.success("Successfully created API key.");
        self.active.send_replace(Some(created.clone()));
        let _ = self.fetch_api_keys().await;
        Ok(created)
    }

    pub async fn update_api_key(&self, id: &str, input: ApiKeyInput) -> Result<(), ApiError> {
        self.service
            .update_api_key(id, input)
            .await
            .inspect_err(|e| report(&*self.notifier, "update api key", e))?;
        self.notifier.success("Successfully updated API key.");
        let _ = self.fetch_api_keys().await;
        Ok(())
    }

    pub async fn delete_api_key(&self, id: &str) -> Result<(), ApiError> {
        self.service
            .delete_api_key(id)
            .await
            .inspect_err(|e| report(&*self.notifier, "delete api key", e))?;
        self.notifier.success("API Key Deleted Successfully! 🎉");
        self.forget_active(&[id]);
        let _ = self.fetch_api_keys().await;
        Ok(())
    }

    pub async fn revoke_api_key(&self, id: &str) -> Result<(), ApiError> {
        self.service
            .revoke_api_key(id)
            .await
            .inspect_err(|e| report(&*self.notifier, "revoke api key", e))?;
        self.notifier.success("Successfully revoked API key.");
        let _ = self.fetch_api_keys().await;
        Ok(())
    }

    pub async fn delete_api_keys(&self, ids: Vec<String>) -> Result<(), ApiError> {
        let removed = ids.clone();
        self.service
            .delete_api_keys(ids)
            .await
            .inspect_err(|e| report(&*self.notifier, "delete api keys", e))?;
        self.notifier.success("API Keys Deleted Successfully! 🎉");
        self.forget_active(&removed);
        let _ = self.fetch_api_keys().await;
        Ok(())
    }

    pub async fn revoke_api_keys(&self, ids: Vec<String>) -> Result<(), ApiError> {
        self.service
            .revoke_api_keys(ids)
            .await
            .inspect_err(|e| report(&*self.notifier, "revoke api keys", e))?;
        self.notifier.success("Successfully revoked API keys.");
        let _ = self.fetch_api_keys().await;
        Ok(())
    }

    fn forget_active<S: AsRef<str>>(&self, ids: &[S]) {
        self.active.send_if_modified(|active| {
            let gone = active
                .as_ref()
                .is_some_and(|k| ids.iter().any(|id| id.as_ref() == k.id));
            if gone {
                *active = None;
            }
            gone
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::domain_model::{ApiKeyInput, ApiKeyPermission};
    use crate::store::test_support::signed_in;
    use chrono::{Duration, Utc};

    fn input(name: &str) -> ApiKeyInput {
        ApiKeyInput {
            name: name.to_owned(),
            key_type: None,
            role: None,
            permissions: vec![ApiKeyPermission::ReadBucket],
            expires_at: Utc::now() + Duration::days(30),
        }
    }

    #[tokio::test]
    async fn created_key_becomes_active() {
        let h = signed_in().await;
        let keys = &h.client.api_keys;
        let created = keys.create_api_key(input("ci")).await.unwrap();

        assert_eq!(keys.active_key_id(), Some(created.id.clone()));
        assert!(created.key.starts_with("kp_"));
        assert_eq!(keys.apikey(&created.id).unwrap().name, "ci");

        keys.delete_api_key(&created.id).await.unwrap();
        assert!(keys.active_key().is_none());
        assert!(keys.api_keys().is_empty());
    }

    #[tokio::test]
    async fn bulk_revoke_and_delete() {
        let h = signed_in().await;
        let keys = &h.client.api_keys;
        let a = keys.create_api_key(input("a")).await.unwrap();
        let b = keys.create_api_key(input("b")).await.unwrap();

        keys.revoke_api_keys(vec![a.id.clone(), b.id.clone()])
            .await
            .unwrap();
        assert!(keys.api_keys().iter().all(|k| k.revoked));

        keys.delete_api_keys(vec![a.id, b.id]).await.unwrap();
        assert!(keys.api_keys().is_empty());
    }

    #[tokio::test]
    async fn empty_bulk_request_is_rejected_once() {
        let h = signed_in().await;
        assert!(h.client.api_keys.delete_api_keys(Vec::new()).await.is_err());
        assert_eq!(h.notifier.notifications().len(), 1);
    }
}
