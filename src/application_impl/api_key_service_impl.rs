use crate::application_port::{ApiError, ApiKeyService};
use crate::domain_model::{ApiKey, ApiKeyIds, ApiKeyInput, CreatedApiKey};
use crate::domain_port::{ApiRequest, api_path};
use crate::session::AuthenticatedClient;
use std::sync::Arc;

pub struct RealApiKeyService {
    client: Arc<AuthenticatedClient>,
}

impl RealApiKeyService {
    pub fn new(client: Arc<AuthenticatedClient>) -> RealApiKeyService {
        RealApiKeyService { client }
    }
}

#[async_trait::async_trait]
impl ApiKeyService for RealApiKeyService {
    async fn create_api_key(&self, input: ApiKeyInput) -> Result<CreatedApiKey, ApiError> {
        let request = ApiRequest::post("/api_key").json(&input)?;
        self.client.data(request).await
    }

    async fn find_api_key(&self, id: &str) -> Result<ApiKey, ApiError> {
        self.client.data(ApiRequest::get(api_path(&["api_key", id]))).await
    }

    async fn list_api_keys(&self) -> Result<Vec<ApiKey>, ApiError> {
        let keys: Option<Vec<ApiKey>> =
            self.client.fetch(ApiRequest::get("/api_keys")).await?.data;
        Ok(keys.unwrap_or_default())
    }

    async fn update_api_key(&self, id: &str, input: ApiKeyInput) -> Result<String, ApiError> {
        let request = ApiRequest::put(api_path(&["api_key", id])).json(&input)?;
        self.client.message(request).await
    }

    async fn delete_api_key(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .message(ApiRequest::delete(api_path(&["api_key", id])))
            .await?;
        Ok(())
    }

    async fn revoke_api_key(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .message(ApiRequest::put(api_path(&["api_key", id, "revoke"])))
            .await?;
        Ok(())
    }

    async fn delete_api_keys(&self, ids: Vec<String>) -> Result<(), ApiError> {
        let request = ApiRequest::delete("/api_keys").json(&ApiKeyIds { ids })?;
        self.client.message(request).await?;
        Ok(())
    }

    async fn revoke_api_keys(&self, ids: Vec<String>) -> Result<(), ApiError> {
        let request = ApiRequest::put("/api_keys/revoke").json(&ApiKeyIds { ids })?;
        self.client.message(request).await?;
        Ok(())
    }
}
