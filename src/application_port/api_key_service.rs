use crate::application_port::ApiError;
use crate::domain_model::{ApiKey, ApiKeyInput, CreatedApiKey};

#[async_trait::async_trait]
pub trait ApiKeyService: Send + Sync {
    async fn create_api_key(&self, input: ApiKeyInput) -> Result<CreatedApiKey, ApiError>;
    async fn find_api_key(&self, id: &str) -> Result<ApiKey, ApiError>;
    async fn list_api_keys(&self) -> Result<Vec<ApiKey>, ApiError>;
    async fn update_api_key(&self, id: &str, input: ApiKeyInput) -> Result<String, ApiError>;
    async fn delete_api_key(&self, id: &str) -> Result<(), ApiError>;
    async fn revoke_api_key(&self, id: &str) -> Result<(), ApiError>;
    async fn delete_api_keys(&self, ids: Vec<String>) -> Result<(), ApiError>;
    async fn revoke_api_keys(&self, ids: Vec<String>) -> Result<(), ApiError>;
}
