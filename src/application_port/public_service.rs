use crate::application_port::ApiError;
use crate::domain_model::{ApiKeyPermission, BucketPermission};

/// Endpoints that need no credentials.
#[async_trait::async_trait]
pub trait PublicService: Send + Sync {
    async fn api_key_permissions(&self) -> Result<Vec<ApiKeyPermission>, ApiError>;
    async fn bucket_permissions(&self) -> Result<Vec<BucketPermission>, ApiError>;
}
