use crate::application_port::ApiError;
use crate::domain_model::{BucketDetails, CreateBucketInput};

#[async_trait::async_trait]
pub trait BucketService: Send + Sync {
    async fn create_bucket(&self, input: CreateBucketInput) -> Result<BucketDetails, ApiError>;
    async fn find_bucket(&self, uid: &str) -> Result<BucketDetails, ApiError>;
    async fn list_buckets(&self) -> Result<Vec<BucketDetails>, ApiError>;
    async fn update_bucket(&self, uid: &str, input: CreateBucketInput) -> Result<String, ApiError>;
    async fn delete_bucket(&self, uid: &str) -> Result<(), ApiError>;
}
