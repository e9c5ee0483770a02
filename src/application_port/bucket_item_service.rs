use crate::application_port::ApiError;
use crate::domain_model::{BucketItem, BucketItemInput, PageQuery, PaginatedEnvelope};

pub type BucketItemPage = PaginatedEnvelope<Vec<BucketItem>>;

#[async_trait::async_trait]
pub trait BucketItemService: Send + Sync {
    async fn create_item(&self, bucket_uid: &str, input: BucketItemInput)
    -> Result<BucketItem, ApiError>;
    async fn list_items(&self, bucket_uid: &str, page: PageQuery)
    -> Result<BucketItemPage, ApiError>;
    async fn find_item(&self, bucket_uid: &str, key: &str) -> Result<BucketItem, ApiError>;
    async fn update_item(
        &self,
        bucket_uid: &str,
        key: &str,
        input: BucketItemInput,
    ) -> Result<String, ApiError>;
    async fn delete_item(&self, bucket_uid: &str, key: &str) -> Result<(), ApiError>;
}
