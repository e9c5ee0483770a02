use crate::application_port::{ApiError, BucketItemPage, BucketItemService};
use crate::domain_model::{BucketItem, BucketItemInput, PageQuery};
use crate::domain_port::{ApiRequest, api_path};
use crate::session::AuthenticatedClient;
use std::sync::Arc;

pub struct RealBucketItemService {
    client: Arc<AuthenticatedClient>,
}

impl RealBucketItemService {
    pub fn new(client: Arc<AuthenticatedClient>) -> RealBucketItemService {
        RealBucketItemService { client }
    }
}

#[async_trait::async_trait]
impl BucketItemService for RealBucketItemService {
    async fn create_item(
        &self,
        bucket_uid: &str,
        input: BucketItemInput,
    ) -> Result<BucketItem, ApiError> {
        let request = ApiRequest::post(api_path(&["item", bucket_uid]))
            .query("full", "true")
            .json(&input)?;
        self.client.data(request).await
    }

    async fn list_items(
        &self,
        bucket_uid: &str,
        page: PageQuery,
    ) -> Result<BucketItemPage, ApiError> {
        let request = ApiRequest::get(api_path(&["items", bucket_uid])).queries(page.to_query());
        self.client.fetch_paged(request).await
    }

    async fn find_item(&self, bucket_uid: &str, key: &str) -> Result<BucketItem, ApiError> {
        self.client
            .data(ApiRequest::get(api_path(&["item", bucket_uid, key])))
            .await
    }

    async fn update_item(
        &self,
        bucket_uid: &str,
        key: &str,
        input: BucketItemInput,
    ) -> Result<String, ApiError> {
        let request = ApiRequest::put(api_path(&["item", bucket_uid, key])).json(&input)?;
        self.client.message(request).await
    }

    async fn delete_item(&self, bucket_uid: &str, key: &str) -> Result<(), ApiError> {
        self.client
            .message(ApiRequest::delete(api_path(&["item", bucket_uid, key])))
            .await?;
        Ok(())
    }
}
