use crate::application_port::{ApiError, BucketService};
use crate::domain_model::{BucketDetails, CreateBucketInput};
use crate::domain_port::{ApiRequest, api_path};
use crate::session::AuthenticatedClient;
use std::sync::Arc;

pub struct RealBucketService {
    client: Arc<AuthenticatedClient>,
}

impl RealBucketService {
    pub fn new(client: Arc<AuthenticatedClient>) -> RealBucketService {
        RealBucketService { client }
    }
}

#[async_trait::async_trait]
impl BucketService for RealBucketService {
    async fn create_bucket(&self, input: CreateBucketInput) -> Result<BucketDetails, ApiError> {
        let request = ApiRequest::post("/bucket").query("full", "true").json(&input)?;
        self.client.data(request).await
    }

    async fn find_bucket(&self, uid: &str) -> Result<BucketDetails, ApiError> {
        self.client.data(ApiRequest::get(api_path(&["bucket", uid]))).await
    }

    async fn list_buckets(&self) -> Result<Vec<BucketDetails>, ApiError> {
        let buckets: Option<Vec<BucketDetails>> =
            self.client.fetch(ApiRequest::get("/buckets")).await?.data;
        Ok(buckets.unwrap_or_default())
    }

    async fn update_bucket(&self, uid: &str, input: CreateBucketInput) -> Result<String, ApiError> {
        let request = ApiRequest::put(api_path(&["bucket", uid])).json(&input)?;
        self.client.message(request).await
    }

    async fn delete_bucket(&self, uid: &str) -> Result<(), ApiError> {
        self.client
            .message(ApiRequest::delete(api_path(&["bucket", uid])))
            .await?;
        Ok(())
    }
}
