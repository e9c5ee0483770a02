use crate::application_port::{ApiError, PublicService};
use crate::domain_model::{ApiKeyPermission, BucketPermission, Envelope};
use crate::domain_port::ApiRequest;
use crate::session::AuthenticatedClient;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

// The permission lists are served either bare or wrapped in an envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum PermissionList<T> {
    Wrapped(Envelope<Vec<T>>),
    Bare(Vec<T>),
}

pub struct RealPublicService {
    client: Arc<AuthenticatedClient>,
}

impl RealPublicService {
    pub fn new(client: Arc<AuthenticatedClient>) -> RealPublicService {
        RealPublicService { client }
    }

    async fn permissions<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let response = self.client.checked(ApiRequest::get(path)).await?;
        Ok(match response.json::<PermissionList<T>>()? {
            PermissionList::Wrapped(envelope) => envelope.data.unwrap_or_default(),
            PermissionList::Bare(list) => list,
        })
    }
}

#[async_trait::async_trait]
impl PublicService for RealPublicService {
    async fn api_key_permissions(&self) -> Result<Vec<ApiKeyPermission>, ApiError> {
        self.permissions("/public/apikey-permissions").await
    }

    async fn bucket_permissions(&self) -> Result<Vec<BucketPermission>, ApiError> {
        self.permissions("/public/bucket-permissions").await
    }
}
