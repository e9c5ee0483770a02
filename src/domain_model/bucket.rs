use crate::domain_model::{BucketItem, BucketPermission};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub uid: String,
    #[serde(default)]
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<BucketPermission>,
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// A bucket together with the items it holds, as returned by the listing
/// and lookup endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketDetails {
    #[serde(flatten)]
    pub bucket: Bucket,
    #[serde(default)]
    pub bucket_items: Vec<BucketItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBucketInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<BucketPermission>,
}
