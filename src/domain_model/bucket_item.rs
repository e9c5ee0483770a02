use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A key/value entry stored inside a bucket. `ttl` is in seconds; zero means
/// the item never expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketItem {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub bucket_id: String,
    pub bucket_uid: String,
    pub key: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub ttl: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketItemInput {
    pub key: String,
    pub data: serde_json::Value,
    #[serde(default)]
    pub ttl: i64,
}

/// Pagination parameters for item listings. The server defaults to page 1
/// with 20 items per page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQuery {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page".to_owned(), page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            query.push(("perPage".to_owned(), per_page.to_string()));
        }
        query
    }
}
