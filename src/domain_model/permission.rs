use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access granted on a bucket to callers that are not its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BucketPermission {
    #[serde(rename = "public:write:item")]
    PublicWriteItem,
    #[serde(rename = "public:write")]
    PublicWrite,
    #[serde(rename = "public:delete")]
    PublicDelete,
    #[serde(rename = "public:delete:item")]
    PublicDeleteItem,
    #[serde(rename = "public:read:item")]
    PublicReadItem,
    #[serde(rename = "public:read")]
    PublicRead,
}

impl BucketPermission {
    pub const ALL: [BucketPermission; 6] = [
        BucketPermission::PublicWriteItem,
        BucketPermission::PublicWrite,
        BucketPermission::PublicDelete,
        BucketPermission::PublicDeleteItem,
        BucketPermission::PublicReadItem,
        BucketPermission::PublicRead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BucketPermission::PublicWriteItem => "public:write:item",
            BucketPermission::PublicWrite => "public:write",
            BucketPermission::PublicDelete => "public:delete",
            BucketPermission::PublicDeleteItem => "public:delete:item",
            BucketPermission::PublicReadItem => "public:read:item",
            BucketPermission::PublicRead => "public:read",
        }
    }
}

/// Scope granted to an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiKeyPermission {
    #[serde(rename = "read:bucket")]
    ReadBucket,
    #[serde(rename = "write:bucket")]
    WriteBucket,
    #[serde(rename = "delete:bucket")]
    DeleteBucket,
    #[serde(rename = "read:user")]
    ReadUser,
    #[serde(rename = "write:user")]
    WriteUser,
    #[serde(rename = "delete:user")]
    DeleteUser,
    #[serde(rename = "read:item")]
    ReadItem,
    #[serde(rename = "write:item")]
    WriteItem,
    #[serde(rename = "delete:item")]
    DeleteItem,
}

impl ApiKeyPermission {
    pub const ALL: [ApiKeyPermission; 9] = [
        ApiKeyPermission::ReadBucket,
        ApiKeyPermission::WriteBucket,
        ApiKeyPermission::DeleteBucket,
        ApiKeyPermission::ReadUser,
        ApiKeyPermission::WriteUser,
        ApiKeyPermission::DeleteUser,
        ApiKeyPermission::ReadItem,
        ApiKeyPermission::WriteItem,
        ApiKeyPermission::DeleteItem,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyPermission::ReadBucket => "read:bucket",
            ApiKeyPermission::WriteBucket => "write:bucket",
            ApiKeyPermission::DeleteBucket => "delete:bucket",
            ApiKeyPermission::ReadUser => "read:user",
            ApiKeyPermission::WriteUser => "write:user",
            ApiKeyPermission::DeleteUser => "delete:user",
            ApiKeyPermission::ReadItem => "read:item",
            ApiKeyPermission::WriteItem => "write:item",
            ApiKeyPermission::DeleteItem => "delete:item",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission `{0}`")]
pub struct UnknownPermission(pub String);

impl fmt::Display for BucketPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ApiKeyPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BucketPermission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BucketPermission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_owned()))
    }
}

impl FromStr for ApiKeyPermission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApiKeyPermission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_permission_uses_wire_names() {
        let json = serde_json::to_string(&BucketPermission::PublicReadItem).unwrap();
        assert_eq!(json, "\"public:read:item\"");
        let parsed: BucketPermission = serde_json::from_str("\"public:delete\"").unwrap();
        assert_eq!(parsed, BucketPermission::PublicDelete);
    }

    #[test]
    fn api_key_permission_parses_from_cli_text() {
        assert_eq!(
            "write:item".parse::<ApiKeyPermission>().unwrap(),
            ApiKeyPermission::WriteItem
        );
        assert!("write:everything".parse::<ApiKeyPermission>().is_err());
    }
}
