use serde::{Deserialize, Serialize};

/// `{status, message, data}` wrapper around every successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub current_page: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedEnvelope<T> {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub page_info: PageInfo,
}

/// Body of a non-2xx response. Handlers answer with `error`, middleware
/// sometimes with `message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn from_message(message: impl Into<String>) -> Self {
        ErrorBody {
            status: Some(false),
            error: Some(message.into()),
            message: None,
        }
    }

    /// `error || message`, the text shown to the user.
    pub fn display_message(&self) -> String {
        self.error
            .as_deref()
            .filter(|e| !e.is_empty())
            .or(self.message.as_deref().filter(|m| !m.is_empty()))
            .unwrap_or("unexpected error")
            .to_owned()
    }
}

impl std::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_message_prefers_error_over_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"status":false,"error":"bucket not found","message":"x"}"#)
                .unwrap();
        assert_eq!(body.display_message(), "bucket not found");

        let body: ErrorBody = serde_json::from_str(r#"{"message":"invalid token"}"#).unwrap();
        assert_eq!(body.display_message(), "invalid token");

        assert_eq!(ErrorBody::default().display_message(), "unexpected error");
    }

    #[test]
    fn envelope_without_data_decodes() {
        let env: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"status":true,"message":"Successfully updated bucket!"}"#)
                .unwrap();
        assert!(env.status);
        assert!(env.data.is_none());
    }

    #[test]
    fn paginated_envelope_reads_page_info() {
        let env: PaginatedEnvelope<Vec<u32>> = serde_json::from_str(
            r#"{"status":true,"message":"ok","data":[1,2],
                "page_info":{"total_items":12,"total_pages":6,"current_page":1,"has_next_page":true}}"#,
        )
        .unwrap();
        assert_eq!(env.data, Some(vec![1, 2]));
        assert_eq!(env.page_info.total_pages, 6);
        assert!(env.page_info.has_next_page);
    }
}
