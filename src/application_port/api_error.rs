use crate::domain_model::ErrorBody;
use crate::domain_port::{ApiResponse, TransportError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("network failure: {0}")]
    NetworkFailure(String),
    #[error("unauthorized: {0}")]
    Unauthorized(ErrorBody),
    #[error("validation failed: {0}")]
    Validation(ErrorBody),
    #[error("forbidden: {0}")]
    Forbidden(ErrorBody),
    #[error("not found: {0}")]
    NotFound(ErrorBody),
    #[error("server error {status}: {body}")]
    Remote { status: u16, body: ErrorBody },
    #[error("refresh denied: {0}")]
    RefreshDenied(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Normalizes a non-2xx response into the server-supplied error body.
    pub fn from_response(response: &ApiResponse) -> Self {
        let body = response.json::<ErrorBody>().unwrap_or_else(|_| {
            let text = String::from_utf8_lossy(&response.body).trim().to_owned();
            if text.is_empty() {
                ErrorBody::default()
            } else {
                ErrorBody::from_message(text)
            }
        });
        match response.status {
            400 | 422 => ApiError::Validation(body),
            401 => ApiError::Unauthorized(body),
            403 => ApiError::Forbidden(body),
            404 => ApiError::NotFound(body),
            status => ApiError::Remote { status, body },
        }
    }

    /// The single line shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized(body)
            | ApiError::Validation(body)
            | ApiError::Forbidden(body)
            | ApiError::NotFound(body)
            | ApiError::Remote { body, .. } => body.display_message(),
            ApiError::NetworkFailure(message) => format!("network error: {message}"),
            ApiError::RefreshDenied(message) => format!("session expired: {message}"),
            ApiError::Decode(message) => format!("unexpected response: {message}"),
        }
    }

    /// Validation message rewritten to name `field`, for inline form errors.
    pub fn field_message(&self, field: &str) -> String {
        field_message(&self.user_message(), field)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_) | ApiError::RefreshDenied(_))
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::NetworkFailure(err.0)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Server validation messages start with "Value" or "This field"; replace
/// that subject with the field name.
pub fn field_message(message: &str, field: &str) -> String {
    let mut words = message.split(' ');
    let first = words.next().unwrap_or_default();
    let second = words.next().unwrap_or_default();

    if first.eq_ignore_ascii_case("value") {
        return format!("{field}{}", &message[first.len()..]);
    }
    if first.eq_ignore_ascii_case("this") && second.eq_ignore_ascii_case("field") {
        let subject = first.len() + 1 + second.len();
        return format!("{field}{}", &message[subject..]);
    }
    message.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_taxonomy() {
        let body = br#"{"status":false,"error":"bucket not found"}"#.to_vec();
        let err = ApiError::from_response(&ApiResponse::new(404, body.clone()));
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.user_message(), "bucket not found");

        let err = ApiError::from_response(&ApiResponse::new(401, body.clone()));
        assert!(err.is_unauthorized());

        let err = ApiError::from_response(&ApiResponse::new(400, body.clone()));
        assert!(matches!(err, ApiError::Validation(_)));

        let err = ApiError::from_response(&ApiResponse::new(502, body));
        assert!(matches!(err, ApiError::Remote { status: 502, .. }));
    }

    #[test]
    fn plain_text_body_becomes_message() {
        let err = ApiError::from_response(&ApiResponse::new(500, b"upstream down".to_vec()));
        assert_eq!(err.user_message(), "upstream down");

        let err = ApiError::from_response(&ApiResponse::new(401, Vec::new()));
        assert_eq!(err.user_message(), "unexpected error");
    }

    #[test]
    fn field_message_names_the_field() {
        assert_eq!(
            field_message("Value must be at least 2 characters", "name"),
            "name must be at least 2 characters"
        );
        assert_eq!(
            field_message("This field is required", "email"),
            "email is required"
        );
        assert_eq!(field_message("user already exists", "email"), "user already exists");
    }
}
