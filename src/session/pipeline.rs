//! Authorizes every outgoing API call.
//!
//! `authorize` decides which bearer credential, if any, a request carries:
//!
//! 1. no tokens stored: forwarded unchanged (anonymous, or an API key the
//!    caller attached itself);
//! 2. already carrying the current valid token: forwarded unchanged;
//! 3. valid access token: attached;
//! 4. stale access token with a refresh token: suspended on the shared
//!    refresh, then the new token is attached. If a logout or login ended
//!    the session meanwhile, the store is consulted once more so a fresh
//!    login's token is used. If the refresh fails the request goes out
//!    without credentials and the server rejects it.
//!
//! Requests are never dropped here.

use crate::application_port::ApiError;
use crate::domain_model::{AccessToken, Envelope, PaginatedEnvelope};
use crate::domain_port::{ApiRequest, ApiResponse, CredentialStore, HttpTransport};
use crate::session::{RefreshCoordinator, RefreshError, RefreshState};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AuthenticatedClient {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialStore>,
    coordinator: RefreshCoordinator,
}

impl AuthenticatedClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialStore>,
        coordinator: RefreshCoordinator,
    ) -> Self {
        AuthenticatedClient {
            transport,
            credentials,
            coordinator,
        }
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.coordinator.state()
    }

    pub async fn authorize(&self, request: ApiRequest) -> ApiRequest {
        self.authorize_inner(request).await.0
    }

    async fn authorize_inner(
        &self,
        mut request: ApiRequest,
    ) -> (ApiRequest, Option<RefreshError>) {
        if self.credentials.snapshot().is_empty() {
            debug!(path = %request.path, "no credentials, sending anonymously");
            return (request, None);
        }

        let mut outcome = self.coordinator.access_token().await;
        if matches!(outcome, Err(RefreshError::SessionEnded)) {
            // A login may have replaced the session this refresh belonged to.
            debug!(path = %request.path, "session ended during refresh, rechecking");
            outcome = self.coordinator.access_token().await;
        }

        match outcome {
            Ok(Some(token)) => {
                if request.authorization() != Some(token.bearer().as_str()) {
                    attach_bearer(&mut request, &token);
                }
                (request, None)
            }
            Ok(None) => {
                debug!(path = %request.path, "session gone, sending anonymously");
                strip_stale_bearer(&mut request, &*self.credentials);
                (request, None)
            }
            Err(e) => {
                warn!(path = %request.path, error = %e, "sending without credentials");
                request.headers.remove(AUTHORIZATION);
                (request, Some(e))
            }
        }
    }

    async fn dispatch(
        &self,
        request: ApiRequest,
    ) -> Result<(ApiResponse, Option<RefreshError>), ApiError> {
        let (request, refresh_failure) = self.authorize_inner(request).await;
        debug!(method = %request.method, path = %request.path, "sending request");
        let response = self.transport.send(request).await?;
        Ok((response, refresh_failure))
    }

    /// Authorizes and sends. Transport failures become `NetworkFailure`; the
    /// HTTP status is left for the caller to interpret.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        Ok(self.dispatch(request).await?.0)
    }

    /// Sends and unwraps the `{status, message, data}` envelope. Any non-2xx
    /// status is rejected with the server's error body.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<Envelope<T>, ApiError> {
        let response = self.checked(request).await?;
        Ok(response.json()?)
    }

    pub async fn fetch_paged<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<PaginatedEnvelope<T>, ApiError> {
        let response = self.checked(request).await?;
        Ok(response.json()?)
    }

    /// A 2xx response, or the error it carries. A 401 that follows a failed
    /// refresh is reported as `RefreshDenied`.
    pub async fn checked(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let (response, refresh_failure) = self.dispatch(request).await?;
        if response.is_success() {
            return Ok(response);
        }
        match (ApiError::from_response(&response), refresh_failure) {
            (ApiError::Unauthorized(_), Some(failure)) => {
                Err(ApiError::RefreshDenied(failure.to_string()))
            }
            (err, _) => Err(err),
        }
    }

    /// `data` of the envelope, which must be present.
    pub async fn data<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path.clone();
        self.fetch(request)
            .await?
            .data
            .ok_or_else(|| ApiError::Decode(format!("missing data in response to {path}")))
    }

    /// Success message of an envelope whose `data` is irrelevant.
    pub async fn message(&self, request: ApiRequest) -> Result<String, ApiError> {
        Ok(self.fetch::<serde_json::Value>(request).await?.message)
    }
}

fn attach_bearer(request: &mut ApiRequest, token: &AccessToken) {
    match HeaderValue::from_str(&token.bearer()) {
        Ok(mut value) => {
            value.set_sensitive(true);
            request.headers.insert(AUTHORIZATION, value);
        }
        Err(e) => {
            warn!(error = %e, "access token is not a valid header value");
            request.headers.remove(AUTHORIZATION);
        }
    }
}

// Drops a bearer header only if it carries a token this client issued, so
// API keys supplied by the caller still go through.
fn strip_stale_bearer(request: &mut ApiRequest, credentials: &dyn CredentialStore) {
    let Some(current) = request.authorization().map(str::to_owned) else {
        return;
    };
    let stale = credentials
        .get_access()
        .is_some_and(|t| t.bearer() == current);
    if stale {
        request.headers.remove(AUTHORIZATION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::{LoginTokens, RefreshToken};
    use crate::domain_port::TransportError;
    use crate::infra_fake::mint_token;
    use crate::infra_storage::MemoryCredentialStore;
    use crate::session::TokenValidator;
    use reqwest::header::HeaderValue;
    use std::sync::Mutex;

    #[derive(Default)]
    struct EchoTransport {
        seen: Mutex<Vec<Option<String>>>,
        status: u16,
    }

    #[async_trait::async_trait]
    impl HttpTransport for EchoTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
            self.seen
                .lock()
                .unwrap()
                .push(request.authorization().map(str::to_owned));
            Ok(ApiResponse::new(
                self.status,
                br#"{"status":true,"message":"ok","data":{"n":1}}"#.to_vec(),
            ))
        }
    }

    fn client(status: u16) -> (AuthenticatedClient, Arc<EchoTransport>, Arc<MemoryCredentialStore>) {
        let transport = Arc::new(EchoTransport {
            status,
            ..Default::default()
        });
        let credentials = Arc::new(MemoryCredentialStore::new());
        let coordinator =
            RefreshCoordinator::new(transport.clone(), credentials.clone(), TokenValidator::default());
        let client = AuthenticatedClient::new(transport.clone(), credentials.clone(), coordinator);
        (client, transport, credentials)
    }

    #[tokio::test]
    async fn anonymous_request_keeps_caller_api_key() {
        let (client, transport, _) = client(200);
        let request = ApiRequest::get("/buckets").header(
            AUTHORIZATION,
            HeaderValue::from_static("Bearer api-key-123"),
        );
        client.send(request).await.unwrap();
        assert_eq!(
            transport.seen.lock().unwrap().as_slice(),
            &[Some("Bearer api-key-123".to_owned())]
        );
    }

    #[tokio::test]
    async fn valid_access_token_is_attached() {
        let (client, transport, _) = client(200);
        let access = AccessToken::new(mint_token("user-1", chrono::Duration::minutes(15)));
        client.coordinator().login(&LoginTokens {
            access_token: access.clone(),
            refresh_token: RefreshToken::new(mint_token("user-1", chrono::Duration::days(1))),
        });

        let value: serde_json::Value = client.data(ApiRequest::get("/auth/user")).await.unwrap();
        assert_eq!(value["n"], 1);
        assert_eq!(
            transport.seen.lock().unwrap().as_slice(),
            &[Some(access.bearer())]
        );
        assert_eq!(client.coordinator().refresh_calls(), 0);
    }

    #[tokio::test]
    async fn stale_access_without_refresh_is_stripped() {
        let (client, transport, credentials) = client(401);
        let stale = AccessToken::new(mint_token("user-1", chrono::Duration::seconds(-5)));
        credentials.set_access(&stale).unwrap();

        let request = ApiRequest::get("/auth/user")
            .header(AUTHORIZATION, HeaderValue::from_str(&stale.bearer()).unwrap());
        let err = client.fetch::<serde_json::Value>(request).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(transport.seen.lock().unwrap().as_slice(), &[None]);
    }
}
