//! Single-flight access token refresh.
//!
//! At most one `POST /auth/refresh-token` is in flight at any time. The
//! first caller that finds the access token stale spawns the refresh and
//! parks a shared handle to its outcome in `RefreshSlot`; every caller that
//! arrives before it settles awaits that same handle. The refresh runs on
//! its own task, so dropping a waiting request never cancels it.
//!
//! The slot is only locked for short synchronous sections and never across
//! an `.await`. The refresh task is the only writer of tokens while it is in
//! flight; `login` and `logout` bump `epoch` so a refresh belonging to a
//! previous session cannot write its result.

use crate::domain_model::{AccessToken, Envelope, ErrorBody, LoginTokens, RefreshToken, RefreshedTokens};
use crate::domain_port::{ApiRequest, CredentialStore, HttpTransport};
use crate::session::TokenValidator;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use reqwest::header::{HeaderName, HeaderValue};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinError;
use tracing::{debug, info, warn};

pub const REFRESH_TOKEN_PATH: &str = "/auth/refresh-token";
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("refresh request failed: {0}")]
    Network(String),
    #[error("refresh token rejected: {0}")]
    Denied(String),
    #[error("malformed refresh response: {0}")]
    Malformed(String),
    #[error("session ended while refreshing")]
    SessionEnded,
    #[error("refresh task aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
    /// A refresh failed and the credentials were cleared. Held only until
    /// the waiters receive the failure, then back to `Idle`.
    Failed,
}

type SharedRefresh = Shared<BoxFuture<'static, Result<AccessToken, RefreshError>>>;

struct RefreshSlot {
    state: RefreshState,
    in_flight: Option<SharedRefresh>,
    epoch: u64,
    last_failure: Option<RefreshError>,
}

enum Attach {
    Ready(AccessToken),
    Anonymous,
    Wait(SharedRefresh),
}

struct CoordinatorInner {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialStore>,
    validator: TokenValidator,
    slot: Mutex<RefreshSlot>,
    refresh_calls: AtomicU64,
}

#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialStore>,
        validator: TokenValidator,
    ) -> Self {
        RefreshCoordinator {
            inner: Arc::new(CoordinatorInner {
                transport,
                credentials,
                validator,
                slot: Mutex::new(RefreshSlot {
                    state: RefreshState::Idle,
                    in_flight: None,
                    epoch: 0,
                    last_failure: None,
                }),
                refresh_calls: AtomicU64::new(0),
            }),
        }
    }

    pub fn state(&self) -> RefreshState {
        self.inner.lock_slot().state
    }

    /// Why the most recent refresh of this session failed, if it did.
    pub fn last_failure(&self) -> Option<RefreshError> {
        self.inner.lock_slot().last_failure.clone()
    }

    /// Number of refresh calls sent to the remote API so far.
    pub fn refresh_calls(&self) -> u64 {
        self.inner.refresh_calls.load(Ordering::SeqCst)
    }

    /// A usable access token.
    ///
    /// `Ok(None)` means there is no session: neither a valid access token
    /// nor a refresh token is stored. A stale access token with a refresh
    /// token present suspends the caller until the shared refresh settles.
    pub async fn access_token(&self) -> Result<Option<AccessToken>, RefreshError> {
        if let Some(token) = self.inner.valid_access() {
            return Ok(Some(token));
        }
        match self.attach() {
            Attach::Ready(token) => Ok(Some(token)),
            Attach::Anonymous => Ok(None),
            Attach::Wait(refresh) => refresh.await.map(Some),
        }
    }

    /// Stores a freshly issued pair. A refresh still in flight for the
    /// previous session will not overwrite it.
    pub fn login(&self, tokens: &LoginTokens) {
        let mut slot = self.inner.lock_slot();
        slot.epoch += 1;
        slot.in_flight = None;
        slot.state = RefreshState::Idle;
        slot.last_failure = None;
        if let Err(e) = self.inner.credentials.set_access(&tokens.access_token) {
            warn!(error = %e, "failed to persist access token");
        }
        if let Err(e) = self.inner.credentials.set_refresh(&tokens.refresh_token) {
            warn!(error = %e, "failed to persist refresh token");
        }
        info!("session established");
    }

    /// Clears both token classes regardless of any refresh in flight.
    pub fn logout(&self) {
        let mut slot = self.inner.lock_slot();
        slot.epoch += 1;
        slot.in_flight = None;
        slot.state = RefreshState::Idle;
        slot.last_failure = None;
        if let Err(e) = self.inner.credentials.clear_all() {
            warn!(error = %e, "failed to clear persisted credentials");
        }
        info!("session cleared");
    }

    fn attach(&self) -> Attach {
        let mut slot = self.inner.lock_slot();
        if let Some(refresh) = &slot.in_flight {
            debug!("joining in-flight token refresh");
            return Attach::Wait(refresh.clone());
        }
        // A refresh may have settled between the optimistic read in
        // `access_token` and taking the lock.
        if let Some(token) = self.inner.valid_access() {
            return Attach::Ready(token);
        }
        let Some(refresh_token) = self.inner.credentials.get_refresh() else {
            return Attach::Anonymous;
        };

        let epoch = slot.epoch;
        let inner = self.inner.clone();
        let task = tokio::spawn(async move { inner.run_refresh(refresh_token, epoch).await });
        let inner = self.inner.clone();
        let refresh = async move {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => Err(inner.abandon(epoch, e)),
            };
            inner.settle(epoch);
            outcome
        }
        .boxed()
        .shared();

        slot.state = RefreshState::Refreshing;
        slot.in_flight = Some(refresh.clone());
        info!("access token stale, refreshing");
        Attach::Wait(refresh)
    }
}

impl CoordinatorInner {
    fn lock_slot(&self) -> MutexGuard<'_, RefreshSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn valid_access(&self) -> Option<AccessToken> {
        self.credentials
            .get_access()
            .filter(|t| !self.validator.is_expired(Some(t.as_str())))
    }

    async fn run_refresh(
        self: Arc<Self>,
        refresh_token: RefreshToken,
        epoch: u64,
    ) -> Result<AccessToken, RefreshError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.request_refresh(&refresh_token).await;

        let mut slot = self.lock_slot();
        if slot.epoch != epoch {
            debug!("discarding refresh result from an ended session");
            return Err(RefreshError::SessionEnded);
        }
        slot.in_flight = None;

        match outcome {
            Ok(tokens) => {
                if let Err(e) = self.credentials.set_access(&tokens.access_token) {
                    warn!(error = %e, "failed to persist refreshed access token");
                }
                if let Some(rotated) = &tokens.refresh_token {
                    if let Err(e) = self.credentials.set_refresh(rotated) {
                        warn!(error = %e, "failed to persist rotated refresh token");
                    }
                }
                slot.state = RefreshState::Idle;
                slot.last_failure = None;
                info!(rotated = tokens.refresh_token.is_some(), "access token refreshed");
                Ok(tokens.access_token)
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed, clearing session");
                self.fail(&mut slot, e.clone());
                Err(e)
            }
        }
    }

    fn fail(&self, slot: &mut RefreshSlot, error: RefreshError) {
        if let Err(e) = self.credentials.clear_all() {
            warn!(error = %e, "failed to clear persisted credentials");
        }
        slot.state = RefreshState::Failed;
        slot.last_failure = Some(error);
    }

    /// The refresh task panicked or was cancelled before settling the slot.
    fn abandon(&self, epoch: u64, error: JoinError) -> RefreshError {
        let failure = RefreshError::Aborted(error.to_string());
        let mut slot = self.lock_slot();
        if slot.epoch == epoch {
            warn!(error = %failure, "token refresh task lost, clearing session");
            slot.in_flight = None;
            self.fail(&mut slot, failure.clone());
        }
        failure
    }

    /// Runs once the outcome is in the waiters' hands.
    fn settle(&self, epoch: u64) {
        let mut slot = self.lock_slot();
        if slot.epoch == epoch && slot.state == RefreshState::Failed {
            slot.state = RefreshState::Idle;
        }
    }

    async fn request_refresh(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<RefreshedTokens, RefreshError> {
        let header = HeaderValue::from_str(refresh_token.as_str())
            .map_err(|e| RefreshError::Malformed(e.to_string()))?;
        let request = ApiRequest::post(REFRESH_TOKEN_PATH)
            .header(HeaderName::from_static(REFRESH_TOKEN_HEADER), header);

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| RefreshError::Network(e.0))?;

        if !response.is_success() {
            let body = response.json::<ErrorBody>().unwrap_or_default();
            return Err(RefreshError::Denied(format!(
                "{} ({})",
                body.display_message(),
                response.status
            )));
        }

        response
            .json::<Envelope<RefreshedTokens>>()
            .map_err(|e| RefreshError::Malformed(e.to_string()))?
            .data
            .ok_or_else(|| RefreshError::Malformed("missing data".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_port::{ApiResponse, TransportError};
    use crate::infra_fake::mint_token;
    use crate::infra_storage::MemoryCredentialStore;
    use chrono::Duration;

    struct PanickingTransport;

    #[async_trait::async_trait]
    impl HttpTransport for PanickingTransport {
        async fn send(&self, _request: ApiRequest) -> Result<ApiResponse, TransportError> {
            panic!("connection pool poisoned");
        }
    }

    struct RejectingTransport;

    #[async_trait::async_trait]
    impl HttpTransport for RejectingTransport {
        async fn send(&self, _request: ApiRequest) -> Result<ApiResponse, TransportError> {
            Ok(ApiResponse::new(
                401,
                br#"{"status":false,"error":"refresh token revoked"}"#.to_vec(),
            ))
        }
    }

    fn stale_pair() -> LoginTokens {
        LoginTokens {
            access_token: AccessToken::new(mint_token("user-1", Duration::seconds(-5))),
            refresh_token: RefreshToken::new(mint_token("user-1", Duration::days(1))),
        }
    }

    fn coordinator(
        transport: Arc<dyn HttpTransport>,
    ) -> (RefreshCoordinator, Arc<MemoryCredentialStore>) {
        let credentials = Arc::new(MemoryCredentialStore::new());
        let coordinator =
            RefreshCoordinator::new(transport, credentials.clone(), TokenValidator::default());
        coordinator.login(&stale_pair());
        (coordinator, credentials)
    }

    #[tokio::test]
    async fn aborted_refresh_task_releases_slot_and_clears_session() {
        let (coordinator, credentials) = coordinator(Arc::new(PanickingTransport));

        let err = coordinator.access_token().await.unwrap_err();
        assert!(matches!(err, RefreshError::Aborted(_)), "unexpected {err:?}");
        assert!(credentials.snapshot().is_empty());
        assert_eq!(coordinator.state(), RefreshState::Idle);
        assert_eq!(coordinator.last_failure(), Some(err));

        // Nothing is left parked in the slot for later callers.
        assert_eq!(coordinator.access_token().await, Ok(None));
        assert_eq!(coordinator.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn rejected_refresh_returns_to_idle() {
        let (coordinator, credentials) = coordinator(Arc::new(RejectingTransport));

        let err = coordinator.access_token().await.unwrap_err();
        assert!(matches!(err, RefreshError::Denied(_)));
        assert_eq!(coordinator.state(), RefreshState::Idle);
        assert_eq!(coordinator.last_failure(), Some(err));
        assert!(credentials.snapshot().is_empty());

        coordinator.login(&stale_pair());
        assert_eq!(coordinator.last_failure(), None);
    }
}
