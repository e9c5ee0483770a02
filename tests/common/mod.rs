#![allow(dead_code)]

use keeper_client::client::KeeperClient;
use keeper_client::domain_model::LoginTokens;
use keeper_client::domain_port::CredentialStore;
use keeper_client::infra_fake::{DEMO_EMAIL, FakeKeeperApi, RecordingNotifier};
use keeper_client::infra_storage::MemoryCredentialStore;
use keeper_client::routing::RouteGuard;
use keeper_client::session::TokenValidator;
use std::sync::Arc;

pub struct Stack {
    pub api: Arc<FakeKeeperApi>,
    pub credentials: Arc<dyn CredentialStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub client: KeeperClient,
}

pub fn stack() -> Stack {
    stack_with(Arc::new(MemoryCredentialStore::new()))
}

pub fn stack_with(credentials: Arc<dyn CredentialStore>) -> Stack {
    let api = Arc::new(FakeKeeperApi::with_demo_user());
    let notifier = Arc::new(RecordingNotifier::new());
    let client = KeeperClient::assemble(
        api.clone(),
        credentials.clone(),
        notifier.clone(),
        TokenValidator::default(),
        RouteGuard::default(),
    );
    Stack {
        api,
        credentials,
        notifier,
        client,
    }
}

/// Stores a pair whose access token is already stale but whose refresh
/// token the fake will accept.
pub fn stale_session(stack: &Stack) -> LoginTokens {
    let tokens = stack
        .api
        .issue_tokens(DEMO_EMAIL, chrono::Duration::seconds(-5))
        .unwrap();
    stack.client.http.coordinator().login(&tokens);
    tokens
}
