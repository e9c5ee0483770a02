mod api_key_store;
mod bucket_item_store;
mod bucket_store;
mod user_store;

pub use api_key_store::*;
pub use bucket_item_store::*;
pub use bucket_store::*;
pub use user_store::*;

use crate::application_port::ApiError;
use crate::domain_port::Notifier;
use tracing::debug;

/// Surfaces a failed store action as exactly one error notification.
fn report(notifier: &dyn Notifier, action: &str, err: &ApiError) {
    debug!(action, error = %err, "store action failed");
    notifier.error(&err.user_message());
}

/// Like `report`, with the action named in front of the server's message.
fn report_prefixed(notifier: &dyn Notifier, prefix: &str, err: &ApiError) {
    debug!(action = prefix, error = %err, "store action failed");
    notifier.error(&format!("{prefix}: {}", err.user_message()));
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::client::KeeperClient;
    use crate::infra_fake::{DEMO_EMAIL, DEMO_PASSWORD, FakeKeeperApi, RecordingNotifier};
    use crate::infra_storage::MemoryCredentialStore;
    use crate::domain_model::LoginInput;
    use crate::routing::RouteGuard;
    use crate::session::TokenValidator;
    use std::sync::Arc;

    pub struct Harness {
        pub api: Arc<FakeKeeperApi>,
        pub credentials: Arc<MemoryCredentialStore>,
        pub notifier: Arc<RecordingNotifier>,
        pub client: KeeperClient,
    }

    pub fn harness() -> Harness {
        let api = Arc::new(FakeKeeperApi::with_demo_user());
        let credentials = Arc::new(MemoryCredentialStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let client = KeeperClient::assemble(
            api.clone(),
            credentials.clone(),
            notifier.clone(),
            TokenValidator::default(),
            RouteGuard::default(),
        );
        Harness {
            api,
            credentials,
            notifier,
            client,
        }
    }

    pub async fn signed_in() -> Harness {
        let h = harness();
        h.client
            .users
            .login(LoginInput {
                email: DEMO_EMAIL.to_owned(),
                password: DEMO_PASSWORD.to_owned(),
            })
            .await
            .unwrap();
        h.notifier.take();
        h
    }
}
