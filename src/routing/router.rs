use crate::domain_port::{CredentialStore, Navigator};
use crate::routing::{GuardDecision, RouteGuard, RouteMatch, RouteTable};
use crate::session::{TokenValidator, session_present};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

// A redirect may itself be redirected once (e.g. a guest page sending to a
// landing page); more than this is a misconfigured table.
const MAX_REDIRECTS: usize = 4;

/// Guarded navigation over the route table. The current location is
/// observable through `subscribe`.
pub struct Router {
    table: RouteTable,
    guard: RouteGuard,
    credentials: Arc<dyn CredentialStore>,
    validator: TokenValidator,
    location: watch::Sender<String>,
}

impl Router {
    pub fn new(
        table: RouteTable,
        guard: RouteGuard,
        credentials: Arc<dyn CredentialStore>,
        validator: TokenValidator,
    ) -> Self {
        let (location, _) = watch::channel("/".to_owned());
        Router {
            table,
            guard,
            credentials,
            validator,
            location,
        }
    }

    pub fn current(&self) -> String {
        self.location.borrow().clone()
    }

    pub fn current_route(&self) -> RouteMatch {
        self.table.resolve(&self.current())
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.location.subscribe()
    }

    /// Runs the guard for `path` and moves to wherever it ends up. Returns
    /// the final location.
    pub fn push(&self, path: &str) -> String {
        let session = session_present(&*self.credentials, &self.validator);
        let mut target = path.to_owned();
        for _ in 0..MAX_REDIRECTS {
            let route = self.table.resolve(&target);
            match self.guard.decide(&route.meta, session) {
                GuardDecision::Proceed => {
                    debug!(to = %target, "navigating");
                    self.location.send_replace(target.clone());
                    return target;
                }
                GuardDecision::RedirectTo(next) => {
                    debug!(from = %target, to = %next, session, "navigation redirected");
                    target = next;
                }
            }
        }
        warn!(path, "redirect loop, staying put");
        self.current()
    }
}

impl Navigator for Router {
    fn navigate(&self, path: &str) {
        self.push(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::{AccessToken, RefreshToken};
    use crate::infra_fake::mint_token;
    use crate::infra_storage::MemoryCredentialStore;

    fn router() -> (Router, Arc<MemoryCredentialStore>) {
        let credentials = Arc::new(MemoryCredentialStore::new());
        let router = Router::new(
            RouteTable::default_routes(),
            RouteGuard::default(),
            credentials.clone(),
            TokenValidator::default(),
        );
        (router, credentials)
    }

    #[test]
    fn anonymous_user_is_sent_to_login() {
        let (router, _) = router();
        assert_eq!(router.push("/dashboard/bucket/b1"), "/login");
        assert_eq!(router.current(), "/login");
        assert_eq!(router.push("/signup"), "/signup");
    }

    #[test]
    fn refresh_token_alone_counts_as_session() {
        let (router, credentials) = router();
        let refresh = mint_token("user-1", chrono::Duration::days(30));
        credentials.set_refresh(&RefreshToken::new(refresh)).unwrap();

        assert_eq!(router.push("/signup"), "/dashboard");
        assert_eq!(router.push("/dashboard/apikeys"), "/dashboard/apikeys");
        assert_eq!(
            router.current_route().chain,
            vec!["/dashboard".to_owned(), "apikeys".to_owned()]
        );
    }

    #[test]
    fn expired_tokens_are_no_session() {
        let (router, credentials) = router();
        let stale = mint_token("user-1", chrono::Duration::seconds(-1));
        credentials.set_access(&AccessToken::new(stale.clone())).unwrap();
        credentials.set_refresh(&RefreshToken::new(stale)).unwrap();
        assert_eq!(router.push("/dashboard"), "/login");
    }

    #[test]
    fn redirect_loop_keeps_current_location() {
        let credentials = Arc::new(MemoryCredentialStore::new());
        let router = Router::new(
            RouteTable::default_routes(),
            RouteGuard::new("/dashboard", "/dashboard"),
            credentials,
            TokenValidator::default(),
        );
        assert_eq!(router.push("/dashboard"), "/");
    }
}
