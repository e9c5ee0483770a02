use crate::routing::RouteMeta;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    RedirectTo(String),
}

/// Decides whether a navigation may proceed. Pure and synchronous: it never
/// touches the network, only the flags of the destination and whether a
/// session is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    pub login_path: String,
    pub landing_path: String,
}

impl RouteGuard {
    pub fn new(login_path: impl Into<String>, landing_path: impl Into<String>) -> Self {
        RouteGuard {
            login_path: login_path.into(),
            landing_path: landing_path.into(),
        }
    }

    pub fn decide(&self, meta: &RouteMeta, session_present: bool) -> GuardDecision {
        if meta.guest && session_present {
            return GuardDecision::RedirectTo(self.landing_path.clone());
        }
        if meta.requires_auth && !session_present {
            return GuardDecision::RedirectTo(self.login_path.clone());
        }
        GuardDecision::Proceed
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        RouteGuard::new("/login", "/dashboard")
    }
}
