use std::collections::HashMap;

/// Static flags attached to a route record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    /// Only reachable without a session, e.g. the landing and signup pages.
    pub guest: bool,
}

impl RouteMeta {
    pub fn requires_auth() -> Self {
        RouteMeta {
            requires_auth: true,
            guest: false,
        }
    }

    pub fn guest() -> Self {
        RouteMeta {
            requires_auth: false,
            guest: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteRecord {
    /// Absolute for top-level records, relative to the parent for children.
    /// `:name` segments capture a parameter.
    pub path: String,
    pub name: Option<String>,
    pub meta: RouteMeta,
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    pub fn new(path: impl Into<String>) -> Self {
        RouteRecord {
            path: path.into(),
            name: None,
            meta: RouteMeta::default(),
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn children(mut self, children: Vec<RouteRecord>) -> Self {
        self.children = children;
        self
    }

    fn segments(&self) -> Vec<&str> {
        split_path(&self.path)
    }
}

/// Result of resolving a location against the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    /// Paths of the matched records, outermost first. Empty for unknown
    /// locations.
    pub chain: Vec<String>,
    pub params: HashMap<String, String>,
    /// Flags of the whole chain: a flag set on any matched record applies.
    pub meta: RouteMeta,
}

impl RouteMatch {
    pub fn is_known(&self) -> bool {
        !self.chain.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteRecord>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteRecord>) -> Self {
        RouteTable { routes }
    }

    /// The pages of the bucket dashboard.
    pub fn default_routes() -> Self {
        RouteTable::new(vec![
            RouteRecord::new("/").named("Home").meta(RouteMeta::guest()),
            RouteRecord::new("/login").named("Login"),
            RouteRecord::new("/signup").named("Signup").meta(RouteMeta::guest()),
            RouteRecord::new("/verify-email").named("VerifyEmail"),
            RouteRecord::new("/forgot-password").named("ForgotPassword"),
            RouteRecord::new("/reset-password").named("ResetPassword"),
            RouteRecord::new("/dashboard")
                .meta(RouteMeta::requires_auth())
                .children(vec![
                    RouteRecord::new("").named("Buckets"),
                    RouteRecord::new("apikeys").named("APIKeys"),
                    RouteRecord::new("user-settings").named("UserSettings"),
                    RouteRecord::new("bucket/:uid").named("BucketDetails"),
                    RouteRecord::new("apikey/:id").named("APIKeyDetails"),
                ]),
        ])
    }

    pub fn resolve(&self, location: &str) -> RouteMatch {
        let segments = split_path(location);
        for record in &self.routes {
            let mut chain = Vec::new();
            let mut params = HashMap::new();
            if match_record(record, &segments, &mut chain, &mut params) {
                let meta = chain.iter().fold(RouteMeta::default(), |acc, r| RouteMeta {
                    requires_auth: acc.requires_auth || r.meta.requires_auth,
                    guest: acc.guest || r.meta.guest,
                });
                return RouteMatch {
                    chain: chain.iter().map(|r| r.path.clone()).collect(),
                    params,
                    meta,
                };
            }
        }
        RouteMatch::default()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        RouteTable::default_routes()
    }
}

fn split_path(path: &str) -> Vec<&str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn match_record<'a>(
    record: &'a RouteRecord,
    segments: &[&str],
    chain: &mut Vec<&'a RouteRecord>,
    params: &mut HashMap<String, String>,
) -> bool {
    let pattern = record.segments();
    if pattern.len() > segments.len() {
        return false;
    }
    let mut captured = Vec::new();
    for (want, got) in pattern.iter().zip(segments) {
        match want.strip_prefix(':') {
            Some(name) => captured.push((name.to_owned(), (*got).to_owned())),
            None if want == got => {}
            None => return false,
        }
    }
    let rest = &segments[pattern.len()..];

    chain.push(record);
    let depth = chain.len();
    for child in &record.children {
        let mut child_params = HashMap::new();
        if match_record(child, rest, chain, &mut child_params) {
            params.extend(captured);
            params.extend(child_params);
            return true;
        }
        chain.truncate(depth);
    }
    if rest.is_empty() {
        params.extend(captured);
        return true;
    }
    chain.pop();
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_routes_resolve() {
        let table = RouteTable::default_routes();
        let m = table.resolve("/login");
        assert_eq!(m.chain, vec!["/login"]);
        assert_eq!(m.meta, RouteMeta::default());

        let m = table.resolve("/");
        assert!(m.meta.guest);
        assert!(table.resolve("/signup?ref=home").meta.guest);
    }

    #[test]
    fn children_inherit_requires_auth() {
        let table = RouteTable::default_routes();
        for path in ["/dashboard", "/dashboard/", "/dashboard/apikeys", "/dashboard/user-settings"] {
            let m = table.resolve(path);
            assert!(m.meta.requires_auth, "{path}");
            assert_eq!(m.chain.len(), 2, "{path}");
        }
    }

    #[test]
    fn params_are_captured() {
        let table = RouteTable::default_routes();
        let m = table.resolve("/dashboard/bucket/b-42");
        assert_eq!(m.chain, vec!["/dashboard", "bucket/:uid"]);
        assert_eq!(m.params.get("uid").map(String::as_str), Some("b-42"));

        let m = table.resolve("/dashboard/apikey/k1");
        assert_eq!(m.params.get("id").map(String::as_str), Some("k1"));
    }

    #[test]
    fn unknown_locations_have_no_flags() {
        let table = RouteTable::default_routes();
        let m = table.resolve("/nowhere");
        assert!(!m.is_known());
        assert_eq!(m.meta, RouteMeta::default());
        assert!(!table.resolve("/dashboard/bucket").is_known());
    }
}
