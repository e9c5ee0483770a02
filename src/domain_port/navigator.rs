/// Moves the user to another page. Stores use it for the redirects that
/// follow login, logout and deletions.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}
