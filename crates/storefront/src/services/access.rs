//! Route access decisions.
//!
//! [`check_access`] is the single rule for protected paths. The guard
//! middleware calls it for every page request and the `RequireAuth`
//! extractor calls it again with the authoritative session, so the two can
//! never disagree about where an anonymous visitor is sent.

/// Where anonymous visitors are sent from protected paths.
pub const SIGN_IN_PATH: &str = "/sign-in";

/// A set of path prefixes matched on segment boundaries.
///
/// `/checkout` matches `/checkout` and `/checkout/step2`, not `/checkouts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPrefixes(Vec<String>);

impl PathPrefixes {
    /// Build from prefixes; trailing slashes are ignored and `/` covers
    /// every path. Blank entries are dropped.
    #[must_use]
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            prefixes
                .into_iter()
                .map(|p| p.as_ref().trim().to_string())
                .filter(|p| !p.is_empty())
                .map(|p| p.trim_end_matches('/').to_string())
                .collect(),
        )
    }

    /// Whether `path` falls under any prefix.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.0.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    /// Send the visitor to this URL (sign-in with a return path).
    RedirectTo(String),
}

/// Decide whether a visitor may see `path`.
///
/// Only protected paths are restricted, and only for visitors without an
/// authenticated session.
#[must_use]
pub fn check_access(path: &str, authenticated: bool, protected: &PathPrefixes) -> Access {
    if authenticated || !protected.matches(path) {
        return Access::Allow;
    }
    Access::RedirectTo(sign_in_url(path))
}

/// `/sign-in?redirect=<percent-encoded path>`.
#[must_use]
pub fn sign_in_url(path: &str) -> String {
    format!("{SIGN_IN_PATH}?redirect={}", urlencoding::encode(path))
}

/// The post-authentication destination for a client-supplied `redirect`.
///
/// Only same-origin relative paths are honoured; anything else (absolute
/// URLs, protocol-relative `//host`, backslash tricks) falls back to `/`.
#[must_use]
pub fn safe_redirect(target: Option<&str>) -> String {
    match target.map(str::trim) {
        Some(t)
            if t.starts_with('/')
                && !t.starts_with("//")
                && !t.starts_with("/\\")
                && !t.chars().any(char::is_control) =>
        {
            t.to_string()
        }
        _ => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protected() -> PathPrefixes {
        PathPrefixes::new(["/checkout", "/account", "/orders", "/profile"])
    }

    #[test]
    fn test_anonymous_protected_redirects_with_encoded_path() {
        assert_eq!(
            check_access("/checkout", false, &protected()),
            Access::RedirectTo("/sign-in?redirect=%2Fcheckout".to_string())
        );
        assert_eq!(
            check_access("/checkout/step2", false, &protected()),
            Access::RedirectTo("/sign-in?redirect=%2Fcheckout%2Fstep2".to_string())
        );
    }

    #[test]
    fn test_authenticated_always_allowed() {
        assert_eq!(check_access("/account", true, &protected()), Access::Allow);
    }

    #[test]
    fn test_public_paths_allowed() {
        assert_eq!(check_access("/", false, &protected()), Access::Allow);
        assert_eq!(check_access("/products/3", false, &protected()), Access::Allow);
        assert_eq!(check_access("/checkouts", false, &protected()), Access::Allow);
    }

    #[test]
    fn test_prefix_normalization() {
        let prefixes = PathPrefixes::new(["/static/", " /api ", ""]);
        assert!(prefixes.matches("/static/app.css"));
        assert!(prefixes.matches("/api"));
        assert!(!prefixes.matches("/"));
        assert_eq!(prefixes.iter().count(), 2);
    }

    #[test]
    fn test_root_prefix_covers_everything() {
        let root = PathPrefixes::new(["/"]);
        assert!(root.matches("/"));
        assert!(root.matches("/products/3"));
        assert_eq!(
            check_access("/", false, &root),
            Access::RedirectTo("/sign-in?redirect=%2F".to_string())
        );
    }

    #[test]
    fn test_safe_redirect() {
        assert_eq!(safe_redirect(Some("/checkout")), "/checkout");
        assert_eq!(safe_redirect(Some("/cart?x=1")), "/cart?x=1");
        assert_eq!(safe_redirect(None), "/");
        assert_eq!(safe_redirect(Some("")), "/");
        assert_eq!(safe_redirect(Some("https://evil.example")), "/");
        assert_eq!(safe_redirect(Some("//evil.example")), "/");
        assert_eq!(safe_redirect(Some("/\\evil.example")), "/");
    }
}
