//! Route matching logic.
//!
//! # Design Decisions
//! - Path matching is case-sensitive and segment-aware: `/users` matches
//!   `/users` and `/users/42` but not `/usersettings`
//! - A trailing `/**` or `/*` in the configured pattern is accepted and stripped
//! - No regex to guarantee O(n) matching

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a matcher from a configured path pattern.
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let trimmed = pattern
            .trim_end_matches("**")
            .trim_end_matches('*')
            .trim_end_matches('/');
        Self {
            prefix: trimmed.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.prefix.is_empty() {
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/api/**");
        assert_eq!(matcher.prefix(), "/api");
        assert!(matcher.matches("/api"));
        assert!(matcher.matches("/api/v1"));
        assert!(!matcher.matches("/apiv1"));
        assert!(!matcher.matches("/images"));
    }

    #[test]
    fn test_root_matches_everything() {
        for pattern in ["/", "/**", "/*"] {
            let matcher = PathPrefixMatcher::new(pattern);
            assert!(matcher.matches("/"));
            assert!(matcher.matches("/anything/at/all"));
        }
    }

    #[test]
    fn test_plain_prefix() {
        let matcher = PathPrefixMatcher::new("/orders/");
        assert!(matcher.matches("/orders/1"));
        assert!(!matcher.matches("/order"));
    }
}
