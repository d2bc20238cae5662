use crate::models::user::Identity;

/// Outcome of checking a request path against the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// No session where one is required
    Unauthenticated,
    /// A session without the required role
    Forbidden,
}

/// Path-prefix gate for the admin area and the personal area
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    admin_prefixes: Vec<String>,
    personal_prefixes: Vec<String>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(
            ["/admin", "/api/admin"],
            ["/mypage", "/api/mypage"],
        )
    }
}

impl AccessPolicy {
    pub fn new<A, P>(admin_prefixes: A, personal_prefixes: P) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            admin_prefixes: admin_prefixes.into_iter().map(Into::into).collect(),
            personal_prefixes: personal_prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Given a request path and the session identity, decide allow/deny
    pub fn decide(&self, path: &str, identity: Option<&Identity>) -> AccessDecision {
        let path = normalize(path);

        if self.admin_prefixes.iter().any(|p| under_prefix(&path, p)) {
            return match identity {
                None => AccessDecision::Unauthenticated,
                Some(identity) if identity.is_admin() => AccessDecision::Allow,
                Some(_) => AccessDecision::Forbidden,
            };
        }

        if self.personal_prefixes.iter().any(|p| under_prefix(&path, p)) {
            return match identity {
                None => AccessDecision::Unauthenticated,
                Some(_) => AccessDecision::Allow,
            };
        }

        AccessDecision::Allow
    }
}

/// Collapses repeated slashes and lowercases, so `//Admin` is still gated
fn normalize(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    let mut previous_slash = false;

    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        normalized.push(c.to_ascii_lowercase());
    }

    normalized
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
