//! Rate limit key construction.

/// A key identifying who is being limited for which operation.
///
/// Rendered as `<scope>:<subject>`, e.g. `job-search:42`. The limiter
/// accepts any string, so this is a convenience for building keys the
/// same way everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    /// The rate-limited operation
    pub scope: String,
    /// The caller being limited, usually a user id
    pub subject: String,
}

impl RateLimitKey {
    /// Create a new key from a scope and subject.
    pub fn new(scope: &str, subject: &str) -> Self {
        Self {
            scope: scope.to_string(),
            subject: subject.to_string(),
        }
    }

    /// Split a rendered key at its first `:`.
    pub fn parse(key: &str) -> Option<Self> {
        let (scope, subject) = key.split_once(':')?;
        if scope.is_empty() {
            return None;
        }
        Some(Self::new(scope, subject))
    }

    /// Convert the key to its string form.
    pub fn to_string_key(&self) -> String {
        format!("{}:{}", self.scope, self.subject)
    }
}

impl std::fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scope, self.subject)
    }
}
