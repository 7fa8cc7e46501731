use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: &str = "signature impersonation";
/// Scope a user must consent to before an application can act on their behalf.
pub const IMPERSONATION_SCOPE: &str = "impersonation";

/// Ordered set of OAuth2 scope tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct Scopes(Vec<String>);

impl Scopes {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner: Vec<String> = Vec::new();
        for scope in scopes.into_iter().map(Into::into) {
            let scope = scope.trim().to_string();
            if !scope.is_empty() && !inner.contains(&scope) {
                inner.push(scope);
            }
        }
        Self(inner)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Scopes to ask consent for: the configured ones plus `impersonation`.
    pub fn for_consent(&self) -> Self {
        Self::new(self.iter().chain([IMPERSONATION_SCOPE]))
    }
}

impl Default for Scopes {
    fn default() -> Self {
        Self::from(DEFAULT_SCOPES)
    }
}

impl FromStr for Scopes {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.split_whitespace()))
    }
}

impl From<&str> for Scopes {
    fn from(value: &str) -> Self {
        Self::new(value.split_whitespace())
    }
}

impl From<String> for Scopes {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Scopes> for String {
    fn from(value: Scopes) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}
