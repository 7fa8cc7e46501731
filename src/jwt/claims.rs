use serde::{Deserialize, Serialize};

/// Claims of a JWT Grant assertion (RFC 7523, section 3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Issuer. The integration key (client ID) will be used here.
    pub(crate) iss: String,
    /// Subject. The user being impersonated.
    pub(crate) sub: String,
    /// Audience. Host of the authorization server.
    pub(crate) aud: String,
    /// Issued at (as UTC timestamp).
    pub(crate) iat: u64,
    /// Expiration time (as UTC timestamp).
    pub(crate) exp: u64,
    /// Space-separated scopes requested for the access token.
    pub(crate) scope: String,
}

impl Claims {
    pub fn iss(&self) -> &str {
        &self.iss
    }

    pub fn sub(&self) -> &str {
        &self.sub
    }

    pub fn aud(&self) -> &str {
        &self.aud
    }

    pub fn iat(&self) -> u64 {
        self.iat
    }

    pub fn exp(&self) -> u64 {
        self.exp
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}
