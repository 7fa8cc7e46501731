use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    config::CredentialConfig,
    jwt::{claims::Claims, error::JwtEncoderError, signed::SignedJwt, signer::JwtSigner},
};

/// Lifetime of a signed assertion. Authorization servers reject longer ones.
pub const MAX_ASSERTION_LIFETIME: TimeDelta = TimeDelta::seconds(3600);
/// Grant type of the token request carrying the assertion.
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// A signed, single-use JWT Grant assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Assertion {
    claims: Claims,
    signed: SignedJwt,
}

impl Assertion {
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Compact serialization sent to the token endpoint.
    pub fn value(&self) -> &str {
        self.signed.value()
    }
}

#[derive(Debug)]
pub struct AssertionBuilder<J: JwtSigner> {
    jwt_signer: J,
    lifetime: TimeDelta,
}

impl<J: JwtSigner> AssertionBuilder<J> {
    pub fn new(jwt_signer: J) -> Self {
        Self {
            jwt_signer,
            lifetime: MAX_ASSERTION_LIFETIME,
        }
    }

    /// Shortens the assertion lifetime. Values above the maximum or below one second are
    /// clamped.
    pub fn with_lifetime(self, lifetime: TimeDelta) -> Self {
        Self {
            lifetime: lifetime.clamp(TimeDelta::seconds(1), MAX_ASSERTION_LIFETIME),
            ..self
        }
    }

    pub fn lifetime(&self) -> TimeDelta {
        self.lifetime
    }

    /// Signs a new assertion issued at `now`.
    pub fn build(
        &self,
        config: &CredentialConfig,
        now: DateTime<Utc>,
    ) -> Result<Assertion, JwtEncoderError> {
        let claims = self.claims(config, now)?;
        let signed = self.jwt_signer.sign(&claims)?;

        Ok(Assertion { claims, signed })
    }

    fn claims(
        &self,
        config: &CredentialConfig,
        now: DateTime<Utc>,
    ) -> Result<Claims, JwtEncoderError> {
        let iat = timestamp(now)?;
        let expires_at = now
            .checked_add_signed(self.lifetime)
            .ok_or(JwtEncoderError::InvalidTimestamp(now.timestamp()))?;
        let exp = timestamp(expires_at)?;

        Ok(Claims {
            iss: config.client_id().to_owned(),
            sub: config.user_id().to_owned(),
            aud: config.auth_server().audience(),
            iat,
            exp,
            scope: config.scopes().to_string(),
        })
    }
}

fn timestamp(instant: DateTime<Utc>) -> Result<u64, JwtEncoderError> {
    let seconds = instant.timestamp();
    u64::try_from(seconds).map_err(|_| JwtEncoderError::InvalidTimestamp(seconds))
}
