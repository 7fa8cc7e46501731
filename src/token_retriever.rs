use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info};

use crate::{
    AuthorizationOutcome,
    acquirer::TokenAcquirer,
    assertion::AssertionBuilder,
    cache::TokenCache,
    clock::{Clock, SystemClock},
    config::CredentialConfig,
    jwt::signer::JwtSigner,
    token::Token,
};

pub mod http_impl;

/// The TokenRetriever will be the responsible to retrieve an authorization token
pub trait TokenRetriever {
    fn retrieve(&self) -> AuthorizationOutcome;
}

/// Keeps one access token for one credential and renews it on demand.
///
/// A valid cached token is returned as is. Otherwise a new assertion is signed and exchanged
/// exactly once; concurrent callers wait for that exchange and then read its result from the
/// cache instead of starting their own.
///
/// Failures are not cached, so callers that were waiting behind a failed exchange each make
/// their own attempt once the lock is released.
#[derive(Debug)]
pub struct TokenRetrieverWithCache<A, J, K = SystemClock>
where
    A: TokenAcquirer,
    J: JwtSigner,
    K: Clock,
{
    config: CredentialConfig,
    cache: TokenCache,
    acquisition: Mutex<()>,
    assertion_builder: AssertionBuilder<J>,
    acquirer: A,
    clock: K,
}

impl<A, J> TokenRetrieverWithCache<A, J>
where
    A: TokenAcquirer,
    J: JwtSigner,
{
    pub fn new(config: CredentialConfig, jwt_signer: J, acquirer: A) -> Self {
        Self {
            config,
            cache: TokenCache::default(),
            acquisition: Mutex::new(()),
            assertion_builder: AssertionBuilder::new(jwt_signer),
            acquirer,
            clock: SystemClock,
        }
    }
}

impl<A, J, K> TokenRetrieverWithCache<A, J, K>
where
    A: TokenAcquirer,
    J: JwtSigner,
    K: Clock,
{
    /// Replaces the time source used to decide token validity and to stamp assertions.
    pub fn with_clock<K2: Clock>(self, clock: K2) -> TokenRetrieverWithCache<A, J, K2> {
        TokenRetrieverWithCache {
            config: self.config,
            cache: self.cache,
            acquisition: self.acquisition,
            assertion_builder: self.assertion_builder,
            acquirer: self.acquirer,
            clock,
        }
    }

    pub fn with_safety_margin(self, safety_margin: TimeDelta) -> Self {
        Self {
            cache: TokenCache::new(safety_margin),
            ..self
        }
    }

    /// Lifetime of the assertions signed for new acquisitions, clamped to at most one hour.
    pub fn with_assertion_lifetime(self, lifetime: TimeDelta) -> Self {
        Self {
            assertion_builder: self.assertion_builder.with_lifetime(lifetime),
            ..self
        }
    }

    pub fn config(&self) -> &CredentialConfig {
        &self.config
    }

    /// Returns a valid token, acquiring a new one if the cached one is missing or stale.
    ///
    /// Failures are returned untouched and leave the cache as it was.
    pub fn check_token(&self) -> AuthorizationOutcome {
        if let Some(token) = self.cache.get_at(self.clock.now()) {
            debug!("using cached authorization token");
            return Ok(token);
        }

        // The guard holds no data, so poisoning carries no broken state.
        let _acquiring = self
            .acquisition
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Another caller may have refreshed the token while this one was waiting.
        let now = self.clock.now();
        if let Some(token) = self.cache.get_at(now) {
            debug!("using authorization token acquired by a concurrent caller");
            return Ok(token);
        }

        let token = self.acquire(now)?;
        info!(expires_at = %token.expires_at(), "authorization token acquired");
        self.cache.set(token.clone());

        Ok(token)
    }

    /// Drops the cached token so that the next check acquires a new one. Useful when an API
    /// call is rejected with a token that still looked valid.
    pub fn invalidate(&self) {
        debug!("invalidating cached authorization token");
        self.cache.clear();
    }

    fn acquire(&self, now: DateTime<Utc>) -> AuthorizationOutcome {
        debug!("acquiring a new authorization token");
        let assertion = self.assertion_builder.build(&self.config, now)?;
        let response = self.acquirer.acquire(&assertion).inspect_err(|e| {
            debug!("error acquiring token: {e}");
        })?;

        Token::from_response(response, now, self.config.scopes())
    }
}

impl<A, J, K> TokenRetriever for TokenRetrieverWithCache<A, J, K>
where
    A: TokenAcquirer,
    J: JwtSigner,
    K: Clock,
{
    fn retrieve(&self) -> AuthorizationOutcome {
        self.check_token()
    }
}
