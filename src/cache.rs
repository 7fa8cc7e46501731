use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::trace;

use crate::token::Token;

/// Tokens expiring within this window are treated as already expired.
pub const DEFAULT_SAFETY_MARGIN: TimeDelta = TimeDelta::seconds(60);

/// In-process store for the current token of one credential.
#[derive(Debug)]
pub struct TokenCache {
    safety_margin: TimeDelta,
    token: RwLock<Option<Token>>,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(DEFAULT_SAFETY_MARGIN)
    }
}

impl TokenCache {
    pub fn new(safety_margin: TimeDelta) -> Self {
        Self {
            safety_margin: safety_margin.max(TimeDelta::zero()),
            token: RwLock::new(None),
        }
    }

    pub fn safety_margin(&self) -> TimeDelta {
        self.safety_margin
    }

    /// Returns the cached token if it is still valid at `now`.
    pub fn get_at(&self, now: DateTime<Utc>) -> Option<Token> {
        // The entry is always replaced as a whole, so a poisoned lock still guards a
        // consistent value.
        let cached = self.token.read().unwrap_or_else(PoisonError::into_inner);

        match cached.as_ref() {
            Some(token) if token.is_valid_at(now, self.safety_margin) => Some(token.clone()),
            Some(_) => {
                trace!("cached token is expired or about to expire");
                None
            }
            None => None,
        }
    }

    pub fn get(&self) -> Option<Token> {
        self.get_at(Utc::now())
    }

    /// Replaces the cached entry.
    pub fn set(&self, token: Token) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
