use std::{thread, time::Duration};

use tracing::warn;

use crate::{
    AuthorizationError, AuthorizationOutcome, TokenRetriever, parameters::OutputTokenFormat,
    token::Token,
};

/// Runs a token check on behalf of the CLI and turns its outcome into user-facing text.
pub struct CheckTokenCommand<R>
where
    R: TokenRetriever,
{
    retriever: R,
    transport_retries: u8,
    retry_delay: Duration,
}

impl<R> CheckTokenCommand<R>
where
    R: TokenRetriever,
{
    pub fn new(retriever: R) -> Self {
        Self {
            retriever,
            transport_retries: 0,
            retry_delay: Duration::ZERO,
        }
    }

    /// Retries transport failures up to `retries` times, waiting `delay * attempt` between
    /// attempts.
    pub fn with_transport_retries(self, retries: u8, delay: Duration) -> Self {
        Self {
            transport_retries: retries,
            retry_delay: delay,
            ..self
        }
    }

    pub fn execute(&self) -> AuthorizationOutcome {
        let mut attempt: u8 = 0;
        loop {
            match self.retriever.retrieve() {
                Err(e) if e.is_retryable() && attempt < self.transport_retries => {
                    attempt += 1;
                    warn!("transport error retrieving token, retrying ({attempt}): {e}");
                    thread::sleep(self.retry_delay.saturating_mul(attempt.into()));
                }
                outcome => return outcome,
            }
        }
    }
}

pub fn render_token(token: &Token, format: &OutputTokenFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputTokenFormat::Plain => Ok(token.access_token().to_owned()),
        OutputTokenFormat::Json => serde_json::to_string_pretty(token),
    }
}

/// Message for failures the user can act on. Other failures have no message and are left to
/// the caller.
pub fn describe_failure(error: &AuthorizationError) -> Option<String> {
    match error {
        AuthorizationError::Configuration(e) => Some(format!(
            "Problem: the credentials are not configured ({e}).\n\
             Set them through the command line flags or the JWT_GRANT_* environment variables."
        )),
        AuthorizationError::ConsentRequired(consent) => Some(format!(
            "Problem: C O N S E N T   R E Q U I R E D\n\n\
             Ask the user who will be impersonated to open the following URL:\n    {}\n\n\
             It will ask the user to log in and to approve access by the application.\n\
             Alternatively, an administrator can pre-approve one or more users.",
            consent.consent_url()
        )),
        AuthorizationError::AuthServer { status, body } => {
            let body = serde_json::from_str::<serde_json::Value>(body)
                .and_then(|value| serde_json::to_string_pretty(&value))
                .unwrap_or_else(|_| body.to_owned());
            Some(format!(
                "Authorization server problem: Status code {status}, message body:\n{body}"
            ))
        }
        _ => None,
    }
}
