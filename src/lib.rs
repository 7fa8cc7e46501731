pub mod acquirer;
pub mod assertion;
pub mod cache;
pub mod classifier;
pub mod clock;
pub mod commands;
pub mod config;
pub mod http;
pub mod http_client;
pub mod jwt;
pub mod key;
pub mod parameters;
pub mod scope;
pub mod token;
pub mod token_retriever;

use crate::{classifier::ConsentRequired, config::ConfigurationError, token::Token};
use thiserror::Error;

pub use token_retriever::{TokenRetriever, TokenRetrieverWithCache};

/// Integration key identifying the application against the authorization server.
pub type ClientID = String;

/// Result of a token check: the usable token, or the reason there is none.
pub type AuthorizationOutcome = Result<Token, AuthorizationError>;

#[derive(Error, Debug)]
pub enum AuthorizationError {
    #[error("invalid configuration: `{0}`")]
    Configuration(#[from] ConfigurationError),
    #[error("signing JWT assertion: `{0}`")]
    Signing(#[from] jwt::error::JwtEncoderError),
    #[error("{0}")]
    ConsentRequired(ConsentRequired),
    #[error("authorization server error: Status code: `{status}`, Body: `{body}`")]
    AuthServer { status: u16, body: String },
    #[error("http transport error: `{0}`")]
    Transport(String),
    #[error("invalid token response: `{0}`")]
    InvalidTokenResponse(String),
}

impl AuthorizationError {
    /// Only transport failures are transient. Everything else needs someone to act
    /// (grant consent, fix the configuration) before a new attempt can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthorizationError::Transport(_))
    }

    /// Parses the body of an [`AuthorizationError::AuthServer`] as an OAuth2 error response.
    pub fn error_response(&self) -> Option<classifier::ErrorResponse> {
        match self {
            AuthorizationError::AuthServer { body, .. } => serde_json::from_str(body).ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(AuthorizationError::Transport("connection refused".into()), true)]
    #[case(AuthorizationError::AuthServer { status: 400, body: "{}".into() }, false)]
    #[case(AuthorizationError::InvalidTokenResponse("bad type".into()), false)]
    #[case(
        AuthorizationError::Configuration(ConfigurationError::MissingField("client_id")),
        false
    )]
    fn only_transport_errors_are_retryable(
        #[case] error: AuthorizationError,
        #[case] expected: bool,
    ) {
        assert_eq!(error.is_retryable(), expected);
    }

    #[test]
    fn error_response_parses_auth_server_body() {
        let error = AuthorizationError::AuthServer {
            status: 400,
            body: r#"{"error":"invalid_grant","error_description":"no_valid_keys_or_signatures"}"#
                .into(),
        };

        let response = error.error_response().unwrap();
        assert_eq!(response.error, "invalid_grant");
        assert_eq!(
            response.error_description.as_deref(),
            Some("no_valid_keys_or_signatures")
        );

        assert!(
            AuthorizationError::Transport("timeout".into())
                .error_response()
                .is_none()
        );
    }
}
