//! Routing of authorization server failures.
//!
//! A `consent_required` error is not a plain failure: the impersonated user, or an
//! administrator, has to grant consent once before the JWT Grant can succeed. It is surfaced
//! with the URL that user has to visit. Any other error body is reported verbatim, and a
//! response without a parseable body is a transport problem.

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::{AuthorizationError, config::CredentialConfig, scope::Scopes};

/// `error` value sent by the authorization server when consent is missing.
pub const CONSENT_REQUIRED: &str = "consent_required";

/// OAuth2 error response body (RFC 6749, section 5.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

/// Everything needed to point a user at the consent page.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsentRequest {
    consent_endpoint: Url,
    client_id: String,
    scopes: Scopes,
    redirect_uri: Url,
}

impl From<&CredentialConfig> for ConsentRequest {
    fn from(config: &CredentialConfig) -> Self {
        Self {
            consent_endpoint: config.auth_server().consent_endpoint(),
            client_id: config.client_id().to_owned(),
            scopes: config.scopes().for_consent(),
            redirect_uri: config.redirect_uri().to_owned(),
        }
    }
}

impl ConsentRequest {
    /// `https://{host}/oauth/auth?response_type=code&scope=..&client_id=..&redirect_uri=..`
    pub fn consent_url(&self) -> Url {
        let mut url = self.consent_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes.to_string())
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_uri.as_str());
        url
    }
}

/// The impersonated user has not granted consent to the application yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsentRequired {
    consent_url: Url,
    description: Option<String>,
}

impl ConsentRequired {
    pub fn consent_url(&self) -> &Url {
        &self.consent_url
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl fmt::Display for ConsentRequired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "consent required, grant it at: {}", self.consent_url)
    }
}

/// Turns an unsuccessful token endpoint response, or any API response carrying an OAuth2
/// error body, into an [`AuthorizationError`].
pub fn classify(status: StatusCode, body: &[u8], consent: &ConsentRequest) -> AuthorizationError {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return AuthorizationError::Transport(format!(
            "response without a parseable body, status `{status}`: `{}`",
            String::from_utf8_lossy(body)
        ));
    };

    let error_response = serde_json::from_value::<ErrorResponse>(value).ok();

    match error_response {
        Some(response) if response.error == CONSENT_REQUIRED => {
            let consent_url = consent.consent_url();
            warn!(%consent_url, "consent required for the impersonated user");
            AuthorizationError::ConsentRequired(ConsentRequired {
                consent_url,
                description: response.error_description,
            })
        }
        _ => AuthorizationError::AuthServer {
            status: status.as_u16(),
            body: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rstest::rstest;

    use super::*;
    use crate::config::tests::test_config;

    fn consent() -> ConsentRequest {
        ConsentRequest::from(&test_config("account.example.com"))
    }

    #[test]
    fn consent_required_carries_consent_url() {
        let error = classify(
            StatusCode::BAD_REQUEST,
            br#"{"error":"consent_required"}"#,
            &consent(),
        );

        assert_matches!(error, AuthorizationError::ConsentRequired(consent_required) => {
            let url = consent_required.consent_url();
            assert_eq!(url.host_str(), Some("account.example.com"));
            assert_eq!(url.path(), "/oauth/auth");

            let pairs: Vec<(String, String)> = url
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            assert_eq!(
                pairs,
                vec![
                    ("response_type".to_string(), "code".to_string()),
                    ("scope".to_string(), "signature impersonation".to_string()),
                    ("client_id".to_string(), "integration-key".to_string()),
                    (
                        "redirect_uri".to_string(),
                        "https://app.example.com/callback?x=1".to_string()
                    ),
                ]
            );
            assert!(consent_required.description().is_none());
        });
    }

    #[test]
    fn consent_url_encodes_query_values() {
        let url = consent().consent_url();
        assert_eq!(
            url.as_str(),
            "https://account.example.com/oauth/auth?response_type=code&scope=signature+impersonation\
             &client_id=integration-key&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcallback%3Fx%3D1"
        );
    }

    #[test]
    fn consent_required_keeps_description_and_renders_url() {
        let error = classify(
            StatusCode::BAD_REQUEST,
            br#"{"error":"consent_required","error_description":"user has not consented"}"#,
            &consent(),
        );

        assert!(error.to_string().contains("https://account.example.com/oauth/auth?"));
        assert_matches!(error, AuthorizationError::ConsentRequired(c) => {
            assert_eq!(c.description(), Some("user has not consented"))
        });
    }

    #[rstest]
    #[case(StatusCode::BAD_REQUEST, r#"{"error":"invalid_grant"}"#)]
    #[case(StatusCode::UNAUTHORIZED, r#"{"error":"invalid_client","error_description":"bad key"}"#)]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, r#"{"message":"oops"}"#)]
    #[case(StatusCode::OK, r#"{"unexpected":true}"#)]
    fn other_errors_are_reported_verbatim(#[case] status: StatusCode, #[case] body: &str) {
        let error = classify(status, body.as_bytes(), &consent());

        assert_matches!(error, AuthorizationError::AuthServer { status: s, body: b } => {
            assert_eq!(s, status.as_u16());
            assert_eq!(b, body);
        });
    }

    #[rstest]
    #[case(b"")]
    #[case(b"<html>Bad Gateway</html>")]
    fn unparseable_bodies_are_transport_errors(#[case] body: &[u8]) {
        assert_matches!(
            classify(StatusCode::BAD_GATEWAY, body, &consent()),
            AuthorizationError::Transport(_)
        );
    }
}
