use std::fmt;

use http::{
    Request, Response, StatusCode,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::{Url, form_urlencoded};

use crate::{
    AuthorizationError,
    assertion::{Assertion, JWT_BEARER_GRANT_TYPE},
    classifier::{ConsentRequest, classify},
    config::CredentialConfig,
    http_client::HttpClient,
    token::AccessToken,
};

/// Exchanges a signed assertion for an access token.
///
/// Implementations make a single attempt. Whether and when to try again is up to the caller.
pub trait TokenAcquirer {
    fn acquire(&self, assertion: &Assertion) -> Result<TokenResponse, AuthorizationError>;
}

/// JWT bearer grant request (RFC 7523, section 2.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub assertion: String,
}

impl From<&Assertion> for TokenRequest {
    fn from(assertion: &Assertion) -> Self {
        Self {
            grant_type: JWT_BEARER_GRANT_TYPE.to_owned(),
            assertion: assertion.value().to_owned(),
        }
    }
}

impl TokenRequest {
    fn form_encoded(&self) -> Vec<u8> {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", &self.grant_type)
            .append_pair("assertion", &self.assertion)
            .finish()
            .into_bytes()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: AccessToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// The lifetime in seconds of the access token.
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// HTTP-based token acquirer posting to the authorization server token endpoint.
pub struct HttpTokenAcquirer<C: HttpClient> {
    http_client: C,
    token_endpoint: Url,
    consent: ConsentRequest,
}

impl<C: HttpClient> fmt::Debug for HttpTokenAcquirer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTokenAcquirer")
            .field("token_endpoint", &self.token_endpoint)
            .field("consent", &self.consent)
            .field("http_client", &"impl HttpClient") // HttpClient does not implement Debug
            .finish()
    }
}

impl<C: HttpClient> HttpTokenAcquirer<C> {
    pub fn new(http_client: C, config: &CredentialConfig) -> Self {
        Self {
            http_client,
            token_endpoint: config.auth_server().token_endpoint(),
            consent: ConsentRequest::from(config),
        }
    }
}

impl<C: HttpClient> TokenAcquirer for HttpTokenAcquirer<C> {
    fn acquire(&self, assertion: &Assertion) -> Result<TokenResponse, AuthorizationError> {
        let request = build_request(&TokenRequest::from(assertion), &self.token_endpoint)?;

        debug!(endpoint = %self.token_endpoint, "requesting access token");
        let response = self
            .http_client
            .send(request)
            .map_err(|e| AuthorizationError::Transport(e.to_string()))?;

        evaluate_response(response, &self.consent)
    }
}

fn build_request(
    token_request: &TokenRequest,
    uri: &Url,
) -> Result<Request<Vec<u8>>, AuthorizationError> {
    Request::builder()
        .uri(uri.as_str())
        .method("POST")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(ACCEPT, "application/json")
        .body(token_request.form_encoded())
        .map_err(|e| AuthorizationError::Transport(format!("Failed to build request: {e}")))
}

fn evaluate_response(
    res: Response<Vec<u8>>,
    consent: &ConsentRequest,
) -> Result<TokenResponse, AuthorizationError> {
    let status = res.status();
    let body = res.body();

    if status == StatusCode::OK {
        if let Ok(token_response) = serde_json::from_slice::<TokenResponse>(body) {
            return Ok(token_response);
        }
        debug!("token endpoint answered 200 without a token");
    }

    Err(classify(status, body, consent))
}
