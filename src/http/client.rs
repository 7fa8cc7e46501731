use http::{Request, Response};
use reqwest::blocking::{Client, Response as BlockingResponse};

use crate::http::config::HttpConfig;
use crate::http_client::{HttpClient as OauthHttpClient, HttpClientError as OauthHttpClientError};

/// Blocking reqwest client bounded by the timeouts of an [`HttpConfig`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Result<Self, HttpBuildError> {
        let builder = Client::builder()
            .use_rustls_tls()
            .tls_built_in_native_certs(true)
            .timeout(config.timeout)
            .connect_timeout(config.conn_timeout);

        let client = builder
            .build()
            .map_err(|err| HttpBuildError::ClientBuilder(err.to_string()))?;

        Ok(Self { client })
    }

    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpResponseError> {
        let (parts, body) = request.into_parts();
        let req = self
            .client
            .request(parts.method, parts.uri.to_string().as_str())
            .headers(parts.headers)
            .body(body);

        let res = req.send().map_err(|err| {
            if err.is_timeout() {
                HttpResponseError::Timeout(err.to_string())
            } else {
                HttpResponseError::TransportError(err.to_string())
            }
        })?;

        try_build_response(res)
    }
}

fn try_build_response(res: BlockingResponse) -> Result<Response<Vec<u8>>, HttpResponseError> {
    let status = res.status();
    let version = res.version();

    let body: Vec<u8> = res
        .bytes()
        .map_err(|err| {
            if err.is_timeout() {
                HttpResponseError::Timeout(err.to_string())
            } else {
                HttpResponseError::ReadingResponse(err.to_string())
            }
        })?
        .into();

    http::Response::builder()
        .status(status)
        .version(version)
        .body(body)
        .map_err(|err| HttpResponseError::BuildingResponse(err.to_string()))
}

impl OauthHttpClient for HttpClient {
    fn send(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, OauthHttpClientError> {
        let response = self.send(req)?;

        Ok(response)
    }
}

impl From<HttpResponseError> for OauthHttpClientError {
    fn from(err: HttpResponseError) -> Self {
        match err {
            HttpResponseError::TransportError(msg) => OauthHttpClientError::TransportError(msg),
            HttpResponseError::Timeout(msg) => OauthHttpClientError::Timeout(msg),
            HttpResponseError::BuildingResponse(msg) | HttpResponseError::ReadingResponse(msg) => {
                OauthHttpClientError::InvalidResponse(msg)
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum HttpBuildError {
    #[error("could not build the http client: {0}")]
    ClientBuilder(String),
}

#[derive(thiserror::Error, Debug)]
enum HttpResponseError {
    #[error("could not read response body: {0}")]
    ReadingResponse(String),
    #[error("could not build response: {0}")]
    BuildingResponse(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("http transport error: `{0}`")]
    TransportError(String),
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use http::{StatusCode, header::CONTENT_TYPE};
    use httpmock::{Method::POST, MockServer};

    use super::*;

    fn post(url: String) -> Request<Vec<u8>> {
        Request::builder()
            .method("POST")
            .uri(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(b"grant_type=test".to_vec())
            .unwrap()
    }

    #[test]
    fn forwards_request_and_returns_response() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/oauth/token")
                .header("content-type", "application/x-www-form-urlencoded");
            then.status(400).body(r#"{"error":"invalid_grant"}"#);
        });

        let client = HttpClient::new(HttpConfig::default()).unwrap();
        let response =
            OauthHttpClient::send(&client, post(server.url("/oauth/token"))).unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.body(), br#"{"error":"invalid_grant"}"#);
        mock.assert();
    }

    #[test]
    fn slow_server_times_out() {
        let timeout = Duration::from_millis(100);
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(200).delay(timeout * 5);
        });

        let client = HttpClient::new(HttpConfig::new(timeout, timeout)).unwrap();
        let error =
            OauthHttpClient::send(&client, post(server.url("/oauth/token"))).unwrap_err();

        assert_matches!(error, OauthHttpClientError::Timeout(_));
        mock.assert();
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        // Nothing listens on the discard port.
        let client = HttpClient::new(HttpConfig::new(
            Duration::from_millis(500),
            Duration::from_millis(500),
        ))
        .unwrap();
        let error =
            OauthHttpClient::send(&client, post("http://127.0.0.1:9/oauth/token".into()))
                .unwrap_err();

        assert_matches!(
            error,
            OauthHttpClientError::TransportError(_) | OauthHttpClientError::Timeout(_)
        );
    }
}
