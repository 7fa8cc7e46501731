use std::{fmt, io, path::Path};

use thiserror::Error;
use url::Url;

use crate::{ClientID, key::PrivateKeyPem, scope::Scopes};

const TOKEN_PATH: &str = "/oauth/token";
const CONSENT_PATH: &str = "/oauth/auth";

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("missing required configuration value: `{0}`")]
    MissingField(&'static str),
    #[error("invalid authorization server `{0}`: `{1}`")]
    InvalidAuthServer(String, String),
    #[error("invalid consent redirect uri `{0}`: `{1}`")]
    InvalidRedirectUri(String, String),
    #[error("reading private key file: `{0}`")]
    PrivateKeyFile(#[from] io::Error),
    #[error("unusable private key: `{0}`")]
    InvalidPrivateKey(String),
}

/// Base URL of the authorization server.
///
/// Built from a bare host such as `account.example.com`, in which case `https` is implied,
/// or from a full base URL such as `http://127.0.0.1:8080`.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthServer(Url);

impl TryFrom<&str> for AuthServer {
    type Error = ConfigurationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim();
        let invalid = |reason: String| ConfigurationError::InvalidAuthServer(value.into(), reason);

        let url = match value.split_once("://") {
            Some((_, rest)) if rest.trim_matches('/').is_empty() => {
                return Err(invalid("missing host".into()));
            }
            Some(_) => Url::parse(value),
            None => Url::parse(&format!("https://{value}")),
        }
        .map_err(|e| invalid(e.to_string()))?;

        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host".into()));
        }
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
        }
        if url.path() != "/" || url.query().is_some() {
            return Err(invalid("expected a host without path or query".into()));
        }

        Ok(Self(url))
    }
}

impl AuthServer {
    /// Host (and port, when not the default one) used as the assertion audience.
    pub fn audience(&self) -> String {
        let host = self.0.host_str().unwrap_or_default();
        match self.0.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    /// Endpoint where assertions are exchanged for access tokens.
    pub fn token_endpoint(&self) -> Url {
        self.endpoint(TOKEN_PATH)
    }

    /// Endpoint a user visits to grant consent.
    pub fn consent_endpoint(&self) -> Url {
        self.endpoint(CONSENT_PATH)
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.0.clone();
        url.set_path(path);
        url
    }
}

impl fmt::Display for AuthServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_str().trim_end_matches('/'))
    }
}

/// Credentials used to obtain tokens on behalf of a single impersonated user.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialConfig {
    client_id: ClientID,
    user_id: String,
    auth_server: AuthServer,
    private_key: PrivateKeyPem,
    scopes: Scopes,
    redirect_uri: Url,
}

impl CredentialConfig {
    pub fn builder() -> CredentialConfigBuilder {
        CredentialConfigBuilder::default()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn auth_server(&self) -> &AuthServer {
        &self.auth_server
    }

    pub fn private_key(&self) -> &PrivateKeyPem {
        &self.private_key
    }

    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }
}

#[derive(Debug, Default)]
pub struct CredentialConfigBuilder {
    client_id: Option<ClientID>,
    user_id: Option<String>,
    auth_server: Option<String>,
    private_key: Option<Result<PrivateKeyPem, ConfigurationError>>,
    scopes: Option<Scopes>,
    redirect_uri: Option<String>,
}

impl CredentialConfigBuilder {
    pub fn client_id(self, client_id: impl Into<ClientID>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..self
        }
    }

    pub fn user_id(self, user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..self
        }
    }

    pub fn auth_server(self, auth_server: impl Into<String>) -> Self {
        Self {
            auth_server: Some(auth_server.into()),
            ..self
        }
    }

    pub fn private_key(self, private_key: PrivateKeyPem) -> Self {
        Self {
            private_key: Some(Ok(private_key)),
            ..self
        }
    }

    /// Reads the private key from a PEM file. Read failures are reported by [`Self::build`].
    pub fn private_key_path(self, path: &Path) -> Self {
        Self {
            private_key: Some(PrivateKeyPem::from_file(path).map_err(Into::into)),
            ..self
        }
    }

    pub fn scopes(self, scopes: Scopes) -> Self {
        Self {
            scopes: Some(scopes),
            ..self
        }
    }

    pub fn redirect_uri(self, redirect_uri: impl Into<String>) -> Self {
        Self {
            redirect_uri: Some(redirect_uri.into()),
            ..self
        }
    }

    pub fn build(self) -> Result<CredentialConfig, ConfigurationError> {
        let client_id = required(self.client_id, "client_id")?;
        let user_id = required(self.user_id, "user_id")?;
        let auth_server = AuthServer::try_from(required(self.auth_server, "auth_server")?.as_str())?;

        let private_key = self
            .private_key
            .ok_or(ConfigurationError::MissingField("private_key"))??;
        if private_key.is_empty() {
            return Err(ConfigurationError::MissingField("private_key"));
        }

        let redirect_uri = required(self.redirect_uri, "redirect_uri")?;
        let redirect_uri = Url::parse(&redirect_uri)
            .map_err(|e| ConfigurationError::InvalidRedirectUri(redirect_uri, e.to_string()))?;

        let scopes = self.scopes.filter(|s| !s.is_empty()).unwrap_or_default();

        Ok(CredentialConfig {
            client_id,
            user_id,
            auth_server,
            private_key,
            scopes,
            redirect_uri,
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigurationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigurationError::MissingField(name))
}
