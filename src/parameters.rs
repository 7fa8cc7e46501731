use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use clap::{Args, Subcommand, ValueEnum};

use crate::config::{ConfigurationError, CredentialConfig};
use crate::http::config::HttpConfig;
use crate::scope::Scopes;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prints a valid access token for the configured credentials, acquiring it through the
    /// JWT Grant flow.
    CheckToken {
        /// Credentials of the application and the impersonated user.
        #[command(flatten)]
        credentials: CredentialArgs,

        /// Select format how the Token should be obtained
        #[arg(long, value_enum, default_value_t = OutputTokenFormat::Plain)]
        output_token_format: OutputTokenFormat,

        /// Timeouts and caller-side retry policy.
        #[command(flatten)]
        request: RequestArgs,
    },
}

#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum OutputTokenFormat {
    /// Returns only the access token without type or expiration day
    #[value(name = "Plain")]
    Plain,
    /// Returns full token information in json format
    #[value(name = "Json")]
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Every value is optional here so that a missing one is reported as a configuration
/// problem by [`CredentialConfig`] rather than as a usage error.
#[derive(Args, Debug, Clone, Default)]
pub struct CredentialArgs {
    /// Integration key (client ID) of the application
    #[arg(long, env = "JWT_GRANT_CLIENT_ID")]
    client_id: Option<String>,

    /// ID of the user the application acts on behalf of
    #[arg(long, env = "JWT_GRANT_USER_ID")]
    user_id: Option<String>,

    /// Authorization server host, e.g. account.example.com, or base URL
    #[arg(long, env = "JWT_GRANT_AUTH_SERVER")]
    auth_server: Option<String>,

    /// Path to the RSA private key (PEM) of the integration key
    #[arg(long, env = "JWT_GRANT_PRIVATE_KEY_PATH")]
    private_key_path: Option<PathBuf>,

    /// Redirect URI registered for the integration key, used in the consent URL
    #[arg(long, env = "JWT_GRANT_REDIRECT_URI")]
    redirect_uri: Option<String>,

    /// Space-separated scopes to request
    #[arg(long, env = "JWT_GRANT_SCOPES")]
    scopes: Option<String>,
}

impl CredentialArgs {
    pub fn to_config(&self) -> Result<CredentialConfig, ConfigurationError> {
        let mut builder = CredentialConfig::builder();
        if let Some(client_id) = &self.client_id {
            builder = builder.client_id(client_id);
        }
        if let Some(user_id) = &self.user_id {
            builder = builder.user_id(user_id);
        }
        if let Some(auth_server) = &self.auth_server {
            builder = builder.auth_server(auth_server);
        }
        if let Some(path) = &self.private_key_path {
            builder = builder.private_key_path(path);
        }
        if let Some(redirect_uri) = &self.redirect_uri {
            builder = builder.redirect_uri(redirect_uri);
        }
        if let Some(scopes) = &self.scopes {
            builder = builder.scopes(Scopes::from(scopes.as_str()));
        }
        builder.build()
    }
}

#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Timeout in milliseconds for the whole token request
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Timeout in milliseconds for establishing the connection
    #[arg(long, default_value_t = 5_000)]
    connect_timeout_ms: u64,

    /// Seconds before expiry at which a token stops being used
    #[arg(long, default_value_t = 60)]
    safety_margin_secs: u32,

    /// Lifetime in seconds of the signed assertion, capped at one hour
    #[arg(long, default_value_t = 3600)]
    assertion_lifetime_secs: u32,

    /// Extra attempts after a transport failure. Other failures are never retried.
    #[arg(long, default_value_t = 0)]
    transport_retries: u8,

    /// Delay in milliseconds before the first retry, growing linearly with each attempt
    #[arg(long, default_value_t = 1_000)]
    retry_delay_ms: u64,
}

impl RequestArgs {
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig::new(
            Duration::from_millis(self.timeout_ms),
            Duration::from_millis(self.connect_timeout_ms),
        )
    }

    pub fn safety_margin(&self) -> TimeDelta {
        TimeDelta::seconds(self.safety_margin_secs.into())
    }

    pub fn assertion_lifetime(&self) -> TimeDelta {
        TimeDelta::seconds(self.assertion_lifetime_secs.into())
    }

    pub fn transport_retries(&self) -> u8 {
        self.transport_retries
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
