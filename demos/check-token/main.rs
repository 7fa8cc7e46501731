//! Example to retrieve a token using the `jwt-grant-auth` library.
//!
//! This example demonstrates how to:
//! - Build a `CredentialConfig` from environment variables.
//! - Configure and use a token retriever with caching.
//! - Act on a `consent_required` answer from the authorization server.
//!
use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use jwt_grant_auth::AuthorizationError;
use jwt_grant_auth::config::CredentialConfig;
use jwt_grant_auth::http::client::HttpClient;
use jwt_grant_auth::http::config::HttpConfig;
use jwt_grant_auth::token_retriever::http_impl;

/// Main function to retrieve and print an access token.
/// It requires the following environment variables to be set, in the environment or in a
/// `.env` file:
///
/// CLIENT_ID: Integration key of the application
/// USER_ID: ID of the impersonated user
/// AUTH_SERVER: Authorization server host
/// PRIVATE_KEY_PATH: Path to the RSA private key of the integration key
/// REDIRECT_URI: Redirect URI registered for the integration key
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine when the variables are exported.
    let _ = dotenv();

    let config = CredentialConfig::builder()
        .client_id(env::var("CLIENT_ID")?)
        .user_id(env::var("USER_ID")?)
        .auth_server(env::var("AUTH_SERVER")?)
        .private_key_path(PathBuf::from(env::var("PRIVATE_KEY_PATH")?).as_path())
        .redirect_uri(env::var("REDIRECT_URI")?)
        .build()?;

    let client = HttpClient::new(HttpConfig::default())?;
    let retriever = http_impl::from_config(config, client)?;

    match retriever.check_token() {
        Ok(token) => {
            println!("{}", token.access_token());
            // Served from the cache this time.
            let again = retriever.check_token()?;
            println!("Authorization: {again}");
            Ok(())
        }
        Err(AuthorizationError::ConsentRequired(consent)) => {
            println!("Consent required, open: {}", consent.consent_url());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
