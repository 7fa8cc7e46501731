use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuthorizationError, acquirer::TokenResponse, scope::Scopes};

pub type AccessToken = String;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum TokenType {
    Bearer,
}

impl TryFrom<&str> for TokenType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Bearer" | "bearer" => Ok(TokenType::Bearer),
            _ => Err(format!("Invalid token type: {value}")),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Bearer => write!(f, "Bearer"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Token {
    expires_at: DateTime<Utc>,
    access_token: AccessToken,
    token_type: TokenType,
    scopes: Scopes,
}

impl Token {
    pub fn new(
        access_token: AccessToken,
        token_type: TokenType,
        expires_at: DateTime<Utc>,
        scopes: Scopes,
    ) -> Self {
        Token {
            access_token,
            token_type,
            expires_at,
            scopes,
        }
    }

    /// Builds the token described by a token endpoint response received at `now`.
    ///
    /// Servers may omit `scope` when they issued exactly what was requested, in which case
    /// `requested` is recorded as the issued scopes.
    pub fn from_response(
        response: TokenResponse,
        now: DateTime<Utc>,
        requested: &Scopes,
    ) -> Result<Self, AuthorizationError> {
        let token_type = response
            .token_type
            .as_deref()
            .map(TokenType::try_from)
            .transpose()
            .map_err(AuthorizationError::InvalidTokenResponse)?
            .unwrap_or(TokenType::Bearer);

        let expires_at = i64::try_from(response.expires_in)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthorizationError::InvalidTokenResponse(format!(
                    "expires_in out of range: {}",
                    response.expires_in
                ))
            })?;

        let scopes = response
            .scope
            .map(Scopes::from)
            .unwrap_or_else(|| requested.clone());

        Ok(Token::new(
            response.access_token,
            token_type,
            expires_at,
            scopes,
        ))
    }

    /// A token is usable only if it outlives `now` by more than `safety_margin`, so it does
    /// not expire while a request carrying it is in flight.
    pub fn is_valid_at(&self, now: DateTime<Utc>, safety_margin: TimeDelta) -> bool {
        now.checked_add_signed(safety_margin)
            .is_some_and(|deadline| deadline < self.expires_at)
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn token_type(&self) -> &TokenType {
        &self.token_type
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }
}

/// Renders the value of an `Authorization` header.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.token_type, self.access_token)
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;
    use chrono::{TimeDelta, TimeZone, Utc};
    use rstest::rstest;

    use crate::{
        AuthorizationError,
        acquirer::TokenResponse,
        scope::Scopes,
        token::{AccessToken, Token, TokenType},
    };

    fn response(expires_in: u64) -> TokenResponse {
        TokenResponse {
            access_token: "abc".to_string(),
            token_type: Some("Bearer".to_string()),
            expires_in,
            scope: None,
        }
    }

    #[rstest]
    #[case::far_from_expiry(3600, true)]
    #[case::just_outside_margin(61, true)]
    #[case::on_the_margin(60, false)]
    #[case::inside_margin(30, false)]
    #[case::expired(-10, false)]
    fn validity_honours_safety_margin(#[case] remaining_secs: i64, #[case] valid: bool) {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let token = Token::new(
            AccessToken::from("some-token"),
            TokenType::Bearer,
            now + TimeDelta::seconds(remaining_secs),
            Scopes::default(),
        );
        assert_eq!(token.is_valid_at(now, TimeDelta::seconds(60)), valid);
    }

    #[test]
    fn from_response_computes_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let token = Token::from_response(response(3600), now, &Scopes::default()).unwrap();

        assert_eq!(token.access_token(), "abc");
        assert_eq!(token.token_type(), &TokenType::Bearer);
        assert_eq!(token.expires_at(), now + TimeDelta::seconds(3600));
        assert_eq!(token.scopes(), &Scopes::default());
        assert_eq!(token.to_string(), "Bearer abc");
    }

    #[test]
    fn from_response_keeps_issued_scopes() {
        let mut response = response(3600);
        response.scope = Some("signature".to_string());
        response.token_type = None;

        let token = Token::from_response(response, Utc::now(), &Scopes::default()).unwrap();

        assert_eq!(token.scopes(), &Scopes::from("signature"));
        assert_eq!(token.token_type(), &TokenType::Bearer);
    }

    #[test]
    fn token_retrieval_response_incorrect_time() {
        let result = Token::from_response(response(u64::MAX), Utc::now(), &Scopes::default());
        assert_matches!(result, Err(AuthorizationError::InvalidTokenResponse(e)) => {
            assert!(e.contains("expires_in"))
        });
    }

    #[test]
    fn token_retrieval_response_unknown_type() {
        let mut response = response(3600);
        response.token_type = Some("MAC".to_string());
        let result = Token::from_response(response, Utc::now(), &Scopes::default());
        assert_matches!(result, Err(AuthorizationError::InvalidTokenResponse(e)) => {
            assert_eq!(e, "Invalid token type: MAC")
        });
    }
}
