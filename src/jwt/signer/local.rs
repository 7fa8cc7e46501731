use std::fmt;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use thiserror::Error;

use crate::jwt::{claims::Claims, error::JwtEncoderError, signed::SignedJwt};

use super::JwtSigner;

/// Errors that can occur when creating a LocalPrivateKeySigner.
#[derive(Debug, Error)]
pub enum LocalPrivateKeySignerError {
    #[error("unable to load private key: `{0}`")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// Signer structure that uses a local RSA private key to sign assertions.
pub struct LocalPrivateKeySigner {
    encoding_key: EncodingKey,
    algorithm: Algorithm,
}

impl fmt::Debug for LocalPrivateKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalPrivateKeySigner")
            .field("algorithm", &self.algorithm)
            .field("encoding_key", &"<hidden>")
            .finish()
    }
}

/// Attempt to create a LocalPrivateKeySigner from PEM contents.
impl TryFrom<&[u8]> for LocalPrivateKeySigner {
    type Error = LocalPrivateKeySignerError;

    fn try_from(pem: &[u8]) -> Result<Self, Self::Error> {
        // The JWT Grant only accepts RS256 assertions, so the key is always an RSA one.
        Ok(Self {
            encoding_key: EncodingKey::from_rsa_pem(pem)?,
            algorithm: Algorithm::RS256,
        })
    }
}

impl JwtSigner for LocalPrivateKeySigner {
    fn sign(&self, claims: &Claims) -> Result<SignedJwt, JwtEncoderError> {
        let value = jsonwebtoken::encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| JwtEncoderError::TokenEncoding(e.to_string()))?;
        Ok(SignedJwt { value })
    }
}
