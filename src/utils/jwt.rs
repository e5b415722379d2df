//! Verification of the HS256 access tokens issued by the Mewayz auth service.
//!
//! This service never mints tokens in production; signing is only compiled
//! for tests.

use std::{collections::HashSet, env};

use crate::routes::auth::claims::Claims;
use jsonwebtoken::{decode, errors::Error, Algorithm, DecodingKey, TokenData, Validation};
use thiserror::Error;

pub const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_UNIQUE_JWT_BYTES: usize = 8;

#[derive(Debug, Error)]
pub enum JwtSecretError {
    #[error("JWT_SECRET is not set")]
    Missing,
    #[error("JWT_SECRET has {actual} bytes; at least {required} are required")]
    TooShort { actual: usize, required: usize },
    #[error("JWT_SECRET has only {actual} distinct bytes; at least {required} are required")]
    LowEntropy { actual: usize, required: usize },
}

#[derive(Clone)]
pub struct JwtKeys {
    decoding: DecodingKey,
    #[cfg(test)]
    encoding: jsonwebtoken::EncodingKey,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys").finish_non_exhaustive()
    }
}

impl JwtKeys {
    pub fn from_env() -> Result<Self, JwtSecretError> {
        let value = env::var("JWT_SECRET").map_err(|_| JwtSecretError::Missing)?;
        Self::from_secret(value)
    }

    /// Rejects secrets shorter than [`MIN_JWT_SECRET_LENGTH`] bytes or with
    /// too few distinct bytes.
    pub fn from_secret(secret: impl AsRef<[u8]>) -> Result<Self, JwtSecretError> {
        let bytes = secret.as_ref();
        if bytes.len() < MIN_JWT_SECRET_LENGTH {
            return Err(JwtSecretError::TooShort {
                actual: bytes.len(),
                required: MIN_JWT_SECRET_LENGTH,
            });
        }
        let distinct = bytes.iter().collect::<HashSet<_>>().len();
        if distinct < MIN_UNIQUE_JWT_BYTES {
            return Err(JwtSecretError::LowEntropy {
                actual: distinct,
                required: MIN_UNIQUE_JWT_BYTES,
            });
        }

        Ok(Self {
            decoding: DecodingKey::from_secret(bytes),
            #[cfg(test)]
            encoding: jsonwebtoken::EncodingKey::from_secret(bytes),
        })
    }
}

/// Gives extractors access to the verification key and expected token parties.
pub trait JwtKeyProvider {
    fn jwt_keys(&self) -> &JwtKeys;
    fn jwt_issuer(&self) -> &str;
    fn jwt_audience(&self) -> &str;
}

/// Checks signature, issuer, audience and expiry (no leeway).
pub fn decode_jwt(
    token: &str,
    keys: &JwtKeys,
    issuer: &str,
    audience: &str,
) -> Result<TokenData<Claims>, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[audience]);
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "iss", "aud"]);
    validation.leeway = 0;
    decode::<Claims>(token, &keys.decoding, &validation)
}

#[cfg(test)]
pub fn create_jwt(
    mut claims: Claims,
    keys: &JwtKeys,
    issuer: &str,
    audience: &str,
) -> Result<String, Error> {
    claims.iss = issuer.to_owned();
    claims.aud = audience.to_owned();
    jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &keys.encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn claims_expiring_in(secs: i64) -> Claims {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        Claims {
            id: "u_1".into(),
            email: "one@example.com".into(),
            exp: (now + secs) as usize,
            iss: String::new(),
            aud: String::new(),
        }
    }

    #[test]
    fn weak_secrets_are_refused() {
        assert!(matches!(
            JwtKeys::from_secret("short").unwrap_err(),
            JwtSecretError::TooShort { actual: 5, .. }
        ));
        assert!(matches!(
            JwtKeys::from_secret("ab".repeat(MIN_JWT_SECRET_LENGTH)).unwrap_err(),
            JwtSecretError::LowEntropy { actual: 2, .. }
        ));
    }

    #[test]
    fn token_for_this_service_verifies() {
        let keys = JwtKeys::from_secret(SECRET).unwrap();
        let token = create_jwt(claims_expiring_in(60), &keys, "mewayz", "mewayz").unwrap();

        let data = decode_jwt(&token, &keys, "mewayz", "mewayz").unwrap();
        assert_eq!(data.claims.id, "u_1");
        assert_eq!(data.claims.aud, "mewayz");
    }

    #[test]
    fn foreign_audience_issuer_or_expired_tokens_fail() {
        let keys = JwtKeys::from_secret(SECRET).unwrap();
        let token = create_jwt(claims_expiring_in(60), &keys, "mewayz", "mewayz").unwrap();
        assert!(decode_jwt(&token, &keys, "mewayz", "billing").is_err());
        assert!(decode_jwt(&token, &keys, "someone-else", "mewayz").is_err());

        let expired = create_jwt(claims_expiring_in(-120), &keys, "mewayz", "mewayz").unwrap();
        assert!(decode_jwt(&expired, &keys, "mewayz", "mewayz").is_err());
    }

    #[test]
    fn token_signed_with_another_secret_fails() {
        let keys = JwtKeys::from_secret(SECRET).unwrap();
        let other = JwtKeys::from_secret("fedcba9876543210fedcba9876543210").unwrap();
        let token = create_jwt(claims_expiring_in(60), &other, "mewayz", "mewayz").unwrap();
        assert!(decode_jwt(&token, &keys, "mewayz", "mewayz").is_err());
    }
}
