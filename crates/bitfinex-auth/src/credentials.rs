//! API credentials for Bitfinex
//!
//! The secret is held in a [`SecretBox`], zeroized on drop and never printed
//! by `Debug`. Access goes through [`Credentials::hmac_hex`], so the raw secret
//! never leaves this module.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretBox};
use sha2::Sha384;

use crate::error::{AuthError, AuthResult};

type HmacSha384 = Hmac<Sha384>;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "BFX_API_KEY";
/// Environment variable holding the API secret
pub const API_SECRET_ENV: &str = "BFX_API_SECRET";

/// API key and secret
pub struct Credentials {
    /// API key (public)
    api_key: String,
    /// API secret (zeroized on drop)
    secret: SecretBox<Vec<u8>>,
}

impl Credentials {
    /// Create new credentials from API key and secret
    ///
    /// Both parts must be non-empty.
    pub fn new(api_key: impl Into<String>, secret: impl AsRef<str>) -> AuthResult<Self> {
        let api_key = api_key.into();
        let secret = secret.as_ref();

        if api_key.trim().is_empty() {
            return Err(AuthError::InvalidCredentials("API key is empty".into()));
        }
        if secret.is_empty() {
            return Err(AuthError::InvalidCredentials("API secret is empty".into()));
        }

        Ok(Self {
            api_key,
            secret: SecretBox::new(Box::new(secret.as_bytes().to_vec())),
        })
    }

    /// Create credentials from environment variables
    ///
    /// Reads `BFX_API_KEY` and `BFX_API_SECRET` from the environment.
    pub fn from_env() -> AuthResult<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| AuthError::EnvVarNotSet(API_KEY_ENV.to_string()))?;
        let secret = std::env::var(API_SECRET_ENV)
            .map_err(|_| AuthError::EnvVarNotSet(API_SECRET_ENV.to_string()))?;

        Self::new(api_key, secret)
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Hex-encoded HMAC-SHA384 of `message`, keyed by the secret
    pub fn hmac_hex(&self, message: &[u8]) -> AuthResult<String> {
        let mut mac = HmacSha384::new_from_slice(self.secret.expose_secret())
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;
        mac.update(message);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self {
            api_key: self.api_key.clone(),
            secret: SecretBox::new(Box::new(self.secret.expose_secret().clone())),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field(
                "api_key",
                &format!("{}...", self.api_key.chars().take(8).collect::<String>()),
            )
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials::new("test_api_key", "very_secret_value").unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("very_secret_value"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("test_api"));
    }

    #[test]
    fn test_empty_parts_rejected() {
        assert!(matches!(
            Credentials::new("", "secret"),
            Err(AuthError::InvalidCredentials(_))
        ));
        assert!(matches!(
            Credentials::new("key", ""),
            Err(AuthError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn test_hmac_is_hex_sha384() {
        let creds = Credentials::new("abc", "123").unwrap();
        let mac = creds.hmac_hex(b"payload").unwrap();
        // 48 bytes, two hex chars each
        assert_eq!(mac.len(), 96);
        assert!(mac.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(mac, creds.clone().hmac_hex(b"payload").unwrap());
    }
}
