//! Error types for authentication operations

/// Errors that can occur during authentication
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// A signing call was made before credentials were set
    #[error("Credentials not set: private operations require an API key and secret")]
    CredentialsNotSet,

    /// Invalid API credentials
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Environment variable not set
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    /// Server rejected the auth handshake
    #[error("Authentication rejected (code {code:?}): {message}")]
    Rejected { code: Option<i64>, message: String },

    /// Failed to serialize a signed envelope
    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::EnvVarNotSet("BFX_API_KEY".to_string());
        assert!(err.to_string().contains("BFX_API_KEY"));

        let err = AuthError::Rejected {
            code: Some(10100),
            message: "apikey: invalid".into(),
        };
        assert!(err.to_string().contains("10100"));
        assert!(err.to_string().contains("apikey: invalid"));
    }
}
