//! Error types for the streaming connection

use crate::transport::TransportError;
use bitfinex_auth::AuthError;
use bitfinex_types::ProtocolError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// What ended a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    /// Authentication was rejected, timed out or impossible
    Auth,
    /// Read or write failure on the socket
    Transport,
    /// The connection was closed on request
    Closed,
}

impl fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auth => "auth",
            Self::Transport => "transport",
            Self::Closed => "closed",
        })
    }
}

/// Terminal notification delivered once to every live subscription
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("connection terminated ({kind}): {message}")]
pub struct TerminalError {
    pub kind: TerminalKind,
    pub message: String,
}

impl TerminalError {
    /// Create a terminal error
    pub fn new(kind: TerminalKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Errors returned by connection operations
#[derive(Error, Debug)]
pub enum WsError {
    /// Socket failure
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Signing or server-side auth failure
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Unusable frame
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// No auth acknowledgement within the configured window
    #[error("no auth acknowledgement within {0:?}")]
    AuthTimeout(Duration),

    /// Outbound request could not be serialized
    #[error("serialization failed: {0}")]
    Serialize(String),

    /// `run` was called while another run owns the transport
    #[error("connection is already running")]
    AlreadyRunning,

    /// The connection has terminated and accepts no more work
    #[error("connection terminated")]
    Terminated,

    /// The receive loop is gone
    #[error("command channel closed")]
    ChannelClosed,
}

impl WsError {
    /// Check if this error ends the connection
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Auth(_) | Self::AuthTimeout(_) | Self::Terminated
        )
    }

    /// Terminal notification matching this error
    pub fn to_terminal(&self) -> TerminalError {
        let kind = match self {
            Self::Auth(_) | Self::AuthTimeout(_) => TerminalKind::Auth,
            Self::Terminated => TerminalKind::Closed,
            _ => TerminalKind::Transport,
        };
        TerminalError::new(kind, self.to_string())
    }
}

/// Result type for connection operations
pub type WsResult<T> = Result<T, WsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(WsError::Transport(TransportError::ConnectionClosed).is_terminal());
        assert!(WsError::Auth(AuthError::CredentialsNotSet).is_terminal());
        assert!(WsError::AuthTimeout(Duration::from_secs(1)).is_terminal());
        assert!(!WsError::Serialize("bad".into()).is_terminal());
        assert!(!WsError::AlreadyRunning.is_terminal());
    }

    #[test]
    fn test_to_terminal_kind() {
        let err = WsError::AuthTimeout(Duration::from_secs(15));
        assert_eq!(err.to_terminal().kind, TerminalKind::Auth);

        let err = WsError::Transport(TransportError::ReceiveFailed("reset".into()));
        let terminal = err.to_terminal();
        assert_eq!(terminal.kind, TerminalKind::Transport);
        assert!(terminal.message.contains("reset"));
    }
}
