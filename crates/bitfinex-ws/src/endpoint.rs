//! WebSocket endpoint definitions

use std::fmt;

/// Bitfinex WebSocket API v2 endpoints
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Endpoint {
    /// Public market data (default)
    #[default]
    Public,
    /// Authenticated endpoint, needed for the account channel
    Authenticated,
    /// Any other URL (proxies, local test servers)
    Custom(String),
}

impl Endpoint {
    /// Get the WebSocket URL for this endpoint
    pub fn url(&self) -> &str {
        match self {
            Self::Public => "wss://api-pub.bitfinex.com/ws/2",
            Self::Authenticated => "wss://api.bitfinex.com/ws/2",
            Self::Custom(url) => url,
        }
    }

    /// Check if this endpoint accepts authentication
    pub fn supports_auth(&self) -> bool {
        !matches!(self, Self::Public)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        assert_eq!(Endpoint::Public.url(), "wss://api-pub.bitfinex.com/ws/2");
        assert_eq!(Endpoint::Authenticated.url(), "wss://api.bitfinex.com/ws/2");
        assert_eq!(Endpoint::Custom("ws://localhost:9000".into()).url(), "ws://localhost:9000");
    }

    #[test]
    fn test_supports_auth() {
        assert!(!Endpoint::Public.supports_auth());
        assert!(Endpoint::Authenticated.supports_auth());
    }
}
