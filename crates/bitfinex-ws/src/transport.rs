//! WebSocket transport abstraction
//!
//! The connection drives a [`Transport`] instead of a socket, so the whole
//! lifecycle can be exercised against [`MockTransport`] without a network.
//!
//! # Example
//!
//! ```no_run
//! use bitfinex_ws::transport::{Transport, WsTransport, TransportError};
//!
//! async fn example() -> Result<(), TransportError> {
//!     let mut transport = WsTransport::new("wss://api-pub.bitfinex.com/ws/2");
//!     transport.connect().await?;
//!     transport.send(r#"{"event":"ping","cid":1}"#).await?;
//!     if let Some(response) = transport.recv().await? {
//!         println!("Received: {}", response);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use bitfinex_types::{to_wire, PingRequest};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, instrument, warn};

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Silence allowed before probing the server with a ping event.
///
/// Subscribed channels heartbeat every 15 seconds.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport layer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed
    #[error("connection closed")]
    ConnectionClosed,

    /// Server closed the socket with an error status
    #[error("closed by server: {code} {reason}")]
    ClosedByServer { code: u16, reason: String },

    /// Send failed
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Connect or idle timeout
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// Not connected
    #[error("not connected")]
    NotConnected,

    /// Frame was not valid text
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Trait for WebSocket transport abstraction
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the WebSocket endpoint
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Send a text message
    async fn send(&mut self, message: &str) -> Result<(), TransportError>;

    /// Receive a text message
    ///
    /// Returns `None` if the connection was closed gracefully.
    async fn recv(&mut self) -> Result<Option<String>, TransportError>;

    /// Close the connection gracefully
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Check if currently connected
    fn is_connected(&self) -> bool;

    /// Get the endpoint URL
    fn endpoint(&self) -> &str;
}

/// Bitfinex WebSocket over tokio-tungstenite
///
/// When the socket stays silent for the idle timeout, the transport sends a
/// `ping` event. Any frame, the `pong` included, clears the pending ping; a second
/// silent window fails `recv` with [`TransportError::Timeout`].
pub struct WsTransport {
    url: String,
    stream: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    connect_timeout: Duration,
    idle_timeout: Option<Duration>,
    next_cid: u64,
    awaiting_pong: bool,
}

impl WsTransport {
    /// Create a new WebSocket transport
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            stream: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
            next_cid: 1,
            awaiting_pong: false,
        }
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the idle window before a ping (`None` never pings)
    pub fn with_idle_timeout(mut self, idle: Option<Duration>) -> Self {
        self.idle_timeout = idle;
        self
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        let cid = self.next_cid;
        self.next_cid += 1;
        let message = to_wire(&PingRequest::new(cid))
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        debug!(cid, "Socket idle, sending ping");
        self.send(&message).await?;
        self.awaiting_pong = true;
        Ok(())
    }
}

/// Normal and going-away closes end the stream; any other status is an error
fn close_outcome(frame: Option<CloseFrame<'_>>) -> Result<Option<String>, TransportError> {
    match frame {
        Some(frame) if !matches!(frame.code, CloseCode::Normal | CloseCode::Away) => {
            Err(TransportError::ClosedByServer {
                code: frame.code.into(),
                reason: frame.reason.into_owned(),
            })
        }
        _ => Ok(None),
    }
}

#[async_trait]
impl Transport for WsTransport {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn connect(&mut self) -> Result<(), TransportError> {
        debug!("Connecting to WebSocket");

        let (ws_stream, _response) = timeout(self.connect_timeout, connect_async(&self.url))
            .await
            .map_err(|_| TransportError::Timeout(self.connect_timeout))?
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        self.stream = Some(ws_stream);
        self.awaiting_pong = false;
        debug!("WebSocket connected");
        Ok(())
    }

    #[instrument(skip(self, message), fields(len = message.len()))]
    async fn send(&mut self, message: &str) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

        stream
            .send(Message::Text(message.to_string()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

            let next = match self.idle_timeout {
                None => stream.next().await,
                Some(idle) => match timeout(idle, stream.next()).await {
                    Ok(next) => next,
                    Err(_) if !self.awaiting_pong => {
                        self.ping().await?;
                        continue;
                    }
                    Err(_) => {
                        warn!(?idle, "No answer to ping, dropping socket");
                        self.stream = None;
                        return Err(TransportError::Timeout(idle));
                    }
                },
            };
            self.awaiting_pong = false;

            return match next {
                Some(Ok(Message::Text(text))) => Ok(Some(text)),
                Some(Ok(Message::Binary(data))) => String::from_utf8(data)
                    .map(Some)
                    .map_err(|e| TransportError::Protocol(e.to_string())),
                Some(Ok(Message::Close(frame))) => {
                    self.stream = None;
                    let outcome = close_outcome(frame);
                    if let Err(e) = &outcome {
                        warn!(error = %e, "Server closed the socket");
                    }
                    outcome
                }
                // tungstenite answers control pings itself
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Err(e)) => Err(TransportError::ReceiveFailed(e.to_string())),
                None => {
                    self.stream = None;
                    Err(TransportError::ConnectionClosed)
                }
            };
        }
    }

    #[instrument(skip(self))]
    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut stream) = self.stream.take() {
            stream
                .close(None)
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

// ============================================================================
// Mock Transport
// ============================================================================

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockHandle, MockTransport};

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use super::{Transport, TransportError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tokio::sync::Notify;

    type Scripted = Result<Option<String>, TransportError>;

    #[derive(Debug, Default)]
    struct Script {
        responses: Mutex<VecDeque<Scripted>>,
        sent: Mutex<Vec<String>>,
        pushed: Notify,
    }

    /// Mock transport for testing
    ///
    /// Returns scripted frames from `recv()` and records everything passed to
    /// `send()`. Once the script runs dry, `recv()` reports a closed
    /// connection, or waits for more frames if [`keep_open`](Self::keep_open)
    /// was set. A [`MockHandle`] keeps scripting after the transport has been
    /// moved into a connection.
    #[derive(Debug)]
    pub struct MockTransport {
        url: String,
        connected: bool,
        hold_open: bool,
        script: Arc<Script>,
        /// Simulate connection failure
        pub fail_connect: bool,
        /// Simulate send failure
        pub fail_send: bool,
    }

    impl MockTransport {
        /// Create a new mock transport
        pub fn new(url: impl Into<String>) -> Self {
            Self {
                url: url.into(),
                connected: false,
                hold_open: false,
                script: Arc::new(Script::default()),
                fail_connect: false,
                fail_send: false,
            }
        }

        /// Wait for more frames instead of closing when the script is empty
        pub fn keep_open(mut self) -> Self {
            self.hold_open = true;
            self
        }

        /// Handle sharing this transport's script
        pub fn handle(&self) -> MockHandle {
            MockHandle {
                script: Arc::clone(&self.script),
            }
        }

        /// Add a response to be returned on recv()
        pub fn push_response(&self, msg: impl Into<String>) {
            self.handle().push_response(msg);
        }

        /// Add multiple responses
        pub fn push_responses(&self, msgs: impl IntoIterator<Item = impl Into<String>>) {
            self.handle().push_responses(msgs);
        }

        /// Simulate a graceful close
        pub fn push_close(&self) {
            self.handle().push_close();
        }

        /// Simulate a receive error
        pub fn push_error(&self, error: TransportError) {
            self.handle().push_error(error);
        }

        /// Messages captured from send()
        pub fn sent(&self) -> Vec<String> {
            self.handle().sent()
        }
    }

    /// Scripting handle for a [`MockTransport`]
    #[derive(Debug, Clone)]
    pub struct MockHandle {
        script: Arc<Script>,
    }

    impl MockHandle {
        fn push(&self, item: Scripted) {
            self.script.responses.lock().push_back(item);
            self.script.pushed.notify_one();
        }

        /// Add a response to be returned on recv()
        pub fn push_response(&self, msg: impl Into<String>) {
            self.push(Ok(Some(msg.into())));
        }

        /// Add multiple responses
        pub fn push_responses(&self, msgs: impl IntoIterator<Item = impl Into<String>>) {
            for msg in msgs {
                self.push_response(msg);
            }
        }

        /// Simulate a graceful close
        pub fn push_close(&self) {
            self.push(Ok(None));
        }

        /// Simulate a receive error
        pub fn push_error(&self, error: TransportError) {
            self.push(Err(error));
        }

        /// Messages captured from send()
        pub fn sent(&self) -> Vec<String> {
            self.script.sent.lock().clone()
        }

        /// Take the captured messages
        pub fn take_sent(&self) -> Vec<String> {
            std::mem::take(&mut *self.script.sent.lock())
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn connect(&mut self) -> Result<(), TransportError> {
            if self.fail_connect {
                return Err(TransportError::ConnectionFailed("mock connection failure".into()));
            }
            self.connected = true;
            Ok(())
        }

        async fn send(&mut self, message: &str) -> Result<(), TransportError> {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            if self.fail_send {
                return Err(TransportError::SendFailed("mock send failure".into()));
            }
            self.script.sent.lock().push(message.to_string());
            Ok(())
        }

        async fn recv(&mut self) -> Result<Option<String>, TransportError> {
            loop {
                if !self.connected {
                    return Err(TransportError::NotConnected);
                }
                let next = self.script.responses.lock().pop_front();
                match next {
                    Some(item) => return item,
                    None if self.hold_open => self.script.pushed.notified().await,
                    None => return Err(TransportError::ConnectionClosed),
                }
            }
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            self.connected = false;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn endpoint(&self) -> &str {
            &self.url
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_mock_transport_send_recv() {
        let mut transport = MockTransport::new("wss://mock.test");
        transport.push_response(r#"{"event":"pong"}"#);

        transport.connect().await.unwrap();
        assert!(transport.is_connected());

        transport.send(r#"{"event":"ping"}"#).await.unwrap();
        assert_eq!(transport.sent().len(), 1);
        assert!(transport.sent()[0].contains("ping"));

        let response = transport.recv().await.unwrap();
        assert!(response.unwrap().contains("pong"));
    }

    #[tokio::test]
    async fn test_mock_transport_connection_failure() {
        let mut transport = MockTransport::new("wss://mock.test");
        transport.fail_connect = true;

        assert!(transport.connect().await.is_err());
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_mock_transport_close() {
        let mut transport = MockTransport::new("wss://mock.test");
        transport.push_close();

        transport.connect().await.unwrap();
        assert!(transport.recv().await.unwrap().is_none());
        assert_eq!(transport.recv().await, Err(TransportError::ConnectionClosed));
    }

    #[test]
    fn test_close_outcome() {
        assert_eq!(close_outcome(None), Ok(None));

        let normal = CloseFrame {
            code: CloseCode::Normal,
            reason: "bye".into(),
        };
        assert_eq!(close_outcome(Some(normal)), Ok(None));

        let away = CloseFrame {
            code: CloseCode::Away,
            reason: "".into(),
        };
        assert_eq!(close_outcome(Some(away)), Ok(None));

        let restart = CloseFrame {
            code: CloseCode::from(1012),
            reason: "service restart".into(),
        };
        assert_eq!(
            close_outcome(Some(restart)),
            Err(TransportError::ClosedByServer {
                code: 1012,
                reason: "service restart".into(),
            })
        );
    }

    #[test]
    fn test_ws_transport_defaults() {
        let transport = WsTransport::new("wss://api-pub.bitfinex.com/ws/2")
            .with_timeout(Duration::from_secs(3))
            .with_idle_timeout(None);
        assert_eq!(transport.connect_timeout, Duration::from_secs(3));
        assert_eq!(transport.idle_timeout, None);
        assert!(!transport.is_connected());
        assert_eq!(WsTransport::new("wss://x").idle_timeout, Some(DEFAULT_IDLE_TIMEOUT));
    }

    #[tokio::test]
    async fn test_ws_transport_requires_connect() {
        let mut transport = WsTransport::new("wss://api-pub.bitfinex.com/ws/2");
        assert_eq!(transport.recv().await, Err(TransportError::NotConnected));
        assert_eq!(transport.send("{}").await, Err(TransportError::NotConnected));
    }

    #[tokio::test]
    async fn test_keep_open_waits_for_handle() {
        let mut transport = MockTransport::new("wss://mock.test").keep_open();
        let handle = transport.handle();
        transport.connect().await.unwrap();

        let reader = tokio::spawn(async move { transport.recv().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!reader.is_finished());

        handle.push_response("[1,\"hb\"]");
        let frame = reader.await.unwrap().unwrap();
        assert_eq!(frame.as_deref(), Some("[1,\"hb\"]"));
    }
}
