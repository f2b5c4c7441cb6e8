//! Native WebSocket client for the Bitfinex WebSocket API v2
//!
//! Many logical feeds share one physical connection. Each subscription gets
//! its own [`SubscriptionStream`]; data frames are routed to it by channel id
//! and decoded into typed [`DomainEvent`](bitfinex_types::DomainEvent)s.
//!
//! # Features
//!
//! - Public feeds (ticker, trades, book, candles) and the authenticated
//!   account feed on one connection
//! - Bounded per-subscription queues with a configurable overflow policy
//! - Per-item decode errors that never corrupt the rest of a snapshot
//! - Exactly one terminal notification per subscription when the connection
//!   ends
//!
//! # Example
//!
//! ```no_run
//! use bitfinex_ws::{Connection, ConnectionConfig, Feed, StreamMessage};
//! use bitfinex_types::Precision;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let conn = Connection::new(ConnectionConfig::new());
//!     let mut book = conn.subscribe(Feed::book("tBTCUSD", Precision::P0))?;
//!     let handle = conn.handle();
//!
//!     // Spawn connection task
//!     tokio::spawn(async move { conn.run().await });
//!
//!     while let Some(message) = book.recv().await {
//!         match message {
//!             StreamMessage::Update(update) => println!("{:?}", update.event),
//!             StreamMessage::Terminated(err) => eprintln!("{}", err),
//!             other => println!("{:?}", other),
//!         }
//!     }
//!
//!     handle.close().ok();
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod sink;
pub mod subscription;
pub mod transport;

// Re-export main types
pub use connection::{
    BatchErrorPolicy, Connection, ConnectionConfig, ConnectionHandle, ConnectionState,
};
pub use endpoint::Endpoint;
pub use error::{TerminalError, TerminalKind, WsError, WsResult};
pub use events::{ConnectionEvent, StreamMessage, Update, UpdateKind};
pub use sink::{Delivery, OverflowPolicy, SubscriptionStream, DEFAULT_SINK_CAPACITY};
pub use subscription::{Ack, Feed, SubscriptionId, SubscriptionRegistry, SubscriptionState};
pub use transport::{Transport, TransportError, WsTransport, DEFAULT_IDLE_TIMEOUT};

#[cfg(any(test, feature = "test-utils"))]
pub use transport::{MockHandle, MockTransport};
