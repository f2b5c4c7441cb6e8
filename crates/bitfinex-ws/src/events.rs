//! Messages delivered to subscribers and connection lifecycle events

use crate::connection::ConnectionState;
use crate::error::TerminalError;
use crate::subscription::SubscriptionId;
use bitfinex_types::{Channel, DecodeError, DomainEvent, Payload};

/// How an update relates to the state it describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Part of an initial snapshot burst
    Snapshot,
    /// Entity created
    New,
    /// Entity changed (or a plain stream update)
    Update,
    /// Entity closed or cancelled
    Close,
    /// Account trade executed
    Executed,
    /// Account notification
    Notification,
}

impl UpdateKind {
    /// Derive from the frame tag, falling back to the payload shape
    pub fn from_tag(tag: Option<&str>, payload: &Payload) -> Self {
        match tag {
            Some("os" | "ps" | "ws" | "fos") => Self::Snapshot,
            Some("on" | "pn" | "fon") => Self::New,
            Some("ou" | "pu" | "wu" | "fou" | "tu") => Self::Update,
            Some("oc" | "pc" | "foc") => Self::Close,
            Some("te") => Self::Executed,
            Some("n") => Self::Notification,
            _ => match payload {
                Payload::Snapshot(_) => Self::Snapshot,
                _ => Self::Update,
            },
        }
    }
}

/// One decoded item for a subscription
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub chan_id: i64,
    pub kind: UpdateKind,
    pub event: DomainEvent,
}

/// What a [`SubscriptionStream`](crate::SubscriptionStream) yields
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// A decoded item
    Update(Update),
    /// One item failed to decode; the stream continues
    DecodeFailed { chan_id: i64, error: DecodeError },
    /// The server refused the subscription; the stream ends
    Rejected { code: Option<i64>, message: String },
    /// The connection ended; the stream ends
    Terminated(TerminalError),
}

impl StreamMessage {
    /// Check if no further messages follow this one
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::Terminated(_))
    }
}

/// Connection lifecycle events
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// State machine transition
    StateChanged {
        from: ConnectionState,
        to: ConnectionState,
    },
    /// Server `info` event (version on connect, maintenance codes later)
    Info {
        version: Option<u32>,
        code: Option<i64>,
        message: Option<String>,
    },
    /// Auth handshake succeeded
    Authenticated { user_id: Option<i64> },
    /// A subscription was bound to a channel id
    Subscribed {
        id: SubscriptionId,
        chan_id: i64,
        channel: Channel,
        symbol: Option<String>,
    },
    /// A channel id was released
    Unsubscribed { chan_id: i64 },
    /// Server error not tied to a pending subscription
    Notice { code: Option<i64>, message: String },
    /// The connection ended
    Terminated(TerminalError),
}
