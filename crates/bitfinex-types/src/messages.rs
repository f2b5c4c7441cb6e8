//! Wire frames for the Bitfinex WebSocket API v2
//!
//! Inbound text is classified exactly once, by [`Frame::parse`]: objects are
//! control events keyed by their `event` field, arrays are data frames
//! addressed by channel id. Nothing downstream inspects raw JSON shapes again.

use crate::enums::{Channel, Frequency, Precision};
use crate::error::ProtocolError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Tag the server uses for heartbeat frames
pub const HEARTBEAT: &str = "hb";

/// Channel id of the authenticated account channel
pub const ACCOUNT_CHANNEL_ID: i64 = 0;

// ============================================================================
// Request Types
// ============================================================================

/// Subscribe request message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeRequest {
    /// Always "subscribe"
    pub event: &'static str,
    pub channel: Channel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Candle key (`trade:1m:tBTCUSD`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prec: Option<Precision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freq: Option<Frequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub len: Option<String>,
}

impl SubscribeRequest {
    /// Create a subscribe request for a channel
    pub fn new(channel: Channel) -> Self {
        Self {
            event: "subscribe",
            channel,
            symbol: None,
            key: None,
            prec: None,
            freq: None,
            len: None,
        }
    }

    /// Set the symbol
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Set the candle key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set book precision, frequency and length
    pub fn with_book(mut self, prec: Precision, freq: Frequency, len: u32) -> Self {
        self.prec = Some(prec);
        self.freq = Some(freq);
        self.len = Some(len.to_string());
        self
    }
}

/// Unsubscribe request message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsubscribeRequest {
    /// Always "unsubscribe"
    pub event: &'static str,
    #[serde(rename = "chanId")]
    pub chan_id: i64,
}

impl UnsubscribeRequest {
    /// Create an unsubscribe request
    pub fn new(chan_id: i64) -> Self {
        Self {
            event: "unsubscribe",
            chan_id,
        }
    }
}

/// Application-level ping, answered with a `pong` event echoing `cid`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PingRequest {
    /// Always "ping"
    pub event: &'static str,
    pub cid: u64,
}

impl PingRequest {
    /// Create a ping request
    pub fn new(cid: u64) -> Self {
        Self { event: "ping", cid }
    }
}

/// Authentication request message
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    /// Always "auth"
    pub event: &'static str,
    pub api_key: String,
    pub auth_sig: String,
    pub auth_payload: String,
    pub auth_nonce: u64,
    /// 4 enables the dead-man switch (cancel all orders on disconnect)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dms: Option<u8>,
    /// Account message filter (`trading`, `wallet`, `funding`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Vec<String>>,
}

impl AuthRequest {
    /// Create an auth request from precomputed signature parts
    pub fn new(
        api_key: impl Into<String>,
        auth_sig: impl Into<String>,
        auth_payload: impl Into<String>,
        auth_nonce: u64,
    ) -> Self {
        Self {
            event: "auth",
            api_key: api_key.into(),
            auth_sig: auth_sig.into(),
            auth_payload: auth_payload.into(),
            auth_nonce,
            dms: None,
            filter: None,
        }
    }

    /// Cancel all orders when the connection drops
    pub fn with_dead_man_switch(mut self) -> Self {
        self.dms = Some(4);
        self
    }

    /// Restrict the account messages sent by the server
    pub fn with_filter(mut self, filter: Vec<String>) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl std::fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRequest")
            .field("api_key", &"[REDACTED]")
            .field("auth_nonce", &self.auth_nonce)
            .field("dms", &self.dms)
            .field("filter", &self.filter)
            .finish()
    }
}

// ============================================================================
// Event Types
// ============================================================================

/// Platform status carried by the `info` event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlatformStatus {
    /// 1 operative, 0 maintenance
    pub status: i64,
}

/// Control frame, discriminated by its `event` field
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum EventMessage {
    /// Sent on connect and on maintenance transitions
    Info {
        #[serde(default)]
        version: Option<u32>,
        #[serde(default, rename = "serverId")]
        server_id: Option<String>,
        #[serde(default)]
        platform: Option<PlatformStatus>,
        #[serde(default)]
        code: Option<i64>,
        #[serde(default)]
        msg: Option<String>,
    },
    /// Subscription acknowledged; binds `chan_id`
    Subscribed {
        channel: String,
        #[serde(rename = "chanId")]
        chan_id: i64,
        #[serde(default)]
        symbol: Option<String>,
        #[serde(default)]
        pair: Option<String>,
        #[serde(default)]
        currency: Option<String>,
        #[serde(default)]
        key: Option<String>,
        #[serde(default)]
        prec: Option<String>,
        #[serde(default)]
        freq: Option<String>,
        #[serde(default, deserialize_with = "deserialize_opt_text")]
        len: Option<String>,
    },
    Unsubscribed {
        #[serde(default)]
        status: String,
        #[serde(rename = "chanId")]
        chan_id: i64,
    },
    /// Authentication result
    Auth {
        status: String,
        #[serde(default, rename = "chanId")]
        chan_id: Option<i64>,
        #[serde(default, rename = "userId")]
        user_id: Option<i64>,
        #[serde(default)]
        code: Option<i64>,
        #[serde(default)]
        msg: Option<String>,
    },
    /// Request failure; echoes the fields of the failed request
    Error {
        #[serde(default)]
        code: Option<i64>,
        #[serde(default)]
        msg: String,
        #[serde(default)]
        channel: Option<String>,
        #[serde(default)]
        symbol: Option<String>,
        #[serde(default)]
        key: Option<String>,
    },
    Pong {
        #[serde(default)]
        cid: Option<i64>,
        #[serde(default)]
        ts: Option<i64>,
    },
    Conf {
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        flags: Option<i64>,
    },
    #[serde(other)]
    Unknown,
}

impl EventMessage {
    /// True if this is an auth acknowledgement with status OK
    pub fn is_auth_ok(&self) -> bool {
        matches!(self, Self::Auth { status, .. } if status.eq_ignore_ascii_case("OK"))
    }
}

fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

// ============================================================================
// Data Frames
// ============================================================================

/// Payload of a data frame
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Keep-alive, carries nothing
    Heartbeat,
    /// One flat row
    Update(Vec<Value>),
    /// Array of rows (initial burst or batched update)
    Snapshot(Vec<Vec<Value>>),
}

impl Payload {
    /// Classify a payload by whether its first element is itself an array
    fn classify(payload: Value, raw: &str) -> Result<Self, ProtocolError> {
        let items = match payload {
            Value::Array(items) => items,
            Value::String(tag) if tag == HEARTBEAT => return Ok(Self::Heartbeat),
            other => {
                return Err(ProtocolError::MalformedData {
                    message: format!("payload is not an array: {}", other),
                    raw: raw.to_string(),
                })
            }
        };

        if !matches!(items.first(), Some(Value::Array(_))) {
            // Empty payloads are empty snapshots (`[0, "os", []]`)
            if items.is_empty() {
                return Ok(Self::Snapshot(Vec::new()));
            }
            return Ok(Self::Update(items));
        }

        items
            .into_iter()
            .map(|item| match item {
                Value::Array(row) => Ok(row),
                other => Err(ProtocolError::MalformedData {
                    message: format!("snapshot mixes rows and scalars: {}", other),
                    raw: raw.to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::Snapshot)
    }

    /// Number of rows carried
    pub fn len(&self) -> usize {
        match self {
            Self::Heartbeat => 0,
            Self::Update(_) => 1,
            Self::Snapshot(rows) => rows.len(),
        }
    }

    /// True for heartbeats and empty snapshots
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `[chanId, payload]` or `[chanId, tag, payload]`
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    pub chan_id: i64,
    /// Message tag (`te`, `on`, `ws`, ...) when present
    pub tag: Option<String>,
    pub payload: Payload,
}

impl DataFrame {
    /// True for heartbeat frames
    pub fn is_heartbeat(&self) -> bool {
        matches!(self.payload, Payload::Heartbeat)
    }
}

/// One classified inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(EventMessage),
    Data(DataFrame),
}

impl Frame {
    /// Parse and classify raw frame text
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson {
            message: e.to_string(),
            raw: text.to_string(),
        })?;

        match value {
            Value::Object(_) => {
                if !value.get("event").is_some_and(Value::is_string) {
                    return Err(ProtocolError::MalformedEvent {
                        message: "missing event field".into(),
                        raw: text.to_string(),
                    });
                }
                serde_json::from_value(value)
                    .map(Frame::Event)
                    .map_err(|e| ProtocolError::MalformedEvent {
                        message: e.to_string(),
                        raw: text.to_string(),
                    })
            }
            Value::Array(items) => Self::parse_data(items, text).map(Frame::Data),
            _ => Err(ProtocolError::UnexpectedShape {
                raw: text.to_string(),
            }),
        }
    }

    fn parse_data(items: Vec<Value>, raw: &str) -> Result<DataFrame, ProtocolError> {
        let mut items = items.into_iter();
        let chan_id = items
            .next()
            .and_then(|v| v.as_i64())
            .ok_or_else(|| ProtocolError::MalformedData {
                message: "first element is not a channel id".into(),
                raw: raw.to_string(),
            })?;

        let second = items.next().ok_or_else(|| ProtocolError::MalformedData {
            message: "missing payload".into(),
            raw: raw.to_string(),
        })?;

        let (tag, payload) = match second {
            Value::String(tag) if tag == HEARTBEAT => (None, Value::String(tag)),
            Value::String(tag) => {
                let payload = items.next().ok_or_else(|| ProtocolError::MalformedData {
                    message: format!("tag {} without payload", tag),
                    raw: raw.to_string(),
                })?;
                (Some(tag), payload)
            }
            payload => (None, payload),
        };

        Ok(DataFrame {
            chan_id,
            tag,
            payload: Payload::classify(payload, raw)?,
        })
    }
}

/// Serialize an outbound request to frame text
pub fn to_wire<T: Serialize>(request: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(request).map_err(|e| ProtocolError::MalformedEvent {
        message: e.to_string(),
        raw: String::new(),
    })
}
