//! Subscription management
//!
//! [`Feed`] describes what a caller wants; [`SubscriptionRegistry`] tracks each
//! request from `Pending` (sent, not yet acknowledged) to `Active` (bound to a
//! server channel id) to `Closed`.
//!
//! Acknowledgements carry no request id, so binding matches the echoed
//! fields ([`Ack`]) against the oldest pending entry. Two identical requests
//! are therefore bound in the order they were issued.

use crate::events::StreamMessage;
use crate::sink::SinkSender;
use bitfinex_types::{
    normalize_symbol, wire_symbol, Channel, Frequency, Precision, Schema, SubscribeRequest,
};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Default number of price levels per book side
pub const DEFAULT_BOOK_LENGTH: u32 = 25;

/// Registry-assigned subscription id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Subscription lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Requested, waiting for the server acknowledgement
    Pending,
    /// Bound to a channel id, receiving data
    Active,
    /// Unsubscribed, rejected or terminated with the connection
    Closed,
}

/// A logical feed to subscribe to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub channel: Channel,
    /// Prefixed symbol (`tBTCUSD`, `fUSD`); unprefixed input is taken as a
    /// trading pair
    pub symbol: Option<String>,
    /// Candle key (`trade:1m:tBTCUSD`)
    pub key: Option<String>,
    pub precision: Precision,
    pub frequency: Frequency,
    pub length: u32,
}

impl Feed {
    fn new(channel: Channel) -> Self {
        Self {
            channel,
            symbol: None,
            key: None,
            precision: Precision::default(),
            frequency: Frequency::default(),
            length: DEFAULT_BOOK_LENGTH,
        }
    }

    /// Ticker feed
    pub fn ticker(symbol: impl AsRef<str>) -> Self {
        Self {
            symbol: Some(wire_symbol(symbol.as_ref())),
            ..Self::new(Channel::Ticker)
        }
    }

    /// Public trades feed
    pub fn trades(symbol: impl AsRef<str>) -> Self {
        Self {
            symbol: Some(wire_symbol(symbol.as_ref())),
            ..Self::new(Channel::Trades)
        }
    }

    /// Order book feed at the given precision
    pub fn book(symbol: impl AsRef<str>, precision: Precision) -> Self {
        Self {
            symbol: Some(wire_symbol(symbol.as_ref())),
            precision,
            ..Self::new(Channel::Book)
        }
    }

    /// Candles feed for a key such as `trade:1m:tBTCUSD`
    pub fn candles(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new(Channel::Candles)
        }
    }

    /// Authenticated account feed (orders, positions, wallets, ...)
    pub fn account() -> Self {
        Self::new(Channel::Account)
    }

    /// Set book update frequency
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Set book length
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    /// Check if this feed needs an authenticated connection
    pub fn is_private(&self) -> bool {
        self.channel.is_private()
    }

    /// Symbol or key, for logging
    pub fn label(&self) -> &str {
        self.symbol
            .as_deref()
            .or(self.key.as_deref())
            .unwrap_or(self.channel.as_str())
    }

    /// Match against the fields echoed by an ack or error event
    ///
    /// Symbols compare without prefix or case. Book precision and length
    /// must agree when the event carries them.
    pub fn matches(&self, ack: &Ack<'_>) -> bool {
        if self.channel.as_str() != ack.channel {
            return false;
        }
        match self.channel {
            Channel::Candles => self.key.is_some() && self.key.as_deref() == ack.key,
            Channel::Book => self.symbol_matches(ack.symbol) && self.book_matches(ack),
            _ => self.symbol_matches(ack.symbol),
        }
    }

    fn symbol_matches(&self, symbol: Option<&str>) -> bool {
        match (self.symbol.as_deref(), symbol) {
            (Some(ours), Some(theirs)) => normalize_symbol(ours) == normalize_symbol(theirs),
            _ => false,
        }
    }

    fn book_matches(&self, ack: &Ack<'_>) -> bool {
        let prec_ok = ack.prec.map_or(true, |prec| prec == self.precision.as_str());
        let len_ok = ack
            .len
            .and_then(|len| len.parse::<u32>().ok())
            .map_or(true, |len| len == self.length);
        prec_ok && len_ok
    }

    /// Schema of this feed's data rows; `None` for the account feed
    pub fn schema(&self) -> Option<Schema> {
        Schema::for_channel(
            self.channel,
            self.symbol.as_deref().unwrap_or_default(),
            self.precision,
        )
    }

    /// Build the subscribe request; `None` for the account feed, which is
    /// opened by authenticating
    pub fn to_request(&self) -> Option<SubscribeRequest> {
        let request = SubscribeRequest::new(self.channel);
        match self.channel {
            Channel::Account => None,
            Channel::Candles => self.key.as_ref().map(|key| request.with_key(key.clone())),
            Channel::Book => self.symbol.as_ref().map(|symbol| {
                request
                    .with_symbol(symbol.clone())
                    .with_book(self.precision, self.frequency, self.length)
            }),
            Channel::Ticker | Channel::Trades => {
                self.symbol.as_ref().map(|symbol| request.with_symbol(symbol.clone()))
            }
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel, self.label())
    }
}

/// Identifying fields echoed by a `subscribed` or `error` event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ack<'a> {
    pub channel: &'a str,
    pub symbol: Option<&'a str>,
    pub key: Option<&'a str>,
    /// Book precision tag
    pub prec: Option<&'a str>,
    /// Book length
    pub len: Option<&'a str>,
}

impl<'a> Ack<'a> {
    /// Ack for a symbol feed
    pub fn symbol(channel: &'a str, symbol: &'a str) -> Self {
        Self {
            channel,
            symbol: Some(symbol),
            ..Self::default()
        }
    }

    /// Ack for a keyed feed (candles)
    pub fn key(channel: &'a str, key: &'a str) -> Self {
        Self {
            channel,
            key: Some(key),
            ..Self::default()
        }
    }

    /// Attach the echoed book parameters
    pub fn with_book(mut self, prec: Option<&'a str>, len: Option<&'a str>) -> Self {
        self.prec = prec;
        self.len = len;
        self
    }
}

/// Where a data frame for one channel id goes
#[derive(Debug, Clone)]
pub struct Route {
    pub id: SubscriptionId,
    pub sink: SinkSender,
    /// `None` for the account channel (schema chosen per message tag)
    pub schema: Option<Schema>,
}

/// Result of matching an acknowledgement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// Oldest matching pending entry is now active
    Bound { id: SubscriptionId, feed: Feed },
    /// No pending entry matched
    NoMatch,
}

#[derive(Debug)]
struct PendingEntry {
    id: SubscriptionId,
    feed: Feed,
    sink: SinkSender,
    /// Subscribe frame already written
    sent: bool,
}

#[derive(Debug)]
struct ActiveEntry {
    id: SubscriptionId,
    feed: Feed,
    sink: SinkSender,
    schema: Option<Schema>,
}

/// Channel-id to sink table, owned by one connection
///
/// Not internally synchronized; the connection wraps it in a mutex held only
/// for table access, never across a delivery.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    /// Unbound entries in registration order
    pending: Vec<PendingEntry>,
    active: HashMap<i64, ActiveEntry>,
    next_id: u64,
}

impl SubscriptionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the id the next registration will get
    pub fn next_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Record a pending subscription under an id from [`next_id`](Self::next_id)
    pub fn register(&mut self, id: SubscriptionId, feed: Feed, sink: SinkSender) {
        debug!(%id, feed = %feed, "Subscription registered");
        self.pending.push(PendingEntry {
            id,
            feed,
            sink,
            sent: false,
        });
    }

    /// Public feeds whose subscribe frame has not been written yet.
    /// Marks them as sent.
    pub fn take_unsent(&mut self) -> Vec<(SubscriptionId, Feed)> {
        self.pending
            .iter_mut()
            .filter(|entry| !entry.sent && !entry.feed.is_private())
            .map(|entry| {
                entry.sent = true;
                (entry.id, entry.feed.clone())
            })
            .collect()
    }

    /// Bind `chan_id` to the oldest pending entry matching the ack
    pub fn bind(&mut self, ack: &Ack<'_>, chan_id: i64) -> BindOutcome {
        let Some(position) = self.pending.iter().position(|entry| entry.feed.matches(ack)) else {
            return BindOutcome::NoMatch;
        };

        let entry = self.pending.remove(position);
        let outcome = BindOutcome::Bound {
            id: entry.id,
            feed: entry.feed.clone(),
        };
        self.activate(chan_id, entry);
        outcome
    }

    /// Bind the account channel to the oldest pending private entry.
    ///
    /// Returns the bound id and the sinks of any further private entries,
    /// which cannot share the channel and must be rejected.
    pub fn bind_account(&mut self, chan_id: i64) -> (Option<SubscriptionId>, Vec<SinkSender>) {
        let (private, public): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|entry| entry.feed.is_private());
        self.pending = public;

        let mut private = private.into_iter();
        let bound = if self.active.contains_key(&chan_id) {
            None
        } else {
            private.next().map(|entry| {
                let id = entry.id;
                self.activate(chan_id, entry);
                id
            })
        };

        (bound, private.map(|entry| entry.sink).collect())
    }

    fn activate(&mut self, chan_id: i64, entry: PendingEntry) {
        entry.sink.set_chan_id(chan_id);
        let active = ActiveEntry {
            schema: entry.feed.schema(),
            id: entry.id,
            feed: entry.feed,
            sink: entry.sink,
        };
        debug!(id = %active.id, chan_id, feed = %active.feed, "Subscription active");
        if let Some(previous) = self.active.insert(chan_id, active) {
            warn!(chan_id, previous = %previous.id, "Channel id rebound, ending previous owner");
            previous.sink.finish(StreamMessage::Rejected {
                code: None,
                message: format!("channel {} was assigned to another subscription", chan_id),
            });
        }
    }

    /// Remove the oldest pending entry matching a rejected request
    pub fn reject(&mut self, ack: &Ack<'_>) -> Option<(SubscriptionId, SinkSender)> {
        let position = self.pending.iter().position(|entry| entry.feed.matches(ack))?;
        let entry = self.pending.remove(position);
        Some((entry.id, entry.sink))
    }

    /// Remove the active entry for `chan_id`
    pub fn unbind(&mut self, chan_id: i64) -> Option<(SubscriptionId, SinkSender)> {
        self.active
            .remove(&chan_id)
            .map(|entry| (entry.id, entry.sink))
    }

    /// Route for a data frame; `None` for unknown ids
    pub fn lookup(&self, chan_id: i64) -> Option<Route> {
        self.active.get(&chan_id).map(|entry| Route {
            id: entry.id,
            sink: entry.sink.clone(),
            schema: entry.schema.clone(),
        })
    }

    /// Check if an account feed is waiting for authentication
    pub fn has_pending_private(&self) -> bool {
        self.pending.iter().any(|entry| entry.feed.is_private())
    }

    /// Current state of a subscription; `None` if the id was never issued
    pub fn state(&self, id: SubscriptionId) -> Option<SubscriptionState> {
        if self.pending.iter().any(|entry| entry.id == id) {
            Some(SubscriptionState::Pending)
        } else if self.active.values().any(|entry| entry.id == id) {
            Some(SubscriptionState::Active)
        } else if id.0 < self.next_id {
            Some(SubscriptionState::Closed)
        } else {
            None
        }
    }

    /// Channel id bound to a subscription
    pub fn chan_id_of(&self, id: SubscriptionId) -> Option<i64> {
        self.active
            .iter()
            .find(|(_, entry)| entry.id == id)
            .map(|(chan_id, _)| *chan_id)
    }

    /// Number of pending entries
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of active entries
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Remove every entry, returning their sinks
    pub fn drain(&mut self) -> Vec<SinkSender> {
        let pending = self.pending.drain(..).map(|entry| entry.sink);
        let active = self.active.drain().map(|(_, entry)| entry.sink);
        pending.chain(active).collect()
    }
}
