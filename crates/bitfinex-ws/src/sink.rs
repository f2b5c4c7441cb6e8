//! Bounded per-subscription delivery queues
//!
//! Every subscription gets its own queue between the receive loop (single
//! producer) and the subscriber (single consumer). Capacity is fixed; what
//! happens when it is full is set by [`OverflowPolicy`]:
//!
//! - `Block` suspends the receive loop until the subscriber catches up. One
//!   loop serves every subscription on the connection, so a slow consumer
//!   stalls all of them.
//! - `DropOldest` evicts the oldest queued message to make room.
//! - `DropNewest` discards the incoming message.
//!
//! Terminal messages ignore capacity and always land.

use crate::events::StreamMessage;
use crate::subscription::{Feed, SubscriptionId};
use futures_util::stream::{self, Stream};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

/// Default queue capacity per subscription
pub const DEFAULT_SINK_CAPACITY: usize = 1024;

/// What to do when a subscriber's queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Wait for space (head-of-line blocking across the connection)
    #[default]
    Block,
    /// Evict the oldest queued message
    DropOldest,
    /// Discard the incoming message
    DropNewest,
}

/// Result of handing a message to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued
    Delivered,
    /// Discarded by the overflow policy
    Dropped,
    /// Sink closed or subscriber gone
    Closed,
}

#[derive(Debug)]
struct SinkState {
    queue: VecDeque<StreamMessage>,
    /// No more messages will be produced
    closed: bool,
    /// The subscriber dropped its stream
    detached: bool,
    dropped: u64,
    chan_id: Option<i64>,
}

#[derive(Debug)]
struct SinkShared {
    state: Mutex<SinkState>,
    capacity: usize,
    policy: OverflowPolicy,
    /// Signalled when a message is queued or the sink closes
    readable: Notify,
    /// Signalled when the subscriber frees a slot or detaches
    writable: Notify,
}

/// Create a connected sink/stream pair
pub fn channel(
    id: SubscriptionId,
    feed: Feed,
    capacity: usize,
    policy: OverflowPolicy,
) -> (SinkSender, SubscriptionStream) {
    let shared = Arc::new(SinkShared {
        state: Mutex::new(SinkState {
            queue: VecDeque::new(),
            closed: false,
            detached: false,
            dropped: 0,
            chan_id: None,
        }),
        capacity: capacity.max(1),
        policy,
        readable: Notify::new(),
        writable: Notify::new(),
    });

    (
        SinkSender {
            shared: Arc::clone(&shared),
        },
        SubscriptionStream { id, feed, shared },
    )
}

/// Producer side, held by the subscription registry
#[derive(Debug, Clone)]
pub struct SinkSender {
    shared: Arc<SinkShared>,
}

impl SinkSender {
    /// Queue a message, applying the overflow policy when full
    pub async fn deliver(&self, message: StreamMessage) -> Delivery {
        let mut message = Some(message);
        loop {
            let writable = {
                let mut state = self.shared.state.lock();
                if state.closed || state.detached {
                    return Delivery::Closed;
                }

                if state.queue.len() < self.shared.capacity {
                    if let Some(message) = message.take() {
                        state.queue.push_back(message);
                    }
                    drop(state);
                    self.shared.readable.notify_one();
                    return Delivery::Delivered;
                }

                match self.shared.policy {
                    OverflowPolicy::DropNewest => {
                        state.dropped += 1;
                        return Delivery::Dropped;
                    }
                    OverflowPolicy::DropOldest => {
                        state.queue.pop_front();
                        state.dropped += 1;
                        if let Some(message) = message.take() {
                            state.queue.push_back(message);
                        }
                        drop(state);
                        self.shared.readable.notify_one();
                        return Delivery::Delivered;
                    }
                    OverflowPolicy::Block => self.shared.writable.notified(),
                }
            };
            writable.await;
        }
    }

    /// Queue a final message regardless of capacity and close the sink
    ///
    /// A sink is terminated at most once. Returns `true` only if the message
    /// was queued for a subscriber; `false` if the sink was already closed or
    /// its stream was dropped.
    pub fn finish(&self, message: StreamMessage) -> bool {
        let queued = {
            let mut state = self.shared.state.lock();
            if state.closed {
                return false;
            }
            state.closed = true;
            if !state.detached {
                state.queue.push_back(message);
            }
            !state.detached
        };
        self.shared.readable.notify_one();
        queued
    }

    /// Check if the subscriber dropped its stream
    pub fn is_detached(&self) -> bool {
        self.shared.state.lock().detached
    }

    /// Close without a final message; the stream ends after draining
    pub fn close(&self) {
        self.shared.state.lock().closed = true;
        self.shared.readable.notify_one();
    }

    /// Record the channel id this sink is bound to
    pub fn set_chan_id(&self, chan_id: i64) {
        self.shared.state.lock().chan_id = Some(chan_id);
    }

    /// Check if the sink accepts no more messages
    pub fn is_closed(&self) -> bool {
        let state = self.shared.state.lock();
        state.closed || state.detached
    }
}

/// Consumer side of one subscription
///
/// Yields [`StreamMessage`]s in wire order. After a terminal message (or an
/// unsubscribe) the queue drains and [`recv`](Self::recv) returns `None`.
#[derive(Debug)]
pub struct SubscriptionStream {
    id: SubscriptionId,
    feed: Feed,
    shared: Arc<SinkShared>,
}

impl SubscriptionStream {
    /// Registry id of this subscription
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The feed this stream was requested for
    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    /// Server channel id, once acknowledged
    pub fn chan_id(&self) -> Option<i64> {
        self.shared.state.lock().chan_id
    }

    /// Messages discarded by the overflow policy so far
    pub fn dropped(&self) -> u64 {
        self.shared.state.lock().dropped
    }

    /// Number of queued messages
    pub fn len(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive the next message, waiting if none is queued
    pub async fn recv(&mut self) -> Option<StreamMessage> {
        loop {
            let readable = {
                let mut state = self.shared.state.lock();
                if let Some(message) = state.queue.pop_front() {
                    drop(state);
                    self.shared.writable.notify_one();
                    return Some(message);
                }
                if state.closed {
                    return None;
                }
                self.shared.readable.notified()
            };
            readable.await;
        }
    }

    /// Receive a queued message without waiting
    pub fn try_recv(&mut self) -> Option<StreamMessage> {
        let message = self.shared.state.lock().queue.pop_front();
        if message.is_some() {
            self.shared.writable.notify_one();
        }
        message
    }

    /// Convert into a `futures` stream
    pub fn into_stream(self) -> impl Stream<Item = StreamMessage> {
        stream::unfold(self, |mut this| async move {
            let message = this.recv().await?;
            Some((message, this))
        })
    }
}

impl Drop for SubscriptionStream {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.detached = true;
            state.queue.clear();
        }
        debug!(id = %self.id, "Subscription stream dropped");
        // Wake a producer blocked on a full queue
        self.shared.writable.notify_one();
    }
}
