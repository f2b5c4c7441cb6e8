//! WebSocket connection management
//!
//! One [`Connection`] owns one socket and runs one sequential receive loop:
//!
//! ```text
//! Disconnected -> Connecting -> (Authenticating) -> Subscribing -> Streaming -> Terminated
//! ```
//!
//! Authentication only happens when an account feed is requested. Subscribe
//! requests are not awaited one by one; acknowledgements bind channel ids as
//! they arrive while data for already-bound channels keeps flowing.
//!
//! Any read or write failure, a failed handshake, or [`Connection::close`]
//! ends the loop. Every live subscription then gets exactly one
//! [`StreamMessage::Terminated`]. There is no reconnection; build a new
//! `Connection` to resume.

use crate::endpoint::Endpoint;
use crate::error::{TerminalError, TerminalKind, WsError, WsResult};
use crate::events::{ConnectionEvent, StreamMessage, Update, UpdateKind};
use crate::sink::{self, Delivery, OverflowPolicy, SubscriptionStream, DEFAULT_SINK_CAPACITY};
use crate::subscription::{
    Ack, BindOutcome, Feed, SubscriptionId, SubscriptionRegistry, SubscriptionState,
};
use crate::transport::{
    Transport, TransportError, WsTransport, DEFAULT_CONNECT_TIMEOUT, DEFAULT_IDLE_TIMEOUT,
};

use bitfinex_auth::{AuthError, Credentials, Signer};
use bitfinex_types::{
    to_wire, AuthRequest, Channel, DataFrame, EventMessage, Frame, Payload, Schema,
    UnsubscribeRequest, ACCOUNT_CHANNEL_ID,
};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Duration, Instant};
use tracing::{debug, info, instrument, trace, warn};

/// WebSocket connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not started
    Disconnected,
    /// Opening the socket
    Connecting,
    /// Waiting for the auth acknowledgement
    Authenticating,
    /// Sending subscribe requests
    Subscribing,
    /// Receive loop running
    Streaming,
    /// Finished; accepts no more work
    Terminated,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What to do with the rest of a snapshot when one item fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchErrorPolicy {
    /// Report the failed item and keep decoding the others
    #[default]
    Isolate,
    /// Report the failed item and drop the rest of the batch
    Abort,
}

/// Configuration for the WebSocket connection
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket endpoint
    pub endpoint: Endpoint,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Silence before the socket is pinged; a second silent window ends it
    pub idle_timeout: Option<Duration>,
    /// Bound on the auth handshake; `None` waits indefinitely
    pub auth_timeout: Option<Duration>,
    /// Queue capacity per subscription
    pub sink_capacity: usize,
    /// Behavior of a full subscription queue
    pub overflow_policy: OverflowPolicy,
    /// Behavior on a failed snapshot item
    pub batch_error_policy: BatchErrorPolicy,
    /// Ask the server to cancel all orders when the connection drops
    pub dead_man_switch: bool,
    /// Restrict account messages (`trading`, `wallet`, `funding`, ...)
    pub auth_filter: Option<Vec<String>>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::Public,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
            auth_timeout: Some(Duration::from_secs(15)),
            sink_capacity: DEFAULT_SINK_CAPACITY,
            overflow_policy: OverflowPolicy::default(),
            batch_error_policy: BatchErrorPolicy::default(),
            dead_man_switch: false,
            auth_filter: None,
        }
    }
}

impl ConnectionConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the idle window before a ping (`None` disables keepalive)
    pub fn with_idle_timeout(mut self, idle: Option<Duration>) -> Self {
        self.idle_timeout = idle;
        self
    }

    /// Set the auth handshake bound (`None` for no bound)
    pub fn with_auth_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.auth_timeout = timeout;
        self
    }

    /// Set per-subscription queue capacity
    pub fn with_sink_capacity(mut self, capacity: usize) -> Self {
        self.sink_capacity = capacity;
        self
    }

    /// Set the overflow policy
    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Set the snapshot error policy
    pub fn with_batch_error_policy(mut self, policy: BatchErrorPolicy) -> Self {
        self.batch_error_policy = policy;
        self
    }

    /// Enable the dead-man switch
    pub fn with_dead_man_switch(mut self, enabled: bool) -> Self {
        self.dead_man_switch = enabled;
        self
    }

    /// Filter account messages
    pub fn with_auth_filter(mut self, filter: Vec<String>) -> Self {
        self.auth_filter = Some(filter);
        self
    }
}

/// Requests from callers to the receive loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// New subscriptions were registered
    Flush,
    Unsubscribe(i64),
    Close,
}

/// State shared between the connection, its handles and the receive loop
struct Shared {
    registry: Mutex<SubscriptionRegistry>,
    state: RwLock<ConnectionState>,
    signer: RwLock<Signer>,
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    sink_capacity: usize,
    overflow_policy: OverflowPolicy,
}

impl Shared {
    fn emit(&self, event: ConnectionEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    fn set_state(&self, to: ConnectionState) {
        let from = std::mem::replace(&mut *self.state.write(), to);
        if from != to {
            debug!(%from, %to, "Connection state changed");
            self.emit(ConnectionEvent::StateChanged { from, to });
        }
    }
}

/// Cloneable handle for subscribing and controlling a running connection
#[derive(Clone)]
pub struct ConnectionHandle {
    shared: Arc<Shared>,
}

impl ConnectionHandle {
    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.read()
    }

    /// Subscribe to a feed
    ///
    /// Works before [`Connection::run`] and while it runs. Account feeds need
    /// credentials on the connection's signer.
    pub fn subscribe(&self, feed: Feed) -> WsResult<SubscriptionStream> {
        if feed.is_private() && !self.shared.signer.read().has_credentials() {
            return Err(AuthError::CredentialsNotSet.into());
        }

        let stream = {
            let mut registry = self.shared.registry.lock();
            // Checked under the registry lock so termination cannot miss this entry
            if *self.shared.state.read() == ConnectionState::Terminated {
                return Err(WsError::Terminated);
            }
            let id = registry.next_id();
            let (sink, stream) = sink::channel(
                id,
                feed.clone(),
                self.shared.sink_capacity,
                self.shared.overflow_policy,
            );
            registry.register(id, feed, sink);
            stream
        };

        // Picked up once the loop runs
        let _ = self.shared.commands.send(Command::Flush);
        Ok(stream)
    }

    /// Request an unsubscribe; the stream ends when the server confirms
    pub fn unsubscribe(&self, chan_id: i64) -> WsResult<()> {
        self.command(Command::Unsubscribe(chan_id))
    }

    /// Stop the receive loop and terminate every subscription
    pub fn close(&self) -> WsResult<()> {
        self.command(Command::Close)
    }

    /// Lifecycle state of a subscription
    pub fn subscription_state(&self, id: SubscriptionId) -> Option<SubscriptionState> {
        self.shared.registry.lock().state(id)
    }

    fn command(&self, command: Command) -> WsResult<()> {
        if self.state() == ConnectionState::Terminated {
            return Err(WsError::Terminated);
        }
        self.shared
            .commands
            .send(command)
            .map_err(|_| WsError::ChannelClosed)
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("state", &self.state())
            .finish()
    }
}

/// WebSocket connection to Bitfinex
pub struct Connection {
    config: ConnectionConfig,
    handle: ConnectionHandle,
    /// Taken by `run`
    transport: Mutex<Option<Box<dyn Transport>>>,
    /// Taken by `run`
    command_rx: Mutex<Option<mpsc::UnboundedReceiver<Command>>>,
    /// Event receiver (for public consumption)
    event_rx: RwLock<Option<mpsc::UnboundedReceiver<ConnectionEvent>>>,
}

impl Connection {
    /// Create a connection over a real WebSocket
    pub fn new(config: ConnectionConfig) -> Self {
        let transport = WsTransport::new(config.endpoint.url())
            .with_timeout(config.connect_timeout)
            .with_idle_timeout(config.idle_timeout);
        Self::with_transport(config, transport)
    }

    /// Create a connection over any transport
    pub fn with_transport(config: ConnectionConfig, transport: impl Transport + 'static) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            registry: Mutex::new(SubscriptionRegistry::new()),
            state: RwLock::new(ConnectionState::Disconnected),
            signer: RwLock::new(Signer::new()),
            commands: command_tx,
            events: event_tx,
            sink_capacity: config.sink_capacity,
            overflow_policy: config.overflow_policy,
        });

        Self {
            config,
            handle: ConnectionHandle { shared },
            transport: Mutex::new(Some(Box::new(transport))),
            command_rx: Mutex::new(Some(command_rx)),
            event_rx: RwLock::new(Some(event_rx)),
        }
    }

    /// Use a configured signer (credentials, nonce source)
    pub fn with_signer(self, signer: Signer) -> Self {
        *self.handle.shared.signer.write() = signer;
        self
    }

    /// Set credentials for the account feed
    pub fn with_credentials(self, credentials: Credentials) -> Self {
        self.handle.shared.signer.write().set_credentials(credentials);
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Get a cloneable handle
    pub fn handle(&self) -> ConnectionHandle {
        self.handle.clone()
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        self.handle.state()
    }

    /// Take the event receiver (can only be called once)
    pub fn take_event_receiver(&self) -> Option<mpsc::UnboundedReceiver<ConnectionEvent>> {
        self.event_rx.write().take()
    }

    /// Subscribe to a feed; see [`ConnectionHandle::subscribe`]
    pub fn subscribe(&self, feed: Feed) -> WsResult<SubscriptionStream> {
        self.handle.subscribe(feed)
    }

    /// Request an unsubscribe
    pub fn unsubscribe(&self, chan_id: i64) -> WsResult<()> {
        self.handle.unsubscribe(chan_id)
    }

    /// Stop the receive loop
    pub fn close(&self) -> WsResult<()> {
        self.handle.close()
    }

    /// Lifecycle state of a subscription
    pub fn subscription_state(&self, id: SubscriptionId) -> Option<SubscriptionState> {
        self.handle.subscription_state(id)
    }

    /// Connect and run the receive loop until the connection ends
    ///
    /// Returns `Ok(())` after [`close`](Self::close) and the terminal error
    /// otherwise. Either way every subscription has been terminated when this
    /// returns.
    #[instrument(skip(self), fields(url = %self.config.endpoint))]
    pub async fn run(&self) -> WsResult<()> {
        if self.state() == ConnectionState::Terminated {
            return Err(WsError::Terminated);
        }
        let transport = self.transport.lock().take().ok_or(WsError::AlreadyRunning)?;
        let commands = self.command_rx.lock().take().ok_or(WsError::AlreadyRunning)?;

        let mut driver = Driver {
            shared: &self.handle.shared,
            config: &self.config,
            transport,
            commands,
            account_chan: None,
        };

        let result = driver.drive().await;
        let terminal = match &result {
            Ok(()) => TerminalError::new(TerminalKind::Closed, "connection closed"),
            Err(e) => e.to_terminal(),
        };
        driver.terminate(terminal).await;
        result
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

// ============================================================================
// Receive Loop
// ============================================================================

struct Driver<'a> {
    shared: &'a Shared,
    config: &'a ConnectionConfig,
    transport: Box<dyn Transport>,
    commands: mpsc::UnboundedReceiver<Command>,
    /// Bound account channel, once authenticated
    account_chan: Option<i64>,
}

impl Driver<'_> {
    async fn drive(&mut self) -> WsResult<()> {
        self.shared.set_state(ConnectionState::Connecting);
        self.transport.connect().await?;
        info!(url = self.transport.endpoint(), "Connected");

        let needs_auth = self.shared.registry.lock().has_pending_private();
        if needs_auth {
            self.authenticate().await?;
        }

        self.shared.set_state(ConnectionState::Subscribing);
        self.send_subscribes().await?;
        self.shared.set_state(ConnectionState::Streaming);

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Flush) => self.flush().await?,
                    Some(Command::Unsubscribe(chan_id)) => {
                        debug!(chan_id, "Sending unsubscribe");
                        self.send(&UnsubscribeRequest::new(chan_id)).await?;
                    }
                    Some(Command::Close) | None => {
                        info!("Close requested");
                        return Ok(());
                    }
                },

                frame = self.transport.recv() => match frame? {
                    Some(text) => self.dispatch(&text).await?,
                    None => return Err(TransportError::ConnectionClosed.into()),
                },
            }
        }
    }

    /// Handle subscriptions registered while streaming
    async fn flush(&mut self) -> WsResult<()> {
        let needs_auth = self.shared.registry.lock().has_pending_private();
        if needs_auth {
            match self.account_chan {
                Some(chan_id) => self.bind_account(chan_id),
                None => {
                    self.authenticate().await?;
                    self.shared.set_state(ConnectionState::Streaming);
                }
            }
        }
        self.send_subscribes().await
    }

    async fn send_subscribes(&mut self) -> WsResult<()> {
        let unsent = self.shared.registry.lock().take_unsent();
        for (id, feed) in unsent {
            if let Some(request) = feed.to_request() {
                debug!(%id, feed = %feed, "Sending subscribe");
                self.send(&request).await?;
            }
        }
        Ok(())
    }

    async fn send<T: Serialize>(&mut self, request: &T) -> WsResult<()> {
        let text = to_wire(request).map_err(|e| WsError::Serialize(e.to_string()))?;
        self.transport.send(&text).await?;
        Ok(())
    }

    /// Send the auth event and wait for its acknowledgement
    ///
    /// Other frames arriving meanwhile are dispatched normally.
    async fn authenticate(&mut self) -> WsResult<()> {
        self.shared.set_state(ConnectionState::Authenticating);
        if !self.config.endpoint.supports_auth() {
            warn!(endpoint = %self.config.endpoint, "Authenticating on the public endpoint");
        }

        let payload = self.shared.signer.read().ws_auth()?;
        let mut request = AuthRequest::new(
            payload.api_key,
            payload.auth_sig,
            payload.auth_payload,
            payload.auth_nonce,
        );
        if self.config.dead_man_switch {
            request = request.with_dead_man_switch();
        }
        if let Some(filter) = &self.config.auth_filter {
            request = request.with_filter(filter.clone());
        }
        self.send(&request).await?;
        debug!(nonce = request.auth_nonce, "Auth request sent");

        let limit = self.config.auth_timeout;
        let deadline = limit.map(|limit| Instant::now() + limit);

        loop {
            let frame = match (deadline, limit) {
                (Some(deadline), Some(limit)) => timeout_at(deadline, self.transport.recv())
                    .await
                    .map_err(|_| WsError::AuthTimeout(limit))??,
                _ => self.transport.recv().await?,
            };
            let Some(text) = frame else {
                return Err(TransportError::ConnectionClosed.into());
            };

            match Frame::parse(&text) {
                Ok(Frame::Event(EventMessage::Auth {
                    status,
                    chan_id,
                    user_id,
                    code,
                    msg,
                })) => {
                    if status.eq_ignore_ascii_case("OK") {
                        info!(?user_id, "Authenticated");
                        self.shared.emit(ConnectionEvent::Authenticated { user_id });
                        let chan_id = chan_id.unwrap_or(ACCOUNT_CHANNEL_ID);
                        self.account_chan = Some(chan_id);
                        self.bind_account(chan_id);
                        return Ok(());
                    }
                    warn!(?code, status = %status, "Authentication rejected");
                    return Err(AuthError::Rejected {
                        code,
                        message: msg.unwrap_or(status),
                    }
                    .into());
                }
                Ok(frame) => self.handle_frame(frame).await?,
                Err(e) => warn!(error = %e, "Dropping unusable frame"),
            }
        }
    }

    fn bind_account(&mut self, chan_id: i64) {
        let (bound, extra) = self.shared.registry.lock().bind_account(chan_id);
        for sink in extra {
            sink.finish(StreamMessage::Rejected {
                code: None,
                message: "account channel already subscribed".into(),
            });
        }
        if let Some(id) = bound {
            self.shared.emit(ConnectionEvent::Subscribed {
                id,
                chan_id,
                channel: Channel::Account,
                symbol: None,
            });
        }
    }

    async fn dispatch(&mut self, text: &str) -> WsResult<()> {
        match Frame::parse(text) {
            Ok(frame) => self.handle_frame(frame).await,
            Err(e) => {
                warn!(error = %e, "Dropping unusable frame");
                Ok(())
            }
        }
    }

    async fn handle_frame(&mut self, frame: Frame) -> WsResult<()> {
        match frame {
            Frame::Event(event) => {
                self.handle_event(event);
                Ok(())
            }
            Frame::Data(data) => self.handle_data(data).await,
        }
    }

    fn handle_event(&mut self, event: EventMessage) {
        match event {
            EventMessage::Info {
                version, code, msg, ..
            } => {
                info!(?version, ?code, "Server info");
                self.shared.emit(ConnectionEvent::Info {
                    version,
                    code,
                    message: msg,
                });
            }
            EventMessage::Subscribed {
                channel,
                chan_id,
                symbol,
                key,
                prec,
                len,
                ..
            } => {
                let ack = Ack {
                    channel: &channel,
                    symbol: symbol.as_deref(),
                    key: key.as_deref(),
                    prec: prec.as_deref(),
                    len: len.as_deref(),
                };
                let outcome = self.shared.registry.lock().bind(&ack, chan_id);
                match outcome {
                    BindOutcome::Bound { id, feed } => {
                        self.shared.emit(ConnectionEvent::Subscribed {
                            id,
                            chan_id,
                            channel: feed.channel,
                            symbol: feed.symbol,
                        });
                    }
                    BindOutcome::NoMatch => {
                        warn!(
                            channel = %channel,
                            ?symbol,
                            ?key,
                            chan_id,
                            "Acknowledgement matches no pending subscription"
                        );
                    }
                }
            }
            EventMessage::Unsubscribed { chan_id, .. } => {
                let removed = self.shared.registry.lock().unbind(chan_id);
                if let Some((id, sink)) = removed {
                    debug!(%id, chan_id, "Subscription closed");
                    sink.close();
                }
                self.shared.emit(ConnectionEvent::Unsubscribed { chan_id });
            }
            EventMessage::Error {
                code,
                msg,
                channel,
                symbol,
                key,
            } => {
                let rejected = channel.as_deref().and_then(|channel| {
                    let ack = Ack {
                        channel,
                        symbol: symbol.as_deref(),
                        key: key.as_deref(),
                        ..Ack::default()
                    };
                    self.shared.registry.lock().reject(&ack)
                });
                match rejected {
                    Some((id, sink)) => {
                        warn!(%id, ?code, message = %msg, "Subscription rejected");
                        sink.finish(StreamMessage::Rejected { code, message: msg });
                    }
                    None => {
                        warn!(?code, message = %msg, "Server error");
                        self.shared.emit(ConnectionEvent::Notice { code, message: msg });
                    }
                }
            }
            EventMessage::Auth { status, .. } => {
                debug!(status = %status, "Ignoring unsolicited auth event");
            }
            EventMessage::Pong { .. } | EventMessage::Conf { .. } | EventMessage::Unknown => {
                trace!(?event, "Ignoring event");
            }
        }
    }

    async fn handle_data(&mut self, frame: DataFrame) -> WsResult<()> {
        if frame.is_heartbeat() {
            trace!(chan_id = frame.chan_id, "Heartbeat");
            return Ok(());
        }

        let chan_id = frame.chan_id;
        let route = self.shared.registry.lock().lookup(chan_id);
        let Some(route) = route else {
            debug!(chan_id, "Dropping data for unknown channel");
            return Ok(());
        };

        let Some(schema) = route
            .schema
            .clone()
            .or_else(|| frame.tag.as_deref().and_then(Schema::for_account_tag))
        else {
            trace!(chan_id, tag = ?frame.tag, "No schema for message, skipping");
            return Ok(());
        };

        let kind = UpdateKind::from_tag(frame.tag.as_deref(), &frame.payload);
        let rows = match frame.payload {
            Payload::Update(row) => vec![row],
            Payload::Snapshot(rows) => rows,
            Payload::Heartbeat => return Ok(()),
        };

        for row in rows {
            let (message, abort) = match schema.decode(&row) {
                Ok(event) => (
                    StreamMessage::Update(Update {
                        chan_id,
                        kind,
                        event,
                    }),
                    false,
                ),
                Err(error) => {
                    warn!(chan_id, %error, "Failed to decode item");
                    (
                        StreamMessage::DecodeFailed { chan_id, error },
                        self.config.batch_error_policy == BatchErrorPolicy::Abort,
                    )
                }
            };

            match route.sink.deliver(message).await {
                Delivery::Delivered => {}
                Delivery::Dropped => trace!(id = %route.id, "Queue full, message dropped"),
                Delivery::Closed => {
                    debug!(id = %route.id, "Subscriber gone, skipping rest of frame");
                    if route.sink.is_detached() {
                        self.release(chan_id).await?;
                    }
                    break;
                }
            }
            if abort {
                debug!(chan_id, "Aborting rest of batch");
                break;
            }
        }
        Ok(())
    }

    /// Drop the route of a subscriber that went away and stop the server feed
    async fn release(&mut self, chan_id: i64) -> WsResult<()> {
        let removed = self.shared.registry.lock().unbind(chan_id);
        let Some((id, sink)) = removed else {
            return Ok(());
        };
        sink.close();
        info!(%id, chan_id, "Subscriber dropped its stream, unsubscribing");

        // The account channel lives as long as the authenticated session
        if Some(chan_id) == self.account_chan {
            return Ok(());
        }
        self.send(&UnsubscribeRequest::new(chan_id)).await
    }

    /// Deliver one terminal message to every live sink and release the socket
    async fn terminate(&mut self, terminal: TerminalError) {
        let sinks = {
            let mut registry = self.shared.registry.lock();
            self.shared.set_state(ConnectionState::Terminated);
            registry.drain()
        };

        let notified = sinks
            .iter()
            .filter(|sink| sink.finish(StreamMessage::Terminated(terminal.clone())))
            .count();

        match terminal.kind {
            TerminalKind::Closed => info!(subscriptions = notified, "Connection closed"),
            _ => warn!(subscriptions = notified, error = %terminal, "Connection terminated"),
        }
        self.shared.emit(ConnectionEvent::Terminated(terminal));

        if let Err(e) = self.transport.close().await {
            debug!(error = %e, "Error closing transport");
        }
    }
}
