//! Bridge session object and event loop.
//!
//! A [`Bridge`] owns one session with the host shell: the frame channel,
//! the correlation table, the negotiated capability matrix, the
//! readiness gate with its outbound queue, and the child-window
//! registry. All of it is session-scoped state with an explicit
//! init/reset lifecycle — multiple isolated bridges can coexist in one
//! process, which is how the integration tests run.
//!
//! # Event Loop
//!
//! The bridge spawns a tokio task that handles:
//!
//! - Outbound calls from the caller-facing API (direct or queued)
//! - Inbound messages from the host and from child windows
//! - Queue drain/failure on handshake completion
//! - Child attach/detach and close detection

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::ChildWindowId;
use crate::protocol::{Command, CoreCommand, Envelope, ResponseEnvelope, RuntimeConfig};
use crate::transport::{FrameChannel, FrameSender};

use super::capability::CapabilityMatrix;
use super::child::{ChildRegistry, spawn_child_forwarder};
use super::correlator::{Correlator, Route};
use super::gate::{OutboundQueue, ReadinessState};
use super::invoke::PendingReply;

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for the initialization handshake.
const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Protocol version this SDK declares in the handshake.
const SDK_VERSION: &str = "2.0.0";

// ============================================================================
// BridgeConfig
// ============================================================================

/// Configuration for a bridge session.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Protocol version declared to the host in the handshake.
    pub sdk_version: String,

    /// Maximum time to wait for the handshake response.
    pub handshake_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            sdk_version: SDK_VERSION.to_string(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

// ============================================================================
// Shared State
// ============================================================================

/// Session state shared between the caller-facing API and the event loop.
struct Shared {
    /// Current readiness state. Written by `initialize`/`uninitialize`
    /// and read on every call path.
    readiness: RwLock<ReadinessState>,

    /// Negotiated capability matrix. `None` until the handshake
    /// completes; holding no matrix at all is what makes a pre-Ready
    /// support query an error rather than a guess.
    matrix: RwLock<Option<CapabilityMatrix>>,
}

// ============================================================================
// QueuedCall
// ============================================================================

/// An outbound call travelling through the event loop.
///
/// `gate` carries the capability check for calls queued before the
/// matrix existed; it is applied at drain time.
#[derive(Debug)]
pub(crate) struct QueuedCall {
    envelope: Envelope,
    route: Route,
    gate: Option<(&'static str, &'static str)>,
}

// ============================================================================
// BridgeCommand
// ============================================================================

/// Internal commands for the event loop.
#[derive(Debug)]
pub(crate) enum BridgeCommand {
    /// Transmit a call, or queue it while the handshake is pending.
    Transmit {
        /// The call and its deferred capability gate.
        entry: QueuedCall,
    },
    /// Transmit the handshake envelope, bypassing the queue.
    TransmitHandshake {
        /// The `initialize` envelope.
        envelope: Envelope,
    },
    /// Handshake completed: replay the queue in enqueue order.
    DrainQueue,
    /// Handshake failed: settle every queued call as an init failure.
    FailQueue,
    /// Reset: drop queued calls and child handles, then acknowledge.
    ClearQueue {
        /// Acknowledged once the loop state is clean.
        done: oneshot::Sender<()>,
    },
    /// A message arrived from the host or a child window.
    Inbound {
        /// Which peer sent it.
        origin: Route,
        /// Raw message text.
        text: String,
    },
    /// A peer's channel ended.
    PeerClosed {
        /// Which peer closed.
        origin: Route,
    },
    /// Register a child window's sender half.
    AttachChild {
        /// Child identity.
        child_id: ChildWindowId,
        /// Sender half of the child's channel.
        sender: FrameSender,
    },
    /// Remove a child window and settle its pending calls.
    DetachChild {
        /// Child identity.
        child_id: ChildWindowId,
    },
    /// Terminate the event loop.
    Shutdown,
}

// ============================================================================
// Bridge
// ============================================================================

/// One session of the guest-to-host RPC bridge.
///
/// # Thread Safety
///
/// `Bridge` is `Send + Sync` and cheap to clone; clones share the same
/// session. All operations are non-blocking except the explicitly
/// awaited ones.
#[derive(Clone)]
pub struct Bridge {
    /// Channel into the event loop.
    command_tx: mpsc::UnboundedSender<BridgeCommand>,
    /// Session state shared with the event loop.
    shared: Arc<Shared>,
    /// Pending-call table shared with the event loop.
    correlator: Arc<Correlator>,
    /// Session configuration.
    config: BridgeConfig,
}

// ============================================================================
// Bridge - Construction
// ============================================================================

impl Bridge {
    /// Creates a bridge over the guest end of a frame channel.
    ///
    /// Spawns the event loop task internally; must be called within a
    /// tokio runtime. The bridge starts in
    /// [`ReadinessState::NotStarted`]; no call succeeds before
    /// [`initialize`](Bridge::initialize).
    #[must_use]
    pub fn new(channel: FrameChannel) -> Self {
        Self::with_config(channel, BridgeConfig::default())
    }

    /// Creates a bridge with explicit configuration.
    #[must_use]
    pub fn with_config(channel: FrameChannel, config: BridgeConfig) -> Self {
        let (host_tx, mut host_rx) = channel.split();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            readiness: RwLock::new(ReadinessState::NotStarted),
            matrix: RwLock::new(None),
        });
        let correlator = Arc::new(Correlator::new());

        // Host inbound forwarder.
        let inbound_tx = command_tx.clone();
        tokio::spawn(async move {
            while let Some(text) = host_rx.recv().await {
                if inbound_tx
                    .send(BridgeCommand::Inbound {
                        origin: Route::Host,
                        text,
                    })
                    .is_err()
                {
                    return;
                }
            }
            let _ = inbound_tx.send(BridgeCommand::PeerClosed {
                origin: Route::Host,
            });
        });

        tokio::spawn(Self::run_event_loop(
            host_tx,
            command_rx,
            Arc::clone(&shared),
            Arc::clone(&correlator),
        ));

        Self {
            command_tx,
            shared,
            correlator,
            config,
        }
    }
}

// ============================================================================
// Bridge - Lifecycle
// ============================================================================

impl Bridge {
    /// Performs the initialization handshake with the host.
    ///
    /// Sends the `initialize` call (bypassing the outbound queue),
    /// awaits the correlated response within the configured handshake
    /// timeout, and populates the capability matrix from its payload.
    /// On success the readiness gate opens and queued calls replay in
    /// enqueue order; on failure the session transitions to `Failed`
    /// and every queued call settles as an initialization failure.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] if already initialized, or if the
    ///   handshake payload is malformed
    /// - [`Error::HandshakeTimeout`] if the host never responds
    /// - [`Error::Host`] if the host rejected the handshake
    pub async fn initialize(&self) -> Result<()> {
        {
            let mut readiness = self.shared.readiness.write();
            match *readiness {
                ReadinessState::NotStarted => *readiness = ReadinessState::AwaitingHandshake,
                ReadinessState::AwaitingHandshake | ReadinessState::Ready => {
                    return Err(Error::protocol("Bridge already initialized"));
                }
                ReadinessState::Failed => {
                    return Err(Error::protocol(
                        "Bridge initialization previously failed; reset required",
                    ));
                }
            }
        }

        let command = Command::Core(CoreCommand::Initialize {
            version: self.config.sdk_version.clone(),
        });
        let envelope = command.into_envelope()?;
        let id = envelope.id;

        let rx = self.correlator.register(id, Route::Host)?;
        self.command_tx
            .send(BridgeCommand::TransmitHandshake { envelope })
            .map_err(|_| Error::ChannelClosed)?;

        let bound = self.config.handshake_timeout;
        let result = match timeout(bound, rx).await {
            Err(_) => {
                self.correlator.remove(id);
                Err(Error::handshake_timeout(bound.as_millis() as u64))
            }
            Ok(Err(_)) => Err(Error::ChannelClosed),
            Ok(Ok(Ok(response))) => response.into_result(),
            Ok(Ok(Err(e))) => Err(e),
        };

        // A reset can race the handshake: `uninitialize` settles the
        // pending entry and returns readiness to NotStarted. Both
        // outcome branches transition only if the state is still
        // AwaitingHandshake, under one guard, so a concurrent reset is
        // never overwritten.
        match result.and_then(RuntimeConfig::parse) {
            Ok(runtime_config) => {
                let matrix = CapabilityMatrix::from_config(runtime_config);
                debug!(
                    api_version = matrix.api_version(),
                    namespaces = matrix.namespace_count(),
                    "Handshake complete"
                );

                let mut readiness = self.shared.readiness.write();
                if *readiness != ReadinessState::AwaitingHandshake {
                    return Err(Error::BridgeReset);
                }
                *self.shared.matrix.write() = Some(matrix);
                *readiness = ReadinessState::Ready;
                drop(readiness);

                let _ = self.command_tx.send(BridgeCommand::DrainQueue);
                Ok(())
            }
            Err(e) => {
                let mut readiness = self.shared.readiness.write();
                if *readiness == ReadinessState::AwaitingHandshake {
                    warn!(error = %e, "Handshake failed");
                    *readiness = ReadinessState::Failed;
                    drop(readiness);
                    let _ = self.command_tx.send(BridgeCommand::FailQueue);
                }
                Err(e)
            }
        }
    }

    /// Resets all session-scoped state.
    ///
    /// Outstanding pending calls settle with [`Error::BridgeReset`]
    /// rather than leaking; queued calls are dropped; child handles are
    /// released; the matrix is cleared and readiness returns to
    /// [`ReadinessState::NotStarted`]. The bridge is reusable via a
    /// fresh [`initialize`](Bridge::initialize).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the event loop has
    /// terminated.
    pub async fn uninitialize(&self) -> Result<()> {
        *self.shared.readiness.write() = ReadinessState::NotStarted;
        *self.shared.matrix.write() = None;
        self.correlator.cancel_all(|| Error::BridgeReset);

        let (done_tx, done_rx) = oneshot::channel();
        self.command_tx
            .send(BridgeCommand::ClearQueue { done: done_tx })
            .map_err(|_| Error::ChannelClosed)?;
        done_rx.await.map_err(|_| Error::ChannelClosed)?;

        debug!("Bridge reset");
        Ok(())
    }

    /// Terminates the event loop.
    ///
    /// All pending calls settle with [`Error::ChannelClosed`].
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(BridgeCommand::Shutdown);
    }
}

// ============================================================================
// Bridge - Calls
// ============================================================================

impl Bridge {
    /// Invokes a host capability.
    ///
    /// Readiness gating applies: before any handshake started the call
    /// fails immediately and is never queued; while the handshake is
    /// pending the call is queued FIFO (capability check deferred to
    /// drain); once ready it is checked against the matrix and
    /// transmitted directly. The returned [`PendingReply`] behaves
    /// identically either way.
    ///
    /// # Errors
    ///
    /// - [`Error::NotInitialized`] before [`initialize`](Bridge::initialize)
    /// - [`Error::NotSupported`] if the matrix lacks the capability
    /// - [`Error::InitializationFailed`] after a failed handshake
    pub fn call(&self, command: Command) -> Result<PendingReply> {
        self.call_routed(Route::Host, command)
    }

    /// Invokes a capability through an attached child window.
    ///
    /// Same gating and return shape as [`call`](Bridge::call); the
    /// envelope travels on the child's channel and the response is
    /// correlated in the shared table.
    ///
    /// # Errors
    ///
    /// As [`call`](Bridge::call), plus [`Error::ChildClosed`] if the
    /// child is not attached at transmit time.
    pub fn call_in_child(
        &self,
        child_id: ChildWindowId,
        command: Command,
    ) -> Result<PendingReply> {
        self.call_routed(Route::Child(child_id), command)
    }

    fn call_routed(&self, route: Route, command: Command) -> Result<PendingReply> {
        let gate = command.capability().map(|ns| (ns, command.method()));

        match *self.shared.readiness.read() {
            ReadinessState::NotStarted => return Err(Error::NotInitialized),
            ReadinessState::Failed => {
                return Err(Error::initialization_failed(
                    "bridge is in a failed state",
                ));
            }
            ReadinessState::Ready => {
                if let Some((namespace, method)) = gate {
                    let guard = self.shared.matrix.read();
                    let matrix = guard.as_ref().ok_or(Error::NotInitialized)?;
                    if !matrix.is_supported(namespace) {
                        return Err(Error::not_supported(namespace));
                    }
                    if !matrix.is_function_supported(namespace, method) {
                        return Err(Error::not_supported(format!("{namespace}.{method}")));
                    }
                }
            }
            // Capability check deferred to drain time; no matrix yet.
            ReadinessState::AwaitingHandshake => {}
        }

        let envelope = command.into_envelope()?;
        let id = envelope.id;
        let rx = self.correlator.register(id, route)?;

        let entry = QueuedCall {
            envelope,
            route,
            gate,
        };
        if self
            .command_tx
            .send(BridgeCommand::Transmit { entry })
            .is_err()
        {
            self.correlator.remove(id);
            return Err(Error::ChannelClosed);
        }

        trace!(%id, "Call dispatched");
        Ok(PendingReply::new(id, rx, Arc::clone(&self.correlator)))
    }
}

// ============================================================================
// Bridge - Child Windows
// ============================================================================

impl Bridge {
    /// Attaches a child window's frame channel.
    ///
    /// The bridge observes the popup, it does not own it: inbound child
    /// messages are relayed into the shared correlation table, and when
    /// the channel closes every call still awaiting the child settles
    /// with [`Error::ChildClosed`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the event loop has
    /// terminated.
    pub fn attach_child(&self, channel: FrameChannel) -> Result<ChildWindowId> {
        let child_id = ChildWindowId::next();
        let (sender, receiver) = channel.split();

        self.command_tx
            .send(BridgeCommand::AttachChild { child_id, sender })
            .map_err(|_| Error::ChannelClosed)?;

        spawn_child_forwarder(child_id, receiver, self.command_tx.clone());
        Ok(child_id)
    }

    /// Detaches a child window explicitly.
    ///
    /// Calls still awaiting the child settle with
    /// [`Error::ChildClosed`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the event loop has
    /// terminated.
    pub fn detach_child(&self, child_id: ChildWindowId) -> Result<()> {
        self.command_tx
            .send(BridgeCommand::DetachChild { child_id })
            .map_err(|_| Error::ChannelClosed)
    }
}

// ============================================================================
// Bridge - Introspection
// ============================================================================

impl Bridge {
    /// Current readiness state.
    #[inline]
    #[must_use]
    pub fn readiness(&self) -> ReadinessState {
        *self.shared.readiness.read()
    }

    /// Whether the negotiated matrix supports a capability namespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before the handshake completes:
    /// the bridge claims neither support nor non-support before
    /// negotiation.
    pub fn is_capability_supported(&self, namespace: &str) -> Result<bool> {
        let guard = self.shared.matrix.read();
        let matrix = guard.as_ref().ok_or(Error::NotInitialized)?;
        Ok(matrix.is_supported(namespace))
    }

    /// Whether the negotiated matrix supports a specific function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before the handshake completes.
    pub fn is_function_supported(&self, namespace: &str, method: &str) -> Result<bool> {
        let guard = self.shared.matrix.read();
        let matrix = guard.as_ref().ok_or(Error::NotInitialized)?;
        Ok(matrix.is_function_supported(namespace, method))
    }

    /// Host protocol version negotiated at handshake.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before the handshake completes.
    pub fn api_version(&self) -> Result<u32> {
        let guard = self.shared.matrix.read();
        let matrix = guard.as_ref().ok_or(Error::NotInitialized)?;
        Ok(matrix.api_version())
    }

    /// Returns the number of pending calls.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlator.pending_count()
    }
}

// ============================================================================
// Bridge - Event Loop
// ============================================================================

impl Bridge {
    /// Event loop owning the outbound queue and child registry.
    async fn run_event_loop(
        host_tx: FrameSender,
        mut command_rx: mpsc::UnboundedReceiver<BridgeCommand>,
        shared: Arc<Shared>,
        correlator: Arc<Correlator>,
    ) {
        let mut queue: OutboundQueue<QueuedCall> = OutboundQueue::new();
        let mut children = ChildRegistry::default();

        while let Some(command) = command_rx.recv().await {
            match command {
                BridgeCommand::Transmit { entry } => {
                    let readiness = *shared.readiness.read();
                    match readiness {
                        // A call issued during AwaitingHandshake may reach the
                        // loop after the gate already opened; its deferred
                        // capability check still applies.
                        ReadinessState::Ready => {
                            let matrix = shared.matrix.read().clone();
                            Self::gate_and_transmit(
                                entry,
                                matrix.as_ref(),
                                &host_tx,
                                &children,
                                &correlator,
                            );
                        }
                        ReadinessState::AwaitingHandshake => {
                            trace!(id = %entry.envelope.id, "Call queued until ready");
                            queue.push(entry);
                        }
                        ReadinessState::NotStarted => {
                            correlator.settle_error(entry.envelope.id, Error::NotInitialized);
                        }
                        ReadinessState::Failed => {
                            correlator.settle_error(
                                entry.envelope.id,
                                Error::initialization_failed("bridge is in a failed state"),
                            );
                        }
                    }
                }

                BridgeCommand::TransmitHandshake { envelope } => {
                    let id = envelope.id;
                    match envelope.encode() {
                        Ok(text) => {
                            if host_tx.send(text).is_err() {
                                correlator.settle_error(id, Error::ChannelClosed);
                            } else {
                                trace!(%id, "Handshake sent");
                            }
                        }
                        Err(e) => correlator.settle_error(id, e),
                    }
                }

                BridgeCommand::DrainQueue => {
                    let matrix = shared.matrix.read().clone();
                    let drained = queue.drain();
                    if !drained.is_empty() {
                        debug!(count = drained.len(), "Draining outbound queue");
                    }

                    for entry in drained {
                        Self::gate_and_transmit(
                            entry,
                            matrix.as_ref(),
                            &host_tx,
                            &children,
                            &correlator,
                        );
                    }
                }

                BridgeCommand::FailQueue => {
                    for entry in queue.drain() {
                        correlator.settle_error(
                            entry.envelope.id,
                            Error::initialization_failed("Handshake with the host failed"),
                        );
                    }
                }

                BridgeCommand::ClearQueue { done } => {
                    let dropped = queue.drain().len();
                    if dropped > 0 {
                        debug!(dropped, "Dropped queued calls on reset");
                    }
                    children.clear();
                    let _ = done.send(());
                }

                BridgeCommand::Inbound { origin, text } => {
                    Self::handle_inbound(origin, &text, &correlator);
                }

                BridgeCommand::PeerClosed {
                    origin: Route::Child(child_id),
                } => {
                    children.detach(child_id);
                    correlator.cancel_child(child_id, || Error::child_closed(child_id));
                }

                BridgeCommand::PeerClosed {
                    origin: Route::Host,
                } => {
                    warn!("Host channel closed");
                    break;
                }

                BridgeCommand::AttachChild { child_id, sender } => {
                    children.attach(child_id, sender);
                }

                BridgeCommand::DetachChild { child_id } => {
                    children.detach(child_id);
                    correlator.cancel_child(child_id, || Error::child_closed(child_id));
                }

                BridgeCommand::Shutdown => {
                    debug!("Shutdown command received");
                    break;
                }
            }
        }

        // Fail everything still outstanding; nothing may hang forever.
        for entry in queue.drain() {
            correlator.settle_error(entry.envelope.id, Error::ChannelClosed);
        }
        correlator.cancel_all(|| Error::ChannelClosed);

        debug!("Event loop terminated");
    }

    /// Applies a deferred capability gate, then transmits.
    ///
    /// Calls that were gated synchronously pass unchanged; calls queued
    /// before the matrix existed settle `NotSupported` here without
    /// ever reaching the wire.
    fn gate_and_transmit(
        entry: QueuedCall,
        matrix: Option<&CapabilityMatrix>,
        host_tx: &FrameSender,
        children: &ChildRegistry,
        correlator: &Correlator,
    ) {
        if let (Some(matrix), Some((namespace, method))) = (matrix, entry.gate)
            && !matrix.is_function_supported(namespace, method)
        {
            let capability = if matrix.is_supported(namespace) {
                format!("{namespace}.{method}")
            } else {
                namespace.to_string()
            };
            correlator.settle_error(entry.envelope.id, Error::not_supported(capability));
            return;
        }
        Self::transmit(entry, host_tx, children, correlator);
    }

    /// Transmits one call on its route.
    fn transmit(
        entry: QueuedCall,
        host_tx: &FrameSender,
        children: &ChildRegistry,
        correlator: &Correlator,
    ) {
        let id = entry.envelope.id;

        let text = match entry.envelope.encode() {
            Ok(text) => text,
            Err(e) => {
                correlator.settle_error(id, e);
                return;
            }
        };

        let outcome = match entry.route {
            Route::Host => host_tx.send(text).map_err(|_| Error::ChannelClosed),
            Route::Child(child_id) => match children.sender(child_id) {
                Some(sender) => sender.send(text).map_err(|_| Error::child_closed(child_id)),
                None => Err(Error::child_closed(child_id)),
            },
        };

        match outcome {
            Ok(()) => trace!(%id, "Call transmitted"),
            Err(e) => correlator.settle_error(id, e),
        }
    }

    /// Handles one raw inbound message.
    ///
    /// A malformed message is discarded; it must not corrupt unrelated
    /// pending calls.
    fn handle_inbound(origin: Route, text: &str, correlator: &Correlator) {
        match ResponseEnvelope::decode(text) {
            Ok(response) => {
                trace!(id = %response.id, ?origin, "Inbound response");
                correlator.settle(response);
            }
            Err(e) => {
                warn!(error = %e, ?origin, "Discarded malformed inbound message");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::MessageId;
    use crate::protocol::{
        AppInstallDialogCommand, CallCommand, MediaCommand, OpenAppInstallDialogParams,
        StartCallParams,
    };
    use crate::transport::{self, FrameChannel, FrameReceiver};
    use serde_json::{Value, json};

    fn open_dialog_command() -> Command {
        Command::AppInstallDialog(AppInstallDialogCommand::Open(OpenAppInstallDialogParams {
            app_id: "0".to_string(),
        }))
    }

    fn start_call_command() -> Command {
        Command::Call(CallCommand::Start(StartCallParams {
            targets: vec!["user@example.com".to_string()],
            requested_modalities: Vec::new(),
            source: None,
        }))
    }

    /// Drives the host end of a frame channel pair.
    struct MockHost {
        tx: FrameSender,
        rx: FrameReceiver,
    }

    impl MockHost {
        fn new(channel: FrameChannel) -> Self {
            let (tx, rx) = channel.split();
            Self { tx, rx }
        }

        async fn recv(&mut self) -> Envelope {
            let text = self.rx.recv().await.expect("frame from guest");
            Envelope::decode(&text).expect("valid envelope")
        }

        fn respond(&self, id: MessageId, result: Value) {
            let response = ResponseEnvelope::success(id, Some(result));
            self.tx.send(response.encode().expect("encode")).expect("send");
        }

        fn respond_error(&self, id: MessageId, code: i64, message: &str) {
            let response = ResponseEnvelope::failure(id, code, Some(message.to_string()));
            self.tx.send(response.encode().expect("encode")).expect("send");
        }

        /// Answers the `initialize` call with a runtime configuration.
        async fn complete_handshake(&mut self, supports: Value) {
            let envelope = self.recv().await;
            assert_eq!(envelope.func, "initialize");
            self.respond(envelope.id, json!({"apiVersion": 2, "supports": supports}));
        }
    }

    /// Builds a bridge and completes the handshake with the given
    /// support table.
    async fn ready_bridge(supports: Value) -> (Bridge, MockHost) {
        let (guest, host) = transport::pair();
        let bridge = Bridge::new(guest);
        let mut host = MockHost::new(host);

        let init_bridge = bridge.clone();
        let init = tokio::spawn(async move { init_bridge.initialize().await });
        host.complete_handshake(supports).await;
        init.await.expect("join").expect("handshake");

        (bridge, host)
    }

    #[test]
    fn test_config_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.sdk_version, "2.0.0");
        assert_eq!(config.handshake_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_starts_not_initialized() {
        let (guest, _host) = transport::pair();
        let bridge = Bridge::new(guest);
        assert_eq!(bridge.readiness(), ReadinessState::NotStarted);
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_call_before_initialize_never_queues() {
        let (guest, host) = transport::pair();
        let (_host_tx, mut host_rx) = host.split();
        let bridge = Bridge::new(guest);

        let err = bridge.call(open_dialog_command()).unwrap_err();
        assert!(matches!(err, Error::NotInitialized));

        // No envelope traffic and no pending entry.
        assert!(host_rx.try_recv().is_none());
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_matrix_query_before_handshake_is_error() {
        let (guest, _host) = transport::pair();
        let bridge = Bridge::new(guest);

        assert!(matches!(
            bridge.is_capability_supported("appInstallDialog"),
            Err(Error::NotInitialized)
        ));
        assert!(matches!(bridge.api_version(), Err(Error::NotInitialized)));
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_calls() {
        let (guest, _host) = transport::pair();
        let bridge = Bridge::new(guest);

        bridge.shutdown();
        // Give the loop a moment to terminate.
        tokio::task::yield_now().await;

        let err = bridge.uninitialize().await.unwrap_err();
        assert!(matches!(err, Error::ChannelClosed));
    }

    #[tokio::test]
    async fn test_initialize_handshake() {
        let (bridge, _host) = ready_bridge(json!({"appInstallDialog": {}})).await;

        assert_eq!(bridge.readiness(), ReadinessState::Ready);
        assert_eq!(bridge.api_version().expect("version"), 2);
        assert!(bridge.is_capability_supported("appInstallDialog").expect("query"));
        assert!(!bridge.is_capability_supported("call").expect("query"));
    }

    #[tokio::test]
    async fn test_double_initialize_rejected() {
        let (bridge, _host) = ready_bridge(json!({})).await;

        let err = bridge.initialize().await.unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
        assert_eq!(bridge.readiness(), ReadinessState::Ready);
    }

    #[tokio::test]
    async fn test_end_to_end_supported_call() {
        let (bridge, mut host) = ready_bridge(json!({"appInstallDialog": {}})).await;

        let reply = bridge.call(open_dialog_command()).expect("call");
        let envelope = host.recv().await;
        assert_eq!(envelope.func, "appInstallDialog.openAppInstallDialog");
        assert_eq!(envelope.args, vec![json!({"appId": "0"})]);

        host.respond(envelope.id, Value::Null);
        assert_eq!(reply.response().await.expect("resolved"), Value::Null);
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_call_fails_with_zero_traffic() {
        let (bridge, mut host) = ready_bridge(json!({"appInstallDialog": {}})).await;

        let err = bridge.call(start_call_command()).unwrap_err();
        assert!(matches!(err, Error::NotSupported { .. }));
        assert_eq!(err.to_string(), "Not supported by the current host: call");

        assert!(host.rx.try_recv().is_none());
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_function_level_gating() {
        let (bridge, _host) = ready_bridge(json!({"media": ["captureImage"]})).await;

        assert!(bridge.call(Command::Media(MediaCommand::CaptureImage)).is_ok());

        let err = bridge
            .call(Command::Media(MediaCommand::ScanBarCode(
                crate::protocol::BarCodeConfig {
                    timeout_in_seconds: None,
                },
            )))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Not supported by the current host: media.scanBarCode"
        );
    }

    #[tokio::test]
    async fn test_queued_calls_drain_in_fifo_order() {
        let (guest, host) = transport::pair();
        let bridge = Bridge::new(guest);
        let mut host = MockHost::new(host);

        let init_bridge = bridge.clone();
        let init = tokio::spawn(async move { init_bridge.initialize().await });

        // Receiving the handshake envelope guarantees the gate is in
        // AwaitingHandshake before the calls below are issued.
        let handshake = host.recv().await;
        assert_eq!(handshake.func, "initialize");

        let first = bridge.call(open_dialog_command()).expect("queued");
        let second = bridge.call(start_call_command()).expect("queued");
        let third = bridge
            .call(Command::Media(MediaCommand::CaptureImage))
            .expect("queued");

        // Nothing transmits until ready.
        assert!(host.rx.try_recv().is_none());

        host.respond(
            handshake.id,
            json!({"apiVersion": 2, "supports": {
                "appInstallDialog": {}, "call": true, "media": true,
            }}),
        );
        init.await.expect("join").expect("handshake");

        let drained: Vec<String> = [
            host.recv().await.func,
            host.recv().await.func,
            host.recv().await.func,
        ]
        .into();
        assert_eq!(
            drained,
            vec![
                "appInstallDialog.openAppInstallDialog",
                "call.startCall",
                "media.captureImage",
            ]
        );

        // Queued and direct calls settle through the same path.
        host.respond(first.id(), Value::Null);
        host.respond(second.id(), json!(true));
        host.respond(third.id(), json!([]));
        assert_eq!(first.response().await.expect("first"), Value::Null);
        assert_eq!(second.response().await.expect("second"), json!(true));
        assert_eq!(third.response().await.expect("third"), json!([]));
    }

    #[tokio::test]
    async fn test_queued_unsupported_call_settles_at_drain() {
        let (guest, host) = transport::pair();
        let bridge = Bridge::new(guest);
        let mut host = MockHost::new(host);

        let init_bridge = bridge.clone();
        let init = tokio::spawn(async move { init_bridge.initialize().await });
        let handshake = host.recv().await;

        let queued = bridge.call(start_call_command()).expect("queued");

        host.respond(
            handshake.id,
            json!({"apiVersion": 2, "supports": {"appInstallDialog": {}}}),
        );
        init.await.expect("join").expect("handshake");

        let err = queued.response().await.unwrap_err();
        assert!(matches!(err, Error::NotSupported { .. }));

        // The rejected call never reached the wire.
        assert!(host.rx.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_handshake_failure_fails_queue() {
        let (guest, host) = transport::pair();
        let bridge = Bridge::new(guest);
        let mut host = MockHost::new(host);

        let init_bridge = bridge.clone();
        let init = tokio::spawn(async move { init_bridge.initialize().await });
        let handshake = host.recv().await;

        let queued = bridge.call(open_dialog_command()).expect("queued");

        host.respond_error(handshake.id, 500, "host rejected");
        let err = init.await.expect("join").unwrap_err();
        assert!(matches!(err, Error::Host { code: 500, .. }));
        assert_eq!(bridge.readiness(), ReadinessState::Failed);

        let err = queued.response().await.unwrap_err();
        assert!(matches!(err, Error::InitializationFailed { .. }));

        // New calls fail immediately in the failed state.
        let err = bridge.call(open_dialog_command()).unwrap_err();
        assert!(matches!(err, Error::InitializationFailed { .. }));
    }

    #[tokio::test]
    async fn test_host_error_response_surfaces() {
        let (bridge, mut host) = ready_bridge(json!({"appInstallDialog": {}})).await;

        let reply = bridge.call(open_dialog_command()).expect("call");
        let envelope = host.recv().await;
        host.respond_error(envelope.id, 100, "user cancelled");

        let err = reply.response().await.unwrap_err();
        assert!(matches!(err, Error::Host { code: 100, .. }));
    }

    #[tokio::test]
    async fn test_malformed_inbound_discarded() {
        let (bridge, mut host) = ready_bridge(json!({"appInstallDialog": {}})).await;

        let reply = bridge.call(open_dialog_command()).expect("call");
        let envelope = host.recv().await;

        // Garbage must not corrupt the pending call.
        host.tx.send("not json at all").expect("send");
        host.tx.send("{\"unrelated\": true}").expect("send");
        host.respond(envelope.id, json!("ok"));

        assert_eq!(reply.response().await.expect("resolved"), json!("ok"));
    }

    #[tokio::test]
    async fn test_reset_rejects_pending_and_allows_reinit() {
        let (bridge, mut host) = ready_bridge(json!({"appInstallDialog": {}})).await;

        let reply = bridge.call(open_dialog_command()).expect("call");
        let _ = host.recv().await;

        bridge.uninitialize().await.expect("reset");
        assert_eq!(bridge.readiness(), ReadinessState::NotStarted);
        assert!(matches!(
            bridge.api_version(),
            Err(Error::NotInitialized)
        ));

        let err = reply.response().await.unwrap_err();
        assert!(matches!(err, Error::BridgeReset));

        // The session is reusable after reset.
        let init_bridge = bridge.clone();
        let init = tokio::spawn(async move { init_bridge.initialize().await });
        host.complete_handshake(json!({"call": true})).await;
        init.await.expect("join").expect("second handshake");

        assert!(bridge.is_capability_supported("call").expect("query"));
        assert!(!bridge.is_capability_supported("appInstallDialog").expect("query"));
    }

    #[tokio::test]
    async fn test_reset_during_handshake_returns_to_not_started() {
        let (guest, host) = transport::pair();
        let bridge = Bridge::new(guest);
        let mut host = MockHost::new(host);

        let init_bridge = bridge.clone();
        let init = tokio::spawn(async move { init_bridge.initialize().await });

        // Receiving the handshake envelope guarantees the gate is in
        // AwaitingHandshake before the reset below.
        let handshake = host.recv().await;
        assert_eq!(handshake.func, "initialize");

        bridge.uninitialize().await.expect("reset");

        // The awaiting initialize observes the reset, and must not
        // overwrite NotStarted with Failed.
        let err = init.await.expect("join").unwrap_err();
        assert!(matches!(err, Error::BridgeReset));
        assert_eq!(bridge.readiness(), ReadinessState::NotStarted);

        // The session is fully reusable.
        let init_bridge = bridge.clone();
        let init = tokio::spawn(async move { init_bridge.initialize().await });
        host.complete_handshake(json!({"call": true})).await;
        init.await.expect("join").expect("second handshake");
        assert_eq!(bridge.readiness(), ReadinessState::Ready);
    }

    #[tokio::test]
    async fn test_shutdown_fails_pending() {
        let (bridge, mut host) = ready_bridge(json!({"appInstallDialog": {}})).await;

        let reply = bridge.call(open_dialog_command()).expect("call");
        let _ = host.recv().await;

        bridge.shutdown();
        let err = reply.response().await.unwrap_err();
        assert!(matches!(err, Error::ChannelClosed));
    }

    #[tokio::test]
    async fn test_child_call_resolves() {
        let (bridge, mut host) = ready_bridge(json!({"media": true})).await;

        let (bridge_end, child_end) = transport::pair();
        let child_id = bridge.attach_child(bridge_end).expect("attach");
        let mut child = MockHost::new(child_end);

        let reply = bridge
            .call_in_child(child_id, Command::Media(MediaCommand::CaptureImage))
            .expect("call");

        let envelope = child.recv().await;
        assert_eq!(envelope.func, "media.captureImage");
        child.respond(envelope.id, json!([]));

        assert_eq!(reply.response().await.expect("resolved"), json!([]));
        // Host channel saw none of the child traffic.
        assert!(host.rx.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_child_close_settles_only_that_child() {
        let (bridge, mut host) = ready_bridge(json!({"media": true})).await;

        let (bridge_end, child_end) = transport::pair();
        let child_id = bridge.attach_child(bridge_end).expect("attach");
        let mut child = MockHost::new(child_end);

        let child_reply = bridge
            .call_in_child(child_id, Command::Media(MediaCommand::CaptureImage))
            .expect("child call");
        let host_reply = bridge
            .call(Command::Media(MediaCommand::CaptureImage))
            .expect("host call");

        let _ = child.recv().await;
        let host_envelope = host.recv().await;

        // Popup closes: both halves of the child's channel drop.
        drop(child);

        let err = child_reply.response().await.unwrap_err();
        assert!(matches!(err, Error::ChildClosed { .. }));

        // The host-routed call is unaffected.
        host.respond(host_envelope.id, json!([]));
        assert_eq!(host_reply.response().await.expect("resolved"), json!([]));
    }

    #[tokio::test]
    async fn test_detach_child_settles_pending() {
        let (bridge, _host) = ready_bridge(json!({"media": true})).await;

        let (bridge_end, child_end) = transport::pair();
        let child_id = bridge.attach_child(bridge_end).expect("attach");
        let mut child = MockHost::new(child_end);

        let reply = bridge
            .call_in_child(child_id, Command::Media(MediaCommand::CaptureImage))
            .expect("call");
        let _ = child.recv().await;

        bridge.detach_child(child_id).expect("detach");
        let err = reply.response().await.unwrap_err();
        assert!(matches!(err, Error::ChildClosed { .. }));

        // A fresh call to the detached child fails at transmit time.
        let reply = bridge
            .call_in_child(child_id, Command::Media(MediaCommand::CaptureImage))
            .expect("registered");
        let err = reply.response().await.unwrap_err();
        assert!(matches!(err, Error::ChildClosed { .. }));
    }

    #[tokio::test]
    async fn test_callback_and_promise_forms_agree() {
        let (bridge, mut host) = ready_bridge(json!({"media": true})).await;

        let promise_reply = bridge
            .call(Command::Media(MediaCommand::CaptureImage))
            .expect("promise form");
        let callback_reply = bridge
            .call(Command::Media(MediaCommand::CaptureImage))
            .expect("callback form");

        let (done_tx, done_rx) = oneshot::channel();
        callback_reply.on_complete(move |outcome| {
            let _ = done_tx.send(outcome);
        });

        let result = json!([{"content": "abc"}]);
        let first = host.recv().await;
        let second = host.recv().await;
        host.respond(first.id, result.clone());
        host.respond(second.id, result.clone());

        let awaited = promise_reply.response().await.expect("promise");
        let called_back = done_rx.await.expect("fired").expect("callback");
        assert_eq!(awaited, called_back);
        assert_eq!(awaited, result);
    }
}
