//! Main [`MeshInterface`] client implementation.
//!
//! A [`MeshInterface`] owns one transport and runs at most one session over
//! it at a time. The session task is the only writer of the node registry,
//! the connected-node snapshot and the table of packets awaiting an
//! acknowledgement. Callers read clones of the registry and snapshot, and
//! register acknowledgement waits through a request channel that the session
//! polls ahead of inbound frames.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{Mutex, RwLock, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

use crate::commands::{CommandHandler, SendOptions};
use crate::config::{HandshakeCompletion, InterfaceConfig, SessionConfig};
use crate::error::{Error, Result, RoutingReason, millis};
use crate::event::{Event, EventDispatcher, EventFilter, PacketStream, Subscription};
use crate::listener::{
    Delivery, ListenerId, ListenerRegistry, ListenerResult, PacketListener, spawn_dispatcher,
};
use crate::proto::{Channel, DeviceMetadata, MeshPacket, NodeInfo, PortNum, Telemetry};
use crate::protocol::{InboundMessage, decode_inbound};
use crate::transport::{FrameStream, Transport};
use crate::types::{
    ApplicationPayload, ConnectedNode, LocalConfig, MeshNode, ModuleConfigSet, Packet,
};

/// Gets the current Unix timestamp as a u32.
fn current_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u32::try_from(d.as_secs()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Never started.
    Idle,
    /// Opening the transport.
    Connecting,
    /// Configuration requested, waiting for the radio to finish its dump.
    AwaitingConfig,
    /// Handshake complete.
    Ready,
    /// `stop()` in progress.
    Closing,
    /// Stopped by the caller.
    Closed,
    /// The transport failed or closed underneath the session.
    Faulted,
}

/// Acknowledgement of a packet sent with `want_ack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckOutcome {
    /// Id of the acknowledged packet.
    pub packet_id: u32,
    /// Node that sent the acknowledgement.
    pub from: u32,
    /// The connected node heard the packet being relayed, but the
    /// destination itself has not confirmed it.
    pub implicit: bool,
}

/// Result of a successful send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReceipt {
    /// Id assigned to the outbound packet.
    pub packet_id: u32,
    /// Set when the packet was sent with `want_ack`.
    pub ack: Option<AckOutcome>,
}

enum SessionRequest {
    TrackAck {
        packet_id: u32,
        destination: u32,
        reply: oneshot::Sender<Result<AckOutcome>>,
    },
    Forget {
        packet_id: u32,
    },
}

struct PendingAck {
    destination: u32,
    reply: oneshot::Sender<Result<AckOutcome>>,
}

/// State shared between the interface and its session task.
struct Shared {
    transport: Arc<dyn Transport>,
    commands: CommandHandler,
    dispatcher: EventDispatcher,
    listeners: Arc<ListenerRegistry>,
    nodes: RwLock<HashMap<u32, MeshNode>>,
    snapshot: RwLock<Option<Arc<ConnectedNode>>>,
    state: watch::Sender<SessionState>,
    config: SessionConfig,
}

impl Shared {
    fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    fn set_state(&self, state: SessionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(?previous, ?state, "session state changed");
        }
    }

    /// Connects, resets per-session state and requests the configuration.
    async fn open(&self) -> Result<(FrameStream, u32)> {
        self.transport.connect().await?;

        self.nodes.write().await.clear();
        *self.snapshot.write().await = None;

        let frames = match self.transport.frames() {
            Ok(frames) => frames,
            Err(e) => {
                self.release().await;
                return Err(e);
            }
        };
        self.dispatcher.dispatch(Event::Connected);

        let nonce = self.commands.next_packet_id();
        if let Err(e) = self.commands.want_config(nonce).await {
            self.release().await;
            return Err(e);
        }
        self.set_state(SessionState::AwaitingConfig);
        Ok((frames, nonce))
    }

    async fn release(&self) {
        if let Err(e) = self.transport.disconnect().await {
            warn!(error = %e, "failed to disconnect transport");
        }
    }

    async fn sync_time(&self, node: u32) -> Result<()> {
        let packet = self.commands.set_time_packet(node, current_timestamp())?;
        self.commands.send_packet(packet).await?;
        Ok(())
    }
}

struct SessionHandle {
    task: JoinHandle<()>,
    requests: mpsc::UnboundedSender<SessionRequest>,
}

/// Client for communicating with a Meshtastic radio.
pub struct MeshInterface {
    shared: Arc<Shared>,
    session: Mutex<Option<SessionHandle>>,
}

impl MeshInterface {
    /// Creates a client for the configured connection (not yet started).
    pub fn new(config: InterfaceConfig) -> Result<Self> {
        let transport = config.connection.into_transport()?;
        Ok(Self::with_transport(transport, config.session))
    }

    /// Creates a client over an existing transport (not yet started).
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>, config: SessionConfig) -> Self {
        let commands = CommandHandler::new(Arc::clone(&transport))
            .with_send_retries(config.send_retries)
            .with_hop_limit(config.hop_limit);
        let (state, _) = watch::channel(SessionState::Idle);

        Self {
            shared: Arc::new(Shared {
                transport,
                commands,
                dispatcher: EventDispatcher::new(config.event_capacity),
                listeners: Arc::new(ListenerRegistry::new()),
                nodes: RwLock::new(HashMap::new()),
                snapshot: RwLock::new(None),
                state,
                config,
            }),
            session: Mutex::new(None),
        }
    }

    /// Starts a session.
    ///
    /// Returns once the configuration request has been written, or with the
    /// connect error. Use [`await_ready`](Self::await_ready) to wait for the
    /// handshake. Calling `start` while a session is running is a no-op.
    pub async fn start(&self) -> Result<()> {
        let started = {
            let mut session = self.session.lock().await;
            if session.as_ref().is_some_and(|s| !s.task.is_finished()) {
                debug!("session already running");
                return Ok(());
            }

            info!("starting session");
            self.shared.set_state(SessionState::Connecting);
            let (started_tx, started_rx) = oneshot::channel();
            let (requests, requests_rx) = mpsc::unbounded_channel();
            let task = tokio::spawn(run_session(
                Arc::clone(&self.shared),
                requests_rx,
                started_tx,
            ));
            *session = Some(SessionHandle { task, requests });
            started_rx
        };

        // A stop() before the request went out drops the sender.
        started.await.unwrap_or_else(|_| Err(Error::ConnectionLost))
    }

    /// Stops the session and disconnects the transport.
    ///
    /// Pending sends fail with [`Error::ConnectionLost`]. The node registry
    /// and snapshot stay readable until the next `start`.
    pub async fn stop(&self) -> Result<()> {
        let Some(handle) = self.session.lock().await.take() else {
            return Ok(());
        };

        info!("stopping session");
        let previous = self.shared.state();
        self.shared.set_state(SessionState::Closing);
        handle.task.abort();
        let _ = handle.task.await;

        if self.shared.transport.is_connected() {
            if let Err(e) = self.shared.commands.disconnect_notice().await {
                debug!(error = %e, "failed to send disconnect notice");
            }
        }
        let result = self.shared.transport.disconnect().await;

        self.shared.set_state(SessionState::Closed);
        if previous != SessionState::Faulted {
            self.shared.dispatcher.dispatch(Event::Disconnected);
        }
        result
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Watches session state changes.
    #[must_use]
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Returns true while a session is running over a live transport.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(
            self.shared.state(),
            SessionState::AwaitingConfig | SessionState::Ready
        ) && self.shared.transport.is_connected()
    }

    /// Waits until the configuration handshake completes.
    ///
    /// Fails with [`Error::Timeout`] if it does not complete within
    /// `timeout`, and with [`Error::ConnectionLost`] if the session ends
    /// first.
    pub async fn await_ready(&self, timeout: Duration) -> Result<ConnectedNode> {
        let mut states = self.shared.state.subscribe();
        let ready = async {
            loop {
                let state = *states.borrow_and_update();
                match state {
                    SessionState::Ready => return Ok(()),
                    SessionState::Faulted | SessionState::Closed => {
                        return Err(Error::ConnectionLost);
                    }
                    _ => {}
                }
                if states.changed().await.is_err() {
                    return Err(Error::ConnectionLost);
                }
            }
        };

        tokio::time::timeout(timeout, ready)
            .await
            .map_err(|_| Error::timeout(timeout))??;
        self.connected_node().await
    }

    // ==================== Snapshot Queries ====================

    async fn snapshot(&self) -> Result<Arc<ConnectedNode>> {
        self.shared
            .snapshot
            .read()
            .await
            .clone()
            .ok_or(Error::NotReady)
    }

    /// The connected node, with its current registry entry.
    pub async fn connected_node(&self) -> Result<ConnectedNode> {
        let mut node = (*self.snapshot().await?).clone();
        node.node = self.shared.nodes.read().await.get(&node.num).cloned();
        Ok(node)
    }

    /// Channel slots of the connected node, ordered by index.
    pub async fn connected_node_channels(&self) -> Result<Vec<Channel>> {
        Ok(self.snapshot().await?.channels.clone())
    }

    /// Local configuration of the connected node.
    pub async fn connected_node_local_config(&self) -> Result<LocalConfig> {
        Ok(self.snapshot().await?.local_config.clone())
    }

    /// Module configuration of the connected node.
    pub async fn connected_node_module_config(&self) -> Result<ModuleConfigSet> {
        Ok(self.snapshot().await?.module_config.clone())
    }

    /// Firmware metadata of the connected node, if the radio sent it.
    pub async fn connected_node_metadata(&self) -> Result<Option<DeviceMetadata>> {
        Ok(self.snapshot().await?.metadata.clone())
    }

    /// All known nodes, keyed by node number.
    pub async fn nodes(&self) -> HashMap<u32, MeshNode> {
        self.shared.nodes.read().await.clone()
    }

    /// One node by number.
    pub async fn node(&self, num: u32) -> Option<MeshNode> {
        self.shared.nodes.read().await.get(&num).cloned()
    }

    // ==================== Sending ====================

    async fn session_requests(&self) -> Result<mpsc::UnboundedSender<SessionRequest>> {
        self.session
            .lock()
            .await
            .as_ref()
            .filter(|s| !s.task.is_finished())
            .map(|s| s.requests.clone())
            .ok_or(Error::NotConnected)
    }

    /// Sends a text message.
    ///
    /// With `want_ack` the call waits up to `timeout` (default: the session's
    /// ack timeout) for the mesh to acknowledge delivery. Without it the call
    /// returns once the packet has been written.
    pub async fn send_text_message(
        &self,
        text: &str,
        destination: u32,
        want_ack: bool,
        channel_index: u32,
        timeout: Option<Duration>,
    ) -> Result<SendReceipt> {
        let options = SendOptions::to(destination)
            .channel(channel_index)
            .want_ack(want_ack);
        let packet = self.shared.commands.text_packet(text, options)?;
        self.send_mesh_packet(packet, timeout).await
    }

    /// Sends an arbitrary application payload on `port`.
    pub async fn send_data(
        &self,
        port: PortNum,
        payload: impl Into<Vec<u8>>,
        options: SendOptions,
        timeout: Option<Duration>,
    ) -> Result<SendReceipt> {
        let packet = self
            .shared
            .commands
            .data_packet(port, payload.into(), options)?;
        self.send_mesh_packet(packet, timeout).await
    }

    async fn send_mesh_packet(
        &self,
        packet: MeshPacket,
        timeout: Option<Duration>,
    ) -> Result<SendReceipt> {
        let requests = self.session_requests().await?;
        let packet_id = packet.id;

        if !packet.want_ack {
            self.shared.commands.send_packet(packet).await?;
            return Ok(SendReceipt {
                packet_id,
                ack: None,
            });
        }

        // Registered before the write so the reply cannot arrive first.
        let (reply, ack) = oneshot::channel();
        requests
            .send(SessionRequest::TrackAck {
                packet_id,
                destination: packet.to,
                reply,
            })
            .map_err(|_| Error::ConnectionLost)?;

        if let Err(e) = self.shared.commands.send_packet(packet).await {
            let _ = requests.send(SessionRequest::Forget { packet_id });
            return Err(e);
        }

        let timeout = timeout.unwrap_or(self.shared.config.ack_timeout);
        match tokio::time::timeout(timeout, ack).await {
            Ok(Ok(outcome)) => outcome.map(|ack| SendReceipt {
                packet_id,
                ack: Some(ack),
            }),
            Ok(Err(_)) => Err(Error::ConnectionLost),
            Err(_) => {
                let _ = requests.send(SessionRequest::Forget { packet_id });
                warn!(packet_id, "no acknowledgement received");
                Err(Error::AckTimeout {
                    packet_id,
                    timeout_ms: millis(timeout),
                })
            }
        }
    }

    /// Sets the connected node's clock to the current time.
    pub async fn sync_time(&self) -> Result<()> {
        let node = self.snapshot().await?.num;
        self.shared.sync_time(node).await
    }

    /// Sends a heartbeat to the radio.
    pub async fn send_heartbeat(&self) -> Result<()> {
        self.shared.commands.heartbeat().await
    }

    // ==================== Listeners & Streams ====================

    /// Registers a listener for packets on `port`.
    pub fn add_packet_listener(&self, port: PortNum, listener: PacketListener) -> ListenerId {
        self.shared.listeners.add(port, listener)
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn remove_packet_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }

    /// Registers a listener for text messages.
    pub fn on_text_message<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&Packet, &str) -> ListenerResult + Send + Sync + 'static,
    {
        self.add_packet_listener(
            PortNum::TextMessageApp,
            PacketListener::decoded(move |packet, payload| {
                payload.as_text().map_or(Ok(()), |text| f(packet, text))
            }),
        )
    }

    /// Registers a listener for telemetry reports.
    ///
    /// The node passed along already reflects the report.
    pub fn on_telemetry<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&Packet, &Telemetry, Option<&MeshNode>) -> ListenerResult + Send + Sync + 'static,
    {
        self.add_packet_listener(
            PortNum::TelemetryApp,
            PacketListener::with_node(move |packet, payload, node| {
                payload
                    .as_telemetry()
                    .map_or(Ok(()), |telemetry| f(packet, telemetry, node))
            }),
        )
    }

    /// Subscribes to session events.
    #[must_use]
    pub fn subscribe(&self, filter: Option<EventFilter>) -> Subscription {
        self.shared.dispatcher.subscribe(filter)
    }

    /// Subscribes to every packet received from now on.
    #[must_use]
    pub fn packet_stream(&self) -> PacketStream {
        self.shared.dispatcher.packets()
    }
}

impl Drop for MeshInterface {
    fn drop(&mut self) {
        if let Some(handle) = self.session.get_mut().take() {
            handle.task.abort();
        }
    }
}

async fn run_session(
    shared: Arc<Shared>,
    requests: mpsc::UnboundedReceiver<SessionRequest>,
    started: oneshot::Sender<Result<()>>,
) {
    let (frames, nonce) = match shared.open().await {
        Ok(opened) => opened,
        Err(e) => {
            error!(error = %e, "failed to start session");
            shared.set_state(SessionState::Faulted);
            let _ = started.send(Err(e));
            return;
        }
    };
    let _ = started.send(Ok(()));

    Session::new(shared, nonce).run(frames, requests).await;
}

/// Per-connection state, owned by the session task.
struct Session {
    shared: Arc<Shared>,
    nonce: u32,
    provisional: ConnectedNode,
    ready: bool,
    pending: HashMap<u32, PendingAck>,
    deliveries: mpsc::UnboundedSender<Delivery>,
    delivery_task: JoinHandle<()>,
    keepalive_task: Option<JoinHandle<()>>,
}

impl Session {
    fn new(shared: Arc<Shared>, nonce: u32) -> Self {
        let (deliveries, delivery_task) = spawn_dispatcher(Arc::clone(&shared.listeners));
        Self {
            shared,
            nonce,
            provisional: ConnectedNode::default(),
            ready: false,
            pending: HashMap::new(),
            deliveries,
            delivery_task,
            keepalive_task: None,
        }
    }

    async fn run(
        mut self,
        mut frames: FrameStream,
        mut requests: mpsc::UnboundedReceiver<SessionRequest>,
    ) {
        loop {
            tokio::select! {
                biased;
                Some(request) = requests.recv() => self.handle_request(request),
                frame = frames.next_frame() => match frame {
                    Some(Ok(bytes)) => self.handle_frame(&bytes).await,
                    Some(Err(e)) => {
                        error!(error = %e, "transport failed");
                        break;
                    }
                    None => {
                        error!("transport closed");
                        break;
                    }
                },
            }
        }
        self.fault().await;
    }

    fn handle_request(&mut self, request: SessionRequest) {
        match request {
            SessionRequest::TrackAck {
                packet_id,
                destination,
                reply,
            } => {
                trace!(packet_id, "awaiting acknowledgement");
                self.pending
                    .insert(packet_id, PendingAck { destination, reply });
            }
            SessionRequest::Forget { packet_id } => {
                self.pending.remove(&packet_id);
            }
        }
    }

    async fn handle_frame(&mut self, bytes: &[u8]) {
        let Some(msg) = decode_inbound(bytes) else {
            return;
        };

        match msg {
            InboundMessage::Packet(packet) => self.handle_packet(packet).await,
            InboundMessage::NodeInfo(info) => self.handle_node_info(&info).await,
            InboundMessage::MyInfo(info) => {
                debug!(node = info.my_node_num, "received own node info");
                self.update_snapshot(|node| node.set_my_info(info)).await;
            }
            InboundMessage::Config(section) => {
                self.update_snapshot(|node| node.local_config.apply(&section))
                    .await;
            }
            InboundMessage::ModuleConfig(section) => {
                self.update_snapshot(|node| node.module_config.apply(&section))
                    .await;
            }
            InboundMessage::Channel(channel) => {
                self.update_snapshot(|node| node.upsert_channel(channel))
                    .await;
            }
            InboundMessage::Metadata(metadata) => {
                self.update_snapshot(|node| node.metadata = Some(metadata))
                    .await;
            }
            InboundMessage::ConfigComplete(id) => self.complete_handshake(id).await,
            InboundMessage::Log(record) => {
                debug!(source = %record.source, message = %record.message, "radio log");
                self.shared.dispatcher.dispatch(Event::Log(record));
            }
            InboundMessage::QueueStatus(status) => {
                trace!(free = status.free, maxlen = status.maxlen, "queue status");
                self.shared.dispatcher.dispatch(Event::QueueStatus(status));
            }
            InboundMessage::Rebooted => self.restart_handshake().await,
            InboundMessage::Other => {}
        }
    }

    async fn handle_node_info(&mut self, info: &NodeInfo) {
        let num = info.num;
        self.shared
            .nodes
            .write()
            .await
            .entry(num)
            .and_modify(|node| node.update_from_node_info(info))
            .or_insert_with(|| MeshNode::from_node_info(info));
        trace!(node = num, "node info updated");
        self.shared.dispatcher.dispatch(Event::NodeUpdated(num));
    }

    async fn handle_packet(&mut self, packet: MeshPacket) {
        let packet = Arc::new(Packet::new(packet));
        let sender = packet.sender();
        trace!(
            packet_id = packet.id(),
            from = sender,
            port = ?packet.port_num(),
            "received packet"
        );

        if sender != 0 {
            self.shared
                .nodes
                .write()
                .await
                .entry(sender)
                .or_insert_with(|| MeshNode::new(sender))
                .update_from_packet(&packet, current_timestamp());
            self.shared.dispatcher.dispatch(Event::NodeUpdated(sender));
        }

        if let Some(reason) = packet
            .app_payload()
            .and_then(ApplicationPayload::routing_error)
        {
            self.resolve_ack(&packet, reason);
        }

        if let Some(port) = packet.port() {
            let node = if self.shared.listeners.wants_node(port) {
                self.shared.nodes.read().await.get(&sender).cloned()
            } else {
                None
            };
            let delivery = Delivery {
                packet: Arc::clone(&packet),
                node,
            };
            if self.deliveries.send(delivery).is_err() {
                warn!("listener dispatch stopped");
            }
        }

        self.shared.dispatcher.dispatch(Event::Packet(packet));
    }

    fn resolve_ack(&mut self, packet: &Packet, reason: RoutingReason) {
        let packet_id = packet.request_id();
        let Some(pending) = self.pending.remove(&packet_id) else {
            trace!(request_id = packet_id, "routing reply for untracked packet");
            return;
        };

        let result = if reason.is_ack() {
            let from = packet.sender();
            let own = self.provisional.num;
            let implicit = from == own && pending.destination != own;
            debug!(packet_id, from, implicit, "packet acknowledged");
            Ok(AckOutcome {
                packet_id,
                from,
                implicit,
            })
        } else {
            warn!(packet_id, ?reason, "packet delivery failed");
            Err(Error::Routing { packet_id, reason })
        };
        let _ = pending.reply.send(result);
    }

    /// Applies a configuration record; once ready, republishes the snapshot.
    async fn update_snapshot(&mut self, apply: impl FnOnce(&mut ConnectedNode)) {
        apply(&mut self.provisional);
        if self.ready {
            *self.shared.snapshot.write().await = Some(Arc::new(self.provisional.clone()));
            trace!("connected node updated");
        }
    }

    async fn complete_handshake(&mut self, id: u32) {
        if self.ready {
            debug!(id, "ignoring repeated config complete");
            return;
        }
        let accepted = match self.shared.config.handshake {
            HandshakeCompletion::MatchNonce => id == self.nonce,
            HandshakeCompletion::AnySentinel => true,
        };
        if !accepted {
            debug!(id, expected = self.nonce, "config complete for another request");
            return;
        }

        self.ready = true;
        let node_num = self.provisional.num;
        *self.shared.snapshot.write().await = Some(Arc::new(self.provisional.clone()));
        self.shared.set_state(SessionState::Ready);
        info!(node = node_num, "session ready");
        self.shared.dispatcher.dispatch(Event::Ready { node_num });

        if let Some(task) = self.keepalive_task.take() {
            task.abort();
        }
        self.keepalive_task = Some(tokio::spawn(keepalive(
            Arc::clone(&self.shared),
            node_num,
        )));
    }

    /// Requests a fresh configuration after the radio rebooted.
    async fn restart_handshake(&mut self) {
        info!("radio rebooted, requesting configuration");
        self.shared.dispatcher.dispatch(Event::Rebooted);

        self.ready = false;
        self.provisional = ConnectedNode::default();
        self.nonce = self.shared.commands.next_packet_id();
        self.shared.set_state(SessionState::AwaitingConfig);
        if let Err(e) = self.shared.commands.want_config(self.nonce).await {
            warn!(error = %e, "failed to request configuration");
        }
    }

    async fn fault(mut self) {
        if matches!(
            self.shared.state(),
            SessionState::Closing | SessionState::Closed
        ) {
            return;
        }

        self.shared.set_state(SessionState::Faulted);
        for (packet_id, pending) in self.pending.drain() {
            trace!(packet_id, "dropping pending acknowledgement");
            let _ = pending.reply.send(Err(Error::ConnectionLost));
        }
        self.shared.release().await;
        self.shared.dispatcher.dispatch(Event::Disconnected);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.delivery_task.abort();
        if let Some(task) = self.keepalive_task.take() {
            task.abort();
        }
    }
}

/// Periodically sets the connected node's clock.
async fn keepalive(shared: Arc<Shared>, node: u32) {
    let period = shared
        .config
        .keepalive_interval
        .max(Duration::from_secs(1));
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match shared.sync_time(node).await {
            Ok(()) => trace!(node, "keepalive sent"),
            Err(e) => warn!(error = %e, "keepalive failed"),
        }
    }
}
