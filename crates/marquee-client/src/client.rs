//! The tick-driven connection state machine.
//!
//! One [`Client::advance`] call per scheduler tick moves the machine as far
//! as the bytes available right now allow. The machine is two-level:
//!
//! - [`ConnectionState`]: `Disconnected` (waiting on the link or a retry
//!   cooldown) or `Connected` (a session episode with its own buffers).
//! - Inside a session, [`AuthorizationStage`] runs the bootstrap handshake
//!   (burn-in auth, registration pop, identity auth) and then the steady
//!   work loop alternates popping the device queue with heartbeat pushes,
//!   tracked by [`WorkPhase`].
//!
//! Failures never propagate out; they feed budgets that trigger a session
//! reset, and the only visible signals are [`ClientEvent`] values.

use std::mem;

use marquee_protocol::{
    is_credential_error, is_ok_reply, is_permission_error, Command, ProtocolValue, ReplyReader,
    MAX_IDENTITY_LEN, MAX_PAYLOAD_LEN, RESET_PAYLOAD,
};
use tracing::{debug, trace, warn};

use crate::budget::FailureBudget;
use crate::config::ClientConfig;
use crate::events::{ClientEvent, NetworkEvent};
use crate::ring::{MessageIter, MessageRing};
use crate::store::{IdentityStore, IDENTITY_KEY};
use crate::timer::IntervalTimer;
use crate::transport::Transport;

// ============================================================================
// Tuning Constants
// ============================================================================

/// Consecutive credential failures tolerated before the stored identity is
/// dropped and the device re-registers from scratch.
pub const MAX_RESETS_RECREDENTIALIZE: u32 = 5;

/// Strange replies tolerated within one session episode.
pub const MAX_STRANGE_REPLIES: u32 = 10;

/// Consecutive silent polls tolerated while a reply is outstanding.
pub const MAX_EMPTY_READS: u32 = 100;

/// Bytes drained from the transport in a single poll.
const MAX_READS_PER_TICK: usize = 1024;

// ============================================================================
// Session State
// ============================================================================

/// Progress of the authorization handshake inside a session episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStage {
    /// Nothing sent yet; the next poll opens the socket and authorizes.
    NotRequested,
    /// Burn-in credentials sent; waiting for the server's verdict.
    AuthorizationRequested,
    /// Burn-in credentials accepted; a registration pop can be sent.
    AuthorizationReceived,
    /// Registration pop sent; waiting for an identity.
    IdentificationRequested,
    /// Identity credentials sent; waiting for the server's verdict.
    AuthorizationAttempted,
    /// Identity accepted; the work loop is running.
    FullyAuthorized,
}

/// What the work loop is waiting for while fully authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkPhase {
    /// No request outstanding; the next paced write may go out.
    NotReceiving,
    /// A pop is outstanding. `expected` is the announced element count
    /// (zero until the array header arrives) and `position` counts the
    /// elements already consumed.
    ReceivingPop { expected: i32, position: i32 },
    /// A heartbeat push is outstanding, acknowledged by an integer.
    ReceivingHeartbeatAck,
}

/// Why a session episode was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResetTrigger {
    /// The server rejected the credentials or the permissions.
    Credential,
    /// The strange-reply budget ran out.
    Strange,
    /// A reply stayed outstanding with no bytes arriving.
    Stall,
    /// A connect or write failed mid-session.
    Transport,
    /// The server sent the reserved re-registration payload.
    Commanded,
}

/// Everything a session episode owns: handshake progress, the incremental
/// reader with its scratch buffer, the wire copy of the identity, and the
/// failure budgets. Dropped whole on transition back to `Disconnected`.
#[derive(Debug)]
struct ConnectedState {
    stage: AuthorizationStage,
    work_phase: WorkPhase,
    reader: ReplyReader,
    scratch: [u8; MAX_PAYLOAD_LEN],
    identity: [u8; MAX_IDENTITY_LEN],
    identity_len: usize,

    // Failure budgets
    strange: FailureBudget,
    empty_reads: FailureBudget,
    failed_resets: FailureBudget,

    // Pacing
    poll_timer: IntervalTimer,
    write_timer: IntervalTimer,
    last_wrote_pop: bool,
}

impl ConnectedState {
    fn new(config: &ClientConfig) -> Self {
        ConnectedState {
            stage: AuthorizationStage::NotRequested,
            work_phase: WorkPhase::NotReceiving,
            reader: ReplyReader::new(),
            scratch: [0; MAX_PAYLOAD_LEN],
            identity: [0; MAX_IDENTITY_LEN],
            identity_len: 0,
            strange: FailureBudget::new(MAX_STRANGE_REPLIES),
            empty_reads: FailureBudget::new(MAX_EMPTY_READS),
            failed_resets: FailureBudget::new(MAX_RESETS_RECREDENTIALIZE),
            poll_timer: IntervalTimer::new(config.poll_interval_ms),
            write_timer: IntervalTimer::new(config.write_spacing_ms),
            last_wrote_pop: false,
        }
    }

    fn identity(&self) -> &[u8] {
        &self.identity[..self.identity_len]
    }

    fn set_identity(&mut self, bytes: &[u8]) {
        let len = bytes.len().min(MAX_IDENTITY_LEN);
        self.identity[..len].copy_from_slice(&bytes[..len]);
        self.identity_len = len;
    }

    fn clear_identity(&mut self) {
        self.identity_len = 0;
    }

    /// Return to the start of the handshake. The failed-reset budget is
    /// deliberately untouched: it spans episodes so repeated credential
    /// failures accumulate.
    fn begin_episode(&mut self) {
        self.stage = AuthorizationStage::NotRequested;
        self.work_phase = WorkPhase::NotReceiving;
        self.reader.reset();
        self.strange.clear();
        self.empty_reads.clear();
        self.last_wrote_pop = false;
    }
}

/// Top-level connection state.
#[derive(Debug)]
enum ConnectionState {
    /// No session. `reconnect_after` holds the earliest time a new connect
    /// attempt may be made after a failure.
    Disconnected { reconnect_after: Option<u64> },
    /// A session episode is live; boxed so the idle state stays small.
    Connected(Box<ConnectedState>),
}

/// What a connected tick decided about the session.
enum TickOutcome {
    Stay,
    Drop { reconnect_after: u64 },
}

// ============================================================================
// Client
// ============================================================================

/// Queue-server client for one marquee device.
///
/// Generic over the byte [`Transport`] and the [`IdentityStore`] so the
/// protocol flow runs identically against a TLS socket with flash-backed
/// storage or against scripted bytes in a test.
pub struct Client<T: Transport, S: IdentityStore> {
    config: ClientConfig,
    transport: T,
    store: S,
    ring: MessageRing,
    identity: Option<Vec<u8>>,
    state: ConnectionState,

    // Link tracking
    link_up: bool,
    paused: bool,

    // Statistics
    resets: u32,
    messages_received: u32,
    heartbeats_sent: u32,
}

impl<T: Transport, S: IdentityStore> Client<T, S> {
    /// Create a client. A previously assigned identity is loaded from the
    /// store so rendering can show it before the first connect.
    pub fn new(config: ClientConfig, transport: T, store: S) -> Self {
        let identity = store
            .get(IDENTITY_KEY, MAX_IDENTITY_LEN)
            .filter(|id| !id.is_empty());

        let ring = MessageRing::new(config.ring_capacity);
        Client {
            config,
            transport,
            store,
            ring,
            identity,
            state: ConnectionState::Disconnected {
                reconnect_after: None,
            },
            link_up: false,
            paused: false,
            resets: 0,
            messages_received: 0,
            heartbeats_sent: 0,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// True while a session episode is live.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Handshake progress of the live session, if any.
    pub fn authorization_stage(&self) -> Option<AuthorizationStage> {
        match &self.state {
            ConnectionState::Connected(conn) => Some(conn.stage),
            ConnectionState::Disconnected { .. } => None,
        }
    }

    /// Work-loop phase of the live session, if any.
    pub fn work_phase(&self) -> Option<WorkPhase> {
        match &self.state {
            ConnectionState::Connected(conn) => Some(conn.work_phase),
            ConnectionState::Disconnected { .. } => None,
        }
    }

    /// The device identity, if one has been assigned or loaded.
    pub fn identity(&self) -> Option<&[u8]> {
        self.identity.as_deref()
    }

    /// Walk the received messages, newest first.
    pub fn messages(&self) -> MessageIter<'_> {
        self.ring.iter()
    }

    /// True when a message arrived since the last [`Client::clear_unread`].
    pub fn has_unread(&self) -> bool {
        self.ring.has_unread()
    }

    /// Acknowledge the current ring contents after a rendering pass.
    pub fn clear_unread(&mut self) {
        self.ring.clear_unread();
    }

    /// Session resets performed since construction.
    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Messages copied into the ring since construction.
    pub fn messages_received(&self) -> u32 {
        self.messages_received
    }

    /// Heartbeats pushed since construction.
    pub fn heartbeats_sent(&self) -> u32 {
        self.heartbeats_sent
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the transport mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Get the identity store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the identity store mutably.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // ========================================================================
    // Tick Entry
    // ========================================================================

    /// Run one tick: fold in the link status reported since the last tick,
    /// then move the state machine as far as the available bytes allow.
    /// Returns at most one event.
    pub fn advance(
        &mut self,
        network_status: Option<NetworkEvent>,
        now_ms: u64,
    ) -> Option<ClientEvent> {
        match network_status {
            Some(NetworkEvent::Connected | NetworkEvent::ConnectionResumed) => {
                self.link_up = true;
            }
            Some(NetworkEvent::Disconnected | NetworkEvent::FailedConnection) => {
                self.link_up = false;
            }
            _ => {}
        }

        if self.is_connected() {
            self.connected_tick(network_status, now_ms)
        } else {
            self.disconnected_tick(network_status, now_ms)
        }
    }

    fn disconnected_tick(
        &mut self,
        network_status: Option<NetworkEvent>,
        now: u64,
    ) -> Option<ClientEvent> {
        if network_status == Some(NetworkEvent::ConnectionInterruption) {
            self.paused = true;
            return None;
        }

        // A resume pass is allowed to try even before the stack re-announces
        // the link; a failed connect just lands back here with a cooldown.
        if !(self.link_up || self.paused) {
            return None;
        }

        if let ConnectionState::Disconnected {
            reconnect_after: Some(after),
        } = self.state
        {
            if now < after {
                return None;
            }
        }

        self.paused = false;
        debug!("link available; starting a session");
        self.state = ConnectionState::Connected(Box::new(ConnectedState::new(&self.config)));
        None
    }

    fn connected_tick(
        &mut self,
        network_status: Option<NetworkEvent>,
        now: u64,
    ) -> Option<ClientEvent> {
        match network_status {
            Some(NetworkEvent::Disconnected | NetworkEvent::FailedConnection) => {
                debug!("link went down; dropping the session");
                self.transport.stop();
                self.paused = false;
                self.state = ConnectionState::Disconnected {
                    reconnect_after: None,
                };
                return Some(ClientEvent::ConnectionLost);
            }
            Some(NetworkEvent::ConnectionInterruption) => {
                debug!("link interrupted; holding the session");
                self.paused = true;
                return None;
            }
            Some(NetworkEvent::ConnectionResumed) if self.paused => {
                debug!("resumed from an interruption; session is stale");
                self.transport.stop();
                self.state = ConnectionState::Disconnected {
                    reconnect_after: None,
                };
                return Some(ClientEvent::ConnectionLost);
            }
            _ => {}
        }

        if self.paused {
            return None;
        }

        self.drive_connected(now)
    }

    /// Take the session out of `self`, drive it, and put back whatever the
    /// tick decided. Separating the session from `self` this way lets the
    /// handlers borrow both mutably.
    fn drive_connected(&mut self, now: u64) -> Option<ClientEvent> {
        let state = mem::replace(
            &mut self.state,
            ConnectionState::Disconnected {
                reconnect_after: None,
            },
        );
        let mut conn = match state {
            ConnectionState::Connected(conn) => conn,
            other => {
                self.state = other;
                return None;
            }
        };

        let (outcome, event) = self.drive(&mut conn, now);

        self.state = match outcome {
            TickOutcome::Stay => ConnectionState::Connected(conn),
            TickOutcome::Drop { reconnect_after } => ConnectionState::Disconnected {
                reconnect_after: Some(reconnect_after),
            },
        };
        event
    }

    // ========================================================================
    // Session Driving
    // ========================================================================

    fn drive(
        &mut self,
        conn: &mut ConnectedState,
        now: u64,
    ) -> (TickOutcome, Option<ClientEvent>) {
        if !conn.poll_timer.ready(now) {
            return (TickOutcome::Stay, None);
        }

        if conn.stage == AuthorizationStage::NotRequested {
            return self.open_session(conn, now);
        }

        if conn.stage == AuthorizationStage::AuthorizationReceived && conn.write_timer.ready(now) {
            self.request_identity(conn);
        }

        let mut event = None;
        let mut read_any = false;
        for _ in 0..MAX_READS_PER_TICK {
            if event.is_some() || conn.stage == AuthorizationStage::NotRequested {
                break;
            }
            if self.transport.available() == 0 {
                break;
            }
            let Some(byte) = self.transport.read_byte() else {
                break;
            };
            read_any = true;

            let value = conn.reader.feed(byte, &mut conn.scratch);
            if value.is_complete() {
                event = self.handle_value(conn, value);
            }
        }

        if read_any {
            conn.empty_reads.clear();
        }

        if conn.stage == AuthorizationStage::FullyAuthorized && event.is_none() {
            match conn.work_phase {
                WorkPhase::NotReceiving => {
                    if conn.write_timer.ready(now) {
                        self.write_next(conn);
                    }
                }
                _ if !read_any => {
                    if conn.empty_reads.record() {
                        warn!(
                            "no reply bytes after {} polls; resetting the session",
                            conn.empty_reads.count()
                        );
                        self.reset(conn, ResetTrigger::Stall);
                    }
                }
                _ => {}
            }
        }

        (TickOutcome::Stay, event)
    }

    /// Open the socket and send the first authorization of a fresh episode.
    /// A stored identity skips the registration exchange entirely.
    fn open_session(
        &mut self,
        conn: &mut ConnectedState,
        now: u64,
    ) -> (TickOutcome, Option<ClientEvent>) {
        debug!("connecting to {}:{}", self.config.host, self.config.port);
        if let Err(error) = self.transport.connect(&self.config.host, self.config.port) {
            warn!(
                "connect to {}:{} failed: {}",
                self.config.host, self.config.port, error
            );
            return (
                TickOutcome::Drop {
                    reconnect_after: now + self.config.reconnect_cooldown_ms,
                },
                Some(ClientEvent::ConnectionFailed),
            );
        }

        match self.store.get(IDENTITY_KEY, MAX_IDENTITY_LEN) {
            Some(identity) if !identity.is_empty() => {
                debug!("authorizing with the stored identity");
                conn.set_identity(&identity);
                self.identity = Some(identity);

                let sent = Self::send(
                    &mut self.transport,
                    &Command::Authorize {
                        username: conn.identity(),
                        password: conn.identity(),
                    },
                );
                if !sent {
                    return (
                        TickOutcome::Drop {
                            reconnect_after: now + self.config.reconnect_cooldown_ms,
                        },
                        Some(ClientEvent::ConnectionFailed),
                    );
                }
                conn.stage = AuthorizationStage::AuthorizationAttempted;
                (TickOutcome::Stay, Some(ClientEvent::IdentityReceived))
            }
            _ => {
                debug!("authorizing with burn-in credentials");
                let sent = Self::send(
                    &mut self.transport,
                    &Command::Authorize {
                        username: self.config.username.as_bytes(),
                        password: self.config.password.as_bytes(),
                    },
                );
                if !sent {
                    return (
                        TickOutcome::Drop {
                            reconnect_after: now + self.config.reconnect_cooldown_ms,
                        },
                        Some(ClientEvent::ConnectionFailed),
                    );
                }
                conn.stage = AuthorizationStage::AuthorizationRequested;
                (TickOutcome::Stay, None)
            }
        }
    }

    /// Pop the registration queue for a fresh identity.
    fn request_identity(&mut self, conn: &mut ConnectedState) {
        debug!("requesting an identity from the registration queue");
        if Self::send(&mut self.transport, &Command::PopRegistration) {
            conn.stage = AuthorizationStage::IdentificationRequested;
        } else {
            self.reset(conn, ResetTrigger::Transport);
        }
    }

    /// Send the next work-loop command, alternating pop and heartbeat.
    fn write_next(&mut self, conn: &mut ConnectedState) {
        if conn.last_wrote_pop {
            trace!("pushing a heartbeat");
            let sent = Self::send(
                &mut self.transport,
                &Command::PushHeartbeat {
                    identity: conn.identity(),
                },
            );
            if sent {
                conn.work_phase = WorkPhase::ReceivingHeartbeatAck;
                conn.last_wrote_pop = false;
                self.heartbeats_sent = self.heartbeats_sent.saturating_add(1);
            } else {
                self.reset(conn, ResetTrigger::Transport);
            }
        } else {
            trace!("popping the device queue");
            let sent = Self::send(
                &mut self.transport,
                &Command::PopMessage {
                    identity: conn.identity(),
                },
            );
            if sent {
                conn.work_phase = WorkPhase::ReceivingPop {
                    expected: 0,
                    position: 0,
                };
                conn.last_wrote_pop = true;
            } else {
                self.reset(conn, ResetTrigger::Transport);
            }
        }
    }

    // ========================================================================
    // Reply Handling
    // ========================================================================

    fn handle_value(&mut self, conn: &mut ConnectedState, value: ProtocolValue) -> Option<ClientEvent> {
        if value.is_failure() {
            self.note_strange(conn, value);
            return None;
        }

        // Credential rejections end the episode no matter the stage.
        if let ProtocolValue::SimpleReply { is_error: true, len } = value {
            let line = &conn.scratch[..len];
            if is_credential_error(line) || is_permission_error(line) {
                warn!(
                    "server rejected the session: {}",
                    String::from_utf8_lossy(line)
                );
                self.reset(conn, ResetTrigger::Credential);
                return None;
            }
        }

        match conn.stage {
            AuthorizationStage::AuthorizationRequested => self.on_burn_in_reply(conn, value),
            AuthorizationStage::IdentificationRequested => self.on_registration_reply(conn, value),
            AuthorizationStage::AuthorizationAttempted => self.on_identity_reply(conn, value),
            AuthorizationStage::FullyAuthorized => self.on_work_reply(conn, value),
            AuthorizationStage::NotRequested | AuthorizationStage::AuthorizationReceived => {
                self.note_strange(conn, value);
                None
            }
        }
    }

    fn on_burn_in_reply(
        &mut self,
        conn: &mut ConnectedState,
        value: ProtocolValue,
    ) -> Option<ClientEvent> {
        match value {
            ProtocolValue::SimpleReply { is_error: false, len }
                if is_ok_reply(&conn.scratch[..len]) =>
            {
                debug!("burn-in credentials accepted");
                conn.stage = AuthorizationStage::AuthorizationReceived;
                conn.strange.clear();
                Some(ClientEvent::ConnectionEstablished)
            }
            other => {
                self.note_strange(conn, other);
                None
            }
        }
    }

    fn on_registration_reply(
        &mut self,
        conn: &mut ConnectedState,
        value: ProtocolValue,
    ) -> Option<ClientEvent> {
        match value {
            ProtocolValue::BulkRead { length } if length > 0 => {
                let length = length as usize;
                if length > MAX_IDENTITY_LEN {
                    warn!(
                        "registrar sent a {} byte identity; truncating to {}",
                        length, MAX_IDENTITY_LEN
                    );
                }
                let assigned = conn.scratch[..length.min(MAX_IDENTITY_LEN)].to_vec();
                debug!("registered as '{}'", String::from_utf8_lossy(&assigned));

                conn.set_identity(&assigned);
                conn.strange.clear();
                let written = self.store.put(IDENTITY_KEY, &assigned);
                if written < assigned.len() {
                    warn!(
                        "identity store accepted {} of {} bytes",
                        written,
                        assigned.len()
                    );
                }
                self.identity = Some(assigned);

                let sent = Self::send(
                    &mut self.transport,
                    &Command::Authorize {
                        username: conn.identity(),
                        password: conn.identity(),
                    },
                );
                if sent {
                    conn.stage = AuthorizationStage::AuthorizationAttempted;
                } else {
                    self.reset(conn, ResetTrigger::Transport);
                }
                Some(ClientEvent::IdentityReceived)
            }
            ProtocolValue::BulkRead { .. } => {
                // Null pop: the registrar has not provisioned anything yet.
                // Fall back a stage and re-poll after the write delay.
                debug!("registration queue is empty; will ask again");
                conn.stage = AuthorizationStage::AuthorizationReceived;
                None
            }
            other => {
                self.note_strange(conn, other);
                None
            }
        }
    }

    fn on_identity_reply(
        &mut self,
        conn: &mut ConnectedState,
        value: ProtocolValue,
    ) -> Option<ClientEvent> {
        match value {
            ProtocolValue::SimpleReply { is_error: false, len }
                if is_ok_reply(&conn.scratch[..len]) =>
            {
                debug!("identity accepted; starting the work loop");
                conn.stage = AuthorizationStage::FullyAuthorized;
                conn.work_phase = WorkPhase::NotReceiving;
                conn.strange.clear();
                conn.failed_resets.clear();
                Some(ClientEvent::Authorized)
            }
            other => {
                self.note_strange(conn, other);
                None
            }
        }
    }

    fn on_work_reply(
        &mut self,
        conn: &mut ConnectedState,
        value: ProtocolValue,
    ) -> Option<ClientEvent> {
        match conn.work_phase {
            WorkPhase::NotReceiving => {
                self.note_strange(conn, value);
                None
            }

            WorkPhase::ReceivingHeartbeatAck => match value {
                ProtocolValue::Integer { value: queued } => {
                    trace!("heartbeat acknowledged ({} queued)", queued);
                    conn.work_phase = WorkPhase::NotReceiving;
                    conn.strange.clear();
                    self.write_next(conn);
                    None
                }
                other => {
                    self.note_strange(conn, other);
                    None
                }
            },

            WorkPhase::ReceivingPop { expected: 0, .. } => match value {
                ProtocolValue::ArrayHeader { count } if count > 0 => {
                    conn.work_phase = WorkPhase::ReceivingPop {
                        expected: count,
                        position: 0,
                    };
                    None
                }
                ProtocolValue::ArrayHeader { .. } => {
                    // Null or empty array: the blocking pop timed out with
                    // nothing queued. Move straight on to the next write.
                    trace!("device queue is empty");
                    conn.work_phase = WorkPhase::NotReceiving;
                    conn.strange.clear();
                    self.write_next(conn);
                    None
                }
                other => {
                    self.note_strange(conn, other);
                    None
                }
            },

            WorkPhase::ReceivingPop { expected, position } => match value {
                ProtocolValue::BulkRead { length } => {
                    let position = position + 1;
                    if position < expected {
                        // Intermediate elements (the queue name) are skipped;
                        // only the final element is the payload.
                        conn.work_phase = WorkPhase::ReceivingPop { expected, position };
                        return None;
                    }

                    conn.work_phase = WorkPhase::NotReceiving;
                    conn.strange.clear();
                    let len = length.max(0) as usize;
                    if &conn.scratch[..len] == RESET_PAYLOAD {
                        debug!("server commanded a re-registration");
                        self.reset(conn, ResetTrigger::Commanded);
                        return None;
                    }

                    self.ring.push(&conn.scratch[..len]);
                    self.messages_received = self.messages_received.saturating_add(1);
                    Some(ClientEvent::MessageReceived)
                }
                other => {
                    self.note_strange(conn, other);
                    None
                }
            },
        }
    }

    // ========================================================================
    // Failure Handling
    // ========================================================================

    /// Count a reply that made no sense where it arrived; too many in one
    /// episode reset the session.
    fn note_strange(&mut self, conn: &mut ConnectedState, value: ProtocolValue) {
        warn!("unexpected reply {:?} in stage {:?}", value, conn.stage);
        if conn.strange.record() {
            warn!("strange-reply budget exhausted; resetting the session");
            self.reset(conn, ResetTrigger::Strange);
        }
    }

    /// Abandon the episode: stop the socket and restart the handshake on
    /// the next poll. The identity is only dropped for credential triggers
    /// past their budget, or on the server's explicit command; a dead
    /// socket and a stale identity need different recoveries.
    fn reset(&mut self, conn: &mut ConnectedState, trigger: ResetTrigger) {
        debug!("session reset ({:?})", trigger);
        match trigger {
            ResetTrigger::Credential => {
                if conn.failed_resets.record() {
                    warn!(
                        "{} consecutive credential failures; dropping the stored identity",
                        conn.failed_resets.count()
                    );
                    self.store.remove(IDENTITY_KEY);
                    self.identity = None;
                    conn.clear_identity();
                    conn.failed_resets.clear();
                }
            }
            ResetTrigger::Commanded => {
                debug!("dropping the stored identity on server command");
                self.store.remove(IDENTITY_KEY);
                self.identity = None;
                conn.clear_identity();
                conn.failed_resets.clear();
            }
            ResetTrigger::Strange | ResetTrigger::Stall | ResetTrigger::Transport => {}
        }

        self.transport.stop();
        conn.begin_episode();
        self.resets = self.resets.saturating_add(1);
    }

    /// Encode and write one command. Failures are logged and reported as
    /// `false`; the caller decides whether they end the episode.
    fn send(transport: &mut T, command: &Command<'_>) -> bool {
        let frame = match command.encode() {
            Ok(frame) => frame,
            Err(error) => {
                warn!("could not encode {}: {}", command.word(), error);
                return false;
            }
        };

        match transport.write(&frame) {
            Ok(written) if written == frame.len() => true,
            Ok(written) => {
                warn!(
                    "short write for {}: {} of {} bytes",
                    command.word(),
                    written,
                    frame.len()
                );
                false
            }
            Err(error) => {
                warn!("write failed for {}: {}", command.word(), error);
                false
            }
        }
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// Create a new client.
pub fn create_client<T: Transport, S: IdentityStore>(
    config: ClientConfig,
    transport: T,
    store: S,
) -> Client<T, S> {
    Client::new(config, transport, store)
}

// ============================================================================
// Tests
// ============================================================================
