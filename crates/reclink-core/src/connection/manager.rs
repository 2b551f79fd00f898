//! Connection lifecycle state machine.
//!
//! A single task owns the transport, the lifecycle state, the reconnect
//! counters and the session tracker. Callers talk to it through
//! [`RecorderClient`](crate::RecorderClient); timers talk to it through an
//! internal channel. Nothing else mutates this state.

use crate::{
    ClientConfig, ClientError, CoreResult, ErrorClass,
    connection::{
        ClientSnapshot, ConnectionState, ReconnectPolicy,
        cancel::{CancelHandle, CancelToken},
        heartbeat::HeartbeatScheduler,
    },
    events::{EventBus, Notification},
    protocol::{Inbound, Outbound, codec},
    session::SessionTracker,
    transport::{Transport, TransportEvent},
};

use std::time::Duration;

use tokio::{
    sync::{mpsc, oneshot, watch},
    time::Instant,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Requests from [`RecorderClient`](crate::RecorderClient) handles.
#[derive(Debug)]
pub(crate) enum Command {
    Connect {
        reply: oneshot::Sender<()>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    StartRecording {
        event_id: String,
        reply: oneshot::Sender<CoreResult<()>>,
    },
    /// Replies once the frame has actually been handed to the transport.
    StopRecording {
        recording_id: String,
        delay: Duration,
        reply: oneshot::Sender<CoreResult<()>>,
    },
    RegisterEvent {
        event_id: String,
        event_name: String,
        reply: oneshot::Sender<CoreResult<()>>,
    },
    RequestSettings {
        reply: oneshot::Sender<CoreResult<()>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Messages from timer tasks spawned by the manager.
#[derive(Debug)]
pub(crate) enum Internal {
    ReconnectDue {
        epoch: u64,
    },
    HeartbeatTick {
        epoch: u64,
    },
    DelayedStop {
        recording_id: String,
        reply: oneshot::Sender<CoreResult<()>>,
    },
}

pub(crate) struct ConnectionManager {
    url: String,
    auto_connect: bool,
    policy: ReconnectPolicy,
    heartbeat_interval: Duration,
    transport: Box<dyn Transport>,
    state: ConnectionState,
    attempts_made: u32,
    wants_connection: bool,
    /// Bumped for every connection attempt; stale timer messages carry an old value.
    epoch: u64,
    connection_id: Uuid,
    attempt: CancelHandle,
    transport_events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: Option<mpsc::UnboundedReceiver<Internal>>,
    heartbeat: HeartbeatScheduler,
    tracker: SessionTracker,
    shutdown_hint: Option<Duration>,
    last_pong: Option<Instant>,
    events: EventBus,
    snapshot: watch::Sender<ClientSnapshot>,
}

impl ConnectionManager {
    pub(crate) fn new(
        config: &ClientConfig,
        transport: Box<dyn Transport>,
        events: EventBus,
        snapshot: watch::Sender<ClientSnapshot>,
    ) -> Self {
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();

        Self {
            url: config.server_url.clone(),
            auto_connect: config.auto_connect,
            policy: config.reconnect_policy(),
            heartbeat_interval: config.heartbeat_interval(),
            transport,
            state: ConnectionState::Disconnected,
            attempts_made: 0,
            wants_connection: false,
            epoch: 0,
            connection_id: Uuid::nil(),
            attempt: CancelHandle::new(),
            transport_events: None,
            internal_tx,
            internal_rx: Some(internal_rx),
            heartbeat: HeartbeatScheduler::default(),
            tracker: SessionTracker::default(),
            shutdown_hint: None,
            last_pong: None,
            events,
            snapshot,
        }
    }

    /// Runs until every client handle is dropped or `Shutdown` is received.
    #[instrument(skip_all, fields(url = %self.url))]
    pub(crate) async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let Some(mut internal_rx) = self.internal_rx.take() else {
            warn!("Connection manager started twice");
            return;
        };

        info!("Connection manager started");

        if self.auto_connect {
            self.connect();
        }

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command) {
                            break;
                        }
                    }
                    None => {
                        debug!("All client handles dropped");
                        break;
                    }
                },

                Some(internal) = internal_rx.recv() => self.handle_internal(internal),

                event = next_transport_event(&mut self.transport_events) => match event {
                    Some(event) => self.handle_transport_event(event),
                    None => {
                        // Transport dropped its sink without reporting a close.
                        self.transport_events = None;
                        self.handle_transport_event(TransportEvent::Closed { was_clean: false });
                    }
                },
            }
        }

        self.disconnect();
        info!("Connection manager stopped");
    }

    /// Returns `false` when the manager should stop.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Connect { reply } => {
                self.connect();
                let _ = reply.send(());
            }
            Command::Disconnect { reply } => {
                self.disconnect();
                let _ = reply.send(());
            }
            Command::StartRecording { event_id, reply } => {
                let result = self.start_recording(&event_id);
                let _ = reply.send(result);
            }
            Command::StopRecording {
                recording_id,
                delay,
                reply,
            } => self.stop_recording(recording_id, delay, reply),
            Command::RegisterEvent {
                event_id,
                event_name,
                reply,
            } => {
                let result = self.register_event(&event_id, &event_name);
                let _ = reply.send(result);
            }
            Command::RequestSettings { reply } => {
                let result = if self.is_connected() {
                    self.dispatch(&Outbound::GetSettings)
                } else {
                    debug!("Settings request ignored while not connected");
                    Ok(())
                };
                let _ = reply.send(result);
            }
            Command::Shutdown { reply } => {
                self.disconnect();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn handle_internal(&mut self, internal: Internal) {
        match internal {
            Internal::ReconnectDue { epoch } => self.on_reconnect_due(epoch),
            Internal::HeartbeatTick { epoch } => {
                if epoch == self.epoch && self.is_connected() {
                    debug!(connection_id = %self.connection_id, "Heartbeat ping");
                    if let Err(e) = self.dispatch(&Outbound::Ping) {
                        warn!(error = %e, "Heartbeat ping failed");
                    }
                } else {
                    debug!(epoch, current = self.epoch, "Stale heartbeat tick ignored");
                }
            }
            Internal::DelayedStop {
                recording_id,
                reply,
            } => {
                let result = self.dispatch(&Outbound::StopRecording { recording_id });
                let _ = reply.send(result);
            }
        }
    }

    #[instrument(skip(self), fields(state = %self.state))]
    fn connect(&mut self) {
        if matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Connecting
        ) {
            debug!("Connect ignored, already connecting or connected");
            return;
        }

        self.wants_connection = true;
        self.attempts_made = 0;
        self.shutdown_hint = None;
        self.begin_attempt();
        self.open_transport();
    }

    #[instrument(skip(self), fields(state = %self.state))]
    fn disconnect(&mut self) {
        if self.state == ConnectionState::Disconnected {
            debug!("Disconnect ignored, already disconnected");
            return;
        }

        let previous = self.state;
        self.wants_connection = false;
        self.begin_attempt();
        self.transport.close();
        self.transport_events = None;
        self.tracker.clear();
        self.set_state(ConnectionState::Disconnected);

        info!(connection_id = %self.connection_id, "Disconnected by caller");

        if previous == ConnectionState::Connected {
            self.notify(Notification::Disconnected);
        }
    }

    /// Starts a fresh attempt scope, cancelling timers of the previous one.
    fn begin_attempt(&mut self) {
        self.attempt.cancel();
        self.heartbeat.stop();
        self.attempt = CancelHandle::new();
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn open_transport(&mut self) {
        self.connection_id = Uuid::new_v4();
        self.last_pong = None;
        self.set_state(ConnectionState::Connecting);

        let (tx, rx) = mpsc::unbounded_channel();
        self.transport_events = Some(rx);

        info!(
            connection_id = %self.connection_id,
            attempt = self.attempts_made,
            url = %self.url,
            "Connecting"
        );

        if let Err(e) = self.transport.open(&self.url, tx) {
            warn!(connection_id = %self.connection_id, error = %e, "Transport open failed");
            self.notify(Notification::error(e.class(), e.to_string()));
            self.on_connection_lost();
        }
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Established => {
                if self.state == ConnectionState::Connecting {
                    self.on_established();
                } else {
                    debug!(state = %self.state, "Unexpected Established ignored");
                }
            }
            TransportEvent::Closed { was_clean } => {
                info!(connection_id = %self.connection_id, was_clean, "Transport closed");
                self.on_connection_lost();
            }
            TransportEvent::Error { reason } => {
                warn!(connection_id = %self.connection_id, reason = %reason, "Transport error");
                self.notify(Notification::error(ErrorClass::Connection, reason));
                self.on_connection_lost();
            }
            TransportEvent::DataReceived(frame) => {
                if self.is_connected() {
                    self.on_frame(&frame);
                } else {
                    debug!(state = %self.state, "Frame received outside Connected dropped");
                }
            }
        }
    }

    fn on_established(&mut self) {
        self.attempts_made = 0;
        self.set_state(ConnectionState::Connected);

        info!(connection_id = %self.connection_id, "Connected");
        self.notify(Notification::Connected);

        if let Err(e) = self.dispatch(&Outbound::GetSettings) {
            warn!(error = %e, "Initial settings request failed");
        }

        self.heartbeat.start(
            self.epoch,
            self.heartbeat_interval,
            self.attempt.token(),
            self.internal_tx.clone(),
        );
        self.publish();
    }

    /// Handles a drop while Connecting or Connected.
    fn on_connection_lost(&mut self) {
        let previous = self.state;
        if !matches!(
            previous,
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            return;
        }

        self.transport_events = None;
        self.heartbeat.stop();
        self.transport.close();

        let failure = self.schedule_reconnect();

        if previous == ConnectionState::Connected {
            self.notify(Notification::Disconnected);
        }
        if let Some(failure) = failure {
            self.notify(failure);
        }
    }

    /// Moves to Reconnecting, Disconnected or Failed according to the policy.
    ///
    /// Returns the error notification to emit when the attempt cap is hit.
    fn schedule_reconnect(&mut self) -> Option<Notification> {
        if !(self.policy.enabled && self.wants_connection) {
            self.set_state(ConnectionState::Disconnected);
            return None;
        }

        if self.attempts_made >= self.policy.max_attempts {
            return Some(self.enter_failed());
        }

        self.begin_attempt();
        self.set_state(ConnectionState::Reconnecting);

        let delay = self.shutdown_hint.take().unwrap_or(self.policy.delay);

        info!(
            attempt = self.attempts_made + 1,
            max_attempts = self.policy.max_attempts,
            delay_ms = delay.as_millis(),
            "Reconnect scheduled"
        );

        tokio::spawn(reconnect_wait(
            self.epoch,
            delay,
            self.attempt.token(),
            self.internal_tx.clone(),
        ));

        None
    }

    fn on_reconnect_due(&mut self, epoch: u64) {
        if epoch != self.epoch || self.state != ConnectionState::Reconnecting {
            debug!(epoch, current = self.epoch, "Stale reconnect timer ignored");
            return;
        }

        // schedule_reconnect enters Failed before spawning a wait at the cap.
        self.attempts_made += 1;
        self.open_transport();
    }

    fn enter_failed(&mut self) -> Notification {
        self.begin_attempt();
        self.set_state(ConnectionState::Failed);

        warn!(
            attempts = self.attempts_made,
            "Reconnect attempts exhausted, giving up"
        );

        Notification::error(
            ErrorClass::Connection,
            format!("Gave up after {} reconnect attempts", self.attempts_made),
        )
    }

    fn on_frame(&mut self, frame: &str) {
        let message = match codec::decode(frame) {
            Ok(message) => message,
            Err(crate::ProtocolError::UnknownKind { kind, .. }) => {
                debug!(kind = %kind, "Skipping unknown message type");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Dropping undecodable frame");
                self.notify(Notification::error(ErrorClass::Protocol, e.to_string()));
                return;
            }
        };

        match message {
            Inbound::Pong => {
                self.last_pong = Some(Instant::now());
                debug!(connection_id = %self.connection_id, "Pong received");
                self.publish();
            }
            Inbound::ServerShutdown { reconnect_delay_ms } => {
                info!(reconnect_delay_ms, "Recorder announced shutdown");
                self.shutdown_hint = Some(Duration::from_millis(reconnect_delay_ms));
                self.notify(Notification::ServerShutdown { reconnect_delay_ms });
            }
            Inbound::Error { message } => {
                warn!(message = %message, "Recorder reported an error");
                self.notify(Notification::error(ErrorClass::Server, message));
            }
            other => {
                if let Some(notification) = self.tracker.apply(other) {
                    self.notify(notification);
                }
            }
        }
    }

    #[instrument(skip(self))]
    fn start_recording(&mut self, event_id: &str) -> CoreResult<()> {
        let command = self
            .tracker
            .start_command(self.is_connected(), event_id)
            .inspect_err(|e| self.report(e))?;

        self.dispatch(&command)?;
        info!(event_id = %event_id, "Start recording requested");
        Ok(())
    }

    #[instrument(skip(self, reply))]
    fn stop_recording(
        &mut self,
        recording_id: String,
        delay: Duration,
        reply: oneshot::Sender<CoreResult<()>>,
    ) {
        let command = match self.tracker.stop_command(self.is_connected(), &recording_id) {
            Ok(command) => command,
            Err(e) => {
                self.report(&e);
                let _ = reply.send(Err(e));
                return;
            }
        };

        if delay.is_zero() {
            let _ = reply.send(self.dispatch(&command));
            return;
        }

        debug!(recording_id = %recording_id, delay_ms = delay.as_millis(), "Stop deferred");

        // Not tied to the attempt token: the frame goes out after the delay regardless.
        let internal_tx = self.internal_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = internal_tx.send(Internal::DelayedStop {
                recording_id,
                reply,
            });
        });
    }

    fn register_event(&mut self, event_id: &str, event_name: &str) -> CoreResult<()> {
        let command = self
            .tracker
            .register_command(self.is_connected(), event_id, event_name)
            .inspect_err(|e| self.report(e))?;

        self.dispatch(&command)
    }

    /// Encodes and sends one message on the live connection.
    fn dispatch(&mut self, message: &Outbound) -> CoreResult<()> {
        if !self.is_connected() {
            let e = ClientError::not_connected();
            self.report(&e);
            return Err(e);
        }

        let frame = codec::encode(message).inspect_err(|e| {
            warn!(kind = message.kind(), error = %e, "Encode failed");
        })?;

        debug!(kind = message.kind(), connection_id = %self.connection_id, "Sending frame");

        self.transport.send(frame).inspect_err(|e| {
            warn!(kind = message.kind(), error = %e, "Send failed");
            self.events
                .emit(&Notification::error(e.class(), e.to_string()));
        })
    }

    fn report(&self, error: &ClientError) {
        debug!(error = %error, "Operation rejected");
        self.events
            .emit(&Notification::error(error.class(), error.to_string()));
    }

    fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "State transition");
            if self.state == ConnectionState::Connected {
                self.tracker.clear();
            }
            self.state = state;
        }
        self.publish();
    }

    /// Publishes state before delivery so subscribers observe it.
    fn notify(&self, notification: Notification) {
        self.publish();
        self.events.emit(&notification);
    }

    fn publish(&self) {
        let next = ClientSnapshot {
            state: self.state,
            attempts_made: self.attempts_made,
            session: self.tracker.session().clone(),
            settings: self.tracker.settings().clone(),
            heartbeat_active: self.heartbeat.is_running(),
            last_pong: self.last_pong,
        };

        self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

async fn next_transport_event(
    events: &mut Option<mpsc::UnboundedReceiver<TransportEvent>>,
) -> Option<TransportEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn reconnect_wait(
    epoch: u64,
    delay: Duration,
    mut cancel: CancelToken,
    internal_tx: mpsc::UnboundedSender<Internal>,
) {
    tokio::select! {
        _ = cancel.cancelled() => debug!(epoch, "Reconnect wait cancelled"),
        _ = tokio::time::sleep(delay) => {
            let _ = internal_tx.send(Internal::ReconnectDue { epoch });
        }
    }
}
