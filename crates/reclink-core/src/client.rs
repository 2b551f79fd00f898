use crate::{
    ClientConfig, ClientError, CoreResult,
    connection::{
        ClientSnapshot, ConnectionState,
        manager::{Command, ConnectionManager},
    },
    events::{EventBus, Notification, NotificationKind, SubscriptionId},
    session::SettingsSnapshot,
    transport::{Transport, WsTransport},
};

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, instrument};

const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Cloneable handle to a running recorder connection.
///
/// All state lives in one connection task; every method here either reads
/// the last published [`ClientSnapshot`] or posts a command to that task.
/// Dropping the last handle stops the task and closes the transport.
#[derive(Debug, Clone)]
pub struct RecorderClient {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<ClientSnapshot>,
    events: EventBus,
    grace_period: Duration,
}

impl RecorderClient {
    /// Spawns a client backed by a WebSocket transport.
    ///
    /// Must be called inside a tokio runtime. Connects immediately when
    /// `config.auto_connect` is set.
    pub fn spawn(config: ClientConfig) -> Self {
        Self::with_transport(config, WsTransport::new())
    }

    /// Spawns a client over a caller-supplied transport.
    pub fn with_transport<T: Transport>(config: ClientConfig, transport: T) -> Self {
        let events = EventBus::new();
        let (snapshot_tx, snapshot_rx) = watch::channel(ClientSnapshot::default());
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let manager =
            ConnectionManager::new(&config, Box::new(transport), events.clone(), snapshot_tx);
        tokio::spawn(manager.run(commands_rx));

        Self {
            commands: commands_tx,
            snapshot: snapshot_rx,
            events,
            grace_period: config.start_grace_period(),
        }
    }

    /// Starts connecting. Resets the reconnect counters, including after `Failed`.
    ///
    /// Returns once the attempt has begun; watch [`NotificationKind::Connected`]
    /// or [`RecorderClient::wait_for_state`] for the outcome.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> CoreResult<()> {
        self.request(|reply| Command::Connect { reply }).await
    }

    /// Closes the connection and cancels any pending reconnect. Idempotent.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) -> CoreResult<()> {
        self.request(|reply| Command::Disconnect { reply }).await
    }

    /// Asks the recorder to start capturing for `event_id`.
    ///
    /// Fails fast without sending anything when not connected or when the
    /// cached settings disable auto-record. Otherwise waits the configured
    /// grace period and returns whatever recording id is current by then;
    /// `Ok(None)` means no confirmation arrived in time.
    #[instrument(skip(self))]
    pub async fn start_recording(&self, event_id: &str) -> CoreResult<Option<String>> {
        let event_id = event_id.to_string();
        self.request(|reply| Command::StartRecording { event_id, reply })
            .await??;

        tokio::time::sleep(self.grace_period).await;

        let recording_id = self.snapshot.borrow().session.current_recording_id.clone();
        debug!(?recording_id, "Start grace period elapsed");
        Ok(recording_id)
    }

    /// Asks the recorder to stop `recording_id` after `delay`.
    ///
    /// Preconditions are checked immediately. The frame is sent once, no
    /// earlier than `delay` from now, and this future resolves when it has
    /// been sent. It does not wait for the recorder's confirmation.
    #[instrument(skip(self))]
    pub async fn stop_recording(&self, recording_id: &str, delay: Duration) -> CoreResult<()> {
        let recording_id = recording_id.to_string();
        self.request(|reply| Command::StopRecording {
            recording_id,
            delay,
            reply,
        })
        .await?
    }

    /// Announces an event type to the recorder. Fire-and-forget.
    #[instrument(skip(self))]
    pub async fn register_event(&self, event_id: &str, event_name: &str) -> CoreResult<()> {
        let event_id = event_id.to_string();
        let event_name = event_name.to_string();
        self.request(|reply| Command::RegisterEvent {
            event_id,
            event_name,
            reply,
        })
        .await?
    }

    /// Requests fresh settings. Does nothing while not connected.
    #[instrument(skip(self))]
    pub async fn request_settings(&self) -> CoreResult<()> {
        self.request(|reply| Command::RequestSettings { reply })
            .await?
    }

    /// Disconnects and stops the connection task.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> CoreResult<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    /// Latest published state.
    pub fn snapshot(&self) -> ClientSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.snapshot.borrow().state
    }

    /// Active recording id, if any.
    pub fn current_recording_id(&self) -> Option<String> {
        self.snapshot.borrow().session.current_recording_id.clone()
    }

    /// Last settings pushed by the recorder, or defaults.
    pub fn settings(&self) -> SettingsSnapshot {
        self.snapshot.borrow().settings.clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn watch(&self) -> watch::Receiver<ClientSnapshot> {
        self.snapshot.clone()
    }

    /// Resolves once the client reaches `state`.
    pub async fn wait_for_state(&self, state: ConnectionState) -> CoreResult<()> {
        let mut snapshot = self.snapshot.clone();
        snapshot
            .wait_for(|s| s.state == state)
            .await
            .map(|_| ())
            .map_err(|_| ClientError::closed())
    }

    /// Registers a handler for one notification kind.
    pub fn subscribe<F>(&self, kind: NotificationKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.events.subscribe(kind, handler)
    }

    /// Registers a handler for every notification.
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.events.subscribe_all(handler)
    }

    /// Removes a subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Typed channel of every notification from now on.
    pub fn notifications(&self) -> mpsc::UnboundedReceiver<Notification> {
        self.events.channel()
    }

    async fn request<R>(&self, build: impl FnOnce(oneshot::Sender<R>) -> Command) -> CoreResult<R> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.commands
            .send(build(reply_tx))
            .await
            .map_err(|_| ClientError::closed())?;

        reply_rx.await.map_err(|_| ClientError::closed())
    }
}
