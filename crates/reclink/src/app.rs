use crate::{AppCommand, AppResult};

use reclink_core::{ClientSnapshot, Notification, RecorderClient};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{error, info, instrument, warn};

/// Main application state.
///
/// Reads commands from stdin and prints recorder notifications as they
/// arrive. Recording commands run on their own tasks so a delayed stop
/// never blocks the console.
pub struct App {
    pub(crate) client: RecorderClient,
    pub(crate) notifications: mpsc::UnboundedReceiver<Notification>,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Reclink starting");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => match line.parse::<AppCommand>() {
                        Ok(AppCommand::Shutdown) => {
                            info!("Shutdown requested");
                            break;
                        }
                        Ok(command) => self.handle_command(command).await,
                        Err(e) => warn!(error = %e, "Ignoring console input"),
                    },
                    None => {
                        info!("Console closed, shutting down");
                        break;
                    }
                },

                Some(notification) = self.notifications.recv() => {
                    println!("{}", describe(&notification));
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, shutting down");
                    break;
                }
            }
        }

        self.client.shutdown().await?;
        info!("Reclink shut down successfully");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn handle_command(&self, command: AppCommand) {
        let client = self.client.clone();

        match command {
            AppCommand::Connect => {
                if let Err(e) = client.connect().await {
                    error!(error = %e, "Connect failed");
                }
            }
            AppCommand::Disconnect => {
                if let Err(e) = client.disconnect().await {
                    error!(error = %e, "Disconnect failed");
                }
            }
            AppCommand::StartRecording { event_id } => {
                tokio::spawn(async move {
                    match client.start_recording(&event_id).await {
                        Ok(Some(recording_id)) => println!("recording {recording_id} started"),
                        Ok(None) => println!("start sent, no confirmation yet"),
                        Err(e) => error!(event_id = %event_id, error = %e, "Start failed"),
                    }
                });
            }
            AppCommand::StopRecording {
                recording_id,
                delay,
            } => {
                tokio::spawn(async move {
                    if let Err(e) = client.stop_recording(&recording_id, delay).await {
                        error!(recording_id = %recording_id, error = %e, "Stop failed");
                    }
                });
            }
            AppCommand::RegisterEvent {
                event_id,
                event_name,
            } => {
                if let Err(e) = client.register_event(&event_id, &event_name).await {
                    error!(event_id = %event_id, error = %e, "Register failed");
                }
            }
            AppCommand::RequestSettings => {
                if let Err(e) = client.request_settings().await {
                    error!(error = %e, "Settings request failed");
                }
            }
            AppCommand::Status => println!("{}", describe_snapshot(&client.snapshot())),
            AppCommand::Shutdown => {}
        }
    }
}

/// One console line for a notification.
pub(crate) fn describe(notification: &Notification) -> String {
    match notification {
        Notification::Connected => "connected".to_string(),
        Notification::Disconnected => "disconnected".to_string(),
        Notification::RecordingStarted { recording_id } => {
            format!("recording started: {recording_id}")
        }
        Notification::RecordingStopped {
            recording_id,
            file_path,
            duration,
            file_size,
        } => format!(
            "recording stopped: {recording_id} -> {file_path} ({duration:.1}s, {file_size} bytes)"
        ),
        Notification::SettingsChanged(settings) => format!(
            "settings: auto_record={} max_duration={}s quality={}",
            settings.auto_record_enabled, settings.max_duration_seconds, settings.quality
        ),
        Notification::EventRegistered => "event registered".to_string(),
        Notification::ServerShutdown { reconnect_delay_ms } => {
            format!("recorder shutting down, back in {reconnect_delay_ms}ms")
        }
        Notification::Error { class, message } => format!("{class} error: {message}"),
    }
}

pub(crate) fn describe_snapshot(snapshot: &ClientSnapshot) -> String {
    let recording = snapshot
        .session
        .current_recording_id
        .as_deref()
        .unwrap_or("none");

    format!(
        "state={} attempts={} recording={} auto_record={}",
        snapshot.state, snapshot.attempts_made, recording, snapshot.settings.auto_record_enabled
    )
}
