//! Reclink Core Library
//!
//! Session client for a remote recording service. Keeps a persistent
//! WebSocket connection alive, reconnects with a fixed-delay bounded policy,
//! and reconciles start/stop commands with the confirmations the recorder
//! pushes back asynchronously.
//!
//! # Example
//!
//! ```no_run
//! use reclink_core::{ClientConfig, ConnectionState, CoreResult, RecorderClient};
//!
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let client = RecorderClient::spawn(ClientConfig::default());
//!     client.wait_for_state(ConnectionState::Connected).await?;
//!
//!     if let Some(recording_id) = client.start_recording("boss_fight").await? {
//!         client.stop_recording(&recording_id, Duration::from_secs(3)).await?;
//!     }
//!
//!     client.shutdown().await
//! }
//! ```

mod client;
mod config;
mod connection;
mod error;
mod events;
pub mod protocol;
mod session;
pub mod transport;

pub use {
    client::RecorderClient,
    config::ClientConfig,
    connection::{ClientSnapshot, ConnectionState, ReconnectPolicy},
    error::{ClientError, ErrorClass, ProtocolError, Result as CoreResult},
    events::{EventBus, Notification, NotificationKind, SubscriptionId},
    session::{RecordingSession, SettingsSnapshot},
};
