use crate::{
    config::{
        DEFAULT_AUTO_CONNECT, DEFAULT_AUTO_RECONNECT, DEFAULT_DEBUG_LOGGING,
        DEFAULT_HEARTBEAT_INTERVAL_SECS, DEFAULT_MAX_RECONNECT_ATTEMPTS,
        DEFAULT_RECONNECT_DELAY_SECS, DEFAULT_START_GRACE_PERIOD_SECS, default_auto_connect,
        default_auto_reconnect, default_debug_logging, default_heartbeat_interval,
        default_max_reconnect_attempts, default_reconnect_delay, default_server_url,
        default_start_grace_period,
    },
    connection::ReconnectPolicy,
};

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Static client configuration handed to the core at construction.
///
/// Time values are expressed in seconds so they read naturally in TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Recorder endpoint.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Connect as soon as the client is spawned.
    #[serde(default = "default_auto_connect")]
    pub auto_connect: bool,

    /// Retry automatically after an unexpected disconnect.
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,

    /// Fixed wait between reconnect attempts, in seconds.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay: f64,

    /// Reconnect attempts allowed before giving up.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Verbose logging in the host application.
    #[serde(default = "default_debug_logging")]
    pub debug_logging: bool,

    /// Keep-alive ping interval, in seconds.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: f64,

    /// How long `start_recording` waits for a confirmation, in seconds.
    #[serde(default = "default_start_grace_period")]
    pub start_grace_period: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            auto_connect: DEFAULT_AUTO_CONNECT,
            auto_reconnect: DEFAULT_AUTO_RECONNECT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY_SECS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            debug_logging: DEFAULT_DEBUG_LOGGING,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL_SECS,
            start_grace_period: DEFAULT_START_GRACE_PERIOD_SECS,
        }
    }
}

impl ClientConfig {
    /// Reconnect policy derived from the reconnect options.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            enabled: self.auto_reconnect,
            delay: seconds(self.reconnect_delay),
            max_attempts: self.max_reconnect_attempts,
        }
    }

    /// Heartbeat interval as a [`Duration`]. Never zero.
    pub fn heartbeat_interval(&self) -> Duration {
        // tokio::time::interval rejects a zero period
        seconds(self.heartbeat_interval).max(Duration::from_millis(1))
    }

    /// Confirmation grace period as a [`Duration`].
    pub fn start_grace_period(&self) -> Duration {
        seconds(self.start_grace_period)
    }
}

/// Converts seconds to a duration, clamping negative or non-finite input to zero.
pub(crate) fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}
