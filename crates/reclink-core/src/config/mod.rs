mod client_config;

pub use client_config::ClientConfig;

pub(crate) const DEFAULT_SERVER_URL: &str = "ws://localhost:9876";
pub(crate) const DEFAULT_AUTO_CONNECT: bool = true;
pub(crate) const DEFAULT_AUTO_RECONNECT: bool = true;
pub(crate) const DEFAULT_RECONNECT_DELAY_SECS: f64 = 2.0;
pub(crate) const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub(crate) const DEFAULT_DEBUG_LOGGING: bool = false;
pub(crate) const DEFAULT_HEARTBEAT_INTERVAL_SECS: f64 = 30.0;
pub(crate) const DEFAULT_START_GRACE_PERIOD_SECS: f64 = 0.5;

pub(crate) fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

pub(crate) fn default_auto_connect() -> bool {
    DEFAULT_AUTO_CONNECT
}

pub(crate) fn default_auto_reconnect() -> bool {
    DEFAULT_AUTO_RECONNECT
}

pub(crate) fn default_reconnect_delay() -> f64 {
    DEFAULT_RECONNECT_DELAY_SECS
}

pub(crate) fn default_max_reconnect_attempts() -> u32 {
    DEFAULT_MAX_RECONNECT_ATTEMPTS
}

pub(crate) fn default_debug_logging() -> bool {
    DEFAULT_DEBUG_LOGGING
}

pub(crate) fn default_heartbeat_interval() -> f64 {
    DEFAULT_HEARTBEAT_INTERVAL_SECS
}

pub(crate) fn default_start_grace_period() -> f64 {
    DEFAULT_START_GRACE_PERIOD_SECS
}
