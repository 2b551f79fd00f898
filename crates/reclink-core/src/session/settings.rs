use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_AUTO_RECORD_ENABLED: bool = true;
pub(crate) const DEFAULT_MAX_DURATION_SECONDS: u64 = 300;
pub(crate) const DEFAULT_QUALITY: &str = "high";

/// Cached copy of the server-authoritative recorder settings.
///
/// Defaults apply until the first `settings` frame arrives; each new frame
/// replaces the snapshot wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    /// Whether the recorder accepts start requests.
    pub auto_record_enabled: bool,
    /// Upper bound on a single recording, in seconds.
    pub max_duration_seconds: u64,
    /// Recorder quality preset name.
    pub quality: String,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            auto_record_enabled: DEFAULT_AUTO_RECORD_ENABLED,
            max_duration_seconds: DEFAULT_MAX_DURATION_SECONDS,
            quality: DEFAULT_QUALITY.to_string(),
        }
    }
}
