pub(crate) mod settings;
mod tracker;

pub(crate) use tracker::SessionTracker;

pub use {settings::SettingsSnapshot, tracker::RecordingSession};
