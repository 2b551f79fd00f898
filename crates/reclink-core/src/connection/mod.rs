pub(crate) mod cancel;
mod heartbeat;
pub(crate) mod manager;
mod state;

pub use state::{ClientSnapshot, ConnectionState, ReconnectPolicy};
