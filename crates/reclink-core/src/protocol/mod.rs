//! Recorder wire protocol: typed messages and their JSON codec.

pub mod codec;
mod message;

pub use message::{Inbound, Outbound};
