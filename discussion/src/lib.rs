pub mod comment;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod merge;
pub mod models;
pub mod notify;
pub mod reconcile;
pub mod store;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
mod testing;

pub use engine::Discussion;
pub use error::{SyncError, TransportError};
pub use transport::Transport;
