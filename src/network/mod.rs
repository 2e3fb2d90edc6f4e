//! Network subsystem: listener, connection tasks and frame pacing

pub mod pacer;
pub mod server;

pub use pacer::{Pacer, PacerStats};
pub use server::StationServer;
