//! Infrastructure adapters: content loading, document rendering, telemetry.

pub mod error;
pub mod loader;
pub mod output;
pub mod telemetry;
