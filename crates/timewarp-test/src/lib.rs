//! timewarp Test Harness - Simulated browser world
//!
//! This crate provides:
//! - A manually advanced real clock with per-document frame and timer queues
//! - Documents holding animations, media elements and child frames
//! - A chaotic cross-document messaging channel
//! - A world driver stepping all of it one real frame at a time

pub mod platform;
pub mod entities;
pub mod bus;
pub mod document;
pub mod world;

pub use platform::*;
pub use entities::*;
pub use bus::*;
pub use document::*;
pub use world::*;

use tracing_subscriber::EnvFilter;

/// Route engine logs to the test output. Safe to call from every test.
pub fn init_test_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("timewarp=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
