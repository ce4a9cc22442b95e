//! timewarp Runtime - Engine context and poll loop
//!
//! This crate ties the engine together:
//! 1. Install: capture natives, patch the realm's time sources
//! 2. Start sync: message existing child frames
//! 3. Poll: every real frame, discover and reconcile entities
//! 4. API: set speed, pause, play, reset, read speed
//! 5. Inbound: apply sync messages from the parent document
//! 6. Teardown: stop polling and restore the natives
//!
//! An engine that could not be installed is inert: calls change nothing
//! and only invalid speeds are reported.

pub mod config;
pub mod host;
pub mod engine;
pub mod observability;

pub use config::*;
pub use host::*;
pub use engine::*;
pub use observability::*;
