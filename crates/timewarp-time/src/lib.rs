//! timewarp Time Engine - Virtual clock and time-source patch set
//!
//! This crate implements the time side of the engine:
//! - Virtual clock: checkpointed mapping from real to virtual time
//! - Time sources: one native passthrough and one patched implementation
//!   of the frame scheduler, clocks and delay-based schedulers
//! - Realm binding: the single point that swaps which implementation
//!   page code observes, guarded against double installation

pub mod clock;
pub mod sources;
pub mod realm;

pub use clock::*;
pub use sources::*;
pub use realm::*;
