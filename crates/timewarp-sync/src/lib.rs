//! timewarp Cross-Document Sync
//!
//! Speed state propagation from a top document down through nested frames.
//!
//! # Roles
//!
//! Top document: owns the authoritative state and is the only originator.
//! Child document: applies an incoming message exactly like a local speed
//! change, then relays the same message to its own direct children.
//!
//! A document only ever talks to its direct children, so propagation does
//! not depend on nesting depth. Delivery is one-way and best effort; every
//! receiver's transition is a pure function of (message, local state), so
//! repeated or reordered delivery is harmless.

pub mod role;
pub mod topology;
pub mod propagation;

pub use role::*;
pub use topology::*;
pub use propagation::*;
