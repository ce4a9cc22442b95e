//! timewarp State Engine - Entity rate tracking and reconciliation
//!
//! This crate implements the Entity Rate Tracker:
//! - Host entity traits (animations, media elements, elements)
//! - Identity-keyed weak bookkeeping that vanishes with its subject
//! - Interference detection against third-party rate writes
//! - Play/pause reconciliation and immediate completion
//! - Declarative exclusion by ancestor attribute

pub mod entity;
pub mod table;
pub mod reconcile;

pub use entity::*;
pub use table::*;
pub use reconcile::*;
