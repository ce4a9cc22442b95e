//! timewarp Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout timewarp:
//! - Identifiers (DocumentId, FrameId)
//! - Time primitives (RealTime, VirtualTime, EpochMillis)
//! - Speed multiplier and playback state
//! - Platform constants and error types

pub mod id;
pub mod time;
pub mod speed;
pub mod error;

pub use id::*;
pub use time::*;
pub use speed::*;
pub use error::*;
