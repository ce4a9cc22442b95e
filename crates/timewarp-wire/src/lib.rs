//! timewarp Wire Format - Cross-document sync messages
//!
//! This crate implements the message exchanged between a document and its
//! direct frame children:
//! - Fixed schema `{ kind, speedMultiplier, paused }`
//! - Sync marker discriminating our messages from page traffic
//! - JSON codec over the host's cross-document messaging channel

pub mod error;
pub mod message;

pub use error::*;
pub use message::*;
