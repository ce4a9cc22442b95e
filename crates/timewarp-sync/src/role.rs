//! Roles - who may originate speed state

use timewarp_core::PlaybackState;
use timewarp_wire::{SyncMessage, WireResult};

/// Position of a document in the frame tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncRole {
    /// Top-level document; originates state, ignores incoming sync messages
    Top,
    /// Framed document; adopts and relays what its parent sends
    Child,
}

impl SyncRole {
    /// Whether local speed changes are broadcast to children
    pub fn originates(self) -> bool {
        self == SyncRole::Top
    }

    /// Whether incoming sync messages are applied
    pub fn accepts(self) -> bool {
        self == SyncRole::Child
    }
}

/// State a receiver moves to on `message`, given its current state.
///
/// A zero multiplier pauses and keeps the receiver's resume multiplier.
pub fn transition(local: PlaybackState, message: &SyncMessage) -> WireResult<PlaybackState> {
    let speed = message.speed()?;
    let next = local.with_speed(speed);
    Ok(if message.paused {
        next.with_paused(true)
    } else {
        next
    })
}
