//! Propagation - how speed state flows to child frames
//!
//! Three ways a child hears about state:
//! - broadcast when the authoritative state changes (or is relayed)
//! - a message at startup for frames that already exist
//! - one catch-up message once a newly attached frame finishes loading

use std::rc::Rc;

use serde_json::Value;
use timewarp_core::{FrameId, PlaybackState};
use timewarp_wire::{SyncMessage, WireResult};

use crate::{transition, ChildFrame, FrameLoadState, FrameRegistry, SyncRole};

/// Propagation statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Messages posted to children
    pub messages_sent: u64,
    /// Posts the host refused
    pub messages_dropped: u64,
    /// Sync messages applied
    pub messages_received: u64,
    /// Incoming payloads that were not ours, or not for this role
    pub messages_ignored: u64,
    /// Catch-up messages sent after a frame loaded
    pub catch_ups: u64,
}

/// Cross-document sync endpoint of one document
pub struct SyncProtocol {
    role: SyncRole,
    frames: FrameRegistry,
    /// State children should converge to; `None` until a child adopts one
    authoritative: Option<PlaybackState>,
    stats: PropagationStats,
}

impl SyncProtocol {
    pub fn new(role: SyncRole) -> Self {
        SyncProtocol {
            role,
            frames: FrameRegistry::new(),
            authoritative: None,
            stats: PropagationStats::default(),
        }
    }

    pub fn role(&self) -> SyncRole {
        self.role
    }

    pub fn frames(&self) -> &FrameRegistry {
        &self.frames
    }

    pub fn stats(&self) -> PropagationStats {
        self.stats
    }

    /// State this document hands down, if it has one
    pub fn authoritative(&self) -> Option<PlaybackState> {
        self.authoritative
    }

    /// Register frames present at startup and message them.
    ///
    /// Frames still loading are also kept awaiting, so they get the state
    /// again once their document (and its engine) is up.
    pub fn start(&mut self, existing: Vec<Rc<dyn ChildFrame>>, local: PlaybackState) -> usize {
        if self.role.originates() {
            self.authoritative = Some(local);
        }

        let mut registered = 0;
        for frame in existing {
            let load = if frame.is_loaded() {
                FrameLoadState::Synced
            } else {
                FrameLoadState::AwaitingLoad
            };
            if self.frames.add(frame.clone(), load) {
                registered += 1;
                if let Some(state) = self.authoritative {
                    self.post(&*frame, &SyncMessage::from_state(state));
                }
            }
        }

        tracing::debug!(role = ?self.role, frames = registered, "sync started");
        registered
    }

    /// A local speed change. Top documents broadcast it; children keep it local.
    pub fn originate(&mut self, state: PlaybackState) -> usize {
        if !self.role.originates() {
            return 0;
        }
        self.authoritative = Some(state);
        self.broadcast(&SyncMessage::from_state(state))
    }

    /// Handle a payload from the messaging channel.
    ///
    /// Returns the state to apply locally, or `None` for payloads that are
    /// not sync messages or that this role does not accept. An applied
    /// message is relayed unchanged to every direct child.
    pub fn receive(&mut self, payload: &Value, local: PlaybackState) -> WireResult<Option<PlaybackState>> {
        let message = match SyncMessage::decode(payload)? {
            Some(message) => message,
            None => {
                self.stats.messages_ignored += 1;
                return Ok(None);
            }
        };

        if !self.role.accepts() {
            self.stats.messages_ignored += 1;
            return Ok(None);
        }

        let next = transition(local, &message)?;
        self.authoritative = Some(next);
        self.stats.messages_received += 1;

        let relayed = self.broadcast(&message);
        tracing::debug!(speed = message.speed_multiplier, paused = message.paused, relayed, "sync message applied");

        Ok(Some(next))
    }

    /// A frame element was attached; it is messaged once it loads
    pub fn on_frame_attached(&mut self, frame: Rc<dyn ChildFrame>) {
        let id = frame.id();
        let loaded = frame.is_loaded();
        if self.frames.add(frame, FrameLoadState::AwaitingLoad) && loaded {
            self.on_frame_loaded(id);
        }
    }

    /// A child finished loading. Sends the current state once per attachment.
    pub fn on_frame_loaded(&mut self, id: FrameId) -> bool {
        let Some(state) = self.authoritative else {
            // nothing to hand down yet; mark it so a later broadcast covers it
            self.frames.take_awaiting(id);
            return false;
        };
        let Some(frame) = self.frames.take_awaiting(id) else {
            return false;
        };

        self.post(&*frame, &SyncMessage::from_state(state));
        self.stats.catch_ups += 1;
        true
    }

    pub fn on_frame_detached(&mut self, id: FrameId) -> bool {
        self.frames.remove(id)
    }

    /// Post `message` to every direct child. Returns how many posts succeeded.
    pub fn broadcast(&mut self, message: &SyncMessage) -> usize {
        let mut delivered = 0;
        for frame in self.frames.frames() {
            if self.post(&*frame, message) {
                delivered += 1;
            }
        }
        delivered
    }

    fn post(&mut self, frame: &dyn ChildFrame, message: &SyncMessage) -> bool {
        match frame.post_message(&message.encode()) {
            Ok(()) => {
                self.stats.messages_sent += 1;
                true
            }
            Err(err) => {
                tracing::trace!(frame = %frame.id(), error = %err, "sync message dropped");
                self.stats.messages_dropped += 1;
                false
            }
        }
    }
}
