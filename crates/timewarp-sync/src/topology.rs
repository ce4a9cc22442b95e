//! Topology - a document's direct frame children
//!
//! Only direct children are known. Each child is tracked from attachment
//! until detachment, along with whether it has finished loading and
//! whether it has received its one catch-up message.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;
use timewarp_core::FrameId;

/// Failure posting to a child frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Frame has no browsing context")]
    Closed,

    #[error("Host refused message: {0}")]
    Refused(String),
}

/// Messaging endpoint of a child frame's document
pub trait ChildFrame {
    fn id(&self) -> FrameId;

    /// Whether the frame's document has finished loading
    fn is_loaded(&self) -> bool;

    /// Post to the frame's window, any target origin
    fn post_message(&self, payload: &Value) -> Result<(), DeliveryError>;
}

/// Load progress of a child frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLoadState {
    /// Attached, document not loaded yet
    AwaitingLoad,
    /// Loaded and caught up with the current state
    Synced,
}

struct FrameSlot {
    frame: Rc<dyn ChildFrame>,
    load: FrameLoadState,
}

/// Direct children of one document
#[derive(Default)]
pub struct FrameRegistry {
    frames: BTreeMap<FrameId, FrameSlot>,
}

impl FrameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a child. Returns false if it was already known.
    pub fn add(&mut self, frame: Rc<dyn ChildFrame>, load: FrameLoadState) -> bool {
        let id = frame.id();
        if self.frames.contains_key(&id) {
            return false;
        }
        self.frames.insert(id, FrameSlot { frame, load });
        true
    }

    /// Forget a child
    pub fn remove(&mut self, id: FrameId) -> bool {
        self.frames.remove(&id).is_some()
    }

    /// Move an awaiting child to `Synced`, returning it if it was awaiting
    pub fn take_awaiting(&mut self, id: FrameId) -> Option<Rc<dyn ChildFrame>> {
        let slot = self.frames.get_mut(&id)?;
        if slot.load != FrameLoadState::AwaitingLoad {
            return None;
        }
        slot.load = FrameLoadState::Synced;
        Some(slot.frame.clone())
    }

    pub fn load_state(&self, id: FrameId) -> Option<FrameLoadState> {
        self.frames.get(&id).map(|slot| slot.load)
    }

    pub fn contains(&self, id: FrameId) -> bool {
        self.frames.contains_key(&id)
    }

    /// All children in id order
    pub fn frames(&self) -> Vec<Rc<dyn ChildFrame>> {
        self.frames.values().map(|slot| slot.frame.clone()).collect()
    }

    /// Children still waiting for their load event
    pub fn awaiting(&self) -> usize {
        self.frames
            .values()
            .filter(|slot| slot.load == FrameLoadState::AwaitingLoad)
            .count()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
