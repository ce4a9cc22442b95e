//! Cross-document messaging channel with chaos
//!
//! Posted payloads are queued until the world delivers them. Delivery may
//! duplicate a message or interleave messages headed to different
//! documents; messages between one pair of documents keep their order, as
//! the host's messaging channel does.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use timewarp_core::{DocumentId, FrameId};
use timewarp_sync::{ChildFrame, DeliveryError};

/// Chaos configuration
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Probability a posted message is delivered twice
    pub duplicate_prob: f64,
    /// Probability a message overtakes the one queued before it
    pub reorder_prob: f64,
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig {
            duplicate_prob: 0.0,
            reorder_prob: 0.0,
        }
    }
}

impl BusConfig {
    /// Frequent duplicates and cross-document interleaving
    pub fn hostile() -> Self {
        BusConfig {
            duplicate_prob: 0.5,
            reorder_prob: 0.5,
        }
    }
}

/// A queued message
#[derive(Clone, Debug)]
pub struct Envelope {
    pub target: DocumentId,
    pub payload: Value,
}

/// Bus statistics
#[derive(Clone, Debug, Default)]
pub struct BusStats {
    pub posted: u64,
    pub duplicated: u64,
    pub reordered: u64,
    pub delivered: u64,
}

/// Messaging channel shared by every document of a world
pub struct ChaosBus {
    config: BusConfig,
    rng: RefCell<StdRng>,
    queue: RefCell<VecDeque<Envelope>>,
    stats: RefCell<BusStats>,
}

impl ChaosBus {
    pub fn new(config: BusConfig, seed: u64) -> Self {
        ChaosBus {
            config,
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
            queue: RefCell::new(VecDeque::new()),
            stats: RefCell::new(BusStats::default()),
        }
    }

    /// Queue `payload` for `target`
    pub fn post(&self, target: DocumentId, payload: Value) {
        let mut rng = self.rng.borrow_mut();
        let mut queue = self.queue.borrow_mut();
        let mut stats = self.stats.borrow_mut();
        stats.posted += 1;

        let envelope = Envelope { target, payload };
        let overtakes = queue
            .back()
            .map_or(false, |last| last.target != target)
            && rng.gen::<f64>() < self.config.reorder_prob;

        if rng.gen::<f64>() < self.config.duplicate_prob {
            queue.push_back(envelope.clone());
            stats.duplicated += 1;
        }

        if overtakes {
            let at = queue.len().saturating_sub(1);
            queue.insert(at, envelope);
            stats.reordered += 1;
        } else {
            queue.push_back(envelope);
        }
    }

    /// Take the next message due for delivery
    pub fn next(&self) -> Option<Envelope> {
        let envelope = self.queue.borrow_mut().pop_front()?;
        self.stats.borrow_mut().delivered += 1;
        Some(envelope)
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Messages still queued for `target`
    pub fn pending_for(&self, target: DocumentId) -> Vec<Value> {
        self.queue
            .borrow()
            .iter()
            .filter(|envelope| envelope.target == target)
            .map(|envelope| envelope.payload.clone())
            .collect()
    }

    pub fn stats(&self) -> BusStats {
        self.stats.borrow().clone()
    }
}

/// Frame element in a parent document, pointing at a child document
pub struct SimFrame {
    id: FrameId,
    child: DocumentId,
    bus: Rc<ChaosBus>,
    loaded: Cell<bool>,
    closed: Cell<bool>,
}

impl SimFrame {
    pub fn new(id: FrameId, child: DocumentId, bus: Rc<ChaosBus>, loaded: bool) -> Self {
        SimFrame {
            id,
            child,
            bus,
            loaded: Cell::new(loaded),
            closed: Cell::new(false),
        }
    }

    pub fn child(&self) -> DocumentId {
        self.child
    }

    pub fn set_loaded(&self, loaded: bool) {
        self.loaded.set(loaded);
    }

    /// The frame's browsing context is gone
    pub fn close(&self) {
        self.closed.set(true);
    }
}

impl ChildFrame for SimFrame {
    fn id(&self) -> FrameId {
        self.id
    }

    fn is_loaded(&self) -> bool {
        self.loaded.get()
    }

    fn post_message(&self, payload: &Value) -> Result<(), DeliveryError> {
        if self.closed.get() {
            return Err(DeliveryError::Closed);
        }
        self.bus.post(self.child, payload.clone());
        Ok(())
    }
}
