//! Simulated browser world
//!
//! A tree of documents sharing one real clock and one messaging channel.
//! Each `step` is one real frame: advance real time, fire due timers, run
//! frame callbacks, let entities progress, then drain the messaging
//! channel.

use std::collections::BTreeMap;
use std::rc::Rc;

use timewarp_core::{DocumentId, FrameId};
use timewarp_runtime::{Engine, EngineConfig};
use timewarp_time::{Realm, TimeSources};

use crate::{BusConfig, ChaosBus, SimClock, SimDocument, SimFrame, SimPlatform};

/// Real frame interval of a 60 Hz display
pub const FRAME_MS: f64 = 16.0;

/// Upper bound on messages handled by one `deliver` call
const MAX_DELIVERIES: usize = 10_000;

/// One document with its host primitives and engine
pub struct SimPage {
    pub document: Rc<SimDocument>,
    pub platform: Rc<SimPlatform>,
    pub realm: Rc<Realm>,
    /// Frame element hosting this document in its parent
    pub parent: Option<(DocumentId, FrameId)>,
    engine: Option<Engine>,
}

/// World statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub steps: u64,
    pub deliveries: u64,
    /// Messages for documents without an engine
    pub unhandled: u64,
}

pub struct SimWorld {
    clock: SimClock,
    bus: Rc<ChaosBus>,
    pages: BTreeMap<DocumentId, SimPage>,
    next_document: u64,
    next_frame: u64,
    stats: WorldStats,
}

impl SimWorld {
    /// World with a well-behaved messaging channel
    pub fn new() -> Self {
        Self::with_bus(BusConfig::default(), 0)
    }

    pub fn with_bus(config: BusConfig, seed: u64) -> Self {
        SimWorld {
            clock: SimClock::new(),
            bus: Rc::new(ChaosBus::new(config, seed)),
            pages: BTreeMap::new(),
            next_document: 0,
            next_frame: 0,
            stats: WorldStats::default(),
        }
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn bus(&self) -> &Rc<ChaosBus> {
        &self.bus
    }

    pub fn stats(&self) -> WorldStats {
        self.stats
    }

    /// Real monotonic time
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Add a top-level document
    pub fn add_top_document(&mut self) -> DocumentId {
        let platform = SimPlatform::new(self.clock.clone());
        self.add_page(true, platform, None)
    }

    /// Add a top-level document whose realm has no frame scheduler
    pub fn add_frameless_document(&mut self) -> DocumentId {
        let platform = SimPlatform::without_frames(self.clock.clone());
        self.add_page(true, platform, None)
    }

    /// Attach a frame element to `parent` hosting a new child document.
    ///
    /// The parent's engine, if any, is told about the frame.
    pub fn add_child_document(&mut self, parent: DocumentId, loaded: bool) -> (DocumentId, FrameId) {
        self.next_frame += 1;
        let frame_id = FrameId::new(self.next_frame);

        let platform = SimPlatform::new(self.clock.clone());
        let child = self.add_page(false, platform, Some((parent, frame_id)));
        let frame = Rc::new(SimFrame::new(frame_id, child, self.bus.clone(), loaded));

        if let Some(page) = self.pages.get(&parent) {
            page.document.attach_frame(&frame);
            if let Some(engine) = &page.engine {
                engine.on_frame_attached(frame);
            }
        }
        (child, frame_id)
    }

    /// Fire the load event of the frame hosting `child`
    pub fn load_frame(&mut self, child: DocumentId) {
        let Some((parent, frame_id)) = self.page(child).and_then(|page| page.parent) else {
            return;
        };
        let Some(page) = self.pages.get(&parent) else {
            return;
        };
        if let Some(frame) = page.document.frame(frame_id) {
            frame.set_loaded(true);
        }
        if let Some(engine) = &page.engine {
            engine.on_frame_loaded(frame_id);
        }
    }

    /// Remove the frame element hosting `child` from its parent
    pub fn detach_frame(&mut self, child: DocumentId) {
        let Some((parent, frame_id)) = self.page(child).and_then(|page| page.parent) else {
            return;
        };
        let Some(page) = self.pages.get(&parent) else {
            return;
        };
        if let Some(frame) = page.document.detach_frame(frame_id) {
            frame.close();
        }
        if let Some(engine) = &page.engine {
            engine.on_frame_detached(frame_id);
        }
    }

    /// Install an engine into a document's realm
    pub fn install(&mut self, id: DocumentId, config: EngineConfig) -> Option<Engine> {
        let page = self.pages.get_mut(&id)?;
        let engine = Engine::install(page.document.clone(), page.realm.clone(), config);
        page.engine = Some(engine.clone());
        Some(engine)
    }

    pub fn page(&self, id: DocumentId) -> Option<&SimPage> {
        self.pages.get(&id)
    }

    pub fn engine(&self, id: DocumentId) -> Option<Engine> {
        self.page(id).and_then(|page| page.engine.clone())
    }

    pub fn document(&self, id: DocumentId) -> Option<Rc<SimDocument>> {
        self.page(id).map(|page| page.document.clone())
    }

    /// The time sources page code in `id` currently sees
    pub fn sources(&self, id: DocumentId) -> Option<Rc<dyn TimeSources>> {
        self.page(id).map(|page| page.realm.sources())
    }

    /// One real frame of `dt_ms`
    pub fn step(&mut self, dt_ms: f64) {
        self.clock.advance(dt_ms);
        for page in self.pages.values() {
            page.platform.run_timers();
            page.platform.run_frame();
            page.document.advance(dt_ms);
        }
        self.deliver();
        self.stats.steps += 1;
    }

    /// Step at the display frame rate for `total_ms` of real time
    pub fn run_for(&mut self, total_ms: f64) {
        let mut elapsed = 0.0;
        while elapsed + FRAME_MS <= total_ms {
            self.step(FRAME_MS);
            elapsed += FRAME_MS;
        }
        if total_ms > elapsed {
            self.step(total_ms - elapsed);
        }
    }

    /// Hand queued messages to their documents, including relays they
    /// trigger. Returns the number of messages handled.
    pub fn deliver(&mut self) -> usize {
        let mut handled = 0;
        while handled < MAX_DELIVERIES {
            let Some(envelope) = self.bus.next() else {
                break;
            };
            handled += 1;

            match self.engine(envelope.target) {
                Some(engine) => {
                    engine.on_message(&envelope.payload);
                    self.stats.deliveries += 1;
                }
                None => self.stats.unhandled += 1,
            }
        }
        handled
    }

    fn add_page(
        &mut self,
        top_level: bool,
        platform: SimPlatform,
        parent: Option<(DocumentId, FrameId)>,
    ) -> DocumentId {
        self.next_document += 1;
        let id = DocumentId::new(self.next_document);

        let platform = Rc::new(platform);
        let realm = Rc::new(Realm::new(platform.clone()));
        self.pages.insert(
            id,
            SimPage {
                document: Rc::new(SimDocument::new(id, top_level)),
                platform,
                realm,
                parent,
                engine: None,
            },
        );
        id
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}
