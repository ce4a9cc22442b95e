//! timewarp Engine - one installation in one document
//!
//! The engine is a shared context object. Clones are cheap handles onto the
//! same installation; the poll loop holds only a weak handle, so dropping
//! every clone tears the installation down.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::Value;
use timewarp_core::{
    EpochMillis, FrameHandle, FrameId, PlaybackState, RealTime, Speed, TimewarpResult,
};
use timewarp_state::{RateTracker, ReconciliationResult};
use timewarp_sync::{ChildFrame, PropagationStats, SyncProtocol, SyncRole};
use timewarp_time::{Installation, Realm, SharedClock, VirtualClock};

use crate::{DocumentHost, EngineConfig, RoleConfig};

/// Engine statistics
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineStats {
    /// Real frames the poll loop ran on
    pub frames: u64,
    /// Discovery passes (poll frames and explicit passes)
    pub passes: u64,
    /// Playback state transitions, local or received
    pub speed_changes: u64,
    /// Sync messages applied
    pub messages_applied: u64,
    /// Marked sync messages that failed to decode
    pub messages_rejected: u64,
    /// Totals over every pass and reapply
    pub reconciliation: ReconciliationResult,
    /// Propagation counters of the sync endpoint
    pub sync: PropagationStats,
}

/// State that only exists while installed
struct Active {
    clock: SharedClock,
    installation: Installation,
    tracker: RateTracker,
    sync: SyncProtocol,
    /// Outstanding native frame request of the poll loop
    poll: Option<FrameHandle>,
}

impl Active {
    fn state(&self) -> PlaybackState {
        self.clock.borrow().state()
    }

    /// Re-anchor the clock at the current real instant under `next`
    fn checkpoint(&self, next: PlaybackState) {
        let natives = self.installation.natives();
        let real = RealTime::from_millis(natives.monotonic_now());
        let wall = EpochMillis::from_millis(natives.wall_now());
        self.clock.borrow_mut().checkpoint(real, wall, next);
    }
}

struct EngineInner {
    config: EngineConfig,
    host: Rc<dyn DocumentHost>,
    realm: Rc<Realm>,
    active: RefCell<Option<Active>>,
    stats: RefCell<EngineStats>,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            if let Some(handle) = active.poll {
                active.installation.natives().cancel_frame(handle);
            }
            self.realm.uninstall(&active.installation);
        }
    }
}

/// Virtual time engine of one document
#[derive(Clone)]
pub struct Engine {
    inner: Rc<EngineInner>,
}

impl Engine {
    /// Install into `realm` on behalf of `host`.
    ///
    /// If the realm cannot be patched (no frame scheduler, or the guard is
    /// already taken) the returned engine is inert.
    pub fn install(host: Rc<dyn DocumentHost>, realm: Rc<Realm>, config: EngineConfig) -> Engine {
        let natives = realm.natives();
        let clock = VirtualClock::new(
            RealTime::from_millis(natives.monotonic_now()),
            EpochMillis::from_millis(natives.wall_now()),
        )
        .shared();

        let active = match realm.install(&config.install_key, clock.clone()) {
            Ok(installation) => {
                let role = match config.role {
                    RoleConfig::Auto if host.is_top_level() => SyncRole::Top,
                    RoleConfig::Auto => SyncRole::Child,
                    RoleConfig::Top => SyncRole::Top,
                    RoleConfig::Child => SyncRole::Child,
                };

                let mut sync = SyncProtocol::new(role);
                let initial = clock.borrow().state();
                let frames = sync.start(host.child_frames(), initial);

                tracing::info!(document = %host.id(), ?role, frames, "timewarp installed");
                Some(Active {
                    clock,
                    installation,
                    tracker: RateTracker::new(config.exclusion_attribute.clone()),
                    sync,
                    poll: None,
                })
            }
            Err(err) => {
                tracing::warn!(document = %host.id(), error = %err, "timewarp inert");
                None
            }
        };

        let poll = config.poll;
        let engine = Engine {
            inner: Rc::new(EngineInner {
                config,
                host,
                realm,
                active: RefCell::new(active),
                stats: RefCell::new(EngineStats::default()),
            }),
        };

        if poll {
            engine.schedule_poll();
        }
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Whether the engine patched its realm and is still installed
    pub fn is_active(&self) -> bool {
        self.inner.active.borrow().is_some()
    }

    /// Sync role, if installed
    pub fn role(&self) -> Option<SyncRole> {
        self.inner.active.borrow().as_ref().map(|active| active.sync.role())
    }

    /// Set the global multiplier. Zero pauses and keeps the resume multiplier.
    pub fn set_speed(&self, multiplier: f64) -> TimewarpResult<()> {
        let speed = Speed::new(multiplier)?;
        if let Some(current) = self.active_state() {
            self.transition(current.with_speed(speed), true);
        }
        Ok(())
    }

    pub fn pause(&self) {
        if let Some(current) = self.active_state() {
            self.transition(current.with_paused(true), true);
        }
    }

    /// Resume at the last non-zero multiplier
    pub fn play(&self) {
        if let Some(current) = self.active_state() {
            self.transition(current.with_paused(false), true);
        }
    }

    /// Back to real-time playback
    pub fn reset(&self) {
        if self.is_active() {
            self.transition(PlaybackState::NORMAL, true);
        }
    }

    /// Observable multiplier: zero while paused, 1 when inert
    pub fn get_speed(&self) -> f64 {
        self.active_state()
            .map_or(1.0, |state| state.multiplier())
    }

    pub fn state(&self) -> PlaybackState {
        self.active_state().unwrap_or(PlaybackState::NORMAL)
    }

    /// Monotonic time as page code observes it right now
    pub fn virtual_now(&self) -> f64 {
        self.inner.realm.sources().monotonic_now()
    }

    /// Number of tracked animations and media elements
    pub fn tracked(&self) -> (usize, usize) {
        self.inner
            .active
            .borrow()
            .as_ref()
            .map_or((0, 0), |active| active.tracker.tracked())
    }

    pub fn stats(&self) -> EngineStats {
        let mut stats = self.inner.stats.borrow().clone();
        if let Some(active) = self.inner.active.borrow().as_ref() {
            stats.sync = active.sync.stats();
        }
        stats
    }

    /// Run one discovery pass over everything the host currently has
    pub fn reconcile_now(&self) -> ReconciliationResult {
        let animations = self.inner.host.animations();
        let media = self.inner.host.media_elements();

        let result = {
            let mut guard = self.inner.active.borrow_mut();
            let Some(active) = guard.as_mut() else {
                return ReconciliationResult::default();
            };
            let state = active.state();
            active.tracker.pass(&animations, &media, state)
        };

        let mut stats = self.inner.stats.borrow_mut();
        stats.passes += 1;
        stats.reconciliation.merge(&result);
        result
    }

    /// Inbound payload from the messaging channel
    pub fn on_message(&self, payload: &Value) {
        let outcome = {
            let mut guard = self.inner.active.borrow_mut();
            let Some(active) = guard.as_mut() else {
                return;
            };
            let local = active.state();
            active.sync.receive(payload, local)
        };

        match outcome {
            Ok(Some(next)) => {
                self.inner.stats.borrow_mut().messages_applied += 1;
                self.transition(next, false);
            }
            Ok(None) => {}
            Err(err) => {
                self.inner.stats.borrow_mut().messages_rejected += 1;
                tracing::warn!(document = %self.inner.host.id(), error = %err, "sync message dropped");
            }
        }
    }

    pub fn on_frame_attached(&self, frame: Rc<dyn ChildFrame>) {
        if let Some(active) = self.inner.active.borrow_mut().as_mut() {
            active.sync.on_frame_attached(frame);
        }
    }

    pub fn on_frame_loaded(&self, id: FrameId) {
        if let Some(active) = self.inner.active.borrow_mut().as_mut() {
            active.sync.on_frame_loaded(id);
        }
    }

    pub fn on_frame_detached(&self, id: FrameId) {
        if let Some(active) = self.inner.active.borrow_mut().as_mut() {
            active.sync.on_frame_detached(id);
        }
    }

    /// Stop polling, restore the realm's natives and release the guard.
    /// The engine is inert afterwards.
    pub fn shutdown(&self) {
        let taken = self.inner.active.borrow_mut().take();
        let Some(active) = taken else {
            return;
        };

        if let Some(handle) = active.poll {
            active.installation.natives().cancel_frame(handle);
        }
        self.inner.realm.uninstall(&active.installation);

        tracing::info!(document = %self.inner.host.id(), "timewarp removed");
    }

    fn active_state(&self) -> Option<PlaybackState> {
        self.inner.active.borrow().as_ref().map(Active::state)
    }

    /// Checkpoint the clock, bring tracked entities in line synchronously,
    /// then hand the state down when this document originates it.
    fn transition(&self, next: PlaybackState, originate: bool) {
        let (previous, result, sent) = {
            let mut guard = self.inner.active.borrow_mut();
            let Some(active) = guard.as_mut() else {
                return;
            };
            let previous = active.state();
            active.checkpoint(next);
            let result = active.tracker.reapply(next);
            let sent = if originate { active.sync.originate(next) } else { 0 };
            (previous, result, sent)
        };

        {
            let mut stats = self.inner.stats.borrow_mut();
            stats.speed_changes += 1;
            stats.reconciliation.merge(&result);
        }

        tracing::info!(
            document = %self.inner.host.id(),
            from = previous.multiplier(),
            to = next.multiplier(),
            writes = result.writes,
            sent,
            "speed changed"
        );
    }

    /// Request the next real frame for the poll loop
    fn schedule_poll(&self) {
        let weak: Weak<EngineInner> = Rc::downgrade(&self.inner);
        let mut guard = self.inner.active.borrow_mut();
        let Some(active) = guard.as_mut() else {
            return;
        };

        let handle = active.installation.natives().request_frame(Box::new(move |_real_ts| {
            if let Some(inner) = weak.upgrade() {
                Engine { inner }.poll_frame();
            }
        }));
        active.poll = Some(handle);
    }

    fn poll_frame(&self) {
        if let Some(active) = self.inner.active.borrow_mut().as_mut() {
            active.poll = None;
        } else {
            return;
        }

        self.inner.stats.borrow_mut().frames += 1;
        let result = self.reconcile_now();
        if result.failed > 0 {
            tracing::debug!(failed = result.failed, "entities failed during pass");
        }

        self.schedule_poll();
    }
}
