//! Virtual clock
//!
//! The clock is a pure function of the playback state and the last
//! checkpoint. It owns two parallel timelines: monotonic (what the
//! frame scheduler and `now()` report) and wall (epoch milliseconds).
//! INVARIANT: virtual time never jumps at a checkpoint, is non-decreasing
//! while running and constant while paused.

use std::cell::RefCell;
use std::rc::Rc;

use timewarp_core::{EpochMillis, PlaybackState, RealTime, VirtualTime};

/// Clock shared between the engine and the patched time sources
pub type SharedClock = Rc<RefCell<VirtualClock>>;

/// Checkpointed real-to-virtual mapping
#[derive(Clone, Debug)]
pub struct VirtualClock {
    /// Speed and pause flag in force since the last checkpoint
    state: PlaybackState,
    /// Virtual monotonic time at the last checkpoint
    virtual_at_checkpoint: VirtualTime,
    /// Real monotonic time at the last checkpoint
    real_at_checkpoint: RealTime,
    /// Frozen monotonic reading while paused
    paused_virtual_time: VirtualTime,
    /// Virtual wall time at the last checkpoint
    wall_virtual_at_checkpoint: EpochMillis,
    /// Real wall time at the last checkpoint
    wall_real_at_checkpoint: EpochMillis,
    /// Frozen wall reading while paused
    paused_wall_time: EpochMillis,
}

impl VirtualClock {
    /// Create a clock that starts out reporting real time unchanged
    pub fn new(real_now: RealTime, wall_now: EpochMillis) -> Self {
        VirtualClock {
            state: PlaybackState::NORMAL,
            virtual_at_checkpoint: VirtualTime::from_millis(real_now.as_millis()),
            real_at_checkpoint: real_now,
            paused_virtual_time: VirtualTime::from_millis(real_now.as_millis()),
            wall_virtual_at_checkpoint: wall_now,
            wall_real_at_checkpoint: wall_now,
            paused_wall_time: wall_now,
        }
    }

    /// Wrap into the shared form used by the patched time sources
    pub fn shared(self) -> SharedClock {
        Rc::new(RefCell::new(self))
    }

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    /// Virtual monotonic time for a real monotonic reading
    pub fn now(&self, real_now: RealTime) -> VirtualTime {
        if self.state.paused {
            return self.paused_virtual_time;
        }
        let elapsed = real_now - self.real_at_checkpoint;
        self.virtual_at_checkpoint + elapsed * self.state.speed.clock_factor()
    }

    /// Virtual wall time for a real wall reading
    pub fn wall_now(&self, real_wall: EpochMillis) -> EpochMillis {
        if self.state.paused {
            return self.paused_wall_time;
        }
        let elapsed = (real_wall - self.wall_real_at_checkpoint).max(0.0);
        self.wall_virtual_at_checkpoint + elapsed * self.state.speed.clock_factor()
    }

    /// Record a checkpoint and install a new state.
    ///
    /// Both timelines are evaluated under the old state before the new one
    /// takes effect, so readings taken just before and just after agree.
    pub fn checkpoint(&mut self, real_now: RealTime, real_wall: EpochMillis, next: PlaybackState) {
        let virtual_now = self.now(real_now);
        let wall_virtual_now = self.wall_now(real_wall);

        self.virtual_at_checkpoint = virtual_now;
        self.real_at_checkpoint = real_now;
        self.wall_virtual_at_checkpoint = wall_virtual_now;
        self.wall_real_at_checkpoint = real_wall;

        if next.paused {
            self.paused_virtual_time = virtual_now;
            self.paused_wall_time = wall_virtual_now;
        }

        self.state = next;
    }
}
