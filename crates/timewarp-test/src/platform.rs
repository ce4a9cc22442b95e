//! Simulated host primitives
//!
//! Real time only moves when the test advances it. Frame requests wait
//! for the next simulated frame; timers fire once real time reaches them.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use timewarp_core::{FrameHandle, TimerHandle};
use timewarp_time::{FrameCallback, IntervalCallback, Platform, TimeoutCallback};

/// Wall clock reading at simulated time zero
pub const SIM_EPOCH_MS: f64 = 1_700_000_000_000.0;

/// Shortest repeat interval the simulated host honors
pub const MIN_INTERVAL_MS: f64 = 1.0;

/// Manually advanced real clock shared by every document of a world
#[derive(Clone, Debug, Default)]
pub struct SimClock {
    now: Rc<Cell<f64>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Real monotonic time in milliseconds
    pub fn now(&self) -> f64 {
        self.now.get()
    }

    pub fn advance(&self, dt_ms: f64) {
        self.now.set(self.now.get() + dt_ms.max(0.0));
    }

    pub fn wall(&self) -> f64 {
        SIM_EPOCH_MS + self.now.get()
    }
}

enum TimerKind {
    Once(TimeoutCallback),
    Repeat {
        interval: f64,
        callback: IntervalCallback,
    },
}

struct SimTimer {
    handle: TimerHandle,
    due: f64,
    kind: TimerKind,
}

/// Host statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlatformStats {
    pub frames_run: u64,
    pub frame_callbacks: u64,
    pub timers_fired: u64,
}

/// One document's host primitives
pub struct SimPlatform {
    clock: SimClock,
    frame_scheduler: bool,
    next_handle: Cell<u64>,
    frames: RefCell<Vec<(FrameHandle, FrameCallback)>>,
    timers: RefCell<Vec<SimTimer>>,
    /// Timers cleared while their callback was running
    cleared: RefCell<HashSet<TimerHandle>>,
    stats: Cell<PlatformStats>,
}

impl SimPlatform {
    pub fn new(clock: SimClock) -> Self {
        SimPlatform {
            clock,
            frame_scheduler: true,
            next_handle: Cell::new(0),
            frames: RefCell::new(Vec::new()),
            timers: RefCell::new(Vec::new()),
            cleared: RefCell::new(HashSet::new()),
            stats: Cell::new(PlatformStats::default()),
        }
    }

    /// A realm without a frame scheduler, such as a worker
    pub fn without_frames(clock: SimClock) -> Self {
        SimPlatform {
            frame_scheduler: false,
            ..Self::new(clock)
        }
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn stats(&self) -> PlatformStats {
        self.stats.get()
    }

    /// Outstanding frame requests
    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Outstanding timers
    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Run every frame callback requested before this call.
    /// Requests made by those callbacks wait for the next frame.
    pub fn run_frame(&self) -> usize {
        let due: Vec<(FrameHandle, FrameCallback)> = self.frames.borrow_mut().drain(..).collect();
        let count = due.len();
        let timestamp = self.clock.now();
        for (_, callback) in due {
            callback(timestamp);
        }

        let mut stats = self.stats.get();
        stats.frames_run += 1;
        stats.frame_callbacks += count as u64;
        self.stats.set(stats);
        count
    }

    /// Fire every timer due at the current real time, earliest first
    pub fn run_timers(&self) -> usize {
        let now = self.clock.now();
        let mut fired = 0;

        while let Some(timer) = self.take_due(now) {
            fired += 1;
            match timer.kind {
                TimerKind::Once(callback) => callback(),
                TimerKind::Repeat {
                    interval,
                    mut callback,
                } => {
                    callback();
                    if !self.cleared.borrow_mut().remove(&timer.handle) {
                        self.timers.borrow_mut().push(SimTimer {
                            handle: timer.handle,
                            due: timer.due + interval,
                            kind: TimerKind::Repeat { interval, callback },
                        });
                    }
                }
            }
        }

        let mut stats = self.stats.get();
        stats.timers_fired += fired;
        self.stats.set(stats);
        fired as usize
    }

    fn take_due(&self, now: f64) -> Option<SimTimer> {
        let mut timers = self.timers.borrow_mut();
        let index = timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due))
            .map(|(index, _)| index)?;
        Some(timers.remove(index))
    }

    fn allocate(&self) -> u64 {
        self.next_handle.set(self.next_handle.get() + 1);
        self.next_handle.get()
    }

    fn push_timer(&self, delay_ms: f64, kind: TimerKind) -> TimerHandle {
        let handle = TimerHandle(self.allocate());
        self.timers.borrow_mut().push(SimTimer {
            handle,
            due: self.clock.now() + delay_ms.max(0.0),
            kind,
        });
        handle
    }

    fn remove_timer(&self, handle: TimerHandle) {
        let mut timers = self.timers.borrow_mut();
        let before = timers.len();
        timers.retain(|timer| timer.handle != handle);
        if timers.len() == before {
            // possibly running right now
            self.cleared.borrow_mut().insert(handle);
        }
    }
}

impl Platform for SimPlatform {
    fn has_frame_scheduler(&self) -> bool {
        self.frame_scheduler
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let handle = FrameHandle(self.allocate());
        self.frames.borrow_mut().push((handle, callback));
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.frames.borrow_mut().retain(|(h, _)| *h != handle);
    }

    fn monotonic_now(&self) -> f64 {
        self.clock.now()
    }

    fn wall_now(&self) -> f64 {
        self.clock.wall()
    }

    fn set_timeout(&self, callback: TimeoutCallback, delay_ms: f64) -> TimerHandle {
        self.push_timer(delay_ms, TimerKind::Once(callback))
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        self.remove_timer(handle)
    }

    fn set_interval(&self, callback: IntervalCallback, interval_ms: f64) -> TimerHandle {
        let interval = interval_ms.max(MIN_INTERVAL_MS);
        self.push_timer(interval, TimerKind::Repeat { interval, callback })
    }

    fn clear_interval(&self, handle: TimerHandle) {
        self.remove_timer(handle)
    }
}
