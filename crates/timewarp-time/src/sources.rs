//! Time sources - the ambient entry points page code schedules against
//!
//! `TimeSources` is the interface page code observes. It has exactly two
//! implementations: `NativeTimeSources`, a passthrough to the host
//! primitives, and `VirtualTimeSources`, which reports virtual time and
//! scales delays while delegating the real work to the captured natives.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use timewarp_core::{EpochMillis, FrameHandle, RealTime, TimerHandle};

use crate::SharedClock;

/// Frame callback, invoked with a timestamp in milliseconds
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// One-shot delayed callback
pub type TimeoutCallback = Box<dyn FnOnce()>;

/// Repeating delayed callback
pub type IntervalCallback = Box<dyn FnMut()>;

/// Host primitives, as found in the realm before anything is patched
pub trait Platform {
    /// Whether the realm provides a frame scheduler at all
    fn has_frame_scheduler(&self) -> bool;

    fn request_frame(&self, callback: FrameCallback) -> FrameHandle;

    fn cancel_frame(&self, handle: FrameHandle);

    /// Monotonic clock, milliseconds since the realm's time origin
    fn monotonic_now(&self) -> f64;

    /// Wall clock, milliseconds since the Unix epoch
    fn wall_now(&self) -> f64;

    fn set_timeout(&self, callback: TimeoutCallback, delay_ms: f64) -> TimerHandle;

    fn clear_timeout(&self, handle: TimerHandle);

    fn set_interval(&self, callback: IntervalCallback, interval_ms: f64) -> TimerHandle;

    fn clear_interval(&self, handle: TimerHandle);
}

/// Time-producing entry points as bound in a realm
pub trait TimeSources {
    fn has_frame_scheduler(&self) -> bool;

    fn request_frame(&self, callback: FrameCallback) -> FrameHandle;

    fn cancel_frame(&self, handle: FrameHandle);

    fn monotonic_now(&self) -> f64;

    fn wall_now(&self) -> f64;

    fn set_timeout(&self, callback: TimeoutCallback, delay_ms: f64) -> TimerHandle;

    fn clear_timeout(&self, handle: TimerHandle);

    fn set_interval(&self, callback: IntervalCallback, interval_ms: f64) -> TimerHandle;

    fn clear_interval(&self, handle: TimerHandle);
}

/// Passthrough to the host primitives
pub struct NativeTimeSources {
    platform: Rc<dyn Platform>,
}

impl NativeTimeSources {
    pub fn new(platform: Rc<dyn Platform>) -> Self {
        NativeTimeSources { platform }
    }
}

impl TimeSources for NativeTimeSources {
    fn has_frame_scheduler(&self) -> bool {
        self.platform.has_frame_scheduler()
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        self.platform.request_frame(callback)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.platform.cancel_frame(handle)
    }

    fn monotonic_now(&self) -> f64 {
        self.platform.monotonic_now()
    }

    fn wall_now(&self) -> f64 {
        self.platform.wall_now()
    }

    fn set_timeout(&self, callback: TimeoutCallback, delay_ms: f64) -> TimerHandle {
        self.platform.set_timeout(callback, delay_ms)
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        self.platform.clear_timeout(handle)
    }

    fn set_interval(&self, callback: IntervalCallback, interval_ms: f64) -> TimerHandle {
        self.platform.set_interval(callback, interval_ms)
    }

    fn clear_interval(&self, handle: TimerHandle) {
        self.platform.clear_interval(handle)
    }
}

/// Patched frame handles, mapped to whichever native request is pending
#[derive(Debug, Default)]
struct FrameTable {
    next_handle: u64,
    pending: HashMap<FrameHandle, FrameHandle>,
}

impl FrameTable {
    fn allocate(&mut self) -> FrameHandle {
        self.next_handle += 1;
        FrameHandle(self.next_handle)
    }
}

/// Patched time sources reporting virtual time
pub struct VirtualTimeSources {
    natives: Rc<dyn TimeSources>,
    clock: SharedClock,
    frames: Rc<RefCell<FrameTable>>,
}

impl VirtualTimeSources {
    pub fn new(natives: Rc<dyn TimeSources>, clock: SharedClock) -> Self {
        VirtualTimeSources {
            natives,
            clock,
            frames: Rc::new(RefCell::new(FrameTable::default())),
        }
    }

    /// Frame requests issued through this binding that have not fired yet
    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().pending.len()
    }

    /// Issue (or reissue) the native request behind a patched handle.
    ///
    /// While paused the wrapper does not run the page callback; it requests
    /// another real frame and keeps the same patched handle.
    fn schedule(
        natives: Rc<dyn TimeSources>,
        clock: SharedClock,
        frames: Rc<RefCell<FrameTable>>,
        handle: FrameHandle,
        callback: FrameCallback,
    ) {
        let wrapper_natives = natives.clone();
        let wrapper_clock = clock.clone();
        let wrapper_frames = frames.clone();

        let native = natives.request_frame(Box::new(move |real_ts| {
            let (paused, virtual_ts) = {
                let clock = wrapper_clock.borrow();
                (clock.is_paused(), clock.now(RealTime::from_millis(real_ts)))
            };

            if paused {
                Self::schedule(wrapper_natives, wrapper_clock, wrapper_frames, handle, callback);
                return;
            }

            wrapper_frames.borrow_mut().pending.remove(&handle);
            callback(virtual_ts.as_millis());
        }));

        frames.borrow_mut().pending.insert(handle, native);
    }

    fn scaled_delay(&self, delay_ms: f64) -> f64 {
        let factor = self.clock.borrow().state().delay_factor();
        delay_ms.max(0.0) / factor
    }
}

impl TimeSources for VirtualTimeSources {
    fn has_frame_scheduler(&self) -> bool {
        self.natives.has_frame_scheduler()
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let handle = self.frames.borrow_mut().allocate();
        Self::schedule(
            self.natives.clone(),
            self.clock.clone(),
            self.frames.clone(),
            handle,
            callback,
        );
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        let native = self.frames.borrow_mut().pending.remove(&handle);
        if let Some(native) = native {
            self.natives.cancel_frame(native);
        }
    }

    fn monotonic_now(&self) -> f64 {
        let real = RealTime::from_millis(self.natives.monotonic_now());
        self.clock.borrow().now(real).as_millis()
    }

    fn wall_now(&self) -> f64 {
        let real = EpochMillis::from_millis(self.natives.wall_now());
        self.clock.borrow().wall_now(real).as_millis()
    }

    fn set_timeout(&self, callback: TimeoutCallback, delay_ms: f64) -> TimerHandle {
        let delay = self.scaled_delay(delay_ms);
        self.natives.set_timeout(callback, delay)
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        self.natives.clear_timeout(handle)
    }

    fn set_interval(&self, callback: IntervalCallback, interval_ms: f64) -> TimerHandle {
        let interval = self.scaled_delay(interval_ms);
        self.natives.set_interval(callback, interval)
    }

    fn clear_interval(&self, handle: TimerHandle) {
        self.natives.clear_interval(handle)
    }
}
