//! Realm binding - which time sources page code currently observes
//!
//! Installation is the only place the binding is swapped. The native
//! sources are captured once per realm and kept in a shared stash, so an
//! independent installation layered on top of an earlier one takes over
//! from the natives instead of wrapping the earlier patch. Removing the
//! layer that owns the binding hands it back to the newest layer left.

use std::cell::RefCell;
use std::rc::Rc;

use timewarp_core::{TimewarpError, TimewarpResult};

use crate::{NativeTimeSources, Platform, SharedClock, TimeSources, VirtualTimeSources};

/// Address identity of a trait object
fn same_binding(a: &Rc<dyn TimeSources>, b: &Rc<dyn TimeSources>) -> bool {
    std::ptr::eq(
        Rc::as_ptr(a) as *const (),
        Rc::as_ptr(b) as *const (),
    )
}

/// One live installation
struct Layer {
    guard: String,
    patched: Rc<dyn TimeSources>,
}

/// A realm's global time bindings
pub struct Realm {
    /// Binding page code calls through
    binding: RefCell<Rc<dyn TimeSources>>,
    /// Natives captured by the first installation
    natives: RefCell<Option<Rc<dyn TimeSources>>>,
    /// Installations currently active in this realm, oldest first
    layers: RefCell<Vec<Layer>>,
}

impl Realm {
    /// Create a realm bound to the host primitives
    pub fn new(platform: Rc<dyn Platform>) -> Self {
        Realm {
            binding: RefCell::new(Rc::new(NativeTimeSources::new(platform))),
            natives: RefCell::new(None),
            layers: RefCell::new(Vec::new()),
        }
    }

    /// Current binding, as page code would see it
    pub fn sources(&self) -> Rc<dyn TimeSources> {
        self.binding.borrow().clone()
    }

    /// Whether an installation under `guard` is active
    pub fn is_installed(&self, guard: &str) -> bool {
        self.layers.borrow().iter().any(|layer| layer.guard == guard)
    }

    /// Native sources, captured on first use
    pub fn natives(&self) -> Rc<dyn TimeSources> {
        let mut stash = self.natives.borrow_mut();
        stash
            .get_or_insert_with(|| self.binding.borrow().clone())
            .clone()
    }

    /// Patch the realm so page code observes `clock`.
    ///
    /// Fails without touching the realm when it has no frame scheduler or
    /// when `guard` is already installed.
    pub fn install(&self, guard: &str, clock: SharedClock) -> TimewarpResult<Installation> {
        if self.is_installed(guard) {
            return Err(TimewarpError::AlreadyInstalled(guard.to_string()));
        }

        let natives = self.natives();
        if !natives.has_frame_scheduler() {
            return Err(TimewarpError::UnsupportedRealm("no frame scheduler"));
        }

        let patched: Rc<dyn TimeSources> = Rc::new(VirtualTimeSources::new(natives.clone(), clock));
        *self.binding.borrow_mut() = patched.clone();
        self.layers.borrow_mut().push(Layer {
            guard: guard.to_string(),
            patched: patched.clone(),
        });

        tracing::debug!(guard, "time sources patched");

        Ok(Installation {
            guard: guard.to_string(),
            natives,
            patched,
        })
    }

    /// Undo an installation.
    ///
    /// Only the layer that owns the binding rebinds: to the newest layer
    /// still installed, else to the natives. A later layer keeps its binding.
    pub fn uninstall(&self, installation: &Installation) {
        let mut layers = self.layers.borrow_mut();
        layers.retain(|layer| !same_binding(&layer.patched, &installation.patched));

        let ours = same_binding(&self.binding.borrow(), &installation.patched);
        if ours {
            let next = layers
                .last()
                .map_or_else(|| installation.natives.clone(), |layer| layer.patched.clone());
            *self.binding.borrow_mut() = next;
        }

        if layers.is_empty() {
            self.natives.borrow_mut().take();
        }
        drop(layers);

        tracing::debug!(guard = %installation.guard, restored = ours, "time sources restored");
    }
}

/// Handle on an active installation
pub struct Installation {
    guard: String,
    natives: Rc<dyn TimeSources>,
    patched: Rc<dyn TimeSources>,
}

impl Installation {
    pub fn guard(&self) -> &str {
        &self.guard
    }

    /// Unpatched sources; the poll loop schedules against these
    pub fn natives(&self) -> Rc<dyn TimeSources> {
        self.natives.clone()
    }

    pub fn patched(&self) -> Rc<dyn TimeSources> {
        self.patched.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use timewarp_core::{EpochMillis, FrameHandle, PlaybackState, RealTime, Speed, TimerHandle};

    use crate::{FrameCallback, IntervalCallback, TimeoutCallback, VirtualClock};

    struct FixedPlatform {
        frames: bool,
        now: Cell<f64>,
    }

    impl Platform for FixedPlatform {
        fn has_frame_scheduler(&self) -> bool {
            self.frames
        }
        fn request_frame(&self, _callback: FrameCallback) -> FrameHandle {
            FrameHandle(0)
        }
        fn cancel_frame(&self, _handle: FrameHandle) {}
        fn monotonic_now(&self) -> f64 {
            self.now.get()
        }
        fn wall_now(&self) -> f64 {
            self.now.get()
        }
        fn set_timeout(&self, _callback: TimeoutCallback, _delay_ms: f64) -> TimerHandle {
            TimerHandle(0)
        }
        fn clear_timeout(&self, _handle: TimerHandle) {}
        fn set_interval(&self, _callback: IntervalCallback, _interval_ms: f64) -> TimerHandle {
            TimerHandle(0)
        }
        fn clear_interval(&self, _handle: TimerHandle) {}
    }

    fn realm(frames: bool) -> (Realm, Rc<FixedPlatform>) {
        let platform = Rc::new(FixedPlatform {
            frames,
            now: Cell::new(0.0),
        });
        (Realm::new(platform.clone()), platform)
    }

    fn clock_with_speed(speed: f64) -> SharedClock {
        let mut clock = VirtualClock::new(RealTime::ZERO, EpochMillis::from_millis(0.0));
        clock.checkpoint(
            RealTime::ZERO,
            EpochMillis::from_millis(0.0),
            PlaybackState::new(Speed::new(speed).unwrap(), false),
        );
        clock.shared()
    }

    #[test]
    fn test_install_swaps_binding() {
        let (realm, platform) = realm(true);
        let installation = realm.install("guard", clock_with_speed(2.0)).unwrap();

        platform.now.set(10.0);
        assert_eq!(realm.sources().monotonic_now(), 20.0);
        assert_eq!(installation.natives().monotonic_now(), 10.0);

        realm.uninstall(&installation);
        assert_eq!(realm.sources().monotonic_now(), 10.0);
        assert!(!realm.is_installed("guard"));
    }

    #[test]
    fn test_double_install_is_rejected() {
        let (realm, _) = realm(true);
        let _first = realm.install("guard", clock_with_speed(1.0)).unwrap();
        let second = realm.install("guard", clock_with_speed(2.0));
        assert!(matches!(second, Err(TimewarpError::AlreadyInstalled(_))));
    }

    #[test]
    fn test_layered_install_takes_over_natives() {
        let (realm, platform) = realm(true);
        let first = realm.install("first", clock_with_speed(2.0)).unwrap();
        let second = realm.install("second", clock_with_speed(3.0)).unwrap();

        platform.now.set(10.0);
        // 3x applied once, not composed with the earlier 2x patch
        assert_eq!(realm.sources().monotonic_now(), 30.0);
        assert_eq!(second.natives().monotonic_now(), 10.0);

        // the earlier layer no longer owns the binding
        realm.uninstall(&first);
        assert_eq!(realm.sources().monotonic_now(), 30.0);
    }

    #[test]
    fn test_removing_newest_layer_rebinds_to_older_layer() {
        let (realm, platform) = realm(true);
        let first = realm.install("first", clock_with_speed(2.0)).unwrap();
        let second = realm.install("second", clock_with_speed(3.0)).unwrap();

        realm.uninstall(&second);
        assert!(realm.is_installed("first"));
        assert!(!realm.is_installed("second"));

        platform.now.set(10.0);
        assert_eq!(realm.sources().monotonic_now(), 20.0);

        realm.uninstall(&first);
        assert_eq!(realm.sources().monotonic_now(), 10.0);
    }

    #[test]
    fn test_unsupported_realm_is_left_alone() {
        let (realm, platform) = realm(false);
        let result = realm.install("guard", clock_with_speed(2.0));
        assert!(matches!(result, Err(TimewarpError::UnsupportedRealm(_))));

        platform.now.set(5.0);
        assert_eq!(realm.sources().monotonic_now(), 5.0);
        assert!(!realm.is_installed("guard"));
    }
}
