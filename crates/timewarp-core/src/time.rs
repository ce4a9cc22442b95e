//! Time primitives for timewarp
//!
//! All hosts report time as floating point milliseconds. Real and virtual
//! readings are kept in distinct types so the two timelines never mix:
//! - RealTime: the unpatched monotonic clock
//! - VirtualTime: the rescaled, pausable monotonic clock seen by page code
//! - EpochMillis: wall clock readings (real or virtual), ms since Unix epoch

use std::ops::{Add, Sub};

/// Real monotonic time in milliseconds since the realm's time origin
#[derive(Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct RealTime(pub f64);

impl RealTime {
    pub const ZERO: RealTime = RealTime(0.0);

    #[inline]
    pub fn from_millis(millis: f64) -> Self {
        RealTime(millis)
    }

    #[inline]
    pub fn as_millis(self) -> f64 {
        self.0
    }
}

impl Sub<RealTime> for RealTime {
    type Output = f64;

    /// Elapsed milliseconds, never negative
    #[inline]
    fn sub(self, rhs: RealTime) -> Self::Output {
        (self.0 - rhs.0).max(0.0)
    }
}

impl Add<f64> for RealTime {
    type Output = RealTime;

    #[inline]
    fn add(self, rhs: f64) -> Self::Output {
        RealTime(self.0 + rhs)
    }
}

impl std::fmt::Debug for RealTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "real({:.3}ms)", self.0)
    }
}

/// Virtual monotonic time in milliseconds
#[derive(Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct VirtualTime(pub f64);

impl VirtualTime {
    pub const ZERO: VirtualTime = VirtualTime(0.0);

    #[inline]
    pub fn from_millis(millis: f64) -> Self {
        VirtualTime(millis)
    }

    #[inline]
    pub fn as_millis(self) -> f64 {
        self.0
    }
}

impl Add<f64> for VirtualTime {
    type Output = VirtualTime;

    #[inline]
    fn add(self, rhs: f64) -> Self::Output {
        VirtualTime(self.0 + rhs)
    }
}

impl Sub<VirtualTime> for VirtualTime {
    type Output = f64;

    #[inline]
    fn sub(self, rhs: VirtualTime) -> Self::Output {
        self.0 - rhs.0
    }
}

impl std::fmt::Debug for VirtualTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "virt({:.3}ms)", self.0)
    }
}

/// Wall clock reading in milliseconds since the Unix epoch
#[derive(Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct EpochMillis(pub f64);

impl EpochMillis {
    #[inline]
    pub fn from_millis(millis: f64) -> Self {
        EpochMillis(millis)
    }

    #[inline]
    pub fn as_millis(self) -> f64 {
        self.0
    }
}

impl Add<f64> for EpochMillis {
    type Output = EpochMillis;

    #[inline]
    fn add(self, rhs: f64) -> Self::Output {
        EpochMillis(self.0 + rhs)
    }
}

impl Sub<EpochMillis> for EpochMillis {
    type Output = f64;

    #[inline]
    fn sub(self, rhs: EpochMillis) -> Self::Output {
        self.0 - rhs.0
    }
}

impl std::fmt::Debug for EpochMillis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "epoch({:.0}ms)", self.0)
    }
}
