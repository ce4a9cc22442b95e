//! Speed multiplier and playback state
//!
//! A `Speed` is the global multiplier applied to every time source and
//! tracked entity. It is finite and non-negative, or `+∞`.

use crate::{TimewarpError, TimewarpResult};

/// Lowest playback rate a media element accepts
pub const MEDIA_RATE_MIN: f64 = 0.0625;

/// Highest playback rate a media element accepts
pub const MEDIA_RATE_MAX: f64 = 16.0;

/// Finite multiplier standing in for `+∞` wherever a timestamp or delay is computed
pub const INFINITE_CLOCK_FACTOR: f64 = 1000.0;

/// Effective speed used to scale delays while paused
pub const PAUSED_DELAY_FLOOR: f64 = 0.001;

/// Two rates closer than this are the same rate
pub const RATE_EPSILON: f64 = 1e-9;

/// Global speed multiplier
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Speed(f64);

impl Speed {
    pub const ZERO: Speed = Speed(0.0);
    pub const NORMAL: Speed = Speed(1.0);
    pub const INFINITE: Speed = Speed(f64::INFINITY);

    /// Validate a raw multiplier
    pub fn new(multiplier: f64) -> TimewarpResult<Self> {
        if multiplier.is_nan() || multiplier < 0.0 {
            return Err(TimewarpError::InvalidSpeed(multiplier));
        }
        Ok(Speed(multiplier))
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    #[inline]
    pub fn is_infinite(self) -> bool {
        self.0.is_infinite()
    }

    /// Multiplier used for timestamps and delays (never infinite)
    #[inline]
    pub fn clock_factor(self) -> f64 {
        if self.is_infinite() {
            INFINITE_CLOCK_FACTOR
        } else {
            self.0
        }
    }
}

impl Default for Speed {
    fn default() -> Self {
        Speed::NORMAL
    }
}

impl std::fmt::Display for Speed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_infinite() {
            write!(f, "∞×")
        } else {
            write!(f, "{}×", self.0)
        }
    }
}

/// Authoritative playback state of a document
///
/// `speed` is the resume multiplier and is never zero; a zero request is
/// expressed as `paused = true`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackState {
    pub speed: Speed,
    pub paused: bool,
}

impl PlaybackState {
    pub const NORMAL: PlaybackState = PlaybackState {
        speed: Speed::NORMAL,
        paused: false,
    };

    pub fn new(speed: Speed, paused: bool) -> Self {
        PlaybackState { speed, paused }
    }

    /// Apply a `setSpeed` request. Zero pauses and keeps the resume multiplier.
    pub fn with_speed(self, speed: Speed) -> Self {
        if speed.is_zero() {
            PlaybackState {
                speed: self.speed,
                paused: true,
            }
        } else {
            PlaybackState {
                speed,
                paused: false,
            }
        }
    }

    pub fn with_paused(self, paused: bool) -> Self {
        PlaybackState {
            speed: self.speed,
            paused,
        }
    }

    /// Observable multiplier (zero while paused)
    pub fn multiplier(&self) -> f64 {
        if self.paused {
            0.0
        } else {
            self.speed.value()
        }
    }

    /// Factor a requested delay is divided by
    pub fn delay_factor(&self) -> f64 {
        if self.paused {
            PAUSED_DELAY_FLOOR
        } else {
            self.speed.clock_factor().max(PAUSED_DELAY_FLOOR)
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::NORMAL
    }
}

/// Clamp a rate into the range media elements accept
#[inline]
pub fn clamp_media_rate(rate: f64) -> f64 {
    rate.clamp(MEDIA_RATE_MIN, MEDIA_RATE_MAX)
}

/// Rate equality as observed through a host property
#[inline]
pub fn same_rate(a: f64, b: f64) -> bool {
    (a - b).abs() <= RATE_EPSILON
}
