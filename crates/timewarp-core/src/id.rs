//! Identity types for timewarp
//!
//! Documents and child frames are addressed by 64-bit handles assigned by
//! the host. They carry no meaning beyond identity.

use std::fmt;

/// Document identity - one per realm the engine is installed into
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

impl DocumentId {
    pub const ZERO: DocumentId = DocumentId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        DocumentId(id)
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Doc({:04x})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

/// Child frame identity - a frame element attached to a document
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct FrameId(pub u64);

impl FrameId {
    #[inline]
    pub fn new(id: u64) -> Self {
        FrameId(id)
    }
}

impl fmt::Debug for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({:04x})", self.0)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

/// Handle returned by the frame scheduler
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct FrameHandle(pub u64);

/// Handle returned by the delay-based schedulers
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct TimerHandle(pub u64);
