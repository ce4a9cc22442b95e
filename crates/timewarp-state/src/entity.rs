//! Host entities the tracker reconciles
//!
//! Animations and media elements are owned by the page. The tracker only
//! ever holds them weakly and talks to them through these traits; every
//! call may fail (element mid-removal, unfinishable animation) and the
//! failure stays with that entity.

use std::rc::Rc;

use thiserror::Error;

/// Failure of a single host entity operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntityError {
    #[error("Entity detached from its document")]
    Detached,

    #[error("Entity cannot be finished: {0}")]
    NotFinishable(String),

    #[error("Host rejected value {0}")]
    Rejected(f64),

    #[error("Entity unavailable: {0}")]
    Unavailable(String),
}

/// Result type for entity operations
pub type EntityResult<T> = Result<T, EntityError>;

/// Node in the host's element tree, used for exclusion lookups
pub trait ElementLike {
    fn has_attribute(&self, name: &str) -> bool;

    fn parent(&self) -> Option<Rc<dyn ElementLike>>;
}

/// Play state of a declarative animation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationPlayState {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Declarative animation object
pub trait AnimationLike {
    fn playback_rate(&self) -> EntityResult<f64>;

    fn set_playback_rate(&self, rate: f64) -> EntityResult<()>;

    fn play_state(&self) -> EntityResult<AnimationPlayState>;

    fn pause(&self) -> EntityResult<()>;

    fn play(&self) -> EntityResult<()>;

    /// Jump to the end; fails for infinite iteration counts
    fn finish(&self) -> EntityResult<()>;

    /// Animated element, if any
    fn target(&self) -> Option<Rc<dyn ElementLike>>;
}

/// Media element (audio or video)
pub trait MediaLike {
    fn playback_rate(&self) -> EntityResult<f64>;

    fn set_playback_rate(&self, rate: f64) -> EntityResult<()>;

    fn is_paused(&self) -> EntityResult<bool>;

    fn pause(&self) -> EntityResult<()>;

    fn play(&self) -> EntityResult<()>;

    /// Duration in seconds; infinite for live streams, NaN before metadata
    fn duration(&self) -> EntityResult<f64>;

    /// Seek to a position in seconds
    fn seek(&self, seconds: f64) -> EntityResult<()>;

    /// The media element itself, for exclusion lookups
    fn element(&self) -> Option<Rc<dyn ElementLike>>;
}

/// Upper bound on ancestor walks; host trees are never this deep
const MAX_ANCESTOR_DEPTH: usize = 4096;

/// Whether `start` or any of its ancestors carries `attribute`
pub fn is_excluded(start: Option<Rc<dyn ElementLike>>, attribute: &str) -> bool {
    let mut node = start;
    let mut depth = 0;

    while let Some(current) = node {
        if current.has_attribute(attribute) {
            return true;
        }
        depth += 1;
        if depth >= MAX_ANCESTOR_DEPTH {
            return false;
        }
        node = current.parent();
    }

    false
}
