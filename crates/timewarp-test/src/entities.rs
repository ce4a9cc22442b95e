//! Simulated page entities
//!
//! Animations and media progress by their own playback rate against real
//! time, the way the host advances them. Every rate write through the
//! entity traits is counted so tests can assert on redundant writes.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use timewarp_core::{MEDIA_RATE_MAX, MEDIA_RATE_MIN};
use timewarp_state::{
    AnimationLike, AnimationPlayState, ElementLike, EntityError, EntityResult, MediaLike,
};

/// Element node with attributes and a parent link
#[derive(Default)]
pub struct SimElement {
    attributes: RefCell<HashSet<String>>,
    parent: Option<Rc<SimElement>>,
}

impl SimElement {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn child_of(parent: &Rc<SimElement>) -> Rc<Self> {
        Rc::new(SimElement {
            attributes: RefCell::new(HashSet::new()),
            parent: Some(parent.clone()),
        })
    }

    pub fn set_attribute(&self, name: &str) {
        self.attributes.borrow_mut().insert(name.to_string());
    }

    pub fn remove_attribute(&self, name: &str) {
        self.attributes.borrow_mut().remove(name);
    }
}

impl ElementLike for SimElement {
    fn has_attribute(&self, name: &str) -> bool {
        self.attributes.borrow().contains(name)
    }

    fn parent(&self) -> Option<Rc<dyn ElementLike>> {
        self.parent.clone().map(|parent| parent as Rc<dyn ElementLike>)
    }
}

/// Declarative animation
pub struct SimAnimation {
    rate: Cell<f64>,
    state: Cell<AnimationPlayState>,
    /// Local time in milliseconds
    current_time: Cell<f64>,
    /// Active duration; `None` for infinite iterations
    duration: Option<f64>,
    target: Option<Rc<SimElement>>,
    detached: Cell<bool>,
    rate_writes: Cell<u32>,
}

impl SimAnimation {
    /// A running animation at rate 1
    pub fn new(duration: Option<f64>) -> Rc<Self> {
        Self::build(duration, 1.0, None)
    }

    pub fn with_rate(duration: Option<f64>, rate: f64) -> Rc<Self> {
        Self::build(duration, rate, None)
    }

    pub fn targeting(duration: Option<f64>, rate: f64, target: &Rc<SimElement>) -> Rc<Self> {
        Self::build(duration, rate, Some(target.clone()))
    }

    fn build(duration: Option<f64>, rate: f64, target: Option<Rc<SimElement>>) -> Rc<Self> {
        Rc::new(SimAnimation {
            rate: Cell::new(rate),
            state: Cell::new(AnimationPlayState::Running),
            current_time: Cell::new(0.0),
            duration,
            target,
            detached: Cell::new(false),
            rate_writes: Cell::new(0),
        })
    }

    pub fn rate(&self) -> f64 {
        self.rate.get()
    }

    pub fn state(&self) -> AnimationPlayState {
        self.state.get()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time.get()
    }

    /// Rate writes made through `AnimationLike`
    pub fn rate_writes(&self) -> u32 {
        self.rate_writes.get()
    }

    /// Page script assigning the rate directly
    pub fn page_set_rate(&self, rate: f64) {
        self.rate.set(rate);
    }

    /// Page script pausing the animation
    pub fn page_pause(&self) {
        self.state.set(AnimationPlayState::Paused);
    }

    /// Subsequent operations fail as if the element was mid-removal
    pub fn detach(&self) {
        self.detached.set(true);
    }

    /// Host tick: advance local time by `rate × dt`
    pub fn advance(&self, dt_ms: f64) {
        if self.state.get() != AnimationPlayState::Running || self.detached.get() {
            return;
        }
        let mut time = self.current_time.get() + self.rate.get() * dt_ms;
        if let Some(duration) = self.duration {
            if time >= duration {
                time = duration;
                self.state.set(AnimationPlayState::Finished);
            }
        }
        self.current_time.set(time.max(0.0));
    }

    fn check(&self) -> EntityResult<()> {
        if self.detached.get() {
            return Err(EntityError::Detached);
        }
        Ok(())
    }
}

impl AnimationLike for SimAnimation {
    fn playback_rate(&self) -> EntityResult<f64> {
        self.check()?;
        Ok(self.rate.get())
    }

    fn set_playback_rate(&self, rate: f64) -> EntityResult<()> {
        self.check()?;
        self.rate.set(rate);
        self.rate_writes.set(self.rate_writes.get() + 1);
        Ok(())
    }

    fn play_state(&self) -> EntityResult<AnimationPlayState> {
        self.check()?;
        Ok(self.state.get())
    }

    fn pause(&self) -> EntityResult<()> {
        self.check()?;
        self.state.set(AnimationPlayState::Paused);
        Ok(())
    }

    fn play(&self) -> EntityResult<()> {
        self.check()?;
        self.state.set(AnimationPlayState::Running);
        Ok(())
    }

    fn finish(&self) -> EntityResult<()> {
        self.check()?;
        let Some(duration) = self.duration else {
            return Err(EntityError::NotFinishable("infinite iteration count".to_string()));
        };
        self.current_time.set(duration);
        self.state.set(AnimationPlayState::Finished);
        Ok(())
    }

    fn target(&self) -> Option<Rc<dyn ElementLike>> {
        self.target.clone().map(|target| target as Rc<dyn ElementLike>)
    }
}

/// Audio or video element
pub struct SimMedia {
    rate: Cell<f64>,
    paused: Cell<bool>,
    /// Playback position in seconds
    position: Cell<f64>,
    /// Duration in seconds; infinite for live streams
    duration: f64,
    element: Rc<SimElement>,
    detached: Cell<bool>,
    rate_writes: Cell<u32>,
}

impl SimMedia {
    /// A playing element at rate 1
    pub fn new(duration: f64) -> Rc<Self> {
        Self::within(duration, &SimElement::new())
    }

    /// A playing element whose node is `element`
    pub fn within(duration: f64, element: &Rc<SimElement>) -> Rc<Self> {
        Rc::new(SimMedia {
            rate: Cell::new(1.0),
            paused: Cell::new(false),
            position: Cell::new(0.0),
            duration,
            element: element.clone(),
            detached: Cell::new(false),
            rate_writes: Cell::new(0),
        })
    }

    pub fn rate(&self) -> f64 {
        self.rate.get()
    }

    pub fn paused(&self) -> bool {
        self.paused.get()
    }

    pub fn position(&self) -> f64 {
        self.position.get()
    }

    pub fn rate_writes(&self) -> u32 {
        self.rate_writes.get()
    }

    pub fn page_set_rate(&self, rate: f64) {
        self.rate.set(rate);
    }

    /// User pressing pause on the controls
    pub fn page_pause(&self) {
        self.paused.set(true);
    }

    pub fn detach(&self) {
        self.detached.set(true);
    }

    /// Host tick: advance the position by `rate × dt`
    pub fn advance(&self, dt_ms: f64) {
        if self.paused.get() || self.detached.get() {
            return;
        }
        let position = self.position.get() + self.rate.get() * dt_ms / 1000.0;
        if position >= self.duration {
            self.position.set(self.duration);
            self.paused.set(true);
        } else {
            self.position.set(position);
        }
    }

    fn check(&self) -> EntityResult<()> {
        if self.detached.get() {
            return Err(EntityError::Detached);
        }
        Ok(())
    }
}

impl MediaLike for SimMedia {
    fn playback_rate(&self) -> EntityResult<f64> {
        self.check()?;
        Ok(self.rate.get())
    }

    fn set_playback_rate(&self, rate: f64) -> EntityResult<()> {
        self.check()?;
        if !(MEDIA_RATE_MIN..=MEDIA_RATE_MAX).contains(&rate) {
            return Err(EntityError::Rejected(rate));
        }
        self.rate.set(rate);
        self.rate_writes.set(self.rate_writes.get() + 1);
        Ok(())
    }

    fn is_paused(&self) -> EntityResult<bool> {
        self.check()?;
        Ok(self.paused.get())
    }

    fn pause(&self) -> EntityResult<()> {
        self.check()?;
        self.paused.set(true);
        Ok(())
    }

    fn play(&self) -> EntityResult<()> {
        self.check()?;
        self.paused.set(false);
        Ok(())
    }

    fn duration(&self) -> EntityResult<f64> {
        self.check()?;
        Ok(self.duration)
    }

    fn seek(&self, seconds: f64) -> EntityResult<()> {
        self.check()?;
        self.position.set(seconds.clamp(0.0, self.duration));
        Ok(())
    }

    fn element(&self) -> Option<Rc<dyn ElementLike>> {
        Some(self.element.clone() as Rc<dyn ElementLike>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animation_progresses_by_rate() {
        let animation = SimAnimation::with_rate(Some(1000.0), 0.5);
        animation.advance(400.0);
        assert_eq!(animation.current_time(), 200.0);

        animation.advance(10_000.0);
        assert_eq!(animation.current_time(), 1000.0);
        assert_eq!(animation.state(), AnimationPlayState::Finished);
    }

    #[test]
    fn test_infinite_animation_cannot_finish() {
        let animation = SimAnimation::new(None);
        assert!(matches!(animation.finish(), Err(EntityError::NotFinishable(_))));
    }

    #[test]
    fn test_media_rejects_unsupported_rates() {
        let media = SimMedia::new(60.0);
        assert_eq!(media.set_playback_rate(64.0), Err(EntityError::Rejected(64.0)));
        assert_eq!(media.rate_writes(), 0);
    }

    #[test]
    fn test_media_pauses_at_end() {
        let media = SimMedia::new(1.0);
        media.advance(1500.0);
        assert!(media.paused());
        assert_eq!(media.position(), 1.0);
    }

    #[test]
    fn test_detached_entities_fail() {
        let animation = SimAnimation::new(Some(100.0));
        animation.detach();
        assert_eq!(animation.playback_rate(), Err(EntityError::Detached));
    }
}
