//! Rate reconciliation pipeline
//!
//! Every live animation and media element is reconciled against the
//! global playback state:
//! 1. Adopt: first observation records the current rate as developer intent
//! 2. Interference: a rate that differs from the last engine write is the
//!    new developer intent
//! 3. Compose: write `developer × multiplier` only if it differs
//! 4. Play/pause: pause running entities while paused, resume only what
//!    the engine itself paused
//! 5. Infinite speed: complete immediately, else fall back to the fastest rate
//! 6. Media rates are clamped into the host's supported range
//!
//! A third party writing exactly the rate the engine would compute is
//! indistinguishable from no write at all; the earlier developer rate is
//! kept in that case.

use std::rc::Rc;

use timewarp_core::{
    clamp_media_rate, same_rate, PlaybackState, INFINITE_CLOCK_FACTOR, MEDIA_RATE_MAX,
};

use crate::{
    is_excluded, AnimationLike, AnimationPlayState, EntityError, EntityResult, MediaLike,
    WeakTable,
};

/// Bookkeeping for one tracked animation or media element
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackedEntry {
    /// Rate the entity would have at multiplier 1
    pub developer_rate: f64,
    /// Rate the engine last wrote (or confirmed)
    pub engine_applied_rate: Option<f64>,
    /// Set when the engine paused the entity itself
    pub engine_forced_pause: bool,
    /// Set once the entity was completed for infinite speed
    pub completed: bool,
}

impl TrackedEntry {
    pub fn new(developer_rate: f64) -> Self {
        TrackedEntry {
            developer_rate,
            engine_applied_rate: None,
            engine_forced_pause: false,
            completed: false,
        }
    }
}

/// Counts for one reconciliation pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub discovered: u32,
    pub reconciled: u32,
    pub writes: u32,
    pub adopted: u32,
    pub paused: u32,
    pub resumed: u32,
    pub completed: u32,
    pub excluded: u32,
    pub failed: u32,
}

impl ReconciliationResult {
    /// Fold another pass into this one. Totals saturate.
    pub fn merge(&mut self, other: &ReconciliationResult) {
        self.discovered = self.discovered.saturating_add(other.discovered);
        self.reconciled = self.reconciled.saturating_add(other.reconciled);
        self.writes = self.writes.saturating_add(other.writes);
        self.adopted = self.adopted.saturating_add(other.adopted);
        self.paused = self.paused.saturating_add(other.paused);
        self.resumed = self.resumed.saturating_add(other.resumed);
        self.completed = self.completed.saturating_add(other.completed);
        self.excluded = self.excluded.saturating_add(other.excluded);
        self.failed = self.failed.saturating_add(other.failed);
    }
}

/// Common view of animations and media for the pipeline
trait RateSubject {
    fn rate(&self) -> EntityResult<f64>;
    fn set_rate(&self, rate: f64) -> EntityResult<()>;
    fn is_running(&self) -> EntityResult<bool>;
    fn is_paused(&self) -> EntityResult<bool>;
    fn pause(&self) -> EntityResult<()>;
    fn play(&self) -> EntityResult<()>;
    /// Bring the entity to its end. It stays there until the page acts.
    fn complete(&self) -> EntityResult<()>;
    fn limit(&self, rate: f64) -> f64;
    fn fastest(&self, developer_rate: f64) -> f64;
}

struct AnimationSubject<'a>(&'a dyn AnimationLike);

impl RateSubject for AnimationSubject<'_> {
    fn rate(&self) -> EntityResult<f64> {
        self.0.playback_rate()
    }

    fn set_rate(&self, rate: f64) -> EntityResult<()> {
        self.0.set_playback_rate(rate)
    }

    fn is_running(&self) -> EntityResult<bool> {
        Ok(self.0.play_state()? == AnimationPlayState::Running)
    }

    fn is_paused(&self) -> EntityResult<bool> {
        Ok(self.0.play_state()? == AnimationPlayState::Paused)
    }

    fn pause(&self) -> EntityResult<()> {
        self.0.pause()
    }

    fn play(&self) -> EntityResult<()> {
        self.0.play()
    }

    fn complete(&self) -> EntityResult<()> {
        self.0.finish()
    }

    fn limit(&self, rate: f64) -> f64 {
        rate
    }

    fn fastest(&self, developer_rate: f64) -> f64 {
        developer_rate * INFINITE_CLOCK_FACTOR
    }
}

struct MediaSubject<'a>(&'a dyn MediaLike);

impl RateSubject for MediaSubject<'_> {
    fn rate(&self) -> EntityResult<f64> {
        self.0.playback_rate()
    }

    fn set_rate(&self, rate: f64) -> EntityResult<()> {
        self.0.set_playback_rate(rate)
    }

    fn is_running(&self) -> EntityResult<bool> {
        Ok(!self.0.is_paused()?)
    }

    fn is_paused(&self) -> EntityResult<bool> {
        self.0.is_paused()
    }

    fn pause(&self) -> EntityResult<()> {
        self.0.pause()
    }

    fn play(&self) -> EntityResult<()> {
        self.0.play()
    }

    fn complete(&self) -> EntityResult<()> {
        let duration = self.0.duration()?;
        if !duration.is_finite() {
            return Err(EntityError::NotFinishable(format!("duration {duration}")));
        }
        self.0.seek(duration)?;
        self.0.pause()
    }

    fn limit(&self, rate: f64) -> f64 {
        clamp_media_rate(rate)
    }

    fn fastest(&self, _developer_rate: f64) -> f64 {
        MEDIA_RATE_MAX
    }
}

/// Run steps 2-6 for one tracked entity
fn reconcile_entry(
    subject: &dyn RateSubject,
    entry: &mut TrackedEntry,
    state: PlaybackState,
    result: &mut ReconciliationResult,
) -> EntityResult<()> {
    let current = subject.rate()?;

    if let Some(applied) = entry.engine_applied_rate {
        if !same_rate(current, applied) {
            tracing::trace!(from = entry.developer_rate, to = current, "developer rate re-inferred");
            entry.developer_rate = current;
            result.adopted += 1;
        }
    }

    let infinite = state.speed.is_infinite() && !state.paused;
    if !infinite {
        entry.completed = false;
    }

    if infinite && !entry.completed {
        match subject.complete() {
            Ok(()) => {
                // ended entities are never resumed; play() would restart them
                entry.completed = true;
                entry.engine_forced_pause = false;
                entry.engine_applied_rate = Some(current);
                result.completed += 1;
                return Ok(());
            }
            Err(err) => {
                tracing::debug!(error = %err, "completion unavailable, using fastest rate");
            }
        }
    }

    if entry.completed {
        entry.engine_applied_rate = Some(current);
        return Ok(());
    }

    let target = if state.speed.is_infinite() {
        subject.fastest(entry.developer_rate)
    } else {
        subject.limit(entry.developer_rate * state.speed.value())
    };

    if !same_rate(current, target) {
        subject.set_rate(target)?;
        tracing::trace!(rate = target, "rate written");
        result.writes += 1;
    }
    entry.engine_applied_rate = Some(target);

    if state.paused {
        if subject.is_running()? {
            subject.pause()?;
            entry.engine_forced_pause = true;
            result.paused += 1;
        }
    } else if entry.engine_forced_pause {
        if subject.is_paused()? {
            subject.play()?;
            result.resumed += 1;
        }
        entry.engine_forced_pause = false;
    }

    Ok(())
}

/// Entity Rate Tracker
pub struct RateTracker {
    /// Animation ledger
    animations: WeakTable<dyn AnimationLike, TrackedEntry>,
    /// Media ledger
    media: WeakTable<dyn MediaLike, TrackedEntry>,
    /// Opt-out attribute looked up on ancestors
    exclusion_attribute: String,
}

impl RateTracker {
    pub fn new(exclusion_attribute: impl Into<String>) -> Self {
        RateTracker {
            animations: WeakTable::new(),
            media: WeakTable::new(),
            exclusion_attribute: exclusion_attribute.into(),
        }
    }

    pub fn exclusion_attribute(&self) -> &str {
        &self.exclusion_attribute
    }

    /// Bookkeeping for an animation, if tracked
    pub fn animation_entry(&self, animation: &Rc<dyn AnimationLike>) -> Option<&TrackedEntry> {
        self.animations.get(animation)
    }

    /// Bookkeeping for a media element, if tracked
    pub fn media_entry(&self, media: &Rc<dyn MediaLike>) -> Option<&TrackedEntry> {
        self.media.get(media)
    }

    /// Number of tracked animations and media elements
    pub fn tracked(&self) -> (usize, usize) {
        (self.animations.len(), self.media.len())
    }

    /// Full pass over everything currently live in the document.
    /// Untracked entities are adopted; dead entries are dropped.
    pub fn pass(
        &mut self,
        animations: &[Rc<dyn AnimationLike>],
        media: &[Rc<dyn MediaLike>],
        state: PlaybackState,
    ) -> ReconciliationResult {
        let mut result = ReconciliationResult::default();
        self.animations.purge();
        self.media.purge();

        for animation in animations {
            self.reconcile_animation(animation, state, true, &mut result);
        }
        for element in media {
            self.reconcile_media(element, state, true, &mut result);
        }

        result
    }

    /// Pass over already-tracked entities only
    pub fn reapply(&mut self, state: PlaybackState) -> ReconciliationResult {
        let mut result = ReconciliationResult::default();

        for animation in self.animations.live_subjects() {
            self.reconcile_animation(&animation, state, false, &mut result);
        }
        for element in self.media.live_subjects() {
            self.reconcile_media(&element, state, false, &mut result);
        }

        result
    }

    fn reconcile_animation(
        &mut self,
        animation: &Rc<dyn AnimationLike>,
        state: PlaybackState,
        discover: bool,
        result: &mut ReconciliationResult,
    ) {
        if is_excluded(animation.target(), &self.exclusion_attribute) {
            result.excluded += 1;
            return;
        }

        let outcome = Self::track(&mut self.animations, animation, discover, result, || {
            animation.playback_rate()
        })
        .and_then(|entry| match entry {
            Some(entry) => reconcile_entry(&AnimationSubject(animation.as_ref()), entry, state, result),
            None => Ok(()),
        });

        Self::settle(outcome, "animation", result);
    }

    fn reconcile_media(
        &mut self,
        element: &Rc<dyn MediaLike>,
        state: PlaybackState,
        discover: bool,
        result: &mut ReconciliationResult,
    ) {
        if is_excluded(element.element(), &self.exclusion_attribute) {
            result.excluded += 1;
            return;
        }

        let outcome = Self::track(&mut self.media, element, discover, result, || {
            element.playback_rate()
        })
        .and_then(|entry| match entry {
            Some(entry) => reconcile_entry(&MediaSubject(element.as_ref()), entry, state, result),
            None => Ok(()),
        });

        Self::settle(outcome, "media", result);
    }

    /// Look up (or, when discovering, create) the entry for a subject
    fn track<'t, T: ?Sized>(
        table: &'t mut WeakTable<T, TrackedEntry>,
        subject: &Rc<T>,
        discover: bool,
        result: &mut ReconciliationResult,
        read_rate: impl FnOnce() -> EntityResult<f64>,
    ) -> EntityResult<Option<&'t mut TrackedEntry>> {
        if table.contains(subject) {
            return Ok(table.get_mut(subject));
        }
        if !discover {
            return Ok(None);
        }

        let developer_rate = read_rate()?;
        let (entry, _) = table.get_or_insert_with(subject, || TrackedEntry::new(developer_rate));
        result.discovered += 1;
        Ok(Some(entry))
    }

    fn settle(outcome: EntityResult<()>, kind: &'static str, result: &mut ReconciliationResult) {
        match outcome {
            Ok(()) => result.reconciled += 1,
            Err(err) => {
                tracing::debug!(kind, error = %err, "entity skipped this pass");
                result.failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    use proptest::prelude::*;
    use timewarp_core::{Speed, MEDIA_RATE_MIN};

    use crate::ElementLike;

    struct Marker;

    impl ElementLike for Marker {
        fn has_attribute(&self, name: &str) -> bool {
            name == "data-timewarp-ignore"
        }

        fn parent(&self) -> Option<Rc<dyn ElementLike>> {
            None
        }
    }

    struct Anim {
        rate: Cell<f64>,
        state: Cell<AnimationPlayState>,
        infinite: bool,
        excluded: bool,
        writes: Cell<u32>,
    }

    impl Anim {
        fn new(rate: f64) -> Rc<Anim> {
            Rc::new(Anim {
                rate: Cell::new(rate),
                state: Cell::new(AnimationPlayState::Running),
                infinite: false,
                excluded: false,
                writes: Cell::new(0),
            })
        }
    }

    impl AnimationLike for Anim {
        fn playback_rate(&self) -> EntityResult<f64> {
            Ok(self.rate.get())
        }
        fn set_playback_rate(&self, rate: f64) -> EntityResult<()> {
            self.writes.set(self.writes.get() + 1);
            self.rate.set(rate);
            Ok(())
        }
        fn play_state(&self) -> EntityResult<AnimationPlayState> {
            Ok(self.state.get())
        }
        fn pause(&self) -> EntityResult<()> {
            self.state.set(AnimationPlayState::Paused);
            Ok(())
        }
        fn play(&self) -> EntityResult<()> {
            self.state.set(AnimationPlayState::Running);
            Ok(())
        }
        fn finish(&self) -> EntityResult<()> {
            if self.infinite {
                return Err(EntityError::NotFinishable("infinite iterations".into()));
            }
            self.state.set(AnimationPlayState::Finished);
            Ok(())
        }
        fn target(&self) -> Option<Rc<dyn ElementLike>> {
            if self.excluded {
                Some(Rc::new(Marker))
            } else {
                None
            }
        }
    }

    struct Media {
        rate: Cell<f64>,
        paused: Cell<bool>,
        position: Cell<f64>,
        duration: f64,
        detached: Cell<bool>,
        log: RefCell<Vec<&'static str>>,
    }

    impl Media {
        fn new(rate: f64, duration: f64) -> Rc<Media> {
            Rc::new(Media {
                rate: Cell::new(rate),
                paused: Cell::new(false),
                position: Cell::new(0.0),
                duration,
                detached: Cell::new(false),
                log: RefCell::new(Vec::new()),
            })
        }
    }

    impl MediaLike for Media {
        fn playback_rate(&self) -> EntityResult<f64> {
            if self.detached.get() {
                return Err(EntityError::Detached);
            }
            Ok(self.rate.get())
        }
        fn set_playback_rate(&self, rate: f64) -> EntityResult<()> {
            self.log.borrow_mut().push("rate");
            self.rate.set(rate);
            Ok(())
        }
        fn is_paused(&self) -> EntityResult<bool> {
            Ok(self.paused.get())
        }
        fn pause(&self) -> EntityResult<()> {
            self.log.borrow_mut().push("pause");
            self.paused.set(true);
            Ok(())
        }
        fn play(&self) -> EntityResult<()> {
            self.log.borrow_mut().push("play");
            self.paused.set(false);
            Ok(())
        }
        fn duration(&self) -> EntityResult<f64> {
            Ok(self.duration)
        }
        fn seek(&self, seconds: f64) -> EntityResult<()> {
            self.position.set(seconds);
            Ok(())
        }
        fn element(&self) -> Option<Rc<dyn ElementLike>> {
            None
        }
    }

    fn state(speed: f64, paused: bool) -> PlaybackState {
        PlaybackState::new(Speed::new(speed).unwrap(), paused)
    }

    fn anims(list: &[&Rc<Anim>]) -> Vec<Rc<dyn AnimationLike>> {
        list.iter().map(|a| (*a).clone() as Rc<dyn AnimationLike>).collect()
    }

    #[test]
    fn test_discovery_composes_rate() {
        let mut tracker = RateTracker::new("data-timewarp-ignore");
        let anim = Anim::new(1.5);

        let result = tracker.pass(&anims(&[&anim]), &[], state(2.0, false));
        assert_eq!(result.discovered, 1);
        assert_eq!(result.writes, 1);
        assert_eq!(anim.rate.get(), 3.0);
    }

    #[test]
    fn test_speed_change_keeps_developer_rate() {
        let mut tracker = RateTracker::new("data-timewarp-ignore");
        let anim = Anim::new(1.5);
        let list = anims(&[&anim]);

        tracker.pass(&list, &[], state(2.0, false));
        tracker.reapply(state(0.5, false));

        assert_eq!(anim.rate.get(), 0.75);
        let entry = tracker.animation_entry(&list[0]).unwrap();
        assert_eq!(entry.developer_rate, 1.5);
    }

    #[test]
    fn test_interference_becomes_developer_intent() {
        let mut tracker = RateTracker::new("data-timewarp-ignore");
        let anim = Anim::new(1.0);
        let list = anims(&[&anim]);

        tracker.pass(&list, &[], state(0.5, false));
        anim.rate.set(3.0);

        let result = tracker.pass(&list, &[], state(0.5, false));
        assert_eq!(result.adopted, 1);
        assert_eq!(anim.rate.get(), 1.5);
        assert_eq!(tracker.animation_entry(&list[0]).unwrap().developer_rate, 3.0);
    }

    #[test]
    fn test_reassertion_of_computed_value_goes_unnoticed() {
        let mut tracker = RateTracker::new("data-timewarp-ignore");
        let anim = Anim::new(1.0);
        let list = anims(&[&anim]);

        tracker.pass(&list, &[], state(0.5, false));
        // third party writes exactly what the engine computed
        anim.rate.set(0.5);

        let result = tracker.pass(&list, &[], state(0.5, false));
        assert_eq!(result.adopted, 0);
        assert_eq!(tracker.animation_entry(&list[0]).unwrap().developer_rate, 1.0);
    }

    #[test]
    fn test_identical_pass_writes_nothing() {
        let mut tracker = RateTracker::new("data-timewarp-ignore");
        let anim = Anim::new(1.0);
        let list = anims(&[&anim]);

        tracker.pass(&list, &[], state(0.25, false));
        let writes = anim.writes.get();
        let result = tracker.pass(&list, &[], state(0.25, false));

        assert_eq!(result.writes, 0);
        assert_eq!(anim.writes.get(), writes);
    }

    #[test]
    fn test_excluded_entity_is_never_written() {
        let mut tracker = RateTracker::new("data-timewarp-ignore");
        let anim = Rc::new(Anim {
            excluded: true,
            ..Rc::try_unwrap(Anim::new(1.0)).ok().unwrap()
        });
        let list = anims(&[&anim]);

        for speed in [0.1, 2.0, 8.0] {
            let result = tracker.pass(&list, &[], state(speed, false));
            assert_eq!(result.excluded, 1);
        }
        tracker.pass(&list, &[], state(1.0, true));
        tracker.pass(&list, &[], state(f64::INFINITY, false));

        assert_eq!(anim.writes.get(), 0);
        assert_eq!(anim.state.get(), AnimationPlayState::Running);
        assert_eq!(tracker.tracked(), (0, 0));
    }

    #[test]
    fn test_pause_and_resume_only_engine_paused() {
        let mut tracker = RateTracker::new("data-timewarp-ignore");
        let ours = Media::new(1.0, 10.0);
        let theirs = Media::new(1.0, 10.0);
        theirs.paused.set(true);
        let list: Vec<Rc<dyn MediaLike>> = vec![ours.clone(), theirs.clone()];

        let result = tracker.pass(&[], &list, state(1.0, true));
        assert_eq!(result.paused, 1);
        assert!(ours.paused.get());

        let result = tracker.pass(&[], &list, state(1.0, false));
        assert_eq!(result.resumed, 1);
        assert!(!ours.paused.get());
        assert!(theirs.paused.get());
    }

    #[test]
    fn test_media_rate_is_clamped() {
        let mut tracker = RateTracker::new("data-timewarp-ignore");
        let media = Media::new(1.0, 10.0);
        let list: Vec<Rc<dyn MediaLike>> = vec![media.clone()];

        tracker.pass(&[], &list, state(100.0, false));
        assert_eq!(media.rate.get(), MEDIA_RATE_MAX);

        tracker.pass(&[], &list, state(0.001, false));
        assert_eq!(media.rate.get(), MEDIA_RATE_MIN);
        // clamped value is not mistaken for interference
        assert_eq!(tracker.media_entry(&list[0]).unwrap().developer_rate, 1.0);
    }

    #[test]
    fn test_infinite_speed_completes() {
        let mut tracker = RateTracker::new("data-timewarp-ignore");
        let anim = Anim::new(1.0);
        let media = Media::new(1.0, 42.0);
        let media_list: Vec<Rc<dyn MediaLike>> = vec![media.clone()];

        let result = tracker.pass(&anims(&[&anim]), &media_list, state(f64::INFINITY, false));
        assert_eq!(result.completed, 2);
        assert_eq!(anim.state.get(), AnimationPlayState::Finished);
        assert_eq!(media.position.get(), 42.0);
        assert!(media.paused.get());

        // a second pass does not complete again
        let result = tracker.pass(&anims(&[&anim]), &media_list, state(f64::INFINITY, false));
        assert_eq!(result.completed, 0);
    }

    #[test]
    fn test_completed_media_stays_at_end_after_finite_speed() {
        let mut tracker = RateTracker::new("data-timewarp-ignore");
        let media = Media::new(1.0, 42.0);
        let media_list: Vec<Rc<dyn MediaLike>> = vec![media.clone()];

        tracker.pass(&[], &media_list, state(1.0, true));
        assert!(media.paused.get());
        tracker.reapply(state(f64::INFINITY, false));
        assert_eq!(media.position.get(), 42.0);

        let result = tracker.reapply(state(1.0, false));
        assert_eq!(result.resumed, 0);
        assert!(media.paused.get());
        assert!(!media.log.borrow().contains(&"play"));
    }

    #[test]
    fn test_merged_totals_saturate() {
        let mut total = ReconciliationResult {
            reconciled: u32::MAX,
            ..ReconciliationResult::default()
        };
        total.merge(&ReconciliationResult {
            reconciled: 1,
            writes: 2,
            ..ReconciliationResult::default()
        });
        assert_eq!(total.reconciled, u32::MAX);
        assert_eq!(total.writes, 2);
    }

    #[test]
    fn test_infinite_speed_falls_back_to_fastest_rate() {
        let mut tracker = RateTracker::new("data-timewarp-ignore");
        let anim = Rc::new(Anim {
            infinite: true,
            ..Rc::try_unwrap(Anim::new(2.0)).ok().unwrap()
        });
        let live = Media::new(1.0, f64::INFINITY);
        let media_list: Vec<Rc<dyn MediaLike>> = vec![live.clone()];

        let result = tracker.pass(&anims(&[&anim]), &media_list, state(f64::INFINITY, false));
        assert_eq!(result.completed, 0);
        assert_eq!(anim.rate.get(), 2.0 * INFINITE_CLOCK_FACTOR);
        assert_eq!(live.rate.get(), MEDIA_RATE_MAX);
    }

    #[test]
    fn test_failure_is_isolated_to_entity() {
        let mut tracker = RateTracker::new("data-timewarp-ignore");
        let broken = Media::new(1.0, 10.0);
        broken.detached.set(true);
        let healthy = Media::new(1.0, 10.0);
        let list: Vec<Rc<dyn MediaLike>> = vec![broken.clone(), healthy.clone()];

        let result = tracker.pass(&[], &list, state(2.0, false));
        assert_eq!(result.failed, 1);
        assert_eq!(result.reconciled, 1);
        assert_eq!(healthy.rate.get(), 2.0);
    }

    #[test]
    fn test_dropped_entities_are_forgotten() {
        let mut tracker = RateTracker::new("data-timewarp-ignore");
        let anim = Anim::new(1.0);
        tracker.pass(&anims(&[&anim]), &[], state(2.0, false));
        assert_eq!(tracker.tracked(), (1, 0));

        drop(anim);
        tracker.pass(&[], &[], state(2.0, false));
        assert_eq!(tracker.tracked(), (0, 0));
    }

    #[test]
    fn test_reapply_does_not_discover() {
        let mut tracker = RateTracker::new("data-timewarp-ignore");
        let anim = Anim::new(1.0);
        let _list = anims(&[&anim]);

        let result = tracker.reapply(state(2.0, false));
        assert_eq!(result.discovered, 0);
        assert_eq!(anim.rate.get(), 1.0);
    }

    proptest! {
        #[test]
        fn prop_rate_composition(r in 0.1f64..4.0, m1 in 0.1f64..8.0, m2 in 0.1f64..8.0) {
            let mut tracker = RateTracker::new("data-timewarp-ignore");
            let anim = Anim::new(r);
            let list = anims(&[&anim]);

            tracker.pass(&list, &[], state(m1, false));
            prop_assert!((anim.rate.get() - r * m1).abs() < 1e-9);

            tracker.reapply(state(m2, false));
            prop_assert!((anim.rate.get() - r * m2).abs() < 1e-9);
            prop_assert_eq!(tracker.animation_entry(&list[0]).unwrap().developer_rate, r);
        }
    }
}
