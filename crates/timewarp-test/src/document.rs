//! Simulated document

use std::cell::RefCell;
use std::rc::Rc;

use timewarp_core::{DocumentId, FrameId};
use timewarp_runtime::DocumentHost;
use timewarp_state::{AnimationLike, MediaLike};
use timewarp_sync::ChildFrame;

use crate::{SimAnimation, SimFrame, SimMedia};

/// A document with its live entities and frame elements
pub struct SimDocument {
    id: DocumentId,
    top_level: bool,
    animations: RefCell<Vec<Rc<SimAnimation>>>,
    media: RefCell<Vec<Rc<SimMedia>>>,
    frames: RefCell<Vec<Rc<SimFrame>>>,
}

impl SimDocument {
    pub fn new(id: DocumentId, top_level: bool) -> Self {
        SimDocument {
            id,
            top_level,
            animations: RefCell::new(Vec::new()),
            media: RefCell::new(Vec::new()),
            frames: RefCell::new(Vec::new()),
        }
    }

    pub fn add_animation(&self, animation: &Rc<SimAnimation>) {
        self.animations.borrow_mut().push(animation.clone());
    }

    pub fn remove_animation(&self, animation: &Rc<SimAnimation>) {
        self.animations
            .borrow_mut()
            .retain(|candidate| !Rc::ptr_eq(candidate, animation));
    }

    pub fn add_media(&self, media: &Rc<SimMedia>) {
        self.media.borrow_mut().push(media.clone());
    }

    pub fn remove_media(&self, media: &Rc<SimMedia>) {
        self.media
            .borrow_mut()
            .retain(|candidate| !Rc::ptr_eq(candidate, media));
    }

    pub fn attach_frame(&self, frame: &Rc<SimFrame>) {
        self.frames.borrow_mut().push(frame.clone());
    }

    /// Remove a frame element, returning it if present
    pub fn detach_frame(&self, id: FrameId) -> Option<Rc<SimFrame>> {
        let mut frames = self.frames.borrow_mut();
        let index = frames.iter().position(|frame| frame.id() == id)?;
        Some(frames.remove(index))
    }

    pub fn frame(&self, id: FrameId) -> Option<Rc<SimFrame>> {
        self.frames
            .borrow()
            .iter()
            .find(|frame| frame.id() == id)
            .cloned()
    }

    /// Host tick for every entity of the document
    pub fn advance(&self, dt_ms: f64) {
        for animation in self.animations.borrow().iter() {
            animation.advance(dt_ms);
        }
        for media in self.media.borrow().iter() {
            media.advance(dt_ms);
        }
    }
}

impl DocumentHost for SimDocument {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn is_top_level(&self) -> bool {
        self.top_level
    }

    fn animations(&self) -> Vec<Rc<dyn AnimationLike>> {
        self.animations
            .borrow()
            .iter()
            .map(|animation| animation.clone() as Rc<dyn AnimationLike>)
            .collect()
    }

    fn media_elements(&self) -> Vec<Rc<dyn MediaLike>> {
        self.media
            .borrow()
            .iter()
            .map(|media| media.clone() as Rc<dyn MediaLike>)
            .collect()
    }

    fn child_frames(&self) -> Vec<Rc<dyn ChildFrame>> {
        self.frames
            .borrow()
            .iter()
            .map(|frame| frame.clone() as Rc<dyn ChildFrame>)
            .collect()
    }
}
