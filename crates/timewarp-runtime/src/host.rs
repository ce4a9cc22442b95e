//! Document host - what the engine needs from the page it runs in

use std::rc::Rc;

use timewarp_core::DocumentId;
use timewarp_state::{AnimationLike, MediaLike};
use timewarp_sync::ChildFrame;

/// The document an engine is installed into
pub trait DocumentHost {
    fn id(&self) -> DocumentId;

    /// Whether this document is the top of its frame tree
    fn is_top_level(&self) -> bool;

    /// Every live animation object in the document
    fn animations(&self) -> Vec<Rc<dyn AnimationLike>>;

    /// Every media element in the document
    fn media_elements(&self) -> Vec<Rc<dyn MediaLike>>;

    /// Frame elements currently attached to the document
    fn child_frames(&self) -> Vec<Rc<dyn ChildFrame>>;
}
