//! Fixtures shared by the timewarp benchmarks

use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use timewarp_runtime::{Engine, EngineConfig};
use timewarp_test::{SimAnimation, SimDocument, SimMedia, SimWorld};

/// A document populated with entities, engine installed without polling
pub struct Fixture {
    pub world: SimWorld,
    pub document: Rc<SimDocument>,
    pub engine: Engine,
    pub animations: Vec<Rc<SimAnimation>>,
    pub media: Vec<Rc<SimMedia>>,
}

/// Build a page with `animations` animations and `media` media elements,
/// all discovered. Developer rates are drawn from a seeded generator.
pub fn populated_page(animations: usize, media: usize, seed: u64) -> Fixture {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut world = SimWorld::new();
    let top = world.add_top_document();

    let engine = world
        .install(top, EngineConfig::manual())
        .expect("document was just added");
    let document = world.document(top).expect("document was just added");

    let animations: Vec<_> = (0..animations)
        .map(|_| SimAnimation::with_rate(None, rng.gen_range(0.25..4.0)))
        .collect();
    let media: Vec<_> = (0..media).map(|_| SimMedia::new(rng.gen_range(10.0..600.0))).collect();

    for animation in &animations {
        document.add_animation(animation);
    }
    for element in &media {
        document.add_media(element);
    }
    engine.reconcile_now();
    world.step(16.0);

    Fixture {
        world,
        document,
        engine,
        animations,
        media,
    }
}
