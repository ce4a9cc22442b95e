//! Speed state flowing through a tree of documents

use serde_json::json;
use timewarp_runtime::{EngineConfig, RoleConfig};
use timewarp_sync::SyncRole;
use timewarp_test::{init_test_logging, BusConfig, SimAnimation, SimWorld, FRAME_MS};
use timewarp_wire::{SyncMessage, SYNC_MARKER};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_existing_child_converges_through_hostile_bus() {
    init_test_logging();
    let mut world = SimWorld::with_bus(BusConfig::hostile(), 42);
    let top = world.add_top_document();
    let (child, _) = world.add_child_document(top, true);

    let child_engine = world.install(child, EngineConfig::default()).unwrap();
    let top_engine = world.install(top, EngineConfig::default()).unwrap();
    assert_eq!(child_engine.role(), Some(SyncRole::Child));
    assert_eq!(top_engine.role(), Some(SyncRole::Top));

    let animation = SimAnimation::new(None);
    world.document(child).unwrap().add_animation(&animation);
    world.step(FRAME_MS);
    assert_eq!(child_engine.tracked(), (1, 0));

    top_engine.set_speed(0.25).unwrap();
    world.step(FRAME_MS);

    assert_eq!(child_engine.get_speed(), 0.25);
    assert!(approx(animation.rate(), 0.25));
    // duplicates re-assert an already-correct rate
    assert_eq!(animation.rate_writes(), 1);
}

#[test]
fn test_relay_reaches_grandchildren() {
    init_test_logging();
    let mut world = SimWorld::new();
    let top = world.add_top_document();
    let (child, _) = world.add_child_document(top, true);
    let (grandchild, _) = world.add_child_document(child, true);

    let top_engine = world.install(top, EngineConfig::default()).unwrap();
    let child_engine = world.install(child, EngineConfig::default()).unwrap();
    let grandchild_engine = world.install(grandchild, EngineConfig::default()).unwrap();

    top_engine.set_speed(0.5).unwrap();
    world.step(FRAME_MS);
    assert_eq!(child_engine.get_speed(), 0.5);
    assert_eq!(grandchild_engine.get_speed(), 0.5);

    top_engine.pause();
    world.step(FRAME_MS);
    assert_eq!(grandchild_engine.get_speed(), 0.0);
    assert_eq!(grandchild_engine.state().speed.value(), 0.5);

    top_engine.play();
    world.step(FRAME_MS);
    assert_eq!(grandchild_engine.get_speed(), 0.5);
}

#[test]
fn test_late_frame_receives_state_once_loaded() {
    init_test_logging();
    let mut world = SimWorld::new();
    let top = world.add_top_document();
    let top_engine = world.install(top, EngineConfig::default()).unwrap();
    top_engine.set_speed(0.25).unwrap();
    world.step(FRAME_MS);

    let (child, _) = world.add_child_document(top, false);
    let child_engine = world.install(child, EngineConfig::default()).unwrap();
    let animation = SimAnimation::new(None);
    world.document(child).unwrap().add_animation(&animation);
    world.step(FRAME_MS);
    assert_eq!(child_engine.get_speed(), 1.0);

    world.load_frame(child);
    world.step(FRAME_MS);
    assert_eq!(child_engine.get_speed(), 0.25);
    assert!(approx(animation.rate(), 0.25));

    // a second load event does not resend
    let posted = world.bus().stats().posted;
    world.load_frame(child);
    world.step(FRAME_MS);
    assert_eq!(world.bus().stats().posted, posted);
    assert_eq!(top_engine.stats().sync.catch_ups, 1);
}

#[test]
fn test_child_local_change_stays_local() {
    init_test_logging();
    let mut world = SimWorld::new();
    let top = world.add_top_document();
    let (child, _) = world.add_child_document(top, true);
    let (grandchild, _) = world.add_child_document(child, true);

    let top_engine = world.install(top, EngineConfig::default()).unwrap();
    let child_engine = world.install(child, EngineConfig::default()).unwrap();
    let grandchild_engine = world.install(grandchild, EngineConfig::default()).unwrap();
    world.step(FRAME_MS);

    child_engine.set_speed(3.0).unwrap();
    assert_eq!(world.bus().pending(), 0);
    world.step(FRAME_MS);

    assert_eq!(child_engine.get_speed(), 3.0);
    assert_eq!(top_engine.get_speed(), 1.0);
    assert_eq!(grandchild_engine.get_speed(), 1.0);
}

#[test]
fn test_foreign_and_malformed_messages() {
    init_test_logging();
    let mut world = SimWorld::new();
    let top = world.add_top_document();
    let (child, _) = world.add_child_document(top, true);
    let child_engine = world.install(child, EngineConfig::default()).unwrap();

    world.bus().post(child, json!({ "type": "resize", "width": 300 }));
    world
        .bus()
        .post(child, json!({ "kind": SYNC_MARKER, "speedMultiplier": "fast", "paused": false }));
    world.step(FRAME_MS);

    let stats = child_engine.stats();
    assert_eq!(child_engine.get_speed(), 1.0);
    assert_eq!(stats.sync.messages_ignored, 1);
    assert_eq!(stats.messages_rejected, 1);
    assert_eq!(stats.messages_applied, 0);
}

#[test]
fn test_top_ignores_sync_messages() {
    init_test_logging();
    let mut world = SimWorld::new();
    let top = world.add_top_document();
    let top_engine = world.install(top, EngineConfig::default()).unwrap();

    world.bus().post(top, SyncMessage::new(4.0, false).encode());
    world.step(FRAME_MS);
    assert_eq!(top_engine.get_speed(), 1.0);
}

#[test]
fn test_identical_message_twice_writes_once() {
    init_test_logging();
    let mut world = SimWorld::new();
    let top = world.add_top_document();
    let (child, _) = world.add_child_document(top, true);
    let child_engine = world.install(child, EngineConfig::default()).unwrap();

    let animation = SimAnimation::new(None);
    world.document(child).unwrap().add_animation(&animation);
    world.step(FRAME_MS);

    let payload = SyncMessage::new(0.5, false).encode();
    child_engine.on_message(&payload);
    child_engine.on_message(&payload);

    assert_eq!(animation.rate_writes(), 1);
    assert_eq!(child_engine.stats().messages_applied, 2);
}

#[test]
fn test_detached_frame_not_messaged() {
    init_test_logging();
    let mut world = SimWorld::new();
    let top = world.add_top_document();
    let (child, _) = world.add_child_document(top, true);
    let top_engine = world.install(top, EngineConfig::default()).unwrap();
    let child_engine = world.install(child, EngineConfig::default()).unwrap();
    world.step(FRAME_MS);

    world.detach_frame(child);
    let posted = world.bus().stats().posted;
    top_engine.set_speed(2.0).unwrap();
    world.step(FRAME_MS);

    assert_eq!(world.bus().stats().posted, posted);
    assert_eq!(child_engine.get_speed(), 1.0);
}

#[test]
fn test_infinite_speed_crosses_documents() {
    init_test_logging();
    let mut world = SimWorld::new();
    let top = world.add_top_document();
    let (child, _) = world.add_child_document(top, true);
    let top_engine = world.install(top, EngineConfig::default()).unwrap();
    let child_engine = world.install(child, EngineConfig::default()).unwrap();

    top_engine.set_speed(f64::INFINITY).unwrap();
    world.step(FRAME_MS);
    assert!(child_engine.get_speed().is_infinite());
}

#[test]
fn test_role_override() {
    init_test_logging();
    let mut world = SimWorld::new();
    let top = world.add_top_document();
    let (child, _) = world.add_child_document(top, true);

    let config = EngineConfig {
        role: RoleConfig::Top,
        ..EngineConfig::default()
    };
    let child_engine = world.install(child, config).unwrap();
    assert_eq!(child_engine.role(), Some(SyncRole::Top));

    world.bus().post(child, SyncMessage::new(0.5, false).encode());
    world.step(FRAME_MS);
    assert_eq!(child_engine.get_speed(), 1.0);
}
