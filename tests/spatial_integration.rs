//! Spatial integration tests: stage indexing, touch routing, dragging and
//! blocked motion, all driven through a [`Session`].

use bevy_ecs::entity::Entity;
use glam::Vec2;
use learnstage::actors::ActorBuilder;
use learnstage::components::actor::Actor;
use learnstage::components::coordinator::SyncCoordinator;
use learnstage::components::mapposition::MapPosition;
use learnstage::components::motion::Motion;
use learnstage::events::touch::Dragged;
use learnstage::resources::runtimeconfig::RuntimeConfig;
use learnstage::resources::script::ActorCmd;
use learnstage::resources::stages::StageId;
use learnstage::session::Session;
use learnstage::spatial::{Aabb, Category, Probe};

const DT: f32 = 0.03125;

fn approx_eq(a: Vec2, b: Vec2) -> bool {
    (a - b).length() < 1e-3
}

fn button(session: &mut Session, x: f32, y: f32, stage: u8) -> Entity {
    session.spawn_actor(
        ActorBuilder::sprite(x, y)
            .with_stage(StageId(stage))
            .with_category(Category::UI),
    )
}

fn actor_id(session: &Session, entity: Entity) -> learnstage::spatial::ActorId {
    session.world().get::<Actor>(entity).unwrap().id
}

#[test]
fn test_touch_prefers_higher_stage_then_falls_through() {
    let mut session = Session::default();
    let low = button(&mut session, 100.0, 100.0, 0);
    let high = button(&mut session, 100.0, 100.0, 2);
    session.tick_with(DT);

    let first = session.touch(1, 100.0, 100.0);
    assert_eq!(first.stage, Some(StageId(2)));
    assert_eq!(first.hit.map(|h| h.actor), Some(actor_id(&session, high)));

    // The top button is held, so a second finger reaches the one below.
    let second = session.touch(2, 100.0, 100.0);
    assert_eq!(second.stage, Some(StageId(0)));
    assert_eq!(second.hit.map(|h| h.actor), Some(actor_id(&session, low)));

    assert_eq!(session.release(1, 100.0, 100.0), Some(high));
    assert!(!session.stages().is_claimed(actor_id(&session, high)));
    assert!(session.stages().is_claimed(actor_id(&session, low)));
}

#[test]
fn test_touch_picks_most_recent_actor_within_a_stage() {
    let mut session = Session::default();
    let _older = button(&mut session, 100.0, 100.0, 0);
    let newer = button(&mut session, 110.0, 100.0, 0);
    session.tick_with(DT);

    let report = session.touch(1, 105.0, 100.0);
    assert_eq!(report.hit.map(|h| h.actor), Some(actor_id(&session, newer)));
}

#[test]
fn test_touch_skips_hidden_and_masked_actors() {
    let mut session = Session::default();
    session.spawn_actor(ActorBuilder::sprite(100.0, 100.0));
    session.spawn_actor(
        ActorBuilder::sprite(100.0, 100.0)
            .with_category(Category::UI)
            .hidden(),
    );
    session.tick_with(DT);

    let report = session.touch(1, 100.0, 100.0);
    assert!(report.hit.is_none());
    assert_eq!(report.stage, Some(StageId(0)));
}

#[test]
fn test_touch_without_mask_accepts_any_category() {
    let mut config = RuntimeConfig::new();
    config.set_touch(&[StageId(0)], None);
    let mut session = Session::new(config);
    let plain = session.spawn_actor(ActorBuilder::sprite(100.0, 100.0));
    session.tick_with(DT);

    let report = session.touch(1, 100.0, 100.0);
    assert_eq!(report.hit.map(|h| h.actor), Some(actor_id(&session, plain)));
}

#[test]
fn test_removed_collision_layer_no_longer_answers() {
    let mut session = Session::default();
    let low = button(&mut session, 100.0, 100.0, 0);
    button(&mut session, 100.0, 100.0, 2);
    session.tick_with(DT);

    assert!(session.stages_mut().remove_collision_layer(StageId(2)));
    assert!(!session.stages_mut().remove_collision_layer(StageId(2)));

    let report = session.touch(1, 100.0, 100.0);
    assert_eq!(report.hit.map(|h| h.actor), Some(actor_id(&session, low)));
}

#[test]
fn test_drag_suspends_walk_and_release_resumes_it() {
    let mut session = Session::default();
    let sprite = button(&mut session, 100.0, 100.0, 0);
    session.tick_with(DT);
    session
        .command(sprite, ActorCmd::MoveTo { x: 100.0, y: 300.0 })
        .unwrap();

    session.touch(7, 110.0, 105.0);
    let dragged = *session.world().get::<Dragged>(sprite).unwrap();
    assert_eq!(dragged.identifier, 7);
    assert!(approx_eq(dragged.offset, Vec2::new(-10.0, -5.0)));
    assert!(session.world().get::<Motion>(sprite).unwrap().dragging);

    assert_eq!(session.drag(7, 210.0, 205.0), Some(sprite));
    for _ in 0..10 {
        session.tick_with(DT);
    }
    let held = session.world().get::<MapPosition>(sprite).unwrap().pos;
    assert!(approx_eq(held, Vec2::new(200.0, 200.0)));
    assert_eq!(
        session.world().get::<SyncCoordinator>(sprite).unwrap().pending(),
        1
    );

    assert_eq!(session.release(7, 210.0, 205.0), Some(sprite));
    assert!(session.world().get::<Dragged>(sprite).is_none());
    for _ in 0..40 {
        session.tick_with(DT);
    }
    let arrived = session.world().get::<MapPosition>(sprite).unwrap().pos;
    assert!(approx_eq(arrived, Vec2::new(100.0, 300.0)));
    assert_eq!(
        session.world().get::<SyncCoordinator>(sprite).unwrap().pending(),
        0
    );
}

#[test]
fn test_blocked_walker_stops_in_front_of_wall() {
    let mut session = Session::default();
    let walker = session.spawn_actor(ActorBuilder::sprite(0.0, 0.0).blocked_by(Category::DEFAULT));
    let _wall = session.spawn_actor(ActorBuilder::sprite(100.0, 0.0));
    session.command(walker, ActorCmd::MoveTo { x: 200.0, y: 0.0 }).unwrap();

    for _ in 0..40 {
        session.tick_with(DT);
    }
    let pos = session.world().get::<MapPosition>(walker).unwrap().pos;
    assert!(approx_eq(pos, Vec2::new(62.5, 0.0)));
    let motion = session.world().get::<Motion>(walker).unwrap();
    assert!(!motion.in_movement);
    assert!(approx_eq(motion.destination, pos));
    assert_eq!(
        session.world().get::<SyncCoordinator>(walker).unwrap().pending(),
        0
    );
}

#[test]
fn test_walker_passes_through_categories_it_ignores() {
    let mut session = Session::default();
    let walker = session.spawn_actor(ActorBuilder::sprite(0.0, 0.0).blocked_by(Category::ENEMY));
    session.spawn_actor(ActorBuilder::sprite(100.0, 0.0));
    session.command(walker, ActorCmd::MoveTo { x: 200.0, y: 0.0 }).unwrap();

    for _ in 0..40 {
        session.tick_with(DT);
    }
    let pos = session.world().get::<MapPosition>(walker).unwrap().pos;
    assert!(approx_eq(pos, Vec2::new(200.0, 0.0)));
}

#[test]
fn test_actor_spanning_cells_is_reported_once() {
    let mut config = RuntimeConfig::new();
    config.set_grid_size(50.0, 50.0);
    let mut session = Session::new(config);
    let wide = session.spawn_actor(ActorBuilder::sprite(50.0, 50.0).with_collider(120.0, 120.0));
    let small = session.spawn_actor(ActorBuilder::sprite(60.0, 60.0).with_collider(10.0, 10.0));
    session.tick_with(DT);

    let probe = Probe::shape(Aabb::from_min_size(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0)));
    let (wide_id, small_id) = (actor_id(&session, wide), actor_id(&session, small));
    let mut stages = session.stages_mut();
    let stage = stages.stage_mut(StageId(0));

    let hits = stage.search_all(&probe, None);
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().any(|h| h.actor == wide_id));
    assert!(hits.iter().any(|h| h.actor == small_id));

    let first = stage.search_skip(&probe, None, 0).map(|h| h.actor);
    let second = stage.search_skip(&probe, None, 1).map(|h| h.actor);
    assert!(first.is_some() && second.is_some());
    assert_ne!(first, second);
    assert!(stage.search_skip(&probe, None, 2).is_none());
}

#[test]
fn test_removed_actor_leaves_stage_and_drops_claim() {
    let mut session = Session::default();
    let sprite = button(&mut session, 100.0, 100.0, 0);
    session.tick_with(DT);
    let id = actor_id(&session, sprite);
    session.touch(1, 100.0, 100.0);
    assert!(session.stages().is_claimed(id));

    session.command(sprite, ActorCmd::Remove).unwrap();
    assert!(!session.stages().is_claimed(id));
    assert!(!session.stages().stage(StageId(0)).unwrap().contains(id));
    assert!(session.touch(2, 100.0, 100.0).hit.is_none());
}

#[test]
fn test_touch_right_after_spawn_finds_the_actor() {
    let mut session = Session::default();
    let sprite = button(&mut session, 100.0, 100.0, 0);

    let report = session.touch(1, 100.0, 100.0);
    assert_eq!(report.hit.map(|h| h.actor), Some(actor_id(&session, sprite)));
}

#[test]
fn test_touch_mid_walk_uses_current_bounds() {
    let mut session = Session::default();
    let sprite = button(&mut session, 100.0, 100.0, 0);
    session
        .command(sprite, ActorCmd::MoveTo { x: 300.0, y: 100.0 })
        .unwrap();
    for _ in 0..16 {
        session.tick_with(DT);
    }
    let here = session.world().get::<MapPosition>(sprite).unwrap().pos;
    assert!(approx_eq(here, Vec2::new(200.0, 100.0)));

    // Bounds from the previous tick would still cover x = 180.
    assert!(session.touch(1, 180.0, 100.0).hit.is_none());
    let report = session.touch(2, 212.0, 100.0);
    assert_eq!(report.hit.map(|h| h.actor), Some(actor_id(&session, sprite)));
}

#[test]
fn test_moved_body_is_indexed_within_the_tick() {
    let mut session = Session::default();
    let sprite = button(&mut session, 0.0, 0.0, 0);
    session
        .command(sprite, ActorCmd::MoveTo { x: 100.0, y: 0.0 })
        .unwrap();
    session.tick_with(DT);

    let id = actor_id(&session, sprite);
    let bounds = session.stages().stage(StageId(0)).unwrap().body(id).unwrap().bounds;
    assert!(approx_eq(bounds.center(), Vec2::new(6.25, 0.0)));
}
