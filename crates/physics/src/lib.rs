// Physics crate: Rapier wiring, the play-field boundaries raised at round
// start, and the over-line watch that ends the round when the pile reaches
// the top.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use fd_core::{
    Fruit, FruitTier, GameConfigRes, GameOverRequested, GameStartRequested, PostPhysicsAdjustSet,
    RoundState, RoundTeardown,
};
use std::collections::HashMap;

/// Marker for the static boundary colliders (floor + side walls).
#[derive(Component, Debug)]
pub struct FieldWall;

/// Per-fruit time spent above the over-line this round.
#[derive(Resource, Debug, Default)]
pub struct OverWatch {
    clocks: HashMap<Entity, f32>,
    warned: bool,
}

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(100.0));
        app.init_resource::<OverWatch>();
        app.add_systems(Update, (raise_field, teardown_field));
        app.add_systems(Update, watch_over_line.in_set(PostPhysicsAdjustSet));
    }
}

/// System: a start request raises floor and side walls sized from the field
/// config. Idempotent while walls exist.
pub fn raise_field(
    mut requests: EventReader<GameStartRequested>,
    mut commands: Commands,
    cfg: Res<GameConfigRes>,
    existing: Query<(), With<FieldWall>>,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();
    if !existing.is_empty() {
        return;
    }
    let f = &cfg.0.field;
    let half_w = f.width * 0.5;
    let half_t = f.wall_thickness * 0.5;
    let half_h = f.height * 0.5;

    // Floor surface at y = 0, walls rising to the field height.
    commands.spawn((
        FieldWall,
        RigidBody::Fixed,
        Collider::cuboid(half_w + f.wall_thickness, half_t),
        Transform::from_xyz(0.0, -half_t, 0.0),
    ));
    for side in [-1.0f32, 1.0] {
        commands.spawn((
            FieldWall,
            RigidBody::Fixed,
            Collider::cuboid(half_t, half_h),
            Transform::from_xyz(side * (half_w + half_t), half_h, 0.0),
        ));
    }
    info!(width = f.width, height = f.height, "play field raised");
}

/// System: the round teardown drops the walls and the over-line bookkeeping.
pub fn teardown_field(
    mut teardowns: EventReader<RoundTeardown>,
    mut commands: Commands,
    mut watch: ResMut<OverWatch>,
    walls: Query<Entity, With<FieldWall>>,
) {
    if teardowns.is_empty() {
        return;
    }
    teardowns.clear();
    for wall in walls.iter() {
        commands.entity(wall).despawn();
    }
    watch.clocks.clear();
    watch.warned = false;
}

/// System: accumulate time for every settled fruit poking above the
/// over-line; past the grace period the round ends. Leaving the line resets
/// a fruit's clock.
pub fn watch_over_line(
    time: Res<Time>,
    round: Option<Res<RoundState>>,
    cfg: Res<GameConfigRes>,
    mut watch: ResMut<OverWatch>,
    fruits: Query<(Entity, &Transform, &FruitTier), (With<Fruit>, Without<RigidBodyDisabled>)>,
    mut over: EventWriter<GameOverRequested>,
) {
    let Some(round) = round else {
        return;
    };
    if round.is_over {
        return;
    }
    let dt = time.delta_secs();
    let grace = cfg.0.field.over_grace_secs.max(0.0);
    let mut tripped = false;
    let OverWatch { clocks, warned } = &mut *watch;

    clocks.retain(|entity, _| {
        fruits
            .get(*entity)
            .map(|(_, tf, tier)| above_line(&cfg, tf, tier))
            .unwrap_or(false)
    });
    for (entity, tf, tier) in fruits.iter() {
        if round.controllable == Some(entity) {
            continue;
        }
        if !above_line(&cfg, tf, tier) {
            continue;
        }
        let clock = clocks.entry(entity).or_insert(0.0);
        *clock += dt;
        if *clock >= grace * 0.5 && !*warned {
            *warned = true;
            warn!("pile is reaching the over-line");
        }
        if *clock >= grace {
            tripped = true;
        }
    }
    if tripped {
        over.write(GameOverRequested);
    }
}

fn above_line(cfg: &GameConfigRes, tf: &Transform, tier: &FruitTier) -> bool {
    tf.translation.y + cfg.0.tier_radius(tier.0) > cfg.0.field.over_line_y
}
