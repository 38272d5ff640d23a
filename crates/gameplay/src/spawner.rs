//! Spawn controller state machine.
//!
//! `Idle` (no controllable fruit, terminal once the round is over) ->
//! `Spawned` (fruit hovering, awaiting release) -> `Waiting` (drop delay
//! running) -> back to `Spawned`. Transitions are event-driven: a
//! `FruitReleased` event arms the delay timer; there is no per-tick polling
//! of the controllable reference.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use fd_core::{CueEvent, CueKind, FruitReleased, FruitTier, GameConfigRes, RoundState, Unsettled};
use rand::{rngs::StdRng, Rng};

use crate::pool::{self, FruitPool, PoolSlot};

#[derive(Resource, Debug)]
pub enum SpawnPhase {
    /// No controllable fruit and no pending spawn.
    Idle,
    /// A controllable fruit is hovering at the drop height.
    Spawned,
    /// A release happened; the next spawn fires when this timer ends.
    Waiting(Timer),
}

/// Dedicated spawn RNG so tier sequences are reproducible under a fixed seed.
#[derive(Resource)]
pub struct SpawnRng(pub StdRng);

// Domain separation constant: keeps the tier stream distinct from any other
// use of the same base seed.
pub const SPAWN_RNG_SALT: u64 = 0x06D1_E5EED;

/// System: a released fruit schedules the next spawn after the configured delay.
pub fn arm_after_release(
    mut released: EventReader<FruitReleased>,
    phase: Option<ResMut<SpawnPhase>>,
    cfg: Res<GameConfigRes>,
) {
    let Some(mut phase) = phase else {
        released.clear();
        return;
    };
    for _ in released.read() {
        if matches!(*phase, SpawnPhase::Spawned) {
            *phase = SpawnPhase::Waiting(Timer::from_seconds(
                cfg.0.spawn.delay_secs.max(0.0),
                TimerMode::Once,
            ));
        }
    }
}

/// System: tick the waiting timer; on expiry acquire a pooled fruit, give it
/// a random tier and hand it to the player. If the round ended while we were
/// waiting, fall to `Idle` and stay there.
pub fn run_spawn_timer(
    time: Res<Time>,
    mut commands: Commands,
    phase: Option<ResMut<SpawnPhase>>,
    pool: Option<ResMut<FruitPool>>,
    round: Option<ResMut<RoundState>>,
    rng: Option<ResMut<SpawnRng>>,
    cfg: Res<GameConfigRes>,
    mut cues: EventWriter<CueEvent>,
) {
    let (Some(mut phase), Some(mut pool), Some(mut round), Some(mut rng)) =
        (phase, pool, round, rng)
    else {
        return;
    };
    let SpawnPhase::Waiting(timer) = &mut *phase else {
        return;
    };
    timer.tick(time.delta());
    if !timer.finished() {
        return;
    }
    if round.is_over {
        *phase = SpawnPhase::Idle;
        return;
    }

    let slot = pool::acquire(&mut pool, &mut commands, &cfg);
    let tier = rng.0.gen_range(0..cfg.0.spawn.tier_choices.max(1));
    activate(&mut commands, slot, tier, &cfg);
    round.controllable = Some(slot.fruit);
    cues.write(CueEvent(CueKind::Next));
    *phase = SpawnPhase::Spawned;
}

/// Wake a pooled fruit as the new controllable: visible, kinematic at the
/// drop height, collider sized for its tier.
fn activate(commands: &mut Commands, slot: PoolSlot, tier: u32, cfg: &GameConfigRes) {
    commands
        .entity(slot.fruit)
        .insert((
            FruitTier(tier),
            Transform::from_xyz(0.0, cfg.0.field.drop_y, 0.0),
            Visibility::Visible,
            RigidBody::KinematicPositionBased,
            Collider::ball(cfg.0.tier_radius(tier)),
            Velocity::zero(),
        ))
        .remove::<RigidBodyDisabled>()
        .remove::<Unsettled>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::time::Duration;

    fn test_app() -> App {
        // No MinimalPlugins: `Time` is inserted and advanced by hand so delay
        // assertions are exact.
        let mut app = App::new();
        app.add_plugins(fd_core::CorePlugin);
        app.insert_resource(Time::<()>::default());
        app.insert_resource(GameConfigRes::default());
        app.insert_resource(FruitPool::default());
        app.insert_resource(RoundState::default());
        app.insert_resource(SpawnRng(StdRng::seed_from_u64(SPAWN_RNG_SALT)));
        app.add_systems(Update, (arm_after_release, run_spawn_timer).chain());
        app
    }

    fn advance(app: &mut App, secs: f32) {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(secs));
        app.update();
    }

    fn fruit_count(app: &mut App) -> usize {
        let world = app.world_mut();
        let mut q = world.query::<&fd_core::Fruit>();
        q.iter(world).count()
    }

    #[test]
    fn release_spawns_exactly_one_after_delay() {
        let mut app = test_app();
        app.insert_resource(SpawnPhase::Spawned);
        app.world_mut().send_event(FruitReleased {
            fruit: Entity::from_raw(1),
        });
        app.update(); // arm the timer
        advance(&mut app, 1.9);
        assert_eq!(fruit_count(&mut app), 0, "no spawn before the delay");
        advance(&mut app, 0.2);
        assert_eq!(fruit_count(&mut app), 1, "exactly one spawn after 2s");
        // Further ticks stay in Spawned; nothing else appears.
        advance(&mut app, 5.0);
        assert_eq!(fruit_count(&mut app), 1);
        assert!(matches!(
            *app.world().resource::<SpawnPhase>(),
            SpawnPhase::Spawned
        ));
    }

    #[test]
    fn assigned_tiers_stay_in_choice_range() {
        let mut app = test_app();
        for _ in 0..20 {
            app.insert_resource(SpawnPhase::Waiting(Timer::from_seconds(
                0.0,
                TimerMode::Once,
            )));
            advance(&mut app, 0.1);
        }
        let world = app.world_mut();
        let mut q = world.query::<&FruitTier>();
        let mut seen = 0;
        for tier in q.iter(world) {
            assert!(tier.0 < 3, "tier {} outside {{0,1,2}}", tier.0);
            seen += 1;
        }
        assert_eq!(seen, 20);
    }

    #[test]
    fn spawn_sets_controllable_and_plays_next_cue() {
        let mut app = test_app();
        app.insert_resource(SpawnPhase::Waiting(Timer::from_seconds(
            0.0,
            TimerMode::Once,
        )));
        advance(&mut app, 0.1);
        let round = app.world().resource::<RoundState>();
        assert!(round.controllable.is_some());
        let cues = app.world().resource::<Events<CueEvent>>();
        let mut cursor = cues.get_cursor();
        assert!(cursor
            .read(cues)
            .any(|CueEvent(kind)| *kind == CueKind::Next));
    }

    #[test]
    fn over_round_falls_idle_and_never_respawns() {
        let mut app = test_app();
        app.world_mut().resource_mut::<RoundState>().is_over = true;
        app.insert_resource(SpawnPhase::Waiting(Timer::from_seconds(
            0.0,
            TimerMode::Once,
        )));
        advance(&mut app, 1.0);
        assert_eq!(fruit_count(&mut app), 0);
        assert!(matches!(
            *app.world().resource::<SpawnPhase>(),
            SpawnPhase::Idle
        ));
        // A stray release while over must not re-arm anything.
        app.world_mut().send_event(FruitReleased {
            fruit: Entity::from_raw(1),
        });
        advance(&mut app, 5.0);
        assert!(matches!(
            *app.world().resource::<SpawnPhase>(),
            SpawnPhase::Idle
        ));
    }

    #[test]
    fn spawn_reuses_pool_before_growing() {
        let mut app = test_app();
        // First spawn grows the pool to one.
        app.insert_resource(SpawnPhase::Waiting(Timer::from_seconds(
            0.0,
            TimerMode::Once,
        )));
        advance(&mut app, 0.1);
        // Release the fruit back, then spawn again: pool must stay size one.
        {
            let world = app.world_mut();
            let fruit = world.resource::<RoundState>().controllable.unwrap();
            world.resource_mut::<FruitPool>().release(fruit);
        }
        app.insert_resource(SpawnPhase::Waiting(Timer::from_seconds(
            0.0,
            TimerMode::Once,
        )));
        advance(&mut app, 0.1);
        assert_eq!(app.world().resource::<FruitPool>().len(), 1);
        assert_eq!(fruit_count(&mut app), 1);
    }
}
