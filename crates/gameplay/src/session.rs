//! Round lifecycle: the round context (state, pool, spawn machine) is built
//! on a start request and removed wholesale on reset. Nothing round-scoped
//! persists across resets; the persisted high score is the only survivor.

use bevy::prelude::*;
use fd_core::{
    CueEvent, CueKind, GameConfigRes, GameStartRequested, ResetRequested, RngSeed, RoundState,
    RoundTeardown,
};
use rand::{rngs::StdRng, SeedableRng};

use crate::pool::FruitPool;
use crate::round::OverSequence;
use crate::spawner::{SpawnPhase, SpawnRng, SPAWN_RNG_SALT};

/// Delay between the retry cue and the actual teardown.
pub const RESET_DELAY_SECS: f32 = 1.0;

#[derive(Resource, Deref, DerefMut)]
pub struct ResetTimer(Timer);

/// System: build the round context. Ignored while a round already exists.
pub fn handle_game_start(
    mut requests: EventReader<GameStartRequested>,
    mut commands: Commands,
    existing: Option<Res<RoundState>>,
    cfg: Res<GameConfigRes>,
    seed: Option<Res<RngSeed>>,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();
    if existing.is_some() {
        return;
    }
    let base = seed.map(|s| s.0).unwrap_or(0);
    commands.insert_resource(RoundState::default());
    commands.insert_resource(FruitPool::default());
    commands.insert_resource(SpawnRng(StdRng::seed_from_u64(
        base.wrapping_add(SPAWN_RNG_SALT),
    )));
    // First spawn arrives after the start delay rather than synchronously.
    commands.insert_resource(SpawnPhase::Waiting(Timer::from_seconds(
        cfg.0.spawn.start_delay_secs.max(0.0),
        TimerMode::Once,
    )));
    info!("round started");
}

/// System: a retry request plays the button cue and schedules the teardown.
pub fn handle_reset_request(
    mut requests: EventReader<ResetRequested>,
    mut commands: Commands,
    round: Option<Res<RoundState>>,
    pending: Option<Res<ResetTimer>>,
    mut cues: EventWriter<CueEvent>,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();
    if round.is_none() || pending.is_some() {
        return;
    }
    cues.write(CueEvent(CueKind::Button));
    commands.insert_resource(ResetTimer(Timer::from_seconds(
        RESET_DELAY_SECS,
        TimerMode::Once,
    )));
}

/// System: after the reset delay, despawn every pooled entity and drop the
/// round resources, then tell the other crates the round is gone.
pub fn run_reset(
    time: Res<Time>,
    mut commands: Commands,
    timer: Option<ResMut<ResetTimer>>,
    pool: Option<Res<FruitPool>>,
    mut teardown: EventWriter<RoundTeardown>,
) {
    let Some(mut timer) = timer else {
        return;
    };
    timer.tick(time.delta());
    if !timer.just_finished() {
        return;
    }
    if let Some(pool) = pool {
        for slot in pool.slots() {
            commands.entity(slot.fruit).despawn();
            commands.entity(slot.effect).despawn();
        }
    }
    commands.remove_resource::<FruitPool>();
    commands.remove_resource::<RoundState>();
    commands.remove_resource::<SpawnPhase>();
    commands.remove_resource::<SpawnRng>();
    // A reset can land while an end sequence is still running.
    commands.remove_resource::<OverSequence>();
    commands.remove_resource::<ResetTimer>();
    teardown.write(RoundTeardown);
    info!("round torn down");
}
