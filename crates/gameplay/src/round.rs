//! Game-over handling: idempotent trigger, staggered hide of every live
//! fruit, then the high-score commit and closing cue.

use bevy::prelude::*;
use bevy_rapier2d::prelude::RigidBodyDisabled;
use fd_core::{CueEvent, CueKind, GameConfigRes, GameOverRequested, RoundState};
use std::collections::VecDeque;

use crate::highscore::{self, HighScore};
use crate::pool::FruitPool;

/// Seconds between consecutive hides in the end sequence.
pub const HIDE_STEP_SECS: f32 = 0.1;
/// Pause after the last hide before the score is committed.
pub const FINALE_SECS: f32 = 1.0;

/// Running end-of-round sequence. Present only between the first
/// `GameOverRequested` and the final cue; a second request while this exists
/// is ignored rather than restarting it.
#[derive(Resource, Debug)]
pub struct OverSequence {
    pending: VecDeque<Entity>,
    step: Timer,
    finale: Timer,
}

impl OverSequence {
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

/// System: flip the round into its terminal state. Physics stops for every
/// live fruit immediately; the hides are staggered by `run_over_sequence`.
pub fn handle_game_over(
    mut requests: EventReader<GameOverRequested>,
    mut commands: Commands,
    round: Option<ResMut<RoundState>>,
    pool: Option<ResMut<FruitPool>>,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();
    let (Some(mut round), Some(mut pool)) = (round, pool) else {
        return;
    };
    if round.is_over {
        // Idempotent: the first request already owns the end sequence.
        return;
    }
    round.is_over = true;
    round.controllable = None;

    let mut pending: VecDeque<Entity> = pool.active_fruits().collect();
    info!(live = pending.len(), "game over, running end sequence");
    for fruit in &pending {
        commands.entity(*fruit).insert(RigidBodyDisabled);
    }
    // First hide lands immediately; the step timer paces the rest.
    if let Some(first) = pending.pop_front() {
        hide(&mut commands, &mut pool, first);
    }
    commands.insert_resource(OverSequence {
        pending,
        step: Timer::from_seconds(HIDE_STEP_SECS, TimerMode::Repeating),
        finale: Timer::from_seconds(FINALE_SECS, TimerMode::Once),
    });
}

/// System: pace the staggered hides, then commit the record and play the
/// closing cue one finale-length after the last fruit disappears.
pub fn run_over_sequence(
    time: Res<Time>,
    mut commands: Commands,
    seq: Option<ResMut<OverSequence>>,
    round: Option<Res<RoundState>>,
    pool: Option<ResMut<FruitPool>>,
    highscore: Option<ResMut<HighScore>>,
    cfg: Res<GameConfigRes>,
    mut cues: EventWriter<CueEvent>,
) {
    let (Some(mut seq), Some(round), Some(mut pool)) = (seq, round, pool) else {
        return;
    };
    if !seq.pending.is_empty() {
        seq.step.tick(time.delta());
        for _ in 0..seq.step.times_finished_this_tick() {
            let Some(next) = seq.pending.pop_front() else {
                break;
            };
            hide(&mut commands, &mut pool, next);
        }
        return;
    }
    seq.finale.tick(time.delta());
    if !seq.finale.just_finished() {
        return;
    }

    let score = round.score;
    match highscore::commit(&cfg.0.highscore.path, score) {
        Ok((best, new_record)) => {
            if let Some(mut hs) = highscore {
                hs.0 = best;
            }
            info!(score, best, new_record, "final score");
        }
        Err(e) => warn!("HIGHSCORE: {e}"),
    }
    cues.write(CueEvent(CueKind::Over));
    commands.remove_resource::<OverSequence>();
}

fn hide(commands: &mut Commands, pool: &mut FruitPool, fruit: Entity) {
    commands.entity(fruit).insert(Visibility::Hidden);
    pool.release(fruit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use fd_core::Fruit;
    use std::time::Duration;

    fn test_app(highscore_path: &str) -> App {
        let mut app = App::new();
        app.add_plugins(fd_core::CorePlugin);
        app.insert_resource(Time::<()>::default());
        let mut cfg = fd_config::GameConfig::default();
        cfg.highscore.path = highscore_path.into();
        app.insert_resource(GameConfigRes(cfg));
        app.insert_resource(RoundState::default());
        app.insert_resource(FruitPool::default());
        app.insert_resource(HighScore(0));
        app.add_systems(Update, (handle_game_over, run_over_sequence).chain());
        app
    }

    fn advance(app: &mut App, secs: f32) {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(secs));
        app.update();
    }

    fn seed_live_fruits(app: &mut App, n: usize) -> Vec<Entity> {
        let mut out = Vec::new();
        for _ in 0..n {
            let e = app
                .world_mut()
                .spawn((Fruit, Transform::default(), Visibility::Visible))
                .id();
            out.push(e);
        }
        {
            let mut pool = app.world_mut().resource_mut::<FruitPool>();
            for (i, e) in out.iter().enumerate() {
                pool.grow(*e, Entity::from_raw(10_000 + i as u32));
            }
        }
        out
    }

    fn hidden_count(app: &mut App, fruits: &[Entity]) -> usize {
        fruits
            .iter()
            .filter(|e| app.world().entity(**e).get::<Visibility>() == Some(&Visibility::Hidden))
            .count()
    }

    #[test]
    fn double_request_runs_one_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hs.ron");
        let mut app = test_app(path.to_str().unwrap());
        let fruits = seed_live_fruits(&mut app, 4);

        app.world_mut().send_event(GameOverRequested);
        app.world_mut().send_event(GameOverRequested);
        app.update();
        let first_remaining = app.world().resource::<OverSequence>().remaining();

        // A third request mid-sequence neither restarts nor cancels it.
        app.world_mut().send_event(GameOverRequested);
        advance(&mut app, 0.0);
        assert!(app.world().resource::<OverSequence>().remaining() <= first_remaining);
        assert!(app.world().resource::<RoundState>().is_over);
        assert_eq!(hidden_count(&mut app, &fruits), 1, "first hide is immediate");
    }

    #[test]
    fn hides_are_staggered_then_finale_commits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hs.ron");
        let mut app = test_app(path.to_str().unwrap());
        let fruits = seed_live_fruits(&mut app, 3);
        app.world_mut().resource_mut::<RoundState>().score = 120;
        highscore::commit(&path, 100).unwrap();

        app.world_mut().send_event(GameOverRequested);
        app.update();
        assert_eq!(hidden_count(&mut app, &fruits), 1);
        advance(&mut app, 0.1);
        assert_eq!(hidden_count(&mut app, &fruits), 2);
        advance(&mut app, 0.1);
        assert_eq!(hidden_count(&mut app, &fruits), 3);
        // Every live fruit went back to the pool.
        assert_eq!(app.world().resource::<FruitPool>().active_count(), 0);

        // Finale: one more second before the record is written.
        advance(&mut app, 0.5);
        assert!(app.world().contains_resource::<OverSequence>());
        advance(&mut app, 0.6);
        assert!(!app.world().contains_resource::<OverSequence>());
        assert_eq!(app.world().resource::<HighScore>().0, 120, "120 beats 100");
        let cues = app.world().resource::<Events<CueEvent>>();
        let mut cursor = cues.get_cursor();
        assert!(cursor
            .read(cues)
            .any(|CueEvent(kind)| *kind == CueKind::Over));
    }

    #[test]
    fn lower_score_keeps_stored_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hs.ron");
        let mut app = test_app(path.to_str().unwrap());
        seed_live_fruits(&mut app, 1);
        app.world_mut().resource_mut::<RoundState>().score = 80;
        highscore::commit(&path, 100).unwrap();

        app.world_mut().send_event(GameOverRequested);
        app.update();
        advance(&mut app, 2.0);
        assert_eq!(app.world().resource::<HighScore>().0, 100, "100 survives 80");
        assert_eq!(highscore::load(&path).0, 100);
    }

    #[test]
    fn physics_is_disabled_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hs.ron");
        let mut app = test_app(path.to_str().unwrap());
        let fruits = seed_live_fruits(&mut app, 3);
        app.world_mut().send_event(GameOverRequested);
        app.update();
        for e in &fruits {
            assert!(
                app.world().entity(*e).get::<RigidBodyDisabled>().is_some(),
                "every live fruit stops simulating on the first tick"
            );
        }
    }
}
