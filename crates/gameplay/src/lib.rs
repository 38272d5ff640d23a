//! Gameplay crate: the round-management layer. Object pool, spawn state
//! machine, round/game-over handling, touch glue, merges and the persisted
//! high score. Rendering, particles and UI text live elsewhere.

use bevy::prelude::*;
use bevy_rapier2d::prelude::CollisionEvent;
use fd_core::{PostPhysicsAdjustSet, PrePhysicsSet};

pub mod highscore;
pub mod input;
pub mod merge;
pub mod pool;
pub mod round;
pub mod session;
pub mod spawner;

pub use highscore::HighScore;
pub use pool::FruitPool;
pub use round::OverSequence;
pub use spawner::SpawnPhase;

pub struct GameplayPlugin;

impl Plugin for GameplayPlugin {
    fn build(&self, app: &mut App) {
        // Registered here as well as by the rapier plugin so the gameplay
        // systems stay runnable on a headless app without physics.
        app.add_event::<CollisionEvent>();
        app.init_resource::<input::ActiveTouch>();
        app.add_systems(Startup, highscore::load_at_startup);
        // Teardown runs last in the frame. The ordering edges below give
        // `run_reset` a sync point, so every command queued on pooled
        // entities this frame lands before the despawns do.
        app.add_systems(
            Update,
            (
                session::handle_game_start,
                session::handle_reset_request,
                session::run_reset,
            )
                .chain()
                .after(PostPhysicsAdjustSet),
        );
        app.add_systems(
            Update,
            (input::touch_down, input::drag_follow, input::touch_up)
                .chain()
                .in_set(PrePhysicsSet),
        );
        app.add_systems(
            Update,
            (spawner::arm_after_release, spawner::run_spawn_timer)
                .chain()
                .after(input::touch_up)
                .before(session::run_reset),
        );
        app.add_systems(
            Update,
            (merge::handle_contacts, merge::expire_effects)
                .chain()
                .in_set(PostPhysicsAdjustSet),
        );
        app.add_systems(
            Update,
            (round::handle_game_over, round::run_over_sequence)
                .chain()
                .before(session::run_reset),
        );
    }
}
