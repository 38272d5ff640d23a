/*!
fruit_drop binary: config loading, plugin wiring and the thin UI glue
(start/retry keys) the gameplay crate treats as external.
*/

use bevy::prelude::*;
use fd_audio::AudioPlugin;
use fd_core::{CorePlugin, GameConfigRes, GameStartRequested, ResetRequested, RngSeed, RoundState};
use fd_gameplay::GameplayPlugin;
use fd_physics::PhysicsPlugin;

fn load_config() -> fd_config::GameConfig {
    let (cfg, used, errors) = fd_config::GameConfig::load_layered([
        std::path::Path::new("assets/config/game.ron"),
        std::path::Path::new("assets/config/game.local.ron"),
    ]);
    for e in errors {
        warn!("CONFIG LOAD ISSUE: {e}");
    }
    if used.is_empty() {
        info!("No config layers found; using defaults");
    } else {
        info!(?used, "Config layers loaded");
    }
    cfg
}

fn main() {
    let cfg = load_config();

    // Log validation warnings (non-fatal)
    for w in cfg.validate() {
        warn!("CONFIG WARNING: {w}");
    }
    info!(?cfg.window, "Window config");
    info!(
        spawn_delay = cfg.spawn.delay_secs,
        max_tier = cfg.fruits.max_tier,
        audio_channels = cfg.audio.channels,
        "Runtime summary"
    );

    let window_title = cfg.window.title.clone();

    App::new()
        .insert_resource(GameConfigRes(cfg.clone()))
        .insert_resource(RngSeed(12345))
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: window_title,
                resolution: (cfg.window.width, cfg.window.height).into(),
                resizable: false,
                ..Default::default()
            }),
            ..Default::default()
        }))
        .add_plugins(CorePlugin)
        .add_plugins(PhysicsPlugin)
        .add_plugins(GameplayPlugin)
        .add_plugins(AudioPlugin)
        .add_systems(Startup, spawn_camera)
        .add_systems(Update, ui_glue)
        .run();
}

fn spawn_camera(mut commands: Commands, cfg: Res<GameConfigRes>) {
    // Frame the field: floor at y = 0, drop height near the top.
    commands.spawn((
        Camera2d,
        Transform::from_xyz(0.0, cfg.0.field.height * 0.35, 0.0),
    ));
}

/// Keyboard stand-in for the start/retry UI buttons.
fn ui_glue(
    keys: Res<ButtonInput<KeyCode>>,
    round: Option<Res<RoundState>>,
    mut start: EventWriter<GameStartRequested>,
    mut reset: EventWriter<ResetRequested>,
) {
    if round.is_none()
        && (keys.just_pressed(KeyCode::Space) || keys.just_pressed(KeyCode::Enter))
    {
        start.write(GameStartRequested);
    }
    if keys.just_pressed(KeyCode::KeyR) {
        reset.write(ResetRequested);
    }
}
