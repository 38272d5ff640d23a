//! Touch glue: touch_down grabs the controllable fruit, drag_follow slides it
//! along the drop height, touch_up drops it into the field. All three are
//! silent no-ops when there is no controllable fruit.

use bevy::prelude::*;
use bevy_rapier2d::prelude::RigidBody;
use fd_core::{FruitReleased, FruitTier, GameConfigRes, RoundState, Unsettled};

/// Whether the current press started a drag of the controllable fruit.
#[derive(Resource, Default, Debug)]
pub struct ActiveTouch {
    pub dragging: bool,
}

/// Convert a window cursor position (top-left origin, logical coordinates) to world coordinates.
fn cursor_world_pos(
    camera_q: &Query<(&Camera, &GlobalTransform)>,
    screen_pos: Vec2,
) -> Option<Vec2> {
    let (camera, cam_tf) = camera_q.iter().next()?; // assume single active camera
    camera.viewport_to_world_2d(cam_tf, screen_pos).ok()
}

/// Unified pointer (first touch if present, else mouse) world position.
fn primary_pointer_world_pos(
    window: &Window,
    touches: &Touches,
    camera_q: &Query<(&Camera, &GlobalTransform)>,
) -> Option<Vec2> {
    if let Some(touch) = touches.iter().next() {
        return cursor_world_pos(camera_q, touch.position());
    }
    let cursor = window.cursor_position()?;
    cursor_world_pos(camera_q, cursor)
}

/// System: pointer press begins dragging the controllable fruit.
pub fn touch_down(
    buttons: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    round: Option<Res<RoundState>>,
    mut active: ResMut<ActiveTouch>,
) {
    let pressed =
        buttons.just_pressed(MouseButton::Left) || touches.iter_just_pressed().next().is_some();
    if !pressed {
        return;
    }
    let Some(round) = round else { return };
    if round.controllable.is_none() {
        return;
    }
    active.dragging = true;
}

/// System: while held, the controllable fruit follows the pointer x, clamped
/// to the field interior minus its own radius; y stays at the drop height.
pub fn drag_follow(
    touches: Res<Touches>,
    windows_q: Query<&Window>,
    camera_q: Query<(&Camera, &GlobalTransform)>,
    round: Option<Res<RoundState>>,
    active: Res<ActiveTouch>,
    mut fruits: Query<(&FruitTier, &mut Transform)>,
    cfg: Res<GameConfigRes>,
) {
    if !active.dragging {
        return;
    }
    let Some(round) = round else { return };
    let Some(fruit) = round.controllable else {
        return;
    };
    let Some(window) = windows_q.iter().next() else {
        return;
    };
    let Some(world_pos) = primary_pointer_world_pos(window, &touches, &camera_q) else {
        return;
    };
    let Ok((tier, mut tf)) = fruits.get_mut(fruit) else {
        return;
    };
    let half = (cfg.0.field.width * 0.5 - cfg.0.tier_radius(tier.0)).max(0.0);
    tf.translation.x = world_pos.x.clamp(-half, half);
    tf.translation.y = cfg.0.field.drop_y;
}

/// System: pointer release drops the fruit. The body goes dynamic, the
/// controllable reference clears, and the spawn delay is armed via
/// `FruitReleased`.
pub fn touch_up(
    buttons: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    mut commands: Commands,
    round: Option<ResMut<RoundState>>,
    mut active: ResMut<ActiveTouch>,
    mut released: EventWriter<FruitReleased>,
) {
    let up =
        buttons.just_released(MouseButton::Left) || touches.iter_just_released().next().is_some();
    if !up {
        return;
    }
    active.dragging = false;
    let Some(mut round) = round else { return };
    let Some(fruit) = round.controllable.take() else {
        return;
    };
    commands.entity(fruit).insert((RigidBody::Dynamic, Unsettled));
    released.write(FruitReleased { fruit });
}
