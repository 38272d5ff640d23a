//! Contact handling: the attach cue on a dropped fruit's first touch, and
//! equal-tier merges feeding score, max tier and the paired effect entity.

use bevy::prelude::*;
use bevy_rapier2d::prelude::{Collider, CollisionEvent, RigidBodyDisabled};
use fd_core::{CueEvent, CueKind, Fruit, FruitTier, GameConfigRes, RoundState, Unsettled};
use std::collections::HashSet;

/// Timed flash on a fired effect entity. Particle rendering is external;
/// gameplay only toggles visibility for its duration.
#[derive(Component, Debug)]
pub struct EffectFlash(pub Timer);

pub const EFFECT_FLASH_SECS: f32 = 0.4;

/// System: walk this frame's contact starts. Order of work per event:
/// settle unsettled fruits (attach cue), then try a merge. Each fruit merges
/// at most once per frame.
pub fn handle_contacts(
    mut collisions: EventReader<CollisionEvent>,
    mut commands: Commands,
    round: Option<ResMut<RoundState>>,
    pool: Option<ResMut<crate::pool::FruitPool>>,
    cfg: Res<GameConfigRes>,
    mut cues: EventWriter<CueEvent>,
    fruits: Query<(&FruitTier, &Transform), With<Fruit>>,
    unsettled: Query<(), With<Unsettled>>,
) {
    let (Some(mut round), Some(mut pool)) = (round, pool) else {
        collisions.clear();
        return;
    };
    let mut merged: HashSet<Entity> = HashSet::new();
    let mut settled: HashSet<Entity> = HashSet::new();
    for ev in collisions.read() {
        let CollisionEvent::Started(a, b, _) = ev else {
            continue;
        };
        let (a, b) = (*a, *b);

        // Commands apply at frame end, so track settles locally too: a fruit
        // touching twice in one frame attaches once.
        for e in [a, b] {
            if unsettled.contains(e) && settled.insert(e) {
                commands.entity(e).remove::<Unsettled>();
                cues.write(CueEvent(CueKind::Attach));
            }
        }

        if round.is_over {
            continue;
        }
        let (Ok((tier_a, tf_a)), Ok((tier_b, _))) = (fruits.get(a), fruits.get(b)) else {
            continue;
        };
        if tier_a.0 != tier_b.0 || tier_a.0 >= cfg.0.fruits.max_tier {
            continue;
        }
        if merged.contains(&a) || merged.contains(&b) {
            continue;
        }
        // The hovering fruit never merges; it is not in the field yet.
        if round.controllable == Some(a) || round.controllable == Some(b) {
            continue;
        }
        merged.insert(a);
        merged.insert(b);

        let new_tier = tier_a.0 + 1;
        // b is consumed: parked back in the pool until the next acquire.
        commands
            .entity(b)
            .insert((Visibility::Hidden, RigidBodyDisabled))
            .remove::<Unsettled>();
        pool.release(b);
        // a survives one tier up.
        commands.entity(a).insert((
            FruitTier(new_tier),
            Collider::ball(cfg.0.tier_radius(new_tier)),
        ));
        // 2^tier merge reward; saturates for tiers past the u64 range.
        let reward = 1u64.checked_shl(new_tier).unwrap_or(u64::MAX);
        round.score = round.score.saturating_add(reward);
        round.max_tier = round.max_tier.max(new_tier);
        if let Some(effect) = pool.effect_of(a) {
            commands.entity(effect).insert((
                Transform::from_translation(tf_a.translation),
                Visibility::Visible,
                EffectFlash(Timer::from_seconds(EFFECT_FLASH_SECS, TimerMode::Once)),
            ));
        }
        cues.write(CueEvent(CueKind::LevelUp));
    }
}

/// System: hide fired effects when their flash runs out.
pub fn expire_effects(
    time: Res<Time>,
    mut commands: Commands,
    mut effects: Query<(Entity, &mut EffectFlash)>,
) {
    for (entity, mut flash) in effects.iter_mut() {
        flash.0.tick(time.delta());
        if flash.0.just_finished() {
            commands
                .entity(entity)
                .insert(Visibility::Hidden)
                .remove::<EffectFlash>();
        }
    }
}
