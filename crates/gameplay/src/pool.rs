//! Round-robin object pool of fruit entities.
//!
//! Fruits and their paired effect entities are created once and reused for the
//! rest of the round; "inactive" means parked (hidden, physics disabled), not
//! despawned. The pool only grows. The cursor advances by one slot per scan
//! step before checking, so repeated acquires walk the pool fairly instead of
//! always reusing the lowest index.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use fd_core::{Fruit, FruitTier, GameConfigRes, MergeEffect};

#[derive(Debug, Clone, Copy)]
pub struct PoolSlot {
    pub fruit: Entity,
    pub effect: Entity,
    active: bool,
}

#[derive(Resource, Debug, Default)]
pub struct FruitPool {
    slots: Vec<PoolSlot>,
    cursor: usize,
}

impl FruitPool {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    /// Reuse an inactive slot if one exists: advance the cursor (mod len),
    /// check, repeat at most `len` times. Returns `None` when every slot is
    /// live; callers then grow the pool instead.
    pub fn acquire_existing(&mut self) -> Option<PoolSlot> {
        if self.slots.is_empty() {
            return None;
        }
        for _ in 0..self.slots.len() {
            self.cursor = (self.cursor + 1) % self.slots.len();
            let slot = &mut self.slots[self.cursor];
            if !slot.active {
                slot.active = true;
                return Some(*slot);
            }
        }
        None
    }

    /// Append a freshly created fruit/effect pair, already marked active.
    /// Growth does not move the cursor.
    pub fn grow(&mut self, fruit: Entity, effect: Entity) -> PoolSlot {
        let slot = PoolSlot {
            fruit,
            effect,
            active: true,
        };
        self.slots.push(slot);
        slot
    }

    /// Mark the slot holding `fruit` inactive. Unknown entities are a no-op.
    pub fn release(&mut self, fruit: Entity) -> bool {
        for slot in &mut self.slots {
            if slot.fruit == fruit && slot.active {
                slot.active = false;
                return true;
            }
        }
        false
    }

    /// Live fruit entities in slot order (the game-over teardown walks this).
    pub fn active_fruits(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots.iter().filter(|s| s.active).map(|s| s.fruit)
    }

    /// Every slot ever created, live or parked (round teardown despawns all).
    pub fn slots(&self) -> impl Iterator<Item = &PoolSlot> {
        self.slots.iter()
    }

    pub fn effect_of(&self, fruit: Entity) -> Option<Entity> {
        self.slots
            .iter()
            .find(|s| s.fruit == fruit)
            .map(|s| s.effect)
    }
}

/// Acquire a fruit for spawning: reuse an inactive slot, or create a new
/// parked fruit/effect pair and grow the pool. The returned slot is active;
/// the caller is responsible for positioning and un-hiding the fruit.
pub fn acquire(pool: &mut FruitPool, commands: &mut Commands, cfg: &GameConfigRes) -> PoolSlot {
    if let Some(slot) = pool.acquire_existing() {
        return slot;
    }
    let effect = commands
        .spawn((MergeEffect, Transform::default(), Visibility::Hidden))
        .id();
    let fruit = commands
        .spawn((
            Fruit,
            FruitTier(0),
            Transform::default(),
            Visibility::Hidden,
            RigidBody::KinematicPositionBased,
            RigidBodyDisabled,
            Collider::ball(cfg.0.fruits.radius_base),
            Restitution::coefficient(cfg.0.fruits.restitution),
            GravityScale(cfg.0.fruits.gravity_scale),
            Velocity::zero(),
            ActiveEvents::COLLISION_EVENTS,
        ))
        .id();
    pool.grow(fruit, effect)
}
