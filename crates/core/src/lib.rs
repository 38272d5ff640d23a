// Core crate: shared ECS components, resources, events and system set labels.
// No game logic; other crates compile against these stable names.

use bevy::prelude::*;

/// Marker for a pooled fruit entity (live or parked in the pool).
#[derive(Component, Debug)]
pub struct Fruit;

/// Merge-level of a fruit; drives collider size and merge compatibility.
#[derive(Component, Debug, Deref, DerefMut, Copy, Clone, PartialEq, Eq)]
pub struct FruitTier(pub u32);

/// Present on a dropped fruit until its first contact ("attach").
#[derive(Component, Debug)]
pub struct Unsettled;

/// Marker for the visual-effect entity paired with each pooled fruit.
/// Particle rendering is external; gameplay only toggles it.
#[derive(Component, Debug)]
pub struct MergeEffect;

/// Deterministic RNG seed resource (set once at startup / tests for reproducible spawning).
#[derive(Resource, Debug, Copy, Clone)]
pub struct RngSeed(pub u64);

impl Default for RngSeed {
    fn default() -> Self {
        Self(0)
    }
}

// Wrapper Bevy resource for the pure-data GameConfig (keeps fd_config free of bevy dependency).
#[derive(Resource, Debug, Clone)]
pub struct GameConfigRes(pub fd_config::GameConfig);

impl Default for GameConfigRes {
    fn default() -> Self {
        Self(fd_config::GameConfig::default())
    }
}

/// Mutable state of the running round. Created when the round starts and
/// removed at teardown; nothing survives a reset except the persisted record.
#[derive(Resource, Debug, Default)]
pub struct RoundState {
    pub score: u64,
    /// Highest tier reached this round (monotonic).
    pub max_tier: u32,
    /// Monotonic within a round: false -> true, cleared only by teardown.
    pub is_over: bool,
    /// The single fruit the player may currently drag, if any.
    pub controllable: Option<Entity>,
}

/// UI "start" action: build the round context and begin spawning.
#[derive(Event, Debug, Default)]
pub struct GameStartRequested;

/// UI "retry" action: cue, short delay, then full round teardown.
#[derive(Event, Debug, Default)]
pub struct ResetRequested;

/// The round should end. Idempotent at the receiver: ignored once over.
#[derive(Event, Debug, Default)]
pub struct GameOverRequested;

/// The round context was torn down (reset finished). Listeners drop their
/// round-scoped entities: walls, background track, over-line bookkeeping.
#[derive(Event, Debug, Default)]
pub struct RoundTeardown;

/// The controllable fruit was dropped into the field; the spawn delay starts.
#[derive(Event, Debug, Clone, Copy)]
pub struct FruitReleased {
    pub fruit: Entity,
}

/// Named sound events dispatched to the audio crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CueKind {
    /// Two fruits merged into a higher tier.
    LevelUp,
    /// A fresh controllable fruit appeared.
    Next,
    /// A dropped fruit made first contact.
    Attach,
    /// UI button press.
    Button,
    /// End-of-round sting.
    Over,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct CueEvent(pub CueKind);

// System set labels
#[derive(SystemSet, Debug, Hash, Eq, PartialEq, Clone)]
pub struct PrePhysicsSet; // forces applied before physics simulation step
#[derive(SystemSet, Debug, Hash, Eq, PartialEq, Clone)]
pub struct PostPhysicsAdjustSet; // lightweight corrections after physics

// Core plugin registers sets and shared events.
pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(Update, (PrePhysicsSet.before(PostPhysicsAdjustSet),))
            .add_event::<GameStartRequested>()
            .add_event::<ResetRequested>()
            .add_event::<GameOverRequested>()
            .add_event::<RoundTeardown>()
            .add_event::<FruitReleased>()
            .add_event::<CueEvent>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_adds_sets_and_events() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(CorePlugin);
        fn dummy() {}
        app.add_systems(Update, dummy.in_set(PrePhysicsSet));
        app.add_systems(Update, dummy.in_set(PostPhysicsAdjustSet));
        // Events must be registered so writers in other crates never panic.
        app.world_mut().send_event(CueEvent(CueKind::Button));
        app.world_mut().send_event(GameStartRequested);
        app.update();
    }
}
