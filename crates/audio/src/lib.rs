// Audio crate: cue dispatch over a fixed set of rotating channels, plus the
// background track tied to the round. Clip decoding/output is bevy_audio's
// problem; this crate only assigns players to channels.

use bevy::audio::{AudioPlayer, AudioSource, PlaybackSettings};
use bevy::prelude::*;
use fd_core::{CueEvent, CueKind, GameConfigRes, GameStartRequested, RoundTeardown};
use rand::seq::SliceRandom;

/// Asset paths per cue kind. LevelUp deliberately has three candidates so
/// repeated merges do not sound identical; every other kind has one clip.
pub const LEVEL_UP_CLIPS: [&str; 3] = [
    "audio/level_up_a.ogg",
    "audio/level_up_b.ogg",
    "audio/level_up_c.ogg",
];
pub const NEXT_CLIP: &str = "audio/next.ogg";
pub const ATTACH_CLIP: &str = "audio/attach.ogg";
pub const BUTTON_CLIP: &str = "audio/button.ogg";
pub const OVER_CLIP: &str = "audio/over.ogg";
pub const BGM_CLIP: &str = "audio/bgm.ogg";

/// Loaded clip handles, resolved per cue kind at dispatch time.
#[derive(Resource, Debug)]
pub struct CueClips {
    pub level_up: [Handle<AudioSource>; 3],
    pub next: Handle<AudioSource>,
    pub attach: Handle<AudioSource>,
    pub button: Handle<AudioSource>,
    pub over: Handle<AudioSource>,
    pub bgm: Handle<AudioSource>,
}

impl CueClips {
    /// Candidate clips for a cue kind; the dispatcher picks one at random.
    pub fn candidates(&self, kind: CueKind) -> &[Handle<AudioSource>] {
        match kind {
            CueKind::LevelUp => &self.level_up,
            CueKind::Next => std::slice::from_ref(&self.next),
            CueKind::Attach => std::slice::from_ref(&self.attach),
            CueKind::Button => std::slice::from_ref(&self.button),
            CueKind::Over => std::slice::from_ref(&self.over),
        }
    }
}

/// Marker for a rotating sfx channel entity.
#[derive(Component, Debug)]
pub struct CueChannel;

/// Marker for the looping background player.
#[derive(Component, Debug)]
pub struct Bgm;

/// Fixed-size rotation over pre-spawned channel entities. A channel still
/// playing is simply reassigned; rotation is the only overlap protection.
#[derive(Resource, Debug, Default)]
pub struct CueChannels {
    slots: Vec<Entity>,
    cursor: usize,
}

impl CueChannels {
    pub fn new(slots: Vec<Entity>) -> Self {
        Self { slots, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Hand out the channel under the cursor and advance with wrap-around.
    pub fn advance(&mut self) -> Option<Entity> {
        if self.slots.is_empty() {
            return None;
        }
        let slot = self.slots[self.cursor];
        self.cursor = (self.cursor + 1) % self.slots.len();
        Some(slot)
    }
}

pub struct AudioPlugin;

impl Plugin for AudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_audio);
        app.add_systems(Update, (play_cues, start_bgm, stop_bgm));
    }
}

/// Startup: load the clip table and pre-spawn the channel entities.
fn setup_audio(mut commands: Commands, assets: Res<AssetServer>, cfg: Res<GameConfigRes>) {
    if !cfg.0.audio.enabled {
        info!("audio disabled by config");
        return;
    }
    commands.insert_resource(CueClips {
        level_up: [
            assets.load(LEVEL_UP_CLIPS[0]),
            assets.load(LEVEL_UP_CLIPS[1]),
            assets.load(LEVEL_UP_CLIPS[2]),
        ],
        next: assets.load(NEXT_CLIP),
        attach: assets.load(ATTACH_CLIP),
        button: assets.load(BUTTON_CLIP),
        over: assets.load(OVER_CLIP),
        bgm: assets.load(BGM_CLIP),
    });
    let slots = (0..cfg.0.audio.channels)
        .map(|_| commands.spawn(CueChannel).id())
        .collect();
    commands.insert_resource(CueChannels::new(slots));
}

/// System: drain cue events, one channel per cue, in rotation.
fn play_cues(
    mut cues: EventReader<CueEvent>,
    mut commands: Commands,
    channels: Option<ResMut<CueChannels>>,
    clips: Option<Res<CueClips>>,
) {
    let (Some(mut channels), Some(clips)) = (channels, clips) else {
        cues.clear();
        return;
    };
    let mut rng = rand::thread_rng();
    for CueEvent(kind) in cues.read() {
        let Some(clip) = clips.candidates(*kind).choose(&mut rng) else {
            continue;
        };
        let Some(channel) = channels.advance() else {
            continue;
        };
        commands
            .entity(channel)
            .insert((AudioPlayer::new(clip.clone()), PlaybackSettings::ONCE));
    }
}

/// System: the round start spawns the looping background player.
fn start_bgm(
    mut requests: EventReader<GameStartRequested>,
    mut commands: Commands,
    clips: Option<Res<CueClips>>,
    existing: Query<(), With<Bgm>>,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();
    let Some(clips) = clips else { return };
    if !existing.is_empty() {
        return;
    }
    commands.spawn((
        Bgm,
        AudioPlayer::new(clips.bgm.clone()),
        PlaybackSettings::LOOP,
    ));
}

/// System: the round teardown silences the background track.
fn stop_bgm(
    mut teardowns: EventReader<RoundTeardown>,
    mut commands: Commands,
    players: Query<Entity, With<Bgm>>,
) {
    if teardowns.is_empty() {
        return;
    }
    teardowns.clear();
    for player in players.iter() {
        commands.entity(player).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clips() -> CueClips {
        CueClips {
            level_up: [Handle::default(), Handle::default(), Handle::default()],
            next: Handle::default(),
            attach: Handle::default(),
            button: Handle::default(),
            over: Handle::default(),
            bgm: Handle::default(),
        }
    }

    #[test]
    fn rotation_wraps_around() {
        let slots: Vec<Entity> = (0..3u32).map(Entity::from_raw).collect();
        let mut channels = CueChannels::new(slots.clone());
        let order: Vec<Entity> = (0..7).map(|_| channels.advance().unwrap()).collect();
        assert_eq!(
            order,
            vec![slots[0], slots[1], slots[2], slots[0], slots[1], slots[2], slots[0]]
        );
        assert_eq!(channels.cursor(), 1);
    }

    #[test]
    fn empty_channel_set_drops_cues() {
        let mut channels = CueChannels::new(Vec::new());
        assert!(channels.advance().is_none());
    }

    #[test]
    fn level_up_has_three_candidates_others_one() {
        let clips = clips();
        assert_eq!(clips.candidates(CueKind::LevelUp).len(), 3);
        for kind in [
            CueKind::Next,
            CueKind::Attach,
            CueKind::Button,
            CueKind::Over,
        ] {
            assert_eq!(clips.candidates(kind).len(), 1, "{kind:?}");
        }
    }

    #[test]
    fn cues_assign_players_in_rotation() {
        let mut app = App::new();
        app.add_plugins(fd_core::CorePlugin);
        app.insert_resource(clips());
        let slots: Vec<Entity> = (0..2)
            .map(|_| app.world_mut().spawn(CueChannel).id())
            .collect();
        app.insert_resource(CueChannels::new(slots.clone()));
        app.add_systems(Update, play_cues);

        app.world_mut().send_event(CueEvent(CueKind::Next));
        app.world_mut().send_event(CueEvent(CueKind::Attach));
        app.world_mut().send_event(CueEvent(CueKind::Button));
        app.update();

        // Three cues over two channels: the first channel was reassigned.
        assert_eq!(app.world().resource::<CueChannels>().cursor(), 1);
        for slot in &slots {
            assert!(
                app.world().entity(*slot).get::<AudioPlayer>().is_some(),
                "channel got a player"
            );
        }
    }
}
