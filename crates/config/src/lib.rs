// Pure-data configuration crate (no Bevy dependency).
// Provides: data structures, layered loading, validation producing warnings (non-fatal), and tests.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
}
impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 540.0,
            height: 960.0,
            title: "Fruit Drop".into(),
        }
    }
}

/// Play-field geometry. The field is a box open at the top; fruits drop in
/// from `drop_y` and pile up on the floor between the side walls.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FieldConfig {
    /// Interior width between the side walls (world units).
    pub width: f32,
    /// Interior height from floor to the open top.
    pub height: f32,
    pub wall_thickness: f32,
    /// Height at which the controllable fruit hovers before release.
    pub drop_y: f32,
    /// Height of the over-line sensor; fruits resting above it end the round.
    pub over_line_y: f32,
    /// Seconds a fruit may sit on the over-line before the round ends.
    pub over_grace_secs: f32,
}
impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: 460.0,
            height: 740.0,
            wall_thickness: 30.0,
            drop_y: 420.0,
            over_line_y: 320.0,
            over_grace_secs: 2.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SpawnConfig {
    /// Delay between releasing a fruit and the next spawn (seconds).
    pub delay_secs: f32,
    /// Delay before the first spawn of a round.
    pub start_delay_secs: f32,
    /// Spawned tiers are drawn uniformly from `0..tier_choices`.
    pub tier_choices: u32,
}
impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            delay_secs: 2.0,
            start_delay_secs: 0.5,
            tier_choices: 3,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FruitConfig {
    /// Collider radius of a tier-0 fruit.
    pub radius_base: f32,
    /// Radius growth per tier.
    pub radius_step: f32,
    /// Highest reachable tier; two fruits of this tier no longer merge.
    pub max_tier: u32,
    pub restitution: f32,
    /// Gravity multiplier applied to dropped fruits.
    pub gravity_scale: f32,
}
impl Default for FruitConfig {
    fn default() -> Self {
        Self {
            radius_base: 16.0,
            radius_step: 9.0,
            max_tier: 7,
            restitution: 0.2,
            gravity_scale: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Number of rotating sfx channels.
    pub channels: usize,
    pub enabled: bool,
}
impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            channels: 8,
            enabled: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct HighScoreConfig {
    /// RON file holding the single persisted record value.
    pub path: String,
}
impl Default for HighScoreConfig {
    fn default() -> Self {
        Self {
            path: "user/highscore.ron".into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub field: FieldConfig,
    pub spawn: SpawnConfig,
    pub fruits: FruitConfig,
    pub audio: AudioConfig,
    pub highscore: HighScoreConfig,
}
impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: Default::default(),
            field: Default::default(),
            spawn: Default::default(),
            fruits: Default::default(),
            audio: Default::default(),
            highscore: Default::default(),
        }
    }
}

impl GameConfig {
    /// Load from a single RON file (errors contain human-readable context).
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let data = fs::read_to_string(&path).map_err(|e| format!("read config: {e}"))?;
        ron::from_str(&data).map_err(|e| format!("parse RON: {e}"))
    }

    /// Load file; on failure returns default config plus error string.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<String>) {
        match Self::load_from_file(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Load multiple layers; later overrides earlier (deep merge).
    /// Skips missing files; returns (config, used_paths, errors).
    pub fn load_layered<P, I>(paths: I) -> (Self, Vec<String>, Vec<String>)
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = P>,
    {
        use ron::value::Value;
        let mut merged: Option<Value> = None;
        let mut used = Vec::new();
        let mut errors = Vec::new();

        fn merge_value(base: &mut ron::value::Value, overlay: ron::value::Value) {
            use ron::value::Value;
            match (base, overlay) {
                (Value::Map(bm), Value::Map(om)) => {
                    for (k, v) in om.into_iter() {
                        let mut incoming = Some(v);
                        let mut replaced = false;
                        for (ek, ev) in bm.iter_mut() {
                            if *ek == k {
                                let val = incoming.take().unwrap();
                                merge_value(ev, val);
                                replaced = true;
                                break;
                            }
                        }
                        if !replaced {
                            bm.insert(k, incoming.unwrap());
                        }
                    }
                }
                (b, o) => *b = o,
            }
        }

        for p in paths {
            let path_ref = p.as_ref();
            match fs::read_to_string(path_ref) {
                Ok(txt) => match ron::from_str::<Value>(&txt) {
                    Ok(val) => {
                        if let Some(cur) = &mut merged {
                            merge_value(cur, val);
                        } else {
                            merged = Some(val);
                        }
                        used.push(path_ref.as_os_str().to_string_lossy().to_string());
                    }
                    Err(e) => errors.push(format!("{}: parse error: {e}", path_ref.display())),
                },
                Err(e) => errors.push(format!("{}: read error: {e}", path_ref.display())),
            }
        }

        if let Some(val) = merged {
            match val.clone().into_rust::<GameConfig>() {
                Ok(cfg) => (cfg, used, errors),
                Err(e) => {
                    let mut evec = errors;
                    evec.push(format!(
                        "failed to deserialize merged config; using defaults: {e}"
                    ));
                    (GameConfig::default(), used, evec)
                }
            }
        } else {
            (GameConfig::default(), used, errors)
        }
    }

    /// Produce validation warnings (non-fatal) for suspicious values.
    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            w.push("window dimensions must be > 0".into());
        }
        if self.field.width <= 0.0 || self.field.height <= 0.0 {
            w.push("field dimensions must be > 0".into());
        }
        if self.field.wall_thickness <= 0.0 {
            w.push("field.wall_thickness must be > 0".into());
        }
        if self.field.over_line_y >= self.field.drop_y {
            w.push(format!(
                "field.over_line_y ({}) at or above drop_y ({}); fresh spawns would end the round",
                self.field.over_line_y, self.field.drop_y
            ));
        }
        if self.field.over_grace_secs < 0.0 {
            w.push("field.over_grace_secs negative -> instant game over".into());
        }
        if self.spawn.delay_secs < 0.0 {
            w.push("spawn.delay_secs negative -> treated as zero".into());
        }
        if self.spawn.tier_choices == 0 {
            w.push("spawn.tier_choices is 0; nothing can spawn".into());
        }
        if self.fruits.max_tier >= 63 {
            w.push(format!(
                "fruits.max_tier {} out of range; merge rewards cap at tier 63",
                self.fruits.max_tier
            ));
        }
        if self.spawn.tier_choices as u64 > self.fruits.max_tier as u64 + 1 {
            w.push(format!(
                "spawn.tier_choices {} exceeds max_tier {} + 1",
                self.spawn.tier_choices, self.fruits.max_tier
            ));
        }
        if self.fruits.radius_base <= 0.0 {
            w.push("fruits.radius_base must be > 0".into());
        }
        if self.fruits.radius_step < 0.0 {
            w.push("fruits.radius_step negative -> higher tiers shrink".into());
        }
        if !(0.0..=1.5).contains(&self.fruits.restitution) {
            w.push(format!(
                "fruits.restitution {} outside recommended 0..1.5",
                self.fruits.restitution
            ));
        }
        let top_radius = self.fruits.radius_base
            + self.fruits.radius_step * self.fruits.max_tier as f32;
        if top_radius * 2.0 > self.field.width {
            w.push(format!(
                "top-tier fruit diameter {} wider than field {}",
                top_radius * 2.0,
                self.field.width
            ));
        }
        if self.audio.channels == 0 {
            w.push("audio.channels is 0; cues will be dropped".into());
        }
        if self.audio.channels > 64 {
            w.push(format!(
                "audio.channels {} very high; 8 is plenty",
                self.audio.channels
            ));
        }
        if self.highscore.path.is_empty() {
            w.push("highscore.path empty; record will not persist".into());
        }
        w
    }

    /// Collider radius for a given tier.
    pub fn tier_radius(&self, tier: u32) -> f32 {
        self.fruits.radius_base + self.fruits.radius_step * tier as f32
    }
}
