//! Black-box integration tests across the published plugin APIs: plugin
//! composition plus a scripted round walkthrough on a headless app.

use bevy::prelude::*;

pub fn build_minimal_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    // AssetPlugin -> AssetServer for the audio clip table
    // InputPlugin -> ButtonInput/Touches used by the touch glue
    app.add_plugins((
        bevy::asset::AssetPlugin::default(),
        bevy::input::InputPlugin,
    ));
    app.init_asset::<bevy::audio::AudioSource>();
    app
}
