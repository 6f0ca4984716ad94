use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::diagnostic::FrameCount;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

mod arena;
mod combat;
mod config;
mod enemies;
mod game;
mod hud;
mod player;
mod progression;

use config::{ConfigError, GameConfig};
use game::{GameOverEvent, GamePlugin};
use hud::{HudPlugin, LogHud};
use player::Autopilot;

/// Game states
#[derive(States, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum GameState {
    #[default]
    Playing,
    Paused,
    GameOver,
}

/// Headless runs stop here even if the player survives
const MAX_FRAMES: u32 = 60 * 60 * 5;

fn main() {
    let (config, config_error) = load_config();

    let mut app = App::new();
    app
        .add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 60.0,
            ))),
            LogPlugin::default(),
            StatesPlugin,
        ))
        .add_plugins((GamePlugin { config }, HudPlugin::new(LogHud)))
        .init_resource::<Autopilot>()
        .add_systems(Last, exit_when_finished);

    // Reported once logging is up
    if let Some(err) = config_error {
        app.add_systems(Startup, move || {
            warn!("{err}; falling back to default config");
        });
    }

    app.run();
}

/// Config path is the first argument; without one the defaults are used
fn load_config() -> (GameConfig, Option<ConfigError>) {
    let Some(path) = std::env::args().nth(1) else {
        return (GameConfig::default(), None);
    };

    match GameConfig::load(&path) {
        Ok(config) => (config, None),
        Err(err) => (GameConfig::default(), Some(err)),
    }
}

fn exit_when_finished(
    mut game_overs: EventReader<GameOverEvent>,
    frames: Res<FrameCount>,
    mut exit: EventWriter<AppExit>,
) {
    if game_overs.read().last().is_some() {
        exit.write(AppExit::Success);
    } else if frames.0 >= MAX_FRAMES {
        info!("Frame limit reached, stopping");
        exit.write(AppExit::Success);
    }
}
