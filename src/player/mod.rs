//! Player entity - movement from intent and the area pulse it carries

use bevy::prelude::*;

use crate::arena::ArenaBounds;
use crate::combat::AreaPulse;
use crate::config::GameConfig;
use crate::game::FrameSet;
use crate::progression::PlayerStats;

pub mod input;
pub mod movement;

pub use input::*;
use movement::step_player;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerIntent>()
            .add_systems(Startup, spawn_player)
            .add_systems(
                Update,
                (read_keyboard_intent, drive_autopilot)
                    .chain()
                    .in_set(FrameSet::Input),
            )
            .add_systems(Update, move_player.in_set(FrameSet::Movement));
    }
}

#[derive(Component)]
pub struct Player;

fn spawn_player(mut commands: Commands, config: Res<GameConfig>) {
    commands.spawn((
        Player,
        Transform::from_translation(config.player.start_position()),
        AreaPulse::new(&config.weapon),
    ));
}

fn move_player(
    intent: Res<PlayerIntent>,
    stats: Res<PlayerStats>,
    config: Res<GameConfig>,
    bounds: Res<ArenaBounds>,
    mut player_query: Query<&mut Transform, With<Player>>,
    time: Res<Time>,
) {
    let Ok(mut transform) = player_query.single_mut() else {
        return;
    };

    if intent.movement == Vec2::ZERO {
        return;
    }

    let speed = config.player.base_speed * stats.move_speed;
    transform.translation = step_player(
        transform.translation,
        intent.movement,
        speed,
        time.delta_secs(),
        &bounds,
    );
}
