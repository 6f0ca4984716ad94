use std::f32::consts::TAU;

use bevy::prelude::*;

use super::Player;
use crate::arena::ArenaBounds;

/// Per-frame intent consumed by the simulation. Filled either from the
/// keyboard or by the headless [`Autopilot`].
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct PlayerIntent {
    /// Normalized ground-plane direction (x, z)
    pub movement: Vec2,
    pub attack: bool,
    pub toggle_pause: bool,
    pub restart: bool,
}

/// Read WASD/arrows for movement, Space to pulse, Escape to pause and R to
/// restart. Does nothing when no keyboard is attached.
pub fn read_keyboard_intent(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    mut intent: ResMut<PlayerIntent>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };

    let mut direction = Vec2::ZERO;
    if keyboard.any_pressed([KeyCode::KeyW, KeyCode::ArrowUp]) {
        direction.y -= 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyS, KeyCode::ArrowDown]) {
        direction.y += 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        direction.x -= 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        direction.x += 1.0;
    }

    *intent = PlayerIntent {
        movement: direction.normalize_or_zero(),
        attack: keyboard.pressed(KeyCode::Space),
        toggle_pause: keyboard.just_pressed(KeyCode::Escape),
        restart: keyboard.just_pressed(KeyCode::KeyR),
    };
}

/// Scripted player for headless runs: circles the arena centre and pulses
/// whenever the weapon is ready
#[derive(Resource, Debug, Clone)]
pub struct Autopilot {
    pub orbit_radius: f32,
    /// Radians per second around the centre
    pub angular_speed: f32,
    angle: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            orbit_radius: 9.0,
            angular_speed: 0.6,
            angle: 0.0,
        }
    }
}

impl Autopilot {
    /// Direction that steers `position` onto the moving orbit point
    pub fn steer(&mut self, position: Vec3, centre: Vec3, dt: f32) -> Vec2 {
        self.angle = (self.angle + self.angular_speed * dt) % TAU;
        let target = Vec2::new(
            centre.x + self.angle.cos() * self.orbit_radius,
            centre.z + self.angle.sin() * self.orbit_radius,
        );
        let to_target = target - Vec2::new(position.x, position.z);
        if to_target.length() < 0.1 {
            Vec2::ZERO
        } else {
            to_target.normalize()
        }
    }
}

pub fn drive_autopilot(
    autopilot: Option<ResMut<Autopilot>>,
    mut intent: ResMut<PlayerIntent>,
    player_query: Query<&Transform, With<Player>>,
    bounds: Res<ArenaBounds>,
    time: Res<Time>,
) {
    let Some(mut autopilot) = autopilot else {
        return;
    };
    let Ok(transform) = player_query.single() else {
        return;
    };

    let movement = autopilot.steer(transform.translation, bounds.center(0.0), time.delta_secs());
    *intent = PlayerIntent {
        movement,
        attack: true,
        toggle_pause: false,
        restart: false,
    };
}
