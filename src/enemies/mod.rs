//! Enemy AI - pursuit and wander, always confined to the arena

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::arena::{ArenaBounds, ground_direction, ground_distance};
use crate::combat::Health;
use crate::config::{ArchetypeConfig, EnemyConfig, GameConfig, WanderConfig};
use crate::game::{FrameSet, GameRng};
use crate::player::Player;

pub mod spawn;

pub use spawn::*;

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, update_enemy_ai.in_set(FrameSet::EnemyAi));
    }
}

/// Archetype determines speed, health formula and behaviour mode
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    /// Fast, fragile pursuer
    Swarmer,
    /// Slow, tough pursuer
    Brute,
}

impl EnemyKind {
    /// Waves alternate archetypes by spawn index parity
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            Self::Swarmer
        } else {
            Self::Brute
        }
    }

    pub fn archetype(self, config: &EnemyConfig) -> &ArchetypeConfig {
        match self {
            Self::Swarmer => &config.swarmer,
            Self::Brute => &config.brute,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Swarmer => "SWARMER",
            Self::Brute => "BRUTE",
        }
    }
}

/// How an archetype behaves before it has noticed the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BehaviorMode {
    /// Chase the player from the moment it spawns
    Pursuit,
    /// Drift around until the player comes within `sight_range`, then chase
    WanderUntilSighted { sight_range: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyBehavior {
    Pursue,
    Wander { heading: Vec2, retarget_timer: f32 },
}

#[derive(Component, Debug, Clone)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub speed: f32,
    pub mode: BehaviorMode,
    pub behavior: EnemyBehavior,
}

impl Enemy {
    pub fn new(kind: EnemyKind, speed: f32, mode: BehaviorMode) -> Self {
        let behavior = match mode {
            BehaviorMode::Pursuit => EnemyBehavior::Pursue,
            // Zero timer: a heading is rolled on the first update
            BehaviorMode::WanderUntilSighted { .. } => EnemyBehavior::Wander {
                heading: Vec2::ZERO,
                retarget_timer: 0.0,
            },
        };
        Self {
            kind,
            speed,
            mode,
            behavior,
        }
    }

    pub fn is_pursuing(&self) -> bool {
        matches!(self.behavior, EnemyBehavior::Pursue)
    }
}

/// Advance one enemy by `dt` and return its new position, clamped to `bounds`
pub fn step_enemy<R: Rng + ?Sized>(
    enemy: &mut Enemy,
    position: Vec3,
    player_position: Vec3,
    bounds: &ArenaBounds,
    wander: &WanderConfig,
    rng: &mut R,
    dt: f32,
) -> Vec3 {
    if let BehaviorMode::WanderUntilSighted { sight_range } = enemy.mode {
        if !enemy.is_pursuing() && ground_distance(position, player_position) <= sight_range {
            enemy.behavior = EnemyBehavior::Pursue;
        }
    }

    let next = match &mut enemy.behavior {
        EnemyBehavior::Pursue => {
            let direction = ground_direction(position, player_position);
            // Never overshoot the player's centre
            let step = (enemy.speed * dt).min(ground_distance(position, player_position));
            position + Vec3::new(direction.x, 0.0, direction.y) * step
        }
        EnemyBehavior::Wander {
            heading,
            retarget_timer,
        } => {
            *retarget_timer -= dt;
            if *retarget_timer <= 0.0 {
                *heading = roll_wander_heading(position, player_position, wander, rng);
                *retarget_timer = rng.random_range(wander.retarget_min..=wander.retarget_max);
            }

            let step = enemy.speed * wander.speed_factor * dt;
            let candidate = position + Vec3::new(heading.x, 0.0, heading.y) * step;
            if !bounds.contains(candidate) {
                *retarget_timer = 0.0;
            }
            candidate
        }
    };

    bounds.clamp(next)
}

/// Random heading biased toward the player
pub fn roll_wander_heading<R: Rng + ?Sized>(
    position: Vec3,
    player_position: Vec3,
    wander: &WanderConfig,
    rng: &mut R,
) -> Vec2 {
    let angle = rng.random_range(0.0..TAU);
    let random = Vec2::new(angle.cos(), angle.sin());
    let to_player = ground_direction(position, player_position);

    let blended = to_player * wander.player_bias + random * (1.0 - wander.player_bias);
    let heading = blended.normalize_or_zero();
    if heading == Vec2::ZERO { random } else { heading }
}

/// Move every living enemy according to its behaviour
fn update_enemy_ai(
    player_query: Query<&Transform, With<Player>>,
    mut enemy_query: Query<(&mut Transform, &mut Enemy, &Health), Without<Player>>,
    bounds: Res<ArenaBounds>,
    config: Res<GameConfig>,
    mut rng: ResMut<GameRng>,
    time: Res<Time>,
) {
    let Ok(player_transform) = player_query.single() else {
        return;
    };

    let player_pos = player_transform.translation;
    let dt = time.delta_secs();
    let rng = &mut rng.0;

    for (mut transform, mut enemy, health) in &mut enemy_query {
        if health.is_dead() {
            continue;
        }

        let was_pursuing = enemy.is_pursuing();
        transform.translation = step_enemy(
            &mut enemy,
            transform.translation,
            player_pos,
            &bounds,
            &config.enemies.wander,
            rng,
            dt,
        );
        if !was_pursuing && enemy.is_pursuing() {
            debug!("{} spotted the player", enemy.kind.name());
        }
    }
}
