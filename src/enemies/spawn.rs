use bevy::prelude::*;
use rand::Rng;

use super::{BehaviorMode, Enemy, EnemyKind};
use crate::arena::{ArenaBounds, ground_distance};
use crate::combat::{HitFlash, Health};
use crate::config::GameConfig;

/// Everything needed to create one enemy entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub position: Vec3,
    pub health: f32,
    pub speed: f32,
    pub mode: BehaviorMode,
}

/// Build a wave of `count` enemies for `wave`, alternating archetypes and
/// keeping clear of the player where the arena allows it
pub fn spawn_wave<R: Rng + ?Sized>(
    count: u32,
    player_position: Vec3,
    wave: u32,
    bounds: &ArenaBounds,
    rng: &mut R,
    config: &GameConfig,
) -> Vec<EnemySpawn> {
    let area = bounds.shrink(config.spawn.margin);

    (0..count as usize)
        .map(|index| {
            let kind = EnemyKind::for_index(index);
            let archetype = kind.archetype(&config.enemies);
            EnemySpawn {
                kind,
                position: pick_spawn_position(
                    player_position,
                    &area,
                    config.spawn.min_player_distance,
                    config.spawn.max_attempts,
                    config.enemies.height,
                    rng,
                ),
                health: archetype.health_for_wave(wave),
                speed: archetype.speed,
                mode: archetype.behavior,
            }
        })
        .collect()
}

/// Rejection-sample a position at least `min_distance` from the player. After
/// `max_attempts` misses the last candidate is used regardless.
pub fn pick_spawn_position<R: Rng + ?Sized>(
    player_position: Vec3,
    area: &ArenaBounds,
    min_distance: f32,
    max_attempts: u32,
    height: f32,
    rng: &mut R,
) -> Vec3 {
    let mut candidate = area.random_point(rng, height);
    for _ in 1..max_attempts {
        if ground_distance(candidate, player_position) >= min_distance {
            return candidate;
        }
        candidate = area.random_point(rng, height);
    }
    candidate
}

pub fn spawn_enemy(commands: &mut Commands, spawn: &EnemySpawn) -> Entity {
    commands
        .spawn((
            Enemy::new(spawn.kind, spawn.speed, spawn.mode),
            spawn.kind,
            Health::new(spawn.health),
            Transform::from_translation(spawn.position),
            HitFlash::default(),
        ))
        .id()
}
