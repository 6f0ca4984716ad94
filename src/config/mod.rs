//! Tuning values for a run, with optional RON overrides

use std::fs;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arena::ArenaBounds;
use crate::enemies::BehaviorMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything tunable about a run. Missing sections fall back to defaults,
/// so a config file only needs the values it changes.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GameConfig {
    pub arena: ArenaBounds,
    pub player: PlayerConfig,
    pub weapon: WeaponConfig,
    pub combat: CombatConfig,
    pub enemies: EnemyConfig,
    pub spawn: SpawnConfig,
    pub progression: ProgressionConfig,
    /// Fixed seed for reproducible runs; `None` seeds from the OS
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: f32,
    /// Units per second at a move speed multiplier of 1.0
    pub base_speed: f32,
    pub start_x: f32,
    pub start_z: f32,
    pub height: f32,
}

impl PlayerConfig {
    pub fn start_position(&self) -> Vec3 {
        Vec3::new(self.start_x, self.height, self.start_z)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            base_speed: 6.0,
            start_x: 0.0,
            start_z: 0.0,
            height: 1.0,
        }
    }
}

/// Area pulse weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    pub base_damage: f32,
    /// Seconds between pulses at attack rate 1.0
    pub base_cooldown: f32,
    pub base_radius: f32,
    /// Time for the ring to reach full radius
    pub ramp_duration: f32,
    /// Total visible lifetime of a pulse; the ring fades over this window
    pub duration: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            base_damage: 25.0,
            base_cooldown: 1.0,
            base_radius: 8.0,
            ramp_duration: 0.3,
            duration: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub player_radius: f32,
    /// Shared by every archetype; contact is not size-sensitive
    pub enemy_radius: f32,
    /// Damage per second while any enemy touches the player
    pub contact_dps: f32,
    /// Length of the shrink/fade window before a corpse is removed
    pub death_duration: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            player_radius: 0.8,
            enemy_radius: 0.5,
            contact_dps: 25.0,
            death_duration: 0.5,
        }
    }
}

/// Per-archetype stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeConfig {
    pub base_health: f32,
    pub health_per_wave: f32,
    pub speed: f32,
    pub behavior: BehaviorMode,
}

impl ArchetypeConfig {
    pub const MIN_HEALTH: f32 = 1.0;

    /// Health scales affinely with the wave number (wave 1 = base). Never
    /// below `MIN_HEALTH`, so no enemy spawns already dead.
    pub fn health_for_wave(&self, wave: u32) -> f32 {
        let health = self.base_health + self.health_per_wave * wave.saturating_sub(1) as f32;
        health.max(Self::MIN_HEALTH)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    /// Fraction of the speed used while wandering
    pub speed_factor: f32,
    /// Weight of the to-player direction when a new heading is rolled
    pub player_bias: f32,
    pub retarget_min: f32,
    pub retarget_max: f32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            speed_factor: 0.5,
            player_bias: 0.3,
            retarget_min: 1.0,
            retarget_max: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Fast, fragile pursuer
    pub swarmer: ArchetypeConfig,
    /// Slow, tough pursuer
    pub brute: ArchetypeConfig,
    pub wander: WanderConfig,
    pub height: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            swarmer: ArchetypeConfig {
                base_health: 20.0,
                health_per_wave: 15.0,
                speed: 3.5,
                behavior: BehaviorMode::Pursuit,
            },
            brute: ArchetypeConfig {
                base_health: 50.0,
                health_per_wave: 25.0,
                speed: 1.8,
                behavior: BehaviorMode::Pursuit,
            },
            wander: WanderConfig::default(),
            height: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub base_enemies: u32,
    pub enemies_per_wave: u32,
    /// Distance kept from the arena edge when placing enemies
    pub margin: f32,
    pub min_player_distance: f32,
    /// Placement attempts before a too-close position is accepted anyway
    pub max_attempts: u32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            base_enemies: 4,
            enemies_per_wave: 2,
            margin: 2.0,
            min_player_distance: 5.0,
            max_attempts: 20,
        }
    }
}

impl SpawnConfig {
    pub fn wave_size(&self, wave: u32) -> u32 {
        self.base_enemies + self.enemies_per_wave * wave.saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// XP needed to leave level 1
    pub base_xp: u32,
    pub xp_growth: f32,
    pub base_xp_per_kill: u32,
    /// Extra kill XP per enemy level above 1, as a fraction of the base
    pub xp_per_enemy_level: f32,
    pub damage_per_level: f32,
    pub attack_rate_per_level: f32,
    pub move_speed_per_level: f32,
    /// Fraction of max health restored on level-up
    pub level_up_heal: f32,
    /// Whether one large award may cross several thresholds at once
    pub cascade_level_ups: bool,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            base_xp: 100,
            xp_growth: 1.5,
            base_xp_per_kill: 25,
            xp_per_enemy_level: 0.5,
            damage_per_level: 0.10,
            attack_rate_per_level: 0.05,
            move_speed_per_level: 0.03,
            level_up_heal: 0.2,
            cascade_level_ups: true,
        }
    }
}

impl GameConfig {
    /// Read and validate a RON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron(&text)
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let arena = &self.arena;
        if arena.min_x >= arena.max_x || arena.min_z >= arena.max_z {
            return Err(invalid("arena bounds are empty or inverted"));
        }
        if self.spawn.margin < 0.0 || arena.width().min(arena.depth()) <= self.spawn.margin * 2.0 {
            return Err(invalid("spawn margin leaves no room to place enemies"));
        }
        if self.spawn.max_attempts == 0 {
            return Err(invalid("spawn.max_attempts must be at least 1"));
        }

        let weapon = &self.weapon;
        let combat = &self.combat;
        for (name, value) in [
            ("weapon.base_damage", weapon.base_damage),
            ("weapon.base_cooldown", weapon.base_cooldown),
            ("weapon.base_radius", weapon.base_radius),
            ("weapon.ramp_duration", weapon.ramp_duration),
            ("weapon.duration", weapon.duration),
            ("combat.player_radius", combat.player_radius),
            ("combat.enemy_radius", combat.enemy_radius),
            ("combat.contact_dps", combat.contact_dps),
            ("combat.death_duration", combat.death_duration),
            ("player.max_health", self.player.max_health),
            ("enemies.swarmer.base_health", self.enemies.swarmer.base_health),
            ("enemies.brute.base_health", self.enemies.brute.base_health),
            ("progression.xp_growth", self.progression.xp_growth),
        ] {
            if value <= 0.0 {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }
        for (name, value) in [
            ("enemies.swarmer.health_per_wave", self.enemies.swarmer.health_per_wave),
            ("enemies.brute.health_per_wave", self.enemies.brute.health_per_wave),
            ("progression.level_up_heal", self.progression.level_up_heal),
        ] {
            if value < 0.0 {
                return Err(invalid(format!("{name} cannot be negative, got {value}")));
            }
        }
        if weapon.ramp_duration > weapon.duration {
            return Err(invalid("weapon.ramp_duration cannot exceed weapon.duration"));
        }

        let wander = &self.enemies.wander;
        if wander.retarget_min <= 0.0 || wander.retarget_min > wander.retarget_max {
            return Err(invalid("wander retarget window must satisfy 0 < min <= max"));
        }
        if !(0.0..=1.0).contains(&wander.player_bias) {
            return Err(invalid("wander.player_bias must be within [0, 1]"));
        }
        if self.progression.base_xp == 0 {
            return Err(invalid("progression.base_xp must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_overrides_only_named_fields() {
        let config = GameConfig::from_ron("(weapon: (base_damage: 40.0), seed: Some(7))")
            .expect("partial config parses");
        assert_eq!(config.weapon.base_damage, 40.0);
        assert_eq!(config.weapon.base_radius, WeaponConfig::default().base_radius);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.progression, ProgressionConfig::default());
    }

    #[test]
    fn test_behavior_mode_from_ron() {
        let config = GameConfig::from_ron(
            "(enemies: (brute: (base_health: 50.0, health_per_wave: 25.0, speed: 1.8, \
             behavior: WanderUntilSighted(sight_range: 9.0))))",
        )
        .expect("config parses");
        assert_eq!(
            config.enemies.brute.behavior,
            BehaviorMode::WanderUntilSighted { sight_range: 9.0 }
        );
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = GameConfig::from_ron("(weapon: (base_damage: ))").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rejects_inverted_arena() {
        let config = GameConfig {
            arena: ArenaBounds::new(5.0, -5.0, -5.0, 5.0),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_ramp_longer_than_pulse() {
        let mut config = GameConfig::default();
        config.weapon.ramp_duration = 1.0;
        config.weapon.duration = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_combat_values() {
        let mut config = GameConfig::default();
        config.combat.player_radius = -5.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = GameConfig::default();
        config.combat.enemy_radius = 0.0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.combat.contact_dps = -25.0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.weapon.base_damage = -10.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_growth_and_heal() {
        let mut config = GameConfig::default();
        config.enemies.swarmer.health_per_wave = -15.0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.progression.level_up_heal = -0.2;
        assert!(config.validate().is_err());

        // Zero heal is allowed
        let mut config = GameConfig::default();
        config.progression.level_up_heal = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_wave_health_never_drops_to_zero() {
        let archetype = ArchetypeConfig {
            base_health: 20.0,
            health_per_wave: -15.0,
            speed: 3.5,
            behavior: BehaviorMode::Pursuit,
        };
        assert_eq!(archetype.health_for_wave(1), 20.0);
        assert_eq!(archetype.health_for_wave(2), 5.0);
        assert_eq!(archetype.health_for_wave(3), ArchetypeConfig::MIN_HEALTH);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = GameConfig::load("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_wave_size_grows() {
        let spawn = SpawnConfig::default();
        assert_eq!(spawn.wave_size(1), 4);
        assert_eq!(spawn.wave_size(3), 8);
    }
}
