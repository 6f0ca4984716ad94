use bevy::prelude::*;

use crate::config::ProgressionConfig;

/// Player stats for the current run. Replaced wholesale on restart.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct PlayerStats {
    pub damage_multiplier: f32,
    pub attack_rate: f32,
    pub max_health: f32,
    pub current_health: f32,
    pub move_speed: f32,
    pub level: u32,
}

impl PlayerStats {
    pub fn new(max_health: f32) -> Self {
        Self {
            damage_multiplier: 1.0,
            attack_rate: 1.0,
            max_health,
            current_health: max_health,
            move_speed: 1.0,
            level: 1,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.current_health <= 0.0
    }

    pub fn health_fraction(&self) -> f32 {
        self.current_health / self.max_health
    }

    /// Returns true only on the call that takes health to zero
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.is_dead() {
            return false;
        }
        self.current_health = (self.current_health - amount).max(0.0);
        self.is_dead()
    }

    /// Heal up to max health, returning how much was actually restored
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.current_health;
        self.current_health = (self.current_health + amount).min(self.max_health);
        self.current_health - before
    }

    pub fn apply_increases(&mut self, increases: &StatIncreases) {
        self.damage_multiplier += increases.damage;
        self.attack_rate += increases.attack_rate;
        self.move_speed += increases.move_speed;
    }
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Additive multiplier bumps granted by level-ups
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatIncreases {
    pub damage: f32,
    pub attack_rate: f32,
    pub move_speed: f32,
}

impl StatIncreases {
    pub fn per_level(config: &ProgressionConfig) -> Self {
        Self {
            damage: config.damage_per_level,
            attack_rate: config.attack_rate_per_level,
            move_speed: config.move_speed_per_level,
        }
    }

    pub fn scaled(self, levels: u32) -> Self {
        let n = levels as f32;
        Self {
            damage: self.damage * n,
            attack_rate: self.attack_rate * n,
            move_speed: self.move_speed * n,
        }
    }
}

/// XP required to advance from `level` to the next one:
/// `floor(base × growth^(level - 1))`.
pub fn xp_for_level(level: u32, config: &ProgressionConfig) -> u32 {
    let exponent = level.saturating_sub(1) as i32;
    let required = (config.base_xp as f64 * (config.xp_growth as f64).powi(exponent)).floor();
    (required as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xp_curve() {
        let config = ProgressionConfig::default();
        assert_eq!(xp_for_level(1, &config), 100);
        assert_eq!(xp_for_level(2, &config), 150);
        assert_eq!(xp_for_level(3, &config), 225);
        assert_eq!(xp_for_level(4, &config), 337);
    }

    #[test]
    fn test_take_damage_clamps_and_reports_once() {
        let mut stats = PlayerStats::new(50.0);
        assert!(!stats.take_damage(20.0));
        assert!(stats.take_damage(100.0));
        assert_eq!(stats.current_health, 0.0);
        // Already dead: no second death report
        assert!(!stats.take_damage(10.0));
        assert_eq!(stats.current_health, 0.0);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut stats = PlayerStats::new(100.0);
        stats.current_health = 90.0;
        let healed = stats.heal(20.0);
        assert_eq!(healed, 10.0);
        assert_eq!(stats.current_health, 100.0);
    }

    #[test]
    fn test_increases_are_additive() {
        let config = ProgressionConfig::default();
        let mut stats = PlayerStats::default();
        stats.apply_increases(&StatIncreases::per_level(&config).scaled(2));
        assert!((stats.damage_multiplier - 1.2).abs() < 1e-6);
        assert!((stats.attack_rate - 1.1).abs() < 1e-6);
        assert!((stats.move_speed - 1.06).abs() < 1e-6);
    }
}
