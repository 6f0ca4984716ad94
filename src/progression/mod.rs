//! Progression - kill XP, level-ups and the player's stat economy

use bevy::prelude::*;

use crate::combat::DamageEvent;
use crate::config::{GameConfig, ProgressionConfig};
use crate::game::FrameSet;

pub mod stats;

pub use stats::*;

pub struct ProgressionPlugin;

impl Plugin for ProgressionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<LevelUpEvent>()
            .add_systems(Update, award_kill_xp.in_set(FrameSet::Progression));
    }
}

/// XP counters and the wave the run is on
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Progression {
    pub current_xp: u32,
    pub xp_to_next_level: u32,
    pub wave: u32,
    pub kills: u32,
}

/// What a level-up changed, for the HUD
#[derive(Debug, Clone, PartialEq)]
pub struct LevelUpResult {
    pub new_level: u32,
    pub levels_gained: u32,
    pub increases: StatIncreases,
    pub healed: f32,
}

#[derive(Event, Debug, Clone)]
pub struct LevelUpEvent(pub LevelUpResult);

impl Progression {
    pub fn new(config: &ProgressionConfig) -> Self {
        Self {
            current_xp: 0,
            xp_to_next_level: xp_for_level(1, config),
            wave: 1,
            kills: 0,
        }
    }

    /// `floor(base × (1 + (enemy_level - 1) × bonus))`
    pub fn kill_xp(enemy_level: u32, config: &ProgressionConfig) -> u32 {
        let bonus = 1.0 + enemy_level.saturating_sub(1) as f32 * config.xp_per_enemy_level;
        (config.base_xp_per_kill as f32 * bonus).floor() as u32
    }

    pub fn award_kill_xp(
        &mut self,
        stats: &mut PlayerStats,
        enemy_level: u32,
        config: &ProgressionConfig,
    ) -> Option<LevelUpResult> {
        self.kills += 1;
        let amount = Self::kill_xp(enemy_level, config);
        self.add_xp(stats, amount, config)
    }

    /// Accumulate XP and resolve any level-ups it pays for. Excess XP carries
    /// over into the next level.
    pub fn add_xp(
        &mut self,
        stats: &mut PlayerStats,
        amount: u32,
        config: &ProgressionConfig,
    ) -> Option<LevelUpResult> {
        self.current_xp = self.current_xp.saturating_add(amount);

        let mut levels_gained = 0;
        let mut healed = 0.0;
        while self.current_xp >= self.xp_to_next_level {
            healed += self.level_up(stats, config);
            levels_gained += 1;
            if !config.cascade_level_ups {
                break;
            }
        }

        (levels_gained > 0).then(|| LevelUpResult {
            new_level: stats.level,
            levels_gained,
            increases: StatIncreases::per_level(config).scaled(levels_gained),
            healed,
        })
    }

    fn level_up(&mut self, stats: &mut PlayerStats, config: &ProgressionConfig) -> f32 {
        self.current_xp -= self.xp_to_next_level;
        stats.level += 1;
        stats.apply_increases(&StatIncreases::per_level(config));
        let healed = stats.heal(stats.max_health * config.level_up_heal);
        self.xp_to_next_level = xp_for_level(stats.level, config);
        healed
    }
}

/// Damage path for the player. True iff this hit took health to zero.
pub fn apply_player_damage(stats: &mut PlayerStats, damage: f32) -> bool {
    stats.take_damage(damage)
}

/// Award XP for every kill reported by the combat phase this frame
fn award_kill_xp(
    mut damage_events: EventReader<DamageEvent>,
    mut stats: ResMut<PlayerStats>,
    mut progression: ResMut<Progression>,
    config: Res<GameConfig>,
    mut level_ups: EventWriter<LevelUpEvent>,
) {
    for event in damage_events.read().filter(|e| e.killed) {
        debug!("Kill XP for {:?}", event.target);
        let wave = progression.wave;
        if let Some(result) = progression.award_kill_xp(&mut stats, wave, &config.progression) {
            info!(
                "Level up! Now level {} (+{} levels, healed {:.0})",
                result.new_level, result.levels_gained, result.healed
            );
            level_ups.write(LevelUpEvent(result));
        }
    }
}
