//! HUD sink - the core reports stats and discrete events; how they are shown
//! is up to the sink

use std::sync::Arc;

use bevy::prelude::*;

use crate::combat::PlayerHurt;
use crate::game::{FrameSet, GameOverEvent};
use crate::progression::{LevelUpEvent, PlayerStats, Progression, StatIncreases};

/// Receives everything the HUD needs. Implementations must not feed anything
/// back into gameplay.
pub trait HudSink: Send + Sync {
    fn update_stats(&self, stats: &PlayerStats, current_xp: u32, xp_to_next_level: u32, wave: u32);
    fn show_level_up(&self, level: u32, increases: &StatIncreases);
    fn show_game_over(&self, level: u32, wave: u32);
    fn flash_damage(&self);
}

#[derive(Resource, Clone)]
pub struct Hud(pub Arc<dyn HudSink>);

/// Sink that writes to the log
pub struct LogHud;

impl HudSink for LogHud {
    fn update_stats(&self, stats: &PlayerStats, current_xp: u32, xp_to_next_level: u32, wave: u32) {
        debug!(
            "HP: {:.0}/{:.0} ({:.0}%)  LV {}  XP {}/{}  WAVE {}",
            stats.current_health,
            stats.max_health,
            stats.health_fraction() * 100.0,
            stats.level,
            current_xp,
            xp_to_next_level,
            wave
        );
    }

    fn show_level_up(&self, level: u32, increases: &StatIncreases) {
        info!(
            "LEVEL {}! damage +{:.0}%, attack rate +{:.0}%, speed +{:.0}%",
            level,
            increases.damage * 100.0,
            increases.attack_rate * 100.0,
            increases.move_speed * 100.0
        );
    }

    fn show_game_over(&self, level: u32, wave: u32) {
        info!("GAME OVER - reached level {} on wave {}", level, wave);
    }

    fn flash_damage(&self) {
        debug!("Damage flash");
    }
}

pub struct HudPlugin {
    sink: Arc<dyn HudSink>,
}

impl HudPlugin {
    pub fn new(sink: impl HudSink + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }
}

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Hud(self.sink.clone()))
            .init_resource::<LevelUpBanner>()
            .init_resource::<DamageFlash>()
            .add_systems(
                Update,
                (
                    push_stats,
                    announce_level_ups,
                    announce_game_over,
                    flash_on_player_hurt,
                    tick_hud_timers,
                )
                    .chain()
                    .in_set(FrameSet::Hud),
            );
    }
}

/// Level-up notification display window
#[derive(Resource, Debug, Default)]
pub struct LevelUpBanner {
    pub level: u32,
    pub remaining: f32,
}

impl LevelUpBanner {
    pub const DISPLAY_SECS: f32 = 2.0;

    pub fn show(&mut self, level: u32) {
        self.level = level;
        self.remaining = Self::DISPLAY_SECS;
    }

    pub fn is_visible(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }
}

/// Screen flash for player damage. While a flash is still fading, further
/// contact damage extends it instead of re-triggering the sink. Each frame of
/// contact adds at least 0.1 while decay removes `decay_rate * dt`, so at
/// 60 Hz a continuous contact keeps the flash lit and the sink is flashed
/// once per contact, not once per frame.
#[derive(Resource, Debug)]
pub struct DamageFlash {
    pub intensity: f32,
    pub decay_rate: f32,
}

impl Default for DamageFlash {
    fn default() -> Self {
        Self {
            intensity: 0.0,
            decay_rate: 4.0, // Fades in 0.25 seconds
        }
    }
}

impl DamageFlash {
    /// Returns true when this starts a new flash
    pub fn trigger(&mut self, damage: f32) -> bool {
        let started = self.intensity <= 0.0;
        self.intensity = (self.intensity + (damage / 25.0).max(0.1)).min(1.0);
        started
    }

    pub fn decay(&mut self, dt: f32) {
        self.intensity = (self.intensity - self.decay_rate * dt).max(0.0);
    }
}

fn push_stats(hud: Res<Hud>, stats: Res<PlayerStats>, progression: Res<Progression>) {
    if !stats.is_changed() && !progression.is_changed() {
        return;
    }
    hud.0.update_stats(
        &stats,
        progression.current_xp,
        progression.xp_to_next_level,
        progression.wave,
    );
}

fn announce_level_ups(
    hud: Res<Hud>,
    mut level_ups: EventReader<LevelUpEvent>,
    mut banner: ResMut<LevelUpBanner>,
) {
    for LevelUpEvent(result) in level_ups.read() {
        hud.0.show_level_up(result.new_level, &result.increases);
        banner.show(result.new_level);
    }
}

fn announce_game_over(hud: Res<Hud>, mut game_overs: EventReader<GameOverEvent>) {
    for event in game_overs.read() {
        hud.0.show_game_over(event.level, event.wave);
    }
}

fn flash_on_player_hurt(
    hud: Res<Hud>,
    mut hurt_events: EventReader<PlayerHurt>,
    mut flash: ResMut<DamageFlash>,
) {
    for event in hurt_events.read() {
        if flash.trigger(event.amount) {
            hud.0.flash_damage();
        }
    }
}

fn tick_hud_timers(
    mut banner: ResMut<LevelUpBanner>,
    mut flash: ResMut<DamageFlash>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();
    if banner.is_visible() {
        banner.tick(dt);
    }
    if flash.intensity > 0.0 {
        flash.decay(dt);
    }
}
