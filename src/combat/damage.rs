use std::collections::HashSet;

use bevy::prelude::*;

use super::pulse::{AreaPulse, PulseState};
use crate::arena::ground_distance;
use crate::config::GameConfig;
use crate::enemies::Enemy;
use crate::player::Player;
use crate::progression::{PlayerStats, apply_player_damage};

/// Health component for enemies
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Clamp at zero. Returns true only on the hit that kills; a dead target
    /// ignores further damage.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if self.is_dead() {
            return false;
        }
        self.current = (self.current - amount).max(0.0);
        self.is_dead()
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }
}

/// Fired when the pulse ring damages an enemy
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    pub target: Entity,
    pub amount: f32,
    pub killed: bool,
}

/// Fired every frame the player takes contact damage
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerHurt {
    pub amount: f32,
}

/// Fired once, on the frame the player's health reaches zero
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerDied;

/// Enemies already hit by the current pulse. Keyed by entity so enemy state
/// never has to record hit status.
#[derive(Resource, Debug, Default)]
pub struct PulseHitTracker {
    pulse_id: Option<u64>,
    hit: HashSet<Entity>,
}

impl PulseHitTracker {
    pub fn clear(&mut self) {
        self.pulse_id = None;
        self.hit.clear();
    }

    /// Switch to `pulse_id`, forgetting hits from any earlier pulse
    fn track(&mut self, pulse_id: u64) {
        if self.pulse_id != Some(pulse_id) {
            self.pulse_id = Some(pulse_id);
            self.hit.clear();
        }
    }

    pub fn was_hit(&self, entity: Entity) -> bool {
        self.hit.contains(&entity)
    }

    pub fn hit_count(&self) -> usize {
        self.hit.len()
    }
}

/// Resolve the ring front against every living enemy. An enemy is hit at most
/// once per pulse: the first frame the ring reaches it.
pub fn resolve_pulse_hits<'a>(
    tracker: &mut PulseHitTracker,
    pulse: &PulseState,
    enemies: impl IntoIterator<Item = (Entity, Vec3, &'a mut Health)>,
) -> Vec<DamageEvent> {
    if !pulse.active {
        tracker.clear();
        return Vec::new();
    }
    tracker.track(pulse.id);

    let mut events = Vec::new();
    for (entity, position, health) in enemies {
        if health.is_dead() || tracker.was_hit(entity) {
            continue;
        }
        if ground_distance(position, pulse.origin) > pulse.current_radius {
            continue;
        }

        tracker.hit.insert(entity);
        let killed = health.apply_damage(pulse.damage);
        events.push(DamageEvent {
            target: entity,
            amount: pulse.damage,
            killed,
        });
    }
    events
}

/// True iff any living enemy overlaps the player on the ground plane
pub fn player_touches_enemy<'a>(
    player_position: Vec3,
    enemies: impl IntoIterator<Item = (Vec3, &'a Health)>,
    player_radius: f32,
    enemy_radius: f32,
) -> bool {
    let reach = player_radius + enemy_radius;
    enemies
        .into_iter()
        .any(|(position, health)| health.is_alive() && ground_distance(player_position, position) <= reach)
}

/// Contact damage for one frame. Returns (damage dealt, died this frame).
pub fn apply_contact_damage(stats: &mut PlayerStats, touching: bool, dps: f32, dt: f32) -> (f32, bool) {
    if !touching || stats.is_dead() {
        return (0.0, false);
    }
    let amount = dps * dt;
    let died = apply_player_damage(stats, amount);
    (amount, died)
}

/// Post-death window: the corpse shrinks away, then is removed
#[derive(Component, Debug, Clone, Copy)]
pub struct Dying {
    pub remaining: f32,
    pub duration: f32,
}

impl Dying {
    pub fn new(duration: f32) -> Self {
        Self {
            remaining: duration,
            duration,
        }
    }

    /// 0 at death, 1 when the corpse is due for removal
    pub fn progress(&self) -> f32 {
        (1.0 - self.remaining / self.duration).clamp(0.0, 1.0)
    }

    /// Returns true once the window has elapsed
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }
}

/// Hit reaction intensity - purely visual, never read by gameplay
#[derive(Component, Debug, Default)]
pub struct HitFlash {
    pub intensity: f32,
}

impl HitFlash {
    const DECAY_RATE: f32 = 6.0;

    pub fn trigger(&mut self, damage: f32) {
        self.intensity = (self.intensity + damage / 20.0).min(1.0);
    }

    pub fn decay(&mut self, dt: f32) {
        self.intensity = (self.intensity - Self::DECAY_RATE * dt).max(0.0);
    }
}

/// Damage every enemy the ring front reached this frame
pub fn process_pulse_hits(
    mut commands: Commands,
    mut tracker: ResMut<PulseHitTracker>,
    player_query: Query<&AreaPulse, With<Player>>,
    mut enemy_query: Query<(Entity, &Transform, &mut Health), With<Enemy>>,
    mut damage_events: EventWriter<DamageEvent>,
    config: Res<GameConfig>,
) {
    let Ok(pulse) = player_query.single() else {
        return;
    };

    let state = pulse.pulse_state();
    let enemies = enemy_query
        .iter_mut()
        .map(|(entity, transform, health)| (entity, transform.translation, health.into_inner()));

    for event in resolve_pulse_hits(&mut tracker, &state, enemies) {
        if event.killed {
            debug!("Enemy {:?} killed by pulse {}", event.target, state.id);
            commands
                .entity(event.target)
                .insert(Dying::new(config.combat.death_duration));
        }
        damage_events.write(event);
    }
}

/// Hurt the player while any enemy is in contact
pub fn process_contact_damage(
    player_query: Query<&Transform, With<Player>>,
    enemy_query: Query<(&Transform, &Health), (With<Enemy>, Without<Player>)>,
    mut stats: ResMut<PlayerStats>,
    mut hurt_events: EventWriter<PlayerHurt>,
    mut died_events: EventWriter<PlayerDied>,
    config: Res<GameConfig>,
    time: Res<Time>,
) {
    let Ok(player_transform) = player_query.single() else {
        return;
    };

    let touching = player_touches_enemy(
        player_transform.translation,
        enemy_query.iter().map(|(t, h)| (t.translation, h)),
        config.combat.player_radius,
        config.combat.enemy_radius,
    );
    if !touching {
        return;
    }

    let (amount, died) = apply_contact_damage(&mut stats, true, config.combat.contact_dps, time.delta_secs());
    if amount > 0.0 {
        hurt_events.write(PlayerHurt { amount });
    }
    if died {
        info!("Player killed at level {}", stats.level);
        died_events.write(PlayerDied);
    }
}

/// Shrink dying enemies and remove them when their window ends
pub fn update_dying_enemies(
    mut commands: Commands,
    mut query: Query<(Entity, &mut Dying, &mut Transform)>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();
    for (entity, mut dying, mut transform) in &mut query {
        if dying.tick(dt) {
            commands.entity(entity).despawn();
        } else {
            transform.scale = Vec3::splat(1.0 - dying.progress());
        }
    }
}

pub fn trigger_hit_flash(
    mut damage_events: EventReader<DamageEvent>,
    mut flash_query: Query<&mut HitFlash>,
) {
    for event in damage_events.read() {
        if let Ok(mut flash) = flash_query.get_mut(event.target) {
            flash.trigger(event.amount);
        }
    }
}

pub fn decay_hit_flash(mut flash_query: Query<&mut HitFlash>, time: Res<Time>) {
    let dt = time.delta_secs();
    for mut flash in &mut flash_query {
        if flash.intensity > 0.0 {
            flash.decay(dt);
        }
    }
}
