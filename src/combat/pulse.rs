use bevy::prelude::*;

use crate::config::WeaponConfig;
use crate::player::{Player, PlayerIntent};
use crate::progression::PlayerStats;

/// Per-frame snapshot of the expanding ring, consumed by hit resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseState {
    pub active: bool,
    /// Increments on every successful attack
    pub id: u64,
    pub origin: Vec3,
    pub previous_radius: f32,
    pub current_radius: f32,
    pub damage: f32,
}

impl PulseState {
    pub const INACTIVE: Self = Self {
        active: false,
        id: 0,
        origin: Vec3::ZERO,
        previous_radius: 0.0,
        current_radius: 0.0,
        damage: 0.0,
    };
}

/// Outcome of an attack attempt. A failed attempt is a no-op, not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackResult {
    pub success: bool,
    pub pulse_id: u64,
    pub damage: f32,
    pub cooldown: f32,
}

impl AttackResult {
    const NOT_READY: Self = Self {
        success: false,
        pulse_id: 0,
        damage: 0.0,
        cooldown: 0.0,
    };
}

/// Cooldown-gated area attack. Triggering it only starts the ring; damage is
/// dealt as the ring front reaches each enemy.
#[derive(Component, Debug, Clone)]
pub struct AreaPulse {
    pub base_damage: f32,
    pub base_cooldown: f32,
    pub base_radius: f32,
    pub ramp_duration: f32,
    pub duration: f32,
    cooldown: f32,
    active: bool,
    pulse_id: u64,
    origin: Vec3,
    anim_time: f32,
    previous_radius: f32,
    current_radius: f32,
    pending_damage: f32,
}

impl AreaPulse {
    pub fn new(config: &WeaponConfig) -> Self {
        Self {
            base_damage: config.base_damage,
            base_cooldown: config.base_cooldown,
            base_radius: config.base_radius,
            ramp_duration: config.ramp_duration,
            duration: config.duration,
            cooldown: 0.0,
            active: false,
            pulse_id: 0,
            origin: Vec3::ZERO,
            anim_time: 0.0,
            previous_radius: 0.0,
            current_radius: 0.0,
            pending_damage: 0.0,
        }
    }

    pub fn can_attack(&self) -> bool {
        self.cooldown <= 0.0
    }

    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Higher attack rate means a shorter cooldown
    pub fn effective_cooldown(&self, attack_rate: f32) -> f32 {
        if attack_rate > 0.0 {
            self.base_cooldown / attack_rate
        } else {
            self.base_cooldown
        }
    }

    /// Start a new pulse at `origin`. Restarting while a previous ring is still
    /// visible replaces it.
    pub fn attack(&mut self, origin: Vec3, damage_multiplier: f32, attack_rate: f32) -> AttackResult {
        if !self.can_attack() {
            return AttackResult::NOT_READY;
        }

        self.cooldown = self.effective_cooldown(attack_rate);
        self.active = true;
        self.pulse_id += 1;
        self.origin = origin;
        self.anim_time = 0.0;
        self.previous_radius = 0.0;
        self.current_radius = 0.0;
        self.pending_damage = self.base_damage * damage_multiplier;

        AttackResult {
            success: true,
            pulse_id: self.pulse_id,
            damage: self.pending_damage,
            cooldown: self.cooldown,
        }
    }

    /// Tick the cooldown and grow the ring
    pub fn update(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);

        if !self.active {
            return;
        }

        self.anim_time += dt;
        self.previous_radius = self.current_radius;
        let ramp = (self.anim_time / self.ramp_duration).min(1.0);
        self.current_radius = ramp * self.base_radius;

        if self.opacity() <= 0.0 {
            self.active = false;
            self.previous_radius = 0.0;
            self.current_radius = 0.0;
            self.pending_damage = 0.0;
        }
    }

    /// Fade of the ring, 1 at launch down to 0 at the end of its lifetime.
    /// Visual only.
    pub fn opacity(&self) -> f32 {
        if !self.active {
            return 0.0;
        }
        (1.0 - self.anim_time / self.duration).clamp(0.0, 1.0)
    }

    pub fn pulse_state(&self) -> PulseState {
        PulseState {
            active: self.active,
            id: self.pulse_id,
            origin: self.origin,
            previous_radius: self.previous_radius,
            current_radius: self.current_radius,
            damage: self.pending_damage,
        }
    }
}

/// Advance the ring, then launch a new pulse if the player asked for one
pub fn update_area_pulse(
    intent: Res<PlayerIntent>,
    stats: Res<PlayerStats>,
    mut player_query: Query<(&Transform, &mut AreaPulse), With<Player>>,
    time: Res<Time>,
) {
    let Ok((transform, mut pulse)) = player_query.single_mut() else {
        return;
    };

    pulse.update(time.delta_secs());

    if !intent.attack {
        return;
    }

    let result = pulse.attack(transform.translation, stats.damage_multiplier, stats.attack_rate);
    if result.success {
        debug!(
            "Pulse {} fired for {:.1} damage, next in {:.2}s",
            result.pulse_id, result.damage, result.cooldown
        );
    }
}
