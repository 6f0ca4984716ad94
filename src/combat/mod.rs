//! Combat system - area pulse weapon, ring hit resolution, contact damage,
//! death windows

use bevy::prelude::*;

use crate::game::FrameSet;

pub mod damage;
pub mod pulse;

pub use damage::*;
pub use pulse::*;

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PulseHitTracker>()
            .add_event::<DamageEvent>()
            .add_event::<PlayerHurt>()
            .add_event::<PlayerDied>()
            .add_systems(Update, update_area_pulse.in_set(FrameSet::Weapon))
            .add_systems(
                Update,
                (process_pulse_hits, trigger_hit_flash)
                    .chain()
                    .in_set(FrameSet::PulseHits),
            )
            .add_systems(Update, process_contact_damage.in_set(FrameSet::Contact))
            .add_systems(
                Update,
                (update_dying_enemies, decay_hit_flash)
                    .chain()
                    .in_set(FrameSet::Cleanup),
            );
    }
}
