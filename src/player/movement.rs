use bevy::prelude::*;

use crate::arena::ArenaBounds;

/// Top-down ground movement. Intent longer than 1 is normalized so diagonals
/// are not faster; shorter intent (analog input) scales the speed down.
pub fn step_player(position: Vec3, intent: Vec2, speed: f32, dt: f32, bounds: &ArenaBounds) -> Vec3 {
    let intent = if intent.length_squared() > 1.0 {
        intent.normalize()
    } else {
        intent
    };
    let next = position + Vec3::new(intent.x, 0.0, intent.y) * speed * dt;
    bounds.clamp(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec3_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    #[test]
    fn test_moves_along_intent() {
        let bounds = ArenaBounds::square(20.0);
        let next = step_player(Vec3::new(0.0, 1.0, 0.0), Vec2::new(0.0, -1.0), 6.0, 0.5, &bounds);
        assert!(vec3_approx_eq(next, Vec3::new(0.0, 1.0, -3.0)));
    }

    #[test]
    fn test_diagonal_is_not_faster() {
        let bounds = ArenaBounds::square(20.0);
        let next = step_player(Vec3::ZERO, Vec2::new(1.0, 1.0), 6.0, 1.0, &bounds);
        assert!(approx_eq(Vec2::new(next.x, next.z).length(), 6.0));
    }

    #[test]
    fn test_analog_intent_scales_speed() {
        let bounds = ArenaBounds::square(20.0);
        let next = step_player(Vec3::ZERO, Vec2::new(0.5, 0.0), 6.0, 1.0, &bounds);
        assert!(approx_eq(next.x, 3.0));
    }

    #[test]
    fn test_no_intent_no_movement() {
        let bounds = ArenaBounds::square(20.0);
        let start = Vec3::new(2.0, 1.0, -7.0);
        assert_eq!(step_player(start, Vec2::ZERO, 6.0, 1.0, &bounds), start);
    }

    #[test]
    fn test_held_against_wall_stays_inside() {
        let bounds = ArenaBounds::square(5.0);
        let mut position = Vec3::new(4.0, 1.0, 4.0);
        for _ in 0..600 {
            position = step_player(position, Vec2::new(1.0, 1.0), 9.0, 1.0 / 60.0, &bounds);
            assert!(bounds.contains(position));
        }
        assert_eq!(position, Vec3::new(5.0, 1.0, 5.0));
    }
}
