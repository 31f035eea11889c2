//! Homing steering: per-tick heading correction toward a hostile unit.

use volley_proto::types::Vec2;

use crate::bullet_type::BulletType;
use crate::components::{BulletData, Team};
use crate::spatial::{SpatialEntry, SpatialGrid};

/// Fraction of the remaining angular gap closed per tick.
pub const HOMING_LERP: f32 = 0.08;

/// Wrap an angle in degrees into `[0, 360)`.
pub fn wrap_angle(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation from `from` to `to`, in `(-180, 180]`.
pub fn angle_delta(from: f32, to: f32) -> f32 {
    let d = wrap_angle(to - from);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Move `from` toward `to` along the shortest arc by `t` in `[0, 1]`.
pub fn slerp_angle(from: f32, to: f32, t: f32) -> f32 {
    wrap_angle(from + angle_delta(from, to) * t.clamp(0.0, 1.0))
}

/// Rotate `velocity` toward the bearing from `position` to `target`.
/// Speed is preserved; a zero velocity has no heading and is left as is.
pub fn steer(velocity: Vec2, position: Vec2, target: Vec2) -> Vec2 {
    if velocity.length() <= f32::EPSILON {
        return velocity;
    }
    let bearing = (target - position).angle();
    velocity.with_angle(slerp_angle(velocity.angle(), bearing, HOMING_LERP))
}

/// Pick the unit a homing bullet should steer toward.
///
/// A locked target wins while it is alive and within range; otherwise the
/// nearest hostile unit the type can collide with.
pub fn find_target<'a>(
    grid: &'a SpatialGrid,
    ty: &BulletType,
    team: Team,
    position: Vec2,
    data: Option<&BulletData>,
) -> Option<&'a SpatialEntry> {
    let eligible = |e: &SpatialEntry| team.is_hostile_to(e.team) && ty.targets(e.flying);

    if let Some(BulletData::LockedTarget(rid)) = data {
        if let Some(locked) = grid.get(*rid) {
            let dist = position.distance(&Vec2::new(locked.x, locked.y));
            if eligible(locked) && dist <= ty.homing_range {
                return Some(locked);
            }
        }
    }

    grid.nearest(position.x, position.y, ty.homing_range, eligible)
        .map(|(e, _)| e)
}

#[cfg(test)]
mod tests {
    use bevy_ecs::entity::Entity;

    use super::*;

    fn entry(rid: u64, team: u8, x: f32, y: f32, flying: bool) -> SpatialEntry {
        SpatialEntry {
            entity: Entity::from_raw(rid as u32),
            runtime_id: rid,
            team: Team(team),
            x,
            y,
            hit_size: 8.0,
            flying,
        }
    }

    fn missile() -> BulletType {
        let mut ty = BulletType::new("missile", 3.0, 5.0);
        ty.homing_power = 0.08;
        ty.homing_range = 100.0;
        ty
    }

    #[test]
    fn wrap_angle_range() {
        assert_eq!(wrap_angle(0.0), 0.0);
        assert_eq!(wrap_angle(360.0), 0.0);
        assert!((wrap_angle(-90.0) - 270.0).abs() < 1e-4);
        assert!((wrap_angle(725.0) - 5.0).abs() < 1e-3);
        assert!(wrap_angle(-1e-9) < 360.0);
    }

    #[test]
    fn delta_takes_short_way() {
        assert!((angle_delta(350.0, 10.0) - 20.0).abs() < 1e-4);
        assert!((angle_delta(10.0, 350.0) + 20.0).abs() < 1e-4);
        assert!((angle_delta(0.0, 180.0) - 180.0).abs() < 1e-4);
    }

    #[test]
    fn slerp_across_zero() {
        let a = slerp_angle(350.0, 10.0, 0.5);
        assert!(a.abs() < 1e-3 || (a - 360.0).abs() < 1e-3);
    }

    #[test]
    fn steer_closes_gap_without_overshoot() {
        let position = Vec2::ZERO;
        let target = Vec2::new(0.0, 50.0); // bearing 90
        for heading in [0.0_f32, 45.0, 135.0, 200.0, 300.0, 89.0] {
            let vel = Vec2::from_angle(heading, 4.0);
            let steered = steer(vel, position, target);
            let before = angle_delta(heading, 90.0).abs();
            let after = angle_delta(steered.angle(), 90.0).abs();
            assert!(after < before, "heading {heading}: {after} !< {before}");
            // Same side of the bearing as before
            assert!(angle_delta(heading, 90.0).signum() == angle_delta(steered.angle(), 90.0).signum());
            assert!((steered.length() - 4.0).abs() < 1e-3);
        }
    }

    #[test]
    fn steer_zero_velocity_unchanged() {
        let out = steer(Vec2::ZERO, Vec2::ZERO, Vec2::new(5.0, 5.0));
        assert_eq!(out, Vec2::ZERO);
    }

    #[test]
    fn target_skips_friendly_and_air() {
        let mut grid = SpatialGrid::new();
        grid.insert(entry(1, 1, 5.0, 0.0, false)); // friendly
        grid.insert(entry(2, 2, 10.0, 0.0, true)); // hostile, flying
        grid.insert(entry(3, 2, 40.0, 0.0, false)); // hostile, ground

        let mut ty = missile();
        ty.collides_air = false;
        let t = find_target(&grid, &ty, Team(1), Vec2::ZERO, None).unwrap();
        assert_eq!(t.runtime_id, 3);

        ty.collides_air = true;
        let t = find_target(&grid, &ty, Team(1), Vec2::ZERO, None).unwrap();
        assert_eq!(t.runtime_id, 2);
    }

    #[test]
    fn target_out_of_range() {
        let mut grid = SpatialGrid::new();
        grid.insert(entry(1, 2, 500.0, 0.0, false));
        assert!(find_target(&grid, &missile(), Team(1), Vec2::ZERO, None).is_none());
    }

    #[test]
    fn locked_target_preferred() {
        let mut grid = SpatialGrid::new();
        grid.insert(entry(1, 2, 5.0, 0.0, false));
        grid.insert(entry(2, 2, 60.0, 0.0, false));

        let lock = BulletData::LockedTarget(2);
        let t = find_target(&grid, &missile(), Team(1), Vec2::ZERO, Some(&lock)).unwrap();
        assert_eq!(t.runtime_id, 2);

        // Lock on a vanished unit falls back to nearest
        let lost = BulletData::LockedTarget(99);
        let t = find_target(&grid, &missile(), Team(1), Vec2::ZERO, Some(&lost)).unwrap();
        assert_eq!(t.runtime_id, 1);
    }
}
