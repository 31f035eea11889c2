//! Hit resolution: what a bullet does when it strikes something or runs out
//! of lifetime.
//!
//! Everything here reports outward through `WorldEvent`s. The only state
//! changed in place is the struck unit (health, death, knockback) and the
//! fragments registered as new bullets.

use std::sync::Arc;

use bevy_ecs::prelude::*;
use rand::Rng;
use tracing::{debug, warn};
use volley_proto::types::Vec2;

use crate::bullet_type::{BulletTypeId, TileCheck};
use crate::components::{
    Bullet, BulletData, Dead, Health, Position, RuntimeId, Rotation, Team, Velocity,
};
use crate::world::{BulletWorld, RemovalReason, TileMap, WorldEvent};

/// Fragment spawn offset from the impact point, in world units.
const FRAG_OFFSET_MIN: f32 = 1.0;
const FRAG_OFFSET_MAX: f32 = 7.0;

/// Bullet state read by every resolution path.
struct Impact {
    type_id: BulletTypeId,
    runtime_id: u64,
    team: Team,
    position: Vec2,
    rotation: f32,
    damage_multiplier: f32,
    data: Option<BulletData>,
}

impl BulletWorld {
    fn impact(&self, bullet: Entity) -> Option<Impact> {
        let state = self.world.get::<Bullet>(bullet)?;
        Some(Impact {
            type_id: state.type_id,
            runtime_id: self.world.get::<RuntimeId>(bullet)?.0,
            team: *self.world.get::<Team>(bullet)?,
            position: self.world.get::<Position>(bullet)?.vec(),
            rotation: self.world.get::<Rotation>(bullet)?.0,
            damage_multiplier: state.damage_multiplier,
            data: state.data,
        })
    }

    /// Resolve an impact of `bullet` at `(x, y)`: feedback, fragments,
    /// incendiary roll, splash. Does not remove the bullet.
    pub fn hit(&mut self, bullet: Entity, x: f32, y: f32) {
        let Some(impact) = self.impact(bullet) else {
            debug!(?bullet, "hit on a missing bullet ignored");
            return;
        };
        let registry = Arc::clone(&self.registry);
        let Some(ty) = registry.get(impact.type_id) else {
            return;
        };

        self.emit_effect(ty.hit_effect, x, y, impact.rotation);
        self.emit_sound(ty.hit_sound, impact.runtime_id, x, y);
        if ty.hit_shake > 0.0 {
            self.push_event(WorldEvent::Shake {
                intensity: ty.hit_shake,
                x,
                y,
            });
        }

        if let Some(frag) = ty.frag_bullet {
            for _ in 0..ty.frag_bullets {
                let len = self.rng.gen_range(FRAG_OFFSET_MIN..=FRAG_OFFSET_MAX);
                let angle = self.rng.gen_range(0.0..360.0);
                let scale = self
                    .rng
                    .gen_range(ty.frag_velocity_min..=ty.frag_velocity_max);
                let offset = Vec2::from_angle(angle, len);
                if let Err(e) =
                    self.create_from_parent(frag, bullet, x + offset.x, y + offset.y, angle, scale)
                {
                    warn!(bullet = %ty.name, error = %e, "fragment not created");
                }
            }
        }

        // Rolled even without incendiary payload so the random stream only
        // depends on the sequence of hits.
        let ignites = self.rng.gen::<f32>() < ty.incend_chance;
        if ignites && ty.incend_amount > 0 {
            self.push_event(WorldEvent::Ignite {
                x,
                y,
                radius: ty.incend_spread,
                amount: ty.incend_amount,
            });
        }

        if ty.has_splash() {
            self.push_event(WorldEvent::AreaDamage {
                team: impact.team,
                x,
                y,
                radius: ty.splash_damage_radius,
                amount: ty.splash_damage * impact.damage_multiplier,
            });
        }
    }

    /// `bullet` struck a solid tile: damage it (if the type hits tiles),
    /// resolve the impact at the bullet, and remove the bullet.
    pub fn hit_tile(&mut self, bullet: Entity, tile: (i32, i32)) {
        let Some(impact) = self.impact(bullet) else {
            return;
        };
        let registry = Arc::clone(&self.registry);
        let Some(ty) = registry.get(impact.type_id) else {
            return;
        };

        if ty.hit_tiles {
            let team = self
                .world
                .resource::<TileMap>()
                .get(tile)
                .and_then(|t| t.team);
            self.push_event(WorldEvent::TileDamaged {
                tile,
                team,
                amount: ty.damage * impact.damage_multiplier,
            });
        }
        self.hit(bullet, impact.position.x, impact.position.y);
        self.remove_bullet(bullet, RemovalReason::Collided);
    }

    /// `bullet` struck `unit` directly: damage, status, knockback, then the
    /// impact at the bullet. Piercing bullets remember the unit and keep
    /// flying; others are removed without running `despawned`.
    pub fn hit_unit(&mut self, bullet: Entity, unit: Entity) {
        let Some(impact) = self.impact(bullet) else {
            return;
        };
        let Some(unit_rid) = self.world.get::<RuntimeId>(unit).map(|r| r.0) else {
            return;
        };
        let registry = Arc::clone(&self.registry);
        let Some(ty) = registry.get(impact.type_id) else {
            return;
        };

        let amount = ty.damage * impact.damage_multiplier;
        let remaining = self.world.get_mut::<Health>(unit).map(|mut health| {
            health.current = (health.current - amount).max(0.0);
            health.current
        });
        self.push_event(WorldEvent::UnitDamaged {
            runtime_id: unit_rid,
            amount,
            remaining,
        });
        if remaining.is_some_and(|h| h <= 0.0) && self.world.get::<Dead>(unit).is_none() {
            self.kill_unit(unit);
        }

        if !ty.status.is_none() {
            self.push_event(WorldEvent::StatusApplied {
                runtime_id: unit_rid,
                status: ty.status,
                duration: ty.status_duration,
            });
        }

        if ty.knockback != 0.0 {
            if let Some(unit_pos) = self.world.get::<Position>(unit).map(|p| p.vec()) {
                let impulse = (unit_pos - impact.position).normalized() * ty.knockback;
                if let Some(mut vel) = self.world.get_mut::<Velocity>(unit) {
                    vel.x += impulse.x;
                    vel.y += impulse.y;
                }
            }
        }

        self.hit(bullet, impact.position.x, impact.position.y);

        if ty.pierce {
            if let Some(mut state) = self.world.get_mut::<Bullet>(bullet) {
                state.collided.push(unit_rid);
            }
        } else {
            self.remove_bullet(bullet, RemovalReason::Collided);
        }
    }

    /// Expiry feedback for `bullet`: despawn effect and sound, one full impact
    /// when the type fragments or splashes, then chained discharges.
    /// Does not remove the bullet.
    pub fn despawned(&mut self, bullet: Entity) {
        let Some(impact) = self.impact(bullet) else {
            return;
        };
        let registry = Arc::clone(&self.registry);
        let Some(ty) = registry.get(impact.type_id) else {
            return;
        };
        let Vec2 { x, y } = impact.position;

        self.emit_effect(ty.despawn_effect, x, y, impact.rotation);
        self.emit_sound(ty.hit_sound, impact.runtime_id, x, y);

        if ty.detonates_on_despawn() {
            self.hit(bullet, x, y);
        }

        let color = match impact.data {
            Some(BulletData::Color(tint)) => tint,
            _ => ty.lightning_color,
        };
        for _ in 0..ty.lightning {
            let seed = self.rng.gen::<i32>();
            let angle = self.rng.gen_range(0.0..360.0);
            self.push_event(WorldEvent::Discharge {
                seed,
                team: impact.team,
                color,
                damage: ty.damage * impact.damage_multiplier,
                x,
                y,
                angle,
                length: ty.lightning_length,
            });
        }
    }

    /// Whether `bullet` should stop on `tile`. Empty tiles never stop it,
    /// own-team tiles only with `collides_team`; the type's `TileFilter`
    /// decides the rest.
    pub fn collides(&self, bullet: Entity, tile: (i32, i32)) -> bool {
        let Some(impact) = self.impact(bullet) else {
            return false;
        };
        let Some(ty) = self.registry.get(impact.type_id) else {
            return false;
        };
        let Some(found) = self.world.resource::<TileMap>().get(tile) else {
            return false;
        };
        if found.team == Some(impact.team) && !ty.collides_team {
            return false;
        }
        ty.tile_filter.allows(&TileCheck {
            bullet_team: impact.team,
            bullet_position: impact.position,
            tile,
            tile_team: found.team,
        })
    }
}
