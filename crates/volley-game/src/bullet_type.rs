//! Bullet type definitions.
//!
//! A `BulletType` is immutable tuning data for one projectile kind. Every live
//! bullet references exactly one type through a `BulletTypeId` handle resolved
//! by the `BulletRegistry`.

use std::fmt;

use serde::{Deserialize, Serialize};
use volley_proto::types::Vec2;

use crate::components::Team;
use crate::error::BulletError;
use crate::tables::{EffectId, SoundId, StatusId};

/// Handle of a bullet type inside a `BulletRegistry` (its index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BulletTypeId(pub u16);

impl fmt::Display for BulletTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Below this homing power steering is skipped entirely.
pub const HOMING_EPSILON: f32 = 0.0001;

/// What a tile-collision predicate gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct TileCheck {
    pub bullet_team: Team,
    pub bullet_position: Vec2,
    /// Tile coordinate.
    pub tile: (i32, i32),
    /// Owning team of the tile; `None` for terrain walls.
    pub tile_team: Option<Team>,
}

/// Tile-collision strategy, evaluated after the static collision flags.
#[derive(Debug, Clone, Copy, Default)]
pub enum TileFilter {
    /// Collide with every solid tile.
    #[default]
    Any,
    /// Pass over terrain walls, stop only on team-owned tiles.
    BuildingsOnly,
    /// Custom predicate.
    Custom(fn(&TileCheck) -> bool),
}

impl TileFilter {
    pub fn allows(&self, check: &TileCheck) -> bool {
        match self {
            TileFilter::Any => true,
            TileFilter::BuildingsOnly => check.tile_team.is_some(),
            TileFilter::Custom(predicate) => predicate(check),
        }
    }
}

/// Immutable configuration of one projectile kind.
#[derive(Debug, Clone)]
pub struct BulletType {
    /// Content identifier, e.g. `"flak-scrap"`.
    pub name: String,
    /// Assigned by the registry.
    pub id: BulletTypeId,

    // Motion
    pub speed: f32,
    /// Fractional velocity decay per tick.
    pub drag: f32,
    /// Lifetime in ticks.
    pub lifetime: f32,
    /// Extra spread (degrees) applied by the spawning weapon.
    pub inaccuracy: f32,
    pub knockback: f32,
    /// Inherit the shooter's velocity.
    pub keep_velocity: bool,

    // Damage and collision
    pub damage: f32,
    pub hit_size: f32,
    pub pierce: bool,
    pub splash_damage: f32,
    /// `<= 0` disables splash damage.
    pub splash_damage_radius: f32,
    pub collides: bool,
    pub collides_tiles: bool,
    /// Collide with tiles of the bullet's own team.
    pub collides_team: bool,
    pub collides_air: bool,
    pub collides_ground: bool,
    /// Deal damage to tiles it collides with.
    pub hit_tiles: bool,
    pub tile_filter: TileFilter,

    // Status effect
    pub status: StatusId,
    pub status_duration: f32,

    // Fragmentation
    pub frag_bullet: Option<BulletTypeId>,
    pub frag_bullets: u32,
    pub frag_velocity_min: f32,
    pub frag_velocity_max: f32,

    // Incendiary
    pub incend_amount: u32,
    pub incend_spread: f32,
    /// Bernoulli probability in `[0, 1]`.
    pub incend_chance: f32,

    // Homing
    pub homing_power: f32,
    pub homing_range: f32,

    // Chained discharge
    /// Number of discharge events spawned on despawn.
    pub lightning: u32,
    pub lightning_length: u32,
    /// RGBA8888.
    pub lightning_color: u32,

    // Firing side effects
    /// Kill the shooter when fired (suicide units).
    pub kill_shooter: bool,
    /// Expire on the first tick after creation.
    pub instant_disappear: bool,

    // Weapon-side coefficients, read by spawning code only
    pub ammo_multiplier: f32,
    pub reload_multiplier: f32,
    pub recoil: f32,

    // Presentation
    pub hit_effect: EffectId,
    pub despawn_effect: EffectId,
    pub shoot_effect: EffectId,
    pub smoke_effect: EffectId,
    pub hit_sound: SoundId,
    pub hit_shake: f32,
    pub draw_size: f32,
}

impl BulletType {
    /// New type with the standard defaults.
    pub fn new(name: impl Into<String>, speed: f32, damage: f32) -> Self {
        Self {
            name: name.into(),
            id: BulletTypeId(0),
            speed,
            drag: 0.0,
            lifetime: 40.0,
            inaccuracy: 0.0,
            knockback: 0.0,
            keep_velocity: true,
            damage,
            hit_size: 4.0,
            pierce: false,
            splash_damage: 0.0,
            splash_damage_radius: -1.0,
            collides: true,
            collides_tiles: true,
            collides_team: false,
            collides_air: true,
            collides_ground: true,
            hit_tiles: true,
            tile_filter: TileFilter::Any,
            status: StatusId::NONE,
            status_duration: 60.0 * 10.0,
            frag_bullet: None,
            frag_bullets: 9,
            frag_velocity_min: 0.2,
            frag_velocity_max: 1.0,
            incend_amount: 0,
            incend_spread: 8.0,
            incend_chance: 1.0,
            homing_power: 0.0,
            homing_range: 50.0,
            lightning: 0,
            lightning_length: 5,
            lightning_color: 0xf3e979ff,
            kill_shooter: false,
            instant_disappear: false,
            ammo_multiplier: 2.0,
            reload_multiplier: 1.0,
            recoil: 0.0,
            hit_effect: EffectId::HIT_BULLET_SMALL,
            despawn_effect: EffectId::HIT_BULLET_SMALL,
            shoot_effect: EffectId::SHOOT_SMALL,
            smoke_effect: EffectId::SHOOT_SMALL_SMOKE,
            hit_sound: SoundId::NONE,
            hit_shake: 0.0,
            draw_size: 40.0,
        }
    }

    /// Maximum distance a bullet of this type can travel.
    pub fn range(&self) -> f32 {
        self.speed * self.lifetime * (1.0 - self.drag)
    }

    pub fn is_homing(&self) -> bool {
        self.homing_power > HOMING_EPSILON
    }

    pub fn has_splash(&self) -> bool {
        self.splash_damage_radius > 0.0
    }

    /// Whether running out of lifetime also detonates the bullet.
    pub fn detonates_on_despawn(&self) -> bool {
        self.frag_bullet.is_some() || self.has_splash()
    }

    /// Whether a bullet of this type can collide with a unit.
    pub fn targets(&self, flying: bool) -> bool {
        if flying {
            self.collides_air
        } else {
            self.collides_ground
        }
    }

    /// Static checks on the coefficients of this type alone.
    pub fn validate(&self) -> Result<(), BulletError> {
        let fail = |what: String| Err(BulletError::Configuration(format!("{}: {what}", self.name)));

        let finite = [
            ("damage", self.damage),
            ("inaccuracy", self.inaccuracy),
            ("knockback", self.knockback),
            ("splash_damage", self.splash_damage),
            ("splash_damage_radius", self.splash_damage_radius),
            ("status_duration", self.status_duration),
            ("frag_velocity_min", self.frag_velocity_min),
            ("frag_velocity_max", self.frag_velocity_max),
            ("incend_spread", self.incend_spread),
            ("homing_power", self.homing_power),
            ("homing_range", self.homing_range),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return fail(format!("{field} must be finite, got {value}"));
            }
        }
        if !self.hit_size.is_finite() || self.hit_size < 0.0 {
            return fail(format!("hit_size must be finite and >= 0, got {}", self.hit_size));
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return fail(format!("speed must be finite and >= 0, got {}", self.speed));
        }
        if !self.lifetime.is_finite() || self.lifetime < 0.0 {
            return fail(format!("lifetime must be finite and >= 0, got {}", self.lifetime));
        }
        if !(0.0..1.0).contains(&self.drag) {
            return fail(format!("drag must be in [0, 1), got {}", self.drag));
        }
        if !(0.0..=1.0).contains(&self.incend_chance) {
            return fail(format!(
                "incend_chance must be in [0, 1], got {}",
                self.incend_chance
            ));
        }
        if self.frag_velocity_min > self.frag_velocity_max {
            return fail(format!(
                "frag_velocity_min {} exceeds frag_velocity_max {}",
                self.frag_velocity_min, self.frag_velocity_max
            ));
        }
        Ok(())
    }
}
