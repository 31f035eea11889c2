//! Bullet type JSON parsing (bullets/*.json).
//!
//! Only `identifier`, `speed` and `damage` are required; every other field
//! falls back to the `BulletType::new` default when absent.

use std::collections::HashMap;

use serde::Deserialize;
use volley_game::{BulletType, BulletTypeId, EffectId, LookupTables, TileFilter};

use crate::error::ContentError;

/// Raw bullet file structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulletTypeFile {
    pub identifier: String,
    pub speed: f32,
    pub damage: f32,
    pub lifetime: Option<f32>,
    pub drag: Option<f32>,
    pub inaccuracy: Option<f32>,
    pub knockback: Option<f32>,
    pub keep_velocity: Option<bool>,
    pub hit_size: Option<f32>,
    pub pierce: Option<bool>,
    pub kill_shooter: Option<bool>,
    pub instant_disappear: Option<bool>,
    pub hit_shake: Option<f32>,
    pub draw_size: Option<f32>,
    #[serde(default)]
    pub collision: CollisionSection,
    pub splash: Option<SplashSection>,
    pub status: Option<StatusSection>,
    pub fragments: Option<FragmentSection>,
    pub incendiary: Option<IncendiarySection>,
    pub homing: Option<HomingSection>,
    pub lightning: Option<LightningSection>,
    #[serde(default)]
    pub weapon: WeaponSection,
    #[serde(default)]
    pub effects: EffectSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollisionSection {
    /// Collide with units.
    pub units: Option<bool>,
    pub tiles: Option<bool>,
    pub team: Option<bool>,
    pub air: Option<bool>,
    pub ground: Option<bool>,
    pub hit_tiles: Option<bool>,
    pub filter: Option<FilterName>,
}

/// Tile filters expressible in content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterName {
    Any,
    BuildingsOnly,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplashSection {
    pub damage: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusSection {
    pub id: String,
    pub duration: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FragmentSection {
    /// Identifier of the fragment bullet type.
    pub bullet: String,
    pub count: Option<u32>,
    pub velocity_min: Option<f32>,
    pub velocity_max: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncendiarySection {
    pub amount: u32,
    pub spread: Option<f32>,
    pub chance: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HomingSection {
    pub power: f32,
    pub range: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LightningSection {
    pub count: u32,
    pub length: Option<u32>,
    /// `RRGGBBAA`, with or without a leading `#`.
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeaponSection {
    pub ammo_multiplier: Option<f32>,
    pub reload_multiplier: Option<f32>,
    pub recoil: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffectSection {
    pub hit: Option<String>,
    pub despawn: Option<String>,
    pub shoot: Option<String>,
    pub smoke: Option<String>,
    pub sound: Option<String>,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

impl BulletTypeFile {
    /// Parse from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self, ContentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Identifier of the fragment type, if any.
    pub fn frag_name(&self) -> Option<&str> {
        self.fragments.as_ref().map(|f| f.bullet.as_str())
    }

    /// Build the `BulletType`, resolving names through `tables` and fragment
    /// identifiers through `ids`.
    pub fn resolve(
        &self,
        tables: &LookupTables,
        ids: &HashMap<String, BulletTypeId>,
    ) -> Result<BulletType, ContentError> {
        let name = &self.identifier;
        let mut ty = BulletType::new(name.clone(), self.speed, self.damage);

        set(&mut ty.lifetime, self.lifetime);
        set(&mut ty.drag, self.drag);
        set(&mut ty.inaccuracy, self.inaccuracy);
        set(&mut ty.knockback, self.knockback);
        set(&mut ty.keep_velocity, self.keep_velocity);
        set(&mut ty.hit_size, self.hit_size);
        set(&mut ty.pierce, self.pierce);
        set(&mut ty.kill_shooter, self.kill_shooter);
        set(&mut ty.instant_disappear, self.instant_disappear);
        set(&mut ty.hit_shake, self.hit_shake);
        set(&mut ty.draw_size, self.draw_size);

        let c = &self.collision;
        set(&mut ty.collides, c.units);
        set(&mut ty.collides_tiles, c.tiles);
        set(&mut ty.collides_team, c.team);
        set(&mut ty.collides_air, c.air);
        set(&mut ty.collides_ground, c.ground);
        set(&mut ty.hit_tiles, c.hit_tiles);
        if let Some(filter) = c.filter {
            ty.tile_filter = match filter {
                FilterName::Any => TileFilter::Any,
                FilterName::BuildingsOnly => TileFilter::BuildingsOnly,
            };
        }

        if let Some(splash) = &self.splash {
            ty.splash_damage = splash.damage;
            ty.splash_damage_radius = splash.radius;
        }

        if let Some(status) = &self.status {
            ty.status = tables
                .status(&status.id)
                .ok_or_else(|| ContentError::UnknownStatus {
                    bullet: name.clone(),
                    name: status.id.clone(),
                })?;
            set(&mut ty.status_duration, status.duration);
        }

        if let Some(frag) = &self.fragments {
            let id = ids
                .get(&frag.bullet)
                .copied()
                .ok_or_else(|| ContentError::UnknownFrag {
                    bullet: name.clone(),
                    frag: frag.bullet.clone(),
                })?;
            ty.frag_bullet = Some(id);
            set(&mut ty.frag_bullets, frag.count);
            set(&mut ty.frag_velocity_min, frag.velocity_min);
            set(&mut ty.frag_velocity_max, frag.velocity_max);
        }

        if let Some(inc) = &self.incendiary {
            ty.incend_amount = inc.amount;
            set(&mut ty.incend_spread, inc.spread);
            set(&mut ty.incend_chance, inc.chance);
        }

        if let Some(homing) = &self.homing {
            ty.homing_power = homing.power;
            set(&mut ty.homing_range, homing.range);
        }

        if let Some(lightning) = &self.lightning {
            ty.lightning = lightning.count;
            set(&mut ty.lightning_length, lightning.length);
            if let Some(color) = &lightning.color {
                ty.lightning_color = parse_color(color).ok_or_else(|| ContentError::InvalidColor {
                    bullet: name.clone(),
                    value: color.clone(),
                })?;
            }
        }

        let w = &self.weapon;
        set(&mut ty.ammo_multiplier, w.ammo_multiplier);
        set(&mut ty.reload_multiplier, w.reload_multiplier);
        set(&mut ty.recoil, w.recoil);

        let fx = &self.effects;
        let effect = |slot: &Option<String>, fallback: EffectId| -> Result<EffectId, ContentError> {
            match slot {
                Some(n) => tables.effect(n).ok_or_else(|| ContentError::UnknownEffect {
                    bullet: name.clone(),
                    name: n.clone(),
                }),
                None => Ok(fallback),
            }
        };
        ty.hit_effect = effect(&fx.hit, ty.hit_effect)?;
        ty.despawn_effect = effect(&fx.despawn, ty.despawn_effect)?;
        ty.shoot_effect = effect(&fx.shoot, ty.shoot_effect)?;
        ty.smoke_effect = effect(&fx.smoke, ty.smoke_effect)?;
        if let Some(sound) = &fx.sound {
            ty.hit_sound = tables.sound(sound).ok_or_else(|| ContentError::UnknownSound {
                bullet: name.clone(),
                name: sound.clone(),
            })?;
        }

        Ok(ty)
    }
}

/// Parse `RRGGBBAA` (optionally `#`-prefixed) into a packed RGBA8888 value.
fn parse_color(value: &str) -> Option<u32> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}
