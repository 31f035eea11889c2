//! Bullet type registry.
//!
//! Owns every loaded `BulletType`, assigns dense ids, and rejects content that
//! could detonate forever (fragment chains that loop back on themselves).

use std::collections::HashSet;

use tracing::debug;

use crate::bullet_type::{BulletType, BulletTypeId};
use crate::error::BulletError;
use crate::tables::{EffectId, StatusId};

/// Read-only set of bullet types, indexed by `BulletTypeId`.
#[derive(Debug, Clone)]
pub struct BulletRegistry {
    types: Vec<BulletType>,
}

impl BulletRegistry {
    /// Validate and register `types`. The type at index `i` gets id `i`;
    /// `frag_bullet` handles must refer to those indices.
    pub fn new(mut types: Vec<BulletType>) -> Result<Self, BulletError> {
        if types.len() > u16::MAX as usize {
            return Err(BulletError::Configuration(format!(
                "too many bullet types: {}",
                types.len()
            )));
        }

        let mut names = HashSet::new();
        for (index, ty) in types.iter_mut().enumerate() {
            ty.id = BulletTypeId(index as u16);
            if !names.insert(ty.name.clone()) {
                return Err(BulletError::Configuration(format!(
                    "duplicate bullet type name '{}'",
                    ty.name
                )));
            }
        }

        let registry = Self { types };
        for ty in &registry.types {
            ty.validate()?;
            if let Some(frag) = ty.frag_bullet {
                if registry.get(frag).is_none() {
                    return Err(BulletError::Configuration(format!(
                        "{}: frag bullet {frag} is not registered",
                        ty.name
                    )));
                }
            }
        }
        registry.check_frag_cycles()?;

        for ty in &registry.types {
            if ty.frag_bullet.is_some() {
                debug!(
                    bullet = %ty.name,
                    spawned_per_hit = registry.fragment_total(ty.id),
                    "frag chain"
                );
            }
        }

        Ok(registry)
    }

    /// A small set of classic bullet types, useful when no content is loaded.
    pub fn builtin() -> Result<Self, BulletError> {
        let mut standard = BulletType::new("standard-copper", 2.5, 9.0);
        standard.lifetime = 60.0;

        let mut dense = BulletType::new("standard-dense", 3.5, 18.0);
        dense.lifetime = 60.0;
        dense.reload_multiplier = 0.6;

        let mut frag_shard = BulletType::new("frag-shard", 2.2, 3.0);
        frag_shard.lifetime = 20.0;
        frag_shard.drag = 0.05;
        frag_shard.hit_size = 2.0;

        let mut flak = BulletType::new("flak-scrap", 4.0, 3.0);
        flak.lifetime = 35.0;
        flak.splash_damage = 22.0;
        flak.splash_damage_radius = 24.0;
        flak.collides_ground = false;
        flak.hit_effect = EffectId::FLAK_EXPLOSION;
        flak.despawn_effect = EffectId::FLAK_EXPLOSION;
        flak.frag_bullet = Some(BulletTypeId(2));
        flak.frag_bullets = 5;

        let mut missile = BulletType::new("missile-explosive", 2.7, 10.0);
        missile.lifetime = 80.0;
        missile.homing_power = 0.08;
        missile.homing_range = 80.0;
        missile.splash_damage = 25.0;
        missile.splash_damage_radius = 25.0;
        missile.status = StatusId::BLASTED;
        missile.hit_effect = EffectId::BLAST_EXPLOSION;

        let mut artillery = BulletType::new("artillery-incendiary", 3.0, 0.0);
        artillery.lifetime = 80.0;
        artillery.collides = false;
        artillery.collides_tiles = false;
        artillery.collides_air = false;
        artillery.splash_damage = 30.0;
        artillery.splash_damage_radius = 25.0;
        artillery.incend_amount = 4;
        artillery.incend_spread = 11.0;
        artillery.incend_chance = 0.6;
        artillery.status = StatusId::BURNING;
        artillery.hit_shake = 1.0;

        let mut arc = BulletType::new("arc-discharge", 0.001, 20.0);
        arc.lifetime = 1.0;
        arc.instant_disappear = true;
        arc.lightning = 2;
        arc.lightning_length = 25;
        arc.collides = false;
        arc.hit_effect = EffectId::HIT_LANCER;
        arc.despawn_effect = EffectId::NONE;
        arc.status = StatusId::SHOCKED;

        // Indices are fixed above: frag-shard must stay at index 2.
        Self::new(vec![
            standard, dense, frag_shard, flak, missile, artillery, arc,
        ])
    }

    /// Look up a bullet type by handle.
    pub fn get(&self, id: BulletTypeId) -> Option<&BulletType> {
        self.types.get(id.0 as usize)
    }

    /// Look up a bullet type by its content name.
    pub fn by_name(&self, name: &str) -> Option<&BulletType> {
        self.types.iter().find(|t| t.name == name)
    }

    /// All registered types, in id order.
    pub fn all(&self) -> &[BulletType] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Total bullets created, transitively, by detonating one bullet of `id`
    /// (assuming every fragment detonates too). Saturates.
    pub fn fragment_total(&self, id: BulletTypeId) -> u64 {
        let Some(ty) = self.get(id) else {
            return 0;
        };
        match ty.frag_bullet {
            Some(child) => (ty.frag_bullets as u64)
                .saturating_mul(self.fragment_total(child).saturating_add(1)),
            None => 0,
        }
    }

    /// Each type has at most one frag edge, so following the chain from every
    /// node either ends or revisits a node already on the path.
    fn check_frag_cycles(&self) -> Result<(), BulletError> {
        for start in &self.types {
            let mut path = vec![start.id];
            let mut current = start.frag_bullet;
            while let Some(next) = current {
                if path.contains(&next) {
                    let chain: Vec<&str> = path
                        .iter()
                        .chain(std::iter::once(&next))
                        .filter_map(|id| self.get(*id).map(|t| t.name.as_str()))
                        .collect();
                    return Err(BulletError::Configuration(format!(
                        "fragment chain never terminates: {}",
                        chain.join(" -> ")
                    )));
                }
                path.push(next);
                current = self.get(next).and_then(|t| t.frag_bullet);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag_pair() -> Vec<BulletType> {
        let shard = BulletType::new("shard", 2.0, 1.0);
        let mut shell = BulletType::new("shell", 3.0, 5.0);
        shell.frag_bullet = Some(BulletTypeId(0));
        shell.frag_bullets = 4;
        vec![shard, shell]
    }

    #[test]
    fn ids_follow_insertion_order() {
        let reg = BulletRegistry::new(frag_pair()).unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.by_name("shard").unwrap().id, BulletTypeId(0));
        assert_eq!(reg.by_name("shell").unwrap().id, BulletTypeId(1));
        assert_eq!(reg.get(BulletTypeId(1)).unwrap().name, "shell");
    }

    #[test]
    fn get_unknown_none() {
        let reg = BulletRegistry::new(frag_pair()).unwrap();
        assert!(reg.get(BulletTypeId(9)).is_none());
        assert!(reg.by_name("railgun").is_none());
    }

    #[test]
    fn self_referential_frag_rejected() {
        let mut looping = BulletType::new("cluster", 2.0, 1.0);
        looping.frag_bullet = Some(BulletTypeId(0));
        let err = BulletRegistry::new(vec![looping]).unwrap_err();
        assert!(matches!(err, BulletError::Configuration(msg) if msg.contains("cluster -> cluster")));
    }

    #[test]
    fn mutual_frag_cycle_rejected() {
        let mut a = BulletType::new("a", 2.0, 1.0);
        a.frag_bullet = Some(BulletTypeId(1));
        let mut b = BulletType::new("b", 2.0, 1.0);
        b.frag_bullet = Some(BulletTypeId(2));
        let mut c = BulletType::new("c", 2.0, 1.0);
        c.frag_bullet = Some(BulletTypeId(0));
        assert!(matches!(
            BulletRegistry::new(vec![a, b, c]),
            Err(BulletError::Configuration(_))
        ));
    }

    #[test]
    fn dangling_frag_rejected() {
        let mut a = BulletType::new("a", 2.0, 1.0);
        a.frag_bullet = Some(BulletTypeId(7));
        assert!(BulletRegistry::new(vec![a]).is_err());
    }

    #[test]
    fn duplicate_names_rejected() {
        let a = BulletType::new("dup", 2.0, 1.0);
        let b = BulletType::new("dup", 3.0, 1.0);
        assert!(BulletRegistry::new(vec![a, b]).is_err());
    }

    #[test]
    fn fragment_totals() {
        let shard = BulletType::new("shard", 2.0, 1.0);
        let mut mid = BulletType::new("mid", 2.0, 1.0);
        mid.frag_bullet = Some(BulletTypeId(0));
        mid.frag_bullets = 3;
        let mut top = BulletType::new("top", 2.0, 1.0);
        top.frag_bullet = Some(BulletTypeId(1));
        top.frag_bullets = 2;
        let reg = BulletRegistry::new(vec![shard, mid, top]).unwrap();
        assert_eq!(reg.fragment_total(BulletTypeId(0)), 0);
        assert_eq!(reg.fragment_total(BulletTypeId(1)), 3);
        // 2 mids, each spawning 3 shards
        assert_eq!(reg.fragment_total(BulletTypeId(2)), 8);
    }

    #[test]
    fn builtin_registry_is_valid() {
        let reg = BulletRegistry::builtin().unwrap();
        assert_eq!(reg.len(), 7);
        let flak = reg.by_name("flak-scrap").unwrap();
        assert_eq!(
            flak.frag_bullet.and_then(|id| reg.get(id)).map(|t| t.name.as_str()),
            Some("frag-shard")
        );
        assert!(reg.by_name("missile-explosive").unwrap().is_homing());
    }
}
