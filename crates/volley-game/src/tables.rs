//! Name lookup tables for presentation hooks and status effects.
//!
//! Built once at startup and shared read-only. Bullet types store compact ids;
//! the host resolves ids back to names when it plays an effect or sound.

use serde::{Deserialize, Serialize};

/// Visual effect handle. `EffectId::NONE` plays nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectId(pub u16);

/// Sound handle. `SoundId::NONE` plays nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoundId(pub u16);

/// Status effect handle. `StatusId::NONE` applies nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusId(pub u16);

impl EffectId {
    pub const NONE: Self = Self(0);
    pub const HIT_BULLET_SMALL: Self = Self(1);
    pub const SHOOT_SMALL: Self = Self(2);
    pub const SHOOT_SMALL_SMOKE: Self = Self(3);
    pub const FLAK_EXPLOSION: Self = Self(7);
    pub const BLAST_EXPLOSION: Self = Self(8);
    pub const HIT_LANCER: Self = Self(11);

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl SoundId {
    pub const NONE: Self = Self(0);

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl StatusId {
    pub const NONE: Self = Self(0);
    pub const BURNING: Self = Self(1);
    pub const SHOCKED: Self = Self(4);
    pub const BLASTED: Self = Self(5);

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// Name reserved for index 0 in every table.
pub const NONE_NAME: &str = "none";

/// Built-in effects, in id order (index 0 is `none`).
const BUILTIN_EFFECTS: &[&str] = &[
    NONE_NAME,
    "hit_bullet_small",
    "shoot_small",
    "shoot_small_smoke",
    "hit_bullet_big",
    "shoot_big",
    "shoot_big_smoke",
    "flak_explosion",
    "blast_explosion",
    "plastic_explosion",
    "hit_fuse",
    "hit_lancer",
    "hit_flame_small",
    "massive_explosion",
];

const BUILTIN_SOUNDS: &[&str] = &[NONE_NAME, "explosion", "bang", "spark", "boom"];

const BUILTIN_STATUSES: &[&str] = &[
    NONE_NAME, "burning", "freezing", "wet", "shocked", "blasted", "tarred", "corroded",
];

/// Ordered list of names; the position of a name is its id.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: Vec<String>,
}

impl NameTable {
    /// Build a table from names; `none` is always id 0.
    pub fn new(names: &[&str]) -> Self {
        let mut table = Self {
            names: vec![NONE_NAME.to_string()],
        };
        for name in names {
            table.register(name);
        }
        table
    }

    /// Id of `name`, if registered.
    pub fn id(&self, name: &str) -> Option<u16> {
        self.names.iter().position(|n| n == name).map(|i| i as u16)
    }

    /// Name of `id`, if registered.
    pub fn name(&self, id: u16) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    /// Register a name, returning its id (existing names keep theirs).
    pub fn register(&mut self, name: &str) -> u16 {
        if let Some(id) = self.id(name) {
            return id;
        }
        self.names.push(name.to_string());
        (self.names.len() - 1) as u16
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Effect, sound and status tables.
#[derive(Debug, Clone)]
pub struct LookupTables {
    pub effects: NameTable,
    pub sounds: NameTable,
    pub statuses: NameTable,
}

impl Default for LookupTables {
    fn default() -> Self {
        Self::new()
    }
}

impl LookupTables {
    /// Tables pre-populated with the built-in names.
    pub fn new() -> Self {
        Self {
            effects: NameTable::new(BUILTIN_EFFECTS),
            sounds: NameTable::new(BUILTIN_SOUNDS),
            statuses: NameTable::new(BUILTIN_STATUSES),
        }
    }

    pub fn effect(&self, name: &str) -> Option<EffectId> {
        self.effects.id(name).map(EffectId)
    }

    pub fn sound(&self, name: &str) -> Option<SoundId> {
        self.sounds.id(name).map(SoundId)
    }

    pub fn status(&self, name: &str) -> Option<StatusId> {
        self.statuses.id(name).map(StatusId)
    }

    pub fn effect_name(&self, id: EffectId) -> &str {
        self.effects.name(id.0).unwrap_or(NONE_NAME)
    }

    pub fn sound_name(&self, id: SoundId) -> &str {
        self.sounds.name(id.0).unwrap_or(NONE_NAME)
    }

    pub fn status_name(&self, id: StatusId) -> &str {
        self.statuses.name(id.0).unwrap_or(NONE_NAME)
    }
}
