//! Projectile simulation core: bullet types, live bullets, hit resolution,
//! homing, and server-authoritative replication.

pub mod bullet_type;
pub mod components;
pub mod error;
pub mod hit;
pub mod homing;
pub mod net;
pub mod registry;
pub mod spatial;
pub mod tables;
pub mod world;

pub use bullet_type::{BulletType, BulletTypeId, TileCheck, TileFilter};
pub use components::{BulletData, Team};
pub use error::BulletError;
pub use net::Role;
pub use registry::BulletRegistry;
pub use tables::{EffectId, LookupTables, SoundId, StatusId};
pub use world::{BulletSnapshot, BulletSpawn, BulletWorld, RemovalReason, UnitSpawn, WorldEvent};
