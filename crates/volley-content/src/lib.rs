//! Bullet content loader.
//!
//! Parses one JSON file per bullet type, resolves fragment, effect, sound and
//! status references by name, and builds a validated `BulletRegistry`.

pub mod error;
pub mod file;
pub mod loader;

pub use error::ContentError;
pub use file::BulletTypeFile;
pub use loader::{build_registry, load_dir};
