use std::path::PathBuf;

use thiserror::Error;
use volley_game::BulletError;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid bullet JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{bullet}: unknown fragment bullet '{frag}'")]
    UnknownFrag { bullet: String, frag: String },

    #[error("{bullet}: unknown effect '{name}'")]
    UnknownEffect { bullet: String, name: String },

    #[error("{bullet}: unknown sound '{name}'")]
    UnknownSound { bullet: String, name: String },

    #[error("{bullet}: unknown status '{name}'")]
    UnknownStatus { bullet: String, name: String },

    #[error("{bullet}: invalid color '{value}', expected RRGGBBAA hex")]
    InvalidColor { bullet: String, value: String },

    #[error("bullet '{0}' is defined more than once")]
    Duplicate(String),

    #[error(transparent)]
    Registry(#[from] BulletError),
}
