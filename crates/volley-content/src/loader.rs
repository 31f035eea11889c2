//! Content loader: scans a directory of bullet files and builds the registry.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};
use volley_game::{BulletRegistry, BulletTypeId, LookupTables};

use crate::error::ContentError;
use crate::file::BulletTypeFile;

/// Load every `*.json` bullet file in `dir` into a validated registry.
///
/// Files that fail to parse are skipped with a warning; unresolved references,
/// duplicate identifiers and invalid coefficients fail the whole load.
pub fn load_dir(dir: &Path, tables: &LookupTables) -> Result<BulletRegistry, ContentError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ContentError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.extension().map(|e| e == "json").unwrap_or(false) {
            continue;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to read {}: {e}", path.display());
                continue;
            }
        };
        match BulletTypeFile::parse_json(&content) {
            Ok(file) => {
                debug!(
                    bullet = %file.identifier,
                    frag = ?file.frag_name(),
                    path = %path.display(),
                    "parsed bullet file"
                );
                files.push(file);
            }
            Err(e) => warn!("Failed to parse {}: {e}", path.display()),
        }
    }

    let registry = build_registry(files, tables)?;
    info!(
        "Loaded {} bullet type(s) from {}",
        registry.len(),
        dir.display()
    );
    Ok(registry)
}

/// Resolve parsed files into a registry. Ids follow identifier order, so the
/// same content yields the same ids on every machine regardless of file order.
pub fn build_registry(
    mut files: Vec<BulletTypeFile>,
    tables: &LookupTables,
) -> Result<BulletRegistry, ContentError> {
    files.sort_by(|a, b| a.identifier.cmp(&b.identifier));

    let mut ids = HashMap::with_capacity(files.len());
    for (index, file) in files.iter().enumerate() {
        let id = u16::try_from(index).map_err(|_| {
            ContentError::Registry(volley_game::BulletError::Configuration(format!(
                "too many bullet types: {}",
                files.len()
            )))
        })?;
        if ids
            .insert(file.identifier.clone(), BulletTypeId(id))
            .is_some()
        {
            return Err(ContentError::Duplicate(file.identifier.clone()));
        }
    }

    let types = files
        .iter()
        .map(|f| f.resolve(tables, &ids))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BulletRegistry::new(types)?)
}
