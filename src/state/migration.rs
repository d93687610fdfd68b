//! Format migration for project files.
//!
//! Older documents are upgraded one version at a time until they reach
//! [`CURRENT_FORMAT_VERSION`]. Versions that are not in the known list,
//! including anything newer than this build, are refused.

use std::path::Path;

use serde_json::Value;

use crate::error::{Result, StudioError};

/// Version written by this build.
pub const CURRENT_FORMAT_VERSION: &str = "1.1.0";

/// Every version this build can read, oldest first.
const KNOWN_VERSIONS: [&str; 2] = ["1.0.0", "1.1.0"];

type MigrationFn = fn(Value) -> std::result::Result<Value, String>;

/// Single-step migrations keyed by (from, to).
const MIGRATIONS: &[(&str, &str, MigrationFn)] = &[("1.0.0", "1.1.0", migrate_1_0_0_to_1_1_0)];

/// Declared format version of a raw document.
pub fn document_version(doc: &Value, path: &Path) -> Result<String> {
    doc.get("format_version")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StudioError::CorruptFile {
            path: path.to_path_buf(),
            reason: "missing format_version".to_string(),
        })
}

/// Bring a raw document up to the current format version.
pub fn migrate_document(mut doc: Value, path: &Path) -> Result<Value> {
    let version = document_version(&doc, path)?;
    if version == CURRENT_FORMAT_VERSION {
        return Ok(doc);
    }
    if !KNOWN_VERSIONS.contains(&version.as_str()) {
        return Err(StudioError::UnsupportedVersion {
            version,
            supported: CURRENT_FORMAT_VERSION.to_string(),
        });
    }

    for (from, to) in migration_path(&version, CURRENT_FORMAT_VERSION) {
        let step = MIGRATIONS
            .iter()
            .find(|(f, t, _)| *f == from && *t == to)
            .map(|(_, _, step)| *step)
            .ok_or_else(|| StudioError::UnsupportedVersion {
                version: from.to_string(),
                supported: CURRENT_FORMAT_VERSION.to_string(),
            })?;
        doc = step(doc).map_err(|reason| StudioError::CorruptFile {
            path: path.to_path_buf(),
            reason: format!("migrating {} to {}: {}", from, to, reason),
        })?;
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("format_version".to_string(), Value::String(to.to_string()));
        }
        log::info!("Migrated {} from format {} to {}", path.display(), from, to);
    }
    Ok(doc)
}

/// Steps needed to go from `from` to `to`; empty if none or if going back.
pub fn migration_path(from: &str, to: &str) -> Vec<(&'static str, &'static str)> {
    let position = |v: &str| KNOWN_VERSIONS.iter().position(|k| *k == v);
    match (position(from), position(to)) {
        (Some(start), Some(end)) if start < end => KNOWN_VERSIONS[start..=end]
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .collect(),
        _ => Vec::new(),
    }
}

/// 1.1.0 renamed note `length` to `duration` and gave every track an
/// `automation` list.
fn migrate_1_0_0_to_1_1_0(mut doc: Value) -> std::result::Result<Value, String> {
    let tracks = doc
        .get_mut("project")
        .and_then(|p| p.get_mut("tracks"))
        .and_then(Value::as_array_mut)
        .ok_or("project.tracks is missing")?;

    for track in tracks {
        let track = track.as_object_mut().ok_or("track is not an object")?;
        track
            .entry("automation")
            .or_insert_with(|| Value::Array(Vec::new()));

        let patterns = track
            .get_mut("content")
            .and_then(|c| c.get_mut("patterns"))
            .and_then(Value::as_array_mut);
        for pattern in patterns.into_iter().flatten() {
            let notes = pattern.get_mut("notes").and_then(Value::as_array_mut);
            for note in notes.into_iter().flatten() {
                let note = note.as_object_mut().ok_or("note is not an object")?;
                if let Some(length) = note.remove("length") {
                    note.insert("duration".to_string(), length);
                }
            }
        }
    }
    Ok(doc)
}
