//! Project file reading and writing.
//!
//! The document is pretty-printed JSON with a `format_version` header and
//! the project below it. Nothing time-dependent is written, and collections
//! keep their model order, so saving an unchanged project twice produces the
//! same bytes.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::migration::{migrate_document, CURRENT_FORMAT_VERSION};
use crate::error::{Result, StudioError};
use crate::model::Project;

#[derive(Serialize)]
struct DocumentRef<'a> {
    format_version: &'a str,
    project: &'a Project,
}

#[derive(Deserialize)]
struct Document {
    #[allow(dead_code)]
    format_version: String,
    project: Project,
}

/// Canonical serialization of a project.
pub fn to_json(project: &Project) -> Result<String> {
    let doc = DocumentRef {
        format_version: CURRENT_FORMAT_VERSION,
        project,
    };
    let mut json = serde_json::to_string_pretty(&doc)?;
    json.push('\n');
    Ok(json)
}

/// Parse a document; `path` is only used in error messages.
pub fn from_json(text: &str, path: &Path) -> Result<Project> {
    let corrupt = |reason: String| StudioError::CorruptFile {
        path: path.to_path_buf(),
        reason,
    };

    let raw: Value = serde_json::from_str(text).map_err(|e| corrupt(e.to_string()))?;
    if !raw.is_object() {
        return Err(corrupt("top level is not an object".to_string()));
    }
    let migrated = migrate_document(raw, path)?;
    let doc: Document = serde_json::from_value(migrated).map_err(|e| corrupt(e.to_string()))?;

    let mut project = doc.project;
    project.validate().map_err(|e| corrupt(e.to_string()))?;
    project.sort_notes();
    Ok(project)
}

/// Write the project to `path` and remember the path on the project.
pub fn save(project: &mut Project, path: &Path) -> Result<()> {
    let json = to_json(project)?;
    fs::write(path, json.as_bytes()).map_err(|e| StudioError::io(path, e))?;
    project.path = Some(path.to_path_buf());
    info!(
        "Saved project '{}' to {} ({} tracks, {} notes)",
        project.name(),
        path.display(),
        project.tracks().len(),
        project.note_count()
    );
    Ok(())
}

/// Read a project file, migrating older formats.
pub fn load(path: &Path) -> Result<Project> {
    let text = fs::read_to_string(path).map_err(|e| StudioError::io(path, e))?;
    let mut project = from_json(&text, path)?;
    project.path = Some(path.to_path_buf());
    info!(
        "Loaded project '{}' from {} ({} tracks)",
        project.name(),
        path.display(),
        project.tracks().len()
    );
    Ok(project)
}

/// SHA-256 of the canonical serialization, as lowercase hex.
pub fn fingerprint(project: &Project) -> Result<String> {
    let json = to_json(project)?;
    Ok(format!("{:x}", Sha256::digest(json.as_bytes())))
}
