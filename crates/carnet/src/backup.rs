//! JSON backup files.
//!
//! A backup holds exactly one placement record, pretty-printed, in a file
//! named `CarnetDeStage_<label>.json`. Importing parses the whole file
//! before anything is handed back, so a bad file never reaches the
//! caller's active record.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::PlacementRecord;

/// Prefix of every exported file name.
pub const FILE_PREFIX: &str = "CarnetDeStage_";

/// Label used when the user-supplied one sanitizes to nothing.
const FALLBACK_LABEL: &str = "Stage";

fn unsafe_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1f]+"#).expect("static pattern"))
}

/// Replace characters that cannot appear in a file name.
#[must_use]
pub fn sanitize_label(label: &str) -> String {
    let cleaned = unsafe_chars().replace_all(label.trim(), "-");
    if cleaned.is_empty() {
        FALLBACK_LABEL.to_string()
    } else {
        cleaned.into_owned()
    }
}

/// `CarnetDeStage_<label>.<extension>` with the label sanitized.
#[must_use]
pub fn file_name(label: &str, extension: &str) -> String {
    format!("{FILE_PREFIX}{}.{extension}", sanitize_label(label))
}

/// Suggested backup label: `Carnet_<surname>_<dd-mm-yyyy>`.
#[must_use]
pub fn default_backup_name(record: &PlacementRecord, today: NaiveDate) -> String {
    let surname = if record.surname.is_empty() {
        FALLBACK_LABEL
    } else {
        record.surname.as_str()
    };
    format!("Carnet_{surname}_{}", today.format("%d-%m-%Y"))
}

/// Write `record` as a backup file in `dir` and return its path.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file written.
pub fn export(record: &PlacementRecord, dir: &Path, label: &str) -> Result<PathBuf> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let path = dir.join(file_name(label, "json"));
    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(&path, json)?;

    info!("Exported record {} to {}", record.id, path.display());
    Ok(path)
}

/// Read a backup file.
///
/// # Errors
///
/// Returns [`Error::Import`] if the file cannot be read, does not parse as a
/// placement record, or breaks a record invariant.
pub fn import(path: &Path) -> Result<PlacementRecord> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::import(path, e.to_string()))?;
    let record: PlacementRecord =
        serde_json::from_str(&raw).map_err(|e| Error::import(path, e.to_string()))?;
    record
        .validate()
        .map_err(|e| Error::import(path, e.to_string()))?;

    debug!("Imported record {} from {}", record.id, path.display());
    Ok(record)
}
