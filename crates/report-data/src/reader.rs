//! Delimited file discovery and loading.
//!
//! Reads the course and membership catalogs and locates the most recent
//! tracking export for the grouped summary.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use regex::Regex;
use report_core::encoding::TextEncoding;
use report_core::error::{ReportError, Result};
use report_core::models::{CourseEntry, MembershipEntry};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::catalog::{Catalog, CatalogEntry, CourseCatalog, MembershipCatalog};

/// Identifier column every catalog must carry.
const CATALOG_KEY_COLUMN: &str = "_id";

// ── Public API ────────────────────────────────────────────────────────────────

/// Read a whole file and decode it with `encoding`.
pub fn read_text(path: &Path, encoding: TextEncoding) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| ReportError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(encoding.decode(&bytes))
}

/// Deserialize every record of a headed, comma-delimited text.
pub fn parse_delimited<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// Load the course catalog.
pub fn load_course_catalog(path: &Path, encoding: TextEncoding) -> Result<CourseCatalog> {
    load_catalog::<CourseEntry>(path, encoding)
}

/// Load the membership catalog.
pub fn load_membership_catalog(path: &Path, encoding: TextEncoding) -> Result<MembershipCatalog> {
    load_catalog::<MembershipEntry>(path, encoding)
}

/// Load both catalogs.
pub fn load_catalogs(
    course_path: &Path,
    membership_path: &Path,
    encoding: TextEncoding,
) -> Result<(CourseCatalog, MembershipCatalog)> {
    Ok((
        load_course_catalog(course_path, encoding)?,
        load_membership_catalog(membership_path, encoding)?,
    ))
}

/// Find the newest `<prefix>_*.csv` file directly inside `dir`.
///
/// "Newest" is by creation time, or modification time where the platform
/// does not report creation. Returns `None` when nothing matches.
pub fn find_latest_csv(dir: &Path, prefix: &str) -> Option<PathBuf> {
    if !dir.exists() {
        warn!("Input directory does not exist: {}", dir.display());
        return None;
    }

    let pattern = file_pattern(prefix)?;

    let mut candidates: Vec<(SystemTime, PathBuf)> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .map(|name| pattern.is_match(name))
                    .unwrap_or(false)
        })
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            let stamp = meta.created().or_else(|_| meta.modified()).ok()?;
            Some((stamp, entry.into_path()))
        })
        .collect();

    // Ties on the timestamp resolve by path so the choice is stable.
    candidates.sort();
    let latest = candidates.pop().map(|(_, path)| path);

    if let Some(path) = &latest {
        debug!("Latest {} export: {}", prefix, path.display());
    }
    latest
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn load_catalog<T>(path: &Path, encoding: TextEncoding) -> Result<Catalog<T>>
where
    T: CatalogEntry + DeserializeOwned,
{
    let text = read_text(path, encoding)?;

    let has_key_column = text
        .lines()
        .next()
        .map(|header| header.split(',').any(|col| col.trim().trim_matches('"') == CATALOG_KEY_COLUMN))
        .unwrap_or(false);
    if !has_key_column {
        warn!(
            "Catalog {} has no {} column; every lookup will miss",
            path.display(),
            CATALOG_KEY_COLUMN
        );
    }

    let entries: Vec<T> = parse_delimited(&text)?;
    debug!("Loaded {} catalog rows from {}", entries.len(), path.display());
    Ok(Catalog::new(entries))
}

fn file_pattern(prefix: &str) -> Option<Regex> {
    Regex::new(&format!(r"^{}_.*\.csv$", regex::escape(prefix))).ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
