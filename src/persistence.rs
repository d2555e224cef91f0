// 💾 Persistence - versioned JSON snapshot of the whole library
//
// File layout:
//   { "schema_version": 1, "saved_at": "...", "checksum": "<sha256>", "library": { ... } }
//
// The checksum covers the canonical JSON text of `library` (serde_json::Value
// rendering, keys sorted). Load rejects unknown versions, checksum mismatches
// and libraries that fail Library::validate.
//
// No file locking: one process at a time.

use crate::library::Library;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Snapshot format written by this version
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    schema_version: u32,
    saved_at: DateTime<Utc>,
    checksum: String,
    library: serde_json::Value,
}

/// SHA-256 hex digest of the canonical rendering of `payload`
fn compute_checksum(payload: &serde_json::Value) -> Result<String> {
    let canonical = serde_json::to_string(payload)?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write `library` to `path`, replacing whatever was there
pub fn save(library: &Library, path: &Path) -> Result<()> {
    let payload = serde_json::to_value(library).context("Failed to serialize library")?;

    let snapshot = Snapshot {
        schema_version: SCHEMA_VERSION,
        saved_at: Utc::now(),
        checksum: compute_checksum(&payload)?,
        library: payload,
    };

    let json = serde_json::to_string_pretty(&snapshot)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write library data to {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        books = library.books().len(),
        members = library.members().len(),
        "library data saved"
    );

    Ok(())
}

/// Read a library from `path`
///
/// A missing file is not an error: the caller gets an empty library.
pub fn load(path: &Path) -> Result<Library> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no data file found, starting with a new library");
        return Ok(Library::new());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read library data from {}", path.display()))?;

    let library = from_snapshot_str(&raw)
        .with_context(|| format!("Invalid library data in {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        books = library.books().len(),
        members = library.members().len(),
        "library data loaded"
    );

    Ok(library)
}

fn from_snapshot_str(raw: &str) -> Result<Library> {
    let snapshot: Snapshot = serde_json::from_str(raw).context("Failed to parse snapshot")?;

    if snapshot.schema_version != SCHEMA_VERSION {
        bail!(
            "Unsupported schema version {} (expected {})",
            snapshot.schema_version,
            SCHEMA_VERSION
        );
    }

    let checksum = compute_checksum(&snapshot.library)?;
    if checksum != snapshot.checksum {
        bail!(
            "Checksum mismatch: stored {}, computed {}",
            snapshot.checksum,
            checksum
        );
    }

    let library: Library =
        serde_json::from_value(snapshot.library).context("Failed to deserialize library")?;

    library
        .validate()
        .context("Library data failed invariant checks")?;

    Ok(library)
}
