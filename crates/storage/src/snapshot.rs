// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! A snapshot stores the complete table contents at a point in time as
//! zstd-compressed JSON. Writes go to a temporary file that is renamed over
//! the previous snapshot. An unreadable snapshot is rotated to `.bak` and
//! startup proceeds with empty state.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::store::StoreState;

/// Current snapshot schema version
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

const ZSTD_LEVEL: i32 = 3;
const MAX_BAK_FILES: u32 = 3;

/// Errors that can occur in snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot version {0} is newer than supported version {1}")]
    TooNew(u32, u32),
}

/// A snapshot of the store at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version
    #[serde(rename = "v")]
    pub version: u32,
    pub state: StoreState,
    /// When this snapshot was created
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(state: StoreState) -> Self {
        Self { version: CURRENT_SNAPSHOT_VERSION, state, created_at: Utc::now() }
    }

    /// Write the snapshot atomically.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec(self)?;
        let compressed = zstd::encode_all(json.as_slice(), ZSTD_LEVEL)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&compressed)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;

        info!(
            path = %path.display(),
            operations = self.state.operations.len(),
            queued = self.state.queue.entries.len(),
            bytes = compressed.len(),
            "saved snapshot"
        );
        Ok(())
    }
}

/// Load the snapshot at `path`.
///
/// Returns `Ok(None)` when no snapshot exists or the file is corrupt (after
/// rotating it aside).
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    let decoded = zstd::decode_all(bytes.as_slice())
        .map_err(SnapshotError::from)
        .and_then(|json| serde_json::from_slice::<Snapshot>(&json).map_err(SnapshotError::from));

    match decoded {
        Ok(snapshot) if snapshot.version > CURRENT_SNAPSHOT_VERSION => {
            Err(SnapshotError::TooNew(snapshot.version, CURRENT_SNAPSHOT_VERSION))
        }
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(e) => {
            let bak = rotate_bak_path(path);
            warn!(path = %path.display(), bak = %bak.display(), error = %e, "corrupt snapshot, moving aside");
            fs::rename(path, &bak)?;
            Ok(None)
        }
    }
}

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
/// The oldest backup is removed when the limit is reached.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
