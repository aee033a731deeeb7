//! JSON snapshot cache of the release collection
//!
//! A `releases.json` file under the root folder mirrors the database after
//! every successful mutation. It doubles as the exchange format for
//! export/import and as a fallback copy when the database file is lost.

use std::path::{Path, PathBuf};

use sqlx::SqlitePool;
use tracing::{info, warn};

use relcal_common::release::Release;
use relcal_common::Result;

use crate::db;

pub const SNAPSHOT_FILE: &str = "releases.json";

pub fn snapshot_path(root_folder: &Path) -> PathBuf {
    root_folder.join(SNAPSHOT_FILE)
}

/// Write the collection to the snapshot file. Failures are logged and
/// swallowed: the database already holds the data.
pub fn write(path: &Path, releases: &[Release]) {
    let json = match serde_json::to_string_pretty(releases) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize release snapshot: {}", e);
            return;
        }
    };
    if let Err(e) = std::fs::write(path, json) {
        warn!("Failed to write release snapshot {}: {}", path.display(), e);
    }
}

/// Read the snapshot file. Missing file is an empty collection; a
/// malformed file is treated the same, with a warning.
pub fn read(path: &Path) -> Vec<Release> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str(&raw) {
        Ok(releases) => releases,
        Err(e) => {
            warn!("Ignoring malformed snapshot {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Startup reconciliation between snapshot and database: whichever holds
/// more records wins. When the snapshot is larger it is re-imported
/// wholesale; otherwise the snapshot is rewritten from the database.
///
/// The count heuristic cannot tell "snapshot is ahead" from "database
/// shrank legitimately" (deletes make the database smaller on purpose),
/// so a delete followed by a crash before the snapshot write can
/// resurrect the deleted record. Kept for compatibility with existing
/// snapshot files; see DESIGN.md for the recommended replacement.
pub async fn reconcile(pool: &SqlitePool, path: &Path) -> Result<()> {
    let snapshot = read(path);
    let db_count = db::count(pool).await? as usize;

    if snapshot.len() > db_count {
        info!(
            "Snapshot has {} releases vs {} in database; importing snapshot",
            snapshot.len(),
            db_count
        );
        db::replace_all(pool, &snapshot).await?;
    } else {
        let releases = db::list_releases(pool).await?;
        write(path, &releases);
    }
    Ok(())
}
