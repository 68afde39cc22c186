use rusqlite::backup::{Backup, StepResult};
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, debug_span, info};

use crate::datastore::Datastore;
use crate::error::FinalizeError;
use crate::ingest::IngestStats;

/// Copy the entire drained in-memory datastore to `destination` in a single backup pass.
///
/// The backup is written to a temporary file next to `destination`, which is renamed into place
/// only once the backup has completed, so `destination` is never left partially written.
/// Both database handles are closed before this returns.
pub fn finalize(
    datastore: Datastore,
    destination: &Path,
    stats: IngestStats,
) -> Result<IngestStats, FinalizeError> {
    let _span = debug_span!("finalize", "{}", destination.display()).entered();

    let dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = tempfile::Builder::new()
        .prefix(".gitlog-sqlite-")
        .suffix(".db.tmp")
        .tempfile_in(dir)
        .map_err(|source| FinalizeError::Destination {
            path: dir.to_path_buf(),
            source,
        })?;
    debug!("Backing up to temporary file {}", tmp.path().display());

    let mut dst = Connection::open(tmp.path())?;
    backup(datastore.connection(), &mut dst, destination)?;
    dst.close().map_err(|(_conn, e)| e)?;
    drop(datastore);

    tmp.persist(destination)
        .map_err(|e| FinalizeError::Destination {
            path: destination.to_path_buf(),
            source: e.error,
        })?;

    info!(
        "Wrote {} commits and {} changes to {}",
        stats.commits,
        stats.changes,
        destination.display()
    );
    Ok(stats)
}

fn backup(src: &Connection, dst: &mut Connection, destination: &Path) -> Result<(), FinalizeError> {
    let backup = Backup::new(src, dst)?;
    // -1 copies every remaining page in one step
    require_done(backup.step(-1)?, destination)
}

/// A single pass must finish the backup; anything else is fatal.
fn require_done(step: StepResult, destination: &Path) -> Result<(), FinalizeError> {
    match step {
        StepResult::Done => Ok(()),
        _ => Err(FinalizeError::BackupIncomplete(destination.to_path_buf())),
    }
}
