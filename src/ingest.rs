//! The ingestion pipeline: parsed commits go in one end, rows come out in an in-memory
//! `Datastore` at the other.
//!
//! Commits and their changes travel through two separate bounded queues. Each queue is drained
//! by its own group of writer threads, which insert rows in batches. A full queue blocks the
//! submitting thread, so the parser can never get more than a queue's worth ahead of storage.
//!
//! Within a queue, rows are inserted in submission order when the group has a single writer.
//! There is no ordering between the two queues.

use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, error, error_span, trace};

use crate::commit::CommitRecord;
use crate::datastore::{ChangeRow, CommitRow, Datastore};
use crate::error::IngestError;
use crate::log_reader::CommitSink;

// -------------------------------------------------------------------------------------------------
// IngestConfig
// -------------------------------------------------------------------------------------------------
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Capacity of each of the commit and change queues
    pub queue_capacity: usize,

    /// Number of threads inserting commits
    pub commit_writers: usize,

    /// Number of threads inserting changes
    pub change_writers: usize,

    /// Maximum number of rows a writer inserts in one transaction
    pub batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            queue_capacity: 100,
            commit_writers: 1,
            change_writers: 2,
            batch_size: 1024,
        }
    }
}

impl IngestConfig {
    fn validate(&self) -> Result<(), IngestError> {
        if self.queue_capacity == 0 {
            return Err(IngestError::Config("queue capacity must be positive"));
        }
        if self.commit_writers == 0 || self.change_writers == 0 {
            return Err(IngestError::Config("each queue needs at least one writer"));
        }
        if self.batch_size == 0 {
            return Err(IngestError::Config("batch size must be positive"));
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------
// IngestStats
// -------------------------------------------------------------------------------------------------
/// Counts of submitted records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub commits: u64,
    pub changes: u64,
}

// -------------------------------------------------------------------------------------------------
// Ingester
// -------------------------------------------------------------------------------------------------
type WriterHandle = JoinHandle<Result<usize, IngestError>>;

/// A `CommitSink` that writes commits and their changes into a `Datastore` from a pool of
/// writer threads.
///
/// Once any writer fails, every further submission is rejected with `IngestError::NotReady`,
/// and `finish` reports the writer's error.
pub struct Ingester {
    send_commits: Sender<CommitRow>,
    send_changes: Sender<ChangeRow>,

    /// Set by a writer thread when it gives up
    failed: Arc<AtomicBool>,

    /// Shared by the writer threads only; handed back by `finish`
    datastore: Arc<Mutex<Datastore>>,

    writers: Vec<WriterHandle>,

    stats: IngestStats,
}

impl Ingester {
    /// Start the writer threads. The datastore must already have its schema.
    pub fn start(datastore: Datastore, config: &IngestConfig) -> Result<Self, IngestError> {
        config.validate()?;
        debug!("Starting ingestion with {config:?}");

        let datastore = Arc::new(Mutex::new(datastore));
        let failed = Arc::new(AtomicBool::new(false));

        let (send_commits, recv_commits) = crossbeam_channel::bounded(config.queue_capacity);
        let (send_changes, recv_changes) = crossbeam_channel::bounded(config.queue_capacity);

        let mut writers = Vec::with_capacity(config.commit_writers + config.change_writers);
        for idx in 0..config.commit_writers {
            writers.push(spawn_writer(
                format!("commit_writer_{idx}"),
                recv_commits.clone(),
                datastore.clone(),
                failed.clone(),
                config.batch_size,
                Datastore::record_commits,
            )?);
        }
        for idx in 0..config.change_writers {
            writers.push(spawn_writer(
                format!("change_writer_{idx}"),
                recv_changes.clone(),
                datastore.clone(),
                failed.clone(),
                config.batch_size,
                Datastore::record_changes,
            )?);
        }

        Ok(Ingester {
            send_commits,
            send_changes,
            failed,
            datastore,
            writers,
            stats: IngestStats::default(),
        })
    }

    /// Can this ingester still accept records?
    pub fn is_ready(&self) -> bool {
        !self.failed.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Close both queues, wait for the writers to drain them, and give back the datastore.
    ///
    /// Must be called only after the last record has been submitted.
    pub fn finish(self) -> Result<(Datastore, IngestStats), IngestError> {
        let Ingester {
            send_commits,
            send_changes,
            failed: _,
            datastore,
            writers,
            stats,
        } = self;

        // hang up, so the writers exit once their queues are empty
        drop(send_commits);
        drop(send_changes);

        let mut first_error = None;
        for handle in writers {
            let name = handle.thread().name().unwrap_or("writer").to_string();
            let err = match handle.join() {
                Ok(Ok(num_rows)) => {
                    debug!("{name} recorded {num_rows} rows");
                    continue;
                }
                Ok(Err(e)) => e,
                Err(_) => IngestError::WorkerPanicked(name),
            };
            if first_error.is_none() {
                first_error = Some(err);
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let datastore = Arc::try_unwrap(datastore)
            .map_err(|_| IngestError::StillShared)?
            .into_inner()
            .map_err(|_| IngestError::Poisoned)?;

        debug!("Ingested {} commits and {} changes", stats.commits, stats.changes);
        Ok((datastore, stats))
    }
}

impl CommitSink for Ingester {
    fn consume(&mut self, commit: CommitRecord) -> Result<(), IngestError> {
        if !self.is_ready() {
            return Err(IngestError::NotReady);
        }

        let CommitRecord {
            headers,
            comment,
            changes,
        } = commit;

        // a send only fails once every writer of that queue is gone
        self.send_commits
            .send(CommitRow {
                id: headers.id.clone(),
                author: headers.author,
                comment,
                created: headers.date.timestamp(),
            })
            .map_err(|_| IngestError::NotReady)?;
        self.stats.commits += 1;

        for change in changes {
            self.send_changes
                .send(ChangeRow {
                    commit_id: headers.id.clone(),
                    added: change.added,
                    removed: change.removed,
                    path: change.path,
                })
                .map_err(|_| IngestError::NotReady)?;
            self.stats.changes += 1;
        }
        Ok(())
    }
}

type RecordFn<T> = fn(&mut Datastore, &[T]) -> rusqlite::Result<usize>;

fn spawn_writer<T: Send + 'static>(
    name: String,
    recv: Receiver<T>,
    datastore: Arc<Mutex<Datastore>>,
    failed: Arc<AtomicBool>,
    batch_size: usize,
    record: RecordFn<T>,
) -> Result<WriterHandle, IngestError> {
    std::thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            let _span = error_span!("writer", "{name}").entered();
            let result = write_batches(&recv, &datastore, batch_size, record);
            if let Err(e) = &result {
                error!("Writer stopped: {e}");
                failed.store(true, Ordering::SeqCst);
            }
            result
        })
        .map_err(IngestError::Spawn)
}

/// Read rows until all the senders hang up, recording them in batches of at most `batch_size`.
fn write_batches<T>(
    recv: &Receiver<T>,
    datastore: &Mutex<Datastore>,
    batch_size: usize,
    record: RecordFn<T>,
) -> Result<usize, IngestError> {
    let mut num_recorded = 0;
    let mut batch: Vec<T> = Vec::with_capacity(batch_size);

    while let Ok(row) = recv.recv() {
        batch.push(row);
        while batch.len() < batch_size {
            match recv.try_recv() {
                Ok(row) => batch.push(row),
                Err(_) => break,
            }
        }

        let mut ds = datastore.lock().map_err(|_| IngestError::Poisoned)?;
        let num_added = record(&mut ds, &batch)?;
        drop(ds);

        trace!("Recorded {num_added} rows from a batch of {}", batch.len());
        num_recorded += num_added;
        batch.clear();
    }

    Ok(num_recorded)
}
