use std::path::PathBuf;

// -------------------------------------------------------------------------------------------------
// ParseError
// -------------------------------------------------------------------------------------------------
/// A problem found while classifying or translating the lines of a single commit block.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("expected 3 header lines, found {0}")]
    MissingHeaders(usize),

    #[error("invalid commit id line: {0:?}")]
    InvalidCommitId(String),

    #[error("invalid author line: {0:?}")]
    InvalidAuthor(String),

    #[error("failed to extract time from: {text:?}")]
    InvalidDate {
        text: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid commit format")]
    InvalidCommitFormat,

    #[error("invalid stats string: {0:?}")]
    InvalidStatLine(String),

    #[error("failed to read numeric: {text:?}")]
    InvalidCount {
        text: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("failed to parse commit: {0}")]
    Internal(String),
}

// -------------------------------------------------------------------------------------------------
// IngestError
// -------------------------------------------------------------------------------------------------
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("ingestion pipeline is not ready")]
    NotReady,

    #[error("invalid ingestion configuration: {0}")]
    Config(&'static str),

    #[error("storage failure")]
    Storage(#[from] rusqlite::Error),

    #[error("failed to start writer thread")]
    Spawn(#[source] std::io::Error),

    #[error("writer thread `{0}` panicked")]
    WorkerPanicked(String),

    #[error("datastore lock was poisoned")]
    Poisoned,

    #[error("datastore is still shared with a writer")]
    StillShared,
}

// -------------------------------------------------------------------------------------------------
// BlockError, ReadError
// -------------------------------------------------------------------------------------------------
/// The cause of a failure to turn one commit block into a stored record.
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to consume commit")]
    Sink(#[from] IngestError),
}

/// A block failure, attributed to the line where the failing commit block starts.
#[derive(Debug, thiserror::Error)]
#[error("Error processing commit at line {line}")]
pub struct ReadError {
    pub line: u64,
    #[source]
    pub source: BlockError,
}

// -------------------------------------------------------------------------------------------------
// FinalizeError
// -------------------------------------------------------------------------------------------------
#[derive(Debug, thiserror::Error)]
pub enum FinalizeError {
    #[error("backup to {0} did not complete in one pass")]
    BackupIncomplete(PathBuf),

    #[error("failed to dump in-memory database")]
    Storage(#[from] rusqlite::Error),

    #[error("failed to prepare destination {path}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
