pub mod commit;
pub mod datastore;
pub mod error;
pub mod finalize;
pub mod ingest;
pub mod log_line;
pub mod log_reader;
pub mod progress;
pub mod translate;
