use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::trace;

use crate::commit::CommitRecord;
use crate::error::{BlockError, IngestError, ParseError, ReadError};
use crate::log_line;
use crate::translate::translate_block;

// -------------------------------------------------------------------------------------------------
// CommitSink
// -------------------------------------------------------------------------------------------------
/// Something that accepts parsed commits, one at a time, in log order.
pub trait CommitSink {
    fn consume(&mut self, commit: CommitRecord) -> Result<(), IngestError>;
}

impl CommitSink for Vec<CommitRecord> {
    fn consume(&mut self, commit: CommitRecord) -> Result<(), IngestError> {
        self.push(commit);
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------
// LogReader
// -------------------------------------------------------------------------------------------------
/// Translates the lines of one complete block, with the trailing blank line removed.
type TranslateFn = fn(&[String]) -> Result<CommitRecord, ParseError>;

/// Reassembles commit blocks from a stream of log lines, fed one at a time.
///
/// A block is complete when the next `commit <id>` line arrives, or when the stream is closed.
/// Each complete block is translated into a `CommitRecord` and handed to the sink.
pub struct LogReader<S> {
    /// Lines of the block under construction; empty only before the first line
    buf: Vec<String>,

    /// Number of lines read so far
    line: u64,

    /// 1-based line number of `buf[0]`
    block_start: u64,

    translate: TranslateFn,

    sink: S,
}

impl<S: CommitSink> LogReader<S> {
    pub fn new(sink: S) -> Self {
        Self::with_translator(sink, translate_block)
    }

    fn with_translator(sink: S, translate: TranslateFn) -> Self {
        LogReader {
            buf: Vec::new(),
            line: 0,
            block_start: 0,
            translate,
            sink,
        }
    }

    /// Feed the next line, without its line terminator.
    ///
    /// Errors are attributed to the first line of the failing block. Callers are expected to
    /// stop reading after an error.
    pub fn read_line<L: Into<String>>(&mut self, line: L) -> Result<(), ReadError> {
        let line = line.into();
        self.line += 1;

        let mut result = Ok(());
        if !self.buf.is_empty() && log_line::is_block_boundary(&line) {
            let block = std::mem::take(&mut self.buf);
            result = self.process_block(block);
        }

        if self.buf.is_empty() {
            self.block_start = self.line;
        }
        self.buf.push(line);

        result
    }

    /// Signal end of input, emitting any buffered block, and give back the sink.
    pub fn close(mut self) -> Result<S, ReadError> {
        if !self.buf.is_empty() {
            let block = std::mem::take(&mut self.buf);
            self.process_block(block)?;
        }
        Ok(self.sink)
    }

    /// The number of lines read so far.
    pub fn lines_read(&self) -> u64 {
        self.line
    }

    #[cfg(test)]
    fn sink(&self) -> &S {
        &self.sink
    }

    fn process_block(&mut self, mut block: Vec<String>) -> Result<(), ReadError> {
        let start = self.block_start;
        let wrap = |source: BlockError| ReadError {
            line: start,
            source,
        };

        // git separates consecutive commits with a blank line
        if block.last().map_or(false, |l| l.is_empty()) {
            block.pop();
        }

        let translate = self.translate;
        let commit = catch_unwind(AssertUnwindSafe(|| translate(&block)))
            .unwrap_or_else(|payload| Err(ParseError::Internal(panic_message(payload))))
            .map_err(|e| wrap(e.into()))?;

        trace!("Read commit {} from line {start}", commit.id());
        self.sink.consume(commit).map_err(|e| wrap(e.into()))
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
