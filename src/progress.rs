use indicatif::{ProgressBar, ProgressStyle};
use lazy_static::lazy_static;
use std::borrow::Cow;
use std::time::{Duration, Instant};

/// How often should the spinner be redrawn?
pub const PROGRESS_UPDATE_INTERVAL: Duration = Duration::from_millis(500);

lazy_static! {
    static ref READING_STYLE: ProgressStyle =
        ProgressStyle::with_template("{spinner} {msg} {bytes} [{elapsed_precise}]")
            .expect("progress bar style template should compile");

    static ref FINISHED_STYLE: ProgressStyle =
        ProgressStyle::with_template("{msg} [{elapsed_precise}]")
            .expect("progress bar style template should compile");
}

/// A spinner counting bytes of log input consumed so far.
///
/// Increments are buffered locally and pushed to the underlying `indicatif::ProgressBar` at most
/// once per `PROGRESS_UPDATE_INTERVAL`, since `inc` is called once per input line.
pub struct Progress {
    inc_since_sync: u64,
    last_sync: Instant,
    inner: ProgressBar,
}

impl Progress {
    /// Create a new spinner. When `enabled` is false, nothing is ever drawn.
    pub fn new_bytes_spinner<T: Into<Cow<'static, str>>>(message: T, enabled: bool) -> Self {
        let inner = if enabled {
            let inner = ProgressBar::new_spinner()
                .with_style(READING_STYLE.clone())
                .with_message(message);
            inner.enable_steady_tick(PROGRESS_UPDATE_INTERVAL);
            inner
        } else {
            ProgressBar::hidden()
        };

        Progress {
            inc_since_sync: 0,
            last_sync: Instant::now(),
            inner,
        }
    }

    #[inline]
    pub fn inc(&mut self, bytes_read: u64) {
        self.inc_since_sync += bytes_read;
        if self.last_sync.elapsed() >= PROGRESS_UPDATE_INTERVAL {
            self.sync();
        }
    }

    /// The number of bytes counted so far, including those not yet drawn.
    pub fn position(&self) -> u64 {
        self.inner.position() + self.inc_since_sync
    }

    pub fn finish_with_message<T: Into<Cow<'static, str>>>(&mut self, message: T) {
        self.sync();
        self.inner.set_style(FINISHED_STYLE.clone());
        self.inner.finish_with_message(message);
    }

    /// Remove the spinner from the terminal, e.g., when reading failed.
    pub fn abandon(&mut self) {
        self.sync();
        self.inner.finish_and_clear();
    }

    fn sync(&mut self) {
        self.inner.inc(self.inc_since_sync);
        self.inc_since_sync = 0;
        self.last_sync = Instant::now();
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.sync();
    }
}
