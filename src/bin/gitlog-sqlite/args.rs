use clap::{crate_description, crate_version, ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use gitlog_sqlite::ingest::IngestConfig;

// -----------------------------------------------------------------------------
// command-line args
// -----------------------------------------------------------------------------
#[derive(Parser, Debug)]
#[command(
    version,  // retrieved from Cargo.toml `version`
    about,    // retrieved from Cargo.toml `description`
    long_version = crate_version!(),
    long_about = crate_description!(),
)]
#[deny(missing_docs)]
/// Load `git log` output into a SQLite database
pub struct CommandLineArgs {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global_args: GlobalArgs,
}

impl CommandLineArgs {
    pub fn parse_args() -> Self {
        let mut s = Self::parse();

        // If `NO_COLOR` is set in the environment, disable colored output
        //
        // https://no-color.org/
        if std::env::var("NO_COLOR").is_ok() {
            s.global_args.color = Mode::Never
        }

        s
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a commit log into a SQLite database
    ///
    /// The input should be produced by `git log --no-merges --numstat --date=iso8601`.
    ///
    /// Every commit becomes a row of the `commits` table, and every non-binary line of its
    /// `--numstat` section becomes a row of the `changes` table.
    /// Parsing and storage overlap: rows are inserted into an in-memory database by background
    /// writer threads while the log is still being read.
    /// Once the whole log has been read, the in-memory database is written to the output path in
    /// a single pass.
    ///
    /// If any commit fails to parse, ingestion stops, the line where that commit starts is
    /// reported, and no output database is written.
    #[command(display_order = 1)]
    Ingest(IngestArgs),

    /// Summarize the contents of a database written by `ingest`
    #[command(display_order = 2, alias = "summarise")]
    Summarize(SummarizeArgs),
}

// -----------------------------------------------------------------------------
// global options
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
#[command(next_help_heading = "Global Options")]
pub struct GlobalArgs {
    /// Enable verbose output
    ///
    /// This can be repeated up to 3 times to enable successively more output.
    #[arg(global=true, long, short, action=ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error feedback messages
    ///
    /// This silences WARNING, INFO, DEBUG, and TRACE messages and disables progress bars.
    /// This overrides any provided verbosity and progress reporting options.
    #[arg(global=true, long, short)]
    pub quiet: bool,

    /// Enable or disable colored output
    ///
    /// When this is "auto", colors are enabled for stdout and stderr when they are terminals.
    ///
    /// If the `NO_COLOR` environment variable is set, it takes precedence and is equivalent to `--color=never`.
    #[arg(global=true, long, default_value_t=Mode::Auto, value_name="MODE")]
    pub color: Mode,

    /// Enable or disable progress bars
    ///
    /// When this is "auto", progress bars are enabled when stderr is a terminal.
    #[arg(global=true, long, default_value_t=Mode::Auto, value_name="MODE")]
    pub progress: Mode,
}

impl GlobalArgs {
    pub fn use_color<T: IsTerminal>(&self, out: T) -> bool {
        match self.color {
            Mode::Never => false,
            Mode::Always => true,
            Mode::Auto => out.is_terminal(),
        }
    }

    pub fn use_progress(&self) -> bool {
        if self.quiet {
            return false;
        }
        match self.progress {
            Mode::Never => false,
            Mode::Always => true,
            Mode::Auto => std::io::stderr().is_terminal(),
        }
    }
}

/// A generic auto/never/always mode value
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Mode {
    Auto,
    Never,
    Always,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Mode::Auto => "auto",
            Mode::Never => "never",
            Mode::Always => "always",
        };
        write!(f, "{s}")
    }
}

// -----------------------------------------------------------------------------
// `ingest` command
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Read the log from the specified file
    ///
    /// If this is `-` or is not provided, the log is read from stdin.
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Write the database to the specified path
    #[arg(long, short, value_name = "PATH", env("GITLOG_OUTPUT"), default_value = "gitlog.db")]
    pub output: PathBuf,

    /// Replace the output database if it already exists
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub tuning_args: TuningArgs,
}

impl IngestArgs {
    /// The input path, or `None` when reading from stdin.
    pub fn input_path(&self) -> Option<&Path> {
        self.input.as_deref().filter(|p| *p != Path::new("-"))
    }
}

#[derive(Args, Debug)]
#[command(next_help_heading = "Tuning Options")]
pub struct TuningArgs {
    /// Allow at most N pending records in each of the commit and change queues
    #[arg(long, value_name = "N", default_value_t = 100)]
    pub queue_capacity: usize,

    /// Use N threads to insert commits
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub commit_writers: usize,

    /// Use N threads to insert changes
    #[arg(long, value_name = "N", default_value_t = 2)]
    pub change_writers: usize,

    /// Insert at most N rows per transaction
    #[arg(long, value_name = "N", default_value_t = 1024)]
    pub batch_size: usize,
}

impl From<&TuningArgs> for IngestConfig {
    fn from(args: &TuningArgs) -> Self {
        IngestConfig {
            queue_capacity: args.queue_capacity,
            commit_writers: args.commit_writers,
            change_writers: args.change_writers,
            batch_size: args.batch_size,
        }
    }
}

// -----------------------------------------------------------------------------
// `summarize` command
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Summarize the database at the specified path
    #[arg(value_name = "DATABASE")]
    pub database: PathBuf,

    /// List at most N top authors
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub top_authors: usize,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

// -----------------------------------------------------------------------------
// output options
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
#[command(next_help_heading = "Output Options")]
pub struct OutputArgs {
    /// Write output to the specified path
    ///
    /// If this argument is not provided, stdout will be used.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write output in the specified format
    #[arg(long, short, value_name="FORMAT", default_value_t=OutputFormat::Human)]
    pub format: OutputFormat,
}

impl OutputArgs {
    /// Get a writer for the specified output destination.
    pub fn get_writer(&self) -> std::io::Result<Box<dyn std::io::Write>> {
        use std::fs::File;
        use std::io::BufWriter;

        match &self.output {
            None => Ok(Box::new(BufWriter::new(std::io::stdout()))),
            Some(p) => {
                let f = File::create(p)?;
                Ok(Box::new(BufWriter::new(f)))
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// A text-based format designed for humans
    Human,

    /// Pretty-printed JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputFormat::Human => "human",
            OutputFormat::Json => "json",
        };
        write!(f, "{s}")
    }
}
