use anyhow::{bail, Context, Result};
use indicatif::{HumanBytes, HumanCount};
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::{debug, info};

use gitlog_sqlite::datastore::Datastore;
use gitlog_sqlite::finalize::finalize;
use gitlog_sqlite::ingest::{IngestConfig, Ingester};
use gitlog_sqlite::log_reader::LogReader;
use gitlog_sqlite::progress::Progress;

use crate::args;

pub fn run(global_args: &args::GlobalArgs, args: &args::IngestArgs) -> Result<()> {
    debug!("Args: {args:#?}");

    let output = &args.output;
    if output.is_dir() {
        bail!("Output path {} is a directory", output.display());
    }
    if output.exists() && !args.force {
        bail!(
            "Output database {} already exists; use --force to replace it",
            output.display()
        );
    }

    let input: Box<dyn BufRead> = match args.input_path() {
        None => {
            info!("Reading log from stdin");
            Box::new(std::io::stdin().lock())
        }
        Some(path) => {
            info!("Reading log from {}", path.display());
            let f = File::open(path)
                .with_context(|| format!("Failed to open input file {}", path.display()))?;
            Box::new(BufReader::new(f))
        }
    };

    let config = IngestConfig::from(&args.tuning_args);
    let datastore = Datastore::in_memory().context("Failed to create in-memory database")?;
    let ingester = Ingester::start(datastore, &config).context("Failed to start ingestion")?;

    let mut progress = Progress::new_bytes_spinner("Reading log...", global_args.use_progress());
    let mut reader = LogReader::new(ingester);
    let result = read_log(input, &mut reader, &mut progress);
    let num_lines = reader.lines_read();
    let ingester = match result.and_then(|()| Ok(reader.close()?)) {
        Ok(ingester) => ingester,
        Err(e) => {
            progress.abandon();
            return Err(e.context("Failed to ingest log"));
        }
    };
    let num_bytes = progress.position();
    progress.finish_with_message(format!(
        "Read {} lines ({}) of log",
        HumanCount(num_lines),
        HumanBytes(num_bytes),
    ));

    let (datastore, stats) = ingester.finish().context("Failed to store commits")?;
    let stats = finalize(datastore, output, stats)
        .with_context(|| format!("Failed to write database to {}", output.display()))?;

    println!(
        "Ingested {} commits with {} changes into {}",
        HumanCount(stats.commits),
        HumanCount(stats.changes),
        output.display()
    );
    Ok(())
}

/// Feed every line of `input` to `reader`, stopping at the first error.
///
/// Lines are split on `\n`, with one trailing `\r` removed. Invalid UTF-8 is replaced rather than
/// rejected, as commit messages and paths are not guaranteed to be UTF-8.
fn read_log<R: BufRead>(
    mut input: R,
    reader: &mut LogReader<Ingester>,
    progress: &mut Progress,
) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let num_read = input
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("Failed to read input after line {}", reader.lines_read()))?;
        if num_read == 0 {
            return Ok(());
        }
        progress.inc(num_read as u64);
        reader.read_line(String::from_utf8_lossy(strip_line_terminator(&buf)))?;
    }
}

fn strip_line_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
