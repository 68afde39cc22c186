use anyhow::{Context, Result};
use indicatif::HumanCount;
use std::io::Write;

use gitlog_sqlite::datastore::{Datastore, Summary};

use crate::args;

pub fn run(_global_args: &args::GlobalArgs, args: &args::SummarizeArgs) -> Result<()> {
    let datastore = Datastore::open(&args.database)?;
    let mut writer = args
        .output_args
        .get_writer()
        .context("Failed to open output destination for writing")?;
    let summary = datastore.summarize(args.top_authors)?;

    let mut run_inner = move || -> std::io::Result<()> {
        match &args.output_args.format {
            args::OutputFormat::Human => {
                writeln!(writer)?;
                totals_table(&summary).print(&mut writer)?;
                if !summary.top_authors.is_empty() {
                    writeln!(writer)?;
                    authors_table(&summary).print(&mut writer)?;
                }
            }
            args::OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, &summary)?;
                writeln!(writer)?;
            }
        }
        writer.flush()
    };
    match run_inner() {
        // Ignore SIGPIPE errors, like those that can come from piping to `head`
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(e)?,
        Ok(()) => Ok(()),
    }
}

fn table_format() -> prettytable::format::TableFormat {
    use prettytable::format::{FormatBuilder, LinePosition, LineSeparator};

    FormatBuilder::new()
        .column_separator(' ')
        .separators(&[LinePosition::Title], LineSeparator::new('─', '─', '─', '─'))
        .padding(1, 1)
        .build()
}

fn totals_table(summary: &Summary) -> prettytable::Table {
    use prettytable::row;

    let date = |d: &Option<chrono::DateTime<chrono::Utc>>| match d {
        Some(d) => d.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "-".to_string(),
    };

    let mut table = prettytable::Table::new();
    table.set_format(table_format());
    table.set_titles(row![lb -> "Totals", rb -> ""]);
    table.add_row(row![l -> "Commits", r -> HumanCount(summary.commits as u64)]);
    table.add_row(row![l -> "Changes", r -> HumanCount(summary.changes as u64)]);
    table.add_row(row![l -> "Authors", r -> HumanCount(summary.authors as u64)]);
    table.add_row(row![l -> "Lines added", r -> HumanCount(summary.lines_added.unsigned_abs())]);
    table.add_row(row![l -> "Lines removed", r -> HumanCount(summary.lines_removed.unsigned_abs())]);
    table.add_row(row![l -> "First commit", r -> date(&summary.first_commit)]);
    table.add_row(row![l -> "Last commit", r -> date(&summary.last_commit)]);
    table
}

fn authors_table(summary: &Summary) -> prettytable::Table {
    use prettytable::row;

    let mut table: prettytable::Table = summary
        .top_authors
        .iter()
        .map(|a| {
            row![
                l -> &a.author,
                r -> HumanCount(a.commits as u64),
                r -> HumanCount(a.lines_added.unsigned_abs()),
                r -> HumanCount(a.lines_removed.unsigned_abs())
            ]
        })
        .collect();
    table.set_format(table_format());
    table.set_titles(row![lb -> "Author", cb -> "Commits", cb -> "Lines Added", cb -> "Lines Removed"]);
    table
}
