use super::*;

#[test]
fn no_args() {
    gitlog_failure!().stderr(predicate::str::contains("Usage:"));
}

#[test]
fn help_lists_subcommands() {
    gitlog_success!("--help")
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("summarize"));
}

#[test]
fn ingest_help_shows_defaults() {
    gitlog_success!("ingest", "--help")
        .stdout(predicate::str::contains("GITLOG_OUTPUT"))
        .stdout(predicate::str::contains("[default: 100]"))
        .stdout(predicate::str::contains("[default: 1024]"));
}

#[test]
fn version() {
    gitlog_success!("--version").stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
