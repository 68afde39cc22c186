use super::*;
use pretty_assertions::assert_eq;

#[test]
fn ingest_file() {
    let env = IngestEnv::new();
    env.ingest_sample();
    env.output.assert(predicate::path::is_file());

    assert_eq!(env.count("commits"), 3);
    assert_eq!(env.count("changes"), 3);

    let db = env.open_output();
    let (author, comment, created): (String, String, i64) = db
        .query_row(
            "select author, comments, created from commits where id = ?",
            ("d0532bdb9ab40e06ee0702481f623d5054c8831a",),
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(author, "Beatrice <bea@example.com>");
    assert_eq!(
        comment,
        "Revert \"Initial commit\"\r\nThis reverts commit 72792d59f46f822cf360e797d886e582a6a2dc60."
    );
    assert_eq!(created, 1450767600);

    let mut stmt = db
        .prepare("select added, removed, file from changes where commit_id = ? order by file")
        .unwrap();
    let changes: Vec<(i64, i64, String)> = stmt
        .query_map(("d0532bdb9ab40e06ee0702481f623d5054c8831a",), |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?))
        })
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        changes,
        vec![
            (0, 10, "README.md".to_string()),
            (3, 1, "src/{old => new}/main.rs".to_string()),
        ]
    );
}

#[test]
fn binary_changes_are_skipped() {
    let env = IngestEnv::new();
    env.ingest_sample();
    let num_pngs: i64 = env
        .open_output()
        .query_row("select count(*) from changes where file = 'logo.png'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(num_pngs, 0);
}

#[test]
fn ingest_stdin() {
    let env = IngestEnv::new();
    gitlog!("ingest", "-o", env.output_path())
        .write_stdin(SAMPLE_LOG)
        .assert()
        .success()
        .stdout(match_ingest_stats(3, 3));
    assert_eq!(env.count("commits"), 3);
}

#[test]
fn ingest_stdin_dash() {
    let env = IngestEnv::new();
    gitlog!("ingest", "-", "-o", env.output_path())
        .write_stdin(SAMPLE_LOG)
        .assert()
        .success()
        .stdout(match_ingest_stats(3, 3));
}

#[test]
fn ingest_output_from_env() {
    let env = IngestEnv::new();
    let input = env.sample_log();
    gitlog!("ingest", input.path())
        .env("GITLOG_OUTPUT", env.output_path())
        .assert()
        .success()
        .stdout(match_ingest_stats(3, 3));
    env.output.assert(predicate::path::is_file());
}

#[test]
fn ingest_crlf() {
    let env = IngestEnv::new();
    let input = env.input_file_with_contents("crlf.log", &SAMPLE_LOG.replace('\n', "\r\n"));
    gitlog_success!("ingest", input.path(), "-o", env.output_path())
        .stdout(match_ingest_stats(3, 3));

    let comment: String = env
        .open_output()
        .query_row(
            "select comments from commits where id = ?",
            ("72792d59f46f822cf360e797d886e582a6a2dc60",),
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(comment, "Initial commit");
}

#[test]
fn ingest_empty() {
    let env = IngestEnv::new();
    let input = env.input_file_with_contents("empty.log", "");
    gitlog_success!("ingest", input.path(), "-o", env.output_path())
        .stdout(match_ingest_stats(0, 0));
    assert_eq!(env.count("commits"), 0);
    assert_eq!(env.count("changes"), 0);
}

#[test]
fn ingest_with_tiny_queues() {
    let env = IngestEnv::new();
    let input = env.sample_log();
    gitlog_success!(
        "ingest",
        input.path(),
        "-o",
        env.output_path(),
        "--queue-capacity",
        "1",
        "--change-writers",
        "4",
        "--batch-size",
        "1"
    )
    .stdout(match_ingest_stats(3, 3));
    assert_eq!(env.count("changes"), 3);
}

#[test]
fn ingest_malformed_date() {
    let env = IngestEnv::new();
    let input = env.input_file_with_contents(
        "bad.log",
        &SAMPLE_LOG.replace("Date:   2015-12-22 09:00:00 +0200", "Date:   someday"),
    );
    gitlog_failure!("ingest", input.path(), "-o", env.output_path())
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Error processing commit at line 10"));
    env.output.assert(predicate::path::missing());

    // nothing else is left behind either
    let entries: Vec<_> = std::fs::read_dir(env.root.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn ingest_malformed_stats() {
    let env = IngestEnv::new();
    let input = env.input_file_with_contents(
        "bad.log",
        &SAMPLE_LOG.replace("3\t1\tsrc/", "3\t-\tsrc/"),
    );
    gitlog_failure!("ingest", input.path(), "-o", env.output_path())
        .stderr(predicate::str::contains("Error processing commit at line 10"))
        .stderr(predicate::str::contains("invalid stats string"));
    env.output.assert(predicate::path::missing());
}

#[test]
fn ingest_leading_garbage() {
    let env = IngestEnv::new();
    let input = env.input_file_with_contents("bad.log", &format!("garbage\n{SAMPLE_LOG}"));
    gitlog_failure!("ingest", input.path(), "-o", env.output_path())
        .stderr(predicate::str::contains("Error processing commit at line 1"));
    env.output.assert(predicate::path::missing());
}

#[test]
fn ingest_existing_output() {
    let env = IngestEnv::new();
    env.output.write_str("precious").unwrap();
    let input = env.sample_log();

    gitlog_failure!("ingest", input.path(), "-o", env.output_path())
        .code(2)
        .stderr(predicate::str::contains("already exists"));
    env.output.assert("precious");

    gitlog_success!("ingest", input.path(), "-o", env.output_path(), "--force")
        .stdout(match_ingest_stats(3, 3));
    assert_eq!(env.count("commits"), 3);
}

#[test]
fn ingest_failure_keeps_existing_output() {
    let env = IngestEnv::new();
    env.output.write_str("precious").unwrap();
    let input = env.input_file_with_contents("bad.log", "not a log\n");

    gitlog_failure!("ingest", input.path(), "-o", env.output_path(), "--force");
    env.output.assert("precious");
}

#[test]
fn ingest_missing_input() {
    let env = IngestEnv::new();
    let input = env.root.child("does-not-exist.log");
    gitlog_failure!("ingest", input.path(), "-o", env.output_path())
        .stderr(predicate::str::contains("Failed to open input file"));
    env.output.assert(predicate::path::missing());
}

#[test]
fn ingest_zero_batch_size() {
    let env = IngestEnv::new();
    let input = env.sample_log();
    gitlog_failure!("ingest", input.path(), "-o", env.output_path(), "--batch-size", "0")
        .stderr(predicate::str::contains("batch size must be positive"));
    env.output.assert(predicate::path::missing());
}
