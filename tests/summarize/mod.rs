use super::*;
use pretty_assertions::assert_eq;

#[test]
fn summarize_human() {
    let env = IngestEnv::new();
    env.ingest_sample();
    gitlog_success!("summarize", env.output_path())
        .stdout(is_match(r"(?m)^ Commits +3 *$"))
        .stdout(is_match(r"(?m)^ Authors +2 *$"))
        .stdout(is_match(r"(?m)^ Lines added +13 *$"))
        .stdout(predicate::str::contains("Albert <albert@gmail.com>"))
        .stdout(predicate::str::contains("Beatrice <bea@example.com>"));
}

#[test]
fn summarize_json() {
    let env = IngestEnv::new();
    env.ingest_sample();
    let output = gitlog_success!("summarize", env.output_path(), "--format", "json")
        .get_output()
        .stdout
        .clone();
    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();

    assert_eq!(summary["commits"], 3);
    assert_eq!(summary["changes"], 3);
    assert_eq!(summary["authors"], 2);
    assert_eq!(summary["lines_added"], 13);
    assert_eq!(summary["lines_removed"], 11);
    assert_eq!(summary["first_commit"], "2015-12-21T19:15:30Z");
    assert_eq!(summary["top_authors"][0]["author"], "Albert <albert@gmail.com>");
    assert_eq!(summary["top_authors"][0]["commits"], 2);
    assert_eq!(summary["top_authors"][0]["lines_added"], 10);
    assert_eq!(summary["top_authors"][1]["author"], "Beatrice <bea@example.com>");
}

#[test]
fn summarize_top_authors_limit() {
    let env = IngestEnv::new();
    env.ingest_sample();
    let output = gitlog_success!("summarize", env.output_path(), "-f", "json", "--top-authors", "1")
        .get_output()
        .stdout
        .clone();
    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(summary["top_authors"].as_array().map(|a| a.len()), Some(1));
}

#[test]
fn summarize_to_file() {
    let env = IngestEnv::new();
    env.ingest_sample();
    let report = env.root.child("summary.json");
    gitlog_success!("summarize", env.output_path(), "-f", "json", "-o", report.path())
        .stdout(predicate::str::is_empty());
    report.assert(predicate::str::contains("\"commits\": 3"));
}

#[test]
fn summarize_missing_database() {
    let env = IngestEnv::new();
    gitlog_failure!("summarize", env.output_path())
        .code(2)
        .stderr(predicate::str::contains("Failed to open database"));
}

#[test]
fn summarize_not_a_database() {
    let env = IngestEnv::new();
    env.output.write_str("this is not sqlite, but it is long enough to have a header of sorts").unwrap();
    gitlog_failure!("summarize", env.output_path()).code(2);
}
