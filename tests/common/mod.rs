//! Integration Test Utilities and Common Code

#![allow(dead_code)]

use indoc::indoc;

pub use assert_cmd::prelude::*;
pub use assert_cmd::Command;
pub use assert_fs::prelude::*;
pub use assert_fs::{fixture::ChildPath, TempDir};
pub use predicates::prelude::*;
pub use predicates::str::RegexPredicate;
pub use std::path::Path;

/// Build a `Command` for the `gitlog-sqlite` crate binary with variadic command-line arguments.
///
/// The arguments can be anything that is allowed by `Command::arg`.
#[macro_export]
macro_rules! gitlog {
    ( $( $arg:expr ),* ) => {
        {
            let mut cmd = gitlog_cmd();
            $(
                cmd.arg($arg);
            )*
            cmd
        }
    }
}

/// Build an `assert_cmd::assert::Assert` by calling `gitlog!(args).assert().success()`.
#[macro_export]
macro_rules! gitlog_success {
    ( $( $arg:expr ),* ) => { gitlog!($( $arg ),*).assert().success() }
}

/// Build an `assert_cmd::assert::Assert` by calling `gitlog!(args).assert().failure()`.
#[macro_export]
macro_rules! gitlog_failure {
    ( $( $arg:expr ),* ) => { gitlog!($( $arg ),*).assert().failure() }
}

// make macros easily visible to other modules
pub use {gitlog, gitlog_failure, gitlog_success};

/// Get the command for the `gitlog-sqlite` binary under test.
///
/// If the `GITLOG_TEST_PROGRAM` environment variable is set, its value is used instead of the
/// binary built from this crate. It should be an absolute path.
pub fn gitlog_cmd() -> Command {
    let mut cmd = match std::env::var("GITLOG_TEST_PROGRAM") {
        Ok(program) => Command::new(program),
        Err(_) => Command::cargo_bin("gitlog-sqlite").expect("gitlog-sqlite should be executable"),
    };
    // keep the environment from leaking into expectations
    cmd.env_remove("GITLOG_OUTPUT").env_remove("GITLOG_LOG");
    cmd
}

/// Create a `RegexPredicate` from the given pattern.
pub fn is_match(pat: &str) -> RegexPredicate {
    predicates::str::is_match(pat).expect("pattern should compile")
}

/// Create a `RegexPredicate` for the message printed after a successful ingest.
pub fn match_ingest_stats(num_commits: u64, num_changes: u64) -> RegexPredicate {
    is_match(&format!(
        r"(?m)^Ingested {num_commits} commits with {num_changes} changes into .*$"
    ))
}

/// Three commits by two authors, with three non-binary changes in total.
///
/// The second commit starts at line 10.
pub const SAMPLE_LOG: &str = indoc! {"
    commit 72792d59f46f822cf360e797d886e582a6a2dc60
    Author: Albert <albert@gmail.com>
    Date:   2015-12-21 18:15:30 -0100

        Initial commit

    10\t0\tREADME.md
    -\t-\tlogo.png

    commit d0532bdb9ab40e06ee0702481f623d5054c8831a
    Author: Beatrice <bea@example.com>
    Date:   2015-12-22 09:00:00 +0200

        Revert \"Initial commit\"

        This reverts commit 72792d59f46f822cf360e797d886e582a6a2dc60.

    0\t10\tREADME.md
    3\t1\tsrc/{old => new}/main.rs

    commit 0000000000000000000000000000000000000001
    Author: Albert <albert@gmail.com>
    Date:   2015-12-23 12:00:00 +0000

        Empty commit
"};

/// A mock environment with a scratch directory for input logs and output databases.
pub struct IngestEnv {
    pub root: TempDir,
    pub output: ChildPath,
}

impl IngestEnv {
    pub fn new() -> Self {
        let root = TempDir::new().expect("should be able to create tempdir");
        let output = root.child("gitlog.db");
        assert!(!output.exists());
        Self { root, output }
    }

    pub fn output_path(&self) -> &Path {
        self.output.path()
    }

    /// Create a file within this environment with the given name and contents.
    pub fn input_file_with_contents(&self, name: &str, contents: &str) -> ChildPath {
        let input = self.root.child(name);
        input
            .write_str(contents)
            .expect("should be able to write input file contents");
        assert!(input.is_file());
        input
    }

    /// Create a file containing `SAMPLE_LOG`.
    pub fn sample_log(&self) -> ChildPath {
        self.input_file_with_contents("sample.log", SAMPLE_LOG)
    }

    /// Ingest `SAMPLE_LOG` into this environment's output database.
    pub fn ingest_sample(&self) {
        let input = self.sample_log();
        gitlog_success!("ingest", input.path(), "-o", self.output_path())
            .stdout(match_ingest_stats(3, 3));
    }

    /// Open the output database for inspection.
    pub fn open_output(&self) -> rusqlite::Connection {
        rusqlite::Connection::open_with_flags(
            self.output_path(),
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        )
        .expect("output database should open")
    }

    pub fn count(&self, table: &str) -> i64 {
        self.open_output()
            .query_row(&format!("select count(*) from {table}"), [], |r| r.get(0))
            .expect("count query should succeed")
    }
}
