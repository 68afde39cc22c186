use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use indoc::indoc;
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, debug_span};

const CURRENT_SCHEMA_VERSION: u64 = 1;

// -------------------------------------------------------------------------------------------------
// Rows
// -------------------------------------------------------------------------------------------------
/// A row of the `commits` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitRow {
    pub id: String,
    pub author: String,
    pub comment: String,

    /// Seconds since the Unix epoch
    pub created: i64,
}

/// A row of the `changes` table. Carries its commit id, so writers never need the commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeRow {
    pub commit_id: String,
    pub added: u32,
    pub removed: u32,
    pub path: String,
}

// -------------------------------------------------------------------------------------------------
// Datastore
// -------------------------------------------------------------------------------------------------
/// A SQLite database holding the `commits` and `changes` tables.
///
/// During ingestion this lives in memory; the finished database is copied to disk in one
/// backup pass (see `crate::finalize`). Durable copies can be reopened read-only with `open`.
pub struct Datastore {
    conn: Connection,
}

impl Datastore {
    /// Create a new, empty in-memory datastore with the current schema.
    pub fn in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "synchronous", "off")?;
        let mut ds = Self { conn };
        ds.migrate()?;
        Ok(ds)
    }

    /// Open an existing on-disk datastore, read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open database at {}", path.display()))?;

        let user_version: u64 = conn.pragma_query_value(None, "user_version", |r| r.get(0))?;
        if user_version != CURRENT_SCHEMA_VERSION {
            bail!(
                "Database at {} has schema version {user_version}; expected {CURRENT_SCHEMA_VERSION}",
                path.display()
            );
        }
        Ok(Self { conn })
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    fn migrate(&mut self) -> rusqlite::Result<u64> {
        let _span = debug_span!("Datastore::migrate").entered();
        let tx = self.conn.transaction()?;

        let user_version: u64 = tx.pragma_query_value(None, "user_version", |r| r.get(0))?;
        if user_version == 0 {
            debug!(
                "Migrating database schema from version {} to {}",
                user_version, CURRENT_SCHEMA_VERSION
            );
            tx.execute_batch(indoc! {r#"
                create table commits
                -- One row per commit block of the log.
                (
                    id text not null primary key,
                    author text not null,
                    comments text not null,

                    -- seconds since the Unix epoch
                    created integer not null
                );

                create table changes
                -- One row per non-binary `--numstat` line.
                --
                -- `commit_id` refers to `commits.id` but is not a declared foreign key:
                -- changes may be inserted before their commit.
                (
                    commit_id text not null,
                    added integer not null,
                    removed integer not null,
                    file text not null
                );

                create index changes_commit_id_index on changes (commit_id);
            "#})?;
            tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;
        }
        tx.commit()?;
        Ok(user_version)
    }

    /// Insert a batch of commits in a single transaction.
    pub fn record_commits(&mut self, rows: &[CommitRow]) -> rusqlite::Result<usize> {
        let tx = self.conn.transaction()?;
        let mut stmt = tx.prepare_cached(indoc! {r#"
            insert into commits(id, author, comments, created) values (?, ?, ?, ?)
        "#})?;
        let mut num_added = 0;
        for row in rows {
            num_added += stmt.execute((&row.id, &row.author, &row.comment, row.created))?;
        }
        drop(stmt);
        tx.commit()?;
        Ok(num_added)
    }

    /// Insert a batch of changes in a single transaction.
    pub fn record_changes(&mut self, rows: &[ChangeRow]) -> rusqlite::Result<usize> {
        let tx = self.conn.transaction()?;
        let mut stmt = tx.prepare_cached(indoc! {r#"
            insert into changes(commit_id, added, removed, file) values (?, ?, ?, ?)
        "#})?;
        let mut num_added = 0;
        for row in rows {
            num_added += stmt.execute((&row.commit_id, row.added, row.removed, &row.path))?;
        }
        drop(stmt);
        tx.commit()?;
        Ok(num_added)
    }

    pub fn num_commits(&self) -> rusqlite::Result<usize> {
        self.conn.query_row("select count(*) from commits", [], |r| r.get(0))
    }

    pub fn num_changes(&self) -> rusqlite::Result<usize> {
        self.conn.query_row("select count(*) from changes", [], |r| r.get(0))
    }

    /// Compute aggregate statistics, including the `top_authors` most prolific authors.
    pub fn summarize(&self, top_authors: usize) -> Result<Summary> {
        let _span = debug_span!("Datastore::summarize").entered();

        let (commits, authors, first, last): (usize, usize, Option<i64>, Option<i64>) =
            self.conn.query_row(
                "select count(*), count(distinct author), min(created), max(created) from commits",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )?;

        let (changes, lines_added, lines_removed): (usize, i64, i64) = self.conn.query_row(
            "select count(*), coalesce(sum(added), 0), coalesce(sum(removed), 0) from changes",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;

        let mut stmt = self.conn.prepare_cached(indoc! {r#"
            select c.author, count(*) num_commits, coalesce(sum(s.added), 0), coalesce(sum(s.removed), 0)
            from commits c
            left join (
                select commit_id, sum(added) added, sum(removed) removed
                from changes
                group by 1
            ) s on s.commit_id = c.id
            group by 1
            order by num_commits desc, 1
            limit ?
        "#})?;
        let limit: i64 = top_authors.try_into().context("Author limit is too large")?;
        let entries = stmt.query_map((limit,), |row| {
            Ok(AuthorSummary {
                author: row.get(0)?,
                commits: row.get(1)?,
                lines_added: row.get(2)?,
                lines_removed: row.get(3)?,
            })
        })?;
        let mut top = Vec::new();
        for e in entries {
            top.push(e?);
        }

        let timestamp = |t: Option<i64>| t.and_then(|t| Utc.timestamp_opt(t, 0).single());

        Ok(Summary {
            commits,
            changes,
            authors,
            lines_added,
            lines_removed,
            first_commit: timestamp(first),
            last_commit: timestamp(last),
            top_authors: top,
        })
    }
}

// -------------------------------------------------------------------------------------------------
// Summary
// -------------------------------------------------------------------------------------------------
/// Aggregate statistics of a `Datastore`
#[derive(Debug, Serialize)]
pub struct Summary {
    pub commits: usize,
    pub changes: usize,
    pub authors: usize,
    pub lines_added: i64,
    pub lines_removed: i64,
    pub first_commit: Option<DateTime<Utc>>,
    pub last_commit: Option<DateTime<Utc>>,
    pub top_authors: Vec<AuthorSummary>,
}

#[derive(Debug, Serialize)]
pub struct AuthorSummary {
    pub author: String,
    pub commits: usize,
    pub lines_added: i64,
    pub lines_removed: i64,
}
