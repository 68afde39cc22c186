use chrono::{DateTime, Utc};
use serde::Serialize;

// -------------------------------------------------------------------------------------------------
// CommitHeaders
// -------------------------------------------------------------------------------------------------
/// The three mandatory header lines of a commit block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitHeaders {
    /// 40-character lowercase hex commit id
    pub id: String,

    /// Author name and email, exactly as written in the log, e.g. `Jane <jane@example.com>`
    pub author: String,

    /// Author date, resolved from its UTC offset to an absolute instant
    pub date: DateTime<Utc>,
}

// -------------------------------------------------------------------------------------------------
// ChangeRecord
// -------------------------------------------------------------------------------------------------
/// Added and removed line counts for one file touched by a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub added: u32,
    pub removed: u32,

    /// The path as written in the log, including any rename syntax like `a => b`
    pub path: String,
}

// -------------------------------------------------------------------------------------------------
// CommitRecord
// -------------------------------------------------------------------------------------------------
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    pub headers: CommitHeaders,

    /// The commit message with indentation and blank lines removed; possibly empty
    pub comment: String,

    /// Per-file statistics, in log order; binary files are never present
    pub changes: Vec<ChangeRecord>,
}

impl CommitRecord {
    #[inline]
    pub fn id(&self) -> &str {
        &self.headers.id
    }
}
