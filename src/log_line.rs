//! Classification of individual lines of `git log --no-merges --numstat --date=iso8601` output.
//!
//! Header extraction relies on the fixed labels git writes (`commit `, `Author: `, `Date:   `);
//! these are not general free-text parsers.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use crate::commit::ChangeRecord;
use crate::error::ParseError;

lazy_static! {
    static ref BLOCK_BOUNDARY_PATTERN: Regex = Regex::new(r"^commit\s[0-9a-f]{40}\s*$")
        .expect("block boundary regex should compile");

    static ref STAT_LINE_PATTERN: Regex = Regex::new(r"^[0-9-]+\t[0-9-]+\t")
        .expect("stat line regex should compile");

    static ref NUMERIC_STAT_PATTERN: Regex = Regex::new(r"^([0-9]+)\t([0-9]+)\t(.*)$")
        .expect("numeric stat regex should compile");
}

const COMMIT_LABEL: &str = "commit ";
const AUTHOR_LABEL: &str = "Author: ";
const DATE_LABEL: &str = "Date:";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";
const COMMIT_ID_LEN: usize = 40;

/// Placeholder git writes instead of line counts for binary files.
pub const BINARY_PLACEHOLDER: char = '-';

/// Does this line start a new commit block?
///
/// The marker must be at the very start of the line, so that an indented message line like
/// `    This reverts commit <id>.` is not mistaken for a boundary.
#[inline]
pub fn is_block_boundary(line: &str) -> bool {
    BLOCK_BOUNDARY_PATTERN.is_match(line)
}

/// Extract the 40-character commit id from a `commit <id>` line.
///
/// Anything after the id (trailing whitespace, `\r\n`) is ignored.
pub fn extract_id(line: &str) -> Result<&str, ParseError> {
    let invalid = || ParseError::InvalidCommitId(line.to_string());

    if !line.starts_with(COMMIT_LABEL) {
        return Err(invalid());
    }
    let start = COMMIT_LABEL.len();
    let id = line.get(start..start + COMMIT_ID_LEN).ok_or_else(invalid)?;
    if !id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(invalid());
    }
    Ok(id)
}

/// Extract `name <email>` from an `Author: name <email>` line.
pub fn extract_author(line: &str) -> Result<&str, ParseError> {
    match line.trim().strip_prefix(AUTHOR_LABEL) {
        Some(author) if !author.is_empty() => Ok(author),
        _ => Err(ParseError::InvalidAuthor(line.to_string())),
    }
}

/// Extract the absolute instant from a `Date:   YYYY-MM-DD HH:MM:SS ±HHMM` line.
pub fn extract_date(line: &str) -> Result<DateTime<Utc>, ParseError> {
    let trimmed = line.trim();
    // without the label, the whole line goes to the parser and is rejected there
    let text = trimmed.strip_prefix(DATE_LABEL).unwrap_or(trimmed).trim_start();
    DateTime::parse_from_str(text, DATE_FORMAT)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|source| ParseError::InvalidDate {
            text: line.to_string(),
            source,
        })
}

/// Does this line look like a `--numstat` line, i.e., `<added>\t<removed>\t<path>`,
/// where the counts may be binary placeholders?
#[inline]
pub fn is_stat_line(line: &str) -> bool {
    STAT_LINE_PATTERN.is_match(line)
}

/// Is this stat line the `-\t-\t<path>` form used for binary files?
#[inline]
pub fn is_binary_placeholder(line: &str) -> bool {
    line.starts_with(BINARY_PLACEHOLDER)
}

/// Decompose a numeric stat line into a `ChangeRecord`.
pub fn parse_stat_line(line: &str) -> Result<ChangeRecord, ParseError> {
    let captures = NUMERIC_STAT_PATTERN
        .captures(line)
        .ok_or_else(|| ParseError::InvalidStatLine(line.to_string()))?;

    let count = |idx: usize| -> Result<u32, ParseError> {
        let text = &captures[idx];
        text.parse().map_err(|source| ParseError::InvalidCount {
            text: text.to_string(),
            source,
        })
    };

    Ok(ChangeRecord {
        added: count(1)?,
        removed: count(2)?,
        path: captures[3].to_string(),
    })
}
