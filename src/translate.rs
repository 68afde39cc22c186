//! Translation of one complete commit block into a `CommitRecord`.
//!
//! A block looks like this, where both the message and the stats sections are optional:
//!
//! ```text
//! commit <40-hex-id>
//! Author: <name> <<email>>
//! Date:   <YYYY-MM-DD HH:MM:SS> <±HHMM>
//!
//!     <message line>*
//!
//! <added>\t<removed>\t<path>*
//! ```

use crate::commit::{ChangeRecord, CommitHeaders, CommitRecord};
use crate::error::ParseError;
use crate::log_line;

/// Separator used when joining the lines of a commit message.
pub const COMMENT_LINE_TERMINATOR: &str = "\r\n";

const NUM_HEADER_LINES: usize = 3;

/// Index of the first line that may belong to the message (after the headers and the blank
/// line git writes below them).
const COMMENT_START: usize = NUM_HEADER_LINES + 1;

/// Translate the lines of one commit block, with its trailing blank line already removed.
pub fn translate_block<S: AsRef<str>>(lines: &[S]) -> Result<CommitRecord, ParseError> {
    if lines.len() < NUM_HEADER_LINES {
        return Err(ParseError::MissingHeaders(lines.len()));
    }
    let headers = parse_headers(&lines[..NUM_HEADER_LINES])?;

    // headers and the separating blank line only
    if lines.len() == COMMENT_START {
        return Ok(CommitRecord {
            headers,
            comment: String::new(),
            changes: Vec::new(),
        });
    }

    let mut changes = Vec::new();
    let mut comment_end = lines.len();
    if lines.last().map_or(false, |l| log_line::is_stat_line(l.as_ref())) {
        let blank = last_blank_line(lines).ok_or(ParseError::InvalidCommitFormat)?;
        changes = parse_changes(&lines[blank + 1..])?;
        comment_end = blank;
    }

    let comment = match lines.get(COMMENT_START..comment_end) {
        Some(comment_lines) => join_comment(comment_lines),
        None => String::new(),
    };

    Ok(CommitRecord {
        headers,
        comment,
        changes,
    })
}

fn parse_headers<S: AsRef<str>>(lines: &[S]) -> Result<CommitHeaders, ParseError> {
    let id = log_line::extract_id(lines[0].as_ref())?;
    let author = log_line::extract_author(lines[1].as_ref())?;
    let date = log_line::extract_date(lines[2].as_ref())?;
    Ok(CommitHeaders {
        id: id.to_string(),
        author: author.to_string(),
        date,
    })
}

/// Parse a stats section. Binary placeholder lines are skipped.
fn parse_changes<S: AsRef<str>>(lines: &[S]) -> Result<Vec<ChangeRecord>, ParseError> {
    lines
        .iter()
        .map(|line| line.as_ref())
        .filter(|line| !log_line::is_binary_placeholder(line))
        .map(log_line::parse_stat_line)
        .collect()
}

fn join_comment<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(|line| line.as_ref())
        .filter(|line| !line.is_empty())
        .map(|line| line.trim_start_matches(' '))
        .collect::<Vec<_>>()
        .join(COMMENT_LINE_TERMINATOR)
}

/// Find the index of the last empty line, scanning from the end.
pub fn last_blank_line<S: AsRef<str>>(lines: &[S]) -> Option<usize> {
    lines.iter().rposition(|line| line.as_ref().is_empty())
}
