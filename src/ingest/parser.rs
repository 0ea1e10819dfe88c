//! Access-log line parser.
//!
//! Expected line layout (whitespace-separated):
//!
//! ```text
//! DATE TIME ADDRESS - - "METHOD URL PROTOCOL" STATUS - "USER_AGENT"
//! ```
//!
//! A line is well-formed iff it splits into at least 12 tokens and the
//! timestamp and status tokens parse. Malformed lines are skipped and
//! counted, never fatal.

use crate::config::TIMESTAMP_FORMAT;
use crate::ingest::Event;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::debug;

/// Minimum token count for a well-formed line.
const MIN_TOKENS: usize = 12;

/// Parse raw log lines into events, counting malformed lines.
///
/// Output event order matches input line order; any timestamp sorting is the
/// aggregator's concern.
pub fn parse_lines<I, S>(lines: I) -> (Vec<Event>, usize)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut events = Vec::new();
    let mut malformed = 0usize;

    for line in lines {
        let line = line.as_ref();
        match parse_line(line) {
            Some(event) => events.push(event),
            None => {
                debug!(line, "ignoring malformed log entry");
                malformed += 1;
            }
        }
    }

    (events, malformed)
}

/// Read a log file from disk and parse it.
pub fn read_log_file(path: &str) -> Result<(Vec<Event>, usize)> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read log file: {}", path))?;
    Ok(parse_lines(content.lines()))
}

fn parse_line(line: &str) -> Option<Event> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < MIN_TOKENS {
        return None;
    }

    let timestamp_str = format!("{} {}", tokens[0], tokens[1]);
    let timestamp = NaiveDateTime::parse_from_str(&timestamp_str, TIMESTAMP_FORMAT).ok()?;

    let address = tokens[2].to_string();
    let method = tokens[5].strip_prefix('"').unwrap_or(tokens[5]).to_string();
    let url = tokens[6].to_string();
    let status_code: u16 = tokens[8].parse().ok()?;

    let joined = tokens[11..].join(" ");
    let unquoted = joined.strip_prefix('"').unwrap_or(&joined);
    let user_agent = unquoted.strip_suffix('"').unwrap_or(unquoted).to_string();

    Some(Event {
        timestamp,
        address,
        method,
        url,
        status_code,
        user_agent,
    })
}
