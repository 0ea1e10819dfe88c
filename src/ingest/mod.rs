//! Log ingestion -- raw access-log lines to structured events.

pub mod parser;

pub use self::parser::{parse_lines, read_log_file};

use chrono::NaiveDateTime;

/// One logged request, parsed from a single well-formed access-log line.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub timestamp: NaiveDateTime,
    pub address: String,
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub user_agent: String,
}
