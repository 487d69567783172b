//! A single playbook entry: one distilled lesson and when it was recorded.

use jiff::{Zoned, civil::DateTime};
use serde::Serialize;

/// Wall-clock format used in entry headings, second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An immutable lesson, rendered into the playbook as a heading plus one bullet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Local wall-clock time the lesson was recorded.
    pub recorded_at: DateTime,
    /// The lesson text, stored verbatim.
    pub insight: String,
}

impl Entry {
    /// Creates an entry stamped with the current local time.
    pub fn new(insight: impl Into<String>) -> Self {
        Self::at(Zoned::now().datetime(), insight)
    }

    /// Creates an entry with an explicit timestamp.
    pub fn at(recorded_at: DateTime, insight: impl Into<String>) -> Self {
        Self {
            recorded_at,
            insight: insight.into(),
        }
    }

    /// The heading timestamp: `YYYY-MM-DD HH:MM:SS`.
    pub fn timestamp(&self) -> String {
        self.recorded_at.strftime(TIMESTAMP_FORMAT).to_string()
    }

    /// The block appended to the backing file.
    ///
    /// ```text
    /// \n## Entry [2026-03-14 09:26:53]\n- <insight>\n
    /// ```
    pub fn render(&self) -> String {
        format!("\n## Entry [{}]\n- {}\n", self.timestamp(), self.insight)
    }
}
