//! Export writers, one per output format.
//!
//! A writer renders a session's ascending message list to bytes; persisting
//! goes through a temp file and rename so failed exports leave nothing behind.

mod html;
mod json;
mod spreadsheet;
mod sql;

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};

use crate::domain::{ExportFormat, Message, Result, Session, SessionKind, TimeWindow};
use crate::infrastructure::write_atomically;

use super::formatter::format_timestamp;

pub use html::HtmlWriter;
pub use json::JsonWriter;
pub use spreadsheet::{workbook_bytes, SpreadsheetWriter};
pub use sql::SqlWriter;

/// Everything a writer needs to render one session.
#[derive(Debug, Clone)]
pub struct ExportDocument<'a> {
    pub session: &'a Session,
    pub display_name: &'a str,
    /// Sorted ascending by creation time.
    pub messages: &'a [Message],
    pub window: TimeWindow,
    pub exported_at: DateTime<Utc>,
    /// Offset used to render timestamps.
    pub offset: FixedOffset,
    /// Display names of group members, keyed by sender identifier.
    pub sender_names: HashMap<String, String>,
}

impl ExportDocument<'_> {
    /// Formatted creation time of a message.
    #[must_use]
    pub fn time_of(&self, message: &Message) -> String {
        format_timestamp(message.create_time, self.offset)
    }

    /// Who sent a message, as shown in exports.
    #[must_use]
    pub fn sender_of<'m>(&'m self, message: &'m Message) -> &'m str {
        if message.is_send {
            "me"
        } else if self.session.kind == SessionKind::Group && !message.sender.is_empty() {
            self.sender_names
                .get(&message.sender)
                .map_or(message.sender.as_str(), String::as_str)
        } else {
            self.display_name
        }
    }

    /// Human-readable export period.
    #[must_use]
    pub fn period(&self) -> String {
        if self.window.is_all_time() {
            return "all time".to_string();
        }
        let bound = |t: Option<i64>| {
            t.map_or_else(|| "…".to_string(), |t| format_timestamp(t, self.offset))
        };
        format!("{} to {}", bound(self.window.start()), bound(self.window.end()))
    }

    #[must_use]
    pub const fn direction_of(message: &Message) -> &'static str {
        if message.is_send {
            "sent"
        } else {
            "received"
        }
    }
}

/// Serializer for one output format.
pub trait ExportWriter {
    fn format(&self) -> ExportFormat;

    /// Renders the document to the bytes of the output file.
    ///
    /// # Errors
    /// Returns a write error if serialization fails.
    fn render(&self, doc: &ExportDocument<'_>) -> Result<Vec<u8>>;

    /// Renders and persists atomically at `path`.
    ///
    /// # Errors
    /// Returns the render or IO error; no file is left at `path` on failure.
    fn write(&self, doc: &ExportDocument<'_>, path: &Path) -> Result<()> {
        let bytes = self.render(doc)?;
        write_atomically(path, &bytes)?;
        tracing::debug!(
            format = %self.format(),
            path = %path.display(),
            bytes = bytes.len(),
            "Export written"
        );
        Ok(())
    }
}

/// Writer for a format.
#[must_use]
pub fn writer_for(format: ExportFormat) -> Box<dyn ExportWriter> {
    match format {
        ExportFormat::Json => Box::new(JsonWriter),
        ExportFormat::Html => Box::new(HtmlWriter),
        ExportFormat::Spreadsheet => Box::new(SpreadsheetWriter),
        ExportFormat::Sql => Box::new(SqlWriter),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_writer_for_matches_format() {
        for format in [
            ExportFormat::Json,
            ExportFormat::Html,
            ExportFormat::Spreadsheet,
            ExportFormat::Sql,
        ] {
            assert_eq!(writer_for(format).format(), format);
        }
    }

    #[test]
    fn test_every_writer_handles_empty_session() {
        let dir = tempdir().unwrap();
        let session = fixtures::session();
        let doc = fixtures::document(&session, &[]);

        for format in [
            ExportFormat::Json,
            ExportFormat::Html,
            ExportFormat::Spreadsheet,
            ExportFormat::Sql,
        ] {
            let path = dir.path().join(format!("empty.{}", format.extension()));
            writer_for(format).write(&doc, &path).unwrap();
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
        }
    }

    #[test]
    fn test_sender_labels() {
        let session = fixtures::session();
        let messages = fixtures::messages();
        let doc = fixtures::document(&session, &messages);
        assert_eq!(doc.sender_of(&messages[0]), "Alice <A&B>");
        assert_eq!(doc.sender_of(&messages[1]), "me");
        assert_eq!(ExportDocument::direction_of(&messages[1]), "sent");
    }

    #[test]
    fn test_period_label() {
        let session = fixtures::session();
        let mut doc = fixtures::document(&session, &[]);
        assert_eq!(doc.period(), "all time");

        doc.window = TimeWindow::between(0, 86_399).unwrap();
        assert_eq!(doc.period(), "1970-01-01 00:00:00 to 1970-01-01 23:59:59");
    }
}
