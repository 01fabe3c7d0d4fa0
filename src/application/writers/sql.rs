use std::fmt::Write as _;

use crate::domain::{ExportFormat, Result};

use super::{ExportDocument, ExportWriter};

/// Plain SQL dump loadable into `SQLite` or any similar database.
pub struct SqlWriter;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY,
    session_id TEXT NOT NULL,
    session_name TEXT NOT NULL,
    create_time INTEGER NOT NULL,
    time TEXT NOT NULL,
    kind TEXT NOT NULL,
    sender TEXT NOT NULL,
    is_send INTEGER NOT NULL,
    content TEXT NOT NULL
);
";

impl ExportWriter for SqlWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Sql
    }

    fn render(&self, doc: &ExportDocument<'_>) -> Result<Vec<u8>> {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "-- Chat export: {} ({})\n-- Exported at: {}\n-- Messages: {}\n",
            single_line(doc.display_name),
            single_line(&doc.session.identifier),
            doc.exported_at.to_rfc3339(),
            doc.messages.len()
        );
        out.push_str(CREATE_TABLE);
        out.push('\n');

        if !doc.messages.is_empty() {
            out.push_str("BEGIN TRANSACTION;\n");
        }

        let session_id = quote(&doc.session.identifier);
        let session_name = quote(doc.display_name);
        for (i, message) in doc.messages.iter().enumerate() {
            let _ = writeln!(
                out,
                "INSERT INTO messages (id, session_id, session_name, create_time, time, kind, sender, is_send, content) \
                 VALUES ({}, {session_id}, {session_name}, {}, {}, {}, {}, {}, {});",
                i + 1,
                message.create_time,
                quote(&doc.time_of(message)),
                quote(message.kind.label()),
                quote(doc.sender_of(message)),
                i32::from(message.is_send),
                quote(message.display_text()),
            );
        }

        if !doc.messages.is_empty() {
            out.push_str("COMMIT;\n");
        }

        Ok(out.into_bytes())
    }
}

/// SQL string literal with single quotes doubled.
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Keeps header comments on one line.
fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
