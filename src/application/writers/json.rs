use serde::Serialize;

use crate::domain::{AppError, ExportFormat, Result, SessionKind, TimeWindow};

use super::{ExportDocument, ExportWriter};

/// Pretty-printed JSON document.
pub struct JsonWriter;

#[derive(Serialize)]
struct JsonExport<'a> {
    session: JsonSession<'a>,
    exported_at: String,
    window: TimeWindow,
    message_count: usize,
    messages: Vec<JsonMessage<'a>>,
}

#[derive(Serialize)]
struct JsonSession<'a> {
    identifier: &'a str,
    display_name: &'a str,
    kind: SessionKind,
}

#[derive(Serialize)]
struct JsonMessage<'a> {
    create_time: i64,
    time: String,
    kind: &'static str,
    sender: &'a str,
    is_send: bool,
    content: &'a str,
}

impl ExportWriter for JsonWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn render(&self, doc: &ExportDocument<'_>) -> Result<Vec<u8>> {
        let export = JsonExport {
            session: JsonSession {
                identifier: &doc.session.identifier,
                display_name: doc.display_name,
                kind: doc.session.kind,
            },
            exported_at: doc.exported_at.to_rfc3339(),
            window: doc.window,
            message_count: doc.messages.len(),
            messages: doc
                .messages
                .iter()
                .map(|m| JsonMessage {
                    create_time: m.create_time,
                    time: doc.time_of(m),
                    kind: m.kind.label(),
                    sender: doc.sender_of(m),
                    is_send: m.is_send,
                    content: m.display_text(),
                })
                .collect(),
        };

        serde_json::to_vec_pretty(&export).map_err(AppError::json)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;

    #[test]
    fn test_json_document_shape() {
        let session = fixtures::session();
        let messages = fixtures::messages();
        let doc = fixtures::document(&session, &messages);

        let bytes = JsonWriter.render(&doc).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["session"]["identifier"], "alice");
        assert_eq!(value["session"]["kind"], "private");
        assert_eq!(value["message_count"], 3);
        assert_eq!(value["messages"][0]["time"], "1970-01-01 00:01:40");
        assert_eq!(value["messages"][1]["sender"], "me");
        assert_eq!(value["messages"][2]["content"], "[Image]");
        assert_eq!(value["messages"][2]["kind"], "image");
    }
}
