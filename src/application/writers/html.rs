use std::fmt::Write as _;

use crate::domain::{ExportFormat, Result};

use super::{ExportDocument, ExportWriter};

/// Standalone chat page with inline styles.
pub struct HtmlWriter;

const STYLE: &str = "body{font-family:-apple-system,'Segoe UI',sans-serif;background:#ededed;margin:0}\
header{background:#2e2e2e;color:#fff;padding:16px 24px}\
header p{margin:4px 0 0;color:#bbb;font-size:13px}\
main{max-width:820px;margin:0 auto;padding:16px}\
.msg{display:flex;flex-direction:column;margin:10px 0}\
.msg.sent{align-items:flex-end}\
.meta{font-size:12px;color:#888;margin-bottom:4px}\
.bubble{max-width:70%;padding:8px 12px;border-radius:6px;background:#fff;white-space:pre-wrap;word-break:break-word}\
.sent .bubble{background:#95ec69}\
.media .bubble{color:#576b95;font-style:italic}\
.empty{text-align:center;color:#888}";

impl ExportWriter for HtmlWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Html
    }

    fn render(&self, doc: &ExportDocument<'_>) -> Result<Vec<u8>> {
        let title = escape(doc.display_name);
        let mut out = String::with_capacity(1024 + doc.messages.len() * 160);

        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
             <header><h1>{title}</h1><p>{} · {} · {} messages · exported {}</p></header>\n<main>",
            escape(&doc.session.identifier),
            escape(&doc.period()),
            doc.messages.len(),
            doc.exported_at.format("%Y-%m-%d %H:%M:%S UTC"),
        );

        if doc.messages.is_empty() {
            out.push_str("<p class=\"empty\">No messages in this period.</p>\n");
        }

        for message in doc.messages {
            let mut classes = vec!["msg", ExportDocument::direction_of(message)];
            if message.content.trim().is_empty() {
                classes.push("media");
            }
            let _ = writeln!(
                out,
                "<div class=\"{}\"><div class=\"meta\">{} · {}</div><div class=\"bubble\">{}</div></div>",
                classes.join(" "),
                escape(doc.sender_of(message)),
                doc.time_of(message),
                escape(message.display_text()),
            );
        }

        out.push_str("</main>\n</body>\n</html>\n");
        Ok(out.into_bytes())
    }
}

/// Escapes text for HTML element and attribute content.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
