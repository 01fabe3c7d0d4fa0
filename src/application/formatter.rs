//! Console output for sessions, jobs and reports.

use chrono::{DateTime, FixedOffset};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{DualReportData, ExportPhase, ExportProgress, ExportResult, Session};

use super::contacts_export::ContactExportSummary;

/// Renders epoch seconds as `%Y-%m-%d %H:%M:%S` in `offset`.
#[must_use]
pub fn format_timestamp(epoch_seconds: i64, offset: FixedOffset) -> String {
    DateTime::from_timestamp(epoch_seconds, 0).map_or_else(
        || epoch_seconds.to_string(),
        |dt| {
            dt.with_timezone(&offset)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        },
    )
}

/// Formats a table listing of sessions.
pub fn format_sessions_table(sessions: &[Session]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Identifier", "Kind", "Name"]);

    for (i, session) in sessions.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            truncate(&session.identifier, 32),
            session.kind.to_string(),
            truncate(session.known_name().unwrap_or("-"), 35),
        ]);
    }

    table.to_string()
}

/// One console line for a progress update.
pub fn format_progress(progress: &ExportProgress) -> String {
    let percent = format!("{:>5.1}%", progress.fraction * 100.0);
    match progress.phase {
        ExportPhase::Scanning => format!(
            "{} {} {} ({} messages)",
            percent.dimmed(),
            "scanning".yellow(),
            progress.session_label.cyan(),
            progress.processed
        ),
        ExportPhase::Writing => format!(
            "{} {} {}",
            percent.dimmed(),
            "writing".blue(),
            progress.session_label.cyan()
        ),
        ExportPhase::Completed => format!("{} {}", percent.green(), "completed".green().bold()),
        ExportPhase::Error => format!("{} {}", percent.red(), "error".red().bold()),
        ExportPhase::Idle | ExportPhase::Initializing => {
            format!("{} {}", percent.dimmed(), progress.phase)
        }
    }
}

/// Formats the terminal job summary with per-session outcomes.
pub fn format_export_result(result: &ExportResult) -> String {
    let mut out = String::new();

    for outcome in &result.outcomes {
        if outcome.succeeded() {
            let path = outcome
                .path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            out.push_str(&format!(
                "{} {} ({} msgs) → {}\n",
                "✓".green(),
                outcome.display_name.cyan(),
                outcome.message_count,
                path
            ));
        } else {
            out.push_str(&format!(
                "{} {} - {}\n",
                "✗".red(),
                outcome.display_name.cyan(),
                outcome.error.as_deref().unwrap_or("failed")
            ));
        }
    }

    let summary = result.summary();
    out.push_str(&format!(
        "\n{}\n  Succeeded: {}\n  Failed: {}\n  Messages exported: {}",
        "📊 Export summary".bold(),
        summary.success_count.to_string().green(),
        summary.failed_count.to_string().red(),
        summary.total_messages_processed.to_string().cyan()
    ));

    if let Some(error) = &result.error {
        out.push_str(&format!("\n  {} {}", "Error:".red().bold(), error));
    }

    out
}

/// Formats the contacts export summary.
pub fn format_contacts_summary(summary: &ContactExportSummary) -> String {
    format!(
        "{} Exported {} friends to {}\n  Strangers excluded: {}\n  Chat room members excluded: {}",
        "✓".green().bold(),
        summary.friends.to_string().cyan(),
        summary.path.display(),
        summary.strangers_excluded,
        summary.chatroom_excluded
    )
}

/// Formats a relationship report for display.
pub fn format_report(report: &DualReportData) -> String {
    let mut out = format!(
        "{} {} & {}\n\n",
        "💬".bold(),
        report.my_name.green().bold(),
        report.friend_name.cyan().bold()
    );

    match &report.first_chat {
        Some(first) => out.push_str(&format!(
            "First chat: {} by {}\n  {}\n",
            first.time,
            speaker(first.is_send, report),
            truncate(&first.content, 60)
        )),
        None => out.push_str("First chat: -\n"),
    }

    match &report.year_first_chat {
        Some(year_first) => {
            out.push_str(&format!(
                "First chat of {}: {}\n",
                report.year, year_first.first.time
            ));
            for record in &year_first.opening {
                out.push_str(&format!(
                    "  [{}] {}: {}\n",
                    record.time,
                    speaker(record.is_send, report),
                    truncate(&record.content, 50)
                ));
            }
        }
        None => out.push_str(&format!("First chat of {}: -\n", report.year)),
    }

    let stats = &report.yearly_stats;
    out.push_str(&format!(
        "\n{}\n  Messages: {}\n  Words: {}\n  Images: {}\n  Voice: {}\n  Stickers: {}",
        format!("📊 {}", report.year).bold(),
        stats.total_messages.to_string().cyan(),
        stats.total_words.to_string().cyan(),
        stats.image_count,
        stats.voice_count,
        stats.emoji_count
    ));

    out
}

fn speaker(is_send: bool, report: &DualReportData) -> &str {
    if is_send {
        &report.my_name
    } else {
        &report.friend_name
    }
}

/// Truncates a string to max chars with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
