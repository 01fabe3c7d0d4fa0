//! Export job description, progress reporting and result accounting.

use std::path::PathBuf;

use chrono::{FixedOffset, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use super::error::{AppError, Result};

/// Inclusive `[start, end]` range in epoch seconds.
///
/// Either both bounds are unset (all-time) or both are set with
/// `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimeWindow {
    start: Option<i64>,
    end: Option<i64>,
}

impl TimeWindow {
    /// Unbounded window.
    #[must_use]
    pub const fn all_time() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Bounded window.
    ///
    /// # Errors
    /// Returns a configuration error if `start > end`.
    pub fn between(start: i64, end: i64) -> Result<Self> {
        if start > end {
            return Err(AppError::config(format!(
                "Window start ({start}) is after window end ({end})"
            )));
        }
        Ok(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    /// Whole calendar year `[Jan 1 00:00:00, Dec 31 23:59:59]` in `offset`.
    ///
    /// # Errors
    /// Returns a configuration error for years chrono cannot represent.
    pub fn year(year: i32, offset: FixedOffset) -> Result<Self> {
        let bound = |month, day, h, m, s| {
            offset
                .with_ymd_and_hms(year, month, day, h, m, s)
                .single()
                .map(|dt| dt.timestamp())
                .ok_or_else(|| AppError::config(format!("Year out of range: {year}")))
        };
        Self::between(bound(1, 1, 0, 0, 0)?, bound(12, 31, 23, 59, 59)?)
    }

    /// Window spanning whole days from `start` to `end` inclusive.
    ///
    /// # Errors
    /// Returns a configuration error if the dates are out of order.
    pub fn days(start: NaiveDate, end: NaiveDate, offset: FixedOffset) -> Result<Self> {
        let to_epoch = |date: NaiveDate, h, m, s| {
            date.and_hms_opt(h, m, s)
                .and_then(|naive| offset.from_local_datetime(&naive).single())
                .map(|dt| dt.timestamp())
                .ok_or_else(|| AppError::config(format!("Invalid date: {date}")))
        };
        Self::between(to_epoch(start, 0, 0, 0)?, to_epoch(end, 23, 59, 59)?)
    }

    #[must_use]
    pub const fn start(&self) -> Option<i64> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> Option<i64> {
        self.end
    }

    #[must_use]
    pub const fn is_all_time(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether `t` lies inside the window (unset bounds are open).
    #[must_use]
    pub fn contains(&self, t: i64) -> bool {
        self.start.is_none_or(|s| s <= t) && self.end.is_none_or(|e| t <= e)
    }

    /// Whether `t` lies before the window start.
    #[must_use]
    pub fn is_before_start(&self, t: i64) -> bool {
        self.start.is_some_and(|s| t < s)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.start, self.end) {
            (None, None) => write!(f, "all time"),
            (start, end) => write!(
                f,
                "[{}, {}]",
                start.map_or_else(|| "-".to_string(), |s| s.to_string()),
                end.map_or_else(|| "-".to_string(), |e| e.to_string())
            ),
        }
    }
}

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Html,
    /// Excel workbook.
    Spreadsheet,
    /// SQL text dump.
    Sql,
}

impl ExportFormat {
    /// File extension for the format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Html => "html",
            Self::Spreadsheet => "xlsx",
            Self::Sql => "sql",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "html" | "htm" => Ok(Self::Html),
            "xlsx" | "excel" | "spreadsheet" => Ok(Self::Spreadsheet),
            "sql" => Ok(Self::Sql),
            _ => Err(format!("Unknown format: {s}. Use: json, html, xlsx, sql")),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// A request to export a set of sessions.
#[derive(Debug, Clone, Default)]
pub struct ExportJob {
    /// Target session identifiers in export order. Deduplicated by the caller.
    pub targets: Vec<String>,
    pub format: ExportFormat,
    pub window: TimeWindow,
    /// Destination directory; unset is a configuration error.
    pub destination: Option<PathBuf>,
}

/// Phase of an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportPhase {
    #[default]
    Idle,
    Initializing,
    Scanning,
    Writing,
    Completed,
    Error,
}

impl std::fmt::Display for ExportPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Scanning => "scanning",
            Self::Writing => "writing",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// One update on the live progress stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportProgress {
    pub phase: ExportPhase,
    /// Label of the session being processed (empty outside the loop).
    pub session_label: String,
    /// Overall fraction in `[0, 1]`, never decreasing within a job.
    pub fraction: f64,
    /// Set while the current step cannot estimate its own progress.
    pub indeterminate: bool,
    /// Messages scanned in the current session, or written so far in the job.
    pub processed: usize,
}

/// Outcome of one session in a job.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub identifier: String,
    pub display_name: String,
    pub message_count: usize,
    /// Written file, when the export succeeded.
    pub path: Option<PathBuf>,
    /// Failure description, when it did not.
    pub error: Option<String>,
}

impl SessionOutcome {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.path.is_some()
    }
}

/// Running accumulator for a job.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportResult {
    pub success_count: usize,
    pub failed_count: usize,
    /// Messages contained in successfully written files.
    pub total_messages: usize,
    pub phase: ExportPhase,
    pub current_label: String,
    pub progress: f64,
    /// Job-level error message, set in the `Error` phase.
    pub error: Option<String>,
    pub outcomes: Vec<SessionOutcome>,
}

impl ExportResult {
    /// Terminal summary of the job.
    #[must_use]
    pub const fn summary(&self) -> ExportSummary {
        ExportSummary {
            success_count: self.success_count,
            failed_count: self.failed_count,
            total_messages_processed: self.total_messages,
        }
    }
}

/// Terminal counts reported at the end of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ExportSummary {
    pub success_count: usize,
    pub failed_count: usize,
    pub total_messages_processed: usize,
}
