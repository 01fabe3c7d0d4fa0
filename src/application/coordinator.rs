//! Per-session export orchestration.
//!
//! A job moves `idle → initializing → scanning/writing → completed`, or to
//! `error` on a fatal configuration problem (before any session is touched)
//! or on a scan fault under [`ScanFaultPolicy::Abort`]. Sessions are handled
//! strictly in order; a failing session is recorded and the loop continues.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{FixedOffset, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::domain::{
    AppError, ExportJob, ExportPhase, ExportProgress, ExportResult, Message, MessageStore,
    Result, ScanFaultPolicy, Session, SessionKind, SessionOutcome, StoreMode,
};

use super::resolver::ContactResolver;
use super::scanner::MessageScanner;
use super::writers::{writer_for, ExportDocument, ExportWriter};

/// Share of a session's progress slot reached when writing starts.
const WRITE_PHASE_FRACTION: f64 = 0.1;

/// Drives one export job.
pub struct ExportCoordinator<'a> {
    store: &'a dyn MessageStore,
    sessions: &'a [Session],
    resolver: &'a ContactResolver,
    scanner: MessageScanner<'a>,
    writer: Option<Rc<dyn ExportWriter + 'a>>,
    policy: ScanFaultPolicy,
    offset: FixedOffset,
    progress_tx: Option<UnboundedSender<ExportProgress>>,
    cancel: CancellationToken,
    result: ExportResult,
}

impl<'a> ExportCoordinator<'a> {
    /// Coordinator over a catalog snapshot and a contact resolver.
    #[must_use]
    pub fn new(
        store: &'a dyn MessageStore,
        sessions: &'a [Session],
        resolver: &'a ContactResolver,
        offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            sessions,
            resolver,
            scanner: MessageScanner::new(store),
            writer: None,
            policy: ScanFaultPolicy::default(),
            offset,
            progress_tx: None,
            cancel: CancellationToken::new(),
            result: ExportResult::default(),
        }
    }

    /// Scanner tuning (page size, yield interval).
    #[must_use]
    pub fn with_scanner(mut self, scanner: MessageScanner<'a>) -> Self {
        self.scanner = scanner;
        self
    }

    /// Use a specific writer instead of the one matching the job format.
    #[cfg(test)]
    #[must_use]
    pub fn with_writer(mut self, writer: Box<dyn ExportWriter + 'a>) -> Self {
        self.writer = Some(Rc::from(writer));
        self
    }

    #[must_use]
    pub const fn with_scan_fault_policy(mut self, policy: ScanFaultPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, tx: UnboundedSender<ExportProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Token representing the owning context; checked after every suspension.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.scanner = self.scanner.with_cancellation(cancel.clone());
        self.cancel = cancel;
        self
    }

    /// Current accumulator state.
    #[must_use]
    pub const fn result(&self) -> &ExportResult {
        &self.result
    }

    /// Runs the job to completion.
    ///
    /// # Errors
    /// Returns `Config` for fatal configuration problems, `Scan` when a scan
    /// fault aborts the job, and `Cancelled` when the owning context went
    /// away. In the first two cases [`Self::result`] is left in the `Error`
    /// phase with the message recorded.
    pub async fn run(&mut self, job: &ExportJob) -> Result<ExportResult> {
        self.result = ExportResult::default();
        self.emit(ExportPhase::Initializing, false, 0);

        let destination = match self.validate(job) {
            Ok(destination) => destination,
            Err(e) => return Err(self.fail(e)),
        };

        let writer: Rc<dyn ExportWriter + 'a> = self
            .writer
            .clone()
            .unwrap_or_else(|| Rc::from(writer_for(job.format)));
        let sessions = self.sessions;

        let total = job.targets.len();
        tracing::info!(
            sessions = total,
            format = %job.format,
            window = %job.window,
            destination = %destination.display(),
            "Export started"
        );

        for (index, identifier) in job.targets.iter().enumerate() {
            let display_name = self.display_name_for(identifier);
            self.result.current_label.clone_from(&display_name);
            self.emit(ExportPhase::Scanning, true, 0);

            let scanned = {
                let tx = self.progress_tx.clone();
                let label = display_name.clone();
                let fraction = self.result.progress;
                self.scanner
                    .scan_with_progress(identifier, job.window, |count| {
                        if let Some(tx) = &tx {
                            let _ = tx.send(ExportProgress {
                                phase: ExportPhase::Scanning,
                                session_label: label.clone(),
                                fraction,
                                indeterminate: true,
                                processed: count,
                            });
                        }
                    })
                    .await
            };
            self.ensure_live()?;

            let mut messages = match scanned {
                Ok(messages) => messages,
                Err(AppError::Cancelled) => return Err(AppError::Cancelled),
                Err(e) => {
                    let fault = AppError::scan(identifier.as_str(), &e);
                    match self.policy {
                        ScanFaultPolicy::Abort => return Err(self.fail(fault)),
                        ScanFaultPolicy::Isolate => {
                            tracing::warn!("{}", fault);
                            self.record_failure(identifier, display_name, fault.to_string());
                            self.complete_session(index, total);
                            continue;
                        }
                    }
                }
            };

            let Some(session) = sessions.iter().find(|s| s.identifier == *identifier) else {
                tracing::warn!(session = %identifier, "No session metadata, skipping");
                self.record_failure(identifier, display_name, "session not found".to_string());
                self.complete_session(index, total);
                continue;
            };

            messages.sort_by_key(|m| m.create_time);

            self.advance(slot_fraction(index, total, WRITE_PHASE_FRACTION));
            self.emit(ExportPhase::Writing, false, self.result.total_messages);

            let path = destination_path(&destination, &display_name, writer.format().extension());
            let written = {
                let doc = ExportDocument {
                    session,
                    display_name: &display_name,
                    messages: &messages,
                    window: job.window,
                    exported_at: Utc::now(),
                    offset: self.offset,
                    sender_names: sender_names(session, &messages, self.resolver),
                };
                writer.write(&doc, &path)
            };

            tokio::task::yield_now().await;
            self.ensure_live()?;

            match written {
                Ok(()) => {
                    self.result.success_count += 1;
                    self.result.total_messages += messages.len();
                    self.result.outcomes.push(SessionOutcome {
                        identifier: identifier.clone(),
                        display_name,
                        message_count: messages.len(),
                        path: Some(path),
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(session = %identifier, "Export failed: {}", e);
                    self.record_failure(identifier, display_name, e.to_string());
                }
            }

            self.complete_session(index, total);
        }

        self.result.progress = 1.0;
        self.result.current_label.clear();
        self.emit(ExportPhase::Completed, false, self.result.total_messages);

        tracing::info!(
            succeeded = self.result.success_count,
            failed = self.result.failed_count,
            messages = self.result.total_messages,
            "Export completed"
        );

        Ok(self.result.clone())
    }

    /// Fatal checks performed before any session is touched.
    fn validate(&self, job: &ExportJob) -> Result<PathBuf> {
        if self.store.mode() == StoreMode::Preview {
            return Err(AppError::config(
                "The store is in preview mode; export is not available",
            ));
        }
        let destination = job
            .destination
            .clone()
            .ok_or_else(|| AppError::config("No destination directory selected"))?;
        if job.targets.is_empty() {
            return Err(AppError::config("No sessions selected for export"));
        }

        std::fs::create_dir_all(&destination).map_err(|e| {
            AppError::config(format!(
                "Cannot use destination {}: {e}",
                destination.display()
            ))
        })?;

        Ok(destination)
    }

    /// Snapshot name, then contact record name, then raw identifier.
    fn display_name_for(&self, identifier: &str) -> String {
        self.sessions
            .iter()
            .find(|s| s.identifier == identifier)
            .and_then(Session::known_name)
            .map_or_else(|| self.resolver.resolve(identifier), str::to_string)
    }

    fn record_failure(&mut self, identifier: &str, display_name: String, error: String) {
        self.result.failed_count += 1;
        self.result.outcomes.push(SessionOutcome {
            identifier: identifier.to_string(),
            display_name,
            message_count: 0,
            path: None,
            error: Some(error),
        });
    }

    fn complete_session(&mut self, index: usize, total: usize) {
        self.advance(slot_fraction(index, total, 1.0));
        self.emit(self.result.phase, false, self.result.total_messages);
    }

    fn advance(&mut self, fraction: f64) {
        self.result.progress = self.result.progress.max(fraction.clamp(0.0, 1.0));
    }

    /// Moves to the error state and hands the error back.
    fn fail(&mut self, error: AppError) -> AppError {
        tracing::error!("Export aborted: {}", error);
        self.result.error = Some(error.to_string());
        self.emit(ExportPhase::Error, false, self.result.total_messages);
        error
    }

    fn ensure_live(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            tracing::info!("Export context gone, abandoning job");
            return Err(AppError::Cancelled);
        }
        Ok(())
    }

    fn emit(&mut self, phase: ExportPhase, indeterminate: bool, processed: usize) {
        self.result.phase = phase;
        if let Some(tx) = &self.progress_tx {
            let _ = tx.send(ExportProgress {
                phase,
                session_label: self.result.current_label.clone(),
                fraction: self.result.progress,
                indeterminate,
                processed,
            });
        }
    }
}

/// Overall progress after `within` of session `index`'s slot.
#[allow(
    clippy::cast_precision_loss,
    reason = "session counts stay far below 2^52"
)]
fn slot_fraction(index: usize, total: usize, within: f64) -> f64 {
    (index as f64 + within) / total as f64
}

/// Resolved names for the members who spoke in a group session.
fn sender_names(
    session: &Session,
    messages: &[Message],
    resolver: &ContactResolver,
) -> HashMap<String, String> {
    if session.kind != SessionKind::Group {
        return HashMap::new();
    }

    let mut names = HashMap::new();
    for message in messages {
        if !message.is_send && !message.sender.is_empty() && !names.contains_key(&message.sender) {
            names.insert(message.sender.clone(), resolver.resolve(&message.sender));
        }
    }
    names
}

/// Replaces characters that are invalid in file names.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}

/// `<dir>/<sanitized name>_<epoch millis>.<ext>`, bumping the stamp while taken.
fn destination_path(dir: &Path, display_name: &str, extension: &str) -> PathBuf {
    let stem = sanitize_file_name(display_name);
    let mut millis = Utc::now().timestamp_millis();
    loop {
        let path = dir.join(format!("{stem}_{millis}.{extension}"));
        if !path.exists() {
            return path;
        }
        millis += 1;
    }
}
