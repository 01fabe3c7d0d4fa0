//! Application configuration model.
//!
//! Every field has a serde default so partial config files stay valid.

use std::path::PathBuf;

use chrono::{FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};

use super::job::ExportFormat;

/// Location of the archive database.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Path to the archive database (defaults to `<data_dir>/archive.db`).
    #[serde(default)]
    pub database: Option<PathBuf>,
}

/// What to do when reading one session's history fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanFaultPolicy {
    /// Record a failure for the session and move on.
    #[default]
    Isolate,
    /// Stop the whole job in the error state.
    Abort,
}

/// Export tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Messages requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Pages read between cooperative yields.
    #[serde(default = "default_yield_every")]
    pub yield_every_pages: usize,

    /// Default destination directory.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default)]
    pub scan_fault_policy: ScanFaultPolicy,

    #[serde(default)]
    pub format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            yield_every_pages: default_yield_every(),
            output_dir: None,
            scan_fault_policy: ScanFaultPolicy::default(),
            format: ExportFormat::default(),
        }
    }
}

const fn default_page_size() -> usize {
    5000
}

const fn default_yield_every() -> usize {
    2
}

/// Relationship report settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReportConfig {
    /// Identifier of the local user.
    #[serde(default)]
    pub my_identifier: Option<String>,

    /// UTC offset for year boundaries and timestamps (local offset if unset).
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl ReportConfig {
    /// Effective offset used for calendar computations.
    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .and_then(|minutes| minutes.checked_mul(60))
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Local::now().offset().fix())
    }
}

/// Path configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    /// Base data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

impl AppConfig {
    /// Get the data directory, using default if not configured.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.paths
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".chat-archive")
    }

    /// Get the archive database path.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.store
            .database
            .clone()
            .unwrap_or_else(|| self.data_dir().join("archive.db"))
    }

    /// Get the default exports directory path.
    #[must_use]
    pub fn exports_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("exports"))
    }
}
