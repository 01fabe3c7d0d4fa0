//! Domain layer - core types and errors.
//!
//! This layer contains pure domain models and error types
//! without any external dependencies (DB, IO, etc.).

pub mod config;
pub mod error;
pub mod job;
pub mod models;
pub mod report;
pub mod store;

pub use config::{AppConfig, ScanFaultPolicy};
pub use error::{AppError, Result};
pub use job::{
    ExportFormat, ExportJob, ExportPhase, ExportProgress, ExportResult, SessionOutcome,
    TimeWindow,
};
pub use models::{
    ContactRecord, ContactSource, Message, MessageKind, RecordOrigin, Session, SessionKind,
};
pub use report::{ChatRecord, DualReportData, YearFirstChat, YearlyStats};
pub use store::{MessageStore, StoreMode};
