//! Application layer - use cases and orchestration.
//!
//! This layer contains the scanning, export and statistics logic on top of
//! the store interface.

pub mod catalog;
pub mod contacts_export;
pub mod coordinator;
pub mod formatter;
pub mod resolver;
pub mod scanner;
pub mod statistics;
pub mod writers;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::SessionCatalog;
pub use contacts_export::export_contacts;
pub use coordinator::ExportCoordinator;
pub use formatter::{
    format_contacts_summary, format_export_result, format_progress, format_report,
    format_sessions_table,
};
pub use resolver::ContactResolver;
pub use scanner::MessageScanner;
pub use statistics::StatisticsAggregator;
