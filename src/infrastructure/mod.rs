//! Infrastructure layer - external adapters (database, filesystem).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod atomic_file;
pub mod config;
pub mod sqlite_store;

pub use atomic_file::write_atomically;
pub use config::{ensure_config_exists, load_config, render_config};
pub use sqlite_store::SqliteMessageStore;
