//! Configuration file management.
//!
//! Handles loading and saving the TOML configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# Chat Archive Configuration
# Auto-generated - edit as needed

[store]
# Archive database (optional, defaults to ~/.chat-archive/archive.db)
# database = "/path/to/archive.db"

[export]
# Messages read per page while scanning a session
page_size = 5000

# Pages read between cooperative yields
yield_every_pages = 2

# Default output format: json, html, xlsx, sql
format = "json"

# What to do when a session cannot be read: "isolate" (skip it) or "abort"
scan_fault_policy = "isolate"

# Default destination directory (optional)
# output_dir = "/path/to/exports"

[report]
# Your own identifier, used for the "me" side of relationship reports
# my_identifier = "wxid_example"

# Offset from UTC in minutes for year boundaries (defaults to local time)
# utc_offset_minutes = 480

[paths]
# Custom data directory (optional, defaults to ~/.chat-archive)
# data_dir = "/custom/path"
"#;

/// Load configuration from file or fall back to defaults.
///
/// # Errors
/// Returns error if file exists but cannot be read or parsed.
pub fn load_config() -> Result<AppConfig> {
    let config_path = config_file_path();

    if config_path.exists() {
        load_config_from_file(&config_path)
    } else {
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

/// Render the effective configuration as TOML.
///
/// # Errors
/// Returns error if serialization fails.
pub fn render_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| AppError::Config {
        message: format!("Failed to serialize config: {e}"),
    })
}

/// Create default configuration file if it doesn't exist.
///
/// Returns the path of the configuration file.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists() -> Result<PathBuf> {
    let config_path = config_file_path();

    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create config directory", e))?;
        }

        fs::write(&config_path, DEFAULT_CONFIG)
            .map_err(|e| AppError::io("Failed to create default config", e))?;

        tracing::info!(path = %config_path.display(), "Created default configuration");
    }

    Ok(config_path)
}

/// Get the path to the configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    AppConfig::default_data_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExportFormat, ScanFaultPolicy};
    use tempfile::tempdir;

    #[test]
    fn test_default_config_parses() {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.export.page_size, 5000);
        assert_eq!(config.export.yield_every_pages, 2);
        assert_eq!(config.export.format, ExportFormat::Json);
        assert_eq!(config.export.scan_fault_policy, ScanFaultPolicy::Isolate);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("[export]\nscan_fault_policy = \"abort\"\n").unwrap();
        assert_eq!(config.export.scan_fault_policy, ScanFaultPolicy::Abort);
        assert_eq!(config.export.page_size, 5000);
    }

    #[test]
    fn test_render_and_load() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.export.format = ExportFormat::Html;
        config.report.utc_offset_minutes = Some(-300);

        fs::write(&config_path, render_config(&config).unwrap()).unwrap();
        let loaded = load_config_from_file(&config_path).unwrap();

        assert_eq!(loaded.export.format, ExportFormat::Html);
        assert_eq!(loaded.report.utc_offset_minutes, Some(-300));
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[export]\npage_size = \"many\"\n").unwrap();

        assert!(matches!(
            load_config_from_file(&config_path),
            Err(AppError::Config { .. })
        ));
    }
}
