//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Chat Archive - export archived chat sessions and relationship reports.
#[derive(Parser, Debug)]
#[command(name = "chat-archive")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Archive database to read (overrides the configuration).
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List exportable sessions.
    Sessions {
        /// Maximum number of sessions to show (0 = all).
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Export sessions, one file per session.
    Export {
        /// Output format: json, html, xlsx, or sql (configured default if omitted).
        #[arg(short, long)]
        format: Option<String>,

        /// Session identifier to export (repeatable).
        #[arg(short, long = "session", required_unless_present = "all")]
        sessions: Vec<String>,

        /// Export every session in the catalog.
        #[arg(long, conflicts_with = "sessions")]
        all: bool,

        /// First day to include (YYYY-MM-DD).
        #[arg(long, requires = "end", conflicts_with = "all_time")]
        start: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD).
        #[arg(long, requires = "start", conflicts_with = "all_time")]
        end: Option<NaiveDate>,

        /// Export the whole history (default when no dates are given).
        #[arg(long)]
        all_time: bool,

        /// Destination directory.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Export the friend list to a spreadsheet.
    Contacts {
        /// Destination directory.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Relationship report between you and one contact.
    Report {
        /// Contact identifier.
        friend: String,

        /// Your own identifier (configured default if omitted).
        #[arg(long)]
        me: Option<String>,

        /// Year for the yearly figures (current year if omitted).
        #[arg(short, long)]
        year: Option<i32>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Manage the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigAction {
    /// Write a default configuration file if none exists.
    Init,
    /// Print the effective configuration.
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_args() {
        let cli = Cli::try_parse_from([
            "chat-archive",
            "export",
            "-s",
            "alice",
            "-s",
            "bob",
            "--start",
            "2024-01-01",
            "--end",
            "2024-06-30",
            "-f",
            "html",
        ])
        .unwrap();

        match cli.command {
            Commands::Export {
                sessions,
                start,
                end,
                format,
                ..
            } => {
                assert_eq!(sessions, vec!["alice", "bob"]);
                assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1));
                assert_eq!(end, NaiveDate::from_ymd_opt(2024, 6, 30));
                assert_eq!(format.as_deref(), Some("html"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_export_requires_both_bounds() {
        assert!(Cli::try_parse_from(["chat-archive", "export", "--all", "--start", "2024-01-01"])
            .is_err());
    }

    #[test]
    fn test_export_requires_targets() {
        assert!(Cli::try_parse_from(["chat-archive", "export"]).is_err());
        assert!(Cli::try_parse_from(["chat-archive", "export", "--all"]).is_ok());
    }
}
