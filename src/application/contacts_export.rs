//! Friends-only contact list export.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::domain::{AppError, ContactSource, MessageStore, Result};
use crate::infrastructure::write_atomically;

use super::writers::workbook_bytes;

const HEADERS: [&str; 5] = ["Identifier", "Remark", "Nickname", "Alias", "Display name"];
const WIDTHS: [f64; 5] = [28.0, 20.0, 24.0, 18.0, 24.0];

/// What the contacts export included and left out.
#[derive(Debug, Clone, Serialize)]
pub struct ContactExportSummary {
    pub friends: usize,
    pub strangers_excluded: usize,
    pub chatroom_excluded: usize,
    pub path: PathBuf,
}

/// Writes every friend record to `contacts_<millis>.xlsx` in `dir`.
///
/// Strangers and chat room members are counted but left out of the file.
///
/// # Errors
/// Returns error if contacts cannot be listed or the file cannot be written.
pub fn export_contacts(store: &dyn MessageStore, dir: &Path) -> Result<ContactExportSummary> {
    let contacts = store.list_contacts(true, true)?;

    let mut strangers_excluded = 0;
    let mut chatroom_excluded = 0;
    let mut friends = Vec::new();
    for record in contacts {
        match record.source {
            ContactSource::Friend => friends.push(record),
            ContactSource::Stranger => strangers_excluded += 1,
            ContactSource::ChatroomParticipant => chatroom_excluded += 1,
        }
    }

    let rows = friends.iter().map(|c| {
        vec![
            c.identifier.clone(),
            c.remark.clone(),
            c.nickname.clone(),
            c.alias.clone(),
            c.display_name().to_string(),
        ]
    });
    let bytes = workbook_bytes("Contacts", &HEADERS, &WIDTHS, rows)?;

    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::io(format!("Failed to create directory {}", dir.display()), e))?;
    let path = dir.join(format!("contacts_{}.xlsx", Utc::now().timestamp_millis()));
    write_atomically(&path, &bytes)?;

    tracing::info!(
        friends = friends.len(),
        strangers_excluded,
        chatroom_excluded,
        path = %path.display(),
        "Contacts exported"
    );

    Ok(ContactExportSummary {
        friends: friends.len(),
        strangers_excluded,
        chatroom_excluded,
        path,
    })
}
