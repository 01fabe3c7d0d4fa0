//! `SQLite` adapter for the local message archive.
//!
//! Reads the `session`, `message` and `contact` tables; an optional
//! `meta` table can flag the archive as preview-only.

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};

use crate::domain::{
    AppError, ContactRecord, ContactSource, Message, MessageKind, MessageStore, RecordOrigin,
    Result, Session, SessionKind, StoreMode,
};

#[cfg(test)]
pub const SCHEMA: &str = r"
    CREATE TABLE IF NOT EXISTS session (
        username TEXT PRIMARY KEY,
        display_name TEXT,
        kind TEXT NOT NULL DEFAULT 'private',
        last_time INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS message (
        local_id INTEGER PRIMARY KEY AUTOINCREMENT,
        talker TEXT NOT NULL,
        create_time INTEGER NOT NULL,
        type INTEGER NOT NULL DEFAULT 1,
        content TEXT NOT NULL DEFAULT '',
        sender TEXT NOT NULL DEFAULT '',
        is_send INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_message_talker_time ON message(talker, create_time);
    CREATE TABLE IF NOT EXISTS contact (
        username TEXT PRIMARY KEY,
        remark TEXT NOT NULL DEFAULT '',
        nickname TEXT NOT NULL DEFAULT '',
        alias TEXT NOT NULL DEFAULT '',
        source TEXT NOT NULL DEFAULT 'friend'
    );
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT
    );
";

const MESSAGE_COLUMNS: &str = "create_time, type, content, sender, is_send";
const CONTACT_COLUMNS: &str = "username, remark, nickname, alias, source";

/// `SQLite` reader for archive databases.
pub struct SqliteMessageStore {
    conn: Connection,
    mode: StoreMode,
}

impl SqliteMessageStore {
    /// Opens an archive database in read-only mode.
    ///
    /// # Errors
    /// Returns error if the file is missing or cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::DatabaseNotFound {
                path: path.to_path_buf(),
            });
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(AppError::database)?;

        conn.execute_batch(
            "PRAGMA query_only = ON;
             PRAGMA temp_store = MEMORY;",
        )
        .map_err(AppError::database)?;

        tracing::debug!("Opened archive: {}", path.display());
        Ok(Self::with_connection(conn))
    }

    /// Wraps an already configured connection.
    #[must_use]
    pub fn with_connection(conn: Connection) -> Self {
        let mode = read_mode(&conn);
        Self { conn, mode }
    }

    fn query_messages(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Message>> {
        let mut stmt = self.conn.prepare(sql).map_err(AppError::database)?;
        let rows = stmt
            .query_map(params, message_from_row)
            .map_err(AppError::database)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(row_error)
    }
}

/// Rows that decode to the wrong type are archive corruption, not a
/// connection problem.
fn row_error(err: rusqlite::Error) -> AppError {
    match err {
        rusqlite::Error::IntegralValueOutOfRange(column, value) => AppError::InvalidData {
            message: format!("column {column} holds out-of-range value {value}"),
        },
        rusqlite::Error::InvalidColumnType(_, name, kind) => AppError::InvalidData {
            message: format!("column {name} has unexpected type {kind}"),
        },
        rusqlite::Error::FromSqlConversionFailure(column, _, source) => AppError::InvalidData {
            message: format!("column {column} could not be decoded: {source}"),
        },
        other => AppError::database(other),
    }
}

/// Reads `meta.mode`; archives without a `meta` table are regular archives.
fn read_mode(conn: &Connection) -> StoreMode {
    let value: Option<String> = conn
        .query_row("SELECT value FROM meta WHERE key = 'mode'", [], |row| {
            row.get(0)
        })
        .optional()
        .unwrap_or_else(|e| {
            tracing::debug!("No archive mode recorded: {}", e);
            None
        });

    match value.as_deref() {
        Some("preview") => StoreMode::Preview,
        _ => StoreMode::Archive,
    }
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        create_time: row.get(0)?,
        kind: MessageKind::from(row.get::<_, u32>(1)?),
        content: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        sender: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        is_send: row.get(4)?,
    })
}

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<ContactRecord> {
    let source: String = row.get(4)?;
    Ok(ContactRecord {
        identifier: row.get(0)?,
        remark: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        nickname: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        alias: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        source: source.parse().unwrap_or(ContactSource::Stranger),
        origin: RecordOrigin::Resolved,
    })
}

impl MessageStore for SqliteMessageStore {
    fn mode(&self) -> StoreMode {
        self.mode
    }

    fn list_sessions(&self) -> Result<Vec<Session>> {
        let mut stmt = self
            .conn
            .prepare("SELECT username, display_name, kind FROM session ORDER BY last_time DESC")
            .map_err(AppError::database)?;

        let rows = stmt
            .query_map([], |row| {
                let kind: Option<String> = row.get(2)?;
                Ok(Session {
                    identifier: row.get(0)?,
                    display_name: row.get(1)?,
                    kind: kind
                        .as_deref()
                        .unwrap_or_default()
                        .parse()
                        .unwrap_or(SessionKind::System),
                })
            })
            .map_err(AppError::database)?;

        let mut sessions = Vec::new();
        for row in rows {
            match row {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    tracing::warn!("Failed to read session row: {}", e);
                }
            }
        }

        tracing::debug!("Listed {} sessions", sessions.len());
        Ok(sessions)
    }

    fn message_page(&self, identifier: &str, limit: usize, offset: usize) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM message WHERE talker = ?1
             ORDER BY create_time DESC, local_id DESC LIMIT ?2 OFFSET ?3"
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        self.query_messages(&sql, params![identifier, limit, offset])
    }

    fn messages_by_date(&self, identifier: &str, start: i64, end: i64) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM message
             WHERE talker = ?1 AND create_time >= ?2 AND create_time <= ?3"
        );
        self.query_messages(&sql, params![identifier, start, end])
    }

    fn contact(&self, identifier: &str) -> Result<Option<ContactRecord>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contact WHERE username = ?1");
        self.conn
            .query_row(&sql, [identifier], contact_from_row)
            .optional()
            .map_err(AppError::database)
    }

    fn list_contacts(
        &self,
        include_strangers: bool,
        include_chatroom_participants: bool,
    ) -> Result<Vec<ContactRecord>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contact ORDER BY username");
        let mut stmt = self.conn.prepare(&sql).map_err(AppError::database)?;
        let rows = stmt
            .query_map([], contact_from_row)
            .map_err(AppError::database)?;

        let mut contacts = Vec::new();
        for row in rows {
            let record = row.map_err(row_error)?;
            let keep = match record.source {
                ContactSource::Friend => true,
                ContactSource::Stranger => include_strangers,
                ContactSource::ChatroomParticipant => include_chatroom_participants,
            };
            if keep {
                contacts.push(record);
            }
        }

        Ok(contacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> SqliteMessageStore {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            "INSERT INTO session VALUES ('alice', 'Alice', 'private', 300);
             INSERT INTO session VALUES ('room@chatroom', NULL, 'group', 500);
             INSERT INTO message (talker, create_time, type, content, sender, is_send)
                 VALUES ('alice', 100, 1, 'hi', 'alice', 0),
                        ('alice', 300, 3, '', 'me', 1),
                        ('alice', 200, 1, 'hello there', 'me', 1);
             INSERT INTO contact VALUES ('alice', 'Ally', 'Alice', 'al', 'friend');
             INSERT INTO contact VALUES ('bob', '', 'Bob', '', 'stranger');
             INSERT INTO contact VALUES ('carol', '', 'Carol', '', 'chatroom');",
        )
        .unwrap();
        SqliteMessageStore::with_connection(conn)
    }

    #[test]
    fn test_sessions_ordered_by_activity() {
        let store = seeded_store();
        let sessions = store.list_sessions().unwrap();
        assert_eq!(sessions[0].identifier, "room@chatroom");
        assert_eq!(sessions[0].kind, SessionKind::Group);
        assert_eq!(sessions[1].known_name(), Some("Alice"));
    }

    #[test]
    fn test_message_page_is_newest_first() {
        let store = seeded_store();
        let page = store.message_page("alice", 2, 0).unwrap();
        let times: Vec<i64> = page.iter().map(|m| m.create_time).collect();
        assert_eq!(times, vec![300, 200]);
        assert_eq!(page[0].kind, MessageKind::Image);

        let rest = store.message_page("alice", 2, 2).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].create_time, 100);
    }

    #[test]
    fn test_messages_by_date_inclusive() {
        let store = seeded_store();
        let messages = store.messages_by_date("alice", 100, 200).unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_contacts_filtering() {
        let store = seeded_store();
        assert_eq!(store.list_contacts(false, false).unwrap().len(), 1);
        assert_eq!(store.list_contacts(true, true).unwrap().len(), 3);
        let alice = store.contact("alice").unwrap().unwrap();
        assert_eq!(alice.display_name(), "Ally");
        assert!(store.contact("nobody").unwrap().is_none());
    }

    #[test]
    fn test_mode_defaults_to_archive() {
        let store = seeded_store();
        assert_eq!(store.mode(), StoreMode::Archive);

        store
            .conn
            .execute("INSERT INTO meta VALUES ('mode', 'preview')", [])
            .unwrap();
        assert_eq!(read_mode(&store.conn), StoreMode::Preview);
    }

    #[test]
    fn test_corrupt_message_row_is_invalid_data() {
        let store = seeded_store();
        store
            .conn
            .execute(
                "INSERT INTO message (talker, create_time, type) VALUES ('alice', 400, -1)",
                [],
            )
            .unwrap();

        let result = store.message_page("alice", 10, 0);
        assert!(matches!(result, Err(AppError::InvalidData { .. })));
    }

    #[test]
    fn test_open_missing_file() {
        let result = SqliteMessageStore::open(Path::new("/nonexistent/archive.db"));
        assert!(matches!(result, Err(AppError::DatabaseNotFound { .. })));
    }
}
