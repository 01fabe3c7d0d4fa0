//! Read interface to the local message store.

use super::error::Result;
use super::models::{ContactRecord, Message, Session};

/// Operating mode reported by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreMode {
    /// A real archive; export allowed.
    #[default]
    Archive,
    /// Sample or preview data; export forbidden.
    Preview,
}

/// Query primitives the exporter and statistics rely on.
///
/// Implementations must return [`MessageStore::message_page`] results
/// ordered newest first; the scanner's early stop depends on it.
pub trait MessageStore {
    fn mode(&self) -> StoreMode {
        StoreMode::Archive
    }

    /// All sessions known to the store.
    fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Up to `limit` messages of a session, newest first, skipping `offset`.
    fn message_page(&self, identifier: &str, limit: usize, offset: usize) -> Result<Vec<Message>>;

    /// Messages with `start <= create_time <= end`, in no particular order.
    fn messages_by_date(&self, identifier: &str, start: i64, end: i64) -> Result<Vec<Message>>;

    fn contact(&self, identifier: &str) -> Result<Option<ContactRecord>>;

    fn list_contacts(
        &self,
        include_strangers: bool,
        include_chatroom_participants: bool,
    ) -> Result<Vec<ContactRecord>>;
}
