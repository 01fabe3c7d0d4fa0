//! Session listing with an explicitly owned cache.

use crate::domain::{MessageStore, Result, Session};

/// Identifiers of built-in accounts that never hold conversations.
const SYSTEM_ACCOUNTS: &[&str] = &[
    "filehelper",
    "fmessage",
    "floatbottle",
    "medianote",
    "newsapp",
    "weixin",
];

/// Prefix of service/subscription accounts.
const SERVICE_ACCOUNT_PREFIX: &str = "gh_";

/// Lists the conversational sessions of a store.
///
/// The listing is loaded once and reused until [`SessionCatalog::invalidate`]
/// is called; the cache lives exactly as long as the catalog.
pub struct SessionCatalog<'a> {
    store: &'a dyn MessageStore,
    cache: Option<Vec<Session>>,
}

impl<'a> SessionCatalog<'a> {
    #[must_use]
    pub fn new(store: &'a dyn MessageStore) -> Self {
        Self { store, cache: None }
    }

    /// Conversational sessions, loading them on first use.
    ///
    /// # Errors
    /// Returns error if the store cannot list sessions.
    pub fn sessions(&mut self) -> Result<&[Session]> {
        if self.cache.is_none() {
            let all = self.store.list_sessions()?;
            let total = all.len();
            let sessions: Vec<Session> = all.into_iter().filter(is_conversational).collect();
            tracing::info!(
                "Catalog holds {} sessions ({} non-conversational skipped)",
                sessions.len(),
                total - sessions.len()
            );
            self.cache = Some(sessions);
        }

        Ok(self.cache.as_deref().unwrap_or_default())
    }

    /// Metadata for one session.
    ///
    /// # Errors
    /// Returns error if the store cannot list sessions.
    pub fn find(&mut self, identifier: &str) -> Result<Option<&Session>> {
        Ok(self
            .sessions()?
            .iter()
            .find(|s| s.identifier == identifier))
    }

    /// Whether the archive knows `identifier` as a conversation or a contact.
    ///
    /// # Errors
    /// Returns error if the store cannot be read.
    pub fn is_known(&mut self, identifier: &str) -> Result<bool> {
        if self.find(identifier)?.is_some() {
            return Ok(true);
        }
        Ok(self.store.contact(identifier)?.is_some())
    }

    /// Drops the cached listing; the next call reloads it.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }
}

/// Whether a session is a real conversation worth exporting.
#[must_use]
pub fn is_conversational(session: &Session) -> bool {
    session.kind.is_conversational()
        && !session.identifier.starts_with(SERVICE_ACCOUNT_PREFIX)
        && !SYSTEM_ACCOUNTS.contains(&session.identifier.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::FakeStore;
    use crate::domain::SessionKind;

    fn session(identifier: &str, kind: SessionKind) -> Session {
        Session {
            identifier: identifier.into(),
            display_name: None,
            kind,
        }
    }

    #[test]
    fn test_filters_non_conversational() {
        let mut store = FakeStore::default();
        store.sessions = vec![
            session("alice", SessionKind::Private),
            session("team@chatroom", SessionKind::Group),
            session("gh_news", SessionKind::Private),
            session("filehelper", SessionKind::Private),
            session("brand", SessionKind::Official),
        ];
        let mut catalog = SessionCatalog::new(&store);

        let ids: Vec<&str> = catalog
            .sessions()
            .unwrap()
            .iter()
            .map(|s| s.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["alice", "team@chatroom"]);
        assert!(catalog.find("brand").unwrap().is_none());
    }

    #[test]
    fn test_cache_held_until_invalidated() {
        let store = FakeStore::default().with_session("alice", Some("Alice"), &[]);
        let mut catalog = SessionCatalog::new(&store);
        assert_eq!(catalog.sessions().unwrap().len(), 1);

        catalog.cache = Some(Vec::new());
        assert!(catalog.sessions().unwrap().is_empty());

        catalog.invalidate();
        assert_eq!(catalog.sessions().unwrap().len(), 1);
    }

    #[test]
    fn test_is_known_checks_sessions_then_contacts() {
        let store = FakeStore::default()
            .with_session("alice", None, &[])
            .with_contact("bob", "", "Bob");
        let mut catalog = SessionCatalog::new(&store);

        assert!(catalog.is_known("alice").unwrap());
        assert!(catalog.is_known("bob").unwrap());
        assert!(!catalog.is_known("mallory").unwrap());
    }
}
