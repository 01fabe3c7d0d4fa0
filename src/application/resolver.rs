//! Display-name resolution over a snapshot of contact records.
//!
//! Matchers are tried in order; the first hit wins. When nothing matches a
//! synthesized default record is used, so resolution never fails.

use crate::domain::{ContactRecord, MessageStore};

/// One strategy for finding the record behind an identifier.
pub trait NameMatcher {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn find<'a>(&self, identifier: &str, contacts: &'a [ContactRecord])
        -> Option<&'a ContactRecord>;
}

/// Record identifier equals the query.
pub struct ExactMatch;

impl NameMatcher for ExactMatch {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn find<'a>(
        &self,
        identifier: &str,
        contacts: &'a [ContactRecord],
    ) -> Option<&'a ContactRecord> {
        contacts.iter().find(|c| c.identifier == identifier)
    }
}

/// Record identifier contains the query or is contained in it.
pub struct LooseMatch;

impl NameMatcher for LooseMatch {
    fn name(&self) -> &'static str {
        "loose"
    }

    fn find<'a>(
        &self,
        identifier: &str,
        contacts: &'a [ContactRecord],
    ) -> Option<&'a ContactRecord> {
        if identifier.is_empty() {
            return None;
        }
        contacts.iter().find(|c| {
            !c.identifier.is_empty()
                && (identifier.contains(c.identifier.as_str())
                    || c.identifier.contains(identifier))
        })
    }
}

/// Resolves identifiers to human-readable names.
pub struct ContactResolver {
    contacts: Vec<ContactRecord>,
    matchers: Vec<Box<dyn NameMatcher>>,
}

impl ContactResolver {
    /// Resolver with the default chain: exact, then loose.
    #[must_use]
    pub fn new(contacts: Vec<ContactRecord>) -> Self {
        Self::with_matchers(contacts, vec![Box::new(ExactMatch), Box::new(LooseMatch)])
    }

    #[must_use]
    pub fn with_matchers(contacts: Vec<ContactRecord>, matchers: Vec<Box<dyn NameMatcher>>) -> Self {
        Self { contacts, matchers }
    }

    /// Snapshot every contact the store knows, strangers and chat room
    /// members included. A failing store yields an empty snapshot.
    pub fn from_store(store: &dyn MessageStore) -> Self {
        let contacts = store.list_contacts(true, true).unwrap_or_else(|e| {
            tracing::warn!("Contact snapshot unavailable, names fall back to ids: {}", e);
            Vec::new()
        });
        tracing::debug!("Contact snapshot holds {} records", contacts.len());
        Self::new(contacts)
    }

    /// Record behind `identifier`, synthesized when no matcher finds one.
    #[must_use]
    pub fn record(&self, identifier: &str) -> ContactRecord {
        self.matchers
            .iter()
            .find_map(|m| {
                m.find(identifier, &self.contacts).inspect(|record| {
                    tracing::trace!(
                        matcher = m.name(),
                        query = identifier,
                        found = %record.identifier,
                        "Resolved contact"
                    );
                })
            })
            .cloned()
            .unwrap_or_else(|| ContactRecord::synthesized(identifier))
    }

    /// Display name for `identifier`; never empty.
    #[must_use]
    pub fn resolve(&self, identifier: &str) -> String {
        let record = self.record(identifier);
        let name = record.display_name();
        if !name.trim().is_empty() {
            name.to_string()
        } else if !identifier.is_empty() {
            identifier.to_string()
        } else {
            "(unknown)".to_string()
        }
    }
}
