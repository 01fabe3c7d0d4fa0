//! In-memory store double shared by the application tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::domain::{
    AppError, ContactRecord, ContactSource, Message, MessageKind, MessageStore, Result, Session,
    SessionKind, StoreMode,
};

#[derive(Default)]
pub struct FakeStore {
    pub mode: StoreMode,
    pub sessions: Vec<Session>,
    pub contacts: Vec<ContactRecord>,
    /// Messages per session, any order.
    pub messages: HashMap<String, Vec<Message>>,
    /// Sessions whose reads fail.
    pub failing: HashSet<String>,
    /// Serve pages oldest first, breaking the store contract.
    pub misordered: bool,
    /// `(identifier, limit, offset)` of every page request.
    pub page_requests: RefCell<Vec<(String, usize, usize)>>,
}

impl FakeStore {
    pub fn with_session(mut self, identifier: &str, name: Option<&str>, times: &[i64]) -> Self {
        self.sessions.push(Session {
            identifier: identifier.to_string(),
            display_name: name.map(str::to_string),
            kind: SessionKind::Private,
        });
        let messages = times
            .iter()
            .map(|&t| text_message(t, &format!("message at {t}"), false))
            .collect();
        self.messages.insert(identifier.to_string(), messages);
        self
    }

    pub fn with_messages(mut self, identifier: &str, messages: Vec<Message>) -> Self {
        self.messages.insert(identifier.to_string(), messages);
        self
    }

    pub fn with_contact(mut self, identifier: &str, remark: &str, nickname: &str) -> Self {
        self.contacts.push(ContactRecord {
            identifier: identifier.to_string(),
            remark: remark.to_string(),
            nickname: nickname.to_string(),
            source: ContactSource::Friend,
            ..ContactRecord::default()
        });
        self
    }

    pub fn failing_on(mut self, identifier: &str) -> Self {
        self.failing.insert(identifier.to_string());
        self
    }

    pub fn pages_requested(&self) -> usize {
        self.page_requests.borrow().len()
    }

    fn check(&self, identifier: &str) -> Result<()> {
        if self.failing.contains(identifier) {
            return Err(AppError::InvalidData {
                message: format!("corrupt history for {identifier}"),
            });
        }
        Ok(())
    }
}

pub fn text_message(create_time: i64, content: &str, is_send: bool) -> Message {
    Message {
        create_time,
        kind: MessageKind::Text,
        content: content.to_string(),
        sender: if is_send { "me" } else { "peer" }.to_string(),
        is_send,
    }
}

pub fn typed_message(create_time: i64, kind: MessageKind) -> Message {
    Message {
        create_time,
        kind,
        content: String::new(),
        sender: "peer".to_string(),
        is_send: false,
    }
}

impl MessageStore for FakeStore {
    fn mode(&self) -> StoreMode {
        self.mode
    }

    fn list_sessions(&self) -> Result<Vec<Session>> {
        Ok(self.sessions.clone())
    }

    fn message_page(&self, identifier: &str, limit: usize, offset: usize) -> Result<Vec<Message>> {
        self.page_requests
            .borrow_mut()
            .push((identifier.to_string(), limit, offset));
        self.check(identifier)?;

        let mut all = self.messages.get(identifier).cloned().unwrap_or_default();
        if self.misordered {
            all.sort_by_key(|m| m.create_time);
        } else {
            all.sort_by_key(|m| std::cmp::Reverse(m.create_time));
        }
        Ok(all.into_iter().skip(offset).take(limit).collect())
    }

    fn messages_by_date(&self, identifier: &str, start: i64, end: i64) -> Result<Vec<Message>> {
        self.check(identifier)?;
        Ok(self
            .messages
            .get(identifier)
            .map(|all| {
                all.iter()
                    .filter(|m| start <= m.create_time && m.create_time <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn contact(&self, identifier: &str) -> Result<Option<ContactRecord>> {
        Ok(self
            .contacts
            .iter()
            .find(|c| c.identifier == identifier)
            .cloned())
    }

    fn list_contacts(
        &self,
        include_strangers: bool,
        include_chatroom_participants: bool,
    ) -> Result<Vec<ContactRecord>> {
        Ok(self
            .contacts
            .iter()
            .filter(|c| match c.source {
                ContactSource::Friend => true,
                ContactSource::Stranger => include_strangers,
                ContactSource::ChatroomParticipant => include_chatroom_participants,
            })
            .cloned()
            .collect())
    }
}
