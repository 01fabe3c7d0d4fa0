//! Domain models for archived chat data.
//!
//! These models represent the core entities read from the local message store.

use serde::{Deserialize, Serialize};

/// Kind of conversation a session represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// One-to-one chat with a contact.
    #[default]
    Private,
    /// Group chat room.
    Group,
    /// Subscription / service account.
    Official,
    /// Built-in system account (file helper, news, ...).
    System,
}

impl SessionKind {
    /// Whether sessions of this kind hold real conversations.
    #[must_use]
    pub const fn is_conversational(self) -> bool {
        matches!(self, Self::Private | Self::Group)
    }

    /// Stable lowercase label, as stored in the archive.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Group => "group",
            Self::Official => "official",
            Self::System => "system",
        }
    }
}

impl std::str::FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "private" | "" => Ok(Self::Private),
            "group" | "chatroom" => Ok(Self::Group),
            "official" => Ok(Self::Official),
            "system" => Ok(Self::System),
            _ => Err(format!("Unknown session kind: {s}")),
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat session as listed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier of the peer or chat room.
    pub identifier: String,
    /// Display name cached by the store, if any.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Kind of session.
    #[serde(default)]
    pub kind: SessionKind,
}

impl Session {
    /// Display name when present and non-blank.
    #[must_use]
    pub fn known_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Type of a message, derived from the store's numeric type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum MessageKind {
    Text,
    Image,
    Voice,
    /// Animated expression (sticker).
    Emoji,
    Other(u32),
}

impl MessageKind {
    pub const TEXT_CODE: u32 = 1;
    pub const IMAGE_CODE: u32 = 3;
    pub const VOICE_CODE: u32 = 34;
    pub const EMOJI_CODE: u32 = 47;

    /// Short label used in exports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Voice => "voice",
            Self::Emoji => "emoji",
            Self::Other(_) => "other",
        }
    }

    /// Text shown in place of empty content for media messages.
    #[must_use]
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Text => "",
            Self::Image => "[Image]",
            Self::Voice => "[Voice]",
            Self::Emoji => "[Sticker]",
            Self::Other(_) => "[Message]",
        }
    }
}

impl From<u32> for MessageKind {
    fn from(code: u32) -> Self {
        match code {
            Self::TEXT_CODE => Self::Text,
            Self::IMAGE_CODE => Self::Image,
            Self::VOICE_CODE => Self::Voice,
            Self::EMOJI_CODE => Self::Emoji,
            other => Self::Other(other),
        }
    }
}

impl From<MessageKind> for u32 {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Text => MessageKind::TEXT_CODE,
            MessageKind::Image => MessageKind::IMAGE_CODE,
            MessageKind::Voice => MessageKind::VOICE_CODE,
            MessageKind::Emoji => MessageKind::EMOJI_CODE,
            MessageKind::Other(code) => code,
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single archived message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Creation time in epoch seconds.
    pub create_time: i64,
    /// Type of the message.
    pub kind: MessageKind,
    /// Textual content (may be empty for media).
    #[serde(default)]
    pub content: String,
    /// Identifier of the sender.
    #[serde(default)]
    pub sender: String,
    /// Whether the local user sent this message.
    #[serde(default)]
    pub is_send: bool,
}

impl Message {
    /// Content to display, falling back to a kind placeholder.
    #[must_use]
    pub fn display_text(&self) -> &str {
        if self.content.trim().is_empty() {
            self.kind.placeholder()
        } else {
            &self.content
        }
    }
}

/// Where a contact record comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContactSource {
    #[default]
    Friend,
    Stranger,
    ChatroomParticipant,
}

impl std::str::FromStr for ContactSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "friend" => Ok(Self::Friend),
            "stranger" => Ok(Self::Stranger),
            "chatroom" | "chatroom_participant" => Ok(Self::ChatroomParticipant),
            _ => Err(format!("Unknown contact source: {s}")),
        }
    }
}

/// Whether a record was found or made up on the spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
    #[default]
    Resolved,
    SynthesizedDefault,
}

/// A contact record with its display-name fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContactRecord {
    pub identifier: String,
    /// Name the local user assigned.
    #[serde(default)]
    pub remark: String,
    /// Name the contact chose.
    #[serde(default)]
    pub nickname: String,
    /// Public alias / handle.
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub source: ContactSource,
    #[serde(default)]
    pub origin: RecordOrigin,
}

impl ContactRecord {
    /// Placeholder record for an identifier nothing matched.
    #[must_use]
    pub fn synthesized(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            source: ContactSource::Stranger,
            origin: RecordOrigin::SynthesizedDefault,
            ..Self::default()
        }
    }

    /// Best display name: remark, then nickname, then alias, then identifier.
    #[must_use]
    pub fn display_name(&self) -> &str {
        [&self.remark, &self.nickname, &self.alias]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or(&self.identifier)
    }
}
