//! Relationship statistics between the local user and one contact.

use serde::Serialize;

/// A single message as it appears in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRecord {
    pub content: String,
    pub sender: String,
    pub is_send: bool,
    pub create_time: i64,
    /// `create_time` rendered as `%Y-%m-%d %H:%M:%S`.
    pub time: String,
}

/// First chat of the year plus its opening messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearFirstChat {
    pub first: ChatRecord,
    /// Up to three earliest messages of the year, oldest first.
    pub opening: Vec<ChatRecord>,
}

/// Activity counters for one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyStats {
    pub total_messages: usize,
    pub total_words: usize,
    pub image_count: usize,
    pub voice_count: usize,
    pub emoji_count: usize,
}

/// Everything the dual report shows.
#[derive(Debug, Clone, Serialize)]
pub struct DualReportData {
    pub year: i32,
    pub my_name: String,
    pub friend_identifier: String,
    pub friend_name: String,
    pub first_chat: Option<ChatRecord>,
    pub year_first_chat: Option<YearFirstChat>,
    pub yearly_stats: YearlyStats,
}
