//! Relationship statistics between the local user and one contact.
//!
//! Every operation degrades to an empty or zero result on store faults;
//! nothing here returns an error.

use chrono::FixedOffset;

use crate::domain::{
    ChatRecord, DualReportData, Message, MessageKind, MessageStore, Result, TimeWindow,
    YearFirstChat, YearlyStats,
};

use super::formatter::format_timestamp;
use super::resolver::ContactResolver;
use super::scanner::MessageScanner;

/// Messages shown as the opening of a year.
const OPENING_MESSAGES: usize = 3;

/// Computes first-contact and yearly activity figures.
pub struct StatisticsAggregator<'a> {
    store: &'a dyn MessageStore,
    resolver: &'a ContactResolver,
    scanner: MessageScanner<'a>,
    offset: FixedOffset,
}

impl<'a> StatisticsAggregator<'a> {
    #[must_use]
    pub fn new(
        store: &'a dyn MessageStore,
        resolver: &'a ContactResolver,
        offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            resolver,
            scanner: MessageScanner::new(store),
            offset,
        }
    }

    #[must_use]
    pub fn with_scanner(mut self, scanner: MessageScanner<'a>) -> Self {
        self.scanner = scanner;
        self
    }

    /// Earliest message ever exchanged with `identifier`.
    pub async fn first_chat_info(&self, identifier: &str) -> Option<ChatRecord> {
        let messages = self
            .messages_in(identifier, TimeWindow::all_time())
            .await
            .map_err(|e| tracing::warn!(session = identifier, "First chat unavailable: {}", e))
            .ok()?;
        messages.first().map(|m| self.record(m))
    }

    /// Earliest message of `year` plus the year's first few messages.
    pub async fn this_year_first_chat_info(
        &self,
        identifier: &str,
        year: i32,
    ) -> Option<YearFirstChat> {
        let window = TimeWindow::year(year, self.offset).ok()?;
        let messages = self
            .messages_in(identifier, window)
            .await
            .map_err(|e| tracing::warn!(session = identifier, year, "Year first chat unavailable: {}", e))
            .ok()?;

        let first = self.record(messages.first()?);
        let opening = messages
            .iter()
            .take(OPENING_MESSAGES)
            .map(|m| self.record(m))
            .collect();
        Some(YearFirstChat { first, opening })
    }

    /// Activity counters for `year`; zero on any fault.
    pub async fn yearly_stats(&self, identifier: &str, year: i32) -> YearlyStats {
        match TimeWindow::year(year, self.offset) {
            Ok(window) => self.stats_for_window(identifier, window).await,
            Err(e) => {
                tracing::warn!("Yearly stats unavailable: {}", e);
                YearlyStats::default()
            }
        }
    }

    /// Activity counters for any window; zero on any fault.
    pub async fn stats_for_window(&self, identifier: &str, window: TimeWindow) -> YearlyStats {
        match self.messages_in(identifier, window).await {
            Ok(messages) => tally(&messages),
            Err(e) => {
                tracing::warn!(session = identifier, "Stats unavailable: {}", e);
                YearlyStats::default()
            }
        }
    }

    /// Local user's display name via the resolver chain.
    #[must_use]
    pub fn my_display_name(&self, my_identifier: &str) -> String {
        self.resolver.resolve(my_identifier)
    }

    /// Full report for one relationship.
    pub async fn dual_report(
        &self,
        my_identifier: &str,
        friend_identifier: &str,
        year: i32,
    ) -> DualReportData {
        DualReportData {
            year,
            my_name: self.my_display_name(my_identifier),
            friend_identifier: friend_identifier.to_string(),
            friend_name: self.resolver.resolve(friend_identifier),
            first_chat: self.first_chat_info(friend_identifier).await,
            year_first_chat: self.this_year_first_chat_info(friend_identifier, year).await,
            yearly_stats: self.yearly_stats(friend_identifier, year).await,
        }
    }

    /// Window contents sorted ascending. Bounded windows use the date query,
    /// all-time goes through the scanner.
    async fn messages_in(&self, identifier: &str, window: TimeWindow) -> Result<Vec<Message>> {
        let mut messages = match (window.start(), window.end()) {
            (Some(start), Some(end)) => self.store.messages_by_date(identifier, start, end)?,
            _ => self.scanner.scan(identifier, window).await?,
        };
        messages.sort_by_key(|m| m.create_time);
        Ok(messages)
    }

    fn record(&self, message: &Message) -> ChatRecord {
        ChatRecord {
            content: message.display_text().to_string(),
            sender: message.sender.clone(),
            is_send: message.is_send,
            create_time: message.create_time,
            time: format_timestamp(message.create_time, self.offset),
        }
    }
}

fn tally(messages: &[Message]) -> YearlyStats {
    let mut stats = YearlyStats {
        total_messages: messages.len(),
        ..YearlyStats::default()
    };

    for message in messages {
        match message.kind {
            MessageKind::Text => stats.total_words += message.content.split_whitespace().count(),
            MessageKind::Image => stats.image_count += 1,
            MessageKind::Voice => stats.voice_count += 1,
            MessageKind::Emoji => stats.emoji_count += 1,
            MessageKind::Other(_) => {}
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{text_message, typed_message, FakeStore};

    // 2024-03-01 00:00:00 UTC
    const MARCH_2024: i64 = 1_709_251_200;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn store() -> FakeStore {
        FakeStore::default()
            .with_messages(
                "alice",
                vec![
                    text_message(MARCH_2024 + 30, "third of year", true),
                    text_message(1_600_000_000, "long ago", false),
                    typed_message(MARCH_2024 + 40, MessageKind::Image),
                    text_message(MARCH_2024, "hello  there friend", false),
                    typed_message(MARCH_2024 + 10, MessageKind::Voice),
                    typed_message(MARCH_2024 + 20, MessageKind::Emoji),
                    typed_message(MARCH_2024 + 50, MessageKind::Other(10000)),
                ],
            )
            .with_contact("me", "", "Myself")
            .with_contact("alice", "Ally", "Alice")
    }

    #[tokio::test]
    async fn test_first_chat_info_is_earliest_ever() {
        let store = store();
        let resolver = ContactResolver::from_store(&store);
        let stats = StatisticsAggregator::new(&store, &resolver, utc());

        let first = stats.first_chat_info("alice").await.unwrap();
        assert_eq!(first.content, "long ago");
        assert_eq!(first.time, "2020-09-13 12:26:40");
    }

    #[tokio::test]
    async fn test_year_first_chat_has_three_opening_messages() {
        let store = store();
        let resolver = ContactResolver::from_store(&store);
        let stats = StatisticsAggregator::new(&store, &resolver, utc());

        let year_first = stats.this_year_first_chat_info("alice", 2024).await.unwrap();
        assert_eq!(year_first.first.content, "hello  there friend");
        let opening: Vec<&str> = year_first
            .opening
            .iter()
            .map(|r| r.content.as_str())
            .collect();
        assert_eq!(opening, vec!["hello  there friend", "[Voice]", "[Sticker]"]);
    }

    #[tokio::test]
    async fn test_yearly_stats_counts_by_kind() {
        let store = store();
        let resolver = ContactResolver::from_store(&store);
        let stats = StatisticsAggregator::new(&store, &resolver, utc());

        let yearly = stats.yearly_stats("alice", 2024).await;
        assert_eq!(
            yearly,
            YearlyStats {
                total_messages: 6,
                total_words: 6,
                image_count: 1,
                voice_count: 1,
                emoji_count: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_empty_year_is_zero_and_none() {
        let store = store();
        let resolver = ContactResolver::from_store(&store);
        let stats = StatisticsAggregator::new(&store, &resolver, utc());

        assert_eq!(stats.yearly_stats("alice", 2019).await, YearlyStats::default());
        assert!(stats.this_year_first_chat_info("alice", 2019).await.is_none());
        assert!(stats.first_chat_info("nobody").await.is_none());
    }

    #[tokio::test]
    async fn test_faults_degrade_to_empty() {
        let store = store().failing_on("alice");
        let resolver = ContactResolver::from_store(&store);
        let stats = StatisticsAggregator::new(&store, &resolver, utc());

        assert_eq!(stats.yearly_stats("alice", 2024).await, YearlyStats::default());
        assert!(stats.first_chat_info("alice").await.is_none());
        assert!(stats.this_year_first_chat_info("alice", 2024).await.is_none());
    }

    #[tokio::test]
    async fn test_all_time_stats_match_window_scenario() {
        let store = FakeStore::default().with_session("alice", None, &[100, 200, 300]);
        let resolver = ContactResolver::from_store(&store);
        let stats = StatisticsAggregator::new(&store, &resolver, utc());

        let all = stats.stats_for_window("alice", TimeWindow::all_time()).await;
        assert_eq!(all.total_messages, 3);
    }

    #[tokio::test]
    async fn test_dual_report_names() {
        let store = store();
        let resolver = ContactResolver::from_store(&store);
        let stats = StatisticsAggregator::new(&store, &resolver, utc());

        let report = stats.dual_report("me", "alice", 2024).await;
        assert_eq!(report.my_name, "Myself");
        assert_eq!(report.friend_name, "Ally");
        assert_eq!(report.yearly_stats.total_messages, 6);
        assert_eq!(stats.my_display_name("wxid_unknown"), "wxid_unknown");
    }
}
