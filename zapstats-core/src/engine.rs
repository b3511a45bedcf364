//! The response-time analytics engine.
//!
//! One invocation runs the four stages sequentially: ingest the trailing
//! window from the feed, normalize sender labels, reconstruct the
//! conversation lanes, and aggregate. There is no shared state between
//! invocations and no partial result: the caller gets either complete
//! metrics or, on any ingestion failure, the zeroed set. The dashboard
//! widget this feeds must degrade silently rather than break page load,
//! so feed errors are logged and swallowed here.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::feed::{fetch_window, FeedQuery, MessagePages, PAGE_SIZE};
use crate::metrics::aggregate;
use crate::sender::Sender;
use crate::timeline::{replay, TimelineEntry};
use crate::types::{ConversationKey, DebugReport, EngagementMetrics};

/// Result of one engine invocation.
#[derive(Debug, Clone)]
pub struct StatsReport {
    pub metrics: EngagementMetrics,
    /// Present only when diagnostics were requested
    pub debug: Option<DebugReport>,
}

/// Computes engagement metrics over a message feed.
pub struct StatsEngine<F> {
    feed: F,
    window_days: i64,
    page_size: usize,
}

impl<F: MessagePages> StatsEngine<F> {
    /// Create an engine with the default 365-day window.
    pub fn new(feed: F) -> Self {
        Self {
            feed,
            window_days: 365,
            page_size: PAGE_SIZE,
        }
    }

    /// Override the trailing window length.
    pub fn with_window_days(mut self, window_days: i64) -> Self {
        self.window_days = window_days;
        self
    }

    /// Override the ingestion page size (tests and small deployments).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Run the full pipeline for one request.
    ///
    /// `owner_id` restricts aggregation to one owner's conversations;
    /// `debug` attaches the diagnostic payload. Never fails: ingestion
    /// errors degrade to [`EngagementMetrics::zeroed`].
    pub async fn compute(&self, owner_id: Option<&str>, debug: bool) -> StatsReport {
        let query = FeedQuery {
            since: window_start(Utc::now(), self.window_days),
            owner_id: owner_id.map(String::from),
        };

        let records = match fetch_window(&self.feed, &query, self.page_size).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    owner_id = owner_id.unwrap_or("<all>"),
                    "Feed ingestion failed, serving zeroed metrics"
                );
                return StatsReport {
                    metrics: EngagementMetrics::zeroed(),
                    debug: debug.then(DebugReport::default),
                };
            }
        };

        let mut report = DebugReport::default();
        if debug {
            for record in &records {
                if let Some(label) = &record.sender {
                    *report.sender_labels.entry(label.clone()).or_insert(0) += 1;
                }
            }
        }

        let entries: Vec<TimelineEntry> = records
            .iter()
            .filter_map(|record| {
                let sender = Sender::normalize(record.sender.as_deref());
                if sender == Sender::Unrecognized {
                    return None;
                }
                let at_ms = record.effective_ts_ms()?;
                Some(TimelineEntry {
                    key: ConversationKey::new(record.chat_id.clone(), record.owner_id.clone()),
                    sender,
                    at_ms,
                })
            })
            .collect();

        let replayed = replay(entries);
        let metrics = aggregate(&replayed);

        tracing::debug!(
            records = records.len(),
            conversations = replayed.automated_tally.len(),
            samples = replayed.events.len(),
            "Computed engagement metrics"
        );

        let debug = debug.then(|| {
            report.accepted_samples = replayed.events.len() as u64;
            report.rejected_samples = replayed.rejected_samples;
            report
        });

        StatsReport { metrics, debug }
    }
}

/// Start of the trailing window: `days` before `now`, truncated to the
/// UTC day boundary.
fn window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    (now - Duration::days(days))
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::feed::OrderKey;
    use crate::types::MessageRecord;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    fn record(chat: &str, owner: &str, sender: Option<&str>, at_ms: i64) -> MessageRecord {
        MessageRecord {
            chat_id: chat.to_string(),
            owner_id: owner.to_string(),
            sender: sender.map(String::from),
            sent_at: Utc.timestamp_millis_opt(at_ms).single(),
            created_at: Utc.timestamp_millis_opt(at_ms).single(),
        }
    }

    struct StaticFeed {
        records: Vec<MessageRecord>,
        seen_owner_filters: Mutex<Vec<Option<String>>>,
    }

    impl StaticFeed {
        fn new(records: Vec<MessageRecord>) -> Self {
            Self {
                records,
                seen_owner_filters: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MessagePages for StaticFeed {
        async fn fetch_page(
            &self,
            query: &FeedQuery,
            _order: OrderKey,
            offset: usize,
            limit: usize,
        ) -> Result<Vec<MessageRecord>> {
            self.seen_owner_filters
                .lock()
                .unwrap()
                .push(query.owner_id.clone());
            Ok(self
                .records
                .iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect())
        }
    }

    struct DownFeed;

    #[async_trait]
    impl MessagePages for DownFeed {
        async fn fetch_page(
            &self,
            _query: &FeedQuery,
            _order: OrderKey,
            _offset: usize,
            _limit: usize,
        ) -> Result<Vec<MessageRecord>> {
            Err(Error::Feed("store unreachable".into()))
        }
    }

    fn mixed_reply_scenario() -> Vec<MessageRecord> {
        vec![
            record("A", "U1", Some("cliente"), 1000),
            record("A", "U1", Some("ia"), 1500),
            record("A", "U1", Some("cliente"), 4000),
            record("A", "U1", Some("humano"), 9000),
            record("A", "U1", Some("ia"), 9500),
        ]
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let engine = StatsEngine::new(StaticFeed::new(mixed_reply_scenario()));
        let report = engine.compute(None, false).await;
        assert_eq!(report.metrics.avg_automated_per_conversation, 2.0);
        assert_eq!(report.metrics.avg_automated_latency_minutes, 0.0);
        assert_eq!(report.metrics.avg_human_latency_minutes, 0.1);
        assert!(report.debug.is_none());
    }

    #[tokio::test]
    async fn test_idempotence() {
        let engine = StatsEngine::new(StaticFeed::new(mixed_reply_scenario()));
        let first = engine.compute(None, false).await;
        let second = engine.compute(None, false).await;
        assert_eq!(first.metrics, second.metrics);
    }

    #[tokio::test]
    async fn test_feed_failure_degrades_to_zeroed_metrics() {
        let engine = StatsEngine::new(DownFeed);
        let report = engine.compute(Some("u-1"), false).await;
        assert_eq!(report.metrics, EngagementMetrics::zeroed());
    }

    #[tokio::test]
    async fn test_unrecognized_and_untimed_records_contribute_nothing() {
        let mut records = mixed_reply_scenario();
        records.push(record("A", "U1", Some("sistema"), 10_000));
        records.push(record("A", "U1", None, 11_000));
        let mut untimed = record("A", "U1", Some("ia"), 0);
        untimed.sent_at = None;
        untimed.created_at = None;
        records.push(untimed);

        let engine = StatsEngine::new(StaticFeed::new(records));
        let report = engine.compute(None, false).await;
        assert_eq!(report.metrics.avg_automated_per_conversation, 2.0);
        assert_eq!(report.metrics.avg_human_latency_minutes, 0.1);
    }

    #[tokio::test]
    async fn test_owner_filter_reaches_the_feed() {
        let feed = StaticFeed::new(vec![]);
        let engine = StatsEngine::new(feed);
        let _ = engine.compute(Some("owner-9"), false).await;
        let seen = engine.feed.seen_owner_filters.lock().unwrap();
        assert_eq!(seen.as_slice(), [Some("owner-9".to_string())]);
    }

    #[tokio::test]
    async fn test_debug_report_counts() {
        let mut records = mixed_reply_scenario();
        records.push(record("A", "U1", Some("Robô"), 12_000));
        // A second lane with a skewed pairing: the reply's timestamp
        // precedes the customer turn it closes
        records.push(record("B", "U1", Some("cliente"), 20_000));
        records.push(record("B", "U1", Some("humano"), 15_000));
        let engine = StatsEngine::new(StaticFeed::new(records));

        let report = engine.compute(None, true).await;
        let debug = report.debug.expect("debug payload requested");
        assert_eq!(debug.sender_labels.get("cliente"), Some(&3));
        assert_eq!(debug.sender_labels.get("ia"), Some(&2));
        assert_eq!(debug.sender_labels.get("humano"), Some(&2));
        assert_eq!(debug.sender_labels.get("Robô"), Some(&1));
        assert_eq!(debug.accepted_samples, 2);
        assert_eq!(debug.rejected_samples, 1);
    }

    #[test]
    fn test_window_start_truncates_to_day_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 13, 45, 30).unwrap();
        let start = window_start(now, 365);
        assert_eq!(
            start,
            Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap()
        );
    }
}
