//! Core domain types for zapstats
//!
//! These types model the read side of a WhatsApp support CRM: a flat
//! message log served by a hosted backend, reconstructed per conversation
//! into ordered timelines and reduced into engagement metrics.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Conversation lane** | All messages sharing one `(chat, owner)` identity pair |
//! | **Owner** | The CRM account (attendant/tenant user) a conversation belongs to |
//! | **Pending pointer** | The most recent unanswered customer timestamp in a lane |
//! | **Latency sample** | Non-negative delta between a customer message and the reply that closed its pointer |
//! | **Trailing window** | The fixed 365-day lookback applied to ingestion |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================
// Message records (feed input)
// ============================================

/// One logged message, as served by the message feed.
///
/// Field names on the wire are the backend's column names and must not be
/// renamed. The record is read-only: the engine materializes it for the
/// duration of one aggregation request and never writes it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Conversation subject (the WhatsApp chat)
    #[serde(rename = "id_conversa")]
    pub chat_id: String,
    /// Owning CRM account; part of the conversation identity
    #[serde(rename = "user_id")]
    pub owner_id: String,
    /// Free-text sender label, normalized later into [`Sender`]
    #[serde(rename = "remetente")]
    pub sender: Option<String>,
    /// Dedicated send-time column; absent on older rows
    #[serde(rename = "horario_envio")]
    pub sent_at: Option<DateTime<Utc>>,
    /// Row creation time, used when `horario_envio` is missing
    pub created_at: Option<DateTime<Utc>>,
}

impl MessageRecord {
    /// Effective timestamp in milliseconds since epoch.
    ///
    /// Prefers the send-time column, falls back to the row creation time.
    /// Returns `None` when both are missing; such records are dropped.
    pub fn effective_ts_ms(&self) -> Option<i64> {
        self.sent_at
            .or(self.created_at)
            .map(|t| t.timestamp_millis())
    }
}

// ============================================
// Conversation identity
// ============================================

/// Identity of one conversation lane.
///
/// The owner is part of the identity: two records for the same chat under
/// different owners never merge into one timeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub chat_id: String,
    pub owner_id: String,
}

impl ConversationKey {
    pub fn new(chat_id: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            owner_id: owner_id.into(),
        }
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.chat_id, self.owner_id)
    }
}

// ============================================
// Response events
// ============================================

/// Who answered an open customer message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Automated,
    Human,
}

/// A matched customer-message/reply pair with non-negative latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseEvent {
    pub kind: ResponseKind,
    pub latency_ms: i64,
}

// ============================================
// Aggregate output
// ============================================

/// The three engagement metrics served to the dashboard.
///
/// The serialized field names are the stable external contract consumed
/// by the statistics widgets; internal names are free to differ.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    /// Average automated messages per conversation, over conversations
    /// with at least one automated message
    #[serde(rename = "mediaMensagensPorIA")]
    pub avg_automated_per_conversation: f64,
    /// Average automated response latency in minutes
    #[serde(rename = "tempoMedioAtendimentoIAMinutos")]
    pub avg_automated_latency_minutes: f64,
    /// Average human response latency in minutes
    #[serde(rename = "tempoMedioAtendimentoHumanoMinutos")]
    pub avg_human_latency_minutes: f64,
}

impl EngagementMetrics {
    /// The degraded response returned when ingestion fails or no
    /// qualifying data exists.
    pub fn zeroed() -> Self {
        Self {
            avg_automated_per_conversation: 0.0,
            avg_automated_latency_minutes: 0.0,
            avg_human_latency_minutes: 0.0,
        }
    }
}

/// Diagnostic payload attached to the response when `debug` is requested.
///
/// Operability aid only; not part of the metrics contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugReport {
    /// Distinct raw sender labels observed in the window, with counts
    pub sender_labels: HashMap<String, u64>,
    /// Latency samples accepted (non-negative delta)
    pub accepted_samples: u64,
    /// Latency samples rejected (negative delta from timestamp skew)
    pub rejected_samples: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_wire_names() {
        let json = r#"{
            "id_conversa": "5511999990000",
            "user_id": "u-1",
            "remetente": "Cliente",
            "horario_envio": "2025-06-01T12:00:00Z",
            "created_at": "2025-06-01T12:00:05Z"
        }"#;
        let record: MessageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.chat_id, "5511999990000");
        assert_eq!(record.owner_id, "u-1");
        assert_eq!(record.sender.as_deref(), Some("Cliente"));
        assert!(record.sent_at.is_some());
    }

    #[test]
    fn test_effective_ts_prefers_send_time() {
        let sent = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let created = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 5).unwrap();
        let record = MessageRecord {
            chat_id: "c".to_string(),
            owner_id: "u".to_string(),
            sender: None,
            sent_at: Some(sent),
            created_at: Some(created),
        };
        assert_eq!(record.effective_ts_ms(), Some(sent.timestamp_millis()));

        let record = MessageRecord {
            sent_at: None,
            ..record
        };
        assert_eq!(record.effective_ts_ms(), Some(created.timestamp_millis()));

        let record = MessageRecord {
            created_at: None,
            ..record
        };
        assert_eq!(record.effective_ts_ms(), None);
    }

    #[test]
    fn test_metrics_stable_field_names() {
        let metrics = EngagementMetrics {
            avg_automated_per_conversation: 2.0,
            avg_automated_latency_minutes: 0.0,
            avg_human_latency_minutes: 0.1,
        };
        let value = serde_json::to_value(metrics).unwrap();
        assert_eq!(value["mediaMensagensPorIA"], 2.0);
        assert_eq!(value["tempoMedioAtendimentoIAMinutos"], 0.0);
        assert_eq!(value["tempoMedioAtendimentoHumanoMinutos"], 0.1);
    }

    #[test]
    fn test_conversation_key_owner_is_identity() {
        let a = ConversationKey::new("chat", "owner-1");
        let b = ConversationKey::new("chat", "owner-2");
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "chat:owner-1");
    }
}
