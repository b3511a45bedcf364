//! Aggregation of replayed conversations into engagement metrics.
//!
//! The per-conversation average counts only conversations with at least
//! one automated message, while latency averages are taken over raw
//! response events. The asymmetry matches the dashboard's historical
//! definition of these numbers and is part of the contract.

use crate::timeline::Replay;
use crate::types::{EngagementMetrics, ResponseKind};

const MS_PER_MINUTE: f64 = 60_000.0;

/// Reduce a [`Replay`] into the three dashboard metrics.
///
/// Empty denominators yield 0.0; every value is rounded to one decimal.
pub fn aggregate(replay: &Replay) -> EngagementMetrics {
    let conversations = replay.automated_tally.len();
    let automated_messages: u64 = replay.automated_tally.values().sum();
    let avg_automated_per_conversation = if conversations > 0 {
        automated_messages as f64 / conversations as f64
    } else {
        0.0
    };

    let avg_automated_latency_minutes =
        mean_latency_minutes(replay, ResponseKind::Automated);
    let avg_human_latency_minutes = mean_latency_minutes(replay, ResponseKind::Human);

    EngagementMetrics {
        avg_automated_per_conversation: round1(avg_automated_per_conversation),
        avg_automated_latency_minutes: round1(avg_automated_latency_minutes),
        avg_human_latency_minutes: round1(avg_human_latency_minutes),
    }
}

fn mean_latency_minutes(replay: &Replay, kind: ResponseKind) -> f64 {
    let latencies: Vec<i64> = replay
        .events
        .iter()
        .filter(|e| e.kind == kind)
        .map(|e| e.latency_ms)
        .collect();
    if latencies.is_empty() {
        return 0.0;
    }
    let mean_ms = latencies.iter().sum::<i64>() as f64 / latencies.len() as f64;
    mean_ms / MS_PER_MINUTE
}

/// Round to one decimal place.
pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
