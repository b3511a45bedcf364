//! Conversation reconstruction.
//!
//! Groups normalized, timestamped entries into per-conversation lanes and
//! replays each lane once, front to back, pairing customer messages with
//! the next automated or human reply.
//!
//! Lanes keep the feed's order: ingestion already sorts on the store's
//! ordering column, and partitioning is stable. Entries are deliberately
//! not re-sorted by their effective timestamp here — that timestamp can
//! disagree with the store order when a row fell back to its creation
//! time, and re-sorting on it would hide exactly the skewed pairings the
//! negative-delta rejection below exists to discard.
//!
//! The matching state is a single pending pointer per lane: the timestamp
//! of the most recent unanswered customer message. A newer customer
//! message replaces the pointer (it never queues behind it), and any
//! reply clears the pointer once observed, whether or not its latency
//! sample was accepted.

use std::collections::HashMap;

use crate::sender::Sender;
use crate::types::{ConversationKey, ResponseEvent, ResponseKind};

/// One normalized entry in a conversation timeline.
#[derive(Debug, Clone)]
pub struct TimelineEntry {
    pub key: ConversationKey,
    pub sender: Sender,
    /// Milliseconds since epoch (send time, or creation time as fallback)
    pub at_ms: i64,
}

/// Result of replaying every conversation lane.
#[derive(Debug, Default)]
pub struct Replay {
    /// Matched customer/reply pairs with non-negative latency
    pub events: Vec<ResponseEvent>,
    /// Automated message count per lane; lanes with zero automated
    /// messages are absent (they never enter the per-conversation average)
    pub automated_tally: HashMap<ConversationKey, u64>,
    /// Pairings discarded for negative latency (timestamp skew)
    pub rejected_samples: u64,
}

/// Partition entries into lanes, preserving feed order within each lane,
/// and replay the matching pass.
///
/// `Unrecognized` entries must already be filtered out by the caller.
pub fn replay(entries: Vec<TimelineEntry>) -> Replay {
    let mut lanes: HashMap<ConversationKey, Vec<(Sender, i64)>> = HashMap::new();
    for entry in entries {
        lanes
            .entry(entry.key)
            .or_default()
            .push((entry.sender, entry.at_ms));
    }

    let mut replay = Replay::default();
    for (key, lane) in lanes {
        replay_lane(&key, &lane, &mut replay);
    }
    replay
}

fn replay_lane(key: &ConversationKey, lane: &[(Sender, i64)], replay: &mut Replay) {
    let mut pending: Option<i64> = None;

    for &(sender, at_ms) in lane {
        match sender {
            Sender::Customer => {
                // Only the latest open customer turn is matchable
                pending = Some(at_ms);
            }
            Sender::Automated => {
                *replay.automated_tally.entry(key.clone()).or_insert(0) += 1;
                close_pending(&mut pending, at_ms, ResponseKind::Automated, replay);
            }
            Sender::Human => {
                close_pending(&mut pending, at_ms, ResponseKind::Human, replay);
            }
            Sender::Unrecognized => {
                debug_assert!(false, "unrecognized sender reached reconstruction");
            }
        }
    }
}

/// Consume the pending pointer with a reply at `at_ms`.
///
/// The pointer is cleared even when the delta is negative; the sample is
/// just not recorded in that case.
fn close_pending(
    pending: &mut Option<i64>,
    at_ms: i64,
    kind: ResponseKind,
    replay: &mut Replay,
) {
    if let Some(opened_at) = pending.take() {
        let latency_ms = at_ms - opened_at;
        if latency_ms >= 0 {
            replay.events.push(ResponseEvent { kind, latency_ms });
        } else {
            replay.rejected_samples += 1;
        }
    }
}
