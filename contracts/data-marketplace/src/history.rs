//! History reconstruction.
//!
//! An item's lifecycle is spread over four event streams, one per kind. The
//! reconstructor reads each stream independently and merges them into a single
//! timeline ordered by commit time.
//!
//! Ordering is `(timestamp, seq)`. Several transitions can commit in the same
//! ledger and share a timestamp; the log sequence number breaks those ties in
//! commit order. `seq` is unique across the ledger, so the order is total and
//! the result never depends on how the streams were fetched.

use soroban_sdk::{Env, Vec};

use crate::events;
use crate::types::{EventKind, ItemEvent};

/// Full lifecycle of `item_id`, oldest first.
pub fn item_history(env: &Env, item_id: u64) -> Vec<ItemEvent> {
    let streams = EventKind::ALL.map(|kind| events::query(env, item_id, kind));
    merge(env, &streams)
}

/// Merges per-kind event streams into one sequence ordered by `(timestamp, seq)`.
///
/// Streams need not be sorted. Each event is placed after every event whose
/// key is less than or equal to its own, so equal keys keep input order.
pub fn merge(env: &Env, streams: &[Vec<ItemEvent>]) -> Vec<ItemEvent> {
    let mut timeline: Vec<ItemEvent> = Vec::new(env);

    for stream in streams.iter() {
        for event in stream.iter() {
            let at = upper_bound(&timeline, event.order_key());
            timeline.insert(at, event);
        }
    }

    timeline
}

/// First position whose key is strictly greater than `key`.
fn upper_bound(timeline: &Vec<ItemEvent>, key: (u64, u64)) -> u32 {
    let mut low = 0u32;
    let mut high = timeline.len();
    while low < high {
        let mid = low + (high - low) / 2;
        match timeline.get(mid) {
            Some(existing) if existing.order_key() <= key => low = mid + 1,
            _ => high = mid,
        }
    }
    low
}
