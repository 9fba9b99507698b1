/*!
 * Event Log
 *
 * Append-only record of every accepted ledger transition, partitioned by item
 * and event kind. Each event is its own storage entry, indexed by its position
 * in the stream; no code path rewrites or removes one. This is the ledger's
 * only history: item records keep nothing but current state.
 *
 * Every append is also published as a contract event so indexers can follow
 * the ledger without reading storage.
 */

use soroban_sdk::{Address, Env, Vec};

use crate::storage::{self, RECORD_BUMP_AMOUNT, RECORD_LIFETIME_THRESHOLD};
use crate::types::{
    CanceledEvent, CreatedEvent, DataKey, EventEntryKey, EventKind, EventStreamKey, Item, ItemEvent,
    RelistedEvent, SoldEvent, CANCELED_TOPIC, CREATED_TOPIC, RELISTED_TOPIC, SOLD_TOPIC,
};

fn stream_key(item_id: u64, kind: EventKind) -> EventStreamKey {
    EventStreamKey { item_id, kind }
}

fn bump(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, RECORD_LIFETIME_THRESHOLD, RECORD_BUMP_AMOUNT);
}

/// Number of events of `kind` recorded for `item_id`.
pub fn count(env: &Env, item_id: u64, kind: EventKind) -> u32 {
    env.storage()
        .persistent()
        .get(&DataKey::EventCount(stream_key(item_id, kind)))
        .unwrap_or(0)
}

/// Up to `limit` events of `kind` for `item_id`, starting at append position `start`.
pub fn query_range(env: &Env, item_id: u64, kind: EventKind, start: u32, limit: u32) -> Vec<ItemEvent> {
    let end = count(env, item_id, kind).min(start.saturating_add(limit));
    let mut events = Vec::new(env);
    for index in start..end {
        let key = DataKey::Event(EventEntryKey { item_id, kind, index });
        if let Some(event) = env.storage().persistent().get::<_, ItemEvent>(&key) {
            events.push_back(event);
        }
    }
    events
}

/// All events of `kind` recorded for `item_id`, in append order.
pub fn query(env: &Env, item_id: u64, kind: EventKind) -> Vec<ItemEvent> {
    query_range(env, item_id, kind, 0, u32::MAX)
}

// Each event gets its own entry, so an append writes one record and a counter
// no matter how long the stream already is.
fn append(env: &Env, event: ItemEvent) {
    let item_id = event.item_id();
    let kind = event.kind();
    let index = count(env, item_id, kind);

    let entry_key = DataKey::Event(EventEntryKey { item_id, kind, index });
    env.storage().persistent().set(&entry_key, &event);
    bump(env, &entry_key);

    let count_key = DataKey::EventCount(stream_key(item_id, kind));
    env.storage().persistent().set(&count_key, &(index + 1));
    bump(env, &count_key);

    let topic = match kind {
        EventKind::Created => CREATED_TOPIC,
        EventKind::Sold => SOLD_TOPIC,
        EventKind::Relisted => RELISTED_TOPIC,
        EventKind::Canceled => CANCELED_TOPIC,
    };
    env.events().publish((topic, item_id), event);
}

pub fn record_created(env: &Env, item: &Item) {
    append(
        env,
        ItemEvent::Created(CreatedEvent {
            seq: storage::allocate_event_seq(env),
            item_id: item.item_id,
            asset_contract: item.asset_contract.clone(),
            asset_id: item.asset_id,
            seller: item.seller.clone(),
            price: item.price,
            timestamp: env.ledger().timestamp(),
        }),
    );
}

/// `seller` is the address that was paid, which is the item's seller before
/// the sale committed.
pub fn record_sold(env: &Env, item: &Item, seller: &Address, buyer: &Address) {
    append(
        env,
        ItemEvent::Sold(SoldEvent {
            seq: storage::allocate_event_seq(env),
            item_id: item.item_id,
            asset_contract: item.asset_contract.clone(),
            asset_id: item.asset_id,
            seller: seller.clone(),
            buyer: buyer.clone(),
            price: item.price,
            timestamp: env.ledger().timestamp(),
        }),
    );
}

pub fn record_relisted(env: &Env, item: &Item) {
    append(
        env,
        ItemEvent::Relisted(RelistedEvent {
            seq: storage::allocate_event_seq(env),
            item_id: item.item_id,
            asset_contract: item.asset_contract.clone(),
            asset_id: item.asset_id,
            seller: item.seller.clone(),
            price: item.price,
            timestamp: env.ledger().timestamp(),
        }),
    );
}

pub fn record_canceled(env: &Env, item: &Item) {
    append(
        env,
        ItemEvent::Canceled(CanceledEvent {
            seq: storage::allocate_event_seq(env),
            item_id: item.item_id,
            asset_contract: item.asset_contract.clone(),
            asset_id: item.asset_id,
            seller: item.seller.clone(),
            timestamp: env.ledger().timestamp(),
        }),
    );
}
