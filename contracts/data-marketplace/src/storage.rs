/*!
 * Ledger Storage
 *
 * Configuration, item records, the identifier allocator and the reentrancy
 * guard. Nothing in this module moves value or publishes events; it only reads
 * and writes contract storage.
 *
 * Layout:
 * - persistent: configuration (short symbol keys), item records, event streams
 * - instance:   pause flag, identifier and sequence counters, reentrancy lock
 */

use soroban_sdk::{log, symbol_short, Address, Env, Symbol};

use crate::types::{DataKey, Error, Item};

// Configuration keys (persistent)
const ADMIN_KEY: Symbol = symbol_short!("ADMIN");
const PAYMENT_TOKEN_KEY: Symbol = symbol_short!("PAY_TKN");
const OPERATOR_KEY: Symbol = symbol_short!("OPERATOR");
const LISTING_FEE_KEY: Symbol = symbol_short!("LIST_FEE");
// Runtime flag (instance)
const PAUSED_KEY: Symbol = symbol_short!("PAUSED");

/// Listing fee used when `initialize` is called without one: 0.025 units of a
/// 7-decimal payment token.
pub const DEFAULT_LISTING_FEE: i128 = 250_000;

/// First identifier the allocator issues.
pub const FIRST_ITEM_ID: u64 = 1;

// Ledgers close roughly every 5 seconds.
pub(crate) const DAY_IN_LEDGERS: u32 = 17_280;
pub(crate) const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
pub(crate) const INSTANCE_LIFETIME_THRESHOLD: u32 = INSTANCE_BUMP_AMOUNT - DAY_IN_LEDGERS;
pub(crate) const RECORD_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
pub(crate) const RECORD_LIFETIME_THRESHOLD: u32 = RECORD_BUMP_AMOUNT - DAY_IN_LEDGERS;

// ================================================================================================
// CONFIGURATION
// ================================================================================================

pub fn is_initialized(env: &Env) -> bool {
    env.storage().persistent().has(&ADMIN_KEY)
}

/// Writes the full configuration. Callers check `is_initialized` first.
pub fn write_config(env: &Env, admin: &Address, payment_token: &Address, operator: &Address, listing_fee: i128) {
    let persistent = env.storage().persistent();
    persistent.set(&ADMIN_KEY, admin);
    persistent.set(&PAYMENT_TOKEN_KEY, payment_token);
    persistent.set(&OPERATOR_KEY, operator);
    persistent.set(&LISTING_FEE_KEY, &listing_fee);
    env.storage().instance().set(&PAUSED_KEY, &false);
    env.storage().instance().set(&DataKey::NextItemId, &FIRST_ITEM_ID);
    env.storage().instance().set(&DataKey::EventSeq, &0u64);
    bump_config(env);
}

pub fn admin(env: &Env) -> Result<Address, Error> {
    env.storage().persistent().get(&ADMIN_KEY).ok_or(Error::NotInitialized)
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().persistent().set(&ADMIN_KEY, admin);
}

pub fn payment_token(env: &Env) -> Result<Address, Error> {
    env.storage().persistent().get(&PAYMENT_TOKEN_KEY).ok_or(Error::NotInitialized)
}

/// Address that collects listing fees once the listed item sells.
pub fn operator(env: &Env) -> Result<Address, Error> {
    env.storage().persistent().get(&OPERATOR_KEY).ok_or(Error::NotInitialized)
}

pub fn set_operator(env: &Env, operator: &Address) {
    env.storage().persistent().set(&OPERATOR_KEY, operator);
}

pub fn listing_fee(env: &Env) -> Result<i128, Error> {
    env.storage().persistent().get(&LISTING_FEE_KEY).ok_or(Error::NotInitialized)
}

pub fn is_paused(env: &Env) -> bool {
    env.storage().instance().get(&PAUSED_KEY).unwrap_or(false)
}

pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&PAUSED_KEY, &paused);
}

/// Keeps configuration and instance entries alive. Called on every mutating call.
pub fn bump_config(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);

    let persistent = env.storage().persistent();
    for key in [ADMIN_KEY, PAYMENT_TOKEN_KEY, OPERATOR_KEY, LISTING_FEE_KEY] {
        if persistent.has(&key) {
            persistent.extend_ttl(&key, RECORD_LIFETIME_THRESHOLD, RECORD_BUMP_AMOUNT);
        }
    }
}

// ================================================================================================
// ITEM RECORDS
// ================================================================================================

pub fn load_item(env: &Env, item_id: u64) -> Result<Item, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Item(item_id))
        .ok_or(Error::ItemNotFound)
}

pub fn save_item(env: &Env, item: &Item) {
    let key = DataKey::Item(item.item_id);
    env.storage().persistent().set(&key, item);
    env.storage()
        .persistent()
        .extend_ttl(&key, RECORD_LIFETIME_THRESHOLD, RECORD_BUMP_AMOUNT);
}

// ================================================================================================
// IDENTIFIER ALLOCATOR
// ================================================================================================

/// The identifier the next `create_listing` will receive.
pub fn next_item_id(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::NextItemId)
        .unwrap_or(FIRST_ITEM_ID)
}

/// Issues a fresh identifier. Only the create transition calls this, inside
/// the reentrancy guard, so two listings can never observe the same counter.
pub(crate) fn allocate_item_id(env: &Env) -> u64 {
    let item_id = next_item_id(env);
    env.storage().instance().set(&DataKey::NextItemId, &(item_id + 1));
    item_id
}

/// Issues the next event log sequence number.
pub(crate) fn allocate_event_seq(env: &Env) -> u64 {
    let seq: u64 = env.storage().instance().get(&DataKey::EventSeq).unwrap_or(0);
    env.storage().instance().set(&DataKey::EventSeq, &(seq + 1));
    seq
}

// ================================================================================================
// REENTRANCY GUARD
// ================================================================================================

/// Runs a mutating operation with the ledger lock held.
///
/// A second mutating call that arrives while `op` is still running (for
/// example from a custody contract calling back into the ledger) is rejected
/// with `ReentrantCall`. The lock is released whatever `op` returns; on error
/// the host discards the whole invocation anyway.
pub fn non_reentrant<T>(env: &Env, op: impl FnOnce() -> Result<T, Error>) -> Result<T, Error> {
    if is_locked(env) {
        log!(env, "Rejected reentrant ledger call");
        return Err(Error::ReentrantCall);
    }
    env.storage().instance().set(&DataKey::Locked, &true);
    let result = op();
    env.storage().instance().remove(&DataKey::Locked);
    result
}

pub fn is_locked(env: &Env) -> bool {
    env.storage().instance().get(&DataKey::Locked).unwrap_or(false)
}
