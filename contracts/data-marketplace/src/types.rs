/*!
 * Type Definitions for the Data Marketplace Contract
 *
 * Item records, license classes, the event log payloads, storage keys and the
 * error taxonomy shared by every module of the contract.
 */

use soroban_sdk::{contracterror, contracttype, symbol_short, Address, BytesN, String, Symbol};

// ================================================================================================
// CORE DATA STRUCTURES
// ================================================================================================

/// Usage-rights classification attached to a listed data asset.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LicenseType {
    Personal,
    Research,
    Commercial,
}

/// A marketplace item: the current state of one custodied asset.
///
/// The record holds current state only. Everything that happened to the item
/// before is recorded in the event log (see `events.rs`).
///
/// # State
/// - `owner == None`: the item is listed and can be purchased or canceled
/// - `owner == Some(buyer)`: the item was sold and `buyer` holds the asset
/// - `owner == Some(seller)`: the seller withdrew the listing before a sale
///
/// Records are never removed, so a withdrawn item stays queryable.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Item {
    /// Ledger-assigned identifier, starting at 1
    pub item_id: u64,

    /// Contract that custodies the underlying asset
    pub asset_contract: Address,

    /// Identifier of the asset inside `asset_contract`
    pub asset_id: u64,

    /// Address that controls the current listing and receives the sale price
    pub seller: Address,

    /// Current holder, `None` while listed
    pub owner: Option<Address>,

    /// Listed price in payment token units, always positive
    pub price: i128,

    /// Content digest of the associated payload, all-zero when absent
    pub data_hash: BytesN<32>,

    pub license_type: LicenseType,

    /// Locator of the encrypted payload, empty when absent
    pub encrypted_data_url: String,
}

impl Item {
    /// Listed items are the only ones that can be bought or canceled.
    pub fn is_listed(&self) -> bool {
        self.owner.is_none()
    }

    pub fn is_held_by(&self, address: &Address) -> bool {
        self.owner.as_ref() == Some(address)
    }
}

// ================================================================================================
// EVENT LOG PAYLOADS
// ================================================================================================
// Each accepted transition appends exactly one of these records. `seq` is a
// ledger-wide counter assigned at append time; `timestamp` is the ledger close
// time of the committing call.

/// Partition of the event log.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventKind {
    Created,
    Sold,
    Relisted,
    Canceled,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Created,
        EventKind::Sold,
        EventKind::Relisted,
        EventKind::Canceled,
    ];
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreatedEvent {
    pub seq: u64,
    pub item_id: u64,
    pub asset_contract: Address,
    pub asset_id: u64,
    pub seller: Address,
    pub price: i128,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SoldEvent {
    pub seq: u64,
    pub item_id: u64,
    pub asset_contract: Address,
    pub asset_id: u64,
    pub seller: Address,
    pub buyer: Address,
    pub price: i128,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelistedEvent {
    pub seq: u64,
    pub item_id: u64,
    pub asset_contract: Address,
    pub asset_id: u64,
    pub seller: Address,
    pub price: i128,
    pub timestamp: u64,
}

/// Withdrawal of a listing. Carries no price: nothing was paid.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CanceledEvent {
    pub seq: u64,
    pub item_id: u64,
    pub asset_contract: Address,
    pub asset_id: u64,
    pub seller: Address,
    pub timestamp: u64,
}

/// One entry of an item's lifecycle. The variant is the event's type tag.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ItemEvent {
    Created(CreatedEvent),
    Sold(SoldEvent),
    Relisted(RelistedEvent),
    Canceled(CanceledEvent),
}

impl ItemEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ItemEvent::Created(_) => EventKind::Created,
            ItemEvent::Sold(_) => EventKind::Sold,
            ItemEvent::Relisted(_) => EventKind::Relisted,
            ItemEvent::Canceled(_) => EventKind::Canceled,
        }
    }

    pub fn seq(&self) -> u64 {
        match self {
            ItemEvent::Created(e) => e.seq,
            ItemEvent::Sold(e) => e.seq,
            ItemEvent::Relisted(e) => e.seq,
            ItemEvent::Canceled(e) => e.seq,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            ItemEvent::Created(e) => e.timestamp,
            ItemEvent::Sold(e) => e.timestamp,
            ItemEvent::Relisted(e) => e.timestamp,
            ItemEvent::Canceled(e) => e.timestamp,
        }
    }

    pub fn item_id(&self) -> u64 {
        match self {
            ItemEvent::Created(e) => e.item_id,
            ItemEvent::Sold(e) => e.item_id,
            ItemEvent::Relisted(e) => e.item_id,
            ItemEvent::Canceled(e) => e.item_id,
        }
    }

    /// Total order used by the history merge: commit time, then log sequence.
    pub fn order_key(&self) -> (u64, u64) {
        (self.timestamp(), self.seq())
    }
}

// ================================================================================================
// STORAGE KEYS
// ================================================================================================

/// Identifies one append-only event stream: all events of `kind` for `item_id`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EventStreamKey {
    pub item_id: u64,
    pub kind: EventKind,
}

/// Identifies a single event: position `index` within its stream.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EventEntryKey {
    pub item_id: u64,
    pub kind: EventKind,
    pub index: u32,
}

/// Keys for ledger state that grows with usage.
///
/// Scalar configuration lives under short `Symbol` keys in `storage.rs`;
/// per-item records and event streams live under these keys in persistent storage.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Item record by identifier (persistent)
    Item(u64),
    /// Next identifier the allocator hands out (instance)
    NextItemId,
    /// Next event log sequence number (instance)
    EventSeq,
    /// Number of events appended to a stream (persistent)
    EventCount(EventStreamKey),
    /// One event record, stored on its own so appends never rewrite a stream (persistent)
    Event(EventEntryKey),
    /// Set while a mutating call is in progress (instance)
    Locked,
}

// ================================================================================================
// ERROR DEFINITIONS
// ================================================================================================

/// Every rejection the ledger can produce.
///
/// All errors are synchronous validation failures. A rejected call commits
/// nothing: the host discards storage writes, token movements and events of a
/// failed invocation.
///
/// # Error Code Ranges
/// - 1-7: Ledger rule violations
/// - 8-10: Listing state and lifecycle errors
/// - 11-15: Configuration and admin errors
/// - 16-19: External call and execution errors
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // ========== Ledger Rule Violations (1-7) ==========

    /// Listing or relisting price is zero or negative
    InvalidPrice = 1,

    /// Paid listing fee differs from the configured listing fee
    FeeMismatch = 2,

    /// Paid purchase amount differs from the item's price
    PriceMismatch = 3,

    /// Relist attempted by an address that does not hold the item
    NotOwner = 4,

    /// Cancel attempted by an address that is not the item's seller
    NotSeller = 5,

    /// Cancel attempted on an item that is no longer listed
    AlreadySold = 6,

    /// No item exists under the requested identifier
    ItemNotFound = 7,

    // ========== Listing State (8-10) ==========

    /// Purchase attempted on an item that is not listed
    NotForSale = 8,

    /// Mutating calls are disabled by the admin
    ContractPaused = 9,

    // ========== Configuration (11-15) ==========

    AlreadyInitialized = 11,

    NotInitialized = 12,

    /// Configured listing fee must be positive
    InvalidFee = 13,

    // ========== External Calls (16-19) ==========

    /// Payment token transfer failed (balance, allowance or token error)
    PaymentFailed = 16,

    /// Asset custody contract refused or failed the transfer
    CustodyTransferFailed = 17,

    /// A mutating call was entered while another one was still running
    ReentrantCall = 18,

    /// The asset is not held by the address trying to list it
    NotAssetHolder = 19,
}

// ================================================================================================
// EVENT TOPICS
// ================================================================================================
// Published alongside every log append so off-chain indexers can follow the
// ledger without polling. Topics are `(TOPIC, item_id)`, data is the event record.

pub const CREATED_TOPIC: Symbol = symbol_short!("created");
pub const SOLD_TOPIC: Symbol = symbol_short!("sold");
pub const RELISTED_TOPIC: Symbol = symbol_short!("relisted");
pub const CANCELED_TOPIC: Symbol = symbol_short!("canceled");
