/*!
 * Data Marketplace Ledger Contract
 *
 * Single-ledger marketplace for tokenized data assets. Sellers list an asset
 * they hold in an external custody contract, buyers purchase it at the listed
 * price, holders relist, and sellers may withdraw a listing before it sells.
 *
 * Key features:
 * - Item state machine: create -> purchase -> relist -> ... with cancel from listed
 * - Strictly increasing item identifiers, never reused
 * - Fixed listing fee, escrowed by the ledger and paid to the operator on sale
 * - Append-only event log per item and kind, with merged lifecycle history
 * - Ownership query used by off-chain key issuance to gate decryption keys
 *
 * Atomicity:
 * - The host runs each invocation serially and discards every write, token
 *   movement and event of an invocation that returns an error
 * - All checks and state commits happen before any external call
 * - Mutating calls hold a reentrancy lock for their whole duration
 *
 * Business Logic:
 * 1. Seller pays the listing fee and hands the asset to the ledger (Created)
 * 2. Buyer pays the exact price to the seller and receives the asset; the
 *    escrowed fee goes to the operator (Sold)
 * 3. The holder can relist at a new price, paying the fee again (Relisted)
 * 4. While listed, the seller can take the asset back (Canceled); the fee
 *    paid for that listing is not refunded
 */

#![no_std]

mod custody;
mod events;
mod history;
mod storage;
mod types;


use soroban_sdk::{contract, contractimpl, log, symbol_short, token, Address, BytesN, Env, String, Vec};

pub use custody::{AssetCustody, AssetCustodyClient};
pub use storage::{DEFAULT_LISTING_FEE, FIRST_ITEM_ID};
pub use types::{
    CanceledEvent, CreatedEvent, Error, EventKind, Item, ItemEvent, LicenseType, RelistedEvent,
    SoldEvent,
};

#[contract]
pub struct DataMarketplaceContract;

#[contractimpl]
impl DataMarketplaceContract {
    /// Initializes the marketplace. Can only be called once, and the admin must sign.
    ///
    /// # Arguments
    /// * `admin` - Address allowed to pause the ledger and rotate admin/operator
    /// * `payment_token` - Token contract used for prices and listing fees
    /// * `operator` - Address that receives the escrowed listing fee on each sale
    /// * `listing_fee` - Fee charged on create and relist, `DEFAULT_LISTING_FEE` if omitted
    ///
    /// The listing fee cannot be changed afterwards, so the fee escrowed for a
    /// listing always equals the fee paid out when it sells.
    ///
    /// # Errors
    /// - AlreadyInitialized: If the contract was initialized before
    /// - InvalidFee: If the listing fee is zero or negative
    pub fn initialize(
        env: Env,
        admin: Address,
        payment_token: Address,
        operator: Address,
        listing_fee: Option<i128>,
    ) -> Result<(), Error> {
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();

        let listing_fee = listing_fee.unwrap_or(DEFAULT_LISTING_FEE);
        if listing_fee <= 0 {
            log!(&env, "Listing fee must be positive, got {}", listing_fee);
            return Err(Error::InvalidFee);
        }

        storage::write_config(&env, &admin, &payment_token, &operator, listing_fee);
        Ok(())
    }

    // ================================================================================================
    // LEDGER TRANSITIONS
    // ================================================================================================

    /// Lists a new item for sale.
    ///
    /// # Business Flow
    /// 1. Validates price, paid fee and that the seller holds the asset
    /// 2. Allocates the next item identifier
    /// 3. Stores the record with no owner and the caller as seller
    /// 4. Appends a `Created` event
    /// 5. Collects the fee and takes custody of the asset
    ///
    /// # Arguments
    /// * `seller` - Address listing the item (must sign), current asset holder
    /// * `asset_contract` / `asset_id` - The asset to custody
    /// * `price` - Sale price in payment token units
    /// * `data_hash` - Digest of the payload, all-zero if none
    /// * `license_type` - Usage rights granted to the buyer
    /// * `encrypted_data_url` - Locator of the encrypted payload, empty if none
    /// * `paid_fee` - Amount the seller pays; must equal the listing fee
    ///
    /// # Returns
    /// The identifier of the new item
    ///
    /// # Errors
    /// - InvalidPrice: If price is zero or negative
    /// - FeeMismatch: If paid fee differs from the listing fee
    /// - NotAssetHolder: If the custody contract reports another holder
    /// - PaymentFailed / CustodyTransferFailed: If the fee or asset cannot be moved
    pub fn create_listing(
        env: Env,
        seller: Address,
        asset_contract: Address,
        asset_id: u64,
        price: i128,
        data_hash: BytesN<32>,
        license_type: LicenseType,
        encrypted_data_url: String,
        paid_fee: i128,
    ) -> Result<u64, Error> {
        Self::_require_open(&env)?;
        seller.require_auth();

        storage::non_reentrant(&env, || {
            if price <= 0 {
                log!(&env, "Rejected listing with price {}", price);
                return Err(Error::InvalidPrice);
            }
            Self::_require_listing_fee(&env, paid_fee)?;
            if custody::holder_of(&env, &asset_contract, asset_id)? != seller {
                log!(&env, "Seller does not hold asset {}", asset_id);
                return Err(Error::NotAssetHolder);
            }

            let item = Item {
                item_id: storage::allocate_item_id(&env),
                asset_contract: asset_contract.clone(),
                asset_id,
                seller: seller.clone(),
                owner: None,
                price,
                data_hash,
                license_type,
                encrypted_data_url,
            };
            storage::save_item(&env, &item);
            events::record_created(&env, &item);

            let ledger = env.current_contract_address();
            Self::_pay(&env, &seller, &ledger, paid_fee)?;
            custody::move_asset(&env, &asset_contract, asset_id, &seller, &ledger)?;

            storage::bump_config(&env);
            Ok(item.item_id)
        })
    }

    /// Buys a listed item at its exact price.
    ///
    /// # Business Flow
    /// 1. Validates the item is listed and the paid amount equals its price
    /// 2. Sets the buyer as owner and appends a `Sold` event
    /// 3. Pays the full price from buyer to seller
    /// 4. Hands the asset to the buyer
    /// 5. Pays the escrowed listing fee to the operator
    ///
    /// # Errors
    /// - ItemNotFound: If no item has this identifier
    /// - NotForSale: If the item is sold or withdrawn
    /// - PriceMismatch: If the paid amount differs from the price
    /// - PaymentFailed / CustodyTransferFailed: If value or asset cannot be moved
    pub fn purchase(env: Env, buyer: Address, item_id: u64, paid_amount: i128) -> Result<(), Error> {
        Self::_require_open(&env)?;
        buyer.require_auth();

        storage::non_reentrant(&env, || {
            let mut item = storage::load_item(&env, item_id)?;
            if !item.is_listed() {
                return Err(Error::NotForSale);
            }
            if paid_amount != item.price {
                log!(&env, "Price mismatch on item {}. Expected: {}, Paid: {}", item_id, item.price, paid_amount);
                return Err(Error::PriceMismatch);
            }
            let fee = storage::listing_fee(&env)?;
            let operator = storage::operator(&env)?;
            let seller = item.seller.clone();

            item.owner = Some(buyer.clone());
            storage::save_item(&env, &item);
            events::record_sold(&env, &item, &seller, &buyer);

            let ledger = env.current_contract_address();
            Self::_pay(&env, &buyer, &seller, paid_amount)?;
            custody::move_asset(&env, &item.asset_contract, item.asset_id, &ledger, &buyer)?;
            Self::_pay(&env, &ledger, &operator, fee)?;

            storage::bump_config(&env);
            Ok(())
        })
    }

    /// Puts a held item back on sale.
    ///
    /// Only the current holder may relist. The holder becomes the seller, the
    /// item becomes active at `new_price`, and the listing fee is paid again.
    ///
    /// # Errors
    /// - ItemNotFound: If no item has this identifier
    /// - NotOwner: If the caller does not hold the item (including listed items)
    /// - InvalidPrice: If the new price is zero or negative
    /// - FeeMismatch: If paid fee differs from the listing fee
    pub fn relist(env: Env, owner: Address, item_id: u64, new_price: i128, paid_fee: i128) -> Result<(), Error> {
        Self::_require_open(&env)?;
        owner.require_auth();

        storage::non_reentrant(&env, || {
            let mut item = storage::load_item(&env, item_id)?;
            if !item.is_held_by(&owner) {
                return Err(Error::NotOwner);
            }
            if new_price <= 0 {
                log!(&env, "Rejected relist of item {} with price {}", item_id, new_price);
                return Err(Error::InvalidPrice);
            }
            Self::_require_listing_fee(&env, paid_fee)?;

            item.seller = owner.clone();
            item.owner = None;
            item.price = new_price;
            storage::save_item(&env, &item);
            events::record_relisted(&env, &item);

            let ledger = env.current_contract_address();
            Self::_pay(&env, &owner, &ledger, paid_fee)?;
            custody::move_asset(&env, &item.asset_contract, item.asset_id, &owner, &ledger)?;

            storage::bump_config(&env);
            Ok(())
        })
    }

    /// Withdraws a listing that has not sold.
    ///
    /// The asset goes back to the seller and the seller is recorded as owner,
    /// which takes the item off the active list without a sale. The record is
    /// kept. The listing fee stays with the ledger.
    ///
    /// # Errors
    /// - ItemNotFound: If no item has this identifier
    /// - AlreadySold: If the item is not currently listed
    /// - NotSeller: If the caller is not the item's seller
    pub fn cancel(env: Env, seller: Address, item_id: u64) -> Result<(), Error> {
        Self::_require_open(&env)?;
        seller.require_auth();

        storage::non_reentrant(&env, || {
            let mut item = storage::load_item(&env, item_id)?;
            if !item.is_listed() {
                return Err(Error::AlreadySold);
            }
            if item.seller != seller {
                return Err(Error::NotSeller);
            }

            item.owner = Some(seller.clone());
            storage::save_item(&env, &item);
            events::record_canceled(&env, &item);

            let ledger = env.current_contract_address();
            custody::move_asset(&env, &item.asset_contract, item.asset_id, &ledger, &seller)?;

            storage::bump_config(&env);
            Ok(())
        })
    }

    // ================================================================================================
    // ITEM QUERIES
    // ================================================================================================

    pub fn get_item(env: Env, item_id: u64) -> Result<Item, Error> {
        storage::load_item(&env, item_id)
    }

    /// Returns `(data_hash, license_type, encrypted_data_url)` for an item.
    pub fn get_data_info(env: Env, item_id: u64) -> Result<(BytesN<32>, LicenseType, String), Error> {
        let item = storage::load_item(&env, item_id)?;
        Ok((item.data_hash, item.license_type, item.encrypted_data_url))
    }

    /// Whether `address` currently holds the item.
    ///
    /// Key issuance services call this before releasing decryption material
    /// for the item's payload. A listed item is held by nobody.
    pub fn verify_ownership(env: Env, item_id: u64, address: Address) -> Result<bool, Error> {
        let item = storage::load_item(&env, item_id)?;
        Ok(item.is_held_by(&address))
    }

    /// Whether `data_hash` matches the digest recorded at listing.
    pub fn verify_data_integrity(env: Env, item_id: u64, data_hash: BytesN<32>) -> Result<bool, Error> {
        let item = storage::load_item(&env, item_id)?;
        Ok(item.data_hash == data_hash)
    }

    /// Items that are listed, ascending by identifier.
    pub fn list_active(env: Env) -> Vec<Item> {
        Self::_collect_matching(&env, |item| item.is_listed())
    }

    /// Items currently held by `owner`, ascending by identifier.
    ///
    /// Withdrawn listings appear here for their seller, since withdrawal
    /// records the seller as owner.
    pub fn list_owned_by(env: Env, owner: Address) -> Vec<Item> {
        Self::_collect_matching(&env, |item| item.is_held_by(&owner))
    }

    /// Items whose current seller is `seller`, in any state.
    pub fn list_by_seller(env: Env, seller: Address) -> Vec<Item> {
        Self::_collect_matching(&env, |item| item.seller == seller)
    }

    pub fn count_active(env: Env) -> u32 {
        Self::_count_matching(&env, |item| item.is_listed())
    }

    pub fn count_owned_by(env: Env, owner: Address) -> u32 {
        Self::_count_matching(&env, |item| item.is_held_by(&owner))
    }

    // ================================================================================================
    // EVENT LOG AND HISTORY
    // ================================================================================================

    /// Events of one kind recorded for an item, in append order.
    /// Unknown identifiers have empty streams.
    pub fn query_events(env: Env, item_id: u64, kind: EventKind) -> Vec<ItemEvent> {
        events::query(&env, item_id, kind)
    }

    /// A window of one event stream: at most `limit` events from position `start`.
    pub fn query_events_page(env: Env, item_id: u64, kind: EventKind, start: u32, limit: u32) -> Vec<ItemEvent> {
        events::query_range(&env, item_id, kind, start, limit)
    }

    pub fn count_events(env: Env, item_id: u64, kind: EventKind) -> u32 {
        events::count(&env, item_id, kind)
    }

    /// Full lifecycle of an item, ordered by commit time then log sequence.
    pub fn get_item_history(env: Env, item_id: u64) -> Result<Vec<ItemEvent>, Error> {
        storage::load_item(&env, item_id)?;
        Ok(history::item_history(&env, item_id))
    }

    // ================================================================================================
    // ADMINISTRATIVE FUNCTIONS
    // ================================================================================================

    /// Disables create, purchase, relist and cancel. Reads keep working.
    pub fn pause(env: Env) -> Result<(), Error> {
        Self::_require_admin(&env)?;
        storage::set_paused(&env, true);
        Ok(())
    }

    pub fn unpause(env: Env) -> Result<(), Error> {
        Self::_require_admin(&env)?;
        storage::set_paused(&env, false);
        Ok(())
    }

    /// Transfers administrative control. Both the current and the new admin must sign.
    pub fn update_admin(env: Env, new_admin: Address) -> Result<(), Error> {
        Self::_require_admin(&env)?;
        new_admin.require_auth();
        storage::set_admin(&env, &new_admin);
        env.events()
            .publish((symbol_short!("adm_upd"), env.current_contract_address()), new_admin);
        Ok(())
    }

    /// Changes where listing fees are paid. Applies to every sale from now on,
    /// including items listed before the change.
    pub fn update_operator(env: Env, new_operator: Address) -> Result<(), Error> {
        Self::_require_admin(&env)?;
        storage::set_operator(&env, &new_operator);
        Ok(())
    }

    // ================================================================================================
    // CONFIGURATION GETTERS
    // ================================================================================================

    pub fn get_listing_fee(env: Env) -> Result<i128, Error> {
        storage::listing_fee(&env)
    }

    pub fn get_admin(env: Env) -> Result<Address, Error> {
        storage::admin(&env)
    }

    pub fn get_operator(env: Env) -> Result<Address, Error> {
        storage::operator(&env)
    }

    pub fn get_payment_token(env: Env) -> Result<Address, Error> {
        storage::payment_token(&env)
    }

    pub fn is_paused(env: Env) -> bool {
        storage::is_paused(&env)
    }

    /// Identifier the next listing will receive.
    pub fn get_next_item_id(env: Env) -> u64 {
        storage::next_item_id(&env)
    }

    /// Returns `(admin, payment_token, operator, listing_fee, next_item_id, is_paused)`.
    pub fn get_contract_info(env: Env) -> Result<(Address, Address, Address, i128, u64, bool), Error> {
        Ok((
            storage::admin(&env)?,
            storage::payment_token(&env)?,
            storage::operator(&env)?,
            storage::listing_fee(&env)?,
            storage::next_item_id(&env),
            storage::is_paused(&env),
        ))
    }
}

impl DataMarketplaceContract {
    fn _require_admin(env: &Env) -> Result<(), Error> {
        let admin = storage::admin(env)?;
        admin.require_auth();
        Ok(())
    }

    /// Ledger transitions need a configured, unpaused contract.
    fn _require_open(env: &Env) -> Result<(), Error> {
        if !storage::is_initialized(env) {
            return Err(Error::NotInitialized);
        }
        if storage::is_paused(env) {
            return Err(Error::ContractPaused);
        }
        Ok(())
    }

    fn _require_listing_fee(env: &Env, paid_fee: i128) -> Result<(), Error> {
        let listing_fee = storage::listing_fee(env)?;
        if paid_fee != listing_fee {
            log!(env, "Listing fee mismatch. Required: {}, Paid: {}", listing_fee, paid_fee);
            return Err(Error::FeeMismatch);
        }
        Ok(())
    }

    /// Moves `amount` of the payment token.
    fn _pay(env: &Env, from: &Address, to: &Address, amount: i128) -> Result<(), Error> {
        let token_id = storage::payment_token(env)?;
        let token_client = token::Client::new(env, &token_id);
        match token_client.try_transfer(from, to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => {
                log!(env, "Payment of {} failed", amount);
                Err(Error::PaymentFailed)
            }
        }
    }

    /// First pass of a listing query: how many items match.
    fn _count_matching(env: &Env, matches: impl Fn(&Item) -> bool) -> u32 {
        let mut count = 0u32;
        for item_id in FIRST_ITEM_ID..storage::next_item_id(env) {
            if let Ok(item) = storage::load_item(env, item_id) {
                if matches(&item) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Second pass: fills exactly `count` matching items in identifier order,
    /// stopping as soon as the result is complete.
    fn _collect_matching(env: &Env, matches: impl Fn(&Item) -> bool) -> Vec<Item> {
        let expected = Self::_count_matching(env, &matches);
        let end = storage::next_item_id(env);

        let mut items = Vec::new(env);
        let mut item_id = FIRST_ITEM_ID;
        while items.len() < expected && item_id < end {
            if let Ok(item) = storage::load_item(env, item_id) {
                if matches(&item) {
                    items.push_back(item);
                }
            }
            item_id += 1;
        }
        items
    }
}
