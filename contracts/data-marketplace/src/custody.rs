//! Asset custody collaborator.
//!
//! Listed assets live in an external contract (an NFT-style collection). The
//! ledger only ever moves them between a user and its own address, so the
//! interface it depends on is two calls wide.

use soroban_sdk::{contractclient, log, Address, Env};

use crate::types::Error;

#[contractclient(name = "AssetCustodyClient")]
pub trait AssetCustody {
    /// Moves `asset_id` from `from` to `to`. Requires `from`'s authorization.
    fn transfer(env: Env, from: Address, to: Address, asset_id: u64);

    /// Current holder of `asset_id`.
    fn owner_of(env: Env, asset_id: u64) -> Address;
}

/// Moves custody of an asset, mapping any failure of the collaborator to
/// `CustodyTransferFailed`.
pub fn move_asset(
    env: &Env,
    asset_contract: &Address,
    asset_id: u64,
    from: &Address,
    to: &Address,
) -> Result<(), Error> {
    let client = AssetCustodyClient::new(env, asset_contract);
    match client.try_transfer(from, to, &asset_id) {
        Ok(Ok(())) => Ok(()),
        _ => {
            log!(env, "Custody transfer of asset {} failed", asset_id);
            Err(Error::CustodyTransferFailed)
        }
    }
}

/// Current holder of an asset according to its custody contract.
pub fn holder_of(env: &Env, asset_contract: &Address, asset_id: u64) -> Result<Address, Error> {
    let client = AssetCustodyClient::new(env, asset_contract);
    match client.try_owner_of(&asset_id) {
        Ok(Ok(holder)) => Ok(holder),
        _ => {
            log!(env, "Custody lookup of asset {} failed", asset_id);
            Err(Error::CustodyTransferFailed)
        }
    }
}
