//! RPC access to the blockchain node/indexer.

use chrono::{DateTime, Utc};

use crate::{
    Result,
    types::{
        common::{Address, ChainAccount, Delegation, StakingParams, TokenAmount, Unbond},
        tx::{BroadcastResult, SignedTx, StakingTx},
    },
};

pub mod client;
pub mod testing;

/// Interface for querying and submitting to a chain.
///
/// All amounts are in the chain's base units; conversion to display units is
/// the coin service's job.
pub trait ChainRpc: Clone + Send + Sync {
    /// Current on-chain account state, including the transaction sequence
    /// number. Never cached by callers: sequences are single-use.
    fn account(&self, address: &Address) -> impl Send + Future<Output = Result<ChainAccount>>;

    /// Active delegations held by the address.
    fn delegations(
        &self,
        address: &Address,
    ) -> impl Send + Future<Output = Result<Vec<Delegation>>>;

    /// Delegations currently unbonding.
    fn unbonding_delegations(
        &self,
        address: &Address,
    ) -> impl Send + Future<Output = Result<Vec<Unbond>>>;

    /// Network-wide staking parameters.
    fn staking_parameters(&self) -> impl Send + Future<Output = Result<StakingParams>>;

    /// Accumulated staking rewards for the address, in base units.
    fn rewards(&self, address: &Address) -> impl Send + Future<Output = Result<TokenAmount>>;

    /// When the address's next unbonding tranche is released.
    fn unstaking_release_date(
        &self,
        address: &Address,
    ) -> impl Send + Future<Output = Result<DateTime<Utc>>>;

    /// Submit a signed transaction to the mempool.
    fn broadcast_transaction(
        &self,
        tx: &SignedTx,
    ) -> impl Send + Future<Output = Result<BroadcastResult>>;

    /// Recent staking transactions involving the address, newest first.
    fn staking_transactions(
        &self,
        address: &Address,
    ) -> impl Send + Future<Output = Result<Vec<StakingTx>>>;

    /// The chain identifier reported by the node.
    fn chain_id(&self) -> impl Send + Future<Output = Result<String>>;
}
