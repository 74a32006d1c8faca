//! The uniform per-chain service interface.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use futures::Stream;
use rust_decimal::Decimal;

use crate::{
    Result,
    config::ChainConfig,
    types::{
        common::{Address, StakingParams, TokenAmount, Validator},
        dashboard::{MaxStake, StakeHolderList},
        tx::{BroadcastResult, SignedTx, StakeAction, StakingTx},
    },
};

pub mod cosmos;

/// One interface, one concrete implementation per supported chain, selected
/// at composition time and shared by the dashboard and detail views.
///
/// All returned amounts are in display units. One-shot methods resolve
/// against the current state; `*_stream` methods poll on fixed intervals
/// until dropped, restarting on the injected refresh signal.
pub trait CoinService: Clone + Send + Sync {
    fn config(&self) -> &Arc<ChainConfig>;

    /// The session address on this chain.
    fn address(&self) -> impl Send + Future<Output = Result<Address>>;

    /// Available (liquid) balance.
    fn balance(&self) -> impl Send + Future<Output = Result<TokenAmount>>;

    /// Total staked amount. Resolves to zero, never an error, when the fetch
    /// fails (an account with no staking history is not an error state).
    fn staked(&self) -> impl Send + Future<Output = Result<TokenAmount>>;

    /// Current USD price of one coin.
    fn price_usd(&self) -> impl Send + Future<Output = Result<Decimal>>;

    /// Available balance × current rate; waits for both.
    fn balance_usd(&self) -> impl Send + Future<Output = Result<Decimal>>;

    /// Staked amount × current rate; waits for both.
    fn staked_usd(&self) -> impl Send + Future<Output = Result<Decimal>>;

    /// The best annual reward rate among approved validators, as a
    /// percentage. Zero when the list is empty.
    fn annual_percent(&self) -> impl Send + Future<Output = Result<Decimal>>;

    /// Approved validators enriched with the caller's aggregated stake.
    /// Either input being unavailable yields an empty list, not an error.
    fn stake_holders(&self) -> impl Send + Future<Output = Result<StakeHolderList>>;

    /// The caller's aggregated stake at one validator, zero when absent.
    fn staked_to_validator(
        &self,
        validator: &Address,
    ) -> impl Send + Future<Output = Result<TokenAmount>>;

    /// The approved validator list.
    fn validators(&self) -> impl Send + Future<Output = Result<Vec<Validator>>>;

    /// A single approved validator.
    fn validator_by_id(&self, id: &Address) -> impl Send + Future<Output = Result<Validator>>;

    /// Total amount still unbonding. Zero when the account has none.
    fn pending_balance(&self) -> impl Send + Future<Output = Result<TokenAmount>>;

    /// Accumulated staking rewards. Zero when the account has none.
    fn staking_rewards(&self) -> impl Send + Future<Output = Result<TokenAmount>>;

    /// When the next unbonding tranche is released.
    fn unstaking_date(&self) -> impl Send + Future<Output = Result<DateTime<Utc>>>;

    fn staking_parameters(&self) -> impl Send + Future<Output = Result<StakingParams>>;

    /// Maximum stakeable amounts net of fee headroom.
    fn max_stake(&self) -> impl Send + Future<Output = Result<MaxStake>>;

    /// Run the full transaction pipeline: resolve the address, fetch fresh
    /// account state, build and sign the skeleton, broadcast, and wait for
    /// confirmation. `amount` is in base units. Any stage failure aborts the
    /// pipeline; nothing is retried automatically.
    fn prepare_stake_tx(
        &self,
        action: StakeAction,
        validator: &Address,
        amount: TokenAmount,
    ) -> impl Send + Future<Output = Result<StakingTx>>;

    /// Submit an already-signed transaction.
    fn broadcast(&self, tx: &SignedTx) -> impl Send + Future<Output = Result<BroadcastResult>>;

    /// Poll the recent-transactions list until `txhash` appears.
    ///
    /// With `deadline: None` this polls forever and the caller bounds it by
    /// dropping the future; a broadcast without an observed confirmation may
    /// still confirm out-of-band, so no error is implied.
    fn wait_for_confirmation(
        &self,
        txhash: &str,
        deadline: Option<Duration>,
    ) -> impl Send + Future<Output = Result<StakingTx>>;

    /// Whether a wallet provider is injected for this chain.
    fn has_provider(&self) -> bool;

    fn is_unstake_enabled(&self) -> bool;

    /// Continuously-updating available balance.
    fn balance_stream(&self) -> impl Send + Unpin + Stream<Item = TokenAmount>;

    /// Continuously-updating staked amount. Failed fetches emit zero.
    fn staked_stream(&self) -> impl Send + Unpin + Stream<Item = TokenAmount>;

    /// Continuously-updating exchange rate.
    fn rate_stream(&self) -> impl Send + Unpin + Stream<Item = Decimal>;

    /// Balance × rate, recomputed whenever either side updates; emits only
    /// once both sources have produced a value.
    fn balance_usd_stream(&self) -> impl Send + Unpin + Stream<Item = Decimal>;

    /// Staked amount × rate, with the same pairing semantics.
    fn staked_usd_stream(&self) -> impl Send + Unpin + Stream<Item = Decimal>;
}
