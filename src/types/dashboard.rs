//! View models assembled for the dashboard and staking screens.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::common::{StakingParams, TokenAmount, Validator};
use crate::config::ChainConfig;

/// A validator enriched with the caller's aggregated stake.
#[derive(Clone, Debug, PartialEq)]
pub struct StakeHolder {
    pub validator: Validator,

    /// The caller's total delegation to this validator, in display units.
    pub amount: TokenAmount,

    /// The chain this stake lives on.
    pub coin: Arc<ChainConfig>,
}

/// Validators the caller has stake with, ordered by the approved list.
pub type StakeHolderList = Vec<StakeHolder>;

/// One row of the dashboard summary list.
#[derive(Clone, Debug, PartialEq)]
pub struct CoinDescriptor {
    pub config: Arc<ChainConfig>,

    /// Best annual reward rate among the chain's approved validators.
    pub annual: Decimal,

    /// Available balance, formatted to two decimal places, rounded down.
    pub available: String,

    /// Total amount still unbonding. Zero when the fetch fails.
    pub pending: TokenAmount,

    /// Next release date of unbonding stake, if any is pending.
    pub unstaking_date: Option<DateTime<Utc>>,

    pub staking: StakingParams,
}

/// Maximum stakeable amounts, net of fee headroom.
///
/// `normal` keeps two fees in reserve (one for the stake, one for a later
/// unstake); `min` keeps only one. Both clamp at zero. The staking form warns
/// between the two and blocks above `min`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaxStake {
    pub normal: TokenAmount,
    pub min: TokenAmount,
}
