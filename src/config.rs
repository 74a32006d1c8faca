//! Typed per-chain configuration.
//!
//! One [`ChainConfig`] exists per supported chain, constructed at composition
//! time and read-only afterwards. Amount fields are in base units (the
//! chain's smallest denomination); [`ChainConfig::to_coin`] and
//! [`ChainConfig::to_base`] convert between base and display units.

use rust_decimal::Decimal;
use std::time::Duration;
use url::Url;

use crate::types::common::{Address, CoinId, TokenAmount};

/// How often the available balance is refreshed in the background.
pub const BALANCE_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// How often the staked amount is refreshed. Deliberately offset from the
/// balance interval so the two streams stay independent time series.
pub const STAKE_REFRESH_INTERVAL: Duration = Duration::from_secs(115);

/// How often the fiat exchange rate is refreshed.
pub const RATE_REFRESH_INTERVAL: Duration = Duration::from_secs(120);

/// How often the recent-transactions list is polled while waiting for a
/// broadcast transaction to confirm.
pub const TX_WAIT_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Static descriptor of one supported chain.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainConfig {
    pub coin: CoinId,

    /// Network name used in routes and logs.
    pub network: String,

    /// Ticker symbol shown to the user.
    pub currency_symbol: String,

    /// Base denomination used on the wire.
    pub denom: String,

    /// Number of decimal places between base and display units.
    pub decimals: u32,

    /// Node/indexer endpoint for this chain.
    pub endpoint: Url,

    /// Gas limit for stake/unstake transactions.
    pub gas: u64,

    /// Flat fee for stake/unstake transactions, in base units.
    pub fee: TokenAmount,

    /// Session address to fall back to when no wallet provider is injected.
    pub fallback_address: Option<Address>,

    pub balance_refresh_interval: Duration,
    pub stake_refresh_interval: Duration,
    pub rate_refresh_interval: Duration,
    pub tx_wait_check_interval: Duration,
}

impl ChainConfig {
    /// The Cosmos hub configuration.
    pub fn cosmos(endpoint: Url) -> Self {
        Self {
            coin: CoinId::Cosmos,
            network: "cosmos".to_string(),
            currency_symbol: "ATOM".to_string(),
            denom: "uatom".to_string(),
            decimals: 6,
            endpoint,
            gas: 200_000,
            fee: Decimal::from(5000u64),
            fallback_address: None,
            balance_refresh_interval: BALANCE_REFRESH_INTERVAL,
            stake_refresh_interval: STAKE_REFRESH_INTERVAL,
            rate_refresh_interval: RATE_REFRESH_INTERVAL,
            tx_wait_check_interval: TX_WAIT_CHECK_INTERVAL,
        }
    }

    /// Convert an amount in base units to display units.
    pub fn to_coin(&self, base: TokenAmount) -> TokenAmount {
        base / self.unit()
    }

    /// Convert an amount in display units to base units.
    pub fn to_base(&self, coin: TokenAmount) -> TokenAmount {
        coin * self.unit()
    }

    fn unit(&self) -> Decimal {
        Decimal::from(10u64.pow(self.decimals))
    }
}
