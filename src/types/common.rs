//! Primitive types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{self, Display, Formatter};

pub use url::Url;

/// An opaque account identifier on one chain.
pub type Address = String;

/// A quantity of tokens.
///
/// All monetary amounts in this crate are arbitrary-precision decimals;
/// native floating point would drift on the rounding-sensitive sums the
/// aggregator performs.
pub type TokenAmount = Decimal;

/// Identifier of a supported coin/chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinId {
    Cosmos,
    Tron,
}

impl CoinId {
    /// The lowercase chain name used in directory and rate endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosmos => "cosmos",
            Self::Tron => "tron",
        }
    }
}

impl Display for CoinId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The annual reward a validator pays out.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ValidatorReward {
    /// Annual rate, as a percentage.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub annual: Decimal,
}

/// An approved validator, as published by the directory service.
///
/// Immutable snapshot per fetch; the directory is polled, not diffed.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Validator {
    /// Address-like identifier of the validator.
    pub id: Address,

    /// Human-readable name.
    #[serde(default)]
    pub name: String,

    /// Longer description of the operator.
    #[serde(default)]
    pub description: Option<String>,

    /// Operator website.
    #[serde(default)]
    pub website: Option<Url>,

    /// Whether the directory currently marks this validator as active.
    #[serde(default = "default_true")]
    pub status: bool,

    /// Reward terms.
    #[serde(default)]
    pub reward: ValidatorReward,
}

fn default_true() -> bool {
    true
}

/// Stake held by the current address at one validator.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Delegation {
    /// The validator being delegated to.
    pub validator: Address,

    /// Delegated amount, in base units.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount: TokenAmount,
}

/// One pending tranche of an unbonding delegation.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct UnbondEntry {
    /// Amount waiting to become liquid, in base units.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub balance: TokenAmount,

    /// When this tranche is released.
    pub release_date: DateTime<Utc>,
}

/// An unbonding delegation: stake on its way out of a validator.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Unbond {
    /// The validator the stake is leaving.
    pub validator: Address,

    /// Pending tranches, one per unstake request.
    #[serde(default)]
    pub entries: Vec<UnbondEntry>,
}

impl Unbond {
    /// Total amount still waiting to be released.
    pub fn pending_balance(&self) -> TokenAmount {
        self.entries.iter().map(|entry| entry.balance).sum()
    }
}

/// Network-wide staking parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StakingParams {
    /// Length of the unbonding period, in days.
    pub unbonding_days: u64,
}

/// A balance of one denomination held by an account.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CoinBalance {
    pub denom: String,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount: TokenAmount,
}

/// On-chain account state, fetched fresh before building a transaction.
///
/// `sequence` is single-use: a skeleton built from a stale sequence is
/// rejected by the chain, which is why account state is never cached.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ChainAccount {
    pub address: Address,
    pub account_number: u64,
    pub sequence: u64,

    #[serde(default)]
    pub coins: Vec<CoinBalance>,
}

impl ChainAccount {
    /// The balance held in the given denomination, zero if absent.
    pub fn balance_of(&self, denom: &str) -> TokenAmount {
        self.coins
            .iter()
            .find(|coin| coin.denom.eq_ignore_ascii_case(denom))
            .map(|coin| coin.amount)
            .unwrap_or_default()
    }
}

/// An account exposed by the wallet provider.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct WalletAccount {
    /// The chain this account lives on.
    pub network: CoinId,

    pub address: Address,
}

/// Decode a decimal amount from a number, a numeric string, or nothing.
///
/// Upstream services are inconsistent about how they encode amounts, and
/// occasionally omit or mangle them; a malformed amount decodes as zero
/// rather than failing the whole response.
pub(crate) fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Decimal(Decimal),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Decimal(value) => value,
        Raw::Text(text) => text.trim().parse().unwrap_or_default(),
        Raw::Other(_) => Decimal::ZERO,
    })
}
