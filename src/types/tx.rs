//! Transaction construction and broadcast types.
//!
//! A [`TxSkeleton`] is built fresh for every stake/unstake operation from the
//! latest on-chain account state, handed to the wallet provider for signing,
//! broadcast, and then discarded; nothing here outlives the in-flight
//! operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::Address;

/// The two directions a staking transaction can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum StakeAction {
    Stake,
    Unstake,
}

/// An amount in wire format: the signing provider expects string amounts.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CoinAmount {
    pub denom: String,
    pub amount: String,
}

/// Fee section of a transaction skeleton.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Fee {
    pub amounts: Vec<CoinAmount>,
    pub gas: String,
}

/// The type-specific payload of a stake or unstake message.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxPayload {
    pub delegator_address: Address,
    pub validator_address: Address,
    pub amount: CoinAmount,
}

/// The message attached to a skeleton.
///
/// Serialized externally tagged, so the signed JSON carries a `stakeMessage`
/// or `unstakeMessage` key, which is what the wallet provider dispatches on.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum TxMessage {
    #[serde(rename = "stakeMessage")]
    Stake(TxPayload),

    #[serde(rename = "unstakeMessage")]
    Unstake(TxPayload),
}

/// The unsigned structural template of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxSkeleton {
    pub type_prefix: String,
    pub account_number: u64,
    pub sequence: u64,
    pub chain_id: String,
    pub fee: Fee,

    #[serde(flatten)]
    pub message: TxMessage,
}

/// A signed transaction, hex-encoded by the wallet provider.
pub type SignedTx = String;

/// The node's response to a broadcast.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct BroadcastResult {
    pub txhash: String,

    /// Zero (or absent) means the transaction was accepted into the mempool.
    #[serde(default)]
    pub code: u32,

    #[serde(default)]
    pub raw_log: Option<String>,
}

impl BroadcastResult {
    pub fn is_accepted(&self) -> bool {
        self.code == 0
    }
}

/// A confirmed staking transaction from the chain's recent-transactions list.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct StakingTx {
    pub txhash: String,

    #[serde(default)]
    pub height: Option<u64>,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}
