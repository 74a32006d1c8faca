//! HTTP implementation of [`ChainRpc`] against an LCD-style REST node.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::json;
use url::Url;

use crate::{
    Error, Result,
    input::rpc::ChainRpc,
    types::{
        common::{
            Address, ChainAccount, CoinBalance, Delegation, StakingParams, TokenAmount, Unbond,
            UnbondEntry, lenient_decimal,
        },
        tx::{BroadcastResult, SignedTx, StakingTx},
    },
};

#[derive(Clone, Debug)]
pub struct HttpRpc {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpRpc {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.endpoint.as_str().trim_end_matches('/'))
    }

    /// GET a JSON resource.
    ///
    /// A 404 means the resource does not exist for this account (no staking
    /// history, no unbonds) and maps to [`Error::unavailable`]; anything else
    /// that fails is an upstream fetch error.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        tracing::debug!(path, "rpc query");
        let response = self.http.get(self.url(path)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::unavailable().context(path.to_string()));
        }
        let response = response
            .error_for_status()
            .map_err(|err| Error::from(err).context(path.to_string()))?;
        Ok(response.json().await?)
    }
}

impl ChainRpc for HttpRpc {
    async fn account(&self, address: &Address) -> Result<ChainAccount> {
        let wire: Wrapped<AccountWire> = self.get(&format!("auth/accounts/{address}")).await?;
        Ok(wire.result.into())
    }

    async fn delegations(&self, address: &Address) -> Result<Vec<Delegation>> {
        let wire: Wrapped<Vec<DelegationWire>> = self
            .get(&format!("staking/delegators/{address}/delegations"))
            .await?;
        Ok(wire.result.into_iter().map(Into::into).collect())
    }

    async fn unbonding_delegations(&self, address: &Address) -> Result<Vec<Unbond>> {
        let wire: Wrapped<Vec<UnbondWire>> = self
            .get(&format!("staking/delegators/{address}/unbonding_delegations"))
            .await?;
        Ok(wire.result.into_iter().map(Into::into).collect())
    }

    async fn staking_parameters(&self) -> Result<StakingParams> {
        let wire: Wrapped<ParamsWire> = self.get("staking/parameters").await?;
        Ok(wire.result.into())
    }

    async fn rewards(&self, address: &Address) -> Result<TokenAmount> {
        let wire: Wrapped<Vec<CoinBalance>> = self
            .get(&format!("distribution/delegators/{address}/rewards"))
            .await?;
        Ok(wire.result.into_iter().map(|coin| coin.amount).sum())
    }

    async fn unstaking_release_date(&self, address: &Address) -> Result<DateTime<Utc>> {
        // The node has no dedicated endpoint for this; the next release is
        // the earliest completion time across unbonding tranches.
        let unbonds = self.unbonding_delegations(address).await?;
        unbonds
            .iter()
            .flat_map(|unbond| unbond.entries.iter())
            .map(|entry| entry.release_date)
            .min()
            .ok_or_else(|| Error::unavailable().context("no unbonding delegations"))
    }

    async fn broadcast_transaction(&self, tx: &SignedTx) -> Result<BroadcastResult> {
        tracing::debug!("broadcasting transaction");
        let response = self
            .http
            .post(self.url("txs"))
            .json(&json!({ "tx": tx, "mode": "sync" }))
            .send()
            .await?
            .error_for_status()
            .map_err(|err| Error::from(err).context("broadcast"))?;
        Ok(response.json().await?)
    }

    async fn staking_transactions(&self, address: &Address) -> Result<Vec<StakingTx>> {
        let wire: TxPage = self
            .get(&format!("txs?message.sender={address}&limit=100"))
            .await?;
        Ok(wire.txs)
    }

    async fn chain_id(&self) -> Result<String> {
        let wire: NodeInfo = self.get("node_info").await?;
        Ok(wire.node_info.network)
    }
}

// LCD responses wrap their payload in a `result` envelope, with numbers as
// strings. The wire structs below decode that shape and convert into the
// domain types.

#[derive(Debug, Deserialize)]
struct Wrapped<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct AccountWire {
    address: Address,

    #[serde(default, deserialize_with = "u64_from_string")]
    account_number: u64,

    #[serde(default, deserialize_with = "u64_from_string")]
    sequence: u64,

    #[serde(default)]
    coins: Vec<CoinBalance>,
}

impl From<AccountWire> for ChainAccount {
    fn from(wire: AccountWire) -> Self {
        Self {
            address: wire.address,
            account_number: wire.account_number,
            sequence: wire.sequence,
            coins: wire.coins,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DelegationWire {
    validator_address: Address,

    /// Share-denominated stake; treated as the delegated amount.
    #[serde(default, deserialize_with = "lenient_decimal")]
    shares: TokenAmount,
}

impl From<DelegationWire> for Delegation {
    fn from(wire: DelegationWire) -> Self {
        Self {
            validator: wire.validator_address,
            amount: wire.shares,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UnbondEntryWire {
    #[serde(default, deserialize_with = "lenient_decimal")]
    balance: TokenAmount,

    completion_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct UnbondWire {
    validator_address: Address,

    #[serde(default)]
    entries: Vec<UnbondEntryWire>,
}

impl From<UnbondWire> for Unbond {
    fn from(wire: UnbondWire) -> Self {
        Self {
            validator: wire.validator_address,
            entries: wire
                .entries
                .into_iter()
                .map(|entry| UnbondEntry {
                    balance: entry.balance,
                    release_date: entry.completion_time,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ParamsWire {
    /// Unbonding period in nanoseconds, as a string.
    #[serde(default, deserialize_with = "u64_from_string")]
    unbonding_time: u64,
}

impl From<ParamsWire> for StakingParams {
    fn from(wire: ParamsWire) -> Self {
        const NANOS_PER_DAY: u64 = 24 * 60 * 60 * 1_000_000_000;
        Self {
            unbonding_days: wire.unbonding_time / NANOS_PER_DAY,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TxPage {
    #[serde(default)]
    txs: Vec<StakingTx>,
}

#[derive(Debug, Deserialize)]
struct NodeInfo {
    node_info: NodeInfoInner,
}

#[derive(Debug, Deserialize)]
struct NodeInfoInner {
    network: String,
}

/// Decode a u64 that may arrive as a number or a decimal string.
fn u64_from_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}
