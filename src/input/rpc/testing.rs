#![cfg(any(test, feature = "testing"))]

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    Error, Result,
    input::rpc::ChainRpc,
    types::{
        common::{Address, ChainAccount, Delegation, StakingParams, TokenAmount, Unbond},
        tx::{BroadcastResult, SignedTx, StakingTx},
    },
};

/// A chain RPC preloaded with state, with per-method error injection.
#[derive(Clone, Debug, Default)]
pub struct MockRpc {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug)]
struct Inner {
    account: Option<ChainAccount>,
    delegations: Vec<Delegation>,
    unbonds: Vec<Unbond>,
    params: StakingParams,
    rewards: TokenAmount,
    staking_txs: Vec<StakingTx>,
    broadcasts: Vec<SignedTx>,
    chain_id: String,
    reject_broadcast: bool,
    failing: HashSet<&'static str>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            account: None,
            delegations: vec![],
            unbonds: vec![],
            params: StakingParams { unbonding_days: 21 },
            rewards: TokenAmount::ZERO,
            staking_txs: vec![],
            broadcasts: vec![],
            chain_id: "mockhub-1".to_string(),
            reject_broadcast: false,
            failing: HashSet::new(),
        }
    }
}

impl MockRpc {
    pub async fn set_account(&self, account: ChainAccount) {
        self.inner.write().await.account = Some(account);
    }

    pub async fn set_delegations(&self, delegations: impl IntoIterator<Item = Delegation>) {
        self.inner.write().await.delegations = delegations.into_iter().collect();
    }

    pub async fn set_unbonds(&self, unbonds: impl IntoIterator<Item = Unbond>) {
        self.inner.write().await.unbonds = unbonds.into_iter().collect();
    }

    pub async fn set_rewards(&self, rewards: TokenAmount) {
        self.inner.write().await.rewards = rewards;
    }

    /// Make a transaction appear in the recent staking transactions list, as
    /// a confirmed broadcast eventually would.
    pub async fn push_staking_transaction(&self, tx: StakingTx) {
        self.inner.write().await.staking_txs.push(tx);
    }

    /// Make the named method fail until restored.
    pub async fn fail(&self, method: &'static str) {
        self.inner.write().await.failing.insert(method);
    }

    pub async fn restore(&self, method: &'static str) {
        self.inner.write().await.failing.remove(method);
    }

    /// Make broadcasts come back with a non-zero result code.
    pub async fn reject_broadcast(&self) {
        self.inner.write().await.reject_broadcast = true;
    }

    /// Every signed transaction this mock has received for broadcast.
    pub async fn broadcasts(&self) -> Vec<SignedTx> {
        self.inner.read().await.broadcasts.clone()
    }
}

impl Inner {
    fn mock_errors(&self, method: &'static str) -> Result<()> {
        if self.failing.contains(method) {
            return Err(Error::fetch().context(format!("mock error: {method} is failing")));
        }
        Ok(())
    }
}

impl ChainRpc for MockRpc {
    async fn account(&self, address: &Address) -> Result<ChainAccount> {
        let inner = self.inner.read().await;
        inner.mock_errors("account")?;
        inner
            .account
            .clone()
            .filter(|account| &account.address == address)
            .ok_or_else(|| Error::unavailable().context(format!("no account {address}")))
    }

    async fn delegations(&self, _address: &Address) -> Result<Vec<Delegation>> {
        let inner = self.inner.read().await;
        inner.mock_errors("delegations")?;
        Ok(inner.delegations.clone())
    }

    async fn unbonding_delegations(&self, _address: &Address) -> Result<Vec<Unbond>> {
        let inner = self.inner.read().await;
        inner.mock_errors("unbonding_delegations")?;
        Ok(inner.unbonds.clone())
    }

    async fn staking_parameters(&self) -> Result<StakingParams> {
        let inner = self.inner.read().await;
        inner.mock_errors("staking_parameters")?;
        Ok(inner.params)
    }

    async fn rewards(&self, _address: &Address) -> Result<TokenAmount> {
        let inner = self.inner.read().await;
        inner.mock_errors("rewards")?;
        Ok(inner.rewards)
    }

    async fn unstaking_release_date(&self, _address: &Address) -> Result<DateTime<Utc>> {
        let inner = self.inner.read().await;
        inner.mock_errors("unstaking_release_date")?;
        inner
            .unbonds
            .iter()
            .flat_map(|unbond| unbond.entries.iter())
            .map(|entry| entry.release_date)
            .min()
            .ok_or_else(|| Error::unavailable().context("no unbonding delegations"))
    }

    async fn broadcast_transaction(&self, tx: &SignedTx) -> Result<BroadcastResult> {
        let mut inner = self.inner.write().await;
        inner.mock_errors("broadcast_transaction")?;
        inner.broadcasts.push(tx.clone());
        let txhash = format!("TX{:04}", inner.broadcasts.len());
        if inner.reject_broadcast {
            return Ok(BroadcastResult {
                txhash,
                code: 4,
                raw_log: Some("mock error: out of gas".to_string()),
            });
        }
        Ok(BroadcastResult {
            txhash,
            code: 0,
            raw_log: None,
        })
    }

    async fn staking_transactions(&self, _address: &Address) -> Result<Vec<StakingTx>> {
        let inner = self.inner.read().await;
        inner.mock_errors("staking_transactions")?;
        Ok(inner.staking_txs.clone())
    }

    async fn chain_id(&self) -> Result<String> {
        let inner = self.inner.read().await;
        inner.mock_errors("chain_id")?;
        Ok(inner.chain_id.clone())
    }
}
