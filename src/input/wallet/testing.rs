#![cfg(any(test, feature = "testing"))]

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    Error, Result,
    input::wallet::WalletProvider,
    types::{
        common::{CoinId, WalletAccount},
        tx::{SignedTx, TxSkeleton},
    },
};

/// A wallet provider preloaded with accounts, recording what it signs.
#[derive(Clone, Debug, Default)]
pub struct MockWallet {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: Vec<WalletAccount>,
    signed: Vec<(CoinId, TxSkeleton)>,
    deny_signing: bool,
}

impl MockWallet {
    pub fn with_accounts(accounts: impl IntoIterator<Item = WalletAccount>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                accounts: accounts.into_iter().collect(),
                ..Default::default()
            })),
        }
    }

    pub async fn set_accounts(&self, accounts: impl IntoIterator<Item = WalletAccount>) {
        self.inner.write().await.accounts = accounts.into_iter().collect();
    }

    /// Reject the next and all further signing requests, as a user declining
    /// in the wallet UI would.
    pub async fn deny_signing(&self) {
        self.inner.write().await.deny_signing = true;
    }

    /// Every skeleton this wallet has signed, in order.
    pub async fn signed(&self) -> Vec<(CoinId, TxSkeleton)> {
        self.inner.read().await.signed.clone()
    }
}

impl WalletProvider for MockWallet {
    fn is_available(&self) -> bool {
        true
    }

    async fn accounts(&self) -> Result<Vec<WalletAccount>> {
        Ok(self.inner.read().await.accounts.clone())
    }

    async fn sign_transaction(&self, coin: CoinId, tx: &TxSkeleton) -> Result<SignedTx> {
        let mut inner = self.inner.write().await;
        if inner.deny_signing {
            return Err(Error::transaction().context("mock error: signing denied"));
        }
        inner.signed.push((coin, tx.clone()));
        // A deterministic stand-in for the provider's signed hex.
        Ok(format!("aabb{:04x}", inner.signed.len()))
    }
}
