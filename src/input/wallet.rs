//! The delegated signing provider, and session address resolution.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::{
    Error, Result,
    types::{
        common::{Address, CoinId, WalletAccount},
        tx::{SignedTx, TxSkeleton},
    },
};

pub mod testing;

/// Interface to the injected wallet provider.
///
/// Signing is fully delegated: this service never sees key material, only the
/// signed transaction hex the provider hands back.
pub trait WalletProvider: Clone + Send + Sync {
    /// Whether a provider is injected in this session.
    fn is_available(&self) -> bool;

    /// The accounts the provider exposes, one per chain it supports.
    fn accounts(&self) -> impl Send + Future<Output = Result<Vec<WalletAccount>>>;

    /// Sign a transaction skeleton for the given chain.
    fn sign_transaction(
        &self,
        coin: CoinId,
        tx: &TxSkeleton,
    ) -> impl Send + Future<Output = Result<SignedTx>>;
}

/// A provider for sessions where no wallet is injected.
///
/// Read operations still work against a fallback address (see
/// [`AccountResolver`]); signing is impossible and fails accordingly.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullWallet;

impl WalletProvider for NullWallet {
    fn is_available(&self) -> bool {
        false
    }

    async fn accounts(&self) -> Result<Vec<WalletAccount>> {
        Err(Error::unavailable().context("no wallet provider is injected"))
    }

    async fn sign_transaction(&self, _coin: CoinId, _tx: &TxSkeleton) -> Result<SignedTx> {
        Err(Error::transaction().context("cannot sign without a wallet provider"))
    }
}

/// Resolves the session address for one chain.
///
/// The address is resolved at most once per session and cached; the rest of
/// the service treats it as immutable (re-resolution on wallet change is out
/// of scope).
#[derive(Clone, Debug)]
pub struct AccountResolver<W> {
    wallet: W,
    coin: CoinId,
    fallback: Option<Address>,
    cached: Arc<OnceCell<Address>>,
}

impl<W: WalletProvider> AccountResolver<W> {
    pub fn new(wallet: W, coin: CoinId, fallback: Option<Address>) -> Self {
        Self {
            wallet,
            coin,
            fallback,
            cached: Arc::new(OnceCell::new()),
        }
    }

    /// The session address, resolving it on first use.
    pub async fn address(&self) -> Result<Address> {
        self.cached
            .get_or_try_init(|| self.resolve())
            .await
            .cloned()
    }

    async fn resolve(&self) -> Result<Address> {
        if !self.wallet.is_available() {
            let address = self.fallback.clone().ok_or_else(|| {
                Error::unavailable().context("no wallet provider and no fallback address")
            })?;
            tracing::warn!(%address, "no wallet provider injected, using fallback address");
            return Ok(address);
        }

        let accounts = self.wallet.accounts().await?;
        accounts
            .into_iter()
            .find(|account| account.network == self.coin)
            .map(|account| account.address)
            .ok_or_else(|| {
                Error::unavailable().context(format!("wallet has no account for {}", self.coin))
            })
    }
}
