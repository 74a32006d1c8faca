//! The Cosmos implementation of the coin service.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt, future, join, try_join};
use rust_decimal::Decimal;
use tokio::time::sleep;
use tracing::instrument;

use crate::{
    Error, Result,
    aggregate::aggregate_delegations,
    coin::CoinService,
    config::ChainConfig,
    error::{ErrorKind, ensure},
    input::{
        directory::ValidatorDirectory,
        rates::RateSource,
        rpc::ChainRpc,
        wallet::{AccountResolver, WalletProvider},
    },
    stream::{RefreshHandle, combine_latest, poll_stream},
    types::{
        common::{Address, ChainAccount, Delegation, StakingParams, TokenAmount, Unbond, Validator},
        dashboard::{MaxStake, StakeHolderList},
        tx::{
            BroadcastResult, CoinAmount, Fee, SignedTx, StakeAction, StakingTx, TxMessage,
            TxPayload, TxSkeleton,
        },
    },
};

/// Per-chain facade over balance, staking, and transaction operations for the
/// Cosmos hub, composed once at startup from its four collaborators.
#[derive(Clone, Debug)]
pub struct CosmosService<R, W, D, X> {
    config: Arc<ChainConfig>,
    rpc: R,
    wallet: W,
    directory: D,
    rates: X,
    resolver: AccountResolver<W>,
    refresh: RefreshHandle,
}

impl<R, W, D, X> CosmosService<R, W, D, X>
where
    R: ChainRpc,
    W: WalletProvider,
    D: ValidatorDirectory,
    X: RateSource,
{
    pub fn new(
        config: Arc<ChainConfig>,
        rpc: R,
        wallet: W,
        directory: D,
        rates: X,
        refresh: RefreshHandle,
    ) -> Self {
        let resolver =
            AccountResolver::new(wallet.clone(), config.coin, config.fallback_address.clone());
        Self {
            config,
            rpc,
            wallet,
            directory,
            rates,
            resolver,
            refresh,
        }
    }

    /// Fresh on-chain state for the session account.
    async fn session_account(&self) -> Result<ChainAccount> {
        let address = self.resolver.address().await?;
        self.rpc.account(&address).await
    }

    async fn session_delegations(&self) -> Result<Vec<Delegation>> {
        let address = self.resolver.address().await?;
        self.rpc.delegations(&address).await
    }

    async fn session_unbonds(&self) -> Result<Vec<Unbond>> {
        let address = self.resolver.address().await?;
        self.rpc.unbonding_delegations(&address).await
    }

    fn tx_payload(
        &self,
        delegator: &Address,
        validator: &Address,
        amount: TokenAmount,
    ) -> TxPayload {
        TxPayload {
            delegator_address: delegator.clone(),
            validator_address: validator.clone(),
            amount: CoinAmount {
                denom: self.config.denom.clone(),
                amount: amount.normalize().to_string(),
            },
        }
    }

    async fn tx_skeleton(&self, account: &ChainAccount, message: TxMessage) -> Result<TxSkeleton> {
        let chain_id = self.rpc.chain_id().await?;
        Ok(TxSkeleton {
            type_prefix: "auth/StdTx".to_string(),
            account_number: account.account_number,
            sequence: account.sequence,
            chain_id,
            fee: Fee {
                amounts: vec![CoinAmount {
                    denom: self.config.denom.clone(),
                    amount: self.config.fee.normalize().to_string(),
                }],
                gas: self.config.gas.to_string(),
            },
            message,
        })
    }
}

/// The highest annual reward rate offered by any listed validator.
fn best_annual_rate(validators: &[Validator]) -> Decimal {
    validators
        .iter()
        .map(|validator| validator.reward.annual)
        .max()
        .unwrap_or_default()
}

impl<R, W, D, X> CoinService for CosmosService<R, W, D, X>
where
    R: ChainRpc + 'static,
    W: WalletProvider + 'static,
    D: ValidatorDirectory + 'static,
    X: RateSource + 'static,
{
    fn config(&self) -> &Arc<ChainConfig> {
        &self.config
    }

    async fn address(&self) -> Result<Address> {
        self.resolver.address().await
    }

    async fn balance(&self) -> Result<TokenAmount> {
        let account = self.session_account().await?;
        Ok(self.config.to_coin(account.balance_of(&self.config.denom)))
    }

    async fn staked(&self) -> Result<TokenAmount> {
        // An account that has never staked is routine, and a transient gap
        // must not break the dashboard: every failure mode reads as zero.
        match self.session_delegations().await {
            Ok(delegations) => {
                let total: TokenAmount = delegations
                    .iter()
                    .map(|delegation| delegation.amount)
                    .sum();
                Ok(self.config.to_coin(total))
            }
            Err(err) => {
                tracing::debug!("staked amount unavailable, reading as zero: {err:#}");
                Ok(TokenAmount::ZERO)
            }
        }
    }

    async fn price_usd(&self) -> Result<Decimal> {
        self.rates.rate(self.config.coin).await
    }

    async fn balance_usd(&self) -> Result<Decimal> {
        let (balance, rate) = try_join!(self.balance(), self.price_usd())?;
        Ok(balance * rate)
    }

    async fn staked_usd(&self) -> Result<Decimal> {
        let (staked, rate) = try_join!(self.staked(), self.price_usd())?;
        Ok(staked * rate)
    }

    async fn annual_percent(&self) -> Result<Decimal> {
        let validators = self.validators().await?;
        Ok(best_annual_rate(&validators))
    }

    async fn stake_holders(&self) -> Result<StakeHolderList> {
        // Fail-soft: a transient gap on either input yields an empty view
        // rather than crashing the screen.
        let (validators, delegations) = join!(self.validators(), self.session_delegations());
        let validators = validators.unwrap_or_else(|err| {
            tracing::debug!("validator list unavailable, showing no stake holders: {err:#}");
            vec![]
        });
        let delegations = delegations.unwrap_or_else(|err| {
            tracing::debug!("delegations unavailable, showing no stake holders: {err:#}");
            vec![]
        });
        Ok(aggregate_delegations(&validators, &delegations, &self.config))
    }

    async fn staked_to_validator(&self, validator: &Address) -> Result<TokenAmount> {
        let holders = self.stake_holders().await?;
        Ok(holders
            .into_iter()
            .find(|holder| &holder.validator.id == validator)
            .map(|holder| holder.amount)
            .unwrap_or_default())
    }

    async fn validators(&self) -> Result<Vec<Validator>> {
        self.directory.validators(self.config.coin).await
    }

    async fn validator_by_id(&self, id: &Address) -> Result<Validator> {
        self.directory.validator_by_id(self.config.coin, id).await
    }

    async fn pending_balance(&self) -> Result<TokenAmount> {
        match self.session_unbonds().await {
            Ok(unbonds) => {
                let total: TokenAmount = unbonds.iter().map(Unbond::pending_balance).sum();
                Ok(self.config.to_coin(total))
            }
            Err(err) if err.kind() == ErrorKind::Unavailable => Ok(TokenAmount::ZERO),
            Err(err) => Err(err),
        }
    }

    async fn staking_rewards(&self) -> Result<TokenAmount> {
        let address = self.resolver.address().await?;
        match self.rpc.rewards(&address).await {
            Ok(rewards) => Ok(self.config.to_coin(rewards)),
            Err(err) if err.kind() == ErrorKind::Unavailable => Ok(TokenAmount::ZERO),
            Err(err) => Err(err),
        }
    }

    async fn unstaking_date(&self) -> Result<DateTime<Utc>> {
        let address = self.resolver.address().await?;
        self.rpc.unstaking_release_date(&address).await
    }

    async fn staking_parameters(&self) -> Result<StakingParams> {
        self.rpc.staking_parameters().await
    }

    async fn max_stake(&self) -> Result<MaxStake> {
        let balance = self.balance().await?;
        let fee = self.config.to_coin(self.config.fee);
        Ok(MaxStake {
            normal: (balance - fee * Decimal::TWO).max(Decimal::ZERO),
            min: (balance - fee).max(Decimal::ZERO),
        })
    }

    #[instrument(skip(self), fields(network = %self.config.network))]
    async fn prepare_stake_tx(
        &self,
        action: StakeAction,
        validator: &Address,
        amount: TokenAmount,
    ) -> Result<StakingTx> {
        if action == StakeAction::Stake {
            let max = self.max_stake().await?;
            ensure!(max.normal > Decimal::ZERO, Error::insufficient_funds());
        }

        let address = self.resolver.address().await?;
        // Account state is fetched fresh so the skeleton carries the latest
        // sequence number; a stale sequence is rejected by the chain.
        let account = self.rpc.account(&address).await?;

        let payload = self.tx_payload(&address, validator, amount);
        let message = match action {
            StakeAction::Stake => TxMessage::Stake(payload),
            StakeAction::Unstake => TxMessage::Unstake(payload),
        };
        let skeleton = self.tx_skeleton(&account, message).await?;

        let signed = self
            .wallet
            .sign_transaction(self.config.coin, &skeleton)
            .await?;
        let result = self.broadcast(&signed).await?;
        ensure!(
            result.is_accepted(),
            Error::transaction().context(format!(
                "broadcast rejected with code {}: {}",
                result.code,
                result.raw_log.as_deref().unwrap_or("no log")
            ))
        );

        tracing::info!(txhash = %result.txhash, "transaction broadcast, waiting for confirmation");
        self.wait_for_confirmation(&result.txhash, None).await
    }

    async fn broadcast(&self, tx: &SignedTx) -> Result<BroadcastResult> {
        self.rpc.broadcast_transaction(tx).await
    }

    async fn wait_for_confirmation(
        &self,
        txhash: &str,
        deadline: Option<Duration>,
    ) -> Result<StakingTx> {
        let address = self.resolver.address().await?;
        let started = tokio::time::Instant::now();
        loop {
            sleep(self.config.tx_wait_check_interval).await;
            if let Some(deadline) = deadline {
                ensure!(
                    started.elapsed() < deadline,
                    Error::timeout()
                        .context(format!("transaction {txhash} not confirmed in {deadline:?}"))
                );
            }
            match self.rpc.staking_transactions(&address).await {
                Ok(txs) => {
                    if let Some(tx) = txs.into_iter().find(|tx| tx.txhash == txhash) {
                        tracing::info!(txhash, "transaction confirmed");
                        return Ok(tx);
                    }
                    tracing::debug!(txhash, "transaction not yet in recent list");
                }
                // A failed poll is transient; the transaction may still
                // confirm, so keep watching.
                Err(err) => tracing::warn!(txhash, "confirmation poll failed: {err:#}"),
            }
        }
    }

    fn has_provider(&self) -> bool {
        self.wallet.is_available()
    }

    fn is_unstake_enabled(&self) -> bool {
        true
    }

    fn balance_stream(&self) -> impl Send + Unpin + Stream<Item = TokenAmount> {
        let service = self.clone();
        poll_stream(
            self.config.balance_refresh_interval,
            self.refresh.listen(),
            move || {
                let service = service.clone();
                async move { service.balance().await }
            },
        )
        .filter_map(|result| {
            future::ready(match result {
                Ok(balance) => Some(balance),
                Err(err) => {
                    tracing::warn!("balance refresh failed, keeping stale value: {err:#}");
                    None
                }
            })
        })
        .boxed()
    }

    fn staked_stream(&self) -> impl Send + Unpin + Stream<Item = TokenAmount> {
        let service = self.clone();
        poll_stream(
            self.config.stake_refresh_interval,
            self.refresh.listen(),
            move || {
                let service = service.clone();
                async move { service.staked().await }
            },
        )
        .map(|result| result.unwrap_or_default())
        .boxed()
    }

    fn rate_stream(&self) -> impl Send + Unpin + Stream<Item = Decimal> {
        let service = self.clone();
        poll_stream(
            self.config.rate_refresh_interval,
            self.refresh.listen(),
            move || {
                let service = service.clone();
                async move { service.price_usd().await }
            },
        )
        .filter_map(|result| {
            future::ready(match result {
                Ok(rate) => Some(rate),
                Err(err) => {
                    tracing::warn!("rate refresh failed, keeping stale value: {err:#}");
                    None
                }
            })
        })
        .boxed()
    }

    fn balance_usd_stream(&self) -> impl Send + Unpin + Stream<Item = Decimal> {
        combine_latest(self.balance_stream(), self.rate_stream())
            .map(|(balance, rate)| balance * rate)
            .boxed()
    }

    fn staked_usd_stream(&self) -> impl Send + Unpin + Stream<Item = Decimal> {
        combine_latest(self.staked_stream(), self.rate_stream())
            .map(|(staked, rate)| staked * rate)
            .boxed()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{
        input::{
            directory::testing::{MockDirectory, validator},
            rates::testing::MockRateSource,
            rpc::testing::MockRpc,
            wallet::testing::MockWallet,
        },
        types::common::{CoinBalance, CoinId, UnbondEntry, WalletAccount},
    };
    use rust_decimal_macros::dec;
    use tokio::{task::spawn, time::Instant};

    const ADDRESS: &str = "cosmos1abc";

    type Service = CosmosService<MockRpc, MockWallet, MockDirectory, MockRateSource>;

    fn cosmos_account(sequence: u64, uatom: TokenAmount) -> ChainAccount {
        ChainAccount {
            address: ADDRESS.into(),
            account_number: 482,
            sequence,
            coins: vec![CoinBalance {
                denom: "uatom".into(),
                amount: uatom,
            }],
        }
    }

    struct Fixture {
        rpc: MockRpc,
        wallet: MockWallet,
        directory: MockDirectory,
        rates: MockRateSource,
        refresh: RefreshHandle,
        service: Service,
    }

    fn fixture() -> Fixture {
        let rpc = MockRpc::default();
        let wallet = MockWallet::with_accounts([WalletAccount {
            network: CoinId::Cosmos,
            address: ADDRESS.into(),
        }]);
        let directory = MockDirectory::with_validators([validator("val1", dec!(10))]);
        let rates = MockRateSource::with_price(dec!(7.25));
        let refresh = RefreshHandle::new();

        let config = Arc::new(ChainConfig::cosmos("http://localhost:1317".parse().unwrap()));
        let service = CosmosService::new(
            config,
            rpc.clone(),
            wallet.clone(),
            directory.clone(),
            rates.clone(),
            refresh.clone(),
        );
        Fixture {
            rpc,
            wallet,
            directory,
            rates,
            refresh,
            service,
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_balance_in_display_units() {
        let f = fixture();
        f.rpc.set_account(cosmos_account(0, dec!(5000000))).await;
        assert_eq!(f.service.balance().await.unwrap(), dec!(5));
    }

    #[test_log::test(tokio::test)]
    async fn test_staked_sums_delegations() {
        let f = fixture();
        f.rpc
            .set_delegations([
                Delegation {
                    validator: "val1".into(),
                    amount: dec!(1000000),
                },
                Delegation {
                    validator: "val2".into(),
                    amount: dec!(500000),
                },
            ])
            .await;
        assert_eq!(f.service.staked().await.unwrap(), dec!(1.5));
    }

    #[test_log::test(tokio::test)]
    async fn test_staked_error_reads_as_zero() {
        let f = fixture();
        f.rpc.fail("delegations").await;
        assert_eq!(f.service.staked().await.unwrap(), TokenAmount::ZERO);
    }

    #[test_log::test(tokio::test)]
    async fn test_balance_usd_is_product() {
        let f = fixture();
        f.rpc.set_account(cosmos_account(0, dec!(5000000))).await;
        assert_eq!(f.service.balance_usd().await.unwrap(), dec!(36.25));
    }

    #[test_log::test(tokio::test)]
    async fn test_annual_percent_is_best_rate() {
        let f = fixture();
        assert_eq!(f.service.annual_percent().await.unwrap(), dec!(10));

        let f = fixture();
        f.directory
            .set_validators([
                validator("val1", dec!(10)),
                validator("val2", dec!(14.5)),
                validator("val3", dec!(7)),
            ])
            .await;
        assert_eq!(f.service.annual_percent().await.unwrap(), dec!(14.5));

        let f = fixture();
        f.directory.set_validators([]).await;
        assert_eq!(f.service.annual_percent().await.unwrap(), Decimal::ZERO);
    }

    #[test_log::test(tokio::test)]
    async fn test_stake_holders_drop_unapproved_and_sum() {
        let f = fixture();
        f.rpc
            .set_delegations([
                Delegation {
                    validator: "val1".into(),
                    amount: dec!(5),
                },
                Delegation {
                    validator: "val1".into(),
                    amount: dec!(3),
                },
                Delegation {
                    validator: "val2".into(),
                    amount: dec!(100),
                },
            ])
            .await;

        let holders = f.service.stake_holders().await.unwrap();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].validator.id, "val1");
        assert_eq!(holders[0].amount, f.service.config().to_coin(dec!(8)));
    }

    #[test_log::test(tokio::test)]
    async fn test_stake_holders_empty_on_directory_failure() {
        let f = fixture();
        f.rpc
            .set_delegations([Delegation {
                validator: "val1".into(),
                amount: dec!(5),
            }])
            .await;
        f.directory.fail().await;
        assert!(f.service.stake_holders().await.unwrap().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_staked_to_validator() {
        let f = fixture();
        f.rpc
            .set_delegations([Delegation {
                validator: "val1".into(),
                amount: dec!(2000000),
            }])
            .await;
        assert_eq!(
            f.service.staked_to_validator(&"val1".into()).await.unwrap(),
            dec!(2)
        );
        assert_eq!(
            f.service
                .staked_to_validator(&"val9".into())
                .await
                .unwrap(),
            TokenAmount::ZERO
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_pending_balance_sums_unbonds() {
        let f = fixture();
        assert_eq!(f.service.pending_balance().await.unwrap(), TokenAmount::ZERO);

        f.rpc
            .set_unbonds([Unbond {
                validator: "val1".into(),
                entries: vec![
                    UnbondEntry {
                        balance: dec!(700000),
                        release_date: Utc::now(),
                    },
                    UnbondEntry {
                        balance: dec!(300000),
                        release_date: Utc::now(),
                    },
                ],
            }])
            .await;
        assert_eq!(f.service.pending_balance().await.unwrap(), dec!(1));
    }

    #[test_log::test(tokio::test)]
    async fn test_staking_rewards_in_display_units() {
        let f = fixture();
        f.rpc.set_rewards(dec!(250000)).await;
        assert_eq!(f.service.staking_rewards().await.unwrap(), dec!(0.25));
    }

    #[test_log::test(tokio::test)]
    async fn test_validator_by_id() {
        let f = fixture();
        let found = f.service.validator_by_id(&"val1".into()).await.unwrap();
        assert_eq!(found.reward.annual, dec!(10));

        let err = f
            .service
            .validator_by_id(&"val9".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }

    #[test_log::test(tokio::test)]
    async fn test_max_stake_keeps_fee_headroom() {
        let f = fixture();
        f.rpc.set_account(cosmos_account(0, dec!(5000000))).await;
        let max = f.service.max_stake().await.unwrap();
        // Fee is 5000 uatom = 0.005 ATOM.
        assert_eq!(max.normal, dec!(4.99));
        assert_eq!(max.min, dec!(4.995));

        f.rpc.set_account(cosmos_account(0, dec!(1000))).await;
        let max = f.service.max_stake().await.unwrap();
        assert_eq!(max.normal, Decimal::ZERO);
        assert_eq!(max.min, Decimal::ZERO);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_prepare_stake_tx_pipeline() {
        let f = fixture();
        f.rpc.set_account(cosmos_account(3, dec!(5000000))).await;

        let service = f.service.clone();
        let task = spawn(async move {
            service
                .prepare_stake_tx(StakeAction::Stake, &"val1".into(), dec!(5000000))
                .await
        });

        // Let a few confirmation polls come up empty before the transaction
        // shows up in the recent list.
        sleep(Duration::from_secs(12)).await;
        assert!(!task.is_finished());
        f.rpc
            .push_staking_transaction(StakingTx {
                txhash: "TX0001".into(),
                height: Some(100),
                timestamp: None,
            })
            .await;

        let tx = task.await.unwrap().unwrap();
        assert_eq!(tx.txhash, "TX0001");

        // The signed skeleton reflects the fresh account state and config.
        let signed = f.wallet.signed().await;
        assert_eq!(signed.len(), 1);
        let (coin, skeleton) = &signed[0];
        assert_eq!(*coin, CoinId::Cosmos);
        assert_eq!(skeleton.sequence, 3);
        assert_eq!(skeleton.account_number, 482);
        assert_eq!(skeleton.chain_id, "mockhub-1");
        assert_eq!(skeleton.fee.gas, "200000");
        assert_eq!(skeleton.fee.amounts[0].amount, "5000");
        match &skeleton.message {
            TxMessage::Stake(payload) => {
                assert_eq!(payload.delegator_address, ADDRESS);
                assert_eq!(payload.validator_address, "val1");
                assert_eq!(payload.amount.amount, "5000000");
                assert_eq!(payload.amount.denom, "uatom");
            }
            other => panic!("expected a stake message, got {other:?}"),
        }
        assert_eq!(f.rpc.broadcasts().await.len(), 1);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_prepare_unstake_tx_message() {
        let f = fixture();
        f.rpc.set_account(cosmos_account(7, dec!(0))).await;

        let service = f.service.clone();
        let task = spawn(async move {
            service
                .prepare_stake_tx(StakeAction::Unstake, &"val1".into(), dec!(1000000))
                .await
        });

        sleep(Duration::from_secs(6)).await;
        f.rpc
            .push_staking_transaction(StakingTx {
                txhash: "TX0001".into(),
                height: None,
                timestamp: None,
            })
            .await;
        task.await.unwrap().unwrap();

        // Unstaking needs no spendable balance; the guard only applies to
        // staking.
        let signed = f.wallet.signed().await;
        assert_eq!(signed.len(), 1);
        assert_eq!(signed[0].1.sequence, 7);
        assert!(matches!(signed[0].1.message, TxMessage::Unstake(_)));
    }

    #[test_log::test(tokio::test)]
    async fn test_prepare_stake_tx_insufficient_funds() {
        let f = fixture();
        f.rpc.set_account(cosmos_account(3, dec!(1000))).await;

        let err = f
            .service
            .prepare_stake_tx(StakeAction::Stake, &"val1".into(), dec!(500))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

        // The pipeline aborted before anything was signed or sent.
        assert!(f.wallet.signed().await.is_empty());
        assert!(f.rpc.broadcasts().await.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_prepare_stake_tx_signing_denied() {
        let f = fixture();
        f.rpc.set_account(cosmos_account(3, dec!(5000000))).await;
        f.wallet.deny_signing().await;

        let err = f
            .service
            .prepare_stake_tx(StakeAction::Stake, &"val1".into(), dec!(1000000))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transaction);
        assert!(f.rpc.broadcasts().await.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_prepare_stake_tx_rejected_broadcast() {
        let f = fixture();
        f.rpc.set_account(cosmos_account(3, dec!(5000000))).await;
        f.rpc.reject_broadcast().await;

        let err = f
            .service
            .prepare_stake_tx(StakeAction::Stake, &"val1".into(), dec!(1000000))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transaction);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_wait_for_confirmation_deadline() {
        let f = fixture();
        let err = f
            .service
            .wait_for_confirmation("TXMISSING", Some(Duration::from_secs(30)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_wait_for_confirmation_survives_poll_failures() {
        let f = fixture();
        f.rpc.fail("staking_transactions").await;

        let service = f.service.clone();
        let task = spawn(async move {
            service
                .wait_for_confirmation("TX0009", Some(Duration::from_secs(600)))
                .await
        });

        sleep(Duration::from_secs(12)).await;
        f.rpc.restore("staking_transactions").await;
        f.rpc
            .push_staking_transaction(StakingTx {
                txhash: "TX0009".into(),
                height: Some(7),
                timestamp: None,
            })
            .await;
        assert_eq!(task.await.unwrap().unwrap().txhash, "TX0009");
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_balance_stream_refresh() {
        let f = fixture();
        f.rpc.set_account(cosmos_account(0, dec!(5000000))).await;

        let started = Instant::now();
        let mut balances = f.service.balance_stream();
        assert_eq!(balances.next().await.unwrap(), dec!(5));

        // A manual refresh picks up new state without waiting out the
        // balance interval.
        f.rpc.set_account(cosmos_account(0, dec!(6000000))).await;
        f.refresh.refresh();
        assert_eq!(balances.next().await.unwrap(), dec!(6));
        assert!(started.elapsed() < f.service.config().balance_refresh_interval);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_staked_stream_emits_zero_on_error() {
        let f = fixture();
        f.rpc.fail("delegations").await;
        let mut staked = f.service.staked_stream();
        assert_eq!(staked.next().await.unwrap(), TokenAmount::ZERO);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_balance_usd_stream_recomputes_on_rate_change() {
        let f = fixture();
        f.rpc.set_account(cosmos_account(0, dec!(5000000))).await;

        let mut usd = f.service.balance_usd_stream();
        assert_eq!(usd.next().await.unwrap(), dec!(36.25));

        f.rates.set_price(dec!(10)).await;
        // The new rate lands at the next rate poll; balance re-emissions in
        // between keep the old product.
        let mut saw_new_price = false;
        for _ in 0..6 {
            if usd.next().await.unwrap() == dec!(50) {
                saw_new_price = true;
                break;
            }
        }
        assert!(saw_new_price, "new rate never reflected in USD stream");
    }
}
