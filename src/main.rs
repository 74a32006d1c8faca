use std::{process::exit, sync::Arc, time::Duration};

use clap::Parser;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;
use url::Url;

use staking_dashboard_service::{
    Result,
    coin::cosmos::CosmosService,
    config::ChainConfig,
    dashboard,
    input::{
        directory::HttpDirectory, rates::HttpRateSource, rpc::client::HttpRpc, wallet::NullWallet,
    },
    stream::RefreshHandle,
    types::common::Address,
};

/// The backend data service for the wallet staking dashboard.
#[derive(Debug, Parser)]
struct Options {
    /// REST endpoint of a Cosmos node.
    #[clap(
        long,
        env = "STAKING_DASHBOARD_COSMOS_ENDPOINT",
        default_value = "https://stargate.cosmos.network"
    )]
    cosmos_endpoint: Url,

    /// Endpoint of the validator directory service.
    #[clap(
        long,
        env = "STAKING_DASHBOARD_ATLAS_ENDPOINT",
        default_value = "https://blockatlas.trustwalletapp.com"
    )]
    atlas_endpoint: Url,

    /// Endpoint of the exchange-rate service.
    #[clap(
        long,
        env = "STAKING_DASHBOARD_RATES_ENDPOINT",
        default_value = "https://rates.trustwalletapp.com"
    )]
    rates_endpoint: Url,

    /// Session address to use when no wallet provider is injected.
    #[clap(long, env = "STAKING_DASHBOARD_DEBUG_ADDRESS")]
    debug_address: Option<Address>,

    /// Seconds between dashboard reloads.
    #[clap(long, env = "STAKING_DASHBOARD_RELOAD_INTERVAL", default_value = "60")]
    reload_interval: u64,
}

impl Options {
    async fn run(self) -> Result<()> {
        let mut config = ChainConfig::cosmos(self.cosmos_endpoint);
        config.fallback_address = self.debug_address;
        let config = Arc::new(config);

        let refresh = RefreshHandle::new();
        let services = [CosmosService::new(
            config.clone(),
            HttpRpc::new(config.endpoint.clone()),
            NullWallet,
            HttpDirectory::new(self.atlas_endpoint),
            HttpRateSource::new(self.rates_endpoint),
            refresh,
        )];

        loop {
            match dashboard::load(&services).await {
                Ok(rows) => {
                    for row in &rows {
                        tracing::info!(
                            network = %row.config.network,
                            annual = %row.annual,
                            available = %row.available,
                            pending = %row.pending,
                            unstaking_date = ?row.unstaking_date,
                            unbonding_days = row.staking.unbonding_days,
                            "dashboard row"
                        );
                    }
                }
                Err(err) => tracing::error!("dashboard load failed: {err:#}"),
            }
            sleep(Duration::from_secs(self.reload_interval)).await;
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opt = Options::parse();
    if let Err(err) = opt.run().await {
        eprintln!("service failed: {err:#}");
        exit(1);
    }
}
