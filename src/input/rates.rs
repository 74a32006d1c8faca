//! Fiat exchange rates.

use rust_decimal::Decimal;
use serde::Deserialize;
use url::Url;

use crate::{
    Error, Result,
    types::common::{CoinId, lenient_decimal},
};

pub mod testing;

/// Interface for fetching the fiat price of a coin.
pub trait RateSource: Clone + Send + Sync {
    /// Current USD price of one display unit of the coin.
    fn rate(&self, coin: CoinId) -> impl Send + Future<Output = Result<Decimal>>;
}

/// HTTP client for a market-price endpoint.
#[derive(Clone, Debug)]
pub struct HttpRateSource {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpRateSource {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }
}

impl RateSource for HttpRateSource {
    async fn rate(&self, coin: CoinId) -> Result<Decimal> {
        let url = format!(
            "{}/prices/{coin}?currency=USD",
            self.endpoint.as_str().trim_end_matches('/')
        );
        tracing::debug!(%coin, "fetching exchange rate");
        let quote: Quote = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()
            .map_err(|err| Error::from(err).context("rate service"))?
            .json()
            .await?;
        Ok(quote.price)
    }
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default, deserialize_with = "lenient_decimal")]
    price: Decimal,
}
