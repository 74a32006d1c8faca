//! The validator directory: the index service publishing approved validators.

use serde::Deserialize;
use url::Url;

use crate::{
    Error, Result,
    types::common::{Address, CoinId, Validator},
};

pub mod testing;

/// Interface for fetching the approved validator list.
///
/// Only validators published here appear in the staking view; delegations to
/// anyone else are dropped by the aggregator.
pub trait ValidatorDirectory: Clone + Send + Sync {
    /// All approved validators for a chain.
    fn validators(&self, coin: CoinId) -> impl Send + Future<Output = Result<Vec<Validator>>>;

    /// Look up a single approved validator by id.
    fn validator_by_id(
        &self,
        coin: CoinId,
        id: &Address,
    ) -> impl Send + Future<Output = Result<Validator>>;
}

/// HTTP client for a Block Atlas-style directory service.
#[derive(Clone, Debug)]
pub struct HttpDirectory {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpDirectory {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    async fn fetch(&self, coin: CoinId) -> Result<Vec<Validator>> {
        let url = format!(
            "{}/v2/{coin}/staking/validators",
            self.endpoint.as_str().trim_end_matches('/')
        );
        tracing::debug!(%coin, "fetching approved validators");
        let page: ValidatorPage = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()
            .map_err(|err| Error::from(err).context("validator directory"))?
            .json()
            .await?;
        Ok(page.docs)
    }
}

impl ValidatorDirectory for HttpDirectory {
    async fn validators(&self, coin: CoinId) -> Result<Vec<Validator>> {
        self.fetch(coin).await
    }

    async fn validator_by_id(&self, coin: CoinId, id: &Address) -> Result<Validator> {
        // The directory has no by-id endpoint; filter the list.
        self.fetch(coin)
            .await?
            .into_iter()
            .find(|validator| &validator.id == id)
            .ok_or_else(|| Error::unavailable().context(format!("validator {id} is not listed")))
    }
}

#[derive(Debug, Deserialize)]
struct ValidatorPage {
    #[serde(default)]
    docs: Vec<Validator>,
}
