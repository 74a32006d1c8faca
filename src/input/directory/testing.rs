#![cfg(any(test, feature = "testing"))]

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::{
    Error, Result,
    input::directory::ValidatorDirectory,
    types::common::{Address, CoinId, Validator, ValidatorReward},
};

/// A directory serving a fixed validator list.
#[derive(Clone, Debug, Default)]
pub struct MockDirectory {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    validators: Vec<Validator>,
    failing: bool,
}

impl MockDirectory {
    pub fn with_validators(validators: impl IntoIterator<Item = Validator>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                validators: validators.into_iter().collect(),
                failing: false,
            })),
        }
    }

    pub async fn set_validators(&self, validators: impl IntoIterator<Item = Validator>) {
        self.inner.write().await.validators = validators.into_iter().collect();
    }

    pub async fn fail(&self) {
        self.inner.write().await.failing = true;
    }
}

impl ValidatorDirectory for MockDirectory {
    async fn validators(&self, _coin: CoinId) -> Result<Vec<Validator>> {
        let inner = self.inner.read().await;
        if inner.failing {
            return Err(Error::fetch().context("mock error: directory is failing"));
        }
        Ok(inner.validators.clone())
    }

    async fn validator_by_id(&self, coin: CoinId, id: &Address) -> Result<Validator> {
        self.validators(coin)
            .await?
            .into_iter()
            .find(|validator| &validator.id == id)
            .ok_or_else(|| Error::unavailable().context(format!("validator {id} is not listed")))
    }
}

/// A validator with the given id and annual rate, for test fixtures.
pub fn validator(id: &str, annual: Decimal) -> Validator {
    Validator {
        id: id.to_string(),
        name: format!("validator {id}"),
        description: None,
        website: None,
        status: true,
        reward: ValidatorReward { annual },
    }
}
