#![cfg(any(test, feature = "testing"))]

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::{Error, Result, input::rates::RateSource, types::common::CoinId};

/// A rate source serving a fixed price.
#[derive(Clone, Debug)]
pub struct MockRateSource {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug)]
struct Inner {
    price: Decimal,
    failing: bool,
}

impl MockRateSource {
    pub fn with_price(price: Decimal) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                price,
                failing: false,
            })),
        }
    }

    pub async fn set_price(&self, price: Decimal) {
        self.inner.write().await.price = price;
    }

    pub async fn fail(&self) {
        self.inner.write().await.failing = true;
    }
}

impl RateSource for MockRateSource {
    async fn rate(&self, _coin: CoinId) -> Result<Decimal> {
        let inner = self.inner.read().await;
        if inner.failing {
            return Err(Error::fetch().context("mock error: rate source is failing"));
        }
        Ok(inner.price)
    }
}
