//! Fan-out across all configured chains for the dashboard summary.

use futures::{future, try_join};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{Result, coin::CoinService, types::dashboard::CoinDescriptor};

/// Load one descriptor per configured chain, all chains in parallel.
///
/// First-result semantics: the load resolves only once every chain's bundle
/// is ready, and later updates to any single chain do not re-emit here. Any
/// chain failing fatally fails the whole load; the dashboard renders a single
/// error state rather than partial data.
pub async fn load<C: CoinService>(services: &[C]) -> Result<Vec<CoinDescriptor>> {
    future::try_join_all(services.iter().map(describe)).await
}

/// Assemble the dashboard row for a single chain.
async fn describe<C: CoinService>(service: &C) -> Result<CoinDescriptor> {
    let (annual, available, pending, unstaking_date, staking) = try_join!(
        service.annual_percent(),
        async { Ok::<_, crate::Error>(format_available(service.balance().await?)) },
        // Accounts with nothing unbonding are the common case; a missing or
        // failed pending lookup reads as zero, not as a dashboard failure.
        async { Ok(service.pending_balance().await.unwrap_or(Decimal::ZERO)) },
        async { Ok(service.unstaking_date().await.ok()) },
        service.staking_parameters(),
    )?;

    Ok(CoinDescriptor {
        config: service.config().clone(),
        annual,
        available,
        pending,
        unstaking_date,
        staking,
    })
}

/// Format an available balance for the summary list: two decimal places,
/// rounded down so the user is never shown more than they can spend.
fn format_available(balance: Decimal) -> String {
    let truncated = balance.round_dp_with_strategy(2, RoundingStrategy::ToZero);
    format!("{truncated:.2}")
}
