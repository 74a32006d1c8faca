//! Aggregation of raw delegation records into the per-validator stake view.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    config::ChainConfig,
    types::{
        common::{Address, Delegation, TokenAmount, Validator},
        dashboard::{StakeHolder, StakeHolderList},
    },
};

/// Merge the approved validator list with the caller's raw delegations.
///
/// Delegations to validators absent from the approved list are dropped
/// silently: unapproved validators must not appear in the staking view.
/// Multiple records targeting the same validator sum. Amounts are converted
/// to display units via the config; output order follows the approved list,
/// so aggregating the same inputs twice yields identical results.
pub fn aggregate_delegations(
    validators: &[Validator],
    delegations: &[Delegation],
    config: &Arc<ChainConfig>,
) -> StakeHolderList {
    let approved: HashSet<&Address> = validators.iter().map(|validator| &validator.id).collect();

    let mut amounts: HashMap<&Address, TokenAmount> = HashMap::new();
    for delegation in delegations {
        if !approved.contains(&delegation.validator) {
            continue;
        }
        *amounts.entry(&delegation.validator).or_default() += delegation.amount;
    }

    validators
        .iter()
        .filter_map(|validator| {
            let amount = amounts.get(&validator.id)?;
            Some(StakeHolder {
                validator: validator.clone(),
                amount: config.to_coin(*amount),
                coin: Arc::clone(config),
            })
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::input::directory::testing::validator;
    use rust_decimal_macros::dec;

    fn config() -> Arc<ChainConfig> {
        Arc::new(ChainConfig::cosmos("http://localhost:1317".parse().unwrap()))
    }

    fn delegation(validator: &str, amount: TokenAmount) -> Delegation {
        Delegation {
            validator: validator.to_string(),
            amount,
        }
    }

    #[test]
    fn test_sums_and_drops_unapproved() {
        let validators = vec![validator("val1", dec!(10))];
        let delegations = vec![
            delegation("val1", dec!(5)),
            delegation("val1", dec!(3)),
            delegation("val2", dec!(100)),
        ];

        let holders = aggregate_delegations(&validators, &delegations, &config());
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].validator.id, "val1");
        assert_eq!(holders[0].validator.reward.annual, dec!(10));
        // 8 base units, converted to display units.
        assert_eq!(holders[0].amount, config().to_coin(dec!(8)));
    }

    #[test]
    fn test_validators_without_delegations_are_absent() {
        let validators = vec![validator("val1", dec!(10)), validator("val2", dec!(7))];
        let delegations = vec![delegation("val2", dec!(1000000))];

        let holders = aggregate_delegations(&validators, &delegations, &config());
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].validator.id, "val2");
        assert_eq!(holders[0].amount, dec!(1));
    }

    #[test]
    fn test_empty_inputs() {
        let validators = vec![validator("val1", dec!(10))];
        assert!(aggregate_delegations(&[], &[delegation("val1", dec!(5))], &config()).is_empty());
        assert!(aggregate_delegations(&validators, &[], &config()).is_empty());
    }

    #[test]
    fn test_order_follows_approved_list() {
        let validators = vec![
            validator("val3", dec!(1)),
            validator("val1", dec!(2)),
            validator("val2", dec!(3)),
        ];
        let delegations = vec![
            delegation("val1", dec!(1000000)),
            delegation("val2", dec!(2000000)),
            delegation("val3", dec!(3000000)),
        ];

        let holders = aggregate_delegations(&validators, &delegations, &config());
        let ids: Vec<_> = holders
            .iter()
            .map(|holder| holder.validator.id.as_str())
            .collect();
        assert_eq!(ids, ["val3", "val1", "val2"]);
    }

    #[test]
    fn test_idempotent() {
        let validators = vec![validator("val1", dec!(10)), validator("val2", dec!(7))];
        let delegations = vec![
            delegation("val1", dec!(5)),
            delegation("val2", dec!(2)),
            delegation("val1", dec!(0.5)),
        ];

        let first = aggregate_delegations(&validators, &delegations, &config());
        let second = aggregate_delegations(&validators, &delegations, &config());
        assert_eq!(first, second);
    }

    #[test]
    fn test_decimal_sums_are_exact() {
        let validators = vec![validator("val1", dec!(10))];
        // Classic float trap: 0.1 + 0.2.
        let delegations = vec![delegation("val1", dec!(0.1)), delegation("val1", dec!(0.2))];

        let holders = aggregate_delegations(&validators, &delegations, &config());
        assert_eq!(holders[0].amount, config().to_coin(dec!(0.3)));
    }
}
