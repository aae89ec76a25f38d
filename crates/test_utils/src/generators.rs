//! Property-Based Test Generators
//!
//! Provides proptest strategies for entry amounts that respect the ledger's
//! structural rules.

use proptest::prelude::*;

/// Strategy for generating non-zero signed amounts
pub fn nonzero_amount_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![
        -1_000_000_000i64..=-1i64,
        1i64..1_000_000_000i64,
    ]
}

/// Strategy for leg amounts that are all non-zero and sum to zero
///
/// Produces between 2 and `max_legs` amounts. The last leg closes the set;
/// when the running total is already zero an extra pair is emitted instead.
pub fn balanced_amounts_strategy(max_legs: usize) -> impl Strategy<Value = Vec<i64>> {
    let max_open = max_legs.max(2) - 1;
    prop::collection::vec(nonzero_amount_strategy(), 1..=max_open).prop_map(|mut legs| {
        let total: i64 = legs.iter().sum();
        if total == 0 {
            legs.push(1);
            legs.push(-1);
        } else {
            legs.push(-total);
        }
        legs
    })
}

/// Strategy for transfer amounts against a given opening balance
///
/// Roughly half of the generated amounts exceed the opening balance.
pub fn transfer_amount_strategy(opening: i64) -> impl Strategy<Value = i64> {
    let upper = opening.max(1).saturating_mul(2);
    1i64..=upper
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_balanced_amounts_sum_to_zero(legs in balanced_amounts_strategy(6)) {
            prop_assert!(legs.len() >= 2);
            prop_assert!(legs.iter().all(|amount| *amount != 0));
            prop_assert_eq!(legs.iter().sum::<i64>(), 0);
        }

        #[test]
        fn test_transfer_amounts_stay_positive(amount in transfer_amount_strategy(500)) {
            prop_assert!((1..=1_000).contains(&amount));
        }
    }
}
