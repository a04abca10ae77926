// Copyright 2025 PRAGMA
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The single conversion boundary between integer balances and fractional
//! shares. Every calculator converts through [`fraction_of`], and always by
//! truncation; the computed sum of a distribution may therefore fall slightly
//! short of the balance it was carved from, never above it.

use num::{
    rational::Ratio,
    traits::{One, Zero},
    BigUint,
};

/// A ledger balance in asset base units. Unsigned and arbitrary-precision;
/// zero is a valid, frequently-produced value meaning "no payout".
pub type Amount = BigUint;

/// An exact fraction, conceptually in `[0, 1]` when used as a share. Sums of
/// independently-derived shares may transiently exceed one before correction.
pub type SafeRatio = Ratio<BigUint>;

pub fn safe_ratio(numerator: u64, denominator: u64) -> SafeRatio {
    SafeRatio::new(BigUint::from(numerator), BigUint::from(denominator))
}

/// The ratio between two amounts, zero when the denominator is zero.
pub fn amount_ratio(numerator: &Amount, denominator: &Amount) -> SafeRatio {
    if denominator.is_zero() {
        SafeRatio::zero()
    } else {
        SafeRatio::new(numerator.clone(), denominator.clone())
    }
}

pub fn floor_to_amount(r: SafeRatio) -> Amount {
    r.floor().to_integer()
}

/// The portion of `amount` corresponding to `share`, truncated to a whole
/// amount. Never rounds up.
pub fn fraction_of(amount: &Amount, share: &SafeRatio) -> Amount {
    floor_to_amount(SafeRatio::from_integer(amount.clone()) * share)
}

/// `1 - share`, floored at zero so that a share already past one cannot
/// produce a negative complement.
pub fn complement(share: &SafeRatio) -> SafeRatio {
    let one = SafeRatio::one();
    if share >= &one {
        SafeRatio::zero()
    } else {
        one - share
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(1000, 1, 2, 500; "exact half")]
    #[test_case(1000, 1, 3, 333; "truncates a third")]
    #[test_case(999, 999, 1000, 998; "truncates just below")]
    #[test_case(0, 3, 4, 0; "zero amount")]
    #[test_case(1000, 0, 4, 0; "zero share")]
    fn fraction_of_truncates(amount: u64, n: u64, d: u64, expected: u64) {
        assert_eq!(
            fraction_of(&Amount::from(amount), &safe_ratio(n, d)),
            Amount::from(expected)
        );
    }

    #[test]
    fn amount_ratio_of_zero_denominator_is_zero() {
        assert_eq!(
            amount_ratio(&Amount::from(5u64), &Amount::zero()),
            SafeRatio::zero()
        );
    }

    #[test]
    fn complement_floors_at_zero() {
        assert_eq!(complement(&safe_ratio(3, 2)), SafeRatio::zero());
        assert_eq!(complement(&safe_ratio(1, 4)), safe_ratio(3, 4));
    }

    proptest! {
        #[test]
        fn fraction_of_never_exceeds_amount(amount in any::<u64>(), n in 0u64..=1000, d in 1u64..=1000) {
            let share = safe_ratio(n.min(d), d);
            prop_assert!(fraction_of(&Amount::from(amount), &share) <= Amount::from(amount));
        }

        #[test]
        fn fraction_of_is_monotonic_in_share(amount in any::<u64>(), n in 0u64..1000, d in 1u64..=1000) {
            let smaller = safe_ratio(n.min(d), d);
            let larger = safe_ratio((n + 1).min(d), d);
            prop_assert!(
                fraction_of(&Amount::from(amount), &smaller)
                    <= fraction_of(&Amount::from(amount), &larger)
            );
        }
    }
}
