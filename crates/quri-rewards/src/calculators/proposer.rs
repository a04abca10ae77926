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

//! The proposer-bonus calculator: the only equal-split scheme. A market that
//! crossed its activity threshold pays its proposers one equal, truncated
//! slice of the pool each. The engine marks the market paid (exactly once)
//! after the bonus settles.

use crate::payout::{Payout, RewardPool};
use num::traits::Zero;
use quri_kernel::{Amount, PartyId};
use std::collections::BTreeMap;

pub fn proposer_payout(
    pool: &RewardPool<'_>,
    balance: &Amount,
    proposers: &[PartyId],
) -> Option<Payout> {
    if balance.is_zero() || proposers.is_empty() {
        return None;
    }

    let share = balance / Amount::from(proposers.len() as u64);
    if share.is_zero() {
        return None;
    }

    let mut party_to_amount: BTreeMap<PartyId, Amount> = BTreeMap::new();
    for proposer in proposers {
        *party_to_amount.entry(proposer.clone()).or_default() += &share;
    }

    let total_reward = party_to_amount
        .values()
        .fold(Amount::zero(), |sum, amount| sum + amount);

    Some(pool.payout(party_to_amount, total_reward, 0))
}
