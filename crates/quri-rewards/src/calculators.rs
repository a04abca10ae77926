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

//! The per-scheme payout calculators. Each consumes a pool balance plus
//! scheme-specific inputs and produces a [`crate::payout::Payout`];
//! degenerate inputs (zero balance, empty participant list, zero total score)
//! are not errors and yield no payout.

pub mod contribution;
pub mod proposer;
pub mod ranking;
pub mod stake;

use crate::{
    distribution::PartyScore,
    payout::{Payout, RewardPool},
};
use num::traits::Zero;
use quri_kernel::{fraction_of, Amount, PartyId};
use std::collections::BTreeMap;

/// Convert normalized shares of `balance` into a payout. Zero amounts (from
/// truncation of tiny shares) are never inserted; `None` when nothing
/// remains.
fn payout_from_shares(
    pool: &RewardPool<'_>,
    balance: &Amount,
    shares: &[PartyScore],
    locked_for_epochs: u64,
) -> Option<Payout> {
    let mut party_to_amount: BTreeMap<PartyId, Amount> = BTreeMap::new();
    let mut total_reward = Amount::zero();

    for share in shares {
        let amount = fraction_of(balance, &share.score);
        if amount.is_zero() {
            continue;
        }
        total_reward += &amount;
        *party_to_amount.entry(share.party.clone()).or_default() += amount;
    }

    if total_reward.is_zero() {
        return None;
    }

    Some(pool.payout(party_to_amount, total_reward, locked_for_epochs))
}
