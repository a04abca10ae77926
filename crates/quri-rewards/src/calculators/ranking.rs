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

//! The ranked-participant calculator. Scores arrive already rank-adjusted
//! from the topology subsystem; this calculator only normalises them and
//! carves the pool, carrying the vesting lock through to the payout
//! unchanged.

use super::payout_from_shares;
use crate::{
    distribution::{normalise, PartyScore},
    payout::{Payout, RewardPool},
};
use num::traits::Zero;
use quri_kernel::{Amount, SafeRatio};

pub fn ranking_payout(
    pool: &RewardPool<'_>,
    balance: &Amount,
    scores: &[PartyScore],
    locked_for_epochs: u64,
) -> Option<Payout> {
    if balance.is_zero() || scores.is_empty() {
        return None;
    }

    let total = scores
        .iter()
        .fold(SafeRatio::zero(), |total, entry| total + &entry.score);
    if total.is_zero() {
        return None;
    }

    let mut shares = scores.to_vec();
    normalise(&mut shares, &total);

    payout_from_shares(pool, balance, &shares, locked_for_epochs)
}
