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

//! Pure share-apportionment primitives: turning a set of per-party scores
//! into normalized fractional shares whose sum never exceeds one. The
//! calculators convert these shares into amounts; no integer arithmetic
//! happens here.

use num::{
    traits::{One, Zero},
    BigUint,
};
use quri_kernel::{find_rank, PartyId, RankTier, SafeRatio, TeamId};
use std::collections::BTreeMap;

/// A party paired with a score. Within a slice, ordering is insertion order;
/// several primitives re-sort by score and their result must be treated as
/// unordered unless stated otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyScore {
    pub party: PartyId,
    pub score: SafeRatio,
}

impl PartyScore {
    pub fn new(party: impl Into<PartyId>, score: SafeRatio) -> Self {
        Self {
            party: party.into(),
            score,
        }
    }
}

/// A team's aggregate contribution score together with its members'
/// individual scores within the team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamScores {
    pub team: TeamId,
    pub score: SafeRatio,
    pub members: Vec<PartyScore>,
}

/// Divide every score by `total`, so that scores become shares of it. A zero
/// total leaves the scores untouched.
///
/// When the scores were accumulated with rounding upstream, the resulting
/// shares may sum to slightly more than one; the excess is then removed from
/// the single largest entry so the distribution can never overdraw its pool.
pub fn normalise(scores: &mut [PartyScore], total: &SafeRatio) {
    if total.is_zero() {
        return;
    }

    let mut sum = SafeRatio::zero();
    for entry in scores.iter_mut() {
        entry.score = &entry.score / total;
        sum += &entry.score;
    }

    if sum > SafeRatio::one() {
        cap_at_one(scores, sum);
    }
}

/// Remove the excess over one from the largest share, floored at zero. The
/// overflow is always a rounding residue, so a single entry suffices to
/// absorb it.
fn cap_at_one(scores: &mut [PartyScore], sum: SafeRatio) {
    scores.sort_by(|a, b| b.score.cmp(&a.score));

    let excess = sum - SafeRatio::one();
    if let Some(largest) = scores.first_mut() {
        largest.score = if largest.score > excess {
            &largest.score - &excess
        } else {
            SafeRatio::zero()
        };
    }
}

/// Shares proportional to each contribution, weighted by the party's reward
/// multiplier (one when absent). Zero-scored parties are dropped; the result
/// is empty when nothing scored.
pub fn pro_rata(
    contributions: &[PartyScore],
    reward_factors: &BTreeMap<PartyId, SafeRatio>,
) -> Vec<PartyScore> {
    let mut total = SafeRatio::zero();
    let mut weighted = Vec::with_capacity(contributions.len());

    for contribution in contributions {
        let factor = reward_factors
            .get(&contribution.party)
            .cloned()
            .unwrap_or_else(SafeRatio::one);

        let score = &contribution.score * factor;
        if score.is_zero() {
            continue;
        }

        total += &score;
        weighted.push(PartyScore {
            party: contribution.party.clone(),
            score,
        });
    }

    if total.is_zero() {
        return Vec::new();
    }

    normalise(&mut weighted, &total);
    weighted
}

/// Shares determined by position in the contribution ranking: parties are
/// sorted by raw score, descending, and each earns the `share_ratio` of its
/// 1-indexed rank (weighted by its reward multiplier). Parties with equal
/// consecutive scores share the same rank's ratio rather than occupying
/// individually incremented ranks.
///
/// The rank table is non-increasing, so the walk stops at the first tier
/// paying zero: everyone ranked below it earns nothing either.
pub fn rank_tiered(
    contributions: &[PartyScore],
    rank_table: &[RankTier],
    reward_factors: &BTreeMap<PartyId, SafeRatio>,
) -> Vec<PartyScore> {
    let mut sorted = contributions.to_vec();
    // Stable sort: insertion order breaks exact ties deterministically.
    sorted.sort_by(|a, b| b.score.cmp(&a.score));

    let mut total = SafeRatio::zero();
    let mut ranked = Vec::with_capacity(sorted.len());

    let mut previous_score: Option<SafeRatio> = None;
    let mut share_ratio = 0u32;

    for (ix, contribution) in sorted.iter().enumerate() {
        if previous_score.as_ref() != Some(&contribution.score) {
            share_ratio = find_rank(rank_table, (ix + 1) as u32);
            if share_ratio == 0 {
                break;
            }
        }
        previous_score = Some(contribution.score.clone());

        let factor = reward_factors
            .get(&contribution.party)
            .cloned()
            .unwrap_or_else(SafeRatio::one);

        let score = SafeRatio::from_integer(BigUint::from(share_ratio)) * factor;
        if score.is_zero() {
            continue;
        }

        total += &score;
        ranked.push(PartyScore {
            party: contribution.party.clone(),
            score,
        });
    }

    if total.is_zero() {
        return Vec::new();
    }

    normalise(&mut ranked, &total);
    ranked
}
