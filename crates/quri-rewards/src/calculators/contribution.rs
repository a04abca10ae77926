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

//! The fee-contribution calculator: splits a reward pool among parties in
//! proportion to (or by rank of) their fee-contribution scores, as measured
//! by the market activity tracker. Optionally scoped per team, in which case
//! the pool is first apportioned across teams and each team's slice is then
//! apportioned among its members.

use super::payout_from_shares;
use crate::{
    distribution::{pro_rata, rank_tiered, PartyScore, TeamScores},
    payout::{Payout, RewardPool},
};
use num::traits::Zero;
use quri_kernel::{Amount, DispatchStrategy, DistributionKind, PartyId, SafeRatio, TeamId};
use std::collections::BTreeMap;

pub fn contribution_payout(
    pool: &RewardPool<'_>,
    balance: &Amount,
    contributions: &[PartyScore],
    strategy: &DispatchStrategy,
    reward_factors: &BTreeMap<PartyId, SafeRatio>,
) -> Option<Payout> {
    if balance.is_zero() || contributions.is_empty() {
        return None;
    }

    let shares = apportion(contributions, strategy, reward_factors);
    payout_from_shares(pool, balance, &shares, strategy.lock_period)
}

/// Team-scoped variant: team shares are computed from the teams' aggregate
/// scores (unweighted), then each team's share is redistributed among its
/// members with the supplied per-member reward multipliers. A party's final
/// share is `team_share × member_share_within_team`.
pub fn team_contribution_payout(
    pool: &RewardPool<'_>,
    balance: &Amount,
    teams: &[TeamScores],
    member_factors: &BTreeMap<PartyId, SafeRatio>,
    strategy: &DispatchStrategy,
) -> Option<Payout> {
    if balance.is_zero() || teams.is_empty() {
        return None;
    }

    let team_scores: Vec<PartyScore> = teams
        .iter()
        .map(|team| PartyScore::new(team.team.clone(), team.score.clone()))
        .collect();
    let team_shares = apportion(&team_scores, strategy, &BTreeMap::new());

    let by_id: BTreeMap<&TeamId, &TeamScores> =
        teams.iter().map(|team| (&team.team, team)).collect();

    let mut shares = Vec::new();
    for team_share in &team_shares {
        let Some(team) = by_id.get(&team_share.party) else {
            continue;
        };

        for member in apportion(&team.members, strategy, member_factors) {
            shares.push(PartyScore {
                party: member.party,
                score: &team_share.score * member.score,
            });
        }
    }

    payout_from_shares(pool, balance, &shares, strategy.lock_period)
}

fn apportion(
    contributions: &[PartyScore],
    strategy: &DispatchStrategy,
    reward_factors: &BTreeMap<PartyId, SafeRatio>,
) -> Vec<PartyScore> {
    match strategy.kind {
        DistributionKind::ProRata => pro_rata(contributions, reward_factors),
        DistributionKind::Rank => rank_tiered(contributions, &strategy.rank_table, reward_factors),
    }
}
