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

//! The stake-weighted calculator: splits a staking reward pool between
//! validators and their delegators.
//!
//! Each validator earns the slice of the pool given by its normalised reward
//! score. The slice is then divided between the operator and the delegators
//! according to the network's delegator share and the validator's stake mix:
//! the more of the stake is delegated, the larger the delegator cut. Per-party
//! payouts are capped at `max_payout` cumulatively across the whole epoch;
//! whatever the cap claws back flows into the validator's delegator pool and
//! is redistributed over further rounds, so capped parties' surplus tops up
//! the uncapped ones rather than being burnt.

use crate::{
    payout::{Payout, RewardPool},
    rng::EpochRng,
    services::ValidatorData,
};
use num::traits::{One, Zero};
use quri_kernel::{amount_ratio, complement, fraction_of, Amount, NodeId, PartyId, SafeRatio};
use std::collections::BTreeMap;
use tracing::error;

const EVENT_TARGET: &str = "quri::rewards::stake";

/// Redistribution of capped-out remainders converges quickly; past this many
/// rounds the leftover is dust.
const MAX_REDISTRIBUTION_ROUNDS: usize = 10;

pub fn stake_payout(
    pool: &RewardPool<'_>,
    balance: &Amount,
    node_scores: &BTreeMap<NodeId, SafeRatio>,
    validators: &[ValidatorData],
    delegator_share: &SafeRatio,
    max_payout: &Amount,
    rng: &mut EpochRng,
) -> Payout {
    let mut party_to_amount: BTreeMap<PartyId, Amount> = BTreeMap::new();
    let mut total_reward = Amount::zero();

    // The validator slice comes from the delegation subsystem; iterate it in
    // node-id order so the cap (and hence the output) cannot depend on the
    // collaborator's ordering.
    let mut ordered: Vec<&ValidatorData> = validators.iter().collect();
    ordered.sort_by(|a, b| a.node_id.cmp(&b.node_id));

    for validator in ordered {
        let Some(score) = node_scores.get(&validator.node_id) else {
            continue;
        };
        if score.is_zero() {
            continue;
        }

        let epoch_payout = fraction_of(balance, score);
        if epoch_payout.is_zero() {
            continue;
        }

        let total_stake = validator.total_stake();
        let delegator_fraction = if total_stake.is_zero() {
            SafeRatio::zero()
        } else {
            delegator_share * amount_ratio(&validator.stake_by_delegators, &total_stake)
        };
        let validator_fraction = complement(&delegator_fraction);

        // The operator's own cut, capped; whatever the cap refuses joins the
        // delegator pool below.
        let validator_amount = fraction_of(&epoch_payout, &validator_fraction);
        let granted = credit(
            &mut party_to_amount,
            &validator.pub_key,
            validator_amount.clone(),
            max_payout,
        );
        total_reward += &granted;

        let mut remaining = fraction_of(&epoch_payout, &delegator_fraction);
        remaining += validator_amount - granted;

        let weights = delegator_weights(validator, rng);
        if weights.is_empty() {
            continue;
        }

        // Leftovers below 0.1% of the cap are not worth another round.
        let min_leftover = max_payout / 1000u32;
        for _round in 0..MAX_REDISTRIBUTION_ROUNDS {
            if remaining.is_zero() {
                break;
            }
            if !max_payout.is_zero() && remaining < min_leftover {
                break;
            }

            let mut distributed = Amount::zero();
            for (party, weight) in &weights {
                let amount = fraction_of(&remaining, weight);
                let granted = credit(&mut party_to_amount, party, amount, max_payout);
                distributed += &granted;
                total_reward += &granted;
            }

            if distributed.is_zero() {
                break;
            }
            remaining -= &distributed;
        }
    }

    // Structurally impossible with truncating conversions, but this is
    // replicated state: check it anyway.
    if &total_reward > balance {
        error!(
            target: EVENT_TARGET,
            epoch_seq = pool.epoch_seq,
            %total_reward,
            %balance,
            "stake_payout.total_exceeds_balance",
        );
    }

    pool.payout(party_to_amount, total_reward, 0)
}

/// Credit `amount` to `party`, clamped so the party's cumulative payout never
/// exceeds `max_payout` (zero meaning uncapped). Returns what was actually
/// granted; zero-amount entries are never inserted.
fn credit(
    party_to_amount: &mut BTreeMap<PartyId, Amount>,
    party: &PartyId,
    amount: Amount,
    max_payout: &Amount,
) -> Amount {
    let granted = if max_payout.is_zero() {
        amount
    } else {
        let received = party_to_amount.get(party).cloned().unwrap_or_default();
        if &received >= max_payout {
            Amount::zero()
        } else {
            amount.min(max_payout - received)
        }
    };

    if !granted.is_zero() {
        *party_to_amount.entry(party.clone()).or_default() += &granted;
    }
    granted
}

/// Per-delegator weights within a validator: `delegation / total delegated
/// stake`. Delegators with zero stake never appear. The weights are exact and
/// sum to at most one; should upstream accumulation ever push the sum past
/// one, the excess is removed from a randomly picked (epoch-deterministic)
/// delegator able to absorb it.
fn delegator_weights(validator: &ValidatorData, rng: &mut EpochRng) -> Vec<(PartyId, SafeRatio)> {
    let mut weights: Vec<(PartyId, SafeRatio)> = validator
        .delegators
        .iter()
        .filter(|(_, delegated)| !delegated.is_zero())
        .map(|(party, delegated)| {
            (
                party.clone(),
                amount_ratio(delegated, &validator.stake_by_delegators),
            )
        })
        .collect();

    correct_excess_precision(&mut weights, rng);
    weights
}

fn correct_excess_precision(weights: &mut [(PartyId, SafeRatio)], rng: &mut EpochRng) {
    let mut sum = SafeRatio::zero();
    for (_, weight) in weights.iter() {
        sum += weight;
    }
    if sum <= SafeRatio::one() {
        return;
    }

    let excess = sum - SafeRatio::one();
    let start = rng.pick_index(weights.len());
    for offset in 0..weights.len() {
        let ix = (start + offset) % weights.len();
        if weights[ix].1 >= excess {
            weights[ix].1 = &weights[ix].1 - &excess;
            return;
        }
    }
}
