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

//! The reward engine: the per-epoch orchestrator. It owns the reward
//! configuration, listens to epoch boundaries, and at each epoch end walks
//! the funded reward accounts in a fixed order, runs the calculator matching
//! each account's kind, then emits one event per rewarded party and requests
//! the settlement transfers from the collateral ledger.
//!
//! The engine moves through `Idle → EpochOpen → Computing → Idle`: opening an
//! epoch only records its sequence number, all computation happens
//! synchronously inside the epoch-end callback, within state-transition
//! execution. Nothing here may observe a wall clock or iterate an unordered
//! map.

use crate::{
    calculators::{
        contribution::{contribution_payout, team_contribution_payout},
        proposer::proposer_payout,
        ranking::ranking_payout,
        stake::stake_payout,
    },
    payout::{Payout, RewardKind, RewardPool, REWARD_KIND_ORDER},
    rng::EpochRng,
    services::{
        BlockTime, Broker, Collateral, DelegationState, MarketActivity, PayoutEvent,
        RewardAccount, RewardTransfer, ScoreData, StakeScoreParams, Topology, ValidatorData,
    },
};
use num::traits::{One, Zero};
use quri_kernel::{
    amount_ratio, fraction_of, Amount, AssetId, Epoch, EntityScope, SafeRatio, Timestamp,
};
use tracing::{debug, error, info};

const EVENT_TARGET: &str = "quri::rewards::engine";

/// Engine-held configuration mirroring network parameters. Mutated only by
/// the per-field update entry points, between computation passes; read
/// during them.
#[derive(Debug, Clone)]
pub struct GlobalRewardParams {
    pub min_val_stake: Amount,
    pub optimal_stake_multiplier: SafeRatio,
    pub competition_level: SafeRatio,
    pub min_validators: u64,

    /// Cumulative per-party cap on a single payout; zero means uncapped.
    pub max_payout_per_participant: Amount,

    /// Fraction of a validator's reward slice going to its delegators,
    /// scaled by how much of the stake is delegated.
    pub delegator_share: SafeRatio,

    pub staking_asset: AssetId,

    /// Discount applied to the standby validator set's delegation when
    /// splitting staking rewards between the two sets.
    pub ersatz_reward_factor: SafeRatio,
}

impl Default for GlobalRewardParams {
    fn default() -> Self {
        Self {
            min_val_stake: Amount::zero(),
            optimal_stake_multiplier: quri_kernel::safe_ratio(3, 1),
            competition_level: quri_kernel::safe_ratio(11, 10),
            min_validators: 5,
            max_payout_per_participant: Amount::zero(),
            delegator_share: quri_kernel::safe_ratio(883, 1000),
            staking_asset: AssetId::default(),
            ersatz_reward_factor: quri_kernel::safe_ratio(1, 2),
        }
    }
}

pub struct Engine<D, T, C, M, B, TS> {
    delegation: D,
    topology: T,
    collateral: C,
    market_activity: M,
    broker: B,
    time: TS,

    params: GlobalRewardParams,

    /// Sequence number of the currently open epoch.
    epoch_seq: u64,

    /// Set when an epoch opens, cleared once its rewards are computed.
    new_epoch_started: bool,
}

impl<D, T, C, M, B, TS> Engine<D, T, C, M, B, TS>
where
    D: DelegationState,
    T: Topology,
    C: Collateral,
    M: MarketActivity,
    B: Broker,
    TS: BlockTime,
{
    pub fn new(
        delegation: D,
        topology: T,
        collateral: C,
        market_activity: M,
        broker: B,
        time: TS,
        params: GlobalRewardParams,
    ) -> Self {
        Self {
            delegation,
            topology,
            collateral,
            market_activity,
            broker,
            time,
            params,
            epoch_seq: 0,
            new_epoch_started: false,
        }
    }

    pub fn epoch_seq(&self) -> u64 {
        self.epoch_seq
    }

    /// Whether an epoch is currently open, i.e. started and not yet
    /// computed.
    pub fn is_epoch_open(&self) -> bool {
        self.new_epoch_started
    }

    // Parameter-update entry points, one per field. Called by the host state
    // machine when the corresponding network parameter changes; never during
    // a computation pass.

    pub fn update_min_val_stake(&mut self, value: Amount) {
        self.params.min_val_stake = value;
    }

    pub fn update_optimal_stake_multiplier(&mut self, value: SafeRatio) {
        self.params.optimal_stake_multiplier = value;
    }

    pub fn update_competition_level(&mut self, value: SafeRatio) {
        self.params.competition_level = value;
    }

    pub fn update_min_validators(&mut self, value: u64) {
        self.params.min_validators = value;
    }

    pub fn update_max_payout_per_participant(&mut self, value: Amount) {
        self.params.max_payout_per_participant = value;
    }

    pub fn update_delegator_share(&mut self, value: SafeRatio) {
        self.params.delegator_share = value;
    }

    pub fn update_staking_asset(&mut self, value: AssetId) {
        self.params.staking_asset = value;
    }

    pub fn update_ersatz_reward_factor(&mut self, value: SafeRatio) {
        self.params.ersatz_reward_factor = value;
    }

    /// An epoch opened: record it. No computation happens until it ends.
    pub fn on_epoch_start(&mut self, epoch: &Epoch) {
        self.epoch_seq = epoch.seq;
        self.new_epoch_started = true;

        debug!(target: EVENT_TARGET, epoch_seq = epoch.seq, "rewards.epoch_started");
    }

    /// An epoch ended: compute and distribute every funded reward account.
    pub fn on_epoch_end(&mut self, epoch: &Epoch) {
        self.new_epoch_started = false;

        let now = self.time.now();
        // Same block time on every node, hence the same draw sequence.
        let mut rng = EpochRng::from_block_time(now);

        let delegation = self.delegation.process_epoch_delegations(epoch);
        let stake_params = self.stake_score_params();
        let (primary_scores, ersatz_scores) =
            self.topology
                .rewards_scores(epoch.seq, &delegation, &stake_params);

        // A node's membership in either score map decides which set it is
        // rewarded with.
        let primary_set = in_score_map(&delegation, &primary_scores);
        let ersatz_set = in_score_map(&delegation, &ersatz_scores);

        let (factor_primary, factor_ersatz) = validator_set_factors(
            &primary_set,
            &ersatz_set,
            &self.params.ersatz_reward_factor,
        );

        info!(
            target: EVENT_TARGET,
            epoch_seq = epoch.seq,
            primary = primary_set.len(),
            ersatz = ersatz_set.len(),
            factor_primary = %factor_primary,
            factor_ersatz = %factor_ersatz,
            "rewards.epoch_end",
        );

        for kind in REWARD_KIND_ORDER {
            let mut accounts = self.collateral.reward_accounts_by_kind(kind);
            accounts.sort_by(|a, b| a.id.cmp(&b.id));

            for account in accounts {
                if account.balance.is_zero() {
                    continue;
                }

                self.distribute_account(
                    kind,
                    &account,
                    epoch,
                    now,
                    &primary_set,
                    &ersatz_set,
                    &primary_scores,
                    &ersatz_scores,
                    &factor_primary,
                    &factor_ersatz,
                    &mut rng,
                );
            }
        }

        self.topology
            .recalc_validator_set(epoch.seq + 1, &delegation, &stake_params);
    }

    #[allow(clippy::too_many_arguments)]
    fn distribute_account(
        &mut self,
        kind: RewardKind,
        account: &RewardAccount,
        epoch: &Epoch,
        now: Timestamp,
        primary_set: &[ValidatorData],
        ersatz_set: &[ValidatorData],
        primary_scores: &ScoreData,
        ersatz_scores: &ScoreData,
        factor_primary: &SafeRatio,
        factor_ersatz: &SafeRatio,
        rng: &mut EpochRng,
    ) {
        let pool = RewardPool {
            kind,
            from_account: &account.id,
            asset: &account.asset,
            market: &account.market,
            epoch_seq: epoch.seq,
            timestamp: now,
        };

        match kind {
            // Validator rewards are split across the two validator sets; the
            // standby set's slice is discounted through its factor.
            RewardKind::Staking | RewardKind::InfrastructureFee => {
                if account.asset != self.params.staking_asset {
                    debug!(
                        target: EVENT_TARGET,
                        account = %account.id,
                        asset = %account.asset,
                        "rewards.skip_non_staking_asset",
                    );
                    return;
                }

                let sets = [
                    (primary_set, primary_scores, factor_primary),
                    (ersatz_set, ersatz_scores, factor_ersatz),
                ];
                for (set, scores, factor) in sets {
                    let effective = fraction_of(&account.balance, factor);
                    if effective.is_zero() {
                        continue;
                    }

                    let payout = stake_payout(
                        &pool,
                        &effective,
                        &scores.normalised_scores,
                        set,
                        &self.params.delegator_share,
                        &self.params.max_payout_per_participant,
                        rng,
                    );
                    self.distribute(payout, epoch);
                }
            }

            RewardKind::MakerFeeReceived | RewardKind::MakerFeePaid | RewardKind::LpFee => {
                let strategy = account.dispatch_strategy.clone().unwrap_or_default();
                let multipliers = self.market_activity.reward_multipliers(&account.asset);

                let payout = match strategy.scope {
                    EntityScope::Individuals => {
                        let scores = self.market_activity.fee_party_scores(&account.asset, kind);
                        contribution_payout(&pool, &account.balance, &scores, &strategy, &multipliers)
                    }
                    EntityScope::Teams => {
                        let teams = self.market_activity.fee_team_scores(&account.asset, kind);
                        team_contribution_payout(
                            &pool,
                            &account.balance,
                            &teams,
                            &multipliers,
                            &strategy,
                        )
                    }
                };

                if let Some(payout) = payout {
                    self.distribute(payout, epoch);
                }
            }

            RewardKind::MarketProposer => {
                let proposers = self.market_activity.eligible_proposers(&account.market);
                if let Some(payout) = proposer_payout(&pool, &account.balance, &proposers) {
                    // Paid exactly once: only a settled bonus is recorded.
                    if self.distribute(payout, epoch) {
                        self.market_activity.mark_proposer_paid(&account.market);
                    }
                }
            }

            RewardKind::ValidatorRanking => {
                let strategy = account.dispatch_strategy.clone().unwrap_or_default();
                let scores = self.topology.ranking_scores(epoch.seq);
                if let Some(payout) =
                    ranking_payout(&pool, &account.balance, &scores, strategy.lock_period)
                {
                    self.distribute(payout, epoch);
                }
            }
        }
    }

    /// Emit the payout's events (one per party, in party order) and request
    /// the settlement transfers. A transfer failure abandons this account's
    /// distribution for the epoch: no retry, events are not re-emitted, the
    /// balance stays for the next epoch.
    fn distribute(&mut self, payout: Payout, epoch: &Epoch) -> bool {
        if payout.is_empty() {
            return false;
        }

        let locked_until_epoch = epoch.seq + payout.locked_for_epochs;

        let mut events = Vec::with_capacity(payout.party_to_amount.len());
        let mut transfers = Vec::with_capacity(payout.party_to_amount.len());
        for (party, amount) in &payout.party_to_amount {
            events.push(PayoutEvent {
                party: party.clone(),
                asset: payout.asset.clone(),
                kind: payout.kind,
                market: payout.market.clone(),
                epoch_seq: payout.epoch_seq,
                amount: amount.clone(),
                percent_of_total: amount_ratio(amount, &payout.total_reward),
                timestamp: payout.timestamp,
                locked_until_epoch,
            });
            transfers.push(RewardTransfer {
                owner: party.clone(),
                asset: payout.asset.clone(),
                amount: amount.clone(),
                min_amount: amount.clone(),
                kind: payout.kind,
            });
        }

        self.broker.send_batch(events);

        if let Err(err) = self
            .collateral
            .transfer_rewards(&payout.from_account, transfers)
        {
            error!(
                target: EVENT_TARGET,
                %err,
                from_account = %payout.from_account,
                kind = %payout.kind,
                epoch_seq = payout.epoch_seq,
                "rewards.transfer_failed",
            );
            return false;
        }

        debug!(
            target: EVENT_TARGET,
            kind = %payout.kind,
            epoch_seq = payout.epoch_seq,
            total_reward = %payout.total_reward,
            parties = payout.party_to_amount.len(),
            "rewards.distributed",
        );
        true
    }

    fn stake_score_params(&self) -> StakeScoreParams {
        StakeScoreParams {
            min_val_stake: self.params.min_val_stake.clone(),
            optimal_stake_multiplier: self.params.optimal_stake_multiplier.clone(),
            competition_level: self.params.competition_level.clone(),
            min_validators: self.params.min_validators,
        }
    }
}

fn in_score_map(delegation: &[ValidatorData], scores: &ScoreData) -> Vec<ValidatorData> {
    delegation
        .iter()
        .filter(|v| scores.normalised_scores.contains_key(&v.node_id))
        .cloned()
        .collect()
}

/// The reward-split factors between the primary and ersatz validator sets,
/// weighted by their total delegation with the ersatz side discounted. Both
/// zero when nothing is delegated; should their sum ever exceed one through
/// rounding, the excess comes out of the ersatz factor only.
fn validator_set_factors(
    primary: &[ValidatorData],
    ersatz: &[ValidatorData],
    ersatz_reward_factor: &SafeRatio,
) -> (SafeRatio, SafeRatio) {
    let stake_primary = SafeRatio::from_integer(total_delegation(primary));
    let stake_ersatz =
        SafeRatio::from_integer(total_delegation(ersatz)) * ersatz_reward_factor;

    let total = &stake_primary + &stake_ersatz;
    if total.is_zero() {
        return (SafeRatio::zero(), SafeRatio::zero());
    }

    let factor_primary = &stake_primary / &total;
    let mut factor_ersatz = &stake_ersatz / &total;

    let sum = &factor_primary + &factor_ersatz;
    if sum > SafeRatio::one() {
        let excess = sum - SafeRatio::one();
        factor_ersatz = if factor_ersatz > excess {
            &factor_ersatz - &excess
        } else {
            SafeRatio::zero()
        };
    }

    (factor_primary, factor_ersatz)
}

fn total_delegation(validators: &[ValidatorData]) -> Amount {
    validators
        .iter()
        .fold(Amount::zero(), |total, v| total + v.total_stake())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        distribution::{PartyScore, TeamScores},
        services::TransferError,
    };
    use pretty_assertions::assert_eq;
    use quri_kernel::{safe_ratio, AccountId, DispatchStrategy, MarketId, NodeId, PartyId};
    use std::collections::{BTreeMap, BTreeSet};

    #[derive(Default)]
    struct FakeDelegation {
        validators: Vec<ValidatorData>,
        processed_epochs: Vec<u64>,
    }

    impl DelegationState for FakeDelegation {
        fn process_epoch_delegations(&mut self, epoch: &Epoch) -> Vec<ValidatorData> {
            self.processed_epochs.push(epoch.seq);
            self.validators.clone()
        }

        fn validator_data(&self) -> Vec<ValidatorData> {
            self.validators.clone()
        }
    }

    #[derive(Default)]
    struct FakeTopology {
        primary: ScoreData,
        ersatz: ScoreData,
        ranking: Vec<PartyScore>,
        recalced_for: Vec<u64>,
    }

    impl Topology for FakeTopology {
        fn rewards_scores(
            &mut self,
            _epoch_seq: u64,
            _delegation: &[ValidatorData],
            _params: &StakeScoreParams,
        ) -> (ScoreData, ScoreData) {
            (self.primary.clone(), self.ersatz.clone())
        }

        fn ranking_scores(&mut self, _epoch_seq: u64) -> Vec<PartyScore> {
            self.ranking.clone()
        }

        fn recalc_validator_set(
            &mut self,
            next_epoch_seq: u64,
            _delegation: &[ValidatorData],
            _params: &StakeScoreParams,
        ) {
            self.recalced_for.push(next_epoch_seq);
        }
    }

    #[derive(Default)]
    struct FakeCollateral {
        accounts: Vec<(RewardKind, RewardAccount)>,
        failing: BTreeSet<AccountId>,
        transfers: Vec<(AccountId, Vec<RewardTransfer>)>,
    }

    impl Collateral for FakeCollateral {
        fn reward_accounts_by_kind(&self, kind: RewardKind) -> Vec<RewardAccount> {
            self.accounts
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, account)| account.clone())
                .collect()
        }

        fn transfer_rewards(
            &mut self,
            from_account: &AccountId,
            transfers: Vec<RewardTransfer>,
        ) -> Result<(), TransferError> {
            if self.failing.contains(from_account) {
                return Err(TransferError::UnknownAccount(from_account.clone()));
            }
            self.transfers.push((from_account.clone(), transfers));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeActivity {
        proposers: Vec<PartyId>,
        paid_markets: Vec<MarketId>,
        party_scores: Vec<PartyScore>,
        team_scores: Vec<TeamScores>,
        multipliers: BTreeMap<PartyId, SafeRatio>,
    }

    impl MarketActivity for FakeActivity {
        fn eligible_proposers(&self, _market: &MarketId) -> Vec<PartyId> {
            self.proposers.clone()
        }

        fn mark_proposer_paid(&mut self, market: &MarketId) {
            self.paid_markets.push(market.clone());
        }

        fn fee_party_scores(&self, _asset: &AssetId, _kind: RewardKind) -> Vec<PartyScore> {
            self.party_scores.clone()
        }

        fn fee_team_scores(&self, _asset: &AssetId, _kind: RewardKind) -> Vec<TeamScores> {
            self.team_scores.clone()
        }

        fn reward_multipliers(&self, _asset: &AssetId) -> BTreeMap<PartyId, SafeRatio> {
            self.multipliers.clone()
        }
    }

    #[derive(Default)]
    struct FakeBroker {
        events: Vec<PayoutEvent>,
    }

    impl Broker for FakeBroker {
        fn send(&mut self, event: PayoutEvent) {
            self.events.push(event);
        }

        fn send_batch(&mut self, events: Vec<PayoutEvent>) {
            self.events.extend(events);
        }
    }

    struct FakeTime(Timestamp);

    impl BlockTime for FakeTime {
        fn now(&self) -> Timestamp {
            self.0
        }
    }

    fn validator(node_id: &str, pub_key: &str, self_stake: u64, delegators: &[(&str, u64)]) -> ValidatorData {
        let delegators: BTreeMap<PartyId, Amount> = delegators
            .iter()
            .map(|(party, delegated)| (party.to_string(), Amount::from(*delegated)))
            .collect();
        let stake_by_delegators = delegators.values().fold(Amount::zero(), |sum, d| sum + d);

        ValidatorData {
            node_id: node_id.to_string(),
            pub_key: pub_key.to_string(),
            self_stake: Amount::from(self_stake),
            stake_by_delegators,
            delegators,
        }
    }

    fn scores(entries: &[(&str, (u64, u64))]) -> ScoreData {
        ScoreData {
            normalised_scores: entries
                .iter()
                .map(|(node, (n, d))| (node.to_string(), safe_ratio(*n, *d)))
                .collect::<BTreeMap<NodeId, SafeRatio>>(),
        }
    }

    fn staking_account(id: &str, balance: u64) -> RewardAccount {
        RewardAccount {
            id: id.to_string(),
            asset: "staking-asset".to_string(),
            market: MarketId::new(),
            balance: Amount::from(balance),
            dispatch_strategy: None,
        }
    }

    fn engine(
        delegation: FakeDelegation,
        topology: FakeTopology,
        collateral: FakeCollateral,
        activity: FakeActivity,
    ) -> Engine<FakeDelegation, FakeTopology, FakeCollateral, FakeActivity, FakeBroker, FakeTime>
    {
        Engine::new(
            delegation,
            topology,
            collateral,
            activity,
            FakeBroker::default(),
            FakeTime(1_662_000_000),
            GlobalRewardParams {
                delegator_share: safe_ratio(3, 10),
                staking_asset: "staking-asset".to_string(),
                ..GlobalRewardParams::default()
            },
        )
    }

    fn epoch(seq: u64) -> Epoch {
        Epoch::new(seq, 1_000, 2_000)
    }

    #[test]
    fn epoch_start_only_records_the_epoch() {
        let mut engine = engine(
            FakeDelegation::default(),
            FakeTopology::default(),
            FakeCollateral::default(),
            FakeActivity::default(),
        );

        engine.on_epoch_start(&epoch(3));

        assert_eq!(engine.epoch_seq(), 3);
        assert!(engine.is_epoch_open());
        assert!(engine.collateral.transfers.is_empty());
        assert!(engine.broker.events.is_empty());
    }

    #[test]
    fn distributes_a_staking_account_and_requests_transfers() {
        let delegation = FakeDelegation {
            validators: vec![
                validator("node-1", "v1", 10_000, &[("d1", 5_000), ("d2", 5_000)]),
                validator("node-2", "v2", 20_000, &[("d1", 10_000)]),
            ],
            ..FakeDelegation::default()
        };
        let topology = FakeTopology {
            primary: scores(&[("node-1", (1, 4)), ("node-2", (3, 4))]),
            ..FakeTopology::default()
        };
        let collateral = FakeCollateral {
            accounts: vec![(RewardKind::Staking, staking_account("acc-staking", 1_000))],
            ..FakeCollateral::default()
        };

        let mut engine = engine(delegation, topology, collateral, FakeActivity::default());
        engine.on_epoch_start(&epoch(4));
        engine.on_epoch_end(&epoch(4));

        // No ersatz set: the primary factor is one and the pool goes out
        // whole, minus rounding dust.
        let (from_account, transfers) = &engine.collateral.transfers[0];
        assert_eq!(from_account, "acc-staking");
        assert_eq!(transfers.len(), 4);
        assert!(transfers
            .iter()
            .all(|transfer| transfer.min_amount == transfer.amount));

        let total = transfers
            .iter()
            .fold(Amount::zero(), |sum, t| sum + &t.amount);
        assert_eq!(total, Amount::from(998u64));

        // One event per party, in party order.
        let parties: Vec<_> = engine.broker.events.iter().map(|e| e.party.clone()).collect();
        assert_eq!(parties, vec!["d1", "d2", "v1", "v2"]);

        // Delegations were processed for this epoch and the next validator
        // set was requested for the following one.
        assert_eq!(engine.delegation.processed_epochs, vec![4]);
        assert_eq!(engine.topology.recalced_for, vec![5]);
    }

    #[test]
    fn splits_staking_rewards_between_primary_and_ersatz_sets() {
        let delegation = FakeDelegation {
            validators: vec![
                validator("node-1", "v1", 3_000, &[]),
                validator("node-2", "v2", 2_000, &[]),
            ],
            ..FakeDelegation::default()
        };
        let topology = FakeTopology {
            primary: scores(&[("node-1", (1, 1))]),
            ersatz: scores(&[("node-2", (1, 1))]),
            ..FakeTopology::default()
        };
        let collateral = FakeCollateral {
            accounts: vec![(RewardKind::Staking, staking_account("acc-staking", 1_000))],
            ..FakeCollateral::default()
        };

        let mut engine = engine(delegation, topology, collateral, FakeActivity::default());
        engine.on_epoch_end(&epoch(1));

        // Primary stake 3000 vs discounted ersatz stake 1000: factors 3/4
        // and 1/4, so 750 to v1 and 250 to v2 (no delegators anywhere).
        assert_eq!(engine.collateral.transfers.len(), 2);
        let amounts: BTreeMap<PartyId, Amount> = engine
            .collateral
            .transfers
            .iter()
            .flat_map(|(_, transfers)| transfers.iter())
            .map(|t| (t.owner.clone(), t.amount.clone()))
            .collect();
        assert_eq!(amounts.get("v1"), Some(&Amount::from(750u64)));
        assert_eq!(amounts.get("v2"), Some(&Amount::from(250u64)));
    }

    #[test]
    fn pays_the_proposer_bonus_and_marks_the_market_paid_once() {
        let collateral = FakeCollateral {
            accounts: vec![(
                RewardKind::MarketProposer,
                RewardAccount {
                    id: "acc-proposer".to_string(),
                    asset: "asset-1".to_string(),
                    market: "market-1".to_string(),
                    balance: Amount::from(9_000u64),
                    dispatch_strategy: None,
                },
            )],
            ..FakeCollateral::default()
        };
        let activity = FakeActivity {
            proposers: vec!["p1".to_string(), "p2".to_string(), "p3".to_string()],
            ..FakeActivity::default()
        };

        let mut engine = engine(
            FakeDelegation::default(),
            FakeTopology::default(),
            collateral,
            activity,
        );
        engine.on_epoch_end(&epoch(2));

        let (_, transfers) = &engine.collateral.transfers[0];
        assert!(transfers
            .iter()
            .all(|t| t.amount == Amount::from(3_000u64)));
        assert_eq!(engine.market_activity.paid_markets, vec!["market-1"]);
    }

    #[test]
    fn a_failed_transfer_abandons_the_account_without_retry() {
        let collateral = FakeCollateral {
            accounts: vec![(
                RewardKind::MarketProposer,
                RewardAccount {
                    id: "acc-proposer".to_string(),
                    asset: "asset-1".to_string(),
                    market: "market-1".to_string(),
                    balance: Amount::from(9_000u64),
                    dispatch_strategy: None,
                },
            )],
            failing: BTreeSet::from(["acc-proposer".to_string()]),
            ..FakeCollateral::default()
        };
        let activity = FakeActivity {
            proposers: vec!["p1".to_string()],
            ..FakeActivity::default()
        };

        let mut engine = engine(
            FakeDelegation::default(),
            FakeTopology::default(),
            collateral,
            activity,
        );
        engine.on_epoch_end(&epoch(2));

        // Events went out once; the transfer failed; the bonus is not
        // recorded as paid so it can be retried next epoch.
        assert_eq!(engine.broker.events.len(), 1);
        assert!(engine.collateral.transfers.is_empty());
        assert!(engine.market_activity.paid_markets.is_empty());
    }

    #[test]
    fn distributes_fee_rewards_with_the_account_strategy() {
        let collateral = FakeCollateral {
            accounts: vec![(
                RewardKind::MakerFeeReceived,
                RewardAccount {
                    id: "acc-maker".to_string(),
                    asset: "asset-1".to_string(),
                    market: "market-1".to_string(),
                    balance: Amount::from(10_000u64),
                    dispatch_strategy: Some(DispatchStrategy {
                        lock_period: 3,
                        ..DispatchStrategy::default()
                    }),
                },
            )],
            ..FakeCollateral::default()
        };
        let activity = FakeActivity {
            party_scores: vec![
                PartyScore::new("p1", safe_ratio(3, 4)),
                PartyScore::new("p2", safe_ratio(1, 4)),
            ],
            ..FakeActivity::default()
        };

        let mut engine = engine(
            FakeDelegation::default(),
            FakeTopology::default(),
            collateral,
            activity,
        );
        engine.on_epoch_end(&epoch(7));

        let amounts: BTreeMap<PartyId, Amount> = engine
            .collateral
            .transfers
            .iter()
            .flat_map(|(_, transfers)| transfers.iter())
            .map(|t| (t.owner.clone(), t.amount.clone()))
            .collect();
        assert_eq!(amounts.get("p1"), Some(&Amount::from(7_500u64)));
        assert_eq!(amounts.get("p2"), Some(&Amount::from(2_500u64)));

        // The strategy's lock shows up on the events.
        assert!(engine
            .broker
            .events
            .iter()
            .all(|event| event.locked_until_epoch == 10));
    }

    #[test]
    fn empty_or_unfunded_accounts_produce_nothing() {
        let collateral = FakeCollateral {
            accounts: vec![
                (RewardKind::Staking, staking_account("acc-0", 0)),
                (RewardKind::LpFee, staking_account("acc-1", 500)),
            ],
            ..FakeCollateral::default()
        };
        // No fee scores: the LP account has a balance but nobody scored.
        let mut engine = engine(
            FakeDelegation::default(),
            FakeTopology::default(),
            collateral,
            FakeActivity::default(),
        );
        engine.on_epoch_end(&epoch(1));

        assert!(engine.collateral.transfers.is_empty());
        assert!(engine.broker.events.is_empty());
    }

    #[test]
    fn set_factors_weight_by_discounted_delegation() {
        let primary = [validator("node-1", "v1", 3_000, &[])];
        let ersatz = [validator("node-2", "v2", 2_000, &[])];

        let (factor_primary, factor_ersatz) =
            validator_set_factors(&primary, &ersatz, &safe_ratio(1, 2));

        assert_eq!(factor_primary, safe_ratio(3, 4));
        assert_eq!(factor_ersatz, safe_ratio(1, 4));
        assert_eq!(factor_primary + factor_ersatz, SafeRatio::one());
    }

    #[test]
    fn set_factors_are_zero_without_delegation() {
        let (factor_primary, factor_ersatz) = validator_set_factors(&[], &[], &safe_ratio(1, 2));
        assert_eq!(factor_primary, SafeRatio::zero());
        assert_eq!(factor_ersatz, SafeRatio::zero());
    }
}
