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

//! Contracts of the collaborators the engine reads from (and writes to) at
//! the epoch boundary. The engine owns none of this state: delegation and
//! scoring belong to their own subsystems, account balances and transfers to
//! the collateral ledger, and event delivery to the broker. Everything here
//! is synchronous; the engine runs inside state-transition execution and must
//! not block.

use crate::{
    distribution::{PartyScore, TeamScores},
    payout::RewardKind,
};
use quri_kernel::{
    AccountId, Amount, AssetId, DispatchStrategy, Epoch, MarketId, NodeId, PartyId, SafeRatio,
    Timestamp,
};
use std::collections::BTreeMap;
use thiserror::Error;

/// A validator node's stake position at the end of an epoch.
///
/// Invariant (owned upstream by the delegation subsystem, not re-verified
/// here): `stake_by_delegators` equals the sum of `delegators` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorData {
    pub node_id: NodeId,

    /// The party key the node operator collects rewards with.
    pub pub_key: PartyId,

    pub self_stake: Amount,
    pub stake_by_delegators: Amount,
    pub delegators: BTreeMap<PartyId, Amount>,
}

impl ValidatorData {
    pub fn total_stake(&self) -> Amount {
        &self.self_stake + &self.stake_by_delegators
    }
}

/// Per-node reward scores for one validator set, as computed by the topology
/// subsystem. Scores are normalised: they sum to at most one across the set.
#[derive(Debug, Clone, Default)]
pub struct ScoreData {
    pub normalised_scores: BTreeMap<NodeId, SafeRatio>,
}

/// The stake-related network parameters the topology subsystem needs to
/// compute reward scores. Held by the engine, forwarded on every request.
#[derive(Debug, Clone)]
pub struct StakeScoreParams {
    pub min_val_stake: Amount,
    pub optimal_stake_multiplier: SafeRatio,
    pub competition_level: SafeRatio,
    pub min_validators: u64,
}

/// A funded reward account, as surfaced by the collateral ledger.
#[derive(Debug, Clone)]
pub struct RewardAccount {
    pub id: AccountId,
    pub asset: AssetId,

    /// Empty for accounts not bound to a market (e.g. staking rewards).
    pub market: MarketId,

    pub balance: Amount,

    /// How this account's balance wants to be apportioned. Accounts funded
    /// by recurring transfers carry the transfer's strategy; `None` falls
    /// back to a pro-rata, individual-scoped split with no lock.
    pub dispatch_strategy: Option<DispatchStrategy>,
}

/// One ledger movement out of a reward account. `min_amount` always equals
/// `amount`: reward transfers are all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardTransfer {
    pub owner: PartyId,
    pub asset: AssetId,
    pub amount: Amount,
    pub min_amount: Amount,
    pub kind: RewardKind,
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("unknown reward account {0}")]
    UnknownAccount(AccountId),
    #[error("insufficient balance in reward account {account}: requested {requested}, available {available}")]
    InsufficientBalance {
        account: AccountId,
        requested: Amount,
        available: Amount,
    },
    #[error(transparent)]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// The event emitted for each rewarded party, one per entry of a payout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutEvent {
    pub party: PartyId,
    pub asset: AssetId,
    pub kind: RewardKind,
    pub market: MarketId,
    pub epoch_seq: u64,
    pub amount: Amount,

    /// This party's share of the payout's total, for downstream projections.
    pub percent_of_total: SafeRatio,

    pub timestamp: Timestamp,

    /// First epoch at which the reward starts vesting.
    pub locked_until_epoch: u64,
}

/// The delegation subsystem: owns who delegated how much to which node.
pub trait DelegationState {
    /// Finalize the epoch's delegations and return the resulting validator
    /// stake positions.
    fn process_epoch_delegations(&mut self, epoch: &Epoch) -> Vec<ValidatorData>;

    fn validator_data(&self) -> Vec<ValidatorData>;
}

/// The validator topology subsystem: owns performance and ranking scores.
pub trait Topology {
    /// Reward scores for the (consensus, standby) validator sets. A node's
    /// membership in either returned score map decides which set it is
    /// rewarded with.
    fn rewards_scores(
        &mut self,
        epoch_seq: u64,
        delegation: &[ValidatorData],
        params: &StakeScoreParams,
    ) -> (ScoreData, ScoreData);

    /// Ranking scores for ranked-participant rewards, already adjusted for
    /// tie-breaks by the topology subsystem.
    fn ranking_scores(&mut self, epoch_seq: u64) -> Vec<PartyScore>;

    /// Ask the topology to recompute the validator sets for the next epoch.
    fn recalc_validator_set(
        &mut self,
        next_epoch_seq: u64,
        delegation: &[ValidatorData],
        params: &StakeScoreParams,
    );
}

/// The collateral ledger: owns account balances and executes transfers.
pub trait Collateral {
    fn reward_accounts_by_kind(&self, kind: RewardKind) -> Vec<RewardAccount>;

    /// Execute a batch of reward transfers out of `from_account`. Either the
    /// whole batch settles or none of it does.
    fn transfer_rewards(
        &mut self,
        from_account: &AccountId,
        transfers: Vec<RewardTransfer>,
    ) -> Result<(), TransferError>;
}

/// The market activity tracker: owns fee-contribution metrics and the
/// proposer-bonus bookkeeping.
pub trait MarketActivity {
    fn eligible_proposers(&self, market: &MarketId) -> Vec<PartyId>;

    /// Record that the market's proposer bonus has been paid, so it is never
    /// paid twice.
    fn mark_proposer_paid(&mut self, market: &MarketId);

    fn fee_party_scores(&self, asset: &AssetId, kind: RewardKind) -> Vec<PartyScore>;

    /// Team-scoped fee scores.
    fn fee_team_scores(&self, asset: &AssetId, kind: RewardKind) -> Vec<TeamScores>;

    /// Per-party reward multipliers (e.g. activity streaks), applied on top
    /// of raw contribution scores. Parties absent from the map count as one.
    fn reward_multipliers(&self, asset: &AssetId) -> BTreeMap<PartyId, SafeRatio>;
}

/// The event bus. Fire-and-forget: the engine never observes a result.
pub trait Broker {
    fn send(&mut self, event: PayoutEvent);

    fn send_batch(&mut self, events: Vec<PayoutEvent>);
}

/// The consensus clock.
pub trait BlockTime {
    fn now(&self) -> Timestamp;
}
