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

use crate::serde::{encode_amount, serialize_string_map};
use num::traits::Zero;
use quri_kernel::{AccountId, Amount, AssetId, MarketId, PartyId, Timestamp};
use serde::ser::SerializeStruct;
use std::{collections::BTreeMap, fmt};

/// The kind of reward account a pool balance sits in, which selects the
/// calculator apportioning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RewardKind {
    /// The global staking reward pool, split between validators and their
    /// delegators by stake weight.
    Staking,
    /// Infrastructure fees accrued over the epoch, split like staking
    /// rewards.
    InfrastructureFee,
    /// Rewards for parties by maker fees received.
    MakerFeeReceived,
    /// Rewards for parties by maker fees paid.
    MakerFeePaid,
    /// Rewards for liquidity providers by fees received.
    LpFee,
    /// A one-off bonus for the proposers of a market meeting its activity
    /// threshold, split equally.
    MarketProposer,
    /// Rewards for ranked participants by validator-ranking score.
    ValidatorRanking,
}

/// The order in which the engine visits reward account kinds at the epoch
/// boundary. Fixed: it is part of replicated output.
pub const REWARD_KIND_ORDER: [RewardKind; 7] = [
    RewardKind::Staking,
    RewardKind::InfrastructureFee,
    RewardKind::MakerFeeReceived,
    RewardKind::MakerFeePaid,
    RewardKind::LpFee,
    RewardKind::MarketProposer,
    RewardKind::ValidatorRanking,
];

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Staking => "staking",
            Self::InfrastructureFee => "infrastructure_fee",
            Self::MakerFeeReceived => "maker_fee_received",
            Self::MakerFeePaid => "maker_fee_paid",
            Self::LpFee => "lp_fee",
            Self::MarketProposer => "market_proposer",
            Self::ValidatorRanking => "validator_ranking",
        })
    }
}

/// A funded reward pool as seen by a calculator: the account it drains, and
/// the stamp its payout will carry. One `Payout` is constructed per
/// (account, scheme) pair per epoch, fully populated, and never mutated
/// afterwards.
#[derive(Debug, Clone)]
pub struct RewardPool<'a> {
    pub kind: RewardKind,
    pub from_account: &'a AccountId,
    pub asset: &'a AssetId,
    pub market: &'a MarketId,
    pub epoch_seq: u64,
    pub timestamp: Timestamp,
}

impl RewardPool<'_> {
    /// Seal a computed distribution into a payout. `party_to_amount` must
    /// contain no zero entries; `total_reward` must be its exact sum.
    pub(crate) fn payout(
        &self,
        party_to_amount: BTreeMap<PartyId, Amount>,
        total_reward: Amount,
        locked_for_epochs: u64,
    ) -> Payout {
        Payout {
            kind: self.kind,
            from_account: self.from_account.clone(),
            asset: self.asset.clone(),
            party_to_amount,
            total_reward,
            epoch_seq: self.epoch_seq,
            timestamp: self.timestamp,
            market: self.market.clone(),
            locked_for_epochs,
        }
    }
}

/// The computed distribution of one reward pool balance for one epoch.
///
/// Invariants, upheld at construction:
///
/// - `total_reward` equals the sum of `party_to_amount` values;
/// - every entry in `party_to_amount` is strictly positive;
/// - a payout whose `total_reward` is zero is treated as "no payout" by the
///   engine: not emitted, not transferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payout {
    pub kind: RewardKind,
    pub from_account: AccountId,
    pub asset: AssetId,
    pub party_to_amount: BTreeMap<PartyId, Amount>,
    pub total_reward: Amount,
    pub epoch_seq: u64,
    pub timestamp: Timestamp,
    pub market: MarketId,
    pub locked_for_epochs: u64,
}

impl Payout {
    pub fn is_empty(&self) -> bool {
        self.party_to_amount.is_empty() || self.total_reward.is_zero()
    }
}

impl serde::Serialize for Payout {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Payout", 9)?;
        s.serialize_field("kind", &self.kind.to_string())?;
        s.serialize_field("from_account", &self.from_account)?;
        s.serialize_field("asset", &self.asset)?;
        serialize_string_map("party_to_amount", &mut s, &self.party_to_amount, |party| {
            party.clone()
        })?;
        s.serialize_field("total_reward", &encode_amount(&self.total_reward))?;
        s.serialize_field("epoch_seq", &self.epoch_seq)?;
        s.serialize_field("timestamp", &self.timestamp)?;
        s.serialize_field("market", &self.market)?;
        s.serialize_field("locked_for_epochs", &self.locked_for_epochs)?;
        s.end()
    }
}
