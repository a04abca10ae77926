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

pub mod arith;
pub mod dispatch;
pub mod epoch;

pub use arith::{
    amount_ratio, complement, floor_to_amount, fraction_of, safe_ratio, Amount, SafeRatio,
};
pub use dispatch::{find_rank, DispatchStrategy, DistributionKind, EntityScope, RankTier};
pub use epoch::Epoch;

/// A party on the network, identified by the hex-encoded public key of its
/// signing keypair.
pub type PartyId = String;

/// A validator node identifier, distinct from the party key its operator
/// collects rewards with.
pub type NodeId = String;

/// A settlement asset identifier.
pub type AssetId = String;

/// A market identifier. Reward accounts which are not bound to a market carry
/// an empty one.
pub type MarketId = String;

/// A team identifier, grouping parties for team-scoped reward metrics.
pub type TeamId = String;

/// A collateral account identifier.
pub type AccountId = String;

/// Consensus block time, in nanoseconds since the Unix epoch. This is the
/// only clock the rewards engine is allowed to observe: every node agrees on
/// it, wall clocks do not.
pub type Timestamp = i64;
