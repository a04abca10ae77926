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

/*
This crate implements the epoch reward distribution engine: the subsystem
which, at the end of every epoch, splits accumulated reward pool balances
among validators, delegators, fee contributors, market proposers and ranked
participants, and emits the resulting transfers.

The computation is part of deterministic state-machine replication: every
validator node replays it against the same epoch-end state and must produce
byte-identical payouts. Three rules follow from that and hold everywhere in
this crate:

- All arithmetic is exact. Balances are arbitrary-precision integers and
  shares are exact rationals; the only conversion between the two is the
  truncating [`quri_kernel::fraction_of`], so a distribution can undershoot
  its pool balance by rounding dust but can never overshoot it.

- All map iteration that affects output happens over `BTreeMap`, i.e. in key
  order.

- The single randomized step (the delegator-weight precision correction)
  draws from an [`rng::EpochRng`] seeded exclusively from consensus block
  time.

Distribution happens one epoch at a time, strictly sequentially: the
[`engine::Engine`] receives the epoch-end signal, pulls delegation and score
data from its collaborators, runs the matching calculator for each funded
reward account, then emits one event per rewarded party and requests a batch
transfer from the collateral ledger.
*/

pub mod calculators;
pub mod distribution;
pub mod engine;
pub mod payout;
pub mod rng;
pub mod serde;
pub mod services;
