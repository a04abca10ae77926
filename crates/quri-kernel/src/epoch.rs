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

use crate::Timestamp;

/// A fixed administrative period of the protocol. Rewards are computed and
/// paid at epoch boundaries, from the state as it stands when the epoch ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Epoch {
    pub seq: u64,

    /// Block time at which the epoch opened.
    pub start_time: Timestamp,

    /// Block time at which the epoch closed. Zero while the epoch is still
    /// open.
    pub end_time: Timestamp,
}

impl Epoch {
    pub fn new(seq: u64, start_time: Timestamp, end_time: Timestamp) -> Self {
        Self {
            seq,
            start_time,
            end_time,
        }
    }
}
