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

use quri_kernel::Timestamp;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// The epoch-scoped pseudo-random source.
///
/// Seeded exclusively from consensus block time, so every node draws the same
/// sequence when replaying the same epoch boundary. Re-seeded at each epoch
/// end and threaded explicitly (`&mut`) into the one place that needs it (the
/// delegator-weight precision correction); there is no global generator and
/// no OS entropy anywhere in the engine.
#[derive(Debug, Clone)]
pub struct EpochRng {
    inner: StdRng,
}

impl EpochRng {
    pub fn from_block_time(at: Timestamp) -> Self {
        Self {
            inner: StdRng::seed_from_u64(at as u64),
        }
    }

    /// A uniformly drawn index in `0..bound`; zero when `bound` is zero.
    pub fn pick_index(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        self.inner.random_range(0..bound)
    }
}
