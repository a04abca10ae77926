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

/// How a fee-based reward pool is apportioned among its contributors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DistributionKind {
    /// Shares proportional to (multiplier-weighted) contribution scores.
    #[default]
    ProRata,
    /// Shares determined by discrete position in the sorted contribution
    /// ranking, via the strategy's rank table.
    Rank,
}

/// Whether contribution scores are measured per party or per team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntityScope {
    #[default]
    Individuals,
    Teams,
}

/// One tier of a rank table. Every position from `start_rank` (1-indexed,
/// inclusive) up to the next tier's `start_rank` (exclusive) earns
/// `share_ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankTier {
    pub start_rank: u32,
    pub share_ratio: u32,
}

/// Per-account configuration describing how its reward pool is dispatched.
///
/// The rank table is ordered by `start_rank` and its ratios are expected to be
/// non-increasing; a tier with a `share_ratio` of zero closes the paid field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStrategy {
    pub kind: DistributionKind,
    pub scope: EntityScope,

    /// Number of epochs earned rewards stay locked in the recipient's vesting
    /// account before they start releasing.
    pub lock_period: u64,

    pub rank_table: Vec<RankTier>,
}

/// The `share_ratio` earned at the given 1-indexed position: that of the
/// highest tier whose `start_rank` does not exceed the position, or zero when
/// the position precedes the first tier.
pub fn find_rank(rank_table: &[RankTier], position: u32) -> u32 {
    let mut share_ratio = 0;
    for tier in rank_table {
        if tier.start_rank > position {
            break;
        }
        share_ratio = tier.share_ratio;
    }
    share_ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn table() -> Vec<RankTier> {
        [(1, 10), (2, 5), (4, 2), (10, 1), (20, 0)]
            .into_iter()
            .map(|(start_rank, share_ratio)| RankTier {
                start_rank,
                share_ratio,
            })
            .collect()
    }

    #[test_case(1, 10)]
    #[test_case(2, 5)]
    #[test_case(3, 5)]
    #[test_case(4, 2)]
    #[test_case(10, 1)]
    #[test_case(20, 0)]
    #[test_case(21, 0)]
    fn find_rank_picks_the_enclosing_tier(position: u32, expected: u32) {
        assert_eq!(find_rank(&table(), position), expected);
    }

    #[test]
    fn find_rank_before_the_first_tier_is_zero() {
        let table = [RankTier {
            start_rank: 3,
            share_ratio: 7,
        }];
        assert_eq!(find_rank(&table, 1), 0);
        assert_eq!(find_rank(&table, 2), 0);
        assert_eq!(find_rank(&table, 3), 7);
    }

    #[test]
    fn find_rank_on_an_empty_table_is_zero() {
        assert_eq!(find_rank(&[], 1), 0);
    }
}
