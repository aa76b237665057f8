//! Rank topology of a simulation.

use serde::{Deserialize, Serialize};

/// How many ranks a simulation uses, as far as is known yet.
///
/// `None` means the count has not been decided. A total of zero is treated
/// the same way, matching the "let the launcher choose" convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankTopology {
    /// Total ranks per simulation
    #[serde(default)]
    pub ranks: Option<u32>,

    /// Ranks dedicated to PME per simulation
    #[serde(default)]
    pub pme_ranks: Option<u32>,
}

impl RankTopology {
    /// Topology with nothing decided yet.
    pub fn unresolved() -> Self {
        Self::default()
    }

    /// A single-rank simulation without separate PME ranks.
    pub fn single_rank() -> Self {
        Self { ranks: Some(1), pme_ranks: Some(0) }
    }

    /// Topology with a fixed total and an undecided PME rank count.
    pub fn with_ranks(ranks: u32) -> Self {
        Self { ranks: Some(ranks), pme_ranks: None }
    }

    /// Set the number of dedicated PME ranks.
    pub fn with_pme_ranks(mut self, pme_ranks: u32) -> Self {
        self.pme_ranks = Some(pme_ranks);
        self
    }

    /// Total rank count, if decided.
    pub fn rank_count(&self) -> Option<u32> {
        self.ranks.filter(|&n| n > 0)
    }

    /// Whether the total rank count is known.
    pub fn is_rank_count_resolved(&self) -> bool {
        self.rank_count().is_some()
    }

    /// Whether this is a known single-rank simulation.
    pub fn is_single_rank(&self) -> bool {
        self.rank_count() == Some(1)
    }

    /// Whether no rank is set aside for PME (undecided counts as none).
    pub fn has_no_separate_pme_ranks(&self) -> bool {
        self.pme_ranks.unwrap_or(0) == 0
    }

    /// Whether PME work would be spread in a way the GPU path cannot handle.
    ///
    /// PME on a GPU needs exactly one rank doing PME: either the only rank,
    /// or a single dedicated PME rank.
    pub fn splits_pme_across_ranks(&self) -> bool {
        let multi_rank = self.rank_count().is_some_and(|n| n > 1);
        (multi_rank && self.pme_ranks == Some(0)) || self.pme_ranks.is_some_and(|n| n > 1)
    }
}

impl std::fmt::Display for RankTopology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.rank_count() {
            Some(n) => write!(f, "{} rank(s)", n)?,
            None => f.write_str("auto ranks")?,
        }
        match self.pme_ranks {
            Some(n) => write!(f, ", {} PME rank(s)", n),
            None => f.write_str(", auto PME ranks"),
        }
    }
}
