//! Decision scopes.

use serde::{Deserialize, Serialize};
use taskplan_core::HardwareInventory;

/// Which facts a decision can rely on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionScope {
    /// One process hosting every rank. All usable devices are known before
    /// ranks start, so one decision is made and shared by all of them.
    Global,
    /// Each rank decides alone from what it can see locally.
    #[default]
    Rank,
}

impl DecisionScope {
    /// Whether there is a GPU this scope may count on for `Auto` targets.
    pub fn has_usable_gpu(&self, inventory: &HardwareInventory) -> bool {
        match self {
            Self::Global => !inventory.usable_devices.is_empty(),
            Self::Rank => inventory.gpus_detected,
        }
    }
}

impl std::fmt::Display for DecisionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Rank => f.write_str("rank"),
        }
    }
}

impl std::str::FromStr for DecisionScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "rank" => Ok(Self::Rank),
            other => Err(format!("unknown decision scope '{}'", other)),
        }
    }
}
