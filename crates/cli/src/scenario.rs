//! Scenario files: a placement request plus the facts to decide it against.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use taskplan_core::{
    BuildInfo, Duty, GpuBackend, HardwareInventory, RankTopology, SimulationSettings, TaskTarget,
    UserGpuTaskAssignment,
};
use taskplan_placement::{DecisionScope, PlacementFacts, PlacementRequest};

/// A complete decision problem, as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Scope to decide in, unless overridden on the command line
    pub scope: DecisionScope,
    /// Requested targets
    pub request: PlacementRequest,
    /// Known facts
    pub facts: PlacementFacts,
}

impl Scenario {
    /// Load a scenario from a JSON file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse scenario {}", path.display()))
    }

    /// Parse a scenario from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// A single-rank CUDA run on one GPU, with the update forced onto it.
    pub fn sample() -> Self {
        Self {
            scope: DecisionScope::Rank,
            request: PlacementRequest::auto()
                .with_target(Duty::Nonbonded, TaskTarget::Gpu)
                .with_target(Duty::Update, TaskTarget::Gpu)
                .with_gpu_tasks(UserGpuTaskAssignment::none()),
            facts: PlacementFacts {
                build: BuildInfo::new(GpuBackend::Cuda),
                hardware: HardwareInventory::with_devices([0]),
                topology: RankTopology::single_rank(),
                settings: SimulationSettings::default(),
                ..Default::default()
            },
        }
    }
}
