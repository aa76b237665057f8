//! Placement of PME reciprocal-space electrostatics.

use taskplan_core::{
    BuildInfo, HardwareInventory, PlacementError, RankTopology, Result, SimulationSettings,
    TaskTarget, UserGpuTaskAssignment,
};
use crate::messages::require_explicit_target;
use crate::scope::DecisionScope;
use crate::support::PmeGpuSupport;

/// Facts the PME decision depends on.
#[derive(Clone, Copy)]
pub struct PmeInputs<'a> {
    /// Whether nonbonded interactions were placed on the GPU
    pub nonbonded_on_gpu: bool,
    /// Requested target
    pub target: TaskTarget,
    /// Decision scope
    pub scope: DecisionScope,
    /// Explicit device assignment
    pub assignment: &'a UserGpuTaskAssignment,
    /// Capability queries
    pub support: &'a dyn PmeGpuSupport,
    /// Build capabilities
    pub build: &'a BuildInfo,
    /// Devices visible to this process
    pub inventory: &'a HardwareInventory,
    /// Simulation settings
    pub settings: &'a SimulationSettings,
    /// Rank topology
    pub topology: &'a RankTopology,
}

/// Decide whether PME runs on the GPU.
pub fn decide_pme(inputs: &PmeInputs<'_>) -> Result<bool> {
    let target = inputs.target;

    if target == TaskTarget::Cpu {
        return Ok(false);
    }

    require_explicit_target(
        target,
        inputs.assignment,
        inputs.scope,
        inputs.topology,
        inputs.build,
        "all of -nb, -pme, and -ntmpi",
    )?;

    if !inputs.nonbonded_on_gpu {
        if target == TaskTarget::Gpu {
            return Err(PlacementError::not_implemented(
                "PME on GPUs is only supported when nonbonded interactions run on GPUs also.",
            ));
        }
        return Ok(false);
    }

    let checks = [
        inputs.support.supports_build(inputs.build),
        inputs.support.supports_hardware(inputs.inventory),
        inputs.support.supports_input(inputs.settings),
    ];
    for check in checks {
        if let Err(reason) = check {
            if target == TaskTarget::Gpu {
                return Err(PlacementError::not_implemented(format!(
                    "Cannot compute PME interactions on a GPU, because {}",
                    reason
                )));
            }
            return Ok(false);
        }
    }

    let split_pme = inputs.topology.splits_pme_across_ranks();

    if !inputs.assignment.is_empty() {
        // The target is Gpu here; Auto was rejected above.
        if split_pme {
            return Err(PlacementError::inconsistent(
                "When you run with -pme gpu -gputasks, you must supply a PME-enabled run \
                 input and use a single PME rank.",
            ));
        }
        return Ok(true);
    }

    if target == TaskTarget::Gpu {
        if split_pme {
            return Err(PlacementError::not_implemented(
                "PME tasks were required to run on GPUs, but that is not implemented with \
                 more than one PME rank. Use a single rank simulation, or a separate PME rank, \
                 or permit PME tasks to be assigned to the CPU.",
            ));
        }
        return Ok(true);
    }

    if inputs.topology.is_single_rank() {
        // A single GPU shared with nonbonded work handles PME well.
        return Ok(inputs.scope.has_usable_gpu(inputs.inventory));
    }

    if !inputs.topology.is_rank_count_resolved() && inputs.scope == DecisionScope::Global {
        // Fully automatic: only with exactly one GPU, so the run is not
        // split over several ranks just to share it.
        return Ok(inputs.inventory.usable_count() == 1);
    }

    Ok(false)
}
