//! Placement of short-range nonbonded interactions.

use taskplan_core::{
    BuildInfo, HardwareInventory, PlacementError, RankTopology, Result, TaskTarget,
    UserGpuTaskAssignment,
};
use crate::messages::require_explicit_target;
use crate::scope::DecisionScope;

/// Facts the nonbonded decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct NonbondedInputs<'a> {
    /// Requested target
    pub target: TaskTarget,
    /// Decision scope
    pub scope: DecisionScope,
    /// Devices visible to this process
    pub inventory: &'a HardwareInventory,
    /// Explicit device assignment
    pub assignment: &'a UserGpuTaskAssignment,
    /// Run the GPU code path on the CPU instead
    pub emulate: bool,
    /// Build capabilities
    pub build: &'a BuildInfo,
    /// Whether the settings make GPU nonbonded worthwhile
    pub useful: bool,
    /// Rank topology
    pub topology: &'a RankTopology,
}

/// Decide whether nonbonded interactions run on the GPU.
///
/// Missing capabilities fall back to the CPU silently unless the user
/// required the GPU, in which case the specific problem is reported.
pub fn decide_nonbonded(inputs: &NonbondedInputs<'_>) -> Result<bool> {
    let target = inputs.target;
    let have_assignment = !inputs.assignment.is_empty();

    if target == TaskTarget::Cpu {
        if have_assignment {
            return Err(PlacementError::inconsistent(
                "A GPU task assignment was specified, but nonbonded interactions were \
                 assigned to the CPU. Make no more than one of these choices.",
            ));
        }
        return Ok(false);
    }

    let build_supported = inputs.build.supports_nonbonded_on_gpu();
    if !build_supported && target == TaskTarget::Gpu {
        return Err(PlacementError::inconsistent(
            "Nonbonded interactions on the GPU were requested with -nb gpu, but the binary \
             has been built without GPU support. Either run without selecting GPU options, \
             or rebuild with GPU support enabled.",
        ));
    }

    if inputs.emulate {
        if target == TaskTarget::Gpu {
            return Err(PlacementError::inconsistent(
                "Nonbonded interactions on the GPU were required, which is inconsistent \
                 with choosing emulation. Make no more than one of these choices.",
            ));
        }
        if have_assignment {
            return Err(PlacementError::inconsistent(
                "GPU ID usage was specified, as was GPU emulation. Make no more than one \
                 of these choices.",
            ));
        }
        return Ok(false);
    }

    require_explicit_target(
        target,
        inputs.assignment,
        inputs.scope,
        inputs.topology,
        inputs.build,
        "-nb and -ntmpi",
    )?;

    if !build_supported {
        return Ok(false);
    }

    if !inputs.useful {
        if target == TaskTarget::Gpu {
            return Err(PlacementError::inconsistent(
                "Nonbonded interactions on the GPU were required, but not supported for these \
                 simulation settings. Change your settings, or do not require using GPUs.",
            ));
        }
        return Ok(false);
    }

    // Whether a GPU actually exists is checked once the duty of the rank
    // is known: a PME-only rank may legitimately have none.
    if have_assignment || target == TaskTarget::Gpu {
        return Ok(true);
    }

    Ok(inputs.scope.has_usable_gpu(inputs.inventory))
}
