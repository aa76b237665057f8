//! Placement of the coordinate and velocity update.

use taskplan_core::{
    Barostat, BuildInfo, Integrator, PlacementError, Result, SimulationSettings, TaskTarget,
    Thermostat, UserGpuTaskAssignment,
};
use crate::messages::{specify_everything, UnmetConditions};

const REQUIRED_PREFIX: &str =
    "Update task on the GPU was required,\nbut the following condition(s) were not satisfied:";

/// Facts the update decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct UpdateInputs<'a> {
    /// Put update on the GPU for `Auto` when nothing prevents it
    pub force_default_on: bool,
    /// Whether the system is split over several domains
    pub domain_decomposition: bool,
    /// Whether nonbonded interactions were placed on the GPU
    pub nonbonded_on_gpu: bool,
    /// Whether PME was placed on the GPU
    pub pme_on_gpu: bool,
    /// Requested target
    pub target: TaskTarget,
    /// Explicit device assignment
    pub assignment: &'a UserGpuTaskAssignment,
    /// Whether any GPU was detected
    pub gpus_detected: bool,
    /// Build capabilities
    pub build: &'a BuildInfo,
    /// Simulation settings
    pub settings: &'a SimulationSettings,
}

/// Collect every reason the update cannot run on the GPU.
pub fn unmet_update_conditions(inputs: &UpdateInputs<'_>) -> UnmetConditions {
    let settings = inputs.settings;
    let mut unmet = UnmetConditions::new();

    unmet
        .check(inputs.domain_decomposition, "Domain decomposition is not supported.")
        // The GPU must already hold the coordinates, either for PME spread
        // or for the nonbonded kernels.
        .check(
            !(inputs.pme_on_gpu || inputs.nonbonded_on_gpu),
            "Either PME or short-ranged non-bonded interaction tasks must run on the GPU.",
        )
        .check(!inputs.gpus_detected, "Compatible GPUs must have been found.")
        .check(!inputs.build.supports_update_on_gpu(), "Only a CUDA build is supported.")
        .check(settings.integrator != Integrator::Md, "Only the md integrator is supported.")
        .check(
            settings.thermostat == Thermostat::NoseHoover,
            "Nose-Hoover temperature coupling is not supported.",
        )
        .check(
            !matches!(
                settings.barostat,
                Barostat::No | Barostat::ParrinelloRahman | Barostat::Berendsen
            ),
            "Only Parrinello-Rahman and Berendsen pressure coupling are supported.",
        )
        .check(
            settings.uses_ewald_surface_correction(),
            "Ewald surface correction is not supported.",
        )
        .check(settings.virtual_sites, "Virtual sites are not supported.")
        .check(settings.essential_dynamics, "Essential dynamics is not supported.")
        // Pull potentials would work; constraint pulling would not.
        .check(settings.pull, "Pulling is not supported.")
        .check(settings.orientation_restraints, "Orientation restraints are not supported.")
        .check(settings.uses_free_energy(), "Free energy perturbations are not supported.")
        .check(settings.replica_exchange, "Replica exchange simulations are not supported.")
        .check(settings.uses_swap_coords(), "Swapping the coordinates is not supported.");

    unmet
}

/// Decide whether the update runs on the GPU.
///
/// When the GPU was required, every unmet condition is reported in one
/// error rather than only the first.
pub fn decide_update(inputs: &UpdateInputs<'_>) -> Result<bool> {
    let target = inputs.target;

    if target == TaskTarget::Cpu {
        return Ok(false);
    }

    if !inputs.assignment.is_empty() && target == TaskTarget::Auto {
        return Err(specify_everything(inputs.build, "-update"));
    }

    let unmet = unmet_update_conditions(inputs);
    if !unmet.is_empty() {
        if target == TaskTarget::Gpu {
            return Err(PlacementError::inconsistent(unmet.report(REQUIRED_PREFIX)));
        }
        return Ok(false);
    }

    Ok((inputs.force_default_on && target == TaskTarget::Auto) || target == TaskTarget::Gpu)
}
