//! Placement of bonded interactions.

use taskplan_core::{
    BuildInfo, PlacementError, RankTopology, Result, TaskTarget, UserGpuTaskAssignment,
};
use crate::messages::specify_everything;

/// Facts the bonded decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct BondedInputs<'a> {
    /// Whether nonbonded interactions were placed on the GPU
    pub nonbonded_on_gpu: bool,
    /// Whether PME was placed on the GPU
    pub pme_on_gpu: bool,
    /// Requested target
    pub target: TaskTarget,
    /// Explicit device assignment
    pub assignment: &'a UserGpuTaskAssignment,
    /// Build capabilities
    pub build: &'a BuildInfo,
    /// Whether bonded interactions can run on the GPU for this build and input
    pub supported: bool,
    /// Whether LJ-PME is in use
    pub uses_lj_pme: bool,
    /// Whether electrostatics use PME or Ewald
    pub uses_pme_or_ewald: bool,
    /// Rank topology
    pub topology: &'a RankTopology,
    /// Whether any GPU was detected
    pub gpus_detected: bool,
}

/// Decide whether bonded interactions run on the GPU.
pub fn decide_bonded(inputs: &BondedInputs<'_>) -> Result<bool> {
    let target = inputs.target;

    if target == TaskTarget::Cpu {
        return Ok(false);
    }

    if !inputs.assignment.is_empty() && target == TaskTarget::Auto {
        return Err(specify_everything(inputs.build, "-bonded"));
    }

    if !inputs.supported {
        if target == TaskTarget::Gpu {
            return Err(PlacementError::inconsistent(
                "Bonded interactions on the GPU were required, but not supported for these \
                 simulation settings. Change your settings, or do not require using GPUs.",
            ));
        }
        return Ok(false);
    }

    if !inputs.nonbonded_on_gpu {
        if target == TaskTarget::Gpu {
            return Err(PlacementError::inconsistent(
                "Bonded interactions on the GPU were required, but this requires that \
                 short-ranged non-bonded interactions are also run on the GPU. Change \
                 your settings, or do not require using GPUs.",
            ));
        }
        return Ok(false);
    }

    if target == TaskTarget::Gpu {
        return Ok(true);
    }

    // Auto: only offload when the CPU has its own long-range work to do.
    // Separate PME ranks are assumed not to be chosen automatically once
    // nonbonded work is on the GPU.
    let cpu_busy_with_long_range = inputs.uses_lj_pme
        || (inputs.uses_pme_or_ewald
            && !inputs.pme_on_gpu
            && inputs.topology.has_no_separate_pme_ranks());

    Ok(inputs.gpus_detected && cpu_busy_with_long_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskplan_core::{ErrorCategory, GpuBackend};

    struct Fixture {
        nonbonded_on_gpu: bool,
        pme_on_gpu: bool,
        assignment: UserGpuTaskAssignment,
        build: BuildInfo,
        supported: bool,
        uses_lj_pme: bool,
        uses_pme_or_ewald: bool,
        topology: RankTopology,
        gpus_detected: bool,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                nonbonded_on_gpu: true,
                pme_on_gpu: false,
                assignment: UserGpuTaskAssignment::none(),
                build: BuildInfo::new(GpuBackend::Cuda),
                supported: true,
                uses_lj_pme: false,
                uses_pme_or_ewald: true,
                topology: RankTopology::single_rank(),
                gpus_detected: true,
            }
        }

        fn decide(&self, target: TaskTarget) -> Result<bool> {
            decide_bonded(&BondedInputs {
                nonbonded_on_gpu: self.nonbonded_on_gpu,
                pme_on_gpu: self.pme_on_gpu,
                target,
                assignment: &self.assignment,
                build: &self.build,
                supported: self.supported,
                uses_lj_pme: self.uses_lj_pme,
                uses_pme_or_ewald: self.uses_pme_or_ewald,
                topology: &self.topology,
                gpus_detected: self.gpus_detected,
            })
        }
    }

    #[test]
    fn test_auto_fills_idle_gpu_while_cpu_does_pme() {
        let fixture = Fixture::new();
        assert_eq!(fixture.decide(TaskTarget::Auto), Ok(true));
    }

    #[test]
    fn test_auto_stays_on_cpu_when_pme_is_offloaded() {
        let mut fixture = Fixture::new();
        fixture.pme_on_gpu = true;
        assert_eq!(fixture.decide(TaskTarget::Auto), Ok(false));

        // LJ-PME still keeps the CPU busy
        fixture.uses_lj_pme = true;
        assert_eq!(fixture.decide(TaskTarget::Auto), Ok(true));
    }

    #[test]
    fn test_auto_with_separate_pme_rank_stays_on_cpu() {
        let mut fixture = Fixture::new();
        fixture.topology = RankTopology::with_ranks(4).with_pme_ranks(1);
        assert_eq!(fixture.decide(TaskTarget::Auto), Ok(false));
    }

    #[test]
    fn test_auto_needs_detected_gpu() {
        let mut fixture = Fixture::new();
        fixture.gpus_detected = false;
        assert_eq!(fixture.decide(TaskTarget::Auto), Ok(false));
        assert_eq!(fixture.decide(TaskTarget::Gpu), Ok(true));
    }

    #[test]
    fn test_cutoff_electrostatics_leave_cpu_idle() {
        let mut fixture = Fixture::new();
        fixture.uses_pme_or_ewald = false;
        assert_eq!(fixture.decide(TaskTarget::Auto), Ok(false));
    }

    #[test]
    fn test_forced_gpu_failures() {
        let mut fixture = Fixture::new();
        fixture.supported = false;
        let err = fixture.decide(TaskTarget::Gpu).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InconsistentInput);
        assert!(err.message().contains("not supported for these simulation settings"));
        assert_eq!(fixture.decide(TaskTarget::Auto), Ok(false));

        let mut fixture = Fixture::new();
        fixture.nonbonded_on_gpu = false;
        let err = fixture.decide(TaskTarget::Gpu).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InconsistentInput);
        assert!(err.message().contains("non-bonded interactions are also run on the GPU"));
        assert_eq!(fixture.decide(TaskTarget::Auto), Ok(false));
    }

    #[test]
    fn test_cpu_target_never_fails() {
        let mut fixture = Fixture::new();
        fixture.supported = false;
        fixture.nonbonded_on_gpu = false;
        fixture.assignment = UserGpuTaskAssignment::from_ids([0]);
        assert_eq!(fixture.decide(TaskTarget::Cpu), Ok(false));
    }

    #[test]
    fn test_assignment_with_auto_is_rejected() {
        let mut fixture = Fixture::new();
        fixture.assignment = UserGpuTaskAssignment::from_ids([0]);
        let err = fixture.decide(TaskTarget::Auto).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InconsistentInput);
        assert!(err.message().contains("-bonded"));
    }
}
