//! The placement resolver - runs the per-duty decisions in order.

use serde::{Deserialize, Serialize};
use taskplan_core::{
    BuildInfo, Duty, HardwareInventory, PlacementDecision, RankTopology, Result,
    SimulationSettings, TaskTarget, UserGpuTaskAssignment,
};
use tracing::{debug, info};

use crate::bonded::{decide_bonded, BondedInputs};
use crate::config::ResolverConfig;
use crate::nonbonded::{decide_nonbonded, NonbondedInputs};
use crate::pme::{decide_pme, PmeInputs};
use crate::scope::DecisionScope;
use crate::support::{PmeGpuSupport, SettingsPmeSupport};
use crate::update::{decide_update, UpdateInputs};

/// What the user asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementRequest {
    /// Nonbonded target
    pub nonbonded: TaskTarget,
    /// PME target
    pub pme: TaskTarget,
    /// Bonded target
    pub bonded: TaskTarget,
    /// Update target
    pub update: TaskTarget,
    /// Explicit device assignment
    pub gpu_tasks: UserGpuTaskAssignment,
}

impl PlacementRequest {
    /// Leave every duty to the resolver.
    pub fn auto() -> Self {
        Self::default()
    }

    /// Requested target of a duty.
    pub fn target(&self, duty: Duty) -> TaskTarget {
        match duty {
            Duty::Nonbonded => self.nonbonded,
            Duty::Pme => self.pme,
            Duty::Bonded => self.bonded,
            Duty::Update => self.update,
        }
    }

    /// Set the target of a duty.
    pub fn with_target(mut self, duty: Duty, target: TaskTarget) -> Self {
        match duty {
            Duty::Nonbonded => self.nonbonded = target,
            Duty::Pme => self.pme = target,
            Duty::Bonded => self.bonded = target,
            Duty::Update => self.update = target,
        }
        self
    }

    /// Set the explicit device assignment.
    pub fn with_gpu_tasks(mut self, assignment: UserGpuTaskAssignment) -> Self {
        self.gpu_tasks = assignment;
        self
    }
}

/// What is known about the build, the machine, and the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementFacts {
    /// Build capabilities
    pub build: BuildInfo,
    /// Devices visible to this process
    pub hardware: HardwareInventory,
    /// Rank topology
    pub topology: RankTopology,
    /// Simulation settings
    pub settings: SimulationSettings,
    /// Whether the settings make GPU nonbonded worthwhile
    pub nonbonded_useful: bool,
    /// Whether the input allows bonded interactions on the GPU
    pub bonded_supported: bool,
    /// Whether domain decomposition is in use
    pub domain_decomposition: bool,
}

impl Default for PlacementFacts {
    fn default() -> Self {
        Self {
            build: BuildInfo::default(),
            hardware: HardwareInventory::default(),
            topology: RankTopology::default(),
            settings: SimulationSettings::default(),
            nonbonded_useful: true,
            bonded_supported: true,
            domain_decomposition: false,
        }
    }
}

/// Decides where every duty of a rank runs.
///
/// Both decision scopes go through the same resolvers; the scope only
/// changes how the hardware inventory and rank topology are read.
pub struct PlacementResolver {
    config: ResolverConfig,
    pme_support: Box<dyn PmeGpuSupport>,
}

impl PlacementResolver {
    /// Create a resolver with the default configuration.
    pub fn new() -> Self {
        Self {
            config: ResolverConfig::default(),
            pme_support: Box::new(SettingsPmeSupport),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the PME capability queries.
    pub fn with_pme_support(mut self, support: Box<dyn PmeGpuSupport>) -> Self {
        self.pme_support = support;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Decide once for every rank of a single-process run.
    ///
    /// The caller shares the returned decision with all ranks instead of
    /// resolving again on each of them.
    pub fn decide_global(
        &self,
        request: &PlacementRequest,
        facts: &PlacementFacts,
    ) -> Result<PlacementDecision> {
        self.decide(DecisionScope::Global, request, facts)
    }

    /// Decide for one rank from what it sees locally.
    pub fn decide_for_rank(
        &self,
        request: &PlacementRequest,
        facts: &PlacementFacts,
    ) -> Result<PlacementDecision> {
        self.decide(DecisionScope::Rank, request, facts)
    }

    /// Run the four resolvers in dependency order.
    pub fn decide(
        &self,
        scope: DecisionScope,
        request: &PlacementRequest,
        facts: &PlacementFacts,
    ) -> Result<PlacementDecision> {
        debug!("Resolving placement ({} scope, {})", scope, facts.topology);

        let nonbonded = decide_nonbonded(&NonbondedInputs {
            target: request.nonbonded,
            scope,
            inventory: &facts.hardware,
            assignment: &request.gpu_tasks,
            emulate: self.config.emulate_gpu_nonbonded,
            build: &facts.build,
            useful: facts.nonbonded_useful,
            topology: &facts.topology,
        })?;
        log_duty(Duty::Nonbonded, request.nonbonded, nonbonded);

        let pme = decide_pme(&PmeInputs {
            nonbonded_on_gpu: nonbonded,
            target: request.pme,
            scope,
            assignment: &request.gpu_tasks,
            support: self.pme_support.as_ref(),
            build: &facts.build,
            inventory: &facts.hardware,
            settings: &facts.settings,
            topology: &facts.topology,
        })?;
        log_duty(Duty::Pme, request.pme, pme);

        let bonded = decide_bonded(&BondedInputs {
            nonbonded_on_gpu: nonbonded,
            pme_on_gpu: pme,
            target: request.bonded,
            assignment: &request.gpu_tasks,
            build: &facts.build,
            supported: facts.bonded_supported && facts.build.supports_bonded_on_gpu(),
            uses_lj_pme: facts.settings.uses_lj_pme(),
            uses_pme_or_ewald: facts.settings.uses_pme_or_ewald(),
            topology: &facts.topology,
            gpus_detected: facts.hardware.gpus_detected,
        })?;
        log_duty(Duty::Bonded, request.bonded, bonded);

        let update = decide_update(&UpdateInputs {
            force_default_on: self.config.force_update_default_gpu,
            domain_decomposition: facts.domain_decomposition,
            nonbonded_on_gpu: nonbonded,
            pme_on_gpu: pme,
            target: request.update,
            assignment: &request.gpu_tasks,
            gpus_detected: facts.hardware.gpus_detected,
            build: &facts.build,
            settings: &facts.settings,
        })?;
        log_duty(Duty::Update, request.update, update);

        let decision = PlacementDecision { nonbonded, pme, bonded, update };
        info!("Placement decided: {}", decision);
        Ok(decision)
    }
}

impl Default for PlacementResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn log_duty(duty: Duty, target: TaskTarget, on_gpu: bool) {
    debug!(
        "{} (requested {}) -> {}",
        duty,
        target,
        if on_gpu { "GPU" } else { "CPU" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskplan_core::{CoulombType, ErrorCategory, GpuBackend, PlacementError, VdwType};

    const TARGETS: [TaskTarget; 3] = [TaskTarget::Auto, TaskTarget::Cpu, TaskTarget::Gpu];

    fn cuda_facts(devices: &[u32]) -> PlacementFacts {
        PlacementFacts {
            build: BuildInfo::new(GpuBackend::Cuda),
            hardware: HardwareInventory::with_devices(devices.iter().copied()),
            topology: RankTopology::single_rank(),
            ..Default::default()
        }
    }

    fn all_requests(gpu_tasks: &UserGpuTaskAssignment) -> Vec<PlacementRequest> {
        let mut requests = Vec::new();
        for nonbonded in TARGETS {
            for pme in TARGETS {
                for bonded in TARGETS {
                    for update in TARGETS {
                        requests.push(PlacementRequest {
                            nonbonded,
                            pme,
                            bonded,
                            update,
                            gpu_tasks: gpu_tasks.clone(),
                        });
                    }
                }
            }
        }
        requests
    }

    fn fact_variants() -> Vec<PlacementFacts> {
        let mut variants = vec![
            cuda_facts(&[0]),
            cuda_facts(&[0, 1]),
            cuda_facts(&[]),
            PlacementFacts::default(),
        ];

        let mut opencl = cuda_facts(&[0]);
        opencl.build = BuildInfo::new(GpuBackend::OpenCl);
        variants.push(opencl);

        let mut multi_rank = cuda_facts(&[0, 1]);
        multi_rank.topology = RankTopology::with_ranks(4).with_pme_ranks(2);
        multi_rank.domain_decomposition = true;
        variants.push(multi_rank);

        let mut unresolved = cuda_facts(&[0]);
        unresolved.topology = RankTopology::unresolved();
        variants.push(unresolved);

        let mut reaction_field = cuda_facts(&[0]);
        reaction_field.settings.coulomb_type = CoulombType::ReactionField;
        variants.push(reaction_field);

        let mut lj_pme = cuda_facts(&[0]);
        lj_pme.settings.vdw_type = VdwType::Pme;
        lj_pme.nonbonded_useful = false;
        variants.push(lj_pme);

        variants
    }

    fn configs() -> [ResolverConfig; 3] {
        [
            ResolverConfig::new(),
            ResolverConfig::new().with_emulate_gpu_nonbonded(true),
            ResolverConfig::new().with_force_update_default_gpu(true),
        ]
    }

    #[test]
    fn test_cross_duty_invariants_hold_everywhere() {
        for config in configs() {
            let resolver = PlacementResolver::new().with_config(config);
            for facts in fact_variants() {
                for gpu_tasks in [UserGpuTaskAssignment::none(), UserGpuTaskAssignment::from_ids([0, 0])] {
                    for request in all_requests(&gpu_tasks) {
                        for scope in [DecisionScope::Global, DecisionScope::Rank] {
                            let Ok(decision) = resolver.decide(scope, &request, &facts) else {
                                continue;
                            };

                            assert!(!decision.pme || decision.nonbonded, "{:?}", request);
                            assert!(!decision.bonded || decision.nonbonded, "{:?}", request);
                            assert!(!decision.update || decision.nonbonded || decision.pme, "{:?}", request);

                            for duty in Duty::ALL {
                                if request.target(duty) == TaskTarget::Cpu {
                                    assert!(!decision.on_gpu(duty), "{} on {:?}", duty, request);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_decisions_are_idempotent() {
        let resolver = PlacementResolver::new();
        for facts in fact_variants() {
            for gpu_tasks in [UserGpuTaskAssignment::none(), UserGpuTaskAssignment::from_ids([0])] {
                for request in all_requests(&gpu_tasks) {
                    let first = resolver.decide_for_rank(&request, &facts);
                    let second = resolver.decide_for_rank(&request, &facts);
                    assert_eq!(first, second);
                }
            }
        }
    }

    #[test]
    fn test_assignment_with_any_auto_target_fails() {
        let resolver = PlacementResolver::new();
        let gpu_tasks = UserGpuTaskAssignment::from_ids([0]);
        for facts in fact_variants() {
            for request in all_requests(&gpu_tasks) {
                let has_auto = Duty::ALL.iter().any(|&d| request.target(d) == TaskTarget::Auto);
                if has_auto {
                    assert!(resolver.decide_for_rank(&request, &facts).is_err(), "{:?}", request);
                }
            }
        }
    }

    #[test]
    fn test_cpu_targets_never_fail_without_assignment() {
        let request = PlacementRequest::auto()
            .with_target(Duty::Nonbonded, TaskTarget::Cpu)
            .with_target(Duty::Pme, TaskTarget::Cpu)
            .with_target(Duty::Bonded, TaskTarget::Cpu)
            .with_target(Duty::Update, TaskTarget::Cpu);

        for config in configs() {
            let resolver = PlacementResolver::new().with_config(config);
            for facts in fact_variants() {
                let decision = resolver.decide_for_rank(&request, &facts).unwrap();
                assert_eq!(decision, PlacementDecision::all_cpu());
            }
        }
    }

    #[test]
    fn test_scenario_auto_nonbonded_with_one_gpu() {
        let decision = PlacementResolver::new()
            .decide_for_rank(&PlacementRequest::auto(), &cuda_facts(&[0]))
            .unwrap();
        assert!(decision.nonbonded);
    }

    #[test]
    fn test_scenario_pme_gpu_without_nonbonded_gpu() {
        let request = PlacementRequest::auto()
            .with_target(Duty::Nonbonded, TaskTarget::Cpu)
            .with_target(Duty::Pme, TaskTarget::Gpu);

        let err = PlacementResolver::new()
            .decide_for_rank(&request, &cuda_facts(&[0]))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotImplemented);
    }

    #[test]
    fn test_scenario_update_gpu_with_domain_decomposition() {
        let mut facts = cuda_facts(&[0]);
        facts.domain_decomposition = true;
        let request = PlacementRequest::auto().with_target(Duty::Update, TaskTarget::Gpu);

        let err = PlacementResolver::new().decide_for_rank(&request, &facts).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InconsistentInput);
        assert!(err.message().contains("Domain decomposition is not supported."));
    }

    #[test]
    fn test_scenario_bonded_auto_while_cpu_does_pme() {
        let request = PlacementRequest::auto().with_target(Duty::Pme, TaskTarget::Cpu);
        let decision = PlacementResolver::new()
            .decide_for_rank(&request, &cuda_facts(&[0]))
            .unwrap();
        assert!(decision.nonbonded);
        assert!(!decision.pme);
        assert!(decision.bonded);
    }

    #[test]
    fn test_scenario_pme_gpu_with_two_pme_ranks() {
        let mut facts = cuda_facts(&[0, 1]);
        facts.topology = RankTopology::with_ranks(4).with_pme_ranks(2);
        let request = PlacementRequest::auto().with_target(Duty::Pme, TaskTarget::Gpu);

        let err = PlacementResolver::new().decide_for_rank(&request, &facts).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotImplemented);
        assert!(err.message().contains("more than one PME rank"));
    }

    #[test]
    fn test_default_single_rank_cuda_run() {
        let decision = PlacementResolver::new()
            .decide_global(&PlacementRequest::auto(), &cuda_facts(&[0]))
            .unwrap();
        assert_eq!(decision.to_string(), "nb: GPU, pme: GPU, bonded: CPU, update: CPU");

        let resolver = PlacementResolver::new()
            .with_config(ResolverConfig::new().with_force_update_default_gpu(true));
        let decision = resolver
            .decide_global(&PlacementRequest::auto(), &cuda_facts(&[0]))
            .unwrap();
        assert!(decision.update);
    }

    #[test]
    fn test_cpu_only_build_places_nothing_on_gpu() {
        let decision = PlacementResolver::new()
            .decide_global(&PlacementRequest::auto(), &PlacementFacts::default())
            .unwrap();
        assert!(!decision.uses_gpu());
    }

    #[test]
    fn test_global_and_rank_scope_differ_on_unresolved_ranks() {
        let mut facts = cuda_facts(&[0]);
        facts.topology = RankTopology::unresolved();

        let resolver = PlacementResolver::new();
        let global = resolver.decide_global(&PlacementRequest::auto(), &facts).unwrap();
        let rank = resolver.decide_for_rank(&PlacementRequest::auto(), &facts).unwrap();
        assert!(global.pme);
        assert!(!rank.pme);
    }

    #[test]
    fn test_rank_scope_reads_only_gpu_detection() {
        let mut facts = cuda_facts(&[]);
        facts.hardware.gpus_detected = true;

        let resolver = PlacementResolver::new();
        let decision = resolver.decide_for_rank(&PlacementRequest::auto(), &facts).unwrap();
        assert!(decision.nonbonded);
        assert!(decision.pme);

        let request = PlacementRequest::auto().with_target(Duty::Pme, TaskTarget::Gpu);
        let decision = resolver.decide_for_rank(&request, &facts).unwrap();
        assert!(decision.nonbonded);
        assert!(decision.pme);
    }

    struct NoPmeKernels;

    impl PmeGpuSupport for NoPmeKernels {
        fn supports_build(&self, _build: &BuildInfo) -> std::result::Result<(), String> {
            Err("the PME GPU kernels are disabled".to_string())
        }

        fn supports_hardware(&self, _inventory: &HardwareInventory) -> std::result::Result<(), String> {
            Ok(())
        }

        fn supports_input(&self, _settings: &SimulationSettings) -> std::result::Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn test_custom_pme_support() {
        let resolver = PlacementResolver::new().with_pme_support(Box::new(NoPmeKernels));

        let decision = resolver
            .decide_for_rank(&PlacementRequest::auto(), &cuda_facts(&[0]))
            .unwrap();
        assert!(!decision.pme);

        let request = PlacementRequest::auto().with_target(Duty::Pme, TaskTarget::Gpu);
        let err = resolver.decide_for_rank(&request, &cuda_facts(&[0])).unwrap_err();
        assert_eq!(
            err,
            PlacementError::NotImplemented(
                "Cannot compute PME interactions on a GPU, because the PME GPU kernels are disabled"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_request_and_facts_from_json() {
        let request: PlacementRequest =
            serde_json::from_str(r#"{"nonbonded": "gpu", "gpu_tasks": [0, 1]}"#).unwrap();
        assert_eq!(request.nonbonded, TaskTarget::Gpu);
        assert_eq!(request.pme, TaskTarget::Auto);
        assert_eq!(request.gpu_tasks.len(), 2);

        let facts: PlacementFacts = serde_json::from_str(r#"{"build": {"backend": "cuda"}}"#).unwrap();
        assert!(facts.nonbonded_useful);
        assert!(facts.build.supports_update_on_gpu());
    }
}
