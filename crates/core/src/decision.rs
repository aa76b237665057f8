//! The resolved placement for one rank.

use serde::{Deserialize, Serialize};
use crate::target::{Duty, GpuTask};

/// Whether each duty runs on the GPU for this rank.
///
/// Plain data: in the global scope one value is computed and handed to every
/// rank unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacementDecision {
    /// Nonbonded on GPU
    pub nonbonded: bool,
    /// PME on GPU
    pub pme: bool,
    /// Bonded on GPU
    pub bonded: bool,
    /// Update on GPU
    pub update: bool,
}

impl PlacementDecision {
    /// Everything on the CPU.
    pub fn all_cpu() -> Self {
        Self::default()
    }

    /// Placement of a single duty.
    pub fn on_gpu(&self, duty: Duty) -> bool {
        match duty {
            Duty::Nonbonded => self.nonbonded,
            Duty::Pme => self.pme,
            Duty::Bonded => self.bonded,
            Duty::Update => self.update,
        }
    }

    /// Whether this rank needs a GPU at all.
    pub fn uses_gpu(&self) -> bool {
        Duty::ALL.iter().any(|&duty| self.on_gpu(duty))
    }

    /// Duties placed on the GPU, in dependency order.
    pub fn gpu_duties(&self) -> Vec<Duty> {
        Duty::ALL.into_iter().filter(|&duty| self.on_gpu(duty)).collect()
    }

    /// GPU tasks that need a device of their own on this rank.
    pub fn gpu_tasks(&self) -> Vec<GpuTask> {
        let mut tasks = Vec::with_capacity(2);
        if self.nonbonded {
            tasks.push(GpuTask::Nonbonded);
        }
        if self.pme {
            tasks.push(GpuTask::Pme);
        }
        tasks
    }
}

impl std::fmt::Display for PlacementDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let place = |on_gpu: bool| if on_gpu { "GPU" } else { "CPU" };
        write!(
            f,
            "nb: {}, pme: {}, bonded: {}, update: {}",
            place(self.nonbonded),
            place(self.pme),
            place(self.bonded),
            place(self.update),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_cpu() {
        let decision = PlacementDecision::all_cpu();
        assert!(!decision.uses_gpu());
        assert!(decision.gpu_tasks().is_empty());
        assert_eq!(decision.to_string(), "nb: CPU, pme: CPU, bonded: CPU, update: CPU");
    }

    #[test]
    fn test_gpu_tasks_and_duties() {
        let decision = PlacementDecision {
            nonbonded: true,
            pme: true,
            bonded: false,
            update: true,
        };
        assert_eq!(decision.gpu_tasks(), vec![GpuTask::Nonbonded, GpuTask::Pme]);
        assert_eq!(decision.gpu_duties(), vec![Duty::Nonbonded, Duty::Pme, Duty::Update]);
        assert!(decision.on_gpu(Duty::Update));
        assert!(!decision.on_gpu(Duty::Bonded));
    }
}
