//! Resolver configuration.

use serde::{Deserialize, Serialize};

/// Environment variable that turns on GPU emulation of nonbonded kernels.
pub const EMULATE_GPU_ENV: &str = "TASKPLAN_EMULATE_GPU";

/// Environment variable that makes `Auto` update prefer the GPU.
pub const FORCE_UPDATE_DEFAULT_GPU_ENV: &str = "TASKPLAN_FORCE_UPDATE_DEFAULT_GPU";

/// Switches that change resolver policy rather than describe the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Run the GPU nonbonded code path on the CPU
    pub emulate_gpu_nonbonded: bool,
    /// Put the update on the GPU for `Auto` whenever possible
    pub force_update_default_gpu: bool,
}

impl ResolverConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the configuration from the environment.
    ///
    /// A variable that is set, to any value, turns its switch on.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var_os(name).is_some())
    }

    fn from_lookup(is_set: impl Fn(&str) -> bool) -> Self {
        Self {
            emulate_gpu_nonbonded: is_set(EMULATE_GPU_ENV),
            force_update_default_gpu: is_set(FORCE_UPDATE_DEFAULT_GPU_ENV),
        }
    }

    /// Set nonbonded emulation.
    pub fn with_emulate_gpu_nonbonded(mut self, emulate: bool) -> Self {
        self.emulate_gpu_nonbonded = emulate;
        self
    }

    /// Set the GPU update default.
    pub fn with_force_update_default_gpu(mut self, force: bool) -> Self {
        self.force_update_default_gpu = force;
        self
    }

    /// Combine with another configuration; a switch on in either stays on.
    pub fn merge(self, other: Self) -> Self {
        Self {
            emulate_gpu_nonbonded: self.emulate_gpu_nonbonded || other.emulate_gpu_nonbonded,
            force_update_default_gpu: self.force_update_default_gpu || other.force_update_default_gpu,
        }
    }
}
