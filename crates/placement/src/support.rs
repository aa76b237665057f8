//! Capability queries for running PME on a GPU.

use taskplan_core::{BuildInfo, HardwareInventory, SimulationSettings};

/// Answers whether PME can run on a GPU.
///
/// Each query returns the reason on failure; the reason completes the
/// sentence "Cannot compute PME interactions on a GPU, because ...".
pub trait PmeGpuSupport: Send + Sync {
    /// Whether the build includes GPU PME kernels.
    fn supports_build(&self, build: &BuildInfo) -> Result<(), String>;

    /// Whether the detected hardware can run them.
    fn supports_hardware(&self, inventory: &HardwareInventory) -> Result<(), String>;

    /// Whether the simulation settings are handled by them.
    fn supports_input(&self, settings: &SimulationSettings) -> Result<(), String>;
}

/// Default support queries, answered from the facts alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsPmeSupport;

impl PmeGpuSupport for SettingsPmeSupport {
    fn supports_build(&self, build: &BuildInfo) -> Result<(), String> {
        build.supports_pme_on_gpu()
    }

    fn supports_hardware(&self, _inventory: &HardwareInventory) -> Result<(), String> {
        // Only platform restrictions belong here, and the inventory carries
        // none. Device availability is left to the scope and to assignment.
        Ok(())
    }

    fn supports_input(&self, settings: &SimulationSettings) -> Result<(), String> {
        let mut problems = Vec::new();

        if !settings.coulomb_type.is_pme() {
            problems.push("PME is not used for electrostatics");
        }
        if settings.uses_lj_pme() {
            problems.push("LJ-PME is not supported");
        }
        if settings.pme_order != 4 {
            problems.push("only PME interpolation order 4 is supported");
        }
        if settings.uses_free_energy() {
            problems.push("free-energy perturbation is not supported");
        }
        if !settings.integrator.is_dynamical() {
            problems.push("only dynamical integrators are supported");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(format!("the input is not supported: {}.", problems.join("; ")))
        }
    }
}
