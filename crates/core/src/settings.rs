//! Snapshot of the simulation settings that affect placement.

use serde::{Deserialize, Serialize};

/// Integration algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Integrator {
    /// Leap-frog molecular dynamics
    #[default]
    Md,
    /// Velocity Verlet
    MdVv,
    /// Velocity Verlet with averaged kinetic energy
    MdVvAk,
    /// Stochastic dynamics
    Sd,
    /// Brownian dynamics
    Bd,
    /// Steepest descent minimisation
    Steep,
    /// Conjugate gradient minimisation
    Cg,
    /// L-BFGS minimisation
    LBfgs,
    /// Normal mode analysis
    Nm,
    /// Test particle insertion
    Tpi,
    /// Test particle insertion into a cavity
    Tpic,
}

impl Integrator {
    /// Whether this integrator propagates dynamics in time.
    pub fn is_dynamical(&self) -> bool {
        matches!(self, Self::Md | Self::MdVv | Self::MdVvAk | Self::Sd | Self::Bd)
    }
}

/// Temperature coupling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Thermostat {
    /// No temperature coupling
    #[default]
    No,
    /// Berendsen weak coupling
    Berendsen,
    /// Nose-Hoover extended ensemble
    NoseHoover,
    /// Velocity rescaling with a stochastic term
    VRescale,
    /// Andersen, randomising some particles
    Andersen,
    /// Andersen, randomising all particles at once
    AndersenMassive,
}

/// Pressure coupling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Barostat {
    /// No pressure coupling
    #[default]
    No,
    /// Berendsen weak coupling
    Berendsen,
    /// Parrinello-Rahman extended ensemble
    ParrinelloRahman,
    /// Martyna-Tuckerman-Tobias-Klein
    Mttk,
    /// Stochastic cell rescaling
    CRescale,
}

/// Electrostatics treatment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoulombType {
    /// Plain cut-off
    Cutoff,
    /// Reaction field
    ReactionField,
    /// Particle-mesh Ewald
    #[default]
    Pme,
    /// PME with a switched real-space part
    PmeSwitch,
    /// PME with a tabulated real-space part
    PmeUser,
    /// PME with a switched, tabulated real-space part
    PmeUserSwitch,
    /// Classical Ewald summation
    Ewald,
    /// Particle-particle particle-mesh
    P3mAd,
}

impl CoulombType {
    /// Whether long-range electrostatics use a reciprocal-space method.
    pub fn is_pme_or_ewald(&self) -> bool {
        matches!(
            self,
            Self::Pme | Self::PmeSwitch | Self::PmeUser | Self::PmeUserSwitch | Self::Ewald | Self::P3mAd
        )
    }

    /// Whether this is a PME flavour (Ewald and P3M excluded).
    pub fn is_pme(&self) -> bool {
        matches!(self, Self::Pme | Self::PmeSwitch | Self::PmeUser | Self::PmeUserSwitch)
    }
}

/// Van der Waals treatment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VdwType {
    /// Plain cut-off
    #[default]
    Cutoff,
    /// Potential switched to zero
    Switch,
    /// Force shifted to zero
    Shift,
    /// Tabulated
    User,
    /// Long-range dispersion via PME (LJ-PME)
    Pme,
}

/// Free-energy calculation mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FreeEnergy {
    /// No perturbation
    #[default]
    No,
    /// Fixed lambda state
    Yes,
    /// Lambda changes during the run
    SlowGrowth,
    /// Expanded ensemble
    Expanded,
}

/// Computational electrophysiology coordinate swapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwapCoords {
    /// No swapping
    #[default]
    No,
    /// Compartments split along x
    X,
    /// Compartments split along y
    Y,
    /// Compartments split along z
    Z,
}

/// Read-only view of the run input and topology facts used for placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Integrator
    pub integrator: Integrator,
    /// Temperature coupling
    pub thermostat: Thermostat,
    /// Pressure coupling
    pub barostat: Barostat,
    /// Electrostatics treatment
    pub coulomb_type: CoulombType,
    /// Van der Waals treatment
    pub vdw_type: VdwType,

    /// Dielectric constant of the Ewald surface term, zero when disabled.
    pub epsilon_surface: f64,

    /// PME interpolation order.
    pub pme_order: u32,

    /// Free-energy mode
    pub free_energy: FreeEnergy,
    /// Coordinate swapping mode
    pub swap_coords: SwapCoords,

    /// Pulling is enabled.
    pub pull: bool,

    /// The topology contains virtual sites.
    pub virtual_sites: bool,

    /// Essential dynamics sampling is enabled.
    pub essential_dynamics: bool,

    /// The topology has orientation restraints.
    pub orientation_restraints: bool,

    /// Part of a replica exchange run.
    pub replica_exchange: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            integrator: Integrator::Md,
            thermostat: Thermostat::No,
            barostat: Barostat::No,
            coulomb_type: CoulombType::Pme,
            vdw_type: VdwType::Cutoff,
            epsilon_surface: 0.0,
            pme_order: 4,
            free_energy: FreeEnergy::No,
            swap_coords: SwapCoords::No,
            pull: false,
            virtual_sites: false,
            essential_dynamics: false,
            orientation_restraints: false,
            replica_exchange: false,
        }
    }
}

impl SimulationSettings {
    /// Whether electrostatics use PME or Ewald.
    pub fn uses_pme_or_ewald(&self) -> bool {
        self.coulomb_type.is_pme_or_ewald()
    }

    /// Whether Lennard-Jones PME is in use.
    pub fn uses_lj_pme(&self) -> bool {
        self.vdw_type == VdwType::Pme
    }

    /// Whether the Ewald surface correction is active.
    pub fn uses_ewald_surface_correction(&self) -> bool {
        self.uses_pme_or_ewald() && self.epsilon_surface != 0.0
    }

    /// Whether free-energy perturbation is active.
    pub fn uses_free_energy(&self) -> bool {
        self.free_energy != FreeEnergy::No
    }

    /// Whether coordinate swapping is active.
    pub fn uses_swap_coords(&self) -> bool {
        self.swap_coords != SwapCoords::No
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_plain_md_with_pme() {
        let settings = SimulationSettings::default();
        assert_eq!(settings.integrator, Integrator::Md);
        assert!(settings.uses_pme_or_ewald());
        assert!(!settings.uses_lj_pme());
        assert!(!settings.uses_ewald_surface_correction());
        assert_eq!(settings.pme_order, 4);
    }

    #[test]
    fn test_surface_correction_needs_ewald() {
        let mut settings = SimulationSettings {
            epsilon_surface: 1.0,
            ..Default::default()
        };
        assert!(settings.uses_ewald_surface_correction());

        settings.coulomb_type = CoulombType::ReactionField;
        assert!(!settings.uses_ewald_surface_correction());
    }

    #[test]
    fn test_partial_settings_deserialize() {
        let settings: SimulationSettings =
            serde_json::from_str(r#"{"thermostat": "nose-hoover", "pull": true}"#).unwrap();
        assert_eq!(settings.thermostat, Thermostat::NoseHoover);
        assert!(settings.pull);
        assert_eq!(settings.barostat, Barostat::No);
    }

    #[test]
    fn test_dynamical_integrators() {
        assert!(Integrator::Sd.is_dynamical());
        assert!(!Integrator::Steep.is_dynamical());
        assert!(!Integrator::Tpi.is_dynamical());
    }
}
