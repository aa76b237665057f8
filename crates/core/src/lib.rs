//! taskplan core data models.
//!
//! This crate defines the facts and outcomes that the placement resolver
//! works on: requested task targets, build and hardware capabilities, rank
//! topology, the simulation settings snapshot, and the resulting per-duty
//! placement decision.

#![warn(missing_docs)]

// Requested placement
mod target;

// Capabilities and topology
mod hardware;
mod topology;
mod settings;

// Outcome
mod decision;
mod error;

// Re-exports
pub use target::{TaskTarget, Duty, GpuTask};
pub use hardware::{GpuBackend, BuildInfo, HardwareInventory, UserGpuTaskAssignment, DeviceId};
pub use topology::RankTopology;
pub use settings::{
    SimulationSettings, Integrator, Thermostat, Barostat, CoulombType, VdwType,
    FreeEnergy, SwapCoords,
};
pub use decision::PlacementDecision;
pub use error::{PlacementError, ErrorCategory, ParseError, Result};
