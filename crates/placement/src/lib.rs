//! Placement layer - decides which duties run on the GPU.
//!
//! Each duty has its own resolver, evaluated in dependency order:
//! nonbonded, then PME, then bonded and update. [`PlacementResolver`]
//! strings them together for the two decision scopes.

#![warn(missing_docs)]

pub mod scope;
pub mod messages;
pub mod support;
pub mod nonbonded;
pub mod pme;
pub mod bonded;
pub mod update;
pub mod config;
pub mod resolver;

pub use scope::DecisionScope;
pub use support::{PmeGpuSupport, SettingsPmeSupport};
pub use nonbonded::{decide_nonbonded, NonbondedInputs};
pub use pme::{decide_pme, PmeInputs};
pub use bonded::{decide_bonded, BondedInputs};
pub use update::{decide_update, UpdateInputs};
pub use config::ResolverConfig;
pub use resolver::{PlacementResolver, PlacementRequest, PlacementFacts};
