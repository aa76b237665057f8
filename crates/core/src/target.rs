//! Requested targets and the duties they apply to.

use serde::{Deserialize, Serialize};
use crate::error::ParseError;

/// Where the user asked a duty to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskTarget {
    /// Let the resolver decide
    #[default]
    Auto,
    /// Force the host CPU
    Cpu,
    /// Force the GPU
    Gpu,
}

impl TaskTarget {
    /// Option string for this target.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
        }
    }
}

impl std::fmt::Display for TaskTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskTarget {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "gpu" => Ok(Self::Gpu),
            _ => Err(ParseError::TaskTarget(s.to_string())),
        }
    }
}

/// A schedulable computational role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Duty {
    /// Short-range nonbonded forces
    Nonbonded,
    /// PME reciprocal-space electrostatics
    Pme,
    /// Bonded interactions
    Bonded,
    /// Coordinate and velocity update
    Update,
}

impl Duty {
    /// All duties, in dependency order.
    pub const ALL: [Duty; 4] = [Duty::Nonbonded, Duty::Pme, Duty::Bonded, Duty::Update];

    /// Short name used in option strings and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nonbonded => "nb",
            Self::Pme => "pme",
            Self::Bonded => "bonded",
            Self::Update => "update",
        }
    }
}

impl std::fmt::Display for Duty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Duties that occupy a slot in a user GPU task assignment.
///
/// Bonded and update work always share the device of the nonbonded task,
/// so only these two ever need a device ID of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GpuTask {
    /// Nonbonded task
    Nonbonded,
    /// PME task
    Pme,
}

impl From<GpuTask> for Duty {
    fn from(task: GpuTask) -> Self {
        match task {
            GpuTask::Nonbonded => Duty::Nonbonded,
            GpuTask::Pme => Duty::Pme,
        }
    }
}
