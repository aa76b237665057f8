//! Build capabilities, detected hardware, and user device assignment.

use serde::{Deserialize, Serialize};
use crate::error::ParseError;

/// Index of a GPU as seen by the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Create from a raw device index.
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw device index.
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// GPU backend the binary was compiled with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuBackend {
    /// CPU-only build
    #[default]
    None,
    /// CUDA
    Cuda,
    /// OpenCL
    OpenCl,
}

impl std::fmt::Display for GpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Cuda => f.write_str("CUDA"),
            Self::OpenCl => f.write_str("OpenCL"),
        }
    }
}

/// What the binary was built to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// GPU backend
    pub backend: GpuBackend,
}

impl BuildInfo {
    /// Build info for a given backend.
    pub fn new(backend: GpuBackend) -> Self {
        Self { backend }
    }

    /// Whether nonbonded kernels were compiled for the GPU.
    pub fn supports_nonbonded_on_gpu(&self) -> bool {
        self.backend != GpuBackend::None
    }

    /// Whether PME kernels were compiled for the GPU.
    ///
    /// On failure the error holds the reason, phrased to follow
    /// "Cannot compute PME interactions on a GPU, because ...".
    pub fn supports_pme_on_gpu(&self) -> std::result::Result<(), String> {
        match self.backend {
            GpuBackend::None => Err("the build was configured without GPU support".to_string()),
            GpuBackend::Cuda | GpuBackend::OpenCl => Ok(()),
        }
    }

    /// Whether bonded kernels were compiled for the GPU.
    pub fn supports_bonded_on_gpu(&self) -> bool {
        self.backend == GpuBackend::Cuda
    }

    /// Whether the GPU update and constraints path exists in this build.
    pub fn supports_update_on_gpu(&self) -> bool {
        self.backend == GpuBackend::Cuda
    }

    /// Environment variable that restricts the visible devices, if any.
    pub fn device_visibility_variable(&self) -> Option<&'static str> {
        match self.backend {
            GpuBackend::None => None,
            GpuBackend::Cuda => Some("CUDA_VISIBLE_DEVICES"),
            // Not portable OpenCL, but the AMD runtime honours it.
            GpuBackend::OpenCl => Some("GPU_DEVICE_ORDINAL"),
        }
    }
}

/// GPUs visible to this process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareInventory {
    /// Compatible devices that may be used, in order.
    #[serde(default)]
    pub usable_devices: Vec<DeviceId>,

    /// Whether any GPU was detected at all.
    #[serde(default)]
    pub gpus_detected: bool,
}

impl HardwareInventory {
    /// Inventory with no GPUs.
    pub fn none() -> Self {
        Self::default()
    }

    /// Inventory with the given usable devices, all detected.
    pub fn with_devices(ids: impl IntoIterator<Item = u32>) -> Self {
        let usable_devices: Vec<DeviceId> = ids.into_iter().map(DeviceId::new).collect();
        let gpus_detected = !usable_devices.is_empty();
        Self { usable_devices, gpus_detected }
    }

    /// Number of usable devices.
    pub fn usable_count(&self) -> usize {
        self.usable_devices.len()
    }
}

/// Explicit mapping of GPU tasks to device IDs, in task order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserGpuTaskAssignment(Vec<DeviceId>);

impl UserGpuTaskAssignment {
    /// An empty assignment, i.e. the user did not pin anything.
    pub fn none() -> Self {
        Self::default()
    }

    /// Assignment from raw device indices.
    pub fn from_ids(ids: impl IntoIterator<Item = u32>) -> Self {
        Self(ids.into_iter().map(DeviceId::new).collect())
    }

    /// Parse the compact form, one digit per task (e.g. `"0011"`).
    ///
    /// Commas are accepted as separators, in which case each element may
    /// have several digits (e.g. `"0,0,10,11"`).
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::none());
        }

        let invalid = |reason: &str| ParseError::Assignment {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut ids = Vec::new();
        if trimmed.contains(',') {
            for part in trimmed.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    return Err(invalid("empty element"));
                }
                let id = part
                    .parse::<u32>()
                    .map_err(|_| invalid("elements must be non-negative integers"))?;
                ids.push(DeviceId::new(id));
            }
        } else {
            for c in trimmed.chars() {
                let id = c.to_digit(10).ok_or_else(|| invalid("only digits are allowed"))?;
                ids.push(DeviceId::new(id));
            }
        }

        Ok(Self(ids))
    }

    /// Whether the user supplied an assignment.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of assigned tasks.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Assigned device IDs, in task order.
    pub fn devices(&self) -> &[DeviceId] {
        &self.0
    }
}

impl std::fmt::Display for UserGpuTaskAssignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let multi_digit = self.0.iter().any(|id| id.index() > 9);
        for (i, id) in self.0.iter().enumerate() {
            if multi_digit && i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for UserGpuTaskAssignment {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
