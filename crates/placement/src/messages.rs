//! Shared validation helpers and user-facing error text.

use taskplan_core::{
    BuildInfo, PlacementError, RankTopology, Result, TaskTarget, UserGpuTaskAssignment,
};
use crate::scope::DecisionScope;

/// Error for an explicit GPU task assignment that leaves `options` at their
/// defaults, so device IDs cannot be matched to tasks.
pub fn specify_everything(build: &BuildInfo, options: &str) -> PlacementError {
    let mut message = format!(
        "When you use -gputasks, {} must be set to non-default values, so that the \
         device IDs can be interpreted correctly.",
        options
    );

    if let Some(variable) = build.device_visibility_variable() {
        message.push_str(&format!(
            " If you simply want to restrict which GPUs are used, then it is better to \
             use -gpu_id. Otherwise, setting the {} environment variable in your bash \
             profile or job script may be more convenient.",
            variable
        ));
    }

    PlacementError::inconsistent(message)
}

/// Reject `Auto` when the user pinned devices to tasks.
///
/// In the global scope the rank count must also be fixed, otherwise the
/// assignment cannot be split between ranks.
pub fn require_explicit_target(
    target: TaskTarget,
    assignment: &UserGpuTaskAssignment,
    scope: DecisionScope,
    topology: &RankTopology,
    build: &BuildInfo,
    options: &str,
) -> Result<()> {
    if assignment.is_empty() {
        return Ok(());
    }

    let ranks_unknown = scope == DecisionScope::Global && !topology.is_rank_count_resolved();
    if target == TaskTarget::Auto || ranks_unknown {
        return Err(specify_everything(build, options));
    }

    Ok(())
}

/// Accumulates every unmet requirement so they can be reported together.
#[derive(Debug, Default)]
pub struct UnmetConditions {
    lines: Vec<&'static str>,
}

impl UnmetConditions {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` when `violated` holds.
    pub fn check(&mut self, violated: bool, message: &'static str) -> &mut Self {
        if violated {
            self.lines.push(message);
        }
        self
    }

    /// Whether every requirement was met.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Recorded messages, in the order they were checked.
    pub fn lines(&self) -> &[&'static str] {
        &self.lines
    }

    /// One line per condition under `prefix`.
    pub fn report(&self, prefix: &str) -> String {
        let mut report = String::from(prefix);
        for line in &self.lines {
            report.push('\n');
            report.push_str(line);
        }
        report
    }
}
