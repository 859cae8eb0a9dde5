//! Execution result types.
//!
//! One outcome shape per executable entry kind, reported to the caller and
//! discarded after one execution.

use serde::Serialize;

/// Kind-specific outcome of executing a single entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum ExecutionOutcome {
    /// A shell command ran to completion
    Command(CommandOutcome),

    /// An HTTP request completed
    Api(ApiOutcome),

    /// Every playbook step completed
    Playbook { steps: Vec<StepReport> },
}

impl ExecutionOutcome {
    /// One-line summary for logging and playbook step reporting.
    pub fn summary(&self) -> String {
        match self {
            Self::Command(cmd) => format!("exit code {}", cmd.exit_code),
            Self::Api(api) => format!("HTTP {}", api.status),
            Self::Playbook { steps } => format!("{} steps completed", steps.len()),
        }
    }
}

/// Outcome of a shell command execution.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    /// Exit code of the process
    pub exit_code: i32,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

/// Outcome of an HTTP request execution.
#[derive(Debug, Clone, Serialize)]
pub struct ApiOutcome {
    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,
}

/// One completed playbook step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Zero-based position within the playbook
    pub index: usize,

    /// Name of the step entry
    pub name: String,

    /// The step's outcome
    pub outcome: ExecutionOutcome,
}
