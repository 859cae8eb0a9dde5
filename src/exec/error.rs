//! Execution error taxonomy.
//!
//! Every failure surfaces to the caller with enough context to render a
//! precise message: entry name, step index inside a playbook, and the
//! underlying cause. Nothing is retried automatically.

use std::time::Duration;

use crate::core::EntryKind;
use crate::exec::outcome::StepReport;

/// Why an executor-level action failed.
#[derive(Debug, thiserror::Error)]
pub enum FailureCause {
    /// The process exited nonzero, or could not be spawned (`code: None`)
    #[error("process failed{}", .code.map(|c| format!(" (exit code {c})")).unwrap_or_default())]
    Process {
        /// Exit code, when the process ran at all
        code: Option<i32>,
        /// Captured standard output
        stdout: String,
        /// Captured standard error, or the spawn error text
        stderr: String,
    },

    /// The HTTP request could not be completed
    #[error("network failure: {0}")]
    Network(String),

    /// The caller-imposed deadline elapsed; the process/connection was
    /// terminated
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-success status
    #[error("HTTP {status}")]
    HttpStatus {
        /// Response status code
        status: u16,
        /// Response body
        body: String,
    },
}

/// Failure of a single entry execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The user cancelled a prompt or declined the confirmation gate; no
    /// side effect was performed
    #[error("aborted")]
    Aborted,

    /// The entry's kind does not support execution
    #[error("entry '{name}' is a {kind} and cannot be executed")]
    NotExecutable {
        /// Entry name
        name: String,
        /// Entry kind
        kind: EntryKind,
    },

    /// A referenced entry does not exist in the vault
    #[error("entry not found: {name}")]
    NotFound {
        /// The missing name
        name: String,
    },

    /// A playbook step re-enters an entry already on the execution path
    #[error("playbook cycle: '{name}' is already executing")]
    CyclicPlaybook {
        /// The re-entered name
        name: String,
    },

    /// The action executor failed
    #[error("'{name}' failed: {cause}")]
    Failed {
        /// Entry name
        name: String,
        /// Underlying cause
        #[source]
        cause: FailureCause,
    },

    /// A playbook step failed; remaining steps were not executed
    #[error("step {index} ('{name}') failed")]
    StepFailed {
        /// Zero-based index of the failing step
        index: usize,
        /// Name of the failing step entry
        name: String,
        /// Results of the steps that completed before the failure
        completed: Vec<StepReport>,
        /// The failing step's error
        #[source]
        source: Box<ExecError>,
    },
}

impl ExecError {
    /// Whether this error represents a user abort rather than a failure.
    pub fn is_abort(&self) -> bool {
        match self {
            Self::Aborted => true,
            Self::StepFailed { source, .. } => source.is_abort(),
            _ => false,
        }
    }
}
