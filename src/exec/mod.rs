//! Entry execution engine.
//!
//! Resolves an entry's runtime inputs, renders its content, asks for
//! confirmation, performs the side-effecting action, and reports results
//! consistently across entry kinds.

pub mod api;
pub mod command;

mod coordinator;
mod error;
mod outcome;

pub use api::ApiRequest;
pub use coordinator::{Coordinator, ExecOptions, ExecPhase};
pub use error::{ExecError, FailureCause};
pub use outcome::{ApiOutcome, CommandOutcome, ExecutionOutcome, StepReport};
