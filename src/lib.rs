//! # DevVault
//!
//! Local-first knowledge vault for your terminal - store, search, and run
//! commands, API calls, and playbooks.
//!
//! DevVault keeps reusable artifacts (shell commands, HTTP requests, code
//! snippets, config files, playbooks, notes) in a per-project JSON vault.
//! Executable entries support `{{VAR}}` placeholders resolved at run time,
//! with a confirmation gate before anything side-effecting happens.
//!
//! ## Quick Start
//!
//! ```bash
//! # Install
//! cargo install devvault
//!
//! # Create a vault in the current directory
//! devvault init
//!
//! # Store and run a command
//! dv add command -n greet -d "Say hello" -c "echo hello {{NAME}}"
//! dv run greet
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]

pub mod core;
pub mod exec;
pub mod output;
pub mod store;

// Re-export commonly used types
pub use core::{Config, Entry, EntryKind, Interaction, Metadata, ScriptedInteraction, TerminalInteraction};
pub use exec::{Coordinator, ExecError, ExecOptions, ExecPhase, ExecutionOutcome, FailureCause};
pub use store::{EntryLookup, MemoryStore, StoreError, Vault};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "devvault";

/// Short alias
pub const APP_ALIAS: &str = "dv";
