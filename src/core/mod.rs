//! Core types and functionality for DevVault.
//!
//! This module contains the fundamental data structures used throughout
//! the application: entries, placeholder templating, variable resolution,
//! and configuration.

mod config;
mod entry;
mod resolve;
mod template;

pub use config::Config;
pub use entry::{generate_id, now_rfc3339, Entry, EntryKind, Metadata};
pub use resolve::{resolve, Cancelled, Interaction, ScriptedInteraction, TerminalInteraction};
pub use template::{placeholders, render, SubstitutionTable};
