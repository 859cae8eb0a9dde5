//! Variable resolution.
//!
//! Obtains a concrete value for each placeholder, either from a pre-supplied
//! binding map or by prompting through an injected interaction capability.
//! The engine never touches a terminal directly, so tests can drive it with
//! a scripted implementation.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::core::template::SubstitutionTable;

/// The user cancelled an interactive prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Interactive capability consumed by the execution engine.
///
/// Both operations return `None` when the invoking context signals
/// cancellation; the engine unwinds without performing any side effect.
pub trait Interaction {
    /// Ask for the value of a placeholder. Empty input is a valid value.
    fn prompt(&mut self, name: &str) -> Option<String>;

    /// Ask for explicit affirmation before a side-effecting action.
    fn confirm(&mut self, message: &str) -> Option<bool>;
}

/// Build a complete substitution table for the given placeholder names.
///
/// Names present in `bindings` are taken from there; the rest are solicited
/// through `interaction` in order.
pub fn resolve(
    names: &[String],
    bindings: &SubstitutionTable,
    interaction: &mut dyn Interaction,
) -> Result<SubstitutionTable, Cancelled> {
    let mut table = SubstitutionTable::new();
    for name in names {
        if let Some(value) = bindings.get(name) {
            table.insert(name.clone(), value.clone());
            continue;
        }
        match interaction.prompt(name) {
            Some(value) => {
                table.insert(name.clone(), value);
            }
            None => {
                tracing::debug!(placeholder = %name, "prompt cancelled");
                return Err(Cancelled);
            }
        }
    }
    Ok(table)
}

/// Terminal-backed interaction: prompts on stdout, reads lines from stdin.
///
/// EOF on stdin is treated as cancellation.
#[derive(Debug, Default)]
pub struct TerminalInteraction;

impl TerminalInteraction {
    /// Create a new terminal interaction.
    pub fn new() -> Self {
        Self
    }

    fn read_line() -> Option<String> {
        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(input.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

impl Interaction for TerminalInteraction {
    fn prompt(&mut self, name: &str) -> Option<String> {
        print!("Enter value for {{{{{name}}}}}: ");
        io::stdout().flush().ok()?;
        Self::read_line()
    }

    fn confirm(&mut self, message: &str) -> Option<bool> {
        print!("{message} [y/N] ");
        io::stdout().flush().ok()?;
        let input = Self::read_line()?;
        let input = input.trim().to_lowercase();
        Some(input == "y" || input == "yes")
    }
}

/// Scripted interaction for non-interactive use and tests.
///
/// Answers and confirmations are consumed in order; running out of either
/// queue counts as cancellation.
#[derive(Debug, Default)]
pub struct ScriptedInteraction {
    answers: VecDeque<String>,
    confirmations: VecDeque<bool>,
    prompted: Vec<String>,
    confirmed: Vec<String>,
}

impl ScriptedInteraction {
    /// Create an empty script (every prompt and confirmation cancels).
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a prompt answer.
    #[must_use]
    pub fn with_answer(mut self, value: impl Into<String>) -> Self {
        self.answers.push_back(value.into());
        self
    }

    /// Queue a confirmation response.
    #[must_use]
    pub fn with_confirmation(mut self, accept: bool) -> Self {
        self.confirmations.push_back(accept);
        self
    }

    /// Queue `true` confirmations for every gate.
    #[must_use]
    pub fn accept_all(mut self, count: usize) -> Self {
        for _ in 0..count {
            self.confirmations.push_back(true);
        }
        self
    }

    /// Placeholder names that were prompted, in order.
    pub fn prompted(&self) -> &[String] {
        &self.prompted
    }

    /// Confirmation messages that were shown, in order.
    pub fn confirmed(&self) -> &[String] {
        &self.confirmed
    }
}

impl Interaction for ScriptedInteraction {
    fn prompt(&mut self, name: &str) -> Option<String> {
        self.prompted.push(name.to_string());
        self.answers.pop_front()
    }

    fn confirm(&mut self, message: &str) -> Option<bool> {
        self.confirmed.push(message.to_string());
        self.confirmations.pop_front()
    }
}
