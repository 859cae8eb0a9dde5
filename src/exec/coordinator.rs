//! Execution coordination.
//!
//! Drives a single entry through resolve, render, confirm, and execute, and
//! sequences playbooks by recursing per step. The vault store and the
//! interaction capability are injected, so the whole engine runs against
//! in-memory fakes in tests.

use std::time::Duration;

use crate::core::{placeholders, render, resolve, Entry, EntryKind, Interaction, SubstitutionTable};
use crate::exec::api::{self, ApiRequest};
use crate::exec::command;
use crate::exec::error::ExecError;
use crate::exec::outcome::{ExecutionOutcome, StepReport};
use crate::store::EntryLookup;

/// Options for one execution call.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Pre-supplied placeholder values; names found here are never prompted
    pub bindings: SubstitutionTable,

    /// Pass through the confirmation gate without asking
    pub skip_confirm: bool,

    /// Deadline applied to each executor call
    pub timeout: Option<Duration>,
}

/// Coordinator phase, observable for tests and progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecPhase {
    /// No execution has started
    Pending,
    /// Scanning placeholders and resolving values
    Resolving,
    /// Applying the substitution table
    Rendering,
    /// Blocked on the confirmation gate
    ConfirmPending,
    /// The action executor is running
    Executing,
    /// Terminal: the entry executed successfully
    Succeeded,
    /// Terminal: the executor failed
    Failed,
    /// Terminal: the user cancelled or declined before any side effect
    Aborted,
}

/// Orchestrates entry execution against an entry store and an interaction
/// capability.
pub struct Coordinator<'a> {
    store: &'a dyn EntryLookup,
    interaction: &'a mut dyn Interaction,
    phase: ExecPhase,
    /// Names of entries on the current execution path, for cycle detection
    active: Vec<String>,
    /// Values resolved so far in this execution; later playbook steps reuse
    /// them instead of prompting again
    values: SubstitutionTable,
}

impl<'a> Coordinator<'a> {
    /// Create a coordinator over the given store and interaction capability.
    pub fn new(store: &'a dyn EntryLookup, interaction: &'a mut dyn Interaction) -> Self {
        Self {
            store,
            interaction,
            phase: ExecPhase::Pending,
            active: Vec::new(),
            values: SubstitutionTable::new(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> ExecPhase {
        self.phase
    }

    /// Execute an entry: resolve placeholders, render content, confirm, run
    /// the matching executor, and report the outcome.
    ///
    /// Playbooks run their steps in stored order, fail-fast: the first
    /// failing step halts the remainder and the error carries every
    /// completed step report.
    pub fn execute(
        &mut self,
        entry: &Entry,
        opts: &ExecOptions,
    ) -> Result<ExecutionOutcome, ExecError> {
        self.phase = ExecPhase::Pending;
        self.active.clear();
        self.values = opts.bindings.clone();

        let result = self.dispatch(entry, opts);

        self.phase = match &result {
            Ok(_) => ExecPhase::Succeeded,
            Err(e) if e.is_abort() => ExecPhase::Aborted,
            Err(_) => ExecPhase::Failed,
        };
        result
    }

    /// Route an entry to its executor, guarding kind and cycles first.
    fn dispatch(
        &mut self,
        entry: &Entry,
        opts: &ExecOptions,
    ) -> Result<ExecutionOutcome, ExecError> {
        if !entry.kind.is_executable() {
            return Err(ExecError::NotExecutable { name: entry.name.clone(), kind: entry.kind });
        }
        if self.active.iter().any(|name| name == &entry.name) {
            return Err(ExecError::CyclicPlaybook { name: entry.name.clone() });
        }

        match entry.kind {
            EntryKind::Command => self.run_command(entry, opts),
            EntryKind::Api => self.run_api(entry, opts),
            EntryKind::Playbook => self.run_playbook(entry, opts),
            // Unreachable: guarded by is_executable above
            _ => Err(ExecError::NotExecutable { name: entry.name.clone(), kind: entry.kind }),
        }
    }

    fn run_command(
        &mut self,
        entry: &Entry,
        opts: &ExecOptions,
    ) -> Result<ExecutionOutcome, ExecError> {
        let table = self.resolve_values(&placeholders(&entry.content))?;

        self.set_phase(ExecPhase::Rendering);
        let rendered = render(&entry.content, &table);

        self.confirm_gate(opts, &format!("Execute '{rendered}'?"))?;

        self.set_phase(ExecPhase::Executing);
        tracing::info!(entry = %entry.name, command = %rendered, "executing command");
        command::execute(&rendered, opts.timeout)
            .map(ExecutionOutcome::Command)
            .map_err(|cause| ExecError::Failed { name: entry.name.clone(), cause })
    }

    fn run_api(
        &mut self,
        entry: &Entry,
        opts: &ExecOptions,
    ) -> Result<ExecutionOutcome, ExecError> {
        let meta = &entry.metadata;
        let url = meta.url.clone().unwrap_or_default();
        let method = meta.method.clone().unwrap_or_default();

        // Placeholders may appear in the URL, header values, and the body.
        // Headers are visited in key order so prompting stays deterministic.
        let mut header_keys: Vec<&String> = meta.headers.keys().collect();
        header_keys.sort();

        let mut names = Vec::new();
        let mut push_names = |text: &str| {
            for name in placeholders(text) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        };
        push_names(&url);
        for key in &header_keys {
            push_names(&meta.headers[*key]);
        }
        push_names(&entry.content);

        let table = self.resolve_values(&names)?;

        self.set_phase(ExecPhase::Rendering);
        let url = render(&url, &table);
        let headers = meta
            .headers
            .iter()
            .map(|(key, value)| (key.clone(), render(value, &table)))
            .collect();
        let body =
            if entry.content.is_empty() { None } else { Some(render(&entry.content, &table)) };

        let display_method = if method.is_empty() { "GET" } else { &method };
        self.confirm_gate(opts, &format!("Execute '{display_method} {url}'?"))?;

        self.set_phase(ExecPhase::Executing);
        tracing::info!(entry = %entry.name, method = %display_method, url = %url, "executing API request");
        let request = ApiRequest { method, url, headers, body };
        api::execute(&request, opts.timeout)
            .map(ExecutionOutcome::Api)
            .map_err(|cause| ExecError::Failed { name: entry.name.clone(), cause })
    }

    fn run_playbook(
        &mut self,
        entry: &Entry,
        opts: &ExecOptions,
    ) -> Result<ExecutionOutcome, ExecError> {
        self.active.push(entry.name.clone());
        let result = self.run_playbook_steps(entry, opts);
        self.active.pop();
        result
    }

    fn run_playbook_steps(
        &mut self,
        entry: &Entry,
        opts: &ExecOptions,
    ) -> Result<ExecutionOutcome, ExecError> {
        let step_names = entry.playbook_steps();
        let total = step_names.len();
        let mut completed: Vec<StepReport> = Vec::with_capacity(total);

        for (index, step_name) in step_names.into_iter().enumerate() {
            tracing::info!(playbook = %entry.name, step = index + 1, total, name = step_name, "running playbook step");

            let step_failed = |completed: Vec<StepReport>, source: ExecError| {
                ExecError::StepFailed {
                    index,
                    name: step_name.to_string(),
                    completed,
                    source: Box::new(source),
                }
            };

            let Some(step) = self.store.lookup(step_name) else {
                return Err(step_failed(
                    completed,
                    ExecError::NotFound { name: step_name.to_string() },
                ));
            };

            match self.dispatch(&step, opts) {
                Ok(outcome) => {
                    completed.push(StepReport { index, name: step_name.to_string(), outcome });
                }
                Err(source) => return Err(step_failed(completed, source)),
            }
        }

        Ok(ExecutionOutcome::Playbook { steps: completed })
    }

    /// Resolve the given placeholder names, remembering values for later
    /// steps of this execution.
    fn resolve_values(&mut self, names: &[String]) -> Result<SubstitutionTable, ExecError> {
        self.set_phase(ExecPhase::Resolving);
        let table =
            resolve(names, &self.values, self.interaction).map_err(|_| ExecError::Aborted)?;
        for (name, value) in &table {
            self.values.insert(name.clone(), value.clone());
        }
        Ok(table)
    }

    /// Block for explicit affirmation unless the caller opted out.
    ///
    /// Declining and cancelling are indistinguishable: both abort before any
    /// side effect.
    fn confirm_gate(&mut self, opts: &ExecOptions, message: &str) -> Result<(), ExecError> {
        self.set_phase(ExecPhase::ConfirmPending);
        if opts.skip_confirm {
            return Ok(());
        }
        match self.interaction.confirm(message) {
            Some(true) => Ok(()),
            Some(false) | None => Err(ExecError::Aborted),
        }
    }

    fn set_phase(&mut self, phase: ExecPhase) {
        tracing::debug!(?phase, "coordinator phase");
        self.phase = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Entry, ScriptedInteraction};
    use crate::store::MemoryStore;

    fn command(name: &str, content: &str) -> Entry {
        Entry::new(EntryKind::Command, name, "", content)
    }

    #[test]
    fn test_command_execution() {
        let store = MemoryStore::new();
        let mut io = ScriptedInteraction::new().with_confirmation(true);
        let mut coordinator = Coordinator::new(&store, &mut io);

        let outcome = coordinator
            .execute(&command("hello", "echo hi"), &ExecOptions::default())
            .unwrap();

        match outcome {
            ExecutionOutcome::Command(cmd) => {
                assert_eq!(cmd.exit_code, 0);
                assert!(cmd.stdout.contains("hi"));
            }
            other => panic!("expected command outcome, got {other:?}"),
        }
        assert_eq!(coordinator.phase(), ExecPhase::Succeeded);
    }

    #[test]
    fn test_bindings_used_without_prompting() {
        let store = MemoryStore::new();
        let mut io = ScriptedInteraction::new();
        let bindings: SubstitutionTable =
            [("WORD".to_string(), "bound".to_string())].into_iter().collect();
        let opts = ExecOptions { bindings, skip_confirm: true, timeout: None };

        let outcome = {
            let mut coordinator = Coordinator::new(&store, &mut io);
            coordinator.execute(&command("say", "echo {{WORD}}"), &opts).unwrap()
        };

        match outcome {
            ExecutionOutcome::Command(cmd) => assert!(cmd.stdout.contains("bound")),
            other => panic!("expected command outcome, got {other:?}"),
        }
        assert!(io.prompted().is_empty());
    }

    #[test]
    fn test_prompted_value_flows_into_command() {
        let store = MemoryStore::new();
        let mut io = ScriptedInteraction::new().with_answer("prompted").with_confirmation(true);
        let outcome = {
            let mut coordinator = Coordinator::new(&store, &mut io);
            coordinator
                .execute(&command("say", "echo {{WORD}}"), &ExecOptions::default())
                .unwrap()
        };

        match outcome {
            ExecutionOutcome::Command(cmd) => assert!(cmd.stdout.contains("prompted")),
            other => panic!("expected command outcome, got {other:?}"),
        }
        // The rendered command was shown at the gate.
        assert_eq!(io.confirmed(), ["Execute 'echo prompted'?"]);
    }

    #[test]
    fn test_decline_aborts_without_side_effect() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let store = MemoryStore::new();
        let mut io = ScriptedInteraction::new().with_confirmation(false);
        let mut coordinator = Coordinator::new(&store, &mut io);

        let entry = command("touchit", &format!("touch {}", marker.display()));
        let err = coordinator.execute(&entry, &ExecOptions::default()).unwrap_err();

        assert!(matches!(err, ExecError::Aborted));
        assert_eq!(coordinator.phase(), ExecPhase::Aborted);
        assert!(!marker.exists());
    }

    #[test]
    fn test_prompt_cancellation_aborts_before_side_effect() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let store = MemoryStore::new();
        // No answers queued: the first prompt cancels.
        let mut io = ScriptedInteraction::new();
        let mut coordinator = Coordinator::new(&store, &mut io);

        let entry = command("touchit", &format!("touch {} # {{{{WHY}}}}", marker.display()));
        let err = coordinator.execute(&entry, &ExecOptions::default()).unwrap_err();

        assert!(matches!(err, ExecError::Aborted));
        assert!(!marker.exists());
    }

    #[test]
    fn test_not_executable_kinds_rejected() {
        let store = MemoryStore::new();
        let mut io = ScriptedInteraction::new();
        let mut coordinator = Coordinator::new(&store, &mut io);

        for kind in [EntryKind::Note, EntryKind::Snippet, EntryKind::File] {
            let entry = Entry::new(kind, "doc", "", "text");
            let err = coordinator.execute(&entry, &ExecOptions::default()).unwrap_err();
            match err {
                ExecError::NotExecutable { name, kind: k } => {
                    assert_eq!(name, "doc");
                    assert_eq!(k, kind);
                }
                other => panic!("expected NotExecutable, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_playbook_runs_steps_in_order() {
        let mut store = MemoryStore::new();
        store.insert(command("first", "echo one"));
        store.insert(command("second", "echo two"));
        store.insert(Entry::new(EntryKind::Playbook, "both", "", "first\nsecond\n"));

        let mut io = ScriptedInteraction::new();
        let opts = ExecOptions { skip_confirm: true, ..ExecOptions::default() };
        let mut coordinator = Coordinator::new(&store, &mut io);

        let playbook = store.lookup("both").unwrap();
        let outcome = coordinator.execute(&playbook, &opts).unwrap();

        match outcome {
            ExecutionOutcome::Playbook { steps } => {
                assert_eq!(steps.len(), 2);
                assert_eq!(steps[0].name, "first");
                assert_eq!(steps[1].name, "second");
            }
            other => panic!("expected playbook outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_playbook_fail_fast() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("never");
        let mut store = MemoryStore::new();
        store.insert(command("a", "echo a"));
        store.insert(command("b", "exit 7"));
        store.insert(command("c", &format!("touch {}", marker.display())));
        store.insert(Entry::new(EntryKind::Playbook, "seq", "", "a\nb\nc\n"));

        let mut io = ScriptedInteraction::new();
        let opts = ExecOptions { skip_confirm: true, ..ExecOptions::default() };
        let mut coordinator = Coordinator::new(&store, &mut io);

        let playbook = store.lookup("seq").unwrap();
        let err = coordinator.execute(&playbook, &opts).unwrap_err();

        match err {
            ExecError::StepFailed { index, name, completed, source } => {
                assert_eq!(index, 1);
                assert_eq!(name, "b");
                assert_eq!(completed.len(), 1);
                assert_eq!(completed[0].name, "a");
                assert!(matches!(*source, ExecError::Failed { .. }));
            }
            other => panic!("expected StepFailed, got {other:?}"),
        }
        // Fail-fast: step c never ran.
        assert!(!marker.exists());
        assert_eq!(coordinator.phase(), ExecPhase::Failed);
    }

    #[test]
    fn test_playbook_missing_step_reported_with_context() {
        let mut store = MemoryStore::new();
        store.insert(command("a", "echo a"));
        store.insert(Entry::new(EntryKind::Playbook, "seq", "", "a\nghost\n"));

        let mut io = ScriptedInteraction::new();
        let opts = ExecOptions { skip_confirm: true, ..ExecOptions::default() };
        let mut coordinator = Coordinator::new(&store, &mut io);

        let playbook = store.lookup("seq").unwrap();
        let err = coordinator.execute(&playbook, &opts).unwrap_err();

        match err {
            ExecError::StepFailed { index, completed, source, .. } => {
                assert_eq!(index, 1);
                assert_eq!(completed.len(), 1);
                assert!(matches!(*source, ExecError::NotFound { .. }));
            }
            other => panic!("expected StepFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_playbook_cycle_detected() {
        let mut store = MemoryStore::new();
        store.insert(Entry::new(EntryKind::Playbook, "outer", "", "inner\n"));
        store.insert(Entry::new(EntryKind::Playbook, "inner", "", "outer\n"));

        let mut io = ScriptedInteraction::new();
        let opts = ExecOptions { skip_confirm: true, ..ExecOptions::default() };
        let mut coordinator = Coordinator::new(&store, &mut io);

        let playbook = store.lookup("outer").unwrap();
        let err = coordinator.execute(&playbook, &opts).unwrap_err();

        fn innermost(err: &ExecError) -> &ExecError {
            match err {
                ExecError::StepFailed { source, .. } => innermost(source),
                other => other,
            }
        }
        match innermost(&err) {
            ExecError::CyclicPlaybook { name } => assert_eq!(name, "outer"),
            other => panic!("expected CyclicPlaybook, got {other:?}"),
        }
    }

    #[test]
    fn test_self_referential_playbook_detected() {
        let mut store = MemoryStore::new();
        store.insert(Entry::new(EntryKind::Playbook, "loop", "", "loop\n"));

        let mut io = ScriptedInteraction::new();
        let opts = ExecOptions { skip_confirm: true, ..ExecOptions::default() };
        let mut coordinator = Coordinator::new(&store, &mut io);

        let playbook = store.lookup("loop").unwrap();
        let err = coordinator.execute(&playbook, &opts).unwrap_err();
        match err {
            ExecError::StepFailed { source, .. } => {
                assert!(matches!(*source, ExecError::CyclicPlaybook { .. }));
            }
            other => panic!("expected StepFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_prompted_values_reused_across_steps() {
        let mut store = MemoryStore::new();
        store.insert(command("greet", "echo hello {{WHO}}"));
        store.insert(command("part", "echo goodbye {{WHO}}"));
        store.insert(Entry::new(EntryKind::Playbook, "visit", "", "greet\npart\n"));

        // One answer only: the second step must reuse it.
        let mut io = ScriptedInteraction::new().with_answer("alice");
        let opts = ExecOptions { skip_confirm: true, ..ExecOptions::default() };

        let outcome = {
            let mut coordinator = Coordinator::new(&store, &mut io);
            let playbook = store.lookup("visit").unwrap();
            coordinator.execute(&playbook, &opts).unwrap()
        };

        match outcome {
            ExecutionOutcome::Playbook { steps } => assert_eq!(steps.len(), 2),
            other => panic!("expected playbook outcome, got {other:?}"),
        }
        assert_eq!(io.prompted(), ["WHO"]);
    }

    #[test]
    fn test_empty_playbook_succeeds() {
        let mut store = MemoryStore::new();
        store.insert(Entry::new(EntryKind::Playbook, "empty", "", "# nothing yet\n"));

        let mut io = ScriptedInteraction::new();
        let opts = ExecOptions { skip_confirm: true, ..ExecOptions::default() };
        let mut coordinator = Coordinator::new(&store, &mut io);

        let playbook = store.lookup("empty").unwrap();
        let outcome = coordinator.execute(&playbook, &opts).unwrap();
        match outcome {
            ExecutionOutcome::Playbook { steps } => assert!(steps.is_empty()),
            other => panic!("expected playbook outcome, got {other:?}"),
        }
    }
}
