//! Terminal presentation helpers.
//!
//! Plain-text rendering of entry listings, entry details, and execution
//! reports. Formatting is kept separate from printing so tests can assert on
//! the rendered text.

use crate::core::{Entry, EntryKind};
use crate::exec::{ExecError, ExecutionOutcome, FailureCause, StepReport};

/// Maximum description width in list output.
const DESCRIPTION_WIDTH: usize = 50;

/// Render entries as an aligned table.
pub fn format_entry_table(entries: &[&Entry]) -> String {
    let mut name_width = "NAME".len();
    for entry in entries {
        name_width = name_width.max(entry.name.len());
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:<10} {:<name_width$} {:<DESCRIPTION_WIDTH$} TAGS\n",
        "ID", "TYPE", "NAME", "DESCRIPTION"
    ));
    for entry in entries {
        out.push_str(&format!(
            "{:<10} {:<10} {:<name_width$} {:<DESCRIPTION_WIDTH$} {}\n",
            entry.id,
            entry.kind.type_name(),
            entry.name,
            truncate(&entry.description, DESCRIPTION_WIDTH),
            entry.tags.join(", "),
        ));
    }
    out
}

/// Render a single entry in full.
pub fn format_entry_detail(entry: &Entry) -> String {
    let mut out = String::new();
    out.push_str(&format!("ID:          {}\n", entry.id));
    out.push_str(&format!("Type:        {}\n", entry.kind));
    out.push_str(&format!("Name:        {}\n", entry.name));
    out.push_str(&format!("Description: {}\n", entry.description));
    out.push_str(&format!("Tags:        {}\n", entry.tags.join(", ")));
    out.push_str(&format!("Created:     {}\n", entry.created_at));
    out.push_str(&format!("Updated:     {}\n", entry.updated_at));

    if entry.kind == EntryKind::Api {
        let meta = &entry.metadata;
        out.push_str(&format!("Method:      {}\n", meta.method.as_deref().unwrap_or("GET")));
        out.push_str(&format!("URL:         {}\n", meta.url.as_deref().unwrap_or("")));
        if !meta.headers.is_empty() {
            let mut keys: Vec<&String> = meta.headers.keys().collect();
            keys.sort();
            out.push_str("Headers:\n");
            for key in keys {
                out.push_str(&format!("  {key}: {}\n", meta.headers[key]));
            }
        }
    }
    if let Some(ref language) = entry.metadata.language {
        out.push_str(&format!("Language:    {language}\n"));
    }
    if let Some(ref filename) = entry.metadata.filename {
        out.push_str(&format!("Filename:    {filename}\n"));
    }

    out.push_str("\nContent:\n");
    out.push_str(&entry.content);
    if !entry.content.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Render an execution outcome for the terminal.
pub fn format_outcome(outcome: &ExecutionOutcome) -> String {
    match outcome {
        ExecutionOutcome::Command(cmd) => {
            let mut out = String::new();
            if !cmd.stdout.is_empty() {
                out.push_str(&cmd.stdout);
                if !cmd.stdout.ends_with('\n') {
                    out.push('\n');
                }
            }
            if !cmd.stderr.is_empty() {
                out.push_str(&cmd.stderr);
                if !cmd.stderr.ends_with('\n') {
                    out.push('\n');
                }
            }
            out.push_str(&format!(
                "Command completed (exit code: {}, {} ms)\n",
                cmd.exit_code, cmd.duration_ms
            ));
            out
        }
        ExecutionOutcome::Api(api) => {
            format!("Status: {}\n{}\n", api.status, pretty_body(&api.body))
        }
        ExecutionOutcome::Playbook { steps } => {
            let mut out = String::new();
            for step in steps {
                out.push_str(&format_step_line(step));
            }
            out.push_str(&format!("Playbook completed ({} steps)\n", steps.len()));
            out
        }
    }
}

/// Render an execution error, including partial playbook results.
pub fn format_exec_error(err: &ExecError) -> String {
    match err {
        ExecError::Aborted => "Cancelled\n".to_string(),
        ExecError::StepFailed { index, name, completed, source } => {
            let mut out = String::new();
            for step in completed {
                out.push_str(&format_step_line(step));
            }
            out.push_str(&format!("Step {} ('{name}') failed: {}\n", index + 1, flatten(source)));
            out.push_str(&format!(
                "Playbook halted; {} of {} step(s) completed before the failure\n",
                completed.len(),
                completed.len() + 1
            ));
            out
        }
        ExecError::Failed { name, cause } => {
            let mut out = format!("'{name}' failed: {cause}\n");
            if let FailureCause::Process { stdout, stderr, .. } = cause {
                if !stdout.is_empty() {
                    out.push_str(stdout);
                    if !stdout.ends_with('\n') {
                        out.push('\n');
                    }
                }
                if !stderr.is_empty() {
                    out.push_str(stderr);
                    if !stderr.ends_with('\n') {
                        out.push('\n');
                    }
                }
            }
            if let FailureCause::HttpStatus { body, .. } = cause {
                if !body.is_empty() {
                    out.push_str(&pretty_body(body));
                    out.push('\n');
                }
            }
            out
        }
        other => format!("{other}\n"),
    }
}

fn format_step_line(step: &StepReport) -> String {
    format!("Step {}: {} ... {}\n", step.index + 1, step.name, step.outcome.summary())
}

/// Collapse a nested error into one line for step reporting.
fn flatten(err: &ExecError) -> String {
    match err {
        ExecError::Failed { cause, .. } => cause.to_string(),
        other => other.to_string(),
    }
}

/// Re-render JSON bodies with indentation; other bodies pass through.
fn pretty_body(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
