//! DevVault - local-first knowledge vault for your terminal.
//!
//! Stores reusable commands, API requests, snippets, files, playbooks, and
//! notes in a per-project JSON vault, and executes the runnable ones with
//! placeholder resolution and confirmation.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use devvault::core::{Config, SubstitutionTable};
use devvault::exec::{Coordinator, ExecOptions};
use devvault::output;
use devvault::{Entry, EntryKind, Metadata, TerminalInteraction, Vault};

/// Local-first knowledge vault for your terminal
#[derive(Parser)]
#[command(name = "devvault")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Vault file path (defaults to ./data/vault.json)
    #[arg(long, global = true, env = "DEVVAULT_VAULT")]
    vault: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new vault in the current directory
    Init,

    /// Add a new entry to the vault
    Add {
        /// Entry kind to add
        #[command(subcommand)]
        kind: AddKind,
    },

    /// List entries
    List {
        /// Filter by entry kind (command, api, snippet, file, playbook, note)
        #[arg(short, long)]
        kind: Option<String>,

        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Full-text search across entries
    Search {
        /// Search query (case-insensitive substring)
        query: String,
    },

    /// View entry details
    Show {
        /// Entry ID or name
        identifier: String,
    },

    /// Execute a command, API request, or playbook
    Run {
        /// Entry ID or name
        identifier: String,

        /// Skip the confirmation gate
        #[arg(short = 'y', long)]
        yes: bool,

        /// Placeholder assignments (NAME=value), repeatable
        #[arg(long)]
        var: Vec<String>,

        /// Timeout in seconds for each executed action
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Edit an entry in $EDITOR
    Edit {
        /// Entry ID or name
        identifier: String,
    },

    /// Delete an entry
    Delete {
        /// Entry ID or name
        identifier: String,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all tags
    Tags,

    /// Export an entry to a JSON file
    Export {
        /// Entry ID or name
        identifier: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import an entry from a JSON file
    Import {
        /// Path of a previously exported entry
        filepath: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Flags shared by every `add` subcommand.
#[derive(clap::Args)]
struct AddCommon {
    /// Short identifier (unique within the vault)
    #[arg(short, long)]
    name: String,

    /// What it does
    #[arg(short, long)]
    description: String,

    /// Comma-separated tags
    #[arg(short, long)]
    tags: Option<String>,
}

#[derive(Subcommand)]
enum AddKind {
    /// Add a shell command entry
    Command {
        #[command(flatten)]
        common: AddCommon,

        /// Command string (use @file to read from a file)
        #[arg(short, long)]
        content: String,
    },

    /// Add an API request entry
    Api {
        #[command(flatten)]
        common: AddCommon,

        /// HTTP method
        #[arg(long, default_value = "GET")]
        method: String,

        /// Request URL
        #[arg(long)]
        url: String,

        /// Headers (format: Key:Value), repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body (use @file to read from a file)
        #[arg(short, long, default_value = "")]
        content: String,
    },

    /// Add a code snippet entry
    Snippet {
        #[command(flatten)]
        common: AddCommon,

        /// Snippet content (use @file to read from a file)
        #[arg(short, long)]
        content: String,

        /// Programming language
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Add a note entry
    Note {
        #[command(flatten)]
        common: AddCommon,

        /// Note content (use @file to read from a file)
        #[arg(short, long)]
        content: String,
    },

    /// Add a file entry
    File {
        #[command(flatten)]
        common: AddCommon,

        /// File content (use @file to read from a file)
        #[arg(short, long)]
        content: String,

        /// Original filename
        #[arg(short, long)]
        filename: Option<String>,
    },

    /// Add a playbook entry (one entry name per line)
    Playbook {
        #[command(flatten)]
        common: AddCommon,

        /// Playbook content (use @file to read from a file)
        #[arg(short, long)]
        content: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    let vault_path = cli.vault.clone().unwrap_or_else(Vault::default_path);

    match cli.command {
        Commands::Init => cmd_init(&vault_path),
        Commands::Add { kind } => cmd_add(&vault_path, kind),
        Commands::List { kind, tag, format } => {
            cmd_list(&vault_path, kind.as_deref(), tag.as_deref(), &format)
        }
        Commands::Search { query } => cmd_search(&vault_path, &query),
        Commands::Show { identifier } => cmd_show(&vault_path, &identifier),
        Commands::Run { identifier, yes, var, timeout } => {
            cmd_run(&vault_path, &identifier, yes, &var, timeout)
        }
        Commands::Edit { identifier } => cmd_edit(&vault_path, &identifier),
        Commands::Delete { identifier, yes } => cmd_delete(&vault_path, &identifier, yes),
        Commands::Tags => cmd_tags(&vault_path),
        Commands::Export { identifier, output } => cmd_export(&vault_path, &identifier, &output),
        Commands::Import { filepath } => cmd_import(&vault_path, &filepath),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// Initialize a new vault.
fn cmd_init(vault_path: &Path) -> Result<()> {
    if Vault::exists(vault_path) {
        println!("Vault already exists at {}", vault_path.display());
        return Ok(());
    }
    let vault = Vault::init(vault_path)?;
    println!("Vault initialized at {}", vault.path().display());
    Ok(())
}

/// Add an entry.
fn cmd_add(vault_path: &Path, kind: AddKind) -> Result<()> {
    let mut vault = Vault::open(vault_path)?;

    let entry = match kind {
        AddKind::Command { common, content } => {
            build_entry(EntryKind::Command, common, &content, Metadata::default())?
        }
        AddKind::Api { common, method, url, headers, content } => {
            let metadata = Metadata {
                method: Some(method.to_uppercase()),
                url: Some(url),
                headers: parse_headers(&headers),
                ..Metadata::default()
            };
            build_entry(EntryKind::Api, common, &content, metadata)?
        }
        AddKind::Snippet { common, content, language } => {
            let metadata = Metadata { language, ..Metadata::default() };
            build_entry(EntryKind::Snippet, common, &content, metadata)?
        }
        AddKind::Note { common, content } => {
            build_entry(EntryKind::Note, common, &content, Metadata::default())?
        }
        AddKind::File { common, content, filename } => {
            let metadata = Metadata { filename, ..Metadata::default() };
            build_entry(EntryKind::File, common, &content, metadata)?
        }
        AddKind::Playbook { common, content } => {
            build_entry(EntryKind::Playbook, common, &content, Metadata::default())?
        }
    };

    let kind_name = entry.kind.type_name();
    let name = entry.name.clone();
    let id = entry.id.clone();
    vault.insert(entry)?;
    println!("Added {kind_name} '{name}' (ID: {id})");
    Ok(())
}

/// Build an entry from shared add flags.
fn build_entry(
    kind: EntryKind,
    common: AddCommon,
    content: &str,
    metadata: Metadata,
) -> Result<Entry> {
    let content = read_content(content)?;
    Ok(Entry::new(kind, common.name, common.description, content)
        .with_tags(parse_tags(common.tags.as_deref()))
        .with_metadata(metadata))
}

/// List entries, optionally filtered.
fn cmd_list(
    vault_path: &Path,
    kind: Option<&str>,
    tag: Option<&str>,
    format: &str,
) -> Result<()> {
    let vault = Vault::open(vault_path)?;

    let entries: Vec<&Entry> = if let Some(kind) = kind {
        let kind: EntryKind = kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        vault.by_kind(kind)
    } else if let Some(tag) = tag {
        vault.by_tag(tag)
    } else {
        vault.all().iter().collect()
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No entries found");
        return Ok(());
    }
    print!("{}", output::format_entry_table(&entries));
    Ok(())
}

/// Search entries.
fn cmd_search(vault_path: &Path, query: &str) -> Result<()> {
    let vault = Vault::open(vault_path)?;
    let entries = vault.search(query);

    if entries.is_empty() {
        println!("No entries found matching '{query}'");
        return Ok(());
    }
    print!("{}", output::format_entry_table(&entries));
    Ok(())
}

/// Show entry details.
fn cmd_show(vault_path: &Path, identifier: &str) -> Result<()> {
    let vault = Vault::open(vault_path)?;
    let entry = require_entry(&vault, identifier)?;
    print!("{}", output::format_entry_detail(&entry));
    Ok(())
}

/// Execute an entry.
fn cmd_run(
    vault_path: &Path,
    identifier: &str,
    skip_confirm: bool,
    vars: &[String],
    timeout_secs: Option<u64>,
) -> Result<()> {
    let vault = Vault::open(vault_path)?;
    let entry = require_entry(&vault, identifier)?;
    let config = Config::load_for_vault(vault_path)?;

    let timeout = timeout_secs.or(config.default_timeout_secs).map(Duration::from_secs);
    let opts = ExecOptions { bindings: parse_vars(vars)?, skip_confirm, timeout };

    let mut interaction = TerminalInteraction::new();
    let mut coordinator = Coordinator::new(&vault, &mut interaction);

    match coordinator.execute(&entry, &opts) {
        Ok(outcome) => {
            print!("{}", output::format_outcome(&outcome));
            Ok(())
        }
        Err(err) => {
            print!("{}", output::format_exec_error(&err));
            if err.is_abort() {
                return Ok(());
            }
            std::process::exit(1);
        }
    }
}

/// Edit an entry in $EDITOR.
fn cmd_edit(vault_path: &Path, identifier: &str) -> Result<()> {
    let mut vault = Vault::open(vault_path)?;
    let entry = require_entry(&vault, identifier)?;
    let config = Config::load_for_vault(vault_path)?;

    let editor = std::env::var("EDITOR")
        .ok()
        .or(config.editor)
        .unwrap_or_else(|| "vi".to_string());

    let file = tempfile::Builder::new()
        .prefix("devvault-")
        .suffix(".json")
        .tempfile()
        .context("failed to create temp file")?;
    std::fs::write(file.path(), serde_json::to_string_pretty(&entry)?)?;

    let status = std::process::Command::new(&editor)
        .arg(file.path())
        .status()
        .with_context(|| format!("failed to launch editor '{editor}'"))?;
    if !status.success() {
        bail!("editor exited with {status}");
    }

    let edited = std::fs::read_to_string(file.path())?;
    let updated: Entry = serde_json::from_str(&edited).context("invalid JSON in edited file")?;

    if updated.kind != entry.kind {
        bail!("entry kind is immutable (was {}, edited to {})", entry.kind, updated.kind);
    }

    let name = updated.name.clone();
    vault.update(identifier, updated)?;
    println!("Updated entry '{name}'");
    Ok(())
}

/// Delete an entry.
fn cmd_delete(vault_path: &Path, identifier: &str, skip_confirm: bool) -> Result<()> {
    let mut vault = Vault::open(vault_path)?;
    let entry = require_entry(&vault, identifier)?;

    if !skip_confirm {
        print!("Delete '{}'? [y/N] ", entry.name);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled");
            return Ok(());
        }
    }

    let removed = vault.delete(identifier)?;
    println!("Deleted entry '{}'", removed.name);
    Ok(())
}

/// List all tags.
fn cmd_tags(vault_path: &Path) -> Result<()> {
    let vault = Vault::open(vault_path)?;
    let tags = vault.tags();

    if tags.is_empty() {
        println!("No tags found");
        return Ok(());
    }
    println!("Tags:");
    for tag in tags {
        println!("  - {tag}");
    }
    Ok(())
}

/// Export an entry to a JSON file.
fn cmd_export(vault_path: &Path, identifier: &str, output: &Path) -> Result<()> {
    let vault = Vault::open(vault_path)?;
    let entry = require_entry(&vault, identifier)?;

    std::fs::write(output, serde_json::to_string_pretty(&entry)?)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Exported '{}' to {}", entry.name, output.display());
    Ok(())
}

/// Fields accepted from an imported entry file.
#[derive(serde::Deserialize)]
struct ImportedEntry {
    #[serde(rename = "type")]
    kind: EntryKind,
    name: String,
    description: String,
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    metadata: Metadata,
}

/// Import an entry from a JSON file, assigning a fresh ID and timestamps.
fn cmd_import(vault_path: &Path, filepath: &Path) -> Result<()> {
    let mut vault = Vault::open(vault_path)?;

    let content = std::fs::read_to_string(filepath)
        .with_context(|| format!("file not found: {}", filepath.display()))?;
    let imported: ImportedEntry =
        serde_json::from_str(&content).context("invalid JSON file")?;

    let entry = Entry::new(imported.kind, imported.name, imported.description, imported.content)
        .with_tags(imported.tags)
        .with_metadata(imported.metadata);
    let name = entry.name.clone();
    let id = entry.id.clone();
    vault.insert(entry)?;
    println!("Imported '{name}' (ID: {id})");
    Ok(())
}

/// Generate shell completions on stdout.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

/// Look up an entry or fail with a precise message.
fn require_entry(vault: &Vault, identifier: &str) -> Result<Entry> {
    vault
        .get(identifier)
        .cloned()
        .with_context(|| format!("Entry not found: {identifier}"))
}

/// Read content inline, or from a file when prefixed with `@`.
fn read_content(content: &str) -> Result<String> {
    if let Some(filepath) = content.strip_prefix('@') {
        return std::fs::read_to_string(filepath)
            .with_context(|| format!("file not found: {filepath}"));
    }
    Ok(content.to_string())
}

/// Parse a comma-separated tag list.
fn parse_tags(tags: Option<&str>) -> Vec<String> {
    tags.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Parse repeated `Key:Value` header flags.
fn parse_headers(headers: &[String]) -> std::collections::HashMap<String, String> {
    headers
        .iter()
        .filter_map(|h| {
            h.split_once(':').map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        })
        .collect()
}

/// Parse repeated `NAME=value` placeholder assignments.
fn parse_vars(vars: &[String]) -> Result<SubstitutionTable> {
    let mut bindings = SubstitutionTable::new();
    for var in vars {
        let Some((name, value)) = var.split_once('=') else {
            bail!("invalid --var '{var}' (expected NAME=value)");
        };
        bindings.insert(name.to_string(), value.to_string());
    }
    Ok(bindings)
}
