//! On-disk vault store.
//!
//! Entries live in a single JSON document (`data/vault.json` by default,
//! relative to the working directory). The whole document is loaded on open
//! and rewritten on every mutation; vaults are small and the CLI is a
//! one-shot process per invocation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{Entry, EntryKind};
use crate::store::EntryLookup;

/// Directory holding the vault, relative to the working directory.
pub const VAULT_DIR: &str = "data";

/// Vault file name.
pub const VAULT_FILE: &str = "vault.json";

/// Store-level errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No vault file at the expected location
    #[error("no vault found at {}. Run 'devvault init' to create one", .path.display())]
    NotInitialized {
        /// Expected vault path
        path: PathBuf,
    },

    /// `init` would overwrite an existing vault
    #[error("vault already exists at {}", .path.display())]
    AlreadyExists {
        /// Existing vault path
        path: PathBuf,
    },

    /// No entry matches the identifier
    #[error("entry not found: {name}")]
    NotFound {
        /// The identifier that failed to resolve
        name: String,
    },

    /// An entry with this name is already stored
    #[error("an entry named '{name}' already exists")]
    DuplicateName {
        /// The conflicting name
        name: String,
    },

    /// Filesystem failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The vault document is not valid JSON
    #[error("invalid vault document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialized vault document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VaultDocument {
    /// Document version for future migrations
    #[serde(default = "default_version")]
    version: u32,

    /// Stored entries
    #[serde(default)]
    entries: Vec<Entry>,
}

fn default_version() -> u32 {
    1
}

impl Default for VaultDocument {
    fn default() -> Self {
        Self { version: default_version(), entries: Vec::new() }
    }
}

/// The on-disk entry store.
#[derive(Debug)]
pub struct Vault {
    path: PathBuf,
    doc: VaultDocument,
}

impl Vault {
    /// Default vault path relative to the working directory.
    pub fn default_path() -> PathBuf {
        Path::new(VAULT_DIR).join(VAULT_FILE)
    }

    /// Whether a vault exists at the given path.
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Create a new empty vault at the given path.
    pub fn init(path: &Path) -> Result<Self, StoreError> {
        if path.exists() {
            return Err(StoreError::AlreadyExists { path: path.to_path_buf() });
        }
        let vault = Self { path: path.to_path_buf(), doc: VaultDocument::default() };
        vault.save()?;
        Ok(vault)
    }

    /// Open an existing vault.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotInitialized { path: path.to_path_buf() });
        }
        let content = std::fs::read_to_string(path)?;
        let doc: VaultDocument = serde_json::from_str(&content)?;
        Ok(Self { path: path.to_path_buf(), doc })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the document.
    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.doc)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Insert a new entry and persist.
    ///
    /// Names are unique within the vault.
    pub fn insert(&mut self, entry: Entry) -> Result<(), StoreError> {
        if self.doc.entries.iter().any(|e| e.name == entry.name) {
            return Err(StoreError::DuplicateName { name: entry.name });
        }
        self.doc.entries.push(entry);
        self.save()
    }

    /// Find an entry by ID or name.
    pub fn get(&self, identifier: &str) -> Option<&Entry> {
        self.doc
            .entries
            .iter()
            .find(|e| e.id == identifier)
            .or_else(|| self.doc.entries.iter().find(|e| e.name == identifier))
    }

    /// All entries, in insertion order.
    pub fn all(&self) -> &[Entry] {
        &self.doc.entries
    }

    /// Entries of the given kind.
    pub fn by_kind(&self, kind: EntryKind) -> Vec<&Entry> {
        self.doc.entries.iter().filter(|e| e.kind == kind).collect()
    }

    /// Entries carrying the given tag.
    pub fn by_tag(&self, tag: &str) -> Vec<&Entry> {
        self.doc.entries.iter().filter(|e| e.tags.iter().any(|t| t == tag)).collect()
    }

    /// Case-insensitive substring search across name, description, content,
    /// and tags.
    pub fn search(&self, query: &str) -> Vec<&Entry> {
        let query = query.to_lowercase();
        self.doc
            .entries
            .iter()
            .filter(|e| e.search_text().to_lowercase().contains(&query))
            .collect()
    }

    /// Replace an entry identified by ID or name, and persist.
    ///
    /// The stored ID and creation timestamp are kept; the update timestamp
    /// is refreshed.
    pub fn update(&mut self, identifier: &str, mut updated: Entry) -> Result<(), StoreError> {
        let index = self
            .index_of(identifier)
            .ok_or_else(|| StoreError::NotFound { name: identifier.to_string() })?;

        let renamed = updated.name != self.doc.entries[index].name;
        if renamed && self.doc.entries.iter().any(|e| e.name == updated.name) {
            return Err(StoreError::DuplicateName { name: updated.name });
        }

        updated.id = self.doc.entries[index].id.clone();
        updated.created_at = self.doc.entries[index].created_at.clone();
        updated.touch();
        self.doc.entries[index] = updated;
        self.save()
    }

    /// Remove an entry by ID or name, and persist.
    pub fn delete(&mut self, identifier: &str) -> Result<Entry, StoreError> {
        let index = self
            .index_of(identifier)
            .ok_or_else(|| StoreError::NotFound { name: identifier.to_string() })?;
        let removed = self.doc.entries.remove(index);
        self.save()?;
        Ok(removed)
    }

    /// All distinct tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> =
            self.doc.entries.iter().flat_map(|e| e.tags.iter().cloned()).collect();
        tags.sort();
        tags.dedup();
        tags
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.doc.entries.len()
    }

    /// Whether the vault holds no entries.
    pub fn is_empty(&self) -> bool {
        self.doc.entries.is_empty()
    }

    fn index_of(&self, identifier: &str) -> Option<usize> {
        self.doc
            .entries
            .iter()
            .position(|e| e.id == identifier)
            .or_else(|| self.doc.entries.iter().position(|e| e.name == identifier))
    }
}

impl EntryLookup for Vault {
    fn lookup(&self, identifier: &str) -> Option<Entry> {
        self.get(identifier).cloned()
    }
}
