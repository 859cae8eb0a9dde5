//! Entry data structures.
//!
//! Defines the `Entry` struct that represents a stored knowledge artifact
//! and the closed set of entry kinds.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A stored knowledge artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier for this entry
    pub id: String,

    /// What kind of artifact this is
    #[serde(rename = "type")]
    pub kind: EntryKind,

    /// Unique name within the vault
    pub name: String,

    /// What this entry does
    pub description: String,

    /// The payload: shell text for commands, request body for api entries,
    /// opaque text for snippets/files/notes, one entry name per line for
    /// playbooks
    pub content: String,

    /// Tags for categorization and filtering
    #[serde(default)]
    pub tags: Vec<String>,

    /// Creation timestamp (RFC 3339, UTC)
    pub created_at: String,

    /// Last update timestamp (RFC 3339, UTC)
    pub updated_at: String,

    /// Kind-specific metadata
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Entry {
    /// Create a new entry with minimal required fields.
    pub fn new(
        kind: EntryKind,
        name: impl Into<String>,
        description: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = now_rfc3339();
        Self {
            id: generate_id(),
            kind,
            name: name.into(),
            description: description.into(),
            content: content.into(),
            tags: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
            metadata: Metadata::default(),
        }
    }

    /// Set the tags, dropping duplicates while preserving order.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.tags = tags.into_iter().filter(|t| seen.insert(t.clone())).collect();
        self
    }

    /// Add a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// Set the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Refresh the update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = now_rfc3339();
    }

    /// Check whether this entry can be executed.
    pub fn is_executable(&self) -> bool {
        self.kind.is_executable()
    }

    /// Parse playbook content into the ordered list of referenced entry names.
    ///
    /// One name per line; blank lines and `#` comments are ignored.
    pub fn playbook_steps(&self) -> Vec<&str> {
        self.content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect()
    }

    /// Get the text searched by the vault's substring search.
    pub fn search_text(&self) -> String {
        let mut text = self.name.clone();
        text.push(' ');
        text.push_str(&self.description);
        text.push(' ');
        text.push_str(&self.content);
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        text
    }
}

/// Kind of a stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A shell command
    Command,

    /// An HTTP API request
    Api,

    /// A code snippet
    Snippet,

    /// A config file or similar text artifact
    File,

    /// An ordered sequence of other entries to execute
    Playbook,

    /// A freeform note
    Note,
}

impl EntryKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 6] =
        [Self::Command, Self::Api, Self::Snippet, Self::File, Self::Playbook, Self::Note];

    /// Get the kind name for display and serialization.
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Api => "api",
            Self::Snippet => "snippet",
            Self::File => "file",
            Self::Playbook => "playbook",
            Self::Note => "note",
        }
    }

    /// Whether entries of this kind support execution.
    ///
    /// Snippets, files, and notes are display-only; invoking execution on
    /// them fails at the dispatch boundary.
    pub const fn is_executable(self) -> bool {
        matches!(self, Self::Command | Self::Api | Self::Playbook)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "command" => Ok(Self::Command),
            "api" => Ok(Self::Api),
            "snippet" => Ok(Self::Snippet),
            "file" => Ok(Self::File),
            "playbook" => Ok(Self::Playbook),
            "note" => Ok(Self::Note),
            other => Err(format!("invalid entry kind: {other}")),
        }
    }
}

/// Kind-specific metadata attached to an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// HTTP method (api entries)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Request URL (api entries)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Request headers (api entries)
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    /// Programming language (snippet entries)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Original filename (file entries)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl Metadata {
    /// Whether no metadata fields are set.
    pub fn is_empty(&self) -> bool {
        self.method.is_none()
            && self.url.is_none()
            && self.headers.is_empty()
            && self.language.is_none()
            && self.filename.is_none()
    }
}

/// Generate a unique 8-character entry ID.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()[..8].to_string()
}

/// Current UTC time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
