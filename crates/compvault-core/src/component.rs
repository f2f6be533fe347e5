use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, VaultError};

/// Format tag written into every stored document.
pub const DOCUMENT_VERSION: &str = "1.0";

/// One managed metadata entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Component {
    /// Build a fresh component from validated user input.
    pub fn new(draft: ComponentDraft) -> Result<Self> {
        Self::new_at(draft, Utc::now())
    }

    pub fn new_at(draft: ComponentDraft, now: DateTime<Utc>) -> Result<Self> {
        let draft = draft.normalized()?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            kind: draft.kind,
            description: draft.description,
            version: draft.version,
            author: draft.author,
            created_at: now,
            updated_at: now,
        })
    }

    /// Overwrite the editable fields. `id` and `created_at` never change and
    /// `updated_at` never moves backwards, even if the clock does.
    pub fn apply_at(&mut self, draft: ComponentDraft, now: DateTime<Utc>) -> Result<()> {
        let draft = draft.normalized()?;
        self.name = draft.name;
        self.kind = draft.kind;
        self.description = draft.description;
        self.version = draft.version;
        self.author = draft.author;
        self.updated_at = now.max(self.updated_at);
        Ok(())
    }

    /// Case-insensitive match against name, type and description.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term)
            || self.kind.to_lowercase().contains(&term)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&term))
    }
}

/// The user-editable fields of a component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentDraft {
    pub name: String,
    pub kind: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
}

impl ComponentDraft {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Trim everything, drop blank optionals, reject blank required fields.
    fn normalized(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        let kind = self.kind.trim().to_string();
        if name.is_empty() {
            return Err(VaultError::validation("component name is required"));
        }
        if kind.is_empty() {
            return Err(VaultError::validation("component type is required"));
        }
        Ok(Self {
            name,
            kind,
            description: non_blank(self.description),
            version: non_blank(self.version),
            author: non_blank(self.author),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The ordered set of components held by a session, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub components: Vec<Component>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Collection {
    pub fn empty() -> Self {
        Self {
            components: Vec::new(),
            last_updated: None,
        }
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.components.iter().position(|c| c.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::empty()
    }
}

/// JSON document sealed into the envelope and committed to the remote file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default = "default_encrypted")]
    pub encrypted: bool,
    #[serde(default)]
    pub version: Option<String>,
}

fn default_encrypted() -> bool {
    true
}

impl StoredDocument {
    pub fn from_components(components: &[Component], now: DateTime<Utc>) -> Self {
        Self {
            components: components.to_vec(),
            last_updated: Some(now),
            encrypted: true,
            version: Some(DOCUMENT_VERSION.to_string()),
        }
    }

    pub fn into_collection(self) -> Collection {
        Collection {
            components: self.components,
            last_updated: self.last_updated,
        }
    }
}
