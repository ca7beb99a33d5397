//! # Document Storage
//!
//! Persistence backends for committed documents. The editing core only calls
//! `save` after a successful commit and `load` when a session starts; the
//! in-memory document stays authoritative when a save fails.
//!
//! - **Memory**: for tests and throwaway sessions
//! - **File**: one pretty-printed JSON file per document id

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::debug;

use crate::document::Document;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Invalid document id: {0:?}")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(_: PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}

/// Listing entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.metadata.title.clone(),
            updated_at: doc.metadata.updated_at,
        }
    }
}

/// Persistence collaborator
pub trait DocumentStore: Send + Sync {
    fn save(&self, id: &str, document: &Document) -> Result<(), StoreError>;

    fn load(&self, id: &str) -> Result<Document, StoreError>;

    /// Most recently updated first
    fn list(&self) -> Result<Vec<DocumentSummary>, StoreError>;

    fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn save(&self, id: &str, document: &Document) -> Result<(), StoreError> {
        self.documents.lock()?.insert(id.to_string(), document.clone());
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Document, StoreError> {
        self.documents
            .lock()?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn list(&self) -> Result<Vec<DocumentSummary>, StoreError> {
        let mut summaries: Vec<DocumentSummary> =
            self.documents.lock()?.values().map(DocumentSummary::from).collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.documents
            .lock()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

/// Directory of `<id>.json` files
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !safe {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(format!("{}.json", id)))
    }
}

impl DocumentStore for FileStore {
    fn save(&self, id: &str, document: &Document) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        std::fs::create_dir_all(&self.root)?;

        // write-then-rename so a crash never leaves a truncated file
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(document)?)?;
        std::fs::rename(&tmp, &path)?;

        debug!(id, path = %path.display(), "Saved document");
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Document, StoreError> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let source = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&source)?)
    }

    fn list(&self) -> Result<Vec<DocumentSummary>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                let source = std::fs::read_to_string(&path)?;
                let doc: Document = serde_json::from_str(&source)?;
                summaries.push(DocumentSummary::from(&doc));
            }
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        std::fs::remove_file(path)?;
        Ok(())
    }
}

/// Where the last save attempt left things
#[derive(Debug, Clone, PartialEq)]
pub enum SyncState {
    Idle,
    /// A save is scheduled or in flight
    Pending,
    Saved { at: DateTime<Utc> },
    /// Retryable; the in-memory document is still correct
    Failed { message: String },
}

impl SyncState {
    pub fn is_failed(&self) -> bool {
        matches!(self, SyncState::Failed { .. })
    }
}
