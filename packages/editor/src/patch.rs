//! # Patch Operations
//!
//! JSON Patch (RFC 6902) operations are the only way a [`Document`](crate::Document)
//! changes. Proposals arrive as a batch of [`PatchOperation`]s; once a review
//! session opens, each is wrapped in a [`PatchItem`] that carries its
//! lifecycle and semantic target.
//!
//! ## Wire format
//!
//! ```json
//! { "op": "add", "path": "/pages/0/blocks/-", "value": { ... } }
//! { "op": "move", "from": "/pages/0/blocks/2", "path": "/pages/0/blocks/0" }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::target::Target;

/// A single JSON Patch operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        PatchOperation::Add {
            path: path.into(),
            value,
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        PatchOperation::Remove { path: path.into() }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        PatchOperation::Replace {
            path: path.into(),
            value,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Replace { path, .. }
            | PatchOperation::Move { path, .. }
            | PatchOperation::Copy { path, .. }
            | PatchOperation::Test { path, .. } => path,
        }
    }

    pub fn from(&self) -> Option<&str> {
        match self {
            PatchOperation::Move { from, .. } | PatchOperation::Copy { from, .. } => Some(from),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            PatchOperation::Add { value, .. }
            | PatchOperation::Replace { value, .. }
            | PatchOperation::Test { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PatchOperation::Add { .. } => "add",
            PatchOperation::Remove { .. } => "remove",
            PatchOperation::Replace { .. } => "replace",
            PatchOperation::Move { .. } => "move",
            PatchOperation::Copy { .. } => "copy",
            PatchOperation::Test { .. } => "test",
        }
    }

    /// Display classification; move/copy/test collapse to replace
    pub fn change_type(&self) -> ChangeType {
        match self {
            PatchOperation::Add { .. } => ChangeType::Add,
            PatchOperation::Remove { .. } => ChangeType::Remove,
            _ => ChangeType::Replace,
        }
    }
}

impl fmt::Display for PatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.from() {
            Some(from) => write!(f, "{} {} -> {}", self.name(), from, self.path()),
            None => write!(f, "{} {}", self.name(), self.path()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Add,
    Remove,
    Replace,
}

/// Lifecycle of a proposed operation. Accepted and rejected are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl PatchStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PatchStatus::Pending)
    }
}

/// Identifier of a proposed operation within a review session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchId(pub String);

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatchId {
    fn from(s: &str) -> Self {
        PatchId(s.to_string())
    }
}

/// A proposed operation plus its resolution state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchItem {
    pub id: PatchId,

    pub operation: PatchOperation,

    pub status: PatchStatus,

    pub change_type: ChangeType,

    /// Entity (block or page id) the operation affects
    pub target: Target,
}

impl PatchItem {
    pub fn new(id: PatchId, operation: PatchOperation, target: Target) -> Self {
        Self {
            id,
            change_type: operation.change_type(),
            operation,
            status: PatchStatus::Pending,
            target,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == PatchStatus::Pending
    }

    /// Target entity id, if the path resolved to one
    pub fn entity(&self) -> Option<&str> {
        self.target.entity.as_deref()
    }
}

/// A batch could not be applied. The document it was applied to is unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    #[error("Invalid pointer: {0}")]
    Pointer(#[from] crate::pointer::PointerError),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Index out of range at {path}: {index} (len {len})")]
    IndexOutOfRange { path: String, index: usize, len: usize },

    #[error("Invalid array index at {path}: {token}")]
    InvalidIndex { path: String, token: String },

    #[error("Parent of {0} is not a container")]
    NotAContainer(String),

    #[error("Cannot move {from} into its own child {path}")]
    MoveIntoChild { from: String, path: String },

    #[error("Test failed at {0}")]
    TestFailed(String),

    #[error("Patched document has an invalid shape: {0}")]
    Shape(String),

    #[error("Operation {index} ({op}) failed: {source}")]
    Operation {
        index: usize,
        op: String,
        #[source]
        source: Box<PatchError>,
    },
}
