//! # Patch Validator
//!
//! Filters a proposed batch before it is ever applied. Only two shapes are
//! vetoed; everything else passes through untouched:
//!
//! 1. `remove` of a page or block whose `removable` flag is `false`
//! 2. `add` of a new block whose `value.type` is outside [`BlockType::ALL`]
//!
//! Vetoed operations are logged and reported, never raised as errors. The
//! caller gets the surviving operations in their original order.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::warn;

use crate::document::{BlockType, Document};
use crate::patch::PatchOperation;
use crate::pointer::{self, BlockField, BlockRef, PageRest, PathTarget};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RejectionReason {
    PageNotRemovable { page_id: String },
    BlockNotRemovable { block_id: String },
    UnknownBlockType { block_type: String },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::PageNotRemovable { page_id } => {
                write!(f, "page {} is not removable", page_id)
            }
            RejectionReason::BlockNotRemovable { block_id } => {
                write!(f, "block {} is not removable", block_id)
            }
            RejectionReason::UnknownBlockType { block_type } => {
                write!(f, "unknown block type {:?}", block_type)
            }
        }
    }
}

/// An operation dropped from a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    /// Position in the proposed batch
    pub index: usize,
    pub operation: PatchOperation,
    pub reason: RejectionReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub accepted: Vec<PatchOperation>,
    pub rejected: Vec<Rejection>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Split a batch into retained and rejected operations
pub fn validate(operations: Vec<PatchOperation>, doc: &Document) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (index, operation) in operations.into_iter().enumerate() {
        match check(&operation, doc) {
            None => report.accepted.push(operation),
            Some(reason) => {
                warn!(index, op = %operation, reason = %reason, "Dropping proposed operation");
                report.rejected.push(Rejection {
                    index,
                    operation,
                    reason,
                });
            }
        }
    }

    report
}

/// Retained operations only
pub fn filter(operations: Vec<PatchOperation>, doc: &Document) -> Vec<PatchOperation> {
    validate(operations, doc).accepted
}

fn check(operation: &PatchOperation, doc: &Document) -> Option<RejectionReason> {
    match operation {
        PatchOperation::Remove { path } => check_removal(path, doc),
        PatchOperation::Add { path, value } => check_block_type(path, value),
        _ => None,
    }
}

fn check_removal(path: &str, doc: &Document) -> Option<RejectionReason> {
    let PathTarget::Page { page, rest } = pointer::classify(path) else {
        return None;
    };
    let page = &doc.pages[page.resolve(doc)?];

    match rest {
        PageRest::Whole if !page.removable => Some(RejectionReason::PageNotRemovable {
            page_id: page.id.clone(),
        }),
        PageRest::Block {
            block: BlockRef::Index(index),
            field: BlockField::Whole,
        } => {
            let block = page.blocks.get(index)?;
            (!block.removable).then(|| RejectionReason::BlockNotRemovable {
                block_id: block.id.clone(),
            })
        }
        _ => None,
    }
}

fn check_block_type(path: &str, value: &Value) -> Option<RejectionReason> {
    if !pointer::classify(path).is_block() {
        return None;
    }
    let block_type = value.get("type")?;
    let known = block_type
        .as_str()
        .map(|s| s.parse::<BlockType>().is_ok())
        .unwrap_or(false);

    (!known).then(|| RejectionReason::UnknownBlockType {
        block_type: match block_type {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    })
}
