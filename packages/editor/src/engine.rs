//! # Patch Engine
//!
//! Applies JSON Patch operations to a copy of a document.
//!
//! - **All-or-nothing**: a batch either applies completely or not at all.
//!   The input document is only borrowed, so a failed batch leaves it as it was.
//! - **Order-preserving**: operations run in the order given. Later operations
//!   may address indices shifted by earlier ones.
//! - **Shape-checked**: the patched tree must still deserialize as a
//!   [`Document`] without losing anything. A value of the wrong type at a
//!   typed position, or a member the model has no place for, fails the whole
//!   batch.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::document::Document;
use crate::patch::{PatchError, PatchItem, PatchOperation};
use crate::pointer::{self, parse_index};

/// Apply every operation to a copy of `doc`
pub fn apply_batch(doc: &Document, operations: &[PatchOperation]) -> Result<Document, PatchError> {
    let mut root = doc.to_value()?;

    for (index, op) in operations.iter().enumerate() {
        apply_operation(&mut root, op).map_err(|source| PatchError::Operation {
            index,
            op: op.to_string(),
            source: Box::new(source),
        })?;
        debug!(index, op = %op, "Applied operation");
    }

    let doc = Document::deserialize(&root).map_err(|e| PatchError::Shape(e.to_string()))?;
    if let Some(member) = dropped_member(&root, &doc.to_value()?) {
        return Err(PatchError::Shape(format!("unknown member {}", member)));
    }
    Ok(doc)
}

/// First member of `patched` with no counterpart in `normalized`, as a JSON
/// Pointer. Null members may be absent after normalization.
fn dropped_member(patched: &Value, normalized: &Value) -> Option<String> {
    match (patched, normalized) {
        (Value::Object(before), Value::Object(after)) => before.iter().find_map(|(key, value)| match after.get(key) {
            Some(kept) => dropped_member(value, kept).map(|rest| format!("/{}{}", pointer::escape(key), rest)),
            None if value.is_null() => None,
            None => Some(format!("/{}", pointer::escape(key))),
        }),
        (Value::Array(before), Value::Array(after)) => before
            .iter()
            .zip(after)
            .enumerate()
            .find_map(|(i, (value, kept))| dropped_member(value, kept).map(|rest| format!("/{}{}", i, rest))),
        _ => None,
    }
}

/// Live preview: the committed document with every still-pending item applied.
///
/// Accepted items are already part of `committed` and rejected items never
/// apply. If the pending set no longer applies cleanly the committed document
/// is shown unchanged.
pub fn compute_effective(committed: &Document, items: &[PatchItem]) -> Document {
    let pending: Vec<PatchOperation> = items
        .iter()
        .filter(|item| item.is_pending())
        .map(|item| item.operation.clone())
        .collect();

    if pending.is_empty() {
        return committed.clone();
    }

    match apply_batch(committed, &pending) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(error = %err, pending = pending.len(), "Pending patches no longer apply");
            committed.clone()
        }
    }
}

/// Apply a single operation to a JSON tree in place.
///
/// On error the tree may be partially modified; callers that need atomicity
/// work on a copy (see [`apply_batch`]).
pub fn apply_operation(root: &mut Value, op: &PatchOperation) -> Result<(), PatchError> {
    match op {
        PatchOperation::Add { path, value } => {
            let path = pointer::canonicalize(path, root)?;
            add(root, &path, value.clone())
        }
        PatchOperation::Remove { path } => {
            let path = pointer::canonicalize(path, root)?;
            remove(root, &path).map(|_| ())
        }
        PatchOperation::Replace { path, value } => {
            let path = pointer::canonicalize(path, root)?;
            let target = get_mut(root, &path)?;
            *target = value.clone();
            Ok(())
        }
        PatchOperation::Move { from, path } => {
            let from = pointer::canonicalize(from, root)?;
            let path = pointer::canonicalize(path, root)?;
            if from == path {
                get_mut(root, &from)?;
                return Ok(());
            }
            if path.starts_with(&format!("{}/", from)) {
                return Err(PatchError::MoveIntoChild { from, path });
            }
            let value = remove(root, &from)?;
            add(root, &path, value)
        }
        PatchOperation::Copy { from, path } => {
            let from = pointer::canonicalize(from, root)?;
            let path = pointer::canonicalize(path, root)?;
            let value = get_mut(root, &from)?.clone();
            add(root, &path, value)
        }
        PatchOperation::Test { path, value } => {
            let path = pointer::canonicalize(path, root)?;
            if *get_mut(root, &path)? == *value {
                Ok(())
            } else {
                Err(PatchError::TestFailed(path))
            }
        }
    }
}

fn get_mut<'a>(root: &'a mut Value, path: &str) -> Result<&'a mut Value, PatchError> {
    let tokens = pointer::parse(path)?;
    walk(root, &tokens, path)
}

fn walk<'a>(root: &'a mut Value, tokens: &[String], path: &str) -> Result<&'a mut Value, PatchError> {
    let mut current = root;
    for token in tokens {
        current = match current {
            Value::Object(map) => map
                .get_mut(token)
                .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?,
            Value::Array(items) => {
                let index = parse_index(token).ok_or_else(|| PatchError::InvalidIndex {
                    path: path.to_string(),
                    token: token.clone(),
                })?;
                let len = items.len();
                items.get_mut(index).ok_or(PatchError::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                    len,
                })?
            }
            _ => return Err(PatchError::PathNotFound(path.to_string())),
        };
    }
    Ok(current)
}

fn add(root: &mut Value, path: &str, value: Value) -> Result<(), PatchError> {
    let tokens = pointer::parse(path)?;
    let Some((last, parents)) = tokens.split_last() else {
        *root = value;
        return Ok(());
    };

    match walk(root, parents, path)? {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = if last == "-" {
                items.len()
            } else {
                parse_index(last).ok_or_else(|| PatchError::InvalidIndex {
                    path: path.to_string(),
                    token: last.clone(),
                })?
            };
            if index > items.len() {
                return Err(PatchError::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                    len: items.len(),
                });
            }
            items.insert(index, value);
            Ok(())
        }
        _ => Err(PatchError::NotAContainer(path.to_string())),
    }
}

fn remove(root: &mut Value, path: &str) -> Result<Value, PatchError> {
    let tokens = pointer::parse(path)?;
    let Some((last, parents)) = tokens.split_last() else {
        return Err(PatchError::PathNotFound(path.to_string()));
    };

    match walk(root, parents, path)? {
        Value::Object(map) => map
            .remove(last)
            .ok_or_else(|| PatchError::PathNotFound(path.to_string())),
        Value::Array(items) => {
            let index = parse_index(last).ok_or_else(|| PatchError::InvalidIndex {
                path: path.to_string(),
                token: last.clone(),
            })?;
            if index >= items.len() {
                return Err(PatchError::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                    len: items.len(),
                });
            }
            Ok(items.remove(index))
        }
        _ => Err(PatchError::NotAContainer(path.to_string())),
    }
}
