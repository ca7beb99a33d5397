//! # Undo/Redo Stack
//!
//! Linear history over committed document states.
//!
//! ## Design
//!
//! - Every commit pushes the state it replaced onto the undo stack
//! - Undo swaps the top of the undo stack in and moves the replaced state to redo
//! - Redo is the mirror operation
//! - A new commit clears the redo stack
//! - The undo stack is bounded; the oldest entry is dropped on overflow
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = UndoStack::new();
//! let before = doc.clone();
//! doc = apply_batch(&doc, &ops)?;
//! stack.record(before, Some("Rename form".to_string()));
//!
//! stack.undo(&mut doc); // doc is `before` again
//! stack.redo(&mut doc);
//! ```

use std::collections::VecDeque;

use crate::document::Document;

/// Default number of undo levels
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// A document state that can be returned to
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub document: Document,

    /// Optional description of the change that replaced this state
    pub description: Option<String>,
}

/// Undo/redo stack for document editing
#[derive(Debug)]
pub struct UndoStack {
    /// Prior states (most recent last)
    undo_stack: VecDeque<HistoryEntry>,

    /// Undone states (most recent last)
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels, within `1..=DEFAULT_HISTORY_LIMIT`
    max_levels: usize,
}

impl UndoStack {
    /// Create a new undo stack with the default limit (50)
    pub fn new() -> Self {
        Self::with_max_levels(DEFAULT_HISTORY_LIMIT)
    }

    /// Create an undo stack with custom max levels, clamped to
    /// `1..=DEFAULT_HISTORY_LIMIT`
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_levels: max_levels.clamp(1, DEFAULT_HISTORY_LIMIT),
        }
    }

    /// Record the state a commit is about to replace
    pub fn record(&mut self, prior: Document, description: Option<String>) {
        self.undo_stack.push_back(HistoryEntry {
            document: prior,
            description,
        });

        if self.undo_stack.len() > self.max_levels {
            self.undo_stack.pop_front();
        }

        // New action invalidates future
        self.redo_stack.clear();
    }

    /// Restore the most recent prior state into `current`
    pub fn undo(&mut self, current: &mut Document) -> bool {
        let Some(entry) = self.undo_stack.pop_back() else {
            return false;
        };
        let replaced = std::mem::replace(current, entry.document);
        self.redo_stack.push(HistoryEntry {
            document: replaced,
            description: entry.description,
        });
        true
    }

    /// Reapply the most recently undone state into `current`
    pub fn redo(&mut self, current: &mut Document) -> bool {
        let Some(entry) = self.redo_stack.pop() else {
            return false;
        };
        let replaced = std::mem::replace(current, entry.document);
        self.undo_stack.push_back(HistoryEntry {
            document: replaced,
            description: entry.description,
        });
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Description of the change the next undo reverts
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .back()
            .and_then(|entry| entry.description.as_deref())
    }

    /// Description of the change the next redo reapplies
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};

    fn titled(title: &str) -> Document {
        let mut doc = Document::new("form", title);
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        doc.metadata.created_at = epoch;
        doc.metadata.updated_at = epoch;
        doc
    }

    #[test]
    fn test_undo_stack_creation() {
        let stack = UndoStack::new();
        assert_eq!(stack.undo_levels(), 0);
        assert_eq!(stack.redo_levels(), 0);
        assert_eq!(stack.max_levels(), 50);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_undo_restores_prior_state() {
        let mut stack = UndoStack::new();
        let v0 = titled("v0");
        let mut current = titled("v1");
        stack.record(v0.clone(), Some("Rename".to_string()));

        assert_eq!(stack.undo_description(), Some("Rename"));
        assert!(stack.undo(&mut current));
        assert_eq!(current, v0);
        assert_eq!(stack.redo_levels(), 1);
        assert_eq!(stack.redo_description(), Some("Rename"));

        assert!(stack.redo(&mut current));
        assert_eq!(current, titled("v1"));
        assert_eq!(stack.undo_levels(), 1);
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_empty_undo_is_noop() {
        let mut stack = UndoStack::new();
        let mut current = titled("v0");
        assert!(!stack.undo(&mut current));
        assert!(!stack.redo(&mut current));
        assert_eq!(current, titled("v0"));
    }

    #[test]
    fn test_new_commit_clears_redo() {
        let mut stack = UndoStack::new();
        let mut current = titled("v1");
        stack.record(titled("v0"), None);
        stack.undo(&mut current);
        assert_eq!(stack.redo_levels(), 1);

        stack.record(current.clone(), None);
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut stack = UndoStack::with_max_levels(2);
        for i in 0..3 {
            stack.record(titled(&format!("v{}", i)), None);
        }
        assert_eq!(stack.undo_levels(), 2);

        let mut current = titled("v3");
        stack.undo(&mut current);
        stack.undo(&mut current);
        // v0 was dropped
        assert_eq!(current.metadata.title, "v1");
        assert!(!stack.can_undo());
    }

    #[test]
    fn test_default_limit_is_fifty() {
        let mut stack = UndoStack::new();
        for i in 0..60 {
            stack.record(titled(&format!("v{}", i)), None);
        }
        assert_eq!(stack.undo_levels(), DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_max_levels_clamped() {
        assert_eq!(UndoStack::with_max_levels(0).max_levels(), 1);
        assert_eq!(UndoStack::with_max_levels(500).max_levels(), DEFAULT_HISTORY_LIMIT);

        let mut stack = UndoStack::with_max_levels(0);
        for i in 0..3 {
            stack.record(titled(&format!("v{}", i)), None);
        }
        assert_eq!(stack.undo_levels(), 1);
    }
}
