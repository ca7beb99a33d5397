//! # Edit Session
//!
//! Owns the committed document, at most one open review and the undo
//! history. Callers hold the session explicitly; nothing here is global.
//!
//! ## Review lifecycle
//!
//! ```text
//! open_review(proposal)
//!     │  validate → snapshot committed doc → wrap ops as pending PatchItems
//!     ▼
//! accept / reject  (single, by page, by block, all)
//!     │  accepted ops fold into the committed doc, in original batch order
//!     ▼
//! last item settles → review closes → one history entry for the whole review
//! ```
//!
//! Each item moves `pending → accepted` or `pending → rejected` exactly once.
//! A selection that fails to apply changes nothing: statuses stay pending and
//! the committed document is untouched.

use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::document::Document;
use crate::engine;
use crate::errors::{EditorError, SessionError};
use crate::patch::{PatchId, PatchItem, PatchOperation, PatchStatus};
use crate::pointer;
use crate::proposal::{Proposal, ProposalSource};
use crate::review::{build_review_model, MergedPage};
use crate::target::{resolve_target, EntityKind, Target, TargetField};
use crate::undo_stack::UndoStack;
use crate::validator::{self, ValidationReport};

/// Accept or reject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Accept,
    Reject,
}

impl Resolution {
    fn status(self) -> PatchStatus {
        match self {
            Resolution::Accept => PatchStatus::Accepted,
            Resolution::Reject => PatchStatus::Rejected,
        }
    }
}

/// An open proposal batch
#[derive(Debug, Clone)]
struct Review {
    /// Committed document before the proposal arrived
    origin: Document,

    items: Vec<PatchItem>,

    summary: String,
}

/// Single-editor session over one document
#[derive(Debug)]
pub struct EditSession {
    /// Committed document
    document: Document,

    review: Option<Review>,

    history: UndoStack,

    /// Committed document changed since the last successful save
    dirty: bool,

    /// Review counter, used to mint patch ids
    reviews_opened: u64,
}

impl EditSession {
    pub fn new(document: Document) -> Self {
        Self::with_config(document, &EditorConfig::default())
    }

    pub fn with_config(document: Document, config: &EditorConfig) -> Self {
        Self {
            document,
            review: None,
            history: UndoStack::with_max_levels(config.history_limit),
            dirty: false,
            reviews_opened: 0,
        }
    }

    /// Committed document
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn is_reviewing(&self) -> bool {
        self.review.is_some()
    }

    /// Baseline the open review is diffed against
    pub fn snapshot(&self) -> Option<&Document> {
        self.review.as_ref().map(|_| &self.document)
    }

    /// All items of the open review, resolved ones included
    pub fn patches(&self) -> &[PatchItem] {
        self.review.as_ref().map(|r| r.items.as_slice()).unwrap_or(&[])
    }

    pub fn pending(&self) -> Vec<&PatchItem> {
        self.patches().iter().filter(|item| item.is_pending()).collect()
    }

    pub fn patch(&self, id: &PatchId) -> Option<&PatchItem> {
        self.patches().iter().find(|item| &item.id == id)
    }

    pub fn summary(&self) -> Option<&str> {
        self.review.as_ref().map(|r| r.summary.as_str())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Live preview: committed document plus every pending operation
    pub fn effective(&self) -> Document {
        match &self.review {
            Some(review) => engine::compute_effective(&self.document, &review.items),
            None => self.document.clone(),
        }
    }

    /// Merged snapshot/effective view for rendering
    pub fn review_model(&self) -> Vec<MergedPage> {
        build_review_model(&self.document, &self.effective(), self.patches())
    }

    /// Ask `source` for edits and open a review over them
    pub fn request_proposal(
        &mut self,
        source: &dyn ProposalSource,
        prompt: &str,
    ) -> Result<ValidationReport, EditorError> {
        if self.is_reviewing() {
            return Err(SessionError::ReviewInProgress.into());
        }
        let proposal = source.propose(prompt, &self.document)?;
        Ok(self.open_review(proposal)?)
    }

    /// Validate a proposal and open a review over the surviving operations.
    ///
    /// A batch that is empty after validation opens nothing. A batch that
    /// does not apply as a whole is refused.
    pub fn open_review(&mut self, proposal: Proposal) -> Result<ValidationReport, SessionError> {
        if self.review.is_some() {
            return Err(SessionError::ReviewInProgress);
        }

        let report = validator::validate(proposal.operations, &self.document);
        if report.accepted.is_empty() {
            info!(rejected = report.rejected.len(), "Proposal has no applicable operations");
            return Ok(report);
        }

        if let Err(err) = engine::apply_batch(&self.document, &report.accepted) {
            warn!(error = %err, "Proposal does not apply, discarding batch");
            return Err(err.into());
        }

        self.reviews_opened += 1;
        let targets = replay_targets(&self.document, &report.accepted);
        let items = report
            .accepted
            .iter()
            .cloned()
            .zip(targets)
            .enumerate()
            .map(|(i, (op, target))| {
                PatchItem::new(PatchId(format!("patch-{}-{}", self.reviews_opened, i)), op, target)
            })
            .collect::<Vec<_>>();

        info!(
            patches = items.len(),
            rejected = report.rejected.len(),
            "Review opened"
        );
        self.review = Some(Review {
            origin: self.document.clone(),
            items,
            summary: proposal.summary,
        });

        Ok(report)
    }

    pub fn accept_patch(&mut self, id: &PatchId) -> Result<(), SessionError> {
        let index = self.pending_index(id)?;
        self.settle(&[index], &[index], Resolution::Accept)
    }

    pub fn reject_patch(&mut self, id: &PatchId) -> Result<(), SessionError> {
        let index = self.pending_index(id)?;
        self.settle(&[index], &[], Resolution::Reject)
    }

    /// Resolve a whole-page item together with every pending item nested
    /// under that page.
    ///
    /// Accepting a page removal applies only the removal; the nested items
    /// are settled with it.
    pub fn resolve_page_patch(&mut self, id: &PatchId, resolution: Resolution) -> Result<(), SessionError> {
        let index = self.pending_index(id)?;
        let items = self.patches();
        let item = &items[index];
        if item.target.kind != EntityKind::Page || item.target.field != TargetField::Page {
            return Err(SessionError::NotPageLevel(id.clone()));
        }

        let prefixes = page_prefixes(item, &self.document, &self.effective());
        let mut selected = vec![index];
        selected.extend(items.iter().enumerate().filter_map(|(i, other)| {
            let nested = i != index
                && other.is_pending()
                && prefixes
                    .iter()
                    .any(|prefix| other.operation.path().starts_with(prefix.as_str()));
            nested.then_some(i)
        }));
        selected.sort_unstable();

        let apply = match (resolution, &item.operation) {
            (Resolution::Reject, _) => Vec::new(),
            (Resolution::Accept, PatchOperation::Remove { .. }) => vec![index],
            (Resolution::Accept, _) => selected.clone(),
        };

        debug!(patch = %id, nested = selected.len() - 1, "Resolving page patch");
        self.settle(&selected, &apply, resolution)
    }

    /// Accept every pending item targeting `block_id`. Returns how many settled.
    pub fn accept_patches_by_block_id(&mut self, block_id: &str) -> Result<usize, SessionError> {
        self.resolve_block(block_id, Resolution::Accept)
    }

    pub fn reject_patches_by_block_id(&mut self, block_id: &str) -> Result<usize, SessionError> {
        self.resolve_block(block_id, Resolution::Reject)
    }

    fn resolve_block(&mut self, block_id: &str, resolution: Resolution) -> Result<usize, SessionError> {
        let selected: Vec<usize> = self
            .review()?
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                item.is_pending() && item.target.kind == EntityKind::Block && item.entity() == Some(block_id)
            })
            .map(|(i, _)| i)
            .collect();
        if selected.is_empty() {
            return Ok(0);
        }

        let apply = match resolution {
            Resolution::Accept => selected.clone(),
            Resolution::Reject => Vec::new(),
        };
        self.settle(&selected, &apply, resolution)?;
        Ok(selected.len())
    }

    /// Accept everything still pending and close the review
    pub fn accept_all_patches(&mut self) -> Result<usize, SessionError> {
        self.resolve_all(Resolution::Accept)
    }

    /// Discard everything still pending and close the review. Never fails
    /// on an open review.
    pub fn reject_all_patches(&mut self) -> Result<usize, SessionError> {
        self.resolve_all(Resolution::Reject)
    }

    fn resolve_all(&mut self, resolution: Resolution) -> Result<usize, SessionError> {
        let selected: Vec<usize> = self
            .review()?
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_pending())
            .map(|(i, _)| i)
            .collect();
        let apply = match resolution {
            Resolution::Accept => selected.clone(),
            Resolution::Reject => Vec::new(),
        };
        self.settle(&selected, &apply, resolution)?;
        Ok(selected.len())
    }

    /// Apply a direct (non-review) edit. Validated, all-or-nothing, and
    /// recorded in history immediately.
    pub fn apply_direct(
        &mut self,
        operations: Vec<PatchOperation>,
        description: Option<String>,
    ) -> Result<ValidationReport, SessionError> {
        if self.review.is_some() {
            return Err(SessionError::ReviewInProgress);
        }

        let report = validator::validate(operations, &self.document);
        if report.accepted.is_empty() {
            return Ok(report);
        }

        let mut next = engine::apply_batch(&self.document, &report.accepted)?;
        next.touch();
        let prior = std::mem::replace(&mut self.document, next);
        self.history.record(prior, description);
        self.dirty = true;

        debug!(operations = report.accepted.len(), "Applied direct edit");
        Ok(report)
    }

    pub fn undo(&mut self) -> Result<bool, SessionError> {
        if self.review.is_some() {
            return Err(SessionError::ReviewInProgress);
        }
        let undone = self.history.undo(&mut self.document);
        self.dirty |= undone;
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool, SessionError> {
        if self.review.is_some() {
            return Err(SessionError::ReviewInProgress);
        }
        let redone = self.history.redo(&mut self.document);
        self.dirty |= redone;
        Ok(redone)
    }

    fn review(&self) -> Result<&Review, SessionError> {
        self.review.as_ref().ok_or(SessionError::NoReview)
    }

    fn pending_index(&self, id: &PatchId) -> Result<usize, SessionError> {
        let review = self.review()?;
        let index = review
            .items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| SessionError::UnknownPatch(id.clone()))?;
        if review.items[index].status.is_terminal() {
            return Err(SessionError::AlreadyResolved(id.clone()));
        }
        Ok(index)
    }

    /// Settle `selected` items, folding the `apply` subset into the committed
    /// document in batch order. Both slices are ascending.
    fn settle(&mut self, selected: &[usize], apply: &[usize], resolution: Resolution) -> Result<(), SessionError> {
        let review = self.review.as_mut().ok_or(SessionError::NoReview)?;

        if !apply.is_empty() {
            let mut next = replay_checked(&self.document, &review.items, apply)?;
            next.touch();
            self.document = next;
            self.dirty = true;
        }

        let status = resolution.status();
        for &i in selected {
            review.items[i].status = status;
        }
        debug!(settled = selected.len(), applied = apply.len(), ?status, "Settled patches");

        if review.items.iter().all(|item| item.status.is_terminal()) {
            self.close_review();
        }
        Ok(())
    }

    fn close_review(&mut self) {
        let Some(review) = self.review.take() else {
            return;
        };
        let accepted = review
            .items
            .iter()
            .filter(|item| item.status == PatchStatus::Accepted)
            .count();

        if accepted > 0 {
            let description = (!review.summary.is_empty()).then(|| review.summary.clone());
            self.history.record(review.origin, description);
        }
        info!(
            accepted,
            rejected = review.items.len() - accepted,
            "Review closed"
        );
    }
}

/// Resolve each operation against the document the ops before it produce.
/// Once replay fails, the rest resolve against `doc`.
fn replay_targets(doc: &Document, operations: &[PatchOperation]) -> Vec<Target> {
    let mut working = Some(doc.clone());
    operations
        .iter()
        .enumerate()
        .map(|(i, op)| {
            let target = resolve_target(op, working.as_ref().unwrap_or(doc), i);
            working = working
                .take()
                .and_then(|w| engine::apply_batch(&w, std::slice::from_ref(op)).ok());
            target
        })
        .collect()
}

/// Apply the `apply` items to `committed` one at a time, in batch order.
///
/// Each operation must still hit the entity it was reviewed against. Paths
/// are positional, so a pending or rejected operation earlier in the batch
/// can leave a later path pointing at a different page or block.
fn replay_checked(committed: &Document, items: &[PatchItem], apply: &[usize]) -> Result<Document, SessionError> {
    let mut working = committed.clone();
    for &i in apply {
        let item = &items[i];
        let found = resolve_target(&item.operation, &working, i);
        working = engine::apply_batch(&working, std::slice::from_ref(&item.operation))?;

        if found.entity != item.target.entity {
            warn!(
                patch = %item.id,
                expected = ?item.target.entity,
                found = ?found.entity,
                "Patch no longer targets its reviewed entity"
            );
            return Err(SessionError::TargetMoved {
                id: item.id.clone(),
                expected: item.target.entity.clone(),
                found: found.entity,
            });
        }
    }
    Ok(working)
}

/// Path prefixes under which an operation counts as nested in a page item
fn page_prefixes(item: &PatchItem, committed: &Document, effective: &Document) -> Vec<String> {
    let mut prefixes = Vec::new();
    let path = item.operation.path();
    if !path.ends_with("/-") {
        prefixes.push(format!("{}/", path));
    }
    if let Some(page_id) = item.entity() {
        prefixes.push(format!("/pages/{}/", pointer::escape(page_id)));
        let reference = match item.operation {
            PatchOperation::Remove { .. } => committed,
            _ => effective,
        };
        if let Some(index) = reference.page_index(page_id) {
            prefixes.push(format!("/pages/{}/", index));
        }
    }
    prefixes.sort();
    prefixes.dedup();
    prefixes
}
