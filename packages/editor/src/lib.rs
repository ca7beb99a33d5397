//! # Formdraft Editor
//!
//! Reviewable, patch-based editing for multi-page form documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ proposal source: prompt → JSON Patch batch  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: review + commit                     │
//! │  - Validate against structural invariants   │
//! │  - Preview pending patches (copy-on-write)  │
//! │  - Merge snapshot/preview into a diff view  │
//! │  - Accept/reject per patch, entity or all   │
//! │  - Undo/redo over committed states          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ store: save/load committed documents        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Patches are the only mutation**: every change is a JSON Patch batch
//! 2. **All-or-nothing**: a batch applies completely or leaves the document as it was
//! 3. **Entities by id**: grouping and diffing follow page/block ids, not positions
//! 4. **One review at a time**: a new proposal waits until the current one settles
//!
//! ## Usage
//!
//! ```rust,ignore
//! use formdraft_editor::{EditSession, Proposal, PatchOperation};
//!
//! let mut session = EditSession::new(document);
//! session.open_review(Proposal::new(operations, "Add contact page"))?;
//!
//! for page in session.review_model() {
//!     // render page.review.status, block.review.field_patches ...
//! }
//!
//! session.accept_patches_by_block_id("email")?;
//! session.reject_all_patches()?;
//! session.undo()?;
//! ```
//!
//! The session never persists on its own. After a commit, either save
//! `session.document()` through a [`DocumentStore`] and call
//! `mark_saved()`, or (with the `autosave` feature) hand the session to
//! `Autosaver::schedule_commit`.

mod config;
mod document;
mod engine;
mod errors;
mod patch;
pub mod pointer;
mod proposal;
mod review;
mod session;
mod store;
mod target;
mod undo_stack;
mod validator;

#[cfg(feature = "autosave")]
mod autosave;

pub use config::{EditorConfig, DEFAULT_AUTOSAVE_DEBOUNCE};
pub use document::{
    Block, BlockKind, BlockType, BodyContent, ChoiceContent, Document, InputContent, Metadata, Page, PageKind,
    RatingContent, UnknownBlockType, Validation,
};
pub use engine::{apply_batch, apply_operation, compute_effective};
pub use errors::{EditorError, SessionError};
pub use patch::{ChangeType, PatchError, PatchId, PatchItem, PatchOperation, PatchStatus};
pub use pointer::PointerError;
pub use proposal::{Proposal, ProposalError, ProposalSource, StaticProposalSource};
pub use review::{build_review_model, metadata_patches, MergedBlock, MergedPage, ReviewMetadata, ReviewStatus};
pub use session::{EditSession, Resolution};
pub use store::{DocumentStore, DocumentSummary, FileStore, MemoryStore, StoreError, SyncState};
pub use target::{resolve_target, EntityKind, Target, TargetField, METADATA_ENTITY};
pub use undo_stack::{HistoryEntry, UndoStack, DEFAULT_HISTORY_LIMIT};
pub use validator::{filter, validate, Rejection, RejectionReason, ValidationReport};

#[cfg(feature = "autosave")]
pub use autosave::Autosaver;
