//! # Review Model
//!
//! Overlays the pre-proposal snapshot and the effective (proposed) document
//! into one sequence of pages and blocks, each annotated with how it changed:
//!
//! ```text
//! snapshot:   [A, B]          pending: add C @0, remove B
//! effective:  [C, A]
//! merged:     [C+ , B- , A=]
//! ```
//!
//! Removed entities are reinserted at their snapshot position (clamped to
//! the merged length) so they stay visible and can be rejected. An added
//! page never shows removed blocks. The result is rebuilt from scratch on
//! every render and never persisted.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::document::{Block, Document, Page, PageKind};
use crate::patch::{ChangeType, PatchId, PatchItem};
use crate::target::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Added,
    Removed,
    Modified,
    Kept,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMetadata {
    pub status: ReviewStatus,

    /// Patch causing a whole-entity add or remove
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_id: Option<PatchId>,

    /// Field key (`label`, `options/1`, ...) to the pending patch touching it
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub field_patches: BTreeMap<String, PatchId>,
}

impl ReviewMetadata {
    fn new(status: ReviewStatus, patch_id: Option<PatchId>) -> Self {
        Self {
            status,
            patch_id,
            field_patches: BTreeMap::new(),
        }
    }

    fn kept_or_modified(field_patches: BTreeMap<String, PatchId>, modified: bool) -> Self {
        let status = if modified || !field_patches.is_empty() {
            ReviewStatus::Modified
        } else {
            ReviewStatus::Kept
        };
        Self {
            status,
            patch_id: None,
            field_patches,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedBlock {
    #[serde(flatten)]
    pub block: Block,

    pub review: ReviewMetadata,
}

impl MergedBlock {
    pub fn id(&self) -> &str {
        &self.block.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedPage {
    pub id: String,
    pub kind: PageKind,
    pub title: Option<String>,
    pub description: Option<String>,
    pub removable: bool,
    pub blocks: Vec<MergedBlock>,
    pub review: ReviewMetadata,
}

impl MergedPage {
    fn from_page(page: &Page, blocks: Vec<MergedBlock>, review: ReviewMetadata) -> Self {
        Self {
            id: page.id.clone(),
            kind: page.kind,
            title: page.title.clone(),
            description: page.description.clone(),
            removable: page.removable,
            blocks,
            review,
        }
    }

    pub fn block(&self, id: &str) -> Option<&MergedBlock> {
        self.blocks.iter().find(|b| b.id() == id)
    }
}

/// Build the merged review view
pub fn build_review_model(snapshot: &Document, effective: &Document, items: &[PatchItem]) -> Vec<MergedPage> {
    let pending: Vec<&PatchItem> = items.iter().filter(|item| item.is_pending()).collect();

    let mut merged: Vec<MergedPage> = effective
        .pages
        .iter()
        .map(|page| match snapshot.page(&page.id) {
            None => {
                let patch_id = whole_patch(&pending, EntityKind::Page, &page.id, ChangeType::Add);
                let blocks = merge_blocks(None, page, &pending);
                MergedPage::from_page(page, blocks, ReviewMetadata::new(ReviewStatus::Added, patch_id))
            }
            Some(before) => {
                let fields = field_patches(&pending, EntityKind::Page, &page.id);
                let review = ReviewMetadata::kept_or_modified(fields, before.title != page.title);
                MergedPage::from_page(page, merge_blocks(Some(before), page, &pending), review)
            }
        })
        .collect();

    for (index, page) in snapshot.pages.iter().enumerate() {
        if effective.page(&page.id).is_some() {
            continue;
        }
        let patch_id = whole_patch(&pending, EntityKind::Page, &page.id, ChangeType::Remove);
        let blocks = page
            .blocks
            .iter()
            .map(|block| MergedBlock {
                block: block.clone(),
                review: ReviewMetadata::new(ReviewStatus::Removed, None),
            })
            .collect();
        let removed = MergedPage::from_page(page, blocks, ReviewMetadata::new(ReviewStatus::Removed, patch_id));
        merged.insert(index.min(merged.len()), removed);
    }

    merged.sort_by_key(|page| page.kind.rank());
    merged
}

fn merge_blocks(before: Option<&Page>, page: &Page, pending: &[&PatchItem]) -> Vec<MergedBlock> {
    let mut merged: Vec<MergedBlock> = page
        .blocks
        .iter()
        .map(|block| {
            let review = match before.and_then(|p| p.block(&block.id)) {
                None => {
                    let patch_id = whole_patch(pending, EntityKind::Block, &block.id, ChangeType::Add);
                    ReviewMetadata::new(ReviewStatus::Added, patch_id)
                }
                Some(_) => {
                    ReviewMetadata::kept_or_modified(field_patches(pending, EntityKind::Block, &block.id), false)
                }
            };
            MergedBlock {
                block: block.clone(),
                review,
            }
        })
        .collect();

    // added pages have nothing to remove
    let Some(before) = before else {
        return merged;
    };

    for (index, block) in before.blocks.iter().enumerate() {
        if page.block(&block.id).is_some() {
            continue;
        }
        let patch_id = whole_patch(pending, EntityKind::Block, &block.id, ChangeType::Remove);
        let removed = MergedBlock {
            block: block.clone(),
            review: ReviewMetadata::new(ReviewStatus::Removed, patch_id),
        };
        merged.insert(index.min(merged.len()), removed);
    }

    merged
}

/// Pending whole-entity patch for `entity`, preferring the given change type
fn whole_patch(pending: &[&PatchItem], kind: EntityKind, entity: &str, change: ChangeType) -> Option<PatchId> {
    let candidates: Vec<&&PatchItem> = pending
        .iter()
        .filter(|item| item.target.kind == kind && item.target.field.is_whole() && item.entity() == Some(entity))
        .collect();

    candidates
        .iter()
        .find(|item| item.change_type == change)
        .or_else(|| candidates.first())
        .map(|item| item.id.clone())
}

/// Field-level pending patches for `entity`, plus whole-entity replacements
fn field_patches(pending: &[&PatchItem], kind: EntityKind, entity: &str) -> BTreeMap<String, PatchId> {
    pending
        .iter()
        .filter(|item| item.target.kind == kind && item.entity() == Some(entity))
        .filter(|item| !item.target.field.is_whole() || item.change_type == ChangeType::Replace)
        .map(|item| (item.target.field.key(), item.id.clone()))
        .collect()
}

/// Pending patches on document metadata, keyed by field
pub fn metadata_patches(items: &[PatchItem]) -> BTreeMap<String, PatchId> {
    items
        .iter()
        .filter(|item| item.is_pending() && item.target.kind == EntityKind::Metadata)
        .map(|item| (item.target.field.key(), item.id.clone()))
        .collect()
}
