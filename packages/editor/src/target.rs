//! # Target Resolution
//!
//! Maps a raw operation path to the entity it affects and the part of that
//! entity it touches. Grouped accept/reject and field-level diff badges are
//! both keyed on this.
//!
//! | Path                                        | Entity            | Field           |
//! |---------------------------------------------|-------------------|-----------------|
//! | `/metadata/title`, `/metadata/description`  | document metadata | `form-title`, `form-description` |
//! | `/pages/p/blocks/b` (add)                   | new block id      | `block`         |
//! | `/pages/p/blocks/b` (other ops)             | block at `b`      | `block`         |
//! | `/pages/p/blocks/b/content/label`           | block at `b`      | `label`         |
//! | `/pages/p/blocks/b/content/options/o`       | block at `b`      | `options/o`     |
//! | `/pages/p/blocks/b/content/k`               | block at `b`      | `k`             |
//! | `/pages/p/blocks/b/type`                    | block at `b`      | `type`          |
//! | `/pages/p/blocks/b/k` (other members)       | block at `b`      | `k`             |
//! | `/pages/p`                                  | page id           | `page`          |
//! | `/pages/p/k` (page members)                 | page id           | `k`             |
//! | anything else                               | none              | `unknown`       |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::document::Document;
use crate::patch::PatchOperation;
use crate::pointer::{self, BlockField, BlockRef, PageRest, PathTarget};

/// Entity id used for document-level metadata edits
pub const METADATA_ENTITY: &str = "document-metadata";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Metadata,
    Page,
    Block,
    Unknown,
}

/// Which part of an entity an operation touches
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum TargetField {
    FormTitle,
    FormDescription,
    /// Whole-page add/remove/replace
    Page,
    /// Whole-block add/remove/replace
    Block,
    Label,
    /// `options/<token>`, or `options` for the whole list
    Option(Option<String>),
    Type,
    /// Any other content key or member name
    Named(String),
    Unknown,
}

impl TargetField {
    pub fn key(&self) -> String {
        match self {
            TargetField::FormTitle => "form-title".to_string(),
            TargetField::FormDescription => "form-description".to_string(),
            TargetField::Page => "page".to_string(),
            TargetField::Block => "block".to_string(),
            TargetField::Label => "label".to_string(),
            TargetField::Option(Some(token)) => format!("options/{}", token),
            TargetField::Option(None) => "options".to_string(),
            TargetField::Type => "type".to_string(),
            TargetField::Named(name) => name.clone(),
            TargetField::Unknown => "unknown".to_string(),
        }
    }

    /// Whole-entity (as opposed to field-level) target
    pub fn is_whole(&self) -> bool {
        matches!(self, TargetField::Page | TargetField::Block)
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl From<TargetField> for String {
    fn from(field: TargetField) -> Self {
        field.key()
    }
}

impl From<String> for TargetField {
    fn from(key: String) -> Self {
        match key.as_str() {
            "form-title" => TargetField::FormTitle,
            "form-description" => TargetField::FormDescription,
            "page" => TargetField::Page,
            "block" => TargetField::Block,
            "label" => TargetField::Label,
            "options" => TargetField::Option(None),
            "type" => TargetField::Type,
            "unknown" => TargetField::Unknown,
            _ => match key.strip_prefix("options/") {
                Some(token) => TargetField::Option(Some(token.to_string())),
                None => TargetField::Named(key),
            },
        }
    }
}

/// Semantic target of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub kind: EntityKind,
    pub entity: Option<String>,
    pub field: TargetField,
}

impl Target {
    pub fn unknown() -> Self {
        Self {
            kind: EntityKind::Unknown,
            entity: None,
            field: TargetField::Unknown,
        }
    }

    fn metadata(field: TargetField) -> Self {
        Self {
            kind: EntityKind::Metadata,
            entity: Some(METADATA_ENTITY.to_string()),
            field,
        }
    }

    fn page(entity: Option<String>, field: TargetField) -> Self {
        Self {
            kind: EntityKind::Page,
            entity,
            field,
        }
    }

    fn block(entity: Option<String>, field: TargetField) -> Self {
        Self {
            kind: EntityKind::Block,
            entity,
            field,
        }
    }
}

/// Resolve the target of `op` against `doc`.
///
/// `index` is the operation's position in its batch; it seeds the synthesized
/// id of a new entity whose value carries no id.
pub fn resolve_target(op: &PatchOperation, doc: &Document, index: usize) -> Target {
    match pointer::classify(op.path()) {
        PathTarget::Metadata(field) => match field.as_str() {
            "title" => Target::metadata(TargetField::FormTitle),
            "description" => Target::metadata(TargetField::FormDescription),
            _ => Target::unknown(),
        },
        PathTarget::Page { page, rest } => {
            let existing = page.resolve(doc).map(|i| &doc.pages[i]);
            match rest {
                PageRest::Whole => {
                    let entity = match op {
                        PatchOperation::Add { value, .. } => {
                            Some(value_id(value).unwrap_or_else(|| format!("new-page-{}", index)))
                        }
                        PatchOperation::Move { from, .. } => moved_page_id(from, doc),
                        _ => existing.map(|p| p.id.clone()),
                    };
                    Target::page(entity, TargetField::Page)
                }
                PageRest::Member(member) => {
                    Target::page(existing.map(|p| p.id.clone()), TargetField::Named(member))
                }
                PageRest::Block { block, field } => {
                    let at_index = match (existing, block) {
                        (Some(page), BlockRef::Index(i)) => page.blocks.get(i).map(|b| b.id.clone()),
                        _ => None,
                    };
                    match field {
                        BlockField::Whole => {
                            let entity = match op {
                                PatchOperation::Add { value, .. } => Some(
                                    value_id(value).unwrap_or_else(|| format!("new-block-{}", index)),
                                ),
                                PatchOperation::Move { from, .. } => moved_block_id(from, doc),
                                _ => at_index,
                            };
                            Target::block(entity, TargetField::Block)
                        }
                        BlockField::Label => Target::block(at_index, TargetField::Label),
                        BlockField::Options(token) => Target::block(at_index, TargetField::Option(token)),
                        BlockField::Type => Target::block(at_index, TargetField::Type),
                        BlockField::Content(key) | BlockField::Member(key) => {
                            Target::block(at_index, TargetField::Named(key))
                        }
                    }
                }
            }
        }
        PathTarget::Other => Target::unknown(),
    }
}

fn value_id(value: &Value) -> Option<String> {
    value.get("id").and_then(Value::as_str).map(str::to_string)
}

fn moved_page_id(from: &str, doc: &Document) -> Option<String> {
    match pointer::classify(from) {
        PathTarget::Page {
            page,
            rest: PageRest::Whole,
        } => page.resolve(doc).map(|i| doc.pages[i].id.clone()),
        _ => None,
    }
}

fn moved_block_id(from: &str, doc: &Document) -> Option<String> {
    match pointer::classify(from) {
        PathTarget::Page {
            page,
            rest:
                PageRest::Block {
                    block: BlockRef::Index(b),
                    field: BlockField::Whole,
                },
        } => {
            let page = &doc.pages[page.resolve(doc)?];
            page.blocks.get(b).map(|block| block.id.clone())
        }
        _ => None,
    }
}
