//! # Form Document
//!
//! The edited entity: a versioned form definition made of ordered pages,
//! each holding ordered blocks.
//!
//! ```text
//! Document
//!  ├─ metadata (title, description, timestamps)
//!  ├─ theme    (style token map)
//!  └─ pages[]
//!      └─ blocks[]  { id, type, content, validation?, removable }
//! ```
//!
//! Page and block ids are stable for the entity's lifetime; array position is
//! not. JSON Patch paths address by position, so anything that needs to
//! follow an entity across edits goes through the id.
//!
//! Block content is a tagged union keyed by `type`. On the wire the pair
//! serializes as `"type": "choice", "content": { ... }`, which keeps the
//! document addressable by plain JSON Patch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::patch::PatchError;

/// Root of an editable form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Stable document identifier (used as the persistence key)
    pub id: String,

    /// Increments on every committed change
    #[serde(default)]
    pub version: u64,

    pub metadata: Metadata,

    /// Style tokens (colors, fonts, radii)
    #[serde(default)]
    pub theme: BTreeMap<String, String>,

    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Metadata {
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Role of a page within the form flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Start,
    #[default]
    Default,
    Ending,
}

impl PageKind {
    /// Display rank: start pages first, ending pages last
    pub fn rank(self) -> u8 {
        match self {
            PageKind::Start => 0,
            PageKind::Default => 1,
            PageKind::Ending => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Page {
    pub id: String,

    #[serde(default)]
    pub kind: PageKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_removable")]
    pub removable: bool,

    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,

    /// `type` + `content` pair
    #[serde(flatten)]
    pub kind: BlockKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,

    #[serde(default = "default_removable")]
    pub removable: bool,
}

fn default_removable() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Validation {
    #[serde(default)]
    pub required: bool,
}

/// Block content, tagged by block type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum BlockKind {
    Text(InputContent),
    Textarea(InputContent),
    Choice(ChoiceContent),
    Rating(RatingContent),
    Date(InputContent),
    File(InputContent),
    Info(BodyContent),
    Statement(BodyContent),
}

/// Free-form input fields (text, textarea, date, file)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InputContent {
    #[serde(default)]
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChoiceContent {
    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub options: Vec<String>,

    #[serde(default)]
    pub multi_select: bool,

    #[serde(default)]
    pub allow_other: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RatingContent {
    #[serde(default)]
    pub label: String,

    #[serde(default = "default_max_rating")]
    pub max_rating: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

fn default_max_rating() -> u8 {
    5
}

impl Default for RatingContent {
    fn default() -> Self {
        Self {
            label: String::new(),
            max_rating: default_max_rating(),
            help_text: None,
        }
    }
}

/// Display-only blocks (info, statement)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BodyContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default)]
    pub body: String,
}

/// The closed block type vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Text,
    Textarea,
    Choice,
    Rating,
    Date,
    File,
    Info,
    Statement,
}

impl BlockType {
    pub const ALL: [BlockType; 8] = [
        BlockType::Text,
        BlockType::Textarea,
        BlockType::Choice,
        BlockType::Rating,
        BlockType::Date,
        BlockType::File,
        BlockType::Info,
        BlockType::Statement,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Textarea => "textarea",
            BlockType::Choice => "choice",
            BlockType::Rating => "rating",
            BlockType::Date => "date",
            BlockType::File => "file",
            BlockType::Info => "info",
            BlockType::Statement => "statement",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown block type: {0}")]
pub struct UnknownBlockType(pub String);

impl FromStr for BlockType {
    type Err = UnknownBlockType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownBlockType(s.to_string()))
    }
}

impl BlockKind {
    pub fn block_type(&self) -> BlockType {
        match self {
            BlockKind::Text(_) => BlockType::Text,
            BlockKind::Textarea(_) => BlockType::Textarea,
            BlockKind::Choice(_) => BlockType::Choice,
            BlockKind::Rating(_) => BlockType::Rating,
            BlockKind::Date(_) => BlockType::Date,
            BlockKind::File(_) => BlockType::File,
            BlockKind::Info(_) => BlockType::Info,
            BlockKind::Statement(_) => BlockType::Statement,
        }
    }

    /// Empty content for a given type
    pub fn empty(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Text => BlockKind::Text(InputContent::default()),
            BlockType::Textarea => BlockKind::Textarea(InputContent::default()),
            BlockType::Choice => BlockKind::Choice(ChoiceContent::default()),
            BlockType::Rating => BlockKind::Rating(RatingContent::default()),
            BlockType::Date => BlockKind::Date(InputContent::default()),
            BlockType::File => BlockKind::File(InputContent::default()),
            BlockType::Info => BlockKind::Info(BodyContent::default()),
            BlockType::Statement => BlockKind::Statement(BodyContent::default()),
        }
    }

    /// Primary label shown for the block, if it has one
    pub fn label(&self) -> Option<&str> {
        match self {
            BlockKind::Text(c) | BlockKind::Textarea(c) | BlockKind::Date(c) | BlockKind::File(c) => {
                Some(&c.label)
            }
            BlockKind::Choice(c) => Some(&c.label),
            BlockKind::Rating(c) => Some(&c.label),
            BlockKind::Info(c) | BlockKind::Statement(c) => c.label.as_deref(),
        }
    }
}

impl Block {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
            validation: None,
            removable: true,
        }
    }

    pub fn block_type(&self) -> BlockType {
        self.kind.block_type()
    }

    pub fn with_removable(mut self, removable: bool) -> Self {
        self.removable = removable;
        self
    }

    pub fn required(mut self) -> Self {
        self.validation = Some(Validation { required: true });
        self
    }
}

impl Page {
    pub fn new(id: impl Into<String>, kind: PageKind) -> Self {
        Self {
            id: id.into(),
            kind,
            title: None,
            description: None,
            removable: kind == PageKind::Default,
            blocks: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }
}

impl Document {
    /// New form with a start page and an ending page
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            version: 0,
            metadata: Metadata {
                title: title.into(),
                description: String::new(),
                created_at: now,
                updated_at: now,
            },
            theme: BTreeMap::new(),
            pages: vec![
                Page::new("start", PageKind::Start),
                Page::new("ending", PageKind::Ending),
            ],
        }
    }

    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn page_index(&self, id: &str) -> Option<usize> {
        self.pages.iter().position(|p| p.id == id)
    }

    /// Find a block anywhere in the document, with its owning page
    pub fn find_block(&self, id: &str) -> Option<(&Page, &Block)> {
        self.pages
            .iter()
            .find_map(|page| page.block(id).map(|block| (page, block)))
    }

    /// Record a committed change
    pub fn touch(&mut self) {
        self.version += 1;
        self.metadata.updated_at = Utc::now();
    }

    pub fn to_value(&self) -> Result<serde_json::Value, PatchError> {
        serde_json::to_value(self).map_err(|e| PatchError::Shape(e.to_string()))
    }
}
