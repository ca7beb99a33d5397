//! # Pointer Paths
//!
//! One parser for every consumer of JSON Pointer paths (validator, target
//! resolver, patch engine, cascade grouping). Paths are turned into a
//! [`PathTarget`] once instead of being pattern-matched ad hoc.
//!
//! Page segments may be written as an index (`/pages/2`), the append marker
//! (`/pages/-`) or a page id (`/pages/start/blocks/0`). Block segments are
//! positional only.

use serde_json::Value;
use thiserror::Error;

use crate::document::Document;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PointerError {
    #[error("Pointer must start with '/': {0:?}")]
    MissingSlash(String),

    #[error("Invalid escape sequence in {0:?}")]
    BadEscape(String),
}

/// Split a pointer into unescaped reference tokens
pub fn parse(path: &str) -> Result<Vec<String>, PointerError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(PointerError::MissingSlash(path.to_string()));
    };
    rest.split('/').map(|raw| unescape(raw, path)).collect()
}

fn unescape(token: &str, path: &str) -> Result<String, PointerError> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return Err(PointerError::BadEscape(path.to_string())),
        }
    }
    Ok(out)
}

pub fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Build a pointer from tokens
pub fn join<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|t| format!("/{}", escape(t.as_ref())))
        .collect()
}

/// Parse an array index token. `-` is not an index.
pub fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRef {
    Index(usize),
    Append,
    Id(String),
}

impl PageRef {
    fn from_token(token: &str) -> Self {
        if token == "-" {
            PageRef::Append
        } else if let Some(index) = parse_index(token) {
            PageRef::Index(index)
        } else {
            PageRef::Id(token.to_string())
        }
    }

    /// Index of an existing page this reference points at
    pub fn resolve(&self, doc: &Document) -> Option<usize> {
        match self {
            PageRef::Index(i) if *i < doc.pages.len() => Some(*i),
            PageRef::Index(_) | PageRef::Append => None,
            PageRef::Id(id) => doc.page_index(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
    Index(usize),
    Append,
}

impl BlockRef {
    fn from_token(token: &str) -> Option<Self> {
        if token == "-" {
            Some(BlockRef::Append)
        } else {
            parse_index(token).map(BlockRef::Index)
        }
    }
}

/// Which part of a block a path touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockField {
    /// The block itself (`/pages/p/blocks/b`)
    Whole,
    /// `/type`
    Type,
    /// `/content/label`
    Label,
    /// `/content/options/<token>`, or the whole list when `None`
    Options(Option<String>),
    /// Any other `/content/<key>`
    Content(String),
    /// A non-content block member (`validation`, `removable`, ...)
    Member(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRest {
    Whole,
    /// A page member other than blocks (`title`, `blocks` as a whole, ...)
    Member(String),
    Block { block: BlockRef, field: BlockField },
}

/// Structured reading of a pointer path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathTarget {
    /// `/metadata/<field>`
    Metadata(String),
    Page { page: PageRef, rest: PageRest },
    Other,
}

impl PathTarget {
    /// Whole-page path (`/pages/<p>`)
    pub fn is_page(&self) -> bool {
        matches!(self, PathTarget::Page { rest: PageRest::Whole, .. })
    }

    /// Whole-block path (`/pages/<p>/blocks/<b>`)
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            PathTarget::Page {
                rest: PageRest::Block { field: BlockField::Whole, .. },
                ..
            }
        )
    }
}

/// Classify a path. Malformed pointers classify as [`PathTarget::Other`].
pub fn classify(path: &str) -> PathTarget {
    let Ok(tokens) = parse(path) else {
        return PathTarget::Other;
    };
    let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();

    match tokens.as_slice() {
        ["metadata", field, ..] => PathTarget::Metadata(field.to_string()),
        ["pages", page] => PathTarget::Page {
            page: PageRef::from_token(page),
            rest: PageRest::Whole,
        },
        ["pages", page, "blocks", block, field @ ..] => {
            let Some(block) = BlockRef::from_token(block) else {
                return PathTarget::Other;
            };
            PathTarget::Page {
                page: PageRef::from_token(page),
                rest: PageRest::Block {
                    block,
                    field: block_field(field),
                },
            }
        }
        ["pages", page, member, ..] => PathTarget::Page {
            page: PageRef::from_token(page),
            rest: PageRest::Member(member.to_string()),
        },
        _ => PathTarget::Other,
    }
}

fn block_field(tokens: &[&str]) -> BlockField {
    match tokens {
        [] => BlockField::Whole,
        ["type", ..] => BlockField::Type,
        ["content", "label", ..] => BlockField::Label,
        ["content", "options"] => BlockField::Options(None),
        ["content", "options", option, ..] => BlockField::Options(Some(option.to_string())),
        ["content", key, ..] => BlockField::Content(key.to_string()),
        [member, ..] => BlockField::Member(member.to_string()),
    }
}

/// Rewrite a page-id segment into its index in `root`.
///
/// Paths that already address pages by position, or whose id is unknown,
/// are returned as-is; the engine reports the latter as a bad index.
pub fn canonicalize(path: &str, root: &Value) -> Result<String, PointerError> {
    let mut tokens = parse(path)?;
    if tokens.len() >= 2 && tokens[0] == "pages" && tokens[1] != "-" && parse_index(&tokens[1]).is_none() {
        let found = root
            .get("pages")
            .and_then(Value::as_array)
            .and_then(|pages| {
                pages
                    .iter()
                    .position(|p| p.get("id").and_then(Value::as_str) == Some(tokens[1].as_str()))
            });
        if let Some(index) = found {
            tokens[1] = index.to_string();
            return Ok(join(&tokens));
        }
    }
    Ok(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_and_escape() {
        assert_eq!(parse("").unwrap(), Vec::<String>::new());
        assert_eq!(parse("/a~1b/c~0d").unwrap(), vec!["a/b", "c~d"]);
        assert_eq!(join(&["a/b", "c~d"]), "/a~1b/c~0d");
        assert!(matches!(parse("a/b"), Err(PointerError::MissingSlash(_))));
        assert!(matches!(parse("/a~2"), Err(PointerError::BadEscape(_))));
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("12"), Some(12));
        assert_eq!(parse_index("01"), None);
        assert_eq!(parse_index("-"), None);
        assert_eq!(parse_index("-1"), None);
    }

    #[test]
    fn test_classify_shapes() {
        assert_eq!(
            classify("/metadata/title"),
            PathTarget::Metadata("title".to_string())
        );
        assert!(classify("/pages/2").is_page());
        assert!(classify("/pages/start/blocks/0").is_block());
        assert_eq!(
            classify("/pages/0/blocks/-"),
            PathTarget::Page {
                page: PageRef::Index(0),
                rest: PageRest::Block {
                    block: BlockRef::Append,
                    field: BlockField::Whole
                },
            }
        );
        assert_eq!(
            classify("/pages/0/blocks/1/content/options/3"),
            PathTarget::Page {
                page: PageRef::Index(0),
                rest: PageRest::Block {
                    block: BlockRef::Index(1),
                    field: BlockField::Options(Some("3".to_string()))
                },
            }
        );
        assert_eq!(
            classify("/pages/p/title"),
            PathTarget::Page {
                page: PageRef::Id("p".to_string()),
                rest: PageRest::Member("title".to_string()),
            }
        );
        assert_eq!(classify("/pages/0/blocks/x"), PathTarget::Other);
        assert_eq!(classify("/theme/primary"), PathTarget::Other);
        assert_eq!(classify("not-a-pointer"), PathTarget::Other);
    }

    #[test]
    fn test_canonicalize_page_id() {
        let root = json!({ "pages": [{ "id": "start" }, { "id": "p2" }] });
        assert_eq!(canonicalize("/pages/p2/blocks/0", &root).unwrap(), "/pages/1/blocks/0");
        assert_eq!(canonicalize("/pages/0/blocks/0", &root).unwrap(), "/pages/0/blocks/0");
        assert_eq!(canonicalize("/pages/-", &root).unwrap(), "/pages/-");
        assert_eq!(canonicalize("/pages/nope", &root).unwrap(), "/pages/nope");
    }
}
