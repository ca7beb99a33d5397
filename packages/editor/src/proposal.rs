//! # Proposal Source
//!
//! Where proposed edits come from. The language-model call itself lives
//! outside this crate; implementations of [`ProposalSource`] wrap it and hand
//! back a [`Proposal`] in JSON Patch wire format.
//!
//! A failing source never touches the document.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::Document;
use crate::patch::PatchOperation;

/// A batch of proposed operations with a human-readable summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub operations: Vec<PatchOperation>,

    #[serde(default)]
    pub summary: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProposalError {
    #[error("Proposal source failed: {0}")]
    Source(String),

    #[error("Unparsable proposal: {0}")]
    Unparsable(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProposalWire {
    Envelope(Proposal),
    Bare(Vec<PatchOperation>),
}

impl Proposal {
    pub fn new(operations: Vec<PatchOperation>, summary: impl Into<String>) -> Self {
        Self {
            operations,
            summary: summary.into(),
        }
    }

    /// Parse a response body: either `{operations, summary}` or a bare patch array
    pub fn from_json(text: &str) -> Result<Self, ProposalError> {
        match serde_json::from_str::<ProposalWire>(text) {
            Ok(ProposalWire::Envelope(proposal)) => Ok(proposal),
            Ok(ProposalWire::Bare(operations)) => Ok(Proposal::new(operations, "")),
            Err(e) => Err(ProposalError::Unparsable(e.to_string())),
        }
    }
}

/// Produces proposed edits for a document
pub trait ProposalSource {
    fn propose(&self, prompt: &str, document: &Document) -> Result<Proposal, ProposalError>;
}

/// Always proposes the same batch
#[derive(Debug, Clone)]
pub struct StaticProposalSource {
    proposal: Proposal,
}

impl StaticProposalSource {
    pub fn new(proposal: Proposal) -> Self {
        Self { proposal }
    }
}

impl ProposalSource for StaticProposalSource {
    fn propose(&self, _prompt: &str, _document: &Document) -> Result<Proposal, ProposalError> {
        Ok(self.proposal.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_envelope() {
        let proposal = Proposal::from_json(
            r#"{ "operations": [{ "op": "remove", "path": "/pages/1" }], "summary": "Drop page" }"#,
        )
        .unwrap();
        assert_eq!(proposal.summary, "Drop page");
        assert_eq!(proposal.operations, vec![PatchOperation::remove("/pages/1")]);
    }

    #[test]
    fn test_parse_bare_array() {
        let proposal = Proposal::from_json(r#"[{ "op": "remove", "path": "/pages/1" }]"#).unwrap();
        assert_eq!(proposal.operations.len(), 1);
        assert!(proposal.summary.is_empty());
    }

    #[test]
    fn test_unparsable() {
        assert!(matches!(
            Proposal::from_json("Sure! Here are the changes"),
            Err(ProposalError::Unparsable(_))
        ));
        assert!(matches!(
            Proposal::from_json(r#"[{ "op": "explode", "path": "/" }]"#),
            Err(ProposalError::Unparsable(_))
        ));
    }
}
