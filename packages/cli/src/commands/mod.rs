pub mod init;
pub mod list;
pub mod preview;
pub mod resolve;
pub mod review;
pub mod validate;

pub use init::{init, InitArgs};
pub use list::{list, ListArgs};
pub use preview::{preview, PreviewArgs};
pub use resolve::{resolve, ResolveArgs};
pub use review::{review, ReviewArgs};
pub use validate::{validate, ValidateArgs};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use formdraft_editor::{Document, Proposal, ValidationReport};
use std::fs;
use std::path::PathBuf;

/// Document + proposal inputs shared by most commands
#[derive(Args, Debug)]
pub struct Inputs {
    /// Form document (JSON)
    pub document: PathBuf,

    /// Proposed patch: `{operations, summary}` or a bare JSON Patch array
    pub patch: PathBuf,
}

impl Inputs {
    pub fn load(&self) -> Result<(Document, Proposal)> {
        let source = fs::read_to_string(&self.document)
            .with_context(|| format!("Cannot read {}", self.document.display()))?;
        let document: Document = serde_json::from_str(&source)
            .with_context(|| format!("Invalid document {}", self.document.display()))?;

        let source =
            fs::read_to_string(&self.patch).with_context(|| format!("Cannot read {}", self.patch.display()))?;
        let proposal = Proposal::from_json(&source)?;

        Ok((document, proposal))
    }
}

/// Print dropped operations, if any
pub fn print_rejections(report: &ValidationReport) {
    for rejection in &report.rejected {
        println!(
            "   {} #{} {} ({})",
            "✗".red(),
            rejection.index,
            rejection.operation,
            rejection.reason
        );
    }
}
