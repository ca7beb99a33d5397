use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use formdraft_editor::{DocumentStore, EditSession, PatchId, Resolution};
use std::fmt;
use std::path::PathBuf;

use super::{print_rejections, Inputs};

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub inputs: Inputs,

    /// Accept every patch
    #[arg(long, conflicts_with = "reject_all")]
    pub accept_all: bool,

    /// Reject every patch
    #[arg(long)]
    pub reject_all: bool,

    /// Patch ids to accept
    #[arg(long, num_args = 1..)]
    pub accept: Vec<String>,

    /// Patch ids to reject
    #[arg(long, num_args = 1..)]
    pub reject: Vec<String>,

    /// Accept every patch on these blocks
    #[arg(long, num_args = 1..)]
    pub accept_block: Vec<String>,

    /// Reject every patch on these blocks
    #[arg(long, num_args = 1..)]
    pub reject_block: Vec<String>,

    /// Page-level patch ids to accept along with their nested patches
    #[arg(long, num_args = 1..)]
    pub accept_page: Vec<String>,

    /// Page-level patch ids to reject along with their nested patches
    #[arg(long, num_args = 1..)]
    pub reject_page: Vec<String>,

    /// Also write the resolved document here
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// One requested resolution, in the order they are applied
#[derive(Debug, Clone, Copy)]
enum Step<'a> {
    Page(&'a String, Resolution),
    Block(&'a String, Resolution),
    Patch(&'a String, Resolution),
}

impl Step<'_> {
    fn resolution(&self) -> Resolution {
        match *self {
            Step::Page(_, r) | Step::Block(_, r) | Step::Patch(_, r) => r,
        }
    }
}

impl fmt::Display for Step<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.resolution() {
            Resolution::Accept => "accept",
            Resolution::Reject => "reject",
        };
        match self {
            Step::Page(id, _) => write!(f, "--{}-page {}", verb, id),
            Step::Block(id, _) => write!(f, "--{}-block {}", verb, id),
            Step::Patch(id, _) => write!(f, "--{} {}", verb, id),
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    accepted: usize,
    rejected: usize,
}

impl Tally {
    fn add(&mut self, resolution: Resolution, settled: usize) {
        match resolution {
            Resolution::Accept => self.accepted += settled,
            Resolution::Reject => self.rejected += settled,
        }
    }
}

/// Apply the requested resolutions in flag order, then settle whatever is
/// left. Counts every item each step settled.
fn settle(session: &mut EditSession, args: &ResolveArgs) -> Result<Tally> {
    let mut steps: Vec<Step> = Vec::new();
    steps.extend(args.accept_page.iter().map(|id| Step::Page(id, Resolution::Accept)));
    steps.extend(args.reject_page.iter().map(|id| Step::Page(id, Resolution::Reject)));
    steps.extend(args.accept_block.iter().map(|id| Step::Block(id, Resolution::Accept)));
    steps.extend(args.reject_block.iter().map(|id| Step::Block(id, Resolution::Reject)));
    steps.extend(args.accept.iter().map(|id| Step::Patch(id, Resolution::Accept)));
    steps.extend(args.reject.iter().map(|id| Step::Patch(id, Resolution::Reject)));

    let mut tally = Tally::default();
    for step in steps {
        if !session.is_reviewing() {
            println!("   {} Review closed, ignoring {}", "ℹ".blue(), step);
            continue;
        }
        let before = session.pending().len();
        match step {
            Step::Page(id, resolution) => session.resolve_page_patch(&PatchId::from(id.as_str()), resolution)?,
            Step::Block(id, Resolution::Accept) => {
                session.accept_patches_by_block_id(id)?;
            }
            Step::Block(id, Resolution::Reject) => {
                session.reject_patches_by_block_id(id)?;
            }
            Step::Patch(id, Resolution::Accept) => session.accept_patch(&PatchId::from(id.as_str()))?,
            Step::Patch(id, Resolution::Reject) => session.reject_patch(&PatchId::from(id.as_str()))?,
        }
        tally.add(step.resolution(), before - session.pending().len());
    }

    if session.is_reviewing() {
        if args.accept_all {
            tally.add(Resolution::Accept, session.accept_all_patches()?);
        } else {
            let remaining = session.reject_all_patches()?;
            if !args.reject_all && remaining > 0 {
                println!("   {} {} unresolved patch(es) rejected", "ℹ".blue(), remaining);
            }
            tally.add(Resolution::Reject, remaining);
        }
    }
    Ok(tally)
}

/// Run the resolution flow over a proposal and save the committed document.
///
/// Patches left pending after the requested resolutions are rejected.
pub fn resolve(args: ResolveArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let (document, proposal) = args.inputs.load()?;

    let mut session = EditSession::with_config(document, &config.editor);
    let report = session.open_review(proposal)?;
    print_rejections(&report);

    if !session.is_reviewing() {
        println!("{} Nothing to resolve", "⚠️".yellow());
        return Ok(());
    }

    let Tally { accepted, rejected } = settle(&mut session, &args)?;

    println!(
        "✅ {} accepted, {} rejected",
        accepted.to_string().green(),
        rejected.to_string().red()
    );

    if !session.is_dirty() {
        return Ok(());
    }

    let document = session.document();
    config.store(cwd).save(&document.id, document)?;
    println!("  {} Saved {}/{}.json", "✓".green(), config.store_dir, document.id);

    if let Some(path) = &args.output {
        std::fs::write(path, serde_json::to_string_pretty(document)?)?;
        println!("  {} Wrote {}", "✓".green(), path.display());
    }
    session.mark_saved();

    Ok(())
}
