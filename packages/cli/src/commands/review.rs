use anyhow::Result;
use clap::Args;
use colored::{ColoredString, Colorize};
use formdraft_editor::{metadata_patches, EditSession, MergedBlock, MergedPage, ReviewMetadata, ReviewStatus};

use super::{print_rejections, Inputs};

#[derive(Args, Debug)]
pub struct ReviewArgs {
    #[command(flatten)]
    pub inputs: Inputs,

    /// Print the merged review model as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn review(args: ReviewArgs, _cwd: &str) -> Result<()> {
    let (document, proposal) = args.inputs.load()?;
    let mut session = EditSession::new(document);
    let report = session.open_review(proposal)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&session.review_model())?);
        return Ok(());
    }

    if !session.is_reviewing() {
        println!("{} Nothing to review", "⚠️".yellow());
        print_rejections(&report);
        return Ok(());
    }

    println!(
        "🔎 {} {}",
        "Reviewing".green().bold(),
        session.summary().unwrap_or_default()
    );
    print_rejections(&report);
    println!();

    for (field, id) in metadata_patches(session.patches()) {
        println!("   {} metadata/{}  {}", "~".yellow(), field, id.to_string().dimmed());
    }
    for page in session.review_model() {
        print_page(&page);
    }

    Ok(())
}

fn marker(status: ReviewStatus) -> ColoredString {
    match status {
        ReviewStatus::Added => "+".green().bold(),
        ReviewStatus::Removed => "-".red().bold(),
        ReviewStatus::Modified => "~".yellow().bold(),
        ReviewStatus::Kept => " ".normal(),
    }
}

fn patch_ids(review: &ReviewMetadata) -> String {
    let mut ids: Vec<String> = review.patch_id.iter().map(|id| id.to_string()).collect();
    ids.extend(
        review
            .field_patches
            .iter()
            .map(|(field, id)| format!("{}={}", field, id)),
    );
    ids.join(" ")
}

fn print_page(page: &MergedPage) {
    println!(
        " {} {} {}  {}",
        marker(page.review.status),
        page.id.bright_white().bold(),
        page.title.as_deref().unwrap_or_default(),
        patch_ids(&page.review).dimmed()
    );
    for block in &page.blocks {
        print_block(block);
    }
}

fn print_block(block: &MergedBlock) {
    println!(
        "   {} {} [{}] {}  {}",
        marker(block.review.status),
        block.id(),
        block.block.kind.block_type(),
        block.block.kind.label().unwrap_or_default(),
        patch_ids(&block.review).dimmed()
    );
}
