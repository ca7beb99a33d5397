use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::{print_rejections, Inputs};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub inputs: Inputs,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn validate(args: ValidateArgs, _cwd: &str) -> Result<()> {
    let (document, proposal) = args.inputs.load()?;
    let report = formdraft_editor::validate(proposal.operations, &document);

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("🔍 {} {}", "Validating".green().bold(), args.inputs.patch.display());
    for op in &report.accepted {
        println!("   {} {}", "✓".green(), op);
    }
    print_rejections(&report);
    println!();
    println!(
        "   {} retained, {} dropped",
        report.accepted.len().to_string().green(),
        report.rejected.len().to_string().red()
    );

    Ok(())
}
