use anyhow::Result;
use clap::Args;
use formdraft_editor::apply_batch;
use std::path::PathBuf;

use super::Inputs;

#[derive(Args, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub inputs: Inputs,

    /// Write the previewed document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Apply the validated batch to a copy of the document and print it
pub fn preview(args: PreviewArgs, _cwd: &str) -> Result<()> {
    let (document, proposal) = args.inputs.load()?;
    let operations = formdraft_editor::filter(proposal.operations, &document);

    let previewed = apply_batch(&document, &operations)?;
    let json = serde_json::to_string_pretty(&previewed)?;

    match args.output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{}", json),
    }
    Ok(())
}
