use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use formdraft_editor::DocumentStore;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn list(args: ListArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let store = config.store(cwd);
    let documents = store.list()?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&documents)?);
        return Ok(());
    }

    if documents.is_empty() {
        println!("{} No documents in {}/", "⚠️".yellow(), config.store_dir);
        return Ok(());
    }

    println!("📄 {} document(s) in {}/", documents.len(), config.store_dir);
    for summary in documents {
        println!(
            "   {}  {}  {}",
            summary.id.bright_white().bold(),
            summary.title,
            summary.updated_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
        );
    }

    Ok(())
}
