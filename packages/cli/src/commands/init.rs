use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use formdraft_editor::{Block, BlockKind, Document, DocumentStore, InputContent};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Id of the starter document
    #[arg(long, default_value = "my-form")]
    pub id: String,

    /// Title of the starter document
    #[arg(long, default_value = "My form")]
    pub title: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Formdraft project...".bright_blue().bold());

    let config = Config::default();
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    let store = config.store(cwd);
    if store.load(&args.id).is_err() || args.force {
        store.save(&args.id, &starter(&args.id, &args.title))?;
        println!("  {} Created {}/{}.json", "✓".green(), config.store_dir, args.id);
    }

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Write a patch file (JSON Patch array)");
    println!("  2. Run: formdraft review {}/{}.json patch.json", config.store_dir, args.id);
    println!("  3. Run: formdraft resolve ... --accept-all");

    Ok(())
}

fn starter(id: &str, title: &str) -> Document {
    let mut document = Document::new(id, title);
    document.pages[0].blocks.push(Block::new(
        "name",
        BlockKind::Text(InputContent {
            label: "Your name".to_string(),
            ..Default::default()
        }),
    ));
    document
}
