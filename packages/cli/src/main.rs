mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    init, list, preview, resolve, review, validate, InitArgs, ListArgs, PreviewArgs, ResolveArgs, ReviewArgs,
    ValidateArgs,
};
use config::Config;
use tracing::level_filters::LevelFilter;

/// Formdraft CLI - review AI-proposed edits to form documents
#[derive(Parser, Debug)]
#[command(name = "formdraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new Formdraft project
    Init(InitArgs),

    /// List saved documents
    List(ListArgs),

    /// Show which operations of a patch survive validation
    Validate(ValidateArgs),

    /// Print the document with a patch applied
    Preview(PreviewArgs),

    /// Show the merged review model for a patch
    Review(ReviewArgs),

    /// Accept or reject the patches of a proposal and save the result
    Resolve(ResolveArgs),
}

fn log_level(verbose: u8, config: &Config) -> LevelFilter {
    match verbose {
        0 => config.level(),
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn main() {
    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    // A broken config is reported by the command that loads it
    let config = Config::load(&cwd).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_max_level(log_level(cli.verbose, &config))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::List(args) => list(args, &cwd),
        Command::Validate(args) => validate(args, &cwd),
        Command::Preview(args) => preview(args, &cwd),
        Command::Review(args) => review(args, &cwd),
        Command::Resolve(args) => resolve(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
