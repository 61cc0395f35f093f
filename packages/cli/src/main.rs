mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, grid, normalize, render, CheckArgs, GridArgs, NormalizeArgs, RenderArgs};
use tracing_subscriber::EnvFilter;

/// Trellis CLI - keep rich-text document trees well-formed
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log every repair and edit step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Repair a document until every schema rule holds
    Normalize(NormalizeArgs),

    /// Report schema violations without changing anything
    Check(CheckArgs),

    /// Render a document as HTML
    Render(RenderArgs),

    /// Print the visual grid of a table
    Grid(GridArgs),
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Normalize(args) => normalize(args),
        Command::Check(args) => check(args),
        Command::Render(args) => render(args),
        Command::Grid(args) => grid(args),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
