use super::{load_document, write_output};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use trellis_editor::EditSession;

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Document to normalize (JSON array of root nodes)
    pub input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Rewrite the input file in place
    #[arg(long, conflicts_with = "output")]
    pub write: bool,

    /// Permit a restricted element type (repeatable)
    #[arg(long = "allow", value_name = "TYPE")]
    pub allow: Vec<String>,

    /// Print the applied mutations instead of the document
    #[arg(long)]
    pub operations: bool,
}

pub fn normalize(args: NormalizeArgs) -> Result<()> {
    let config = Config::for_document(&args.input)?;
    let document = load_document(&args.input)?;
    let mut session = EditSession::with_context(document.name.clone(), document, config.context(&args.allow));

    session.normalize_all();
    let operations = session.take_operations();
    tracing::info!(count = operations.len(), "normalization complete");

    let content = if args.operations {
        serde_json::to_string_pretty(&operations)?
    } else {
        session.document.to_json(config.pretty)?
    };

    if args.write {
        std::fs::write(&args.input, &content).with_context(|| format!("failed to write {}", args.input.display()))?;
        eprintln!(
            "{} {} ({} repairs)",
            "✓".green(),
            args.input.display(),
            operations.len()
        );
        return Ok(());
    }

    write_output(args.output.as_deref(), &content)
}
