use super::{find_documents, load_document};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use trellis_editor::{validate, Violation, ViolationLevel};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Document file or directory of documents
    #[arg(default_value = ".")]
    pub input: PathBuf,

    /// Also report warnings (normal-form issues that break no invariant)
    #[arg(short = 'w', long)]
    pub warnings: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Permit a restricted element type (repeatable)
    #[arg(long = "allow", value_name = "TYPE")]
    pub allow: Vec<String>,
}

#[derive(Default)]
struct Totals {
    files: usize,
    errors: usize,
    warnings: usize,
}

pub fn check(args: CheckArgs) -> Result<()> {
    let files = if args.input.is_dir() {
        find_documents(&args.input)
    } else if args.input.is_file() {
        vec![args.input.clone()]
    } else {
        anyhow::bail!("input path does not exist: {}", args.input.display());
    };

    if files.is_empty() {
        println!("{} No documents found", "⚠".yellow());
        return Ok(());
    }

    let mut totals = Totals::default();
    for file in &files {
        let (errors, warnings) = check_file(file, &args)?;
        totals.files += 1;
        totals.errors += errors;
        totals.warnings += warnings;
    }

    if args.format != "json" {
        print_summary(&totals);
    }

    if totals.errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn check_file(file: &Path, args: &CheckArgs) -> Result<(usize, usize)> {
    let config = Config::for_document(file)?;
    let document = load_document(file)?;
    let violations: Vec<Violation> = validate(&document, &config.context(&args.allow))
        .into_iter()
        .filter(|v| args.warnings || v.level == ViolationLevel::Error)
        .collect();

    let errors = violations.iter().filter(|v| v.level == ViolationLevel::Error).count();
    let warnings = violations.len() - errors;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&violations)?);
        return Ok((errors, warnings));
    }

    if violations.is_empty() {
        println!("{} {}", "✓".green(), file.display());
        return Ok((0, 0));
    }

    println!("{}", file.display());
    for violation in &violations {
        let level = match violation.level {
            ViolationLevel::Error => "error".red().bold(),
            ViolationLevel::Warning => "warning".yellow().bold(),
        };
        println!(
            "  {} [{}] at {}: {}",
            level,
            violation.rule.as_str(),
            violation.path,
            violation.message
        );
        if let Some(suggestion) = &violation.suggestion {
            println!("    {} {}", "fix:".dimmed(), suggestion.dimmed());
        }
    }
    println!();

    Ok((errors, warnings))
}

fn print_summary(totals: &Totals) {
    let summary = format!(
        "{} file(s), {} error(s), {} warning(s)",
        totals.files, totals.errors, totals.warnings
    );
    if totals.errors > 0 {
        println!("{} {}", "✗".red(), summary);
    } else {
        println!("{} {}", "✓".green(), summary);
    }
}
