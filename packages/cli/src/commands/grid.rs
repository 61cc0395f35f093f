use super::{load_document, write_output};
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use trellis_editor::model::{ElementType, Path};
use trellis_editor::table::{effective_columns, TableCommand, VisualGrid};
use trellis_editor::{Document, EditSession};

#[derive(Args, Debug)]
pub struct GridArgs {
    /// Document containing the table
    pub input: PathBuf,

    /// Path of the table, e.g. `0` or `2,1` (defaults to the first table)
    #[arg(short, long)]
    pub table: Option<String>,

    /// Table command to run first, e.g. `expand_right` or `align=center`
    #[arg(short, long, requires = "cell")]
    pub command: Option<String>,

    /// Cell the command applies to, as `row,column` stored indexes
    #[arg(long)]
    pub cell: Option<String>,

    /// Write the edited document here
    #[arg(short, long, requires = "command")]
    pub output: Option<PathBuf>,
}

pub fn grid(args: GridArgs) -> Result<()> {
    let config = Config::for_document(&args.input)?;
    let document = load_document(&args.input)?;
    let mut table_path = match &args.table {
        Some(text) => parse_path(text)?,
        None => first_table(&document).ok_or_else(|| anyhow!("document has no table"))?,
    };

    let mut session = EditSession::with_context(document.name.clone(), document, config.context(&[]));
    if let (Some(command), Some(cell)) = (&args.command, &args.cell) {
        let command = parse_command(command)?;
        let cell = table_path.concat(parse_path(cell)?.as_slice());
        if !command.can_apply(&session.document, &cell) {
            anyhow::bail!("{:?} cannot be applied to the cell at {}", command, cell);
        }
        command.apply(&mut session, &cell)?;
        // Deleting the table leaves nothing to print
        if command == TableCommand::DeleteTable {
            return save(&session, &args, &config);
        }
        table_path = locate_table(&session.document, &table_path)?;
    }

    let table = session
        .document
        .element(&table_path)
        .filter(|e| e.kind == ElementType::Table)
        .ok_or_else(|| anyhow!("no table at {}", table_path))?;
    print_grid(&VisualGrid::compute(table), &effective_columns(table));

    if args.output.is_some() {
        save(&session, &args, &config)?;
    }
    Ok(())
}

fn save(session: &EditSession, args: &GridArgs, config: &Config) -> Result<()> {
    let json = session.document.to_json(config.pretty)?;
    write_output(args.output.as_deref(), &json)
}

fn print_grid(grid: &VisualGrid<'_>, widths: &[usize]) {
    let ids = grid.ids();
    let column = ids
        .iter()
        .flatten()
        .map(|id| id.map_or(1, str::len))
        .max()
        .unwrap_or(1);

    for (row, slots) in ids.iter().enumerate() {
        let cells: Vec<String> = slots
            .iter()
            .map(|slot| match slot {
                Some(id) => format!("{:width$}", id, width = column),
                None => format!("{:width$}", "·", width = column).dimmed().to_string(),
            })
            .collect();
        let width = widths.get(row).copied().unwrap_or_default();
        println!("{}  {}", cells.join(" | "), format!("({})", width).dimmed());
    }
}

/// Accepts `0`, `2,1` or `[2, 1]`
fn parse_path(text: &str) -> Result<Path> {
    let indexes = text
        .trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .with_context(|| format!("invalid path segment `{}`", part.trim()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Path::new(indexes))
}

/// `name` or `name=value`, with names in snake_case
fn parse_command(text: &str) -> Result<TableCommand> {
    let value = match text.split_once('=') {
        Some((name, value)) => serde_json::json!({ "command": name, "value": value }),
        None => serde_json::json!({ "command": text }),
    };
    serde_json::from_value(value).with_context(|| format!("unknown table command `{}`", text))
}

fn first_table(doc: &Document) -> Option<Path> {
    doc.paths()
        .into_iter()
        .find(|path| doc.element(path).map_or(false, |e| e.kind == ElementType::Table))
}

/// Commands replace the whole table, so look it up again at or near the old path
fn locate_table(doc: &Document, old: &Path) -> Result<Path> {
    if doc.element(old).map_or(false, |e| e.kind == ElementType::Table) {
        return Ok(old.clone());
    }
    first_table(doc).ok_or_else(|| anyhow!("table disappeared after the command"))
}
