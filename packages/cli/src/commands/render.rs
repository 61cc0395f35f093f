use super::{load_document, write_output};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use trellis_editor::html::{to_html_with, HtmlOptions};
use trellis_editor::EditSession;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Document to render
    pub input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Render the document as stored, without normalizing first
    #[arg(long)]
    pub raw: bool,

    /// Emit everything on one line
    #[arg(long)]
    pub compact: bool,
}

pub fn render(args: RenderArgs) -> Result<()> {
    let config = Config::for_document(&args.input)?;
    let mut document = load_document(&args.input)?;

    if !args.raw {
        let mut session = EditSession::with_context(document.name.clone(), document, config.context(&[]));
        session.normalize_all();
        document = session.document;
    }

    let options = HtmlOptions {
        pretty: config.pretty && !args.compact,
        ..HtmlOptions::default()
    };
    write_output(args.output.as_deref(), &to_html_with(&document, options))
}
