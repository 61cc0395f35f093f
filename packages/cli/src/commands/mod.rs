pub mod check;
pub mod grid;
pub mod normalize;
pub mod render;

pub use check::{check, CheckArgs};
pub use grid::{grid, GridArgs};
pub use normalize::{normalize, NormalizeArgs};
pub use render::{render, RenderArgs};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use trellis_editor::Document;
use walkdir::WalkDir;

/// Load a document file, naming the file on failure
pub(crate) fn load_document(path: &Path) -> Result<Document> {
    Document::load(path.to_path_buf()).with_context(|| format!("failed to load {}", path.display()))
}

/// Write to `output`, or to stdout when no output is given
pub(crate) fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => println!("{}", content.trim_end()),
    }
    Ok(())
}

/// Every `.json` document under `dir`, skipping config files
pub(crate) fn find_documents(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && path.extension().map_or(false, |e| e == "json"))
        .filter(|path| path.file_name().map_or(true, |n| n != crate::config::DEFAULT_CONFIG_NAME))
        .collect();
    files.sort();
    files
}
