//! Ingest command.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

use crate::config::Settings;
use crate::documents::extract_text;
use crate::retrieve::Retriever;

fn document_id(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no usable file name", path.display()))
}

pub fn run(settings: &Settings, files: &[PathBuf], id: Option<&str>) -> anyhow::Result<()> {
    if id.is_some() && files.len() > 1 {
        bail!("--id can only be used with a single file");
    }

    let retriever = Retriever::from_settings(settings)?;

    let mut total = 0;
    for path in files {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let text = extract_text(&path.to_string_lossy(), &bytes)?;
        let document_id = match id {
            Some(id) => id.to_string(),
            None => document_id(path)?,
        };

        let report = retriever.ingest(&document_id, &text)?;
        println!(
            "Indexed {}: {} chunks",
            report.document_id, report.chunks_indexed
        );
        total += report.chunks_indexed;
    }

    let stats = retriever.stats();
    println!(
        "Done: {total} chunks from {} files ({} entries in {})",
        files.len(),
        stats.entries,
        retriever.store().path().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_is_file_name() {
        assert_eq!(document_id(Path::new("docs/guide.md")).unwrap(), "guide.md");
        assert!(document_id(Path::new("/")).is_err());
    }
}
