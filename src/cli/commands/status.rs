//! Status command. Reads the snapshot directly, without loading a model.

use serde::Serialize;

use crate::config::Settings;
use crate::storage::SnapshotStore;

#[derive(Debug, Serialize)]
struct Status {
    snapshot: String,
    exists: bool,
    entries: usize,
    dimension: Option<usize>,
    model: Option<String>,
    saved_at: Option<String>,
    configured_model: String,
}

pub fn run(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let store = SnapshotStore::new(settings.snapshot_path());
    let snapshot = store.read()?;

    let status = Status {
        snapshot: store.path().display().to_string(),
        exists: snapshot.is_some(),
        entries: snapshot.as_ref().map_or(0, |s| s.index.len()),
        dimension: snapshot.as_ref().and_then(|s| s.index.dimension()),
        model: snapshot.as_ref().map(|s| s.model.clone()),
        saved_at: snapshot.as_ref().map(|s| s.saved_at.clone()),
        configured_model: settings.semantic_search.model.clone(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Snapshot:  {}", status.snapshot);
    if !status.exists {
        println!("Status:    no index yet (run 'docrag ingest <FILE>')");
        return Ok(());
    }
    println!("Entries:   {}", status.entries);
    if let Some(dimension) = status.dimension {
        println!("Dimension: {dimension}");
    }
    if let Some(model) = &status.model {
        println!("Model:     {model}");
    }
    if let Some(saved_at) = &status.saved_at {
        println!("Saved at:  {saved_at}");
    }
    Ok(())
}
