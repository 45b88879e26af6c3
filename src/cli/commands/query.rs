//! Query command.

use std::sync::Arc;

use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets};

use crate::config::Settings;
use crate::generation::{Answer, PromptTemplate, QaPipeline};
use crate::retrieve::Retriever;
use crate::vector::SearchHit;

const PREVIEW_CHARS: usize = 80;

pub async fn run(
    settings: &Settings,
    question: &str,
    k: Option<usize>,
    answer: bool,
    json: bool,
) -> anyhow::Result<()> {
    let retriever = Arc::new(Retriever::from_settings(settings)?);
    let k = k.unwrap_or(settings.retrieval.top_k);

    let pipeline = if answer {
        let mut generation = settings.generation.clone();
        generation.enabled = true;
        QaPipeline::from_settings(retriever, &generation)?
    } else {
        QaPipeline::new(retriever, None, PromptTemplate::default())
    };

    let result = pipeline.answer(question, k).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_human(&result);
    }
    Ok(())
}

fn print_human(result: &Answer) {
    if result.sources.is_empty() {
        println!("No matching chunks. Ingest documents with 'docrag ingest'.");
    } else {
        println!("{}", hits_table(&result.sources));
    }

    if let Some(answer) = &result.answer {
        println!();
        println!("Answer: {answer}");
    }
}

fn hits_table(hits: &[SearchHit]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Score").add_attribute(Attribute::Bold),
            Cell::new("Document").add_attribute(Attribute::Bold),
            Cell::new("Chunk").add_attribute(Attribute::Bold),
            Cell::new("Text").add_attribute(Attribute::Bold),
        ]);

    for (rank, hit) in hits.iter().enumerate() {
        let mut preview = hit.chunk.preview(PREVIEW_CHARS).replace(['\n', '\r'], " ");
        if hit.chunk.char_count() > PREVIEW_CHARS {
            preview.push_str("...");
        }
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(format!("{:.3}", hit.score)),
            Cell::new(&hit.metadata().source_document_id),
            Cell::new(hit.metadata().sequence_index),
            Cell::new(preview),
        ]);
    }
    table
}
