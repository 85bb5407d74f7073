//! Dry-run classification of a text file

use crate::console::{CliConsole, percent};
use colored::*;
use labcache_core::{Classification, LabCacheError, LabCacheResult, PatternCache};
use serde::Serialize;
use tokio::io::AsyncReadExt;

/// One classified paragraph
#[derive(Debug, Serialize)]
struct ChunkReport<'a> {
    index: usize,
    text: &'a str,
    classification: Classification,
}

/// Classify each paragraph of `input` (a path, or `-` for stdin).
///
/// Nothing is counted, learned or saved.
pub async fn run(cache: &PatternCache, input: &str, json: bool) -> LabCacheResult<()> {
    let text = read_input(input).await?;
    let reports: Vec<ChunkReport<'_>> = split_chunks(&text)
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| ChunkReport {
            index,
            text: chunk,
            classification: cache.preview(chunk),
        })
        .collect();

    if json {
        let out = serde_json::to_string_pretty(&reports)
            .map_err(|e| LabCacheError::json(format!("Failed to serialize classification: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    let console = CliConsole::new(true);
    console.print_header(&format!("Classification of {input}"));
    for report in &reports {
        print_chunk(report);
    }

    let resolved = reports.iter().filter(|r| r.classification.is_resolved()).count();
    console.print_separator();
    console.field("Chunks", reports.len());
    console.field("Resolved by cache", resolved);
    console.field("Need the LLM", reports.len() - resolved);
    Ok(())
}

fn print_chunk(report: &ChunkReport<'_>) {
    let classification = &report.classification;
    let status = if classification.is_resolved() {
        "cache".green().bold()
    } else if classification.hits.is_empty() {
        "llm".yellow().bold()
    } else {
        "mixed".cyan().bold()
    };
    println!();
    println!("{} {}", format!("Chunk {}", report.index + 1).bold(), status);

    for hit in &classification.hits {
        println!(
            "  {} {} = {} {} {}",
            "✓".green(),
            hit.display_name,
            hit.value,
            hit.unit,
            format!("({})", percent(hit.confidence)).dimmed()
        );
    }
    for candidate in classification.candidates.iter().filter(|c| !c.is_hit) {
        println!(
            "  {} {} {} {}",
            "·".dimmed(),
            candidate.pattern,
            format!("{} < {}", percent(candidate.confidence), percent(candidate.threshold)).dimmed(),
            format!("{:?}", candidate.range_check).dimmed()
        );
    }
    for span in &classification.miss_spans {
        println!("  {} {}", "→".yellow(), span.text.replace('\n', " ⏎ "));
    }
}

async fn read_input(input: &str) -> LabCacheResult<String> {
    if input == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .map_err(|e| LabCacheError::io(format!("Failed to read stdin: {e}")))?;
        return Ok(text);
    }
    tokio::fs::read_to_string(input)
        .await
        .map_err(|e| LabCacheError::io_with_path(format!("Failed to read input: {e}"), input))
}

/// Paragraphs separated by blank lines, trimmed, empty ones dropped
fn split_chunks(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                chunks.push(text[s..end].trim());
            }
        } else {
            start.get_or_insert(offset);
            end = offset + line.len();
        }
        offset += line.len();
    }
    if let Some(s) = start {
        chunks.push(text[s..end].trim());
    }
    chunks
}
