// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot commands: ingest, search, documents, history and export.

use std::path::Path;

use cairn_core::CairnError;
use cairn_memory::{Metadata, MetadataFilter, SearchHit};
use cairn_storage::{Conversation, ExportFormat};
use colored::Colorize;
use serde_json::Value;

use crate::app::App;

/// Parse `key=value` for clap.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{s}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

pub fn to_metadata(pairs: &[(String, String)]) -> Metadata {
    pairs
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect()
}

pub fn to_filter(pairs: &[(String, String)]) -> Option<MetadataFilter> {
    if pairs.is_empty() {
        return None;
    }
    Some(pairs.iter().cloned().collect())
}

pub async fn run_ingest(
    app: &App,
    path: &Path,
    name: Option<&str>,
    format: Option<&str>,
    metadata: &[(String, String)],
) -> Result<(), CairnError> {
    let chunks = app
        .ingest_file(path, name, format, &to_metadata(metadata))
        .await?;
    println!(
        "{} {} ({chunks} chunks, {} backend)",
        "stored".green(),
        path.display(),
        app.store.backend()
    );
    Ok(())
}

pub async fn run_search(
    app: &App,
    query: &str,
    limit: Option<usize>,
    filter: &[(String, String)],
    json: bool,
) -> Result<(), CairnError> {
    let limit = limit.unwrap_or(app.retrieval.default_limit());
    let hits = app
        .retrieval
        .search(query, limit, to_filter(filter).as_ref())
        .await?;

    if json {
        print_json(&hits);
        return Ok(());
    }
    if hits.is_empty() {
        println!("{}", "no matching chunks".dimmed());
        return Ok(());
    }
    for (i, hit) in hits.iter().enumerate() {
        print_hit(i + 1, hit);
    }
    Ok(())
}

fn print_hit(rank: usize, hit: &SearchHit) {
    println!(
        "{} {} {}",
        format!("[{rank}]").bold(),
        hit.document_name.cyan(),
        format!("{:.3}", hit.score).dimmed()
    );
    println!("    {}", excerpt(&hit.text, 240));
}

pub async fn run_documents(app: &App, json: bool) -> Result<(), CairnError> {
    let documents = app.store.list_documents().await?;
    let stats = app.store.stats().await?;

    if json {
        print_json(&serde_json::json!({
            "backend": app.store.backend(),
            "stats": stats,
            "documents": documents,
        }));
        return Ok(());
    }

    println!(
        "{} documents, {} chunks ({} backend)",
        stats.total_documents,
        stats.total_chunks,
        app.store.backend()
    );
    for doc in documents {
        let updated = doc
            .last_updated
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<40} {:>5} chunks  {}", doc.name, doc.chunks, updated.dimmed());
    }
    Ok(())
}

pub async fn run_delete(app: &App, document: &str) -> Result<(), CairnError> {
    let removed = app.store.delete(document).await?;
    if removed == 0 {
        println!("{}", format!("no chunks stored for {document}").yellow());
    } else {
        println!("{} {removed} chunks of {document}", "deleted".green());
    }
    Ok(())
}

pub async fn run_history(
    app: &App,
    tags: &[String],
    search: Option<&str>,
    limit: usize,
) -> Result<(), CairnError> {
    let conversations = match search {
        Some(keyword) => {
            let mut found = app.conversations.search(keyword).await;
            if !tags.is_empty() {
                found.retain(|c| tags.iter().any(|t| c.tags.contains(t)));
            }
            found.truncate(limit);
            found
        }
        None => app.conversations.load(tags, limit).await,
    };

    if conversations.is_empty() {
        println!("{}", "no saved conversations".dimmed());
        return Ok(());
    }
    for conversation in &conversations {
        print_conversation_line(conversation);
    }
    Ok(())
}

fn print_conversation_line(conversation: &Conversation) {
    let tags = if conversation.tags.is_empty() {
        String::new()
    } else {
        let joined: Vec<&str> = conversation.tags.iter().map(String::as_str).collect();
        format!(" [{}]", joined.join(", "))
    };
    println!(
        "{}  {}  {}{}",
        conversation.id.dimmed(),
        conversation.created_at.format("%Y-%m-%d %H:%M"),
        conversation.title,
        tags.cyan()
    );
}

pub async fn run_export(app: &App, id: &str, format: &str) -> Result<(), CairnError> {
    let format: ExportFormat = format
        .parse()
        .map_err(|_| CairnError::UnsupportedFormat {
            format: format.to_string(),
        })?;
    match app.conversations.export(id, format).await? {
        Some(rendered) => println!("{rendered}"),
        None => eprintln!("{}", format!("no conversation with id {id}").yellow()),
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// First `max_chars` characters on one line.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{cut}...")
}
