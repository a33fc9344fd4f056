// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document ingestion: extract text, split into overlapping word windows,
//! and hand the chunks to the vector store.

use cairn_config::CairnConfig;
use cairn_core::{CairnError, DocumentFormat, TextExtractor};
use serde_json::Value;
use tracing::info;

use crate::store::VectorStore;
use crate::types::Metadata;

/// Metadata key recording the source format of every ingested chunk.
pub const KEY_FILE_TYPE: &str = "file_type";

/// Reads UTF-8 plain text and Markdown. Everything else is unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], format: &DocumentFormat) -> Result<String, CairnError> {
        match format {
            DocumentFormat::PlainText | DocumentFormat::Markdown => {
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
            other => Err(CairnError::UnsupportedFormat {
                format: other.label().to_string(),
            }),
        }
    }
}

/// Word-window chunker.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Words per chunk.
    pub chunk_size: usize,
    /// Words shared between consecutive chunks.
    pub overlap: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

impl TextChunker {
    pub fn from_config(config: &CairnConfig) -> Self {
        Self {
            chunk_size: config.chunking.chunk_size,
            overlap: config.chunking.chunk_overlap,
        }
    }

    /// Split `text` on whitespace into windows of `chunk_size` words.
    ///
    /// Windows advance by `max(1, chunk_size - overlap)` words and stop once
    /// one reaches the end of the text.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let size = self.chunk_size.max(1);
        let step = size.saturating_sub(self.overlap).max(1);

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + size).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end == words.len() {
                break;
            }
            start += step;
        }
        chunks
    }
}

/// Extract, chunk and store one document. Returns the number of chunks stored.
///
/// The chunk metadata is the caller's `metadata` plus [`KEY_FILE_TYPE`].
/// A document with no words stores nothing and returns 0.
pub async fn ingest_document(
    store: &dyn VectorStore,
    extractor: &dyn TextExtractor,
    chunker: &TextChunker,
    bytes: &[u8],
    document_name: &str,
    format: &DocumentFormat,
    metadata: &Metadata,
) -> Result<usize, CairnError> {
    let text = extractor.extract(bytes, format)?;
    let chunks = chunker.chunk(&text);
    if chunks.is_empty() {
        info!(document = document_name, "document has no text, nothing stored");
        return Ok(0);
    }

    let mut metadata = metadata.clone();
    metadata.insert(KEY_FILE_TYPE.to_string(), Value::from(format.label()));
    store.store(&chunks, document_name, &metadata).await?;
    info!(
        document = document_name,
        format = format.label(),
        chunks = chunks.len(),
        backend = store.backend(),
        "document ingested"
    );
    Ok(chunks.len())
}
