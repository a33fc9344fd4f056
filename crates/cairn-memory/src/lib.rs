// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document memory for Cairn agents.
//!
//! ## Architecture
//!
//! - **VectorStore**: chunk persistence with cosine search, backed by SQLite
//!   with sqlite-vec or, when that is unavailable, a single JSON file
//! - **RetrievalEngine**: vector search with a rerank pass that degrades to
//!   similarity order on failure
//! - **Ingestion**: text extraction, word-window chunking, `ingest_document`
//! - **Types**: ChunkRecord, SearchHit, metadata filters, vector math

pub mod document;
pub mod retriever;
pub mod store;
pub mod types;

pub use document::{ingest_document, PlainTextExtractor, TextChunker, KEY_FILE_TYPE};
pub use retriever::{format_context, LexicalReranker, Reranker, RetrievalEngine};
pub use store::{open_vector_store, JsonVectorStore, SqliteVectorStore, StoreOptions, VectorStore};
pub use types::*;
