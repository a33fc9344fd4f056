// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence layer for Cairn.
//!
//! Provides the SQLite [`Database`] used by the relational vector backend
//! (WAL mode, sqlite-vec, embedded migrations, one tokio-rusqlite writer
//! thread), the locked whole-file [`JsonFile`] used by the file-backed
//! stores, and the [`ConversationStore`].

pub mod conversations;
pub mod database;
pub mod json_file;
pub mod migrations;

pub use conversations::{Conversation, ConversationStore, ExportFormat};
pub use database::{map_tr_err, Database};
pub use json_file::JsonFile;
