// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command implementations and startup wiring for the `cairn` binary.

pub mod app;
pub mod chat;
pub mod commands;
pub mod doctor;

pub use app::{Adapters, App};
