// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text extraction from raw document bytes.

use crate::error::CairnError;
use crate::types::DocumentFormat;

/// Turns document bytes into plain text.
///
/// Implementations must return [`CairnError::UnsupportedFormat`] for formats
/// they cannot read instead of yielding empty text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8], format: &DocumentFormat) -> Result<String, CairnError>;
}
