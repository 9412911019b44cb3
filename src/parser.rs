//! JSON parser for A/B-test datasets.

use anyhow::{Context, Result};

use crate::aggregate::types::RawData;

/// Decodes a [`RawData`] document from raw JSON bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid JSON for a `RawData`.
pub fn parse_dataset(bytes: &[u8]) -> Result<RawData> {
    serde_json::from_slice(bytes).context("Dataset is not a valid {variations, data} document")
}
