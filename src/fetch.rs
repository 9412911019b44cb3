//! Dataset loading from a local path or an HTTP(S) URL.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

/// Loads dataset bytes from `source`.
///
/// Sources starting with `http` are fetched over the network, anything else
/// is read from disk. A `.gz` suffix means the payload is gzip-compressed.
#[tracing::instrument(skip_all, fields(source = %source))]
pub fn load_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http") {
        fetch_bytes(source)?
    } else {
        std::fs::read(source).with_context(|| format!("Failed to read dataset '{source}'"))?
    };
    debug!(bytes = bytes.len(), "Dataset bytes loaded");

    if source.ends_with(".gz") {
        return gunzip(&bytes).with_context(|| format!("Failed to decompress '{source}'"));
    }

    Ok(bytes)
}

pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let resp = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("Failed to fetch dataset from {url}"))?;
    Ok(resp.bytes()?.to_vec())
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
