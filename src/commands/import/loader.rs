use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use crate::util::sha256_hex;

/// An export read fully into memory, with the digest of the exact bytes read.
#[derive(Debug)]
pub struct LoadedExport {
    pub records: Vec<Value>,
    pub sha256: String,
}

/// Reads the whole export into memory. The file must hold a single JSON
/// array; its elements are kept as untyped values.
pub fn load_annotations(path: &Path) -> Result<LoadedExport> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let records: Vec<Value> = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {} as a JSON array", path.display()))?;
    let sha256 = sha256_hex(&raw);

    info!(
        path = %path.display(),
        loaded = records.len(),
        sha256 = %sha256,
        "loaded annotation export"
    );

    Ok(LoadedExport { records, sha256 })
}
