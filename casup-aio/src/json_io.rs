// casup-aio/src/json_io.rs
use std::path::Path;

use casup_common::error::Result;
use serde::Serialize;
use tracing::debug;

/// Renders `data` as JSON with two-space indentation. Maps keyed by
/// `BTreeMap` (and `serde_json::Value` objects) come out with sorted keys, so
/// equal input always renders to identical bytes.
pub fn to_pretty_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Writes serializable data to a JSON file (pretty-printed), atomically.
pub fn write_json_sync<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    debug!("Writing JSON to: {}", path.display());
    let json = to_pretty_json(data)?;
    crate::fs::atomic_write_file(path, json.as_bytes())
}
