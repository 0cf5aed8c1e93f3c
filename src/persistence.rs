//! Persistence layer for collections and result files.
//!
//! Supports both JSON (human-readable) and bincode (efficient binary) formats.
//! The format is chosen from the file extension.

use crate::error::{AutodocError, Result};
use bincode::{Decode, Encode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// On-disk format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// JSON format (human-readable, larger).
    Json,
    /// Bincode format (binary, compact).
    Bincode,
}

impl SaveFormat {
    /// Determine format from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => SaveFormat::Json,
            Some("bin") | Some("bincode") => SaveFormat::Bincode,
            _ => SaveFormat::Json,
        }
    }

    /// Parse a configured format name ("json", "bin" or "bincode").
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "json" => Ok(SaveFormat::Json),
            "bin" | "bincode" => Ok(SaveFormat::Bincode),
            other => Err(AutodocError::InvalidConfig(format!(
                "unknown store format '{}', expected json or bin",
                other
            ))),
        }
    }

    /// File extension used for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Json => "json",
            SaveFormat::Bincode => "bin",
        }
    }
}

/// Save a value, choosing the format from the path's extension.
pub fn save<T>(value: &T, path: &Path) -> Result<()>
where
    T: Serialize + Encode,
{
    save_with_format(value, path, SaveFormat::from_path(path))
}

fn save_with_format<T>(value: &T, path: &Path, format: SaveFormat) -> Result<()>
where
    T: Serialize + Encode,
{
    match format {
        SaveFormat::Json => save_json(value, path),
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            let data = bincode::encode_to_vec(value, config)
                .map_err(|e| AutodocError::Serialization(e.to_string()))?;
            write_bytes(path, &data)
        }
    }
}

/// Save a value as pretty-printed JSON.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let data = serde_json::to_string_pretty(value)
        .map_err(|e| AutodocError::Serialization(e.to_string()))?;
    write_bytes(path, data.as_bytes())
}

/// Load a value, choosing the format from the path's extension.
pub fn load<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Decode<()>,
{
    if !path.exists() {
        return Err(AutodocError::InputMissing(path.to_path_buf()));
    }
    load_with_format(path, SaveFormat::from_path(path))
}

fn load_with_format<T>(path: &Path, format: SaveFormat) -> Result<T>
where
    T: DeserializeOwned + Decode<()>,
{
    let data = fs::read(path).map_err(|e| AutodocError::io(path, e))?;

    let value = match format {
        SaveFormat::Json => serde_json::from_slice(&data)
            .map_err(|e| AutodocError::Serialization(e.to_string()))?,
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            let (value, _): (T, usize) = bincode::decode_from_slice(&data, config)
                .map_err(|e| AutodocError::Serialization(e.to_string()))?;
            value
        }
    };

    Ok(value)
}

/// Get the size of a file in bytes.
pub fn file_size(path: &Path) -> Result<u64> {
    let metadata = fs::metadata(path).map_err(|e| AutodocError::io(path, e))?;
    Ok(metadata.len())
}

fn write_bytes(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| AutodocError::io(parent, e))?;
        }
    }
    fs::write(path, data).map_err(|e| AutodocError::io(path, e))
}
