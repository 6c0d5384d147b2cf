#![deny(warnings)]

//! Persistence layer: snapshot files and the per-quarter history.
//!
//! Snapshots are wrapped in a versioned envelope and written as JSON or
//! bincode depending on the file extension.

pub mod history;

pub use history::{CompanyRecord, MarketRecord, ProductRecord, QuarterHistory, QuarterRecord};

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Version written into every envelope; loading any other version fails.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Bincode,
}

impl Format {
    /// `.bin` and `.bincode` files are bincode, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") | Some("bincode") => Format::Bincode,
            _ => Format::Json,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    format_version: u32,
    payload: T,
}

/// Returns the default location for a saved game.
pub fn default_save_path() -> PathBuf {
    PathBuf::from("./saves/technopoly.json")
}

pub fn encode<T: Serialize>(value: &T, format: Format) -> Result<Vec<u8>> {
    let env = Envelope {
        format_version: FORMAT_VERSION,
        payload: value,
    };
    let bytes = match format {
        Format::Json => serde_json::to_vec_pretty(&env).context("encoding JSON snapshot")?,
        Format::Bincode => bincode::serialize(&env).context("encoding bincode snapshot")?,
    };
    Ok(bytes)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8], format: Format) -> Result<T> {
    let env: Envelope<T> = match format {
        Format::Json => serde_json::from_slice(bytes).context("decoding JSON snapshot")?,
        Format::Bincode => bincode::deserialize(bytes).context("decoding bincode snapshot")?,
    };
    if env.format_version != FORMAT_VERSION {
        bail!(
            "unsupported snapshot version {} (expected {})",
            env.format_version,
            FORMAT_VERSION
        );
    }
    Ok(env.payload)
}

/// Write `value` to `path`, creating parent directories.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = encode(value, Format::from_path(path))?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "snapshot saved");
    Ok(())
}

pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let value = decode(&bytes, Format::from_path(path))
        .with_context(|| format!("loading {}", path.display()))?;
    info!(path = %path.display(), "snapshot loaded");
    Ok(value)
}
