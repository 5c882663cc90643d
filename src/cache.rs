//! On-disk cache for remote narration clips.
//!
//! Clips are stored under `<cache_dir>/audio/` using a hash of the URL as the
//! filename to avoid filesystem issues. Writes go through a temporary file so
//! a half-finished download is never mistaken for a cached clip.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

pub fn audio_dir(cache_root: &Path) -> PathBuf {
    cache_root.join("audio")
}

pub fn remote_audio_path(cache_root: &Path, url: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    audio_dir(cache_root).join(format!("{hash}.{}", url_extension(url)))
}

/// Return the cached copy of `url`, downloading it first if needed.
pub fn fetch_remote_audio(cache_root: &Path, url: &str) -> Result<PathBuf> {
    let path = remote_audio_path(cache_root, url);
    if path.exists() {
        debug!(%url, path = %path.display(), "Using cached remote clip");
        return Ok(path);
    }

    info!(%url, "Downloading remote clip");
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("Building HTTP client")?;
    let bytes = client
        .get(url)
        .send()
        .with_context(|| format!("Requesting {url}"))?
        .error_for_status()
        .with_context(|| format!("Downloading {url}"))?
        .bytes()
        .with_context(|| format!("Reading body of {url}"))?;

    store_atomically(&path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "Cached remote clip");
    Ok(path)
}

fn store_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Creating audio cache directory")?;
    }
    let partial = path.with_extension("part");
    fs::write(&partial, bytes).with_context(|| format!("Writing {}", partial.display()))?;
    fs::rename(&partial, path).with_context(|| format!("Finalizing {}", path.display()))?;
    Ok(())
}

fn url_extension(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let file_name = without_query.rsplit('/').next().unwrap_or_default();
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "audio".to_string())
}
