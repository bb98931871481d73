//! Segmenter weight acquisition.
//!
//! The EfficientSAM export is fetched once from a fixed remote location when
//! the local file is absent; every later run reuses the cached file.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

/// Fixed remote location of the EfficientSAM ONNX export.
const WEIGHTS_URL: &str =
    "https://huggingface.co/yformer/EfficientSAM/resolve/main/efficient_sam_s.onnx";

#[derive(Debug, Error)]
pub enum WeightsError {
    #[error("weight download failed with HTTP status {0}")]
    Download(reqwest::StatusCode),
    #[error("failed to write weight file")]
    Io(#[from] io::Error),
    #[error("weight download request failed")]
    Http(#[from] reqwest::Error),
}

/// Ensure the segmenter weight file exists at `path`, downloading it from
/// the fixed remote location when absent.
pub fn ensure_segmenter_weights(path: &Path) -> Result<(), WeightsError> {
    if path.exists() {
        tracing::debug!("Segmenter weights found at {}", path.display());
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    tracing::info!("No segmenter weights found, downloading from {WEIGHTS_URL}");

    let mut response = reqwest::blocking::get(WEIGHTS_URL)?;
    if !response.status().is_success() {
        return Err(WeightsError::Download(response.status()));
    }
    if let Some(total) = response.content_length() {
        tracing::info!("Downloading {:.1} MiB", total as f64 / (1024.0 * 1024.0));
    }

    // Write to a scratch name first so an interrupted download never leaves
    // a truncated file behind at the final path.
    let scratch = path.with_extension("part");
    let mut file = fs::File::create(&scratch)?;
    io::copy(&mut response, &mut file)?;
    fs::rename(&scratch, path)?;

    tracing::info!("Weights saved to {}", path.display());
    Ok(())
}
