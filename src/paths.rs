//! Collision-safe output naming.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// First path `base_name + counter + extension` under `output_dir` that does
/// not exist yet, creating the directory when absent. The counter starts at
/// 0 and existing files are never overwritten. The scan assumes a single
/// writer; a concurrent writer could claim the returned path first.
pub fn next_available_path(output_dir: &Path, base_name: &str, extension: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).with_context(|| {
        format!("failed to create output directory {}", output_dir.display())
    })?;

    let mut counter = 0u32;
    loop {
        let candidate = output_dir.join(format!("{base_name}{counter}{extension}"));
        if !candidate.exists() {
            return Ok(candidate);
        }
        counter += 1;
    }
}
