//! Single-image background removal flow.

use crate::compositing;
use crate::config::RunConfig;
use crate::detection::{self, ObjectDetector};
use crate::paths::next_available_path;
use crate::segmentation::BoxSegmenter;
use anyhow::{Context, Result};
use image::{RgbImage, RgbaImage};
use std::path::{Path, PathBuf};

/// Where transparent composites are written.
pub const IMAGE_OUTPUT_DIR: &str = "outputImages";

/// Terminal outcome of one image invocation.
#[derive(Debug)]
pub enum ImageOutcome {
    /// Composite persisted at the contained path.
    Saved(PathBuf),
    /// The detector matched nothing above the confidence threshold, or no
    /// mask pixel survived. Nothing was written.
    NoObjectFound,
}

/// Read the image at `input_path`, run the detect → suppress → segment →
/// composite flow and persist the result under `output_dir` as a PNG with a
/// collision-safe name. An unreadable source image is fatal.
pub fn process_image<D, S>(
    detector: &mut D,
    segmenter: &mut S,
    config: &RunConfig,
    input_path: &Path,
    output_dir: &Path,
) -> Result<ImageOutcome>
where
    D: ObjectDetector,
    S: BoxSegmenter,
{
    let frame = image::open(input_path)
        .with_context(|| format!("failed to read image {}", input_path.display()))?
        .into_rgb8();

    detector.bind_vocabulary(&config.categories)?;

    let Some(composite) = remove_background(detector, segmenter, config, &frame)? else {
        return Ok(ImageOutcome::NoObjectFound);
    };

    let base_name = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let target = next_available_path(output_dir, base_name, ".png")?;
    composite
        .save(&target)
        .with_context(|| format!("failed to save composite to {}", target.display()))?;

    Ok(ImageOutcome::Saved(target))
}

/// Core four-stage flow on an in-memory frame. Expects the vocabulary to be
/// bound already. Returns `None` when no detection survives to the mask
/// stage — the caller reports that and writes nothing.
pub fn remove_background<D, S>(
    detector: &mut D,
    segmenter: &mut S,
    config: &RunConfig,
    frame: &RgbImage,
) -> Result<Option<RgbaImage>>
where
    D: ObjectDetector,
    S: BoxSegmenter,
{
    let detections = detector.detect(frame, config.confidence_threshold)?;
    if detections.is_empty() {
        return Ok(None);
    }

    let detections = detection::suppress(detections, config.iou_threshold, config.class_agnostic_nms);
    for det in &detections {
        tracing::debug!(
            "{}: {:.1}% at ({:.0}, {:.0})-({:.0}, {:.0})",
            det.label,
            det.confidence * 100.0,
            det.bbox.x1,
            det.bbox.y1,
            det.bbox.x2,
            det.bbox.y2
        );
    }

    let boxes: Vec<_> = detections.iter().map(|d| d.bbox).collect();
    let masks = segmenter.segment(frame, &boxes)?;

    let Some(combined) = compositing::combined_mask(&masks) else {
        return Ok(None);
    };
    if combined.is_empty() {
        return Ok(None);
    }
    tracing::debug!("Combined mask covers {} pixels", combined.pixel_count());

    Ok(Some(compositing::apply_transparency(
        frame,
        &combined,
        config.background_alpha,
    )))
}
