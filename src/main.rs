mod compositing;
mod config;
mod detection;
mod media;
mod paths;
mod pipeline;
mod segmentation;
#[cfg(test)]
mod testing;
mod video;

use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{Device, RunConfig};
use detection::YoloWorldDetector;
use media::MediaKind;
use pipeline::{process_image, process_video_file, ImageOutcome, IMAGE_OUTPUT_DIR, VIDEO_OUTPUT_DIR};
use segmentation::{weights, EfficientSamSegmenter};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Remove image or video backgrounds using text prompts", long_about = None)]
struct Args {
    /// Path to the image or video file
    path: PathBuf,

    /// Comma-separated list of categories to detect
    #[arg(short, long, default_value = "person")]
    categories: String,

    /// Minimum detection confidence, between 0 and 1
    #[arg(long, default_value_t = 0.5, value_parser = parse_unit_interval)]
    confidence: f32,

    /// IoU threshold for non-max suppression, between 0 and 1
    #[arg(long, default_value_t = 0.4, value_parser = parse_unit_interval)]
    iou: f32,

    /// Run NMS across classes instead of per class
    #[arg(long)]
    class_agnostic_nms: bool,

    /// Compute device for model inference
    #[arg(long, value_enum, default_value = "auto")]
    device: Device,

    /// Path to the YOLO-World ONNX export
    #[arg(long, default_value = "models/yolov8l-world.onnx")]
    detector_model: PathBuf,

    /// Path to the EfficientSAM ONNX export; downloaded when absent
    #[arg(long, default_value = "models/efficient_sam_s.onnx")]
    segmenter_model: PathBuf,

    /// Foreground blend weight for image composites; 1 keeps a hard cut
    #[arg(long, default_value_t = 1.0, value_parser = parse_unit_interval)]
    background_alpha: f32,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn parse_unit_interval(raw: &str) -> Result<f32, String> {
    let value: f32 = raw
        .parse()
        .map_err(|_| format!("`{raw}` is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "{value} is outside the valid range; enter a value between 0 (low) and 1 (high)"
        ))
    }
}

/// Split the comma-separated category string into trimmed, non-empty labels.
fn parse_categories(raw: &str) -> Result<Vec<String>> {
    let categories: Vec<String> = raw
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if categories.is_empty() {
        bail!("category list is empty; pass at least one label via --categories");
    }
    Ok(categories)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let categories = parse_categories(&args.categories)?;

    let config = RunConfig {
        categories,
        confidence_threshold: args.confidence,
        iou_threshold: args.iou,
        class_agnostic_nms: args.class_agnostic_nms,
        device: args.device,
        background_alpha: args.background_alpha,
    };

    tracing::info!("Chromakey starting");
    tracing::info!("Input: {}", args.path.display());
    tracing::info!("Categories: {}", config.categories.join(", "));
    tracing::info!("Confidence threshold: {}", config.confidence_threshold);
    tracing::info!(
        "IoU threshold: {} (class agnostic: {})",
        config.iou_threshold,
        config.class_agnostic_nms
    );

    let kind = MediaKind::from_path(&args.path);
    if kind == MediaKind::Unsupported {
        tracing::error!(
            "{} is not a recognized image or video file; check the extension (e.g. .jpg, .mp4)",
            args.path.display()
        );
        return Ok(());
    }

    if !args.detector_model.is_file() {
        bail!(
            "detector model not found at {}; pass --detector-model",
            args.detector_model.display()
        );
    }
    weights::ensure_segmenter_weights(&args.segmenter_model)
        .context("failed to fetch segmenter weights")?;

    let mut detector = YoloWorldDetector::new(&args.detector_model, config.device)
        .context("failed to initialize detector")?;
    let mut segmenter = EfficientSamSegmenter::new(&args.segmenter_model, config.device)
        .context("failed to initialize segmenter")?;

    match kind {
        MediaKind::Image => {
            let outcome = process_image(
                &mut detector,
                &mut segmenter,
                &config,
                &args.path,
                Path::new(IMAGE_OUTPUT_DIR),
            )?;
            match outcome {
                ImageOutcome::Saved(path) => tracing::info!("Image saved as {}", path.display()),
                ImageOutcome::NoObjectFound => {
                    tracing::warn!("Unable to find the desired object in the image");
                    tracing::warn!(
                        "Tip: try a different category name, or adjust --iou and --confidence"
                    );
                }
            }
        }
        MediaKind::Video => {
            let path = process_video_file(
                &mut detector,
                &mut segmenter,
                &config,
                &args.path,
                Path::new(VIDEO_OUTPUT_DIR),
            )?;
            tracing::info!("Video saved at {}", path.display());
        }
        MediaKind::Unsupported => unreachable!("handled above"),
    }

    Ok(())
}
