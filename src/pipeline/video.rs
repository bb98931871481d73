//! Frame-streaming green-screen flow.

use crate::compositing;
use crate::config::RunConfig;
use crate::detection::{self, ObjectDetector};
use crate::paths::next_available_path;
use crate::segmentation::BoxSegmenter;
use crate::video::{FrameSink, FrameSource, VideoFileSink, VideoFileSource};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Where green-screen videos are written.
pub const VIDEO_OUTPUT_DIR: &str = "outputVideos";

/// Suffix distinguishing generated videos from their sources.
const TARGET_TAG: &str = "GreenScreen";

/// Progress log cadence in frames.
const LOG_INTERVAL: u64 = 30;

/// Open the video at `input_path`, generate a collision-safe target path
/// under `output_dir` and stream the chroma-keyed frames into it. Returns
/// the target path. The sink is finalized on every exit path, so the output
/// is playable up to the last written frame even if a mid-stream frame
/// fails.
pub fn process_video_file<D, S>(
    detector: &mut D,
    segmenter: &mut S,
    config: &RunConfig,
    input_path: &Path,
    output_dir: &Path,
) -> Result<PathBuf>
where
    D: ObjectDetector,
    S: BoxSegmenter,
{
    let mut source = VideoFileSource::open(input_path)?;

    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video");
    let extension = input_path
        .extension()
        .and_then(|s| s.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_else(|| ".mp4".to_string());
    let target = next_available_path(output_dir, &format!("{stem}{TARGET_TAG}"), &extension)?;

    let (width, height) = source.resolution();
    let mut sink = VideoFileSink::create(&target, width, height, source.fps())?;

    process_video(detector, segmenter, config, &mut source, &mut sink)?;
    Ok(target)
}

/// Per-frame detect → suppress → segment → chroma-composite loop.
///
/// Frames with no surviving detections are written through unchanged, so
/// the sink receives exactly one frame per source frame and the output
/// keeps the source frame count and timing. The vocabulary is bound once
/// before the loop. Returns the number of frames written.
pub fn process_video<D, S, Src, Snk>(
    detector: &mut D,
    segmenter: &mut S,
    config: &RunConfig,
    source: &mut Src,
    sink: &mut Snk,
) -> Result<u64>
where
    D: ObjectDetector,
    S: BoxSegmenter,
    Src: FrameSource,
    Snk: FrameSink,
{
    detector.bind_vocabulary(&config.categories)?;

    let total = source.frame_count();
    let mut frame_count = 0u64;
    let mut total_detect_time = Duration::ZERO;
    let mut total_segment_time = Duration::ZERO;

    while let Some(frame) = source.next_frame()? {
        let detect_start = Instant::now();
        let detections = detector.detect(&frame, config.confidence_threshold)?;
        total_detect_time += detect_start.elapsed();

        let detections =
            detection::suppress(detections, config.iou_threshold, config.class_agnostic_nms);

        if detections.is_empty() {
            // Pass-through: the frame is written as it came in.
            sink.write_frame(&frame)?;
        } else {
            let segment_start = Instant::now();
            let boxes: Vec<_> = detections.iter().map(|d| d.bbox).collect();
            let masks = segmenter.segment(&frame, &boxes)?;
            total_segment_time += segment_start.elapsed();

            match compositing::combined_mask(&masks) {
                Some(combined) => sink.write_frame(&compositing::apply_chroma(&frame, &combined))?,
                None => sink.write_frame(&frame)?,
            }
        }

        frame_count += 1;
        if frame_count % LOG_INTERVAL == 0 {
            let avg_detect_ms =
                total_detect_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_segment_ms =
                total_segment_time.as_secs_f64() * 1000.0 / frame_count as f64;
            match total {
                Some(total) => tracing::info!(
                    "Frame {}/{}: detect={:.1}ms, segment={:.1}ms",
                    frame_count,
                    total,
                    avg_detect_ms,
                    avg_segment_ms
                ),
                None => tracing::info!(
                    "Frame {}: detect={:.1}ms, segment={:.1}ms",
                    frame_count,
                    avg_detect_ms,
                    avg_segment_ms
                ),
            }
        }
    }

    tracing::info!("Streamed {frame_count} frames");
    Ok(frame_count)
}
