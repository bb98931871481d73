use super::{FrameSink, FrameSource};
use anyhow::{bail, Context, Result};
use image::RgbImage;
use opencv::core::{AlgorithmHint, Mat, Size};
use opencv::prelude::*;
use opencv::{imgproc, videoio};
use std::path::Path;

/// Frame source decoding a video file.
pub struct VideoFileSource {
    capture: videoio::VideoCapture,
    width: u32,
    height: u32,
    fps: f64,
    frame_count: Option<u64>,
}

impl VideoFileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        tracing::info!("Opening video source {}", path.display());

        let path_str = path.to_str().context("video path is not valid UTF-8")?;
        let capture = videoio::VideoCapture::from_file(path_str, videoio::CAP_ANY)
            .with_context(|| format!("failed to open video {}", path.display()))?;
        if !capture.is_opened()? {
            bail!("failed to open video {}", path.display());
        }

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        // Not every container reports its length.
        let reported = capture.get(videoio::CAP_PROP_FRAME_COUNT)?;
        let frame_count = if reported > 0.0 { Some(reported as u64) } else { None };

        tracing::info!(
            "Video source opened: {}x{} at {:.2} fps, {} frames",
            width,
            height,
            fps,
            frame_count.map_or_else(|| "unknown".to_string(), |n| n.to_string())
        );

        Ok(Self {
            capture,
            width,
            height,
            fps,
            frame_count,
        })
    }
}

impl FrameSource for VideoFileSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let mut bgr = Mat::default();
        if !self.capture.read(&mut bgr).context("failed to read frame")? || bgr.empty() {
            return Ok(None);
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color(
            &bgr,
            &mut rgb,
            imgproc::COLOR_BGR2RGB,
            0,
            AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .context("failed to convert frame to RGB")?;

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let data = rgb
            .data_bytes()
            .context("failed to access frame bytes")?
            .to_vec();

        RgbImage::from_raw(width, height, data)
            .context("decoded frame has unexpected buffer size")
            .map(Some)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_count(&self) -> Option<u64> {
        self.frame_count
    }
}

/// Frame sink encoding a video file at a fixed resolution and frame rate.
pub struct VideoFileSink {
    writer: videoio::VideoWriter,
    width: u32,
    height: u32,
}

impl VideoFileSink {
    /// Create a sink at `path`. Callers pass the source resolution and frame
    /// rate so the output matches the input stream.
    pub fn create<P: AsRef<Path>>(path: P, width: u32, height: u32, fps: f64) -> Result<Self> {
        let path = path.as_ref();

        tracing::info!(
            "Creating video sink {} ({}x{} at {:.2} fps)",
            path.display(),
            width,
            height,
            fps
        );

        let path_str = path.to_str().context("video path is not valid UTF-8")?;
        let fourcc = videoio::VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = videoio::VideoWriter::new(
            path_str,
            fourcc,
            fps,
            Size::new(width as i32, height as i32),
            true,
        )
        .with_context(|| format!("failed to create video sink {}", path.display()))?;
        if !writer.is_opened()? {
            bail!("failed to open video sink {}", path.display());
        }

        Ok(Self {
            writer,
            width,
            height,
        })
    }
}

impl FrameSink for VideoFileSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            bail!(
                "frame size {}x{} does not match sink {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            );
        }

        let rgb = Mat::from_slice(frame.as_raw()).context("failed to wrap frame bytes")?;
        let rgb = rgb
            .reshape(3, self.height as i32)
            .context("failed to reshape frame")?;

        let mut bgr = Mat::default();
        imgproc::cvt_color(
            &rgb,
            &mut bgr,
            imgproc::COLOR_RGB2BGR,
            0,
            AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .context("failed to convert frame to BGR")?;

        self.writer.write(&bgr).context("failed to encode frame")?;
        Ok(())
    }
}

impl Drop for VideoFileSink {
    fn drop(&mut self) {
        // Finalizes the container; errors on the unwind path are ignored so
        // the frames written so far stay playable.
        let _ = self.writer.release();
    }
}
