mod file;

pub use file::{VideoFileSink, VideoFileSource};

use anyhow::Result;
use image::RgbImage;

/// Trait for streaming video frame sources.
pub trait FrameSource {
    /// Decode the next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Resolution of decoded frames.
    fn resolution(&self) -> (u32, u32);

    /// Source frame rate.
    fn fps(&self) -> f64;

    /// Total frame count when the container reports one.
    fn frame_count(&self) -> Option<u64>;
}

/// Trait for video frame sinks.
///
/// Implementations release the underlying encoder when dropped, so the
/// output stays a valid, playable video up to the last written frame on
/// every exit path.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;
}
