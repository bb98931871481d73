mod nms;
mod yolo_world;

pub use nms::suppress;
pub use yolo_world::YoloWorldDetector;

use anyhow::Result;
use image::RgbImage;

/// Axis-aligned bounding box in pixel coordinates of the source frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// IoU (intersection over union) with another box.
    pub fn iou(&self, other: &BBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if intersection == 0.0 {
            return 0.0;
        }

        intersection / (self.area() + other.area() - intersection)
    }
}

/// One detected object instance.
#[derive(Debug, Clone)]
pub struct Detection {
    pub bbox: BBox,
    /// Detector confidence in [0, 1]
    pub confidence: f32,
    /// Index into the bound vocabulary
    pub class_id: usize,
    /// Category name the instance matched
    pub label: String,
}

/// Trait for open-vocabulary object detectors.
///
/// `bind_vocabulary` must be called before the first `detect` and again
/// whenever the category set changes; binding is cheap relative to
/// prediction, so callers processing a video bind once before the frame
/// loop. The rebind-then-detect protocol is not reentrant: neither call may
/// run concurrently with the other on the same instance.
pub trait ObjectDetector {
    /// Set the active category vocabulary.
    fn bind_vocabulary(&mut self, categories: &[String]) -> Result<()>;

    /// Detect objects matching the bound vocabulary. Returns every instance
    /// with confidence at or above `confidence_threshold`; an empty vec (not
    /// an error) when nothing matches.
    fn detect(&mut self, frame: &RgbImage, confidence_threshold: f32) -> Result<Vec<Detection>>;
}
