//! Shared test doubles for the pipeline flows.

use crate::detection::{BBox, Detection, ObjectDetector};
use crate::segmentation::{BoxSegmenter, Mask};
use crate::video::{FrameSink, FrameSource};
use anyhow::Result;
use image::RgbImage;
use std::collections::VecDeque;

/// Detector returning scripted detection sets, one per `detect` call, then
/// empty sets once the script runs out.
pub struct StubDetector {
    script: VecDeque<Vec<Detection>>,
    pub bound: Vec<String>,
    pub bind_calls: usize,
}

impl StubDetector {
    pub fn new(script: Vec<Vec<Detection>>) -> Self {
        Self {
            script: script.into(),
            bound: Vec::new(),
            bind_calls: 0,
        }
    }
}

impl ObjectDetector for StubDetector {
    fn bind_vocabulary(&mut self, categories: &[String]) -> Result<()> {
        self.bound = categories.to_vec();
        self.bind_calls += 1;
        Ok(())
    }

    fn detect(&mut self, _frame: &RgbImage, _confidence_threshold: f32) -> Result<Vec<Detection>> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

/// Segmenter filling each box's interior with foreground, or producing
/// all-background masks when constructed with `empty_masks`.
#[derive(Default)]
pub struct StubSegmenter {
    pub calls: usize,
    empty: bool,
}

impl StubSegmenter {
    pub fn empty_masks() -> Self {
        Self { calls: 0, empty: true }
    }
}

impl BoxSegmenter for StubSegmenter {
    fn segment(&mut self, frame: &RgbImage, boxes: &[BBox]) -> Result<Vec<Mask>> {
        self.calls += 1;
        let (width, height) = frame.dimensions();
        Ok(boxes
            .iter()
            .map(|bbox| {
                let mut data = vec![false; (width * height) as usize];
                if !self.empty {
                    let x1 = bbox.x1.max(0.0) as u32;
                    let y1 = bbox.y1.max(0.0) as u32;
                    let x2 = (bbox.x2 as u32).min(width);
                    let y2 = (bbox.y2 as u32).min(height);
                    for y in y1..y2 {
                        for x in x1..x2 {
                            data[(y * width + x) as usize] = true;
                        }
                    }
                }
                Mask::new(width, height, data)
            })
            .collect())
    }
}

/// In-memory frame source over a fixed frame list.
pub struct MemorySource {
    frames: VecDeque<RgbImage>,
    width: u32,
    height: u32,
    total: u64,
}

impl MemorySource {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| f.dimensions())
            .unwrap_or((0, 0));
        let total = frames.len() as u64;
        Self {
            frames: frames.into(),
            width,
            height,
            total,
        }
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.pop_front())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fps(&self) -> f64 {
        30.0
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.total)
    }
}

/// In-memory frame sink collecting everything written to it.
#[derive(Default)]
pub struct MemorySink {
    pub frames: Vec<RgbImage>,
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}
