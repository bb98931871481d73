use super::{BBox, Detection, ObjectDetector};
use crate::config::Device;
use anyhow::{bail, Context, Result};
use image::{imageops, RgbImage};
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

/// Model input size (square).
const INPUT_SIZE: u32 = 640;

/// Open-vocabulary detector backed by a YOLO-World ONNX export.
///
/// The export carries its vocabulary in the class-score rows of the output
/// tensor, one row per category in the order the categories were set at
/// export time. `bind_vocabulary` therefore records the labels for decoding,
/// and `detect` checks the label count against the model output head.
pub struct YoloWorldDetector {
    session: Session,
    vocabulary: Vec<String>,
}

impl YoloWorldDetector {
    /// Load a YOLO-World ONNX export from `model_path`.
    pub fn new<P: AsRef<Path>>(model_path: P, device: Device) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading detector model from {}", path.display());

        let session = Session::builder()
            .context("failed to create detector session builder")?
            .with_execution_providers(device.execution_providers())
            .context("failed to register execution providers")?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)
            .with_context(|| format!("failed to load detector model from {}", path.display()))?;

        tracing::info!("Detector model loaded");

        Ok(Self {
            session,
            vocabulary: Vec::new(),
        })
    }

    /// Resize the frame to the model input size and convert it to a
    /// normalized NCHW tensor with shape [1, 3, 640, 640].
    fn preprocess(frame: &RgbImage) -> Array4<f32> {
        let resized = if frame.dimensions() != (INPUT_SIZE, INPUT_SIZE) {
            imageops::resize(frame, INPUT_SIZE, INPUT_SIZE, imageops::FilterType::Lanczos3)
        } else {
            frame.clone()
        };

        let mut tensor = Array4::<f32>::zeros((1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            tensor[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            tensor[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            tensor[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }
        tensor
    }
}

impl ObjectDetector for YoloWorldDetector {
    fn bind_vocabulary(&mut self, categories: &[String]) -> Result<()> {
        if categories.is_empty() {
            bail!("cannot bind an empty vocabulary");
        }
        tracing::debug!("Binding vocabulary: {}", categories.join(", "));
        self.vocabulary = categories.to_vec();
        Ok(())
    }

    fn detect(&mut self, frame: &RgbImage, confidence_threshold: f32) -> Result<Vec<Detection>> {
        if self.vocabulary.is_empty() {
            bail!("no vocabulary bound; call bind_vocabulary before detect");
        }

        let (frame_width, frame_height) = frame.dimensions();
        let input = Tensor::from_array(Self::preprocess(frame))
            .context("failed to build detector input tensor")?;

        let outputs = self
            .session
            .run(ort::inputs!["images" => input])
            .context("detector inference failed")?;

        let (shape, data) = outputs["output0"]
            .try_extract_tensor::<f32>()
            .context("failed to extract detector output tensor")?;

        // Output layout: [1, 4 + num_classes, num_proposals], with each
        // attribute row stored contiguously across proposals.
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        if dims.len() != 3 || dims[1] <= 4 {
            bail!("unexpected detector output shape {dims:?}");
        }
        let num_classes = dims[1] - 4;
        let num_proposals = dims[2];
        if num_classes != self.vocabulary.len() {
            bail!(
                "model was exported with {num_classes} categories but {} were bound; \
                 re-export the model with the requested vocabulary",
                self.vocabulary.len()
            );
        }

        let scale_x = frame_width as f32 / INPUT_SIZE as f32;
        let scale_y = frame_height as f32 / INPUT_SIZE as f32;

        let mut detections = Vec::new();
        for i in 0..num_proposals {
            let mut class_id = 0usize;
            let mut score = 0f32;
            for c in 0..num_classes {
                let s = data[(4 + c) * num_proposals + i];
                if s > score {
                    score = s;
                    class_id = c;
                }
            }
            if score < confidence_threshold {
                continue;
            }

            // Convert (cx, cy, w, h) in model space to corner coordinates in
            // frame space, clamped to the frame.
            let cx = data[i];
            let cy = data[num_proposals + i];
            let w = data[2 * num_proposals + i];
            let h = data[3 * num_proposals + i];

            detections.push(Detection {
                bbox: BBox {
                    x1: ((cx - w / 2.0) * scale_x).max(0.0),
                    y1: ((cy - h / 2.0) * scale_y).max(0.0),
                    x2: ((cx + w / 2.0) * scale_x).min(frame_width as f32),
                    y2: ((cy + h / 2.0) * scale_y).min(frame_height as f32),
                },
                confidence: score,
                class_id,
                label: self.vocabulary[class_id].clone(),
            });
        }

        tracing::debug!("{} proposals above threshold", detections.len());
        Ok(detections)
    }
}
