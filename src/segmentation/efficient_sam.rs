use super::{BoxSegmenter, Mask};
use crate::config::Device;
use crate::detection::BBox;
use anyhow::{bail, Context, Result};
use image::{imageops, GrayImage, Luma, RgbImage};
use ndarray::{Array3, Array4};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

/// Logit threshold separating foreground from background.
const MASK_THRESHOLD: f32 = 0.0;

/// Box-prompted segmenter backed by an EfficientSAM ONNX export.
///
/// The model takes the full-resolution frame plus a spatial prompt and
/// returns mask logits. A bounding box is prompted as its two corner points
/// with the corner labels the model was trained on (2 for top-left, 3 for
/// bottom-right).
pub struct EfficientSamSegmenter {
    session: Session,
}

impl EfficientSamSegmenter {
    /// Load an EfficientSAM ONNX export from `model_path`.
    pub fn new<P: AsRef<Path>>(model_path: P, device: Device) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading segmenter model from {}", path.display());

        let session = Session::builder()
            .context("failed to create segmenter session builder")?
            .with_execution_providers(device.execution_providers())
            .context("failed to register execution providers")?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)
            .with_context(|| format!("failed to load segmenter model from {}", path.display()))?;

        tracing::info!("Segmenter model loaded");

        Ok(Self { session })
    }

    /// Convert the frame to a normalized NCHW tensor at full resolution.
    fn image_tensor(frame: &RgbImage) -> Array4<f32> {
        let (width, height) = frame.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
        for (x, y, pixel) in frame.enumerate_pixels() {
            tensor[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            tensor[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            tensor[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }
        tensor
    }
}

impl BoxSegmenter for EfficientSamSegmenter {
    fn segment(&mut self, frame: &RgbImage, boxes: &[BBox]) -> Result<Vec<Mask>> {
        let (frame_width, frame_height) = frame.dimensions();
        let image_tensor = Self::image_tensor(frame);

        let mut masks = Vec::with_capacity(boxes.len());
        for bbox in boxes {
            let _span = tracing::debug_span!("segment_box").entered();

            let coords = Array4::from_shape_vec(
                (1, 1, 2, 2),
                vec![
                    bbox.x1.clamp(0.0, frame_width as f32),
                    bbox.y1.clamp(0.0, frame_height as f32),
                    bbox.x2.clamp(0.0, frame_width as f32),
                    bbox.y2.clamp(0.0, frame_height as f32),
                ],
            )
            .context("failed to shape prompt coordinates")?;
            let labels = Array3::from_shape_vec((1, 1, 2), vec![2.0f32, 3.0])
                .context("failed to shape prompt labels")?;

            // The session consumes its inputs, so the image tensor is
            // rebuilt per box from the shared array.
            let outputs = self
                .session
                .run(ort::inputs![
                    "batched_images" => Tensor::from_array(image_tensor.clone())?,
                    "batched_point_coords" => Tensor::from_array(coords)?,
                    "batched_point_labels" => Tensor::from_array(labels)?,
                ])
                .context("segmenter inference failed")?;

            let (shape, logits) = outputs["output_masks"]
                .try_extract_tensor::<f32>()
                .context("failed to extract segmenter output tensor")?;

            // Output layout: [1, queries, candidates, H, W]. Candidates are
            // ranked by predicted quality, so the first plane is taken.
            let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
            if dims.len() != 5 {
                bail!("unexpected segmenter output shape {dims:?}");
            }
            let (mask_height, mask_width) = (dims[3], dims[4]);
            let plane = &logits[..mask_width * mask_height];

            masks.push(binarize(
                plane,
                mask_width as u32,
                mask_height as u32,
                frame_width,
                frame_height,
            ));
        }

        Ok(masks)
    }
}

/// Threshold a logit plane into a binary mask at the frame resolution,
/// resizing when the model emitted a different size.
fn binarize(
    logits: &[f32],
    mask_width: u32,
    mask_height: u32,
    frame_width: u32,
    frame_height: u32,
) -> Mask {
    if (mask_width, mask_height) == (frame_width, frame_height) {
        let data = logits.iter().map(|&v| v > MASK_THRESHOLD).collect();
        return Mask::new(frame_width, frame_height, data);
    }

    let gray = GrayImage::from_fn(mask_width, mask_height, |x, y| {
        let idx = (y * mask_width + x) as usize;
        Luma([if logits[idx] > MASK_THRESHOLD { 255u8 } else { 0 }])
    });
    let resized = imageops::resize(&gray, frame_width, frame_height, imageops::FilterType::Nearest);
    let data = resized.pixels().map(|p| p[0] > 127).collect();
    Mask::new(frame_width, frame_height, data)
}
