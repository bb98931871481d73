//! Mask merging and output-frame compositing.

use crate::segmentation::Mask;
use image::{Rgb, RgbImage, Rgba, RgbaImage};

/// Background color substituted outside the mask in video frames.
pub const CHROMA_GREEN: Rgb<u8> = Rgb([0, 255, 0]);

/// Merge instance masks into one foreground mask with a logical OR fold.
/// Returns `None` for an empty mask list.
pub fn combined_mask(masks: &[Mask]) -> Option<Mask> {
    let mut iter = masks.iter();
    let first = iter.next()?.clone();
    Some(iter.fold(first, |mut acc, mask| {
        acc.or_assign(mask);
        acc
    }))
}

/// Transparent composite for still images.
///
/// The frame is copied into an RGBA buffer at full opacity, then split into
/// a foreground layer (pixels inside the mask, zero elsewhere) and a
/// background layer (pixels outside, zero elsewhere) which are blended as
/// `alpha * foreground + (1 - alpha) * background` per channel. At
/// `alpha = 1.0` this is a hard cut: pixels inside the mask keep their
/// original color with alpha 255, pixels outside become fully transparent.
pub fn apply_transparency(frame: &RgbImage, mask: &Mask, alpha: f32) -> RgbaImage {
    let (width, height) = frame.dimensions();
    debug_assert_eq!(mask.dimensions(), (width, height));

    RgbaImage::from_fn(width, height, |x, y| {
        let Rgb([r, g, b]) = *frame.get_pixel(x, y);
        let weight = if mask.get(x, y) { alpha } else { 1.0 - alpha };
        let blend = |c: u8| (c as f32 * weight).round().clamp(0.0, 255.0) as u8;
        Rgba([blend(r), blend(g), blend(b), blend(255)])
    })
}

/// Chroma substitution for video frames: pixels outside the mask become the
/// key color, pixels inside keep their original color. Returns a new buffer;
/// the input frame is left untouched.
pub fn apply_chroma(frame: &RgbImage, mask: &Mask) -> RgbImage {
    let (width, height) = frame.dimensions();
    debug_assert_eq!(mask.dimensions(), (width, height));

    RgbImage::from_fn(width, height, |x, y| {
        if mask.get(x, y) {
            *frame.get_pixel(x, y)
        } else {
            CHROMA_GREEN
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_mask(width: u32, height: u32, x1: u32, y1: u32, x2: u32, y2: u32) -> Mask {
        let mut data = vec![false; (width * height) as usize];
        for y in y1..y2 {
            for x in x1..x2 {
                data[(y * width + x) as usize] = true;
            }
        }
        Mask::new(width, height, data)
    }

    fn gradient_frame(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 10) as u8, (y * 10) as u8, 200])
        })
    }

    #[test]
    fn combined_mask_is_pixelwise_or() {
        let a = rect_mask(4, 4, 0, 0, 2, 2);
        let b = rect_mask(4, 4, 2, 2, 4, 4);
        let combined = combined_mask(&[a.clone(), b.clone()]).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(combined.get(x, y), a.get(x, y) || b.get(x, y));
            }
        }
    }

    #[test]
    fn combined_mask_of_nothing_is_none() {
        assert!(combined_mask(&[]).is_none());
    }

    #[test]
    fn hard_cut_keeps_foreground_and_clears_background() {
        let frame = gradient_frame(4, 4);
        let mask = rect_mask(4, 4, 1, 1, 3, 3);
        let composite = apply_transparency(&frame, &mask, 1.0);

        assert_eq!(composite.dimensions(), frame.dimensions());
        for y in 0..4 {
            for x in 0..4 {
                let Rgb([r, g, b]) = *frame.get_pixel(x, y);
                let pixel = composite.get_pixel(x, y);
                if mask.get(x, y) {
                    assert_eq!(pixel.0, [r, g, b, 255]);
                } else {
                    assert_eq!(pixel.0, [0, 0, 0, 0]);
                }
            }
        }
    }

    #[test]
    fn partial_alpha_fades_both_layers() {
        let frame = RgbImage::from_pixel(2, 1, Rgb([100, 200, 40]));
        let mask = rect_mask(2, 1, 0, 0, 1, 1);
        let composite = apply_transparency(&frame, &mask, 0.75);

        // Inside: 0.75 * value; outside: 0.25 * value.
        assert_eq!(composite.get_pixel(0, 0).0, [75, 150, 30, 191]);
        assert_eq!(composite.get_pixel(1, 0).0, [25, 50, 10, 64]);
    }

    #[test]
    fn chroma_substitutes_exactly_outside_the_mask() {
        let frame = gradient_frame(4, 4);
        let mask = rect_mask(4, 4, 0, 0, 2, 4);
        let keyed = apply_chroma(&frame, &mask);

        assert_eq!(keyed.dimensions(), frame.dimensions());
        for y in 0..4 {
            for x in 0..4 {
                if mask.get(x, y) {
                    assert_eq!(keyed.get_pixel(x, y), frame.get_pixel(x, y));
                } else {
                    assert_eq!(*keyed.get_pixel(x, y), CHROMA_GREEN);
                }
            }
        }
    }

    #[test]
    fn chroma_leaves_the_input_frame_untouched() {
        let frame = gradient_frame(3, 3);
        let before = frame.clone();
        let _ = apply_chroma(&frame, &rect_mask(3, 3, 0, 0, 1, 1));
        assert_eq!(frame, before);
    }
}
