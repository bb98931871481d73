use super::Detection;

/// Greedy non-max suppression.
///
/// Detections are sorted by descending confidence; each one is kept only if
/// its IoU with every previously kept detection stays below `iou_threshold`.
/// With `class_agnostic` set, every detection competes with every other;
/// otherwise only detections sharing a class compete. Deterministic for a
/// fixed input order (the sort is stable), and a no-op on empty input.
pub fn suppress(
    mut detections: Vec<Detection>,
    iou_threshold: f32,
    class_agnostic: bool,
) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let suppressed = kept.iter().any(|survivor| {
            (class_agnostic || survivor.class_id == candidate.class_id)
                && survivor.bbox.iou(&candidate.bbox) >= iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BBox;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32, class_id: usize) -> Detection {
        Detection {
            bbox: BBox { x1, y1, x2, y2 },
            confidence,
            class_id,
            label: format!("class{class_id}"),
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(suppress(Vec::new(), 0.5, true).is_empty());
    }

    #[test]
    fn duplicate_of_lower_confidence_is_suppressed() {
        let detections = vec![
            det(0.0, 0.0, 10.0, 10.0, 0.9, 0),
            det(1.0, 1.0, 11.0, 11.0, 0.6, 0),
        ];
        let kept = suppress(detections, 0.4, false);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn distinct_classes_do_not_compete_unless_agnostic() {
        let detections = vec![
            det(0.0, 0.0, 10.0, 10.0, 0.9, 0),
            det(1.0, 1.0, 11.0, 11.0, 0.6, 1),
        ];
        let per_class = suppress(detections.clone(), 0.4, false);
        assert_eq!(per_class.len(), 2);

        let agnostic = suppress(detections, 0.4, true);
        assert_eq!(agnostic.len(), 1);
    }

    #[test]
    fn survivors_stay_below_threshold_pairwise() {
        let detections = vec![
            det(0.0, 0.0, 10.0, 10.0, 0.9, 0),
            det(2.0, 0.0, 12.0, 10.0, 0.8, 0),
            det(50.0, 50.0, 60.0, 60.0, 0.7, 0),
            det(4.0, 0.0, 14.0, 10.0, 0.6, 0),
        ];
        let threshold = 0.3;
        let kept = suppress(detections, threshold, true);
        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                assert!(a.bbox.iou(&b.bbox) < threshold);
            }
        }
    }

    #[test]
    fn suppression_is_idempotent() {
        let detections = vec![
            det(0.0, 0.0, 10.0, 10.0, 0.9, 0),
            det(1.0, 1.0, 11.0, 11.0, 0.8, 0),
            det(30.0, 30.0, 40.0, 40.0, 0.7, 1),
            det(31.0, 31.0, 41.0, 41.0, 0.5, 1),
        ];
        let once = suppress(detections, 0.4, false);
        let twice = suppress(once.clone(), 0.4, false);
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(&twice) {
            assert_eq!(a.bbox, b.bbox);
            assert_eq!(a.confidence, b.confidence);
        }
    }
}
