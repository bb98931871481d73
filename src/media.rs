//! File-type dispatch by extension.

use std::path::Path;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];
const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mkv", "mov"];

/// Pipeline selection for an input path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Unsupported,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Self {
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            return MediaKind::Unsupported;
        };
        let extension = extension.to_ascii_lowercase();

        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            MediaKind::Image
        } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            MediaKind::Video
        } else {
            MediaKind::Unsupported
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extensions_route_to_the_image_pipeline() {
        for name in ["a.jpg", "b.jpeg", "c.png", "d.bmp", "e.gif", "f.PNG"] {
            assert_eq!(MediaKind::from_path(Path::new(name)), MediaKind::Image);
        }
    }

    #[test]
    fn video_extensions_route_to_the_video_pipeline() {
        for name in ["a.mp4", "b.avi", "c.mkv", "d.mov", "e.MP4"] {
            assert_eq!(MediaKind::from_path(Path::new(name)), MediaKind::Video);
        }
    }

    #[test]
    fn anything_else_is_unsupported() {
        for name in ["a.txt", "b.onnx", "noext", "dir/.hidden"] {
            assert_eq!(MediaKind::from_path(Path::new(name)), MediaKind::Unsupported);
        }
    }
}
