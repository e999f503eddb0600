//! The `FaceSource` implementation: validated image loading plus a
//! detection-resolution escalation cascade.
//!
//! Fidelity levels map to ordered strategy lists tried until one yields a
//! face. Standard stays cheap for the bulk photo scan; precise trades
//! latency for recall and serves selfies, rechecks, and bootstrap
//! re-extraction.

use crate::detector::FaceDetector;
use crate::recognizer::FaceRecognizer;
use facesort_core::{ExtractError, ExtractOutcome, ExtractedFace, FaceSource, Fidelity};
use image::RgbImage;
use std::path::Path;
use thiserror::Error;

const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;
const MIN_IMAGE_DIMENSION: u32 = 50;

/// Relative expense of one detection attempt, for logs and tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostClass {
    Cheap,
    Moderate,
    Expensive,
    Heavy,
}

/// One rung of the escalation ladder: a detection resolution and its cost.
#[derive(Debug, Clone, Copy)]
pub struct DetectionStrategy {
    pub input_size: u32,
    pub cost: CostClass,
}

/// Cheap scan first; one escalation recovers small or blurry faces.
const STANDARD_CASCADE: [DetectionStrategy; 2] = [
    DetectionStrategy { input_size: 640, cost: CostClass::Cheap },
    DetectionStrategy { input_size: 960, cost: CostClass::Moderate },
];

/// High-recall pass for selfies, rechecks, and refinement samples.
const PRECISE_CASCADE: [DetectionStrategy; 2] = [
    DetectionStrategy { input_size: 1280, cost: CostClass::Expensive },
    DetectionStrategy { input_size: 1920, cost: CostClass::Heavy },
];

fn cascade(fidelity: Fidelity) -> &'static [DetectionStrategy] {
    match fidelity {
        Fidelity::Standard => &STANDARD_CASCADE,
        Fidelity::Precise => &PRECISE_CASCADE,
    }
}

#[derive(Error, Debug)]
pub enum ExtractorLoadError {
    #[error("detector: {0}")]
    Detector(#[from] crate::detector::DetectorError),
    #[error("recognizer: {0}")]
    Recognizer(#[from] crate::recognizer::RecognizerError),
}

/// ONNX-backed embedding provider: SCRFD detection + ArcFace embedding.
pub struct OnnxFaceSource {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl OnnxFaceSource {
    /// Load both models from a model directory (fail-fast at startup).
    pub fn load(model_dir: &Path) -> Result<Self, ExtractorLoadError> {
        let detector = FaceDetector::load(&crate::detector_model_path(model_dir))?;
        let recognizer = FaceRecognizer::load(&crate::recognizer_model_path(model_dir))?;
        Ok(Self {
            detector,
            recognizer,
        })
    }
}

impl FaceSource for OnnxFaceSource {
    fn extract(
        &mut self,
        image: &Path,
        fidelity: Fidelity,
    ) -> Result<ExtractOutcome, ExtractError> {
        let photo = load_validated(image)?;
        let (width, height) = photo.dimensions();

        let mut detections = Vec::new();
        for strategy in cascade(fidelity) {
            detections = self
                .detector
                .detect(&photo, strategy.input_size)
                .map_err(|e| ExtractError::InferenceFailed {
                    path: image.display().to_string(),
                    reason: e.to_string(),
                })?;
            if !detections.is_empty() {
                tracing::debug!(
                    image = %image.display(),
                    faces = detections.len(),
                    input_size = strategy.input_size,
                    cost = ?strategy.cost,
                    "detection succeeded"
                );
                break;
            }
            tracing::debug!(
                image = %image.display(),
                input_size = strategy.input_size,
                cost = ?strategy.cost,
                "no faces, escalating"
            );
        }

        let mut faces = Vec::with_capacity(detections.len());
        for bbox in detections {
            if bbox.landmarks.is_none() {
                tracing::warn!(image = %image.display(), "detection without landmarks skipped");
                continue;
            }
            let embedding =
                self.recognizer
                    .extract(&photo, &bbox)
                    .map_err(|e| ExtractError::InferenceFailed {
                        path: image.display().to_string(),
                        reason: e.to_string(),
                    })?;
            faces.push(ExtractedFace {
                embedding,
                bbox: Some(bbox),
            });
        }

        Ok(ExtractOutcome {
            faces,
            width,
            height,
        })
    }
}

/// Load an image file, enforcing the input-defect limits before decoding.
fn load_validated(path: &Path) -> Result<RgbImage, ExtractError> {
    let display = || path.display().to_string();

    let meta = std::fs::metadata(path).map_err(|_| ExtractError::FileNotFound(display()))?;
    if meta.len() == 0 {
        return Err(ExtractError::EmptyFile(display()));
    }
    if meta.len() > MAX_FILE_BYTES {
        return Err(ExtractError::FileTooLarge {
            path: display(),
            size_mb: meta.len() as f64 / (1024.0 * 1024.0),
        });
    }

    let decoded = image::open(path).map_err(|e| ExtractError::DecodeFailed {
        path: display(),
        reason: e.to_string(),
    })?;
    let photo = decoded.to_rgb8();

    let (width, height) = photo.dimensions();
    if width < MIN_IMAGE_DIMENSION || height < MIN_IMAGE_DIMENSION {
        return Err(ExtractError::ImageTooSmall {
            path: display(),
            width,
            height,
        });
    }

    Ok(photo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_cascade_orders_by_cost() {
        let standard = cascade(Fidelity::Standard);
        let precise = cascade(Fidelity::Precise);
        assert!(standard[0].input_size < standard[1].input_size);
        assert!(precise[0].input_size < precise[1].input_size);
        // The precise ladder starts above the standard one.
        assert!(precise[0].input_size > standard[1].input_size);
        assert_eq!(standard[0].cost, CostClass::Cheap);
        assert_eq!(precise[0].cost, CostClass::Expensive);
    }

    #[test]
    fn test_load_validated_missing_file() {
        let err = load_validated(Path::new("/nonexistent/p.jpg")).unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound(_)));
    }

    #[test]
    fn test_load_validated_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.jpg");
        std::fs::File::create(&path).unwrap();
        let err = load_validated(&path).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyFile(_)));
    }

    #[test]
    fn test_load_validated_rejects_garbage_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.jpg");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"not an image at all").unwrap();
        let err = load_validated(&path).unwrap_err();
        assert!(matches!(err, ExtractError::DecodeFailed { .. }));
    }

    #[test]
    fn test_load_validated_rejects_tiny_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        RgbImage::new(20, 20).save(&path).unwrap();
        let err = load_validated(&path).unwrap_err();
        assert!(matches!(err, ExtractError::ImageTooSmall { width: 20, height: 20, .. }));
    }

    #[test]
    fn test_load_validated_accepts_normal_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.png");
        RgbImage::from_pixel(64, 64, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();
        let photo = load_validated(&path).unwrap();
        assert_eq!(photo.dimensions(), (64, 64));
    }
}
