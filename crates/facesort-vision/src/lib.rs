//! facesort-vision — Face detection and embedding extraction for photo files.
//!
//! Implements the engine's `FaceSource` contract with SCRFD detection and
//! ArcFace recognition via ONNX Runtime, behind a detection-resolution
//! escalation cascade that realizes the standard/precise fidelity levels.

pub mod alignment;
pub mod detector;
pub mod extractor;
pub mod recognizer;

pub use detector::FaceDetector;
pub use extractor::OnnxFaceSource;
pub use recognizer::FaceRecognizer;

use std::path::{Path, PathBuf};

/// SCRFD detection model filename expected under the model directory.
pub const DETECTOR_MODEL_FILE: &str = "det_10g.onnx";
/// ArcFace recognition model filename expected under the model directory.
pub const RECOGNIZER_MODEL_FILE: &str = "w600k_r50.onnx";

pub fn detector_model_path(model_dir: &Path) -> PathBuf {
    model_dir.join(DETECTOR_MODEL_FILE)
}

pub fn recognizer_model_path(model_dir: &Path) -> PathBuf {
    model_dir.join(RECOGNIZER_MODEL_FILE)
}
