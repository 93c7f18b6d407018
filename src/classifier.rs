//! Classifier gateway.
//!
//! The trained model is an opaque capability: built once, then asked for one
//! label per feature vector. Everything the engine knows about it is the
//! [`ActivityClassifier`] trait. Failures are always surfaced as
//! [`InferenceError`]; no label is ever substituted.
//!
//! The bundled model is copied into a writable cache directory before loading
//! (see [`ModelAsset`]). With the `onnx` feature, [`OnnxClassifier`] runs the
//! cached model through ONNX Runtime.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::InferenceError;
use crate::types::{ActivityLabel, FeatureVector};

/// A model that maps one feature vector to one activity label.
///
/// Implementations must be callable from a blocking worker thread.
pub trait ActivityClassifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<ActivityLabel, InferenceError>;
}

impl<F> ActivityClassifier for F
where
    F: Fn(&FeatureVector) -> Result<ActivityLabel, InferenceError> + Send + Sync,
{
    fn predict(&self, features: &FeatureVector) -> Result<ActivityLabel, InferenceError> {
        self(features)
    }
}

/// Reads a label from raw model output.
///
/// The model emits a tensor of integer labels; only the first element is used.
pub fn label_from_output(output: &[i64]) -> Result<ActivityLabel, InferenceError> {
    let first = output
        .first()
        .ok_or_else(|| InferenceError::malformed("empty output tensor"))?;
    ActivityLabel::try_from(*first)
}

/// A model file shipped with the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAsset {
    pub asset_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub name: String,
}

impl ModelAsset {
    pub fn new(asset_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            cache_dir: cache_dir.into(),
            name: name.into(),
        }
    }

    /// Location of the cached copy.
    pub fn cached_path(&self) -> PathBuf {
        self.cache_dir.join(&self.name)
    }

    /// Returns the cached model path, copying the bundled asset first if the
    /// cache does not hold it yet. An existing cached copy is never
    /// overwritten.
    pub fn resolve(&self) -> Result<PathBuf, InferenceError> {
        let cached = self.cached_path();
        if cached.exists() {
            debug!(path = ?cached, "model already cached");
            return Ok(cached);
        }

        let source = self.asset_dir.join(&self.name);
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| {
            InferenceError::model_load(format!("cannot create cache dir {:?}: {}", self.cache_dir, e))
        })?;
        std::fs::copy(&source, &cached).map_err(|e| {
            InferenceError::model_load(format!("cannot cache asset {:?}: {}", source, e))
        })?;

        info!(from = ?source, to = ?cached, "cached model asset");
        Ok(cached)
    }
}

/// Checks that a model path exists before handing it to a runtime.
pub fn ensure_model_file(path: &Path) -> Result<(), InferenceError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(InferenceError::model_load(format!("model file {:?} not found", path)))
    }
}

#[cfg(feature = "onnx")]
pub use self::onnx::OnnxClassifier;

#[cfg(feature = "onnx")]
mod onnx {
    use std::path::Path;
    use std::sync::Mutex;

    use ort::session::Session;
    use ort::value::Tensor;
    use tracing::info;

    use super::{ensure_model_file, label_from_output, ActivityClassifier, ModelAsset};
    use crate::error::InferenceError;
    use crate::types::{ActivityLabel, FeatureVector, FEATURE_COUNT};

    /// ONNX Runtime session over a `[1, 22] f32 -> [1] i64` model.
    pub struct OnnxClassifier {
        session: Mutex<Session>,
        input_name: String,
    }

    impl std::fmt::Debug for OnnxClassifier {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("OnnxClassifier")
                .field("input_name", &self.input_name)
                .finish()
        }
    }

    impl OnnxClassifier {
        /// Builds a session from a model file.
        pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InferenceError> {
            let path = path.as_ref();
            ensure_model_file(path)?;
            info!(?path, "loading ONNX model");

            let session = Session::builder()
                .map_err(|e| InferenceError::model_load(format!("failed to create session builder: {}", e)))?
                .commit_from_file(path)
                .map_err(|e| InferenceError::model_load(format!("failed to load model: {}", e)))?;

            let input_name = session
                .inputs
                .first()
                .map(|input| input.name.clone())
                .ok_or_else(|| InferenceError::model_load("model declares no inputs"))?;

            info!(input = %input_name, "ONNX model loaded");
            Ok(Self {
                session: Mutex::new(session),
                input_name,
            })
        }

        /// Resolves the bundled asset through the cache and loads it.
        pub fn from_asset(asset: &ModelAsset) -> Result<Self, InferenceError> {
            let path = asset.resolve()?;
            Self::from_file(path)
        }
    }

    impl ActivityClassifier for OnnxClassifier {
        fn predict(&self, features: &FeatureVector) -> Result<ActivityLabel, InferenceError> {
            let shape = vec![1i64, FEATURE_COUNT as i64];
            let tensor = Tensor::from_array((shape, features.as_slice().to_vec()))
                .map_err(|e| InferenceError::runtime(format!("failed to create input tensor: {}", e)))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| InferenceError::runtime("session lock poisoned"))?;

            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => tensor])
                .map_err(|e| InferenceError::runtime(e.to_string()))?;

            if outputs.len() == 0 {
                return Err(InferenceError::malformed("model produced no outputs"));
            }
            let (_, labels) = outputs[0]
                .try_extract_tensor::<i64>()
                .map_err(|e| InferenceError::malformed(e.to_string()))?;

            label_from_output(labels)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_output() {
        assert_eq!(label_from_output(&[2]).unwrap(), ActivityLabel::Running);
        assert_eq!(label_from_output(&[1, 0]).unwrap(), ActivityLabel::Walking);
        assert!(matches!(
            label_from_output(&[]),
            Err(InferenceError::MalformedOutput(_))
        ));
        assert_eq!(label_from_output(&[9]), Err(InferenceError::InvalidLabel(9)));
    }

    #[test]
    fn test_closure_classifier() {
        let classifier = |f: &FeatureVector| -> Result<ActivityLabel, InferenceError> {
            if f[FeatureVector::VARIANCE + 3] > 1.0 {
                Ok(ActivityLabel::Running)
            } else {
                Ok(ActivityLabel::Other)
            }
        };
        let quiet = FeatureVector::new([0.0; 22]);
        assert_eq!(classifier.predict(&quiet).unwrap(), ActivityLabel::Other);
    }

    #[test]
    fn test_asset_resolve_copies_once() {
        let assets = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        std::fs::write(assets.path().join("model.onnx"), b"v1").unwrap();

        let asset = ModelAsset::new(assets.path(), cache.path().join("models"), "model.onnx");
        let cached = asset.resolve().unwrap();
        assert_eq!(cached, cache.path().join("models").join("model.onnx"));
        assert_eq!(std::fs::read(&cached).unwrap(), b"v1");

        // A newer bundled asset does not replace the cached copy.
        std::fs::write(assets.path().join("model.onnx"), b"v2").unwrap();
        let again = asset.resolve().unwrap();
        assert_eq!(std::fs::read(again).unwrap(), b"v1");
    }

    #[test]
    fn test_asset_resolve_missing_source() {
        let assets = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        let asset = ModelAsset::new(assets.path(), cache.path(), "missing.onnx");
        assert!(matches!(asset.resolve(), Err(InferenceError::ModelLoad(_))));
    }

    #[test]
    fn test_ensure_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.onnx");
        assert!(ensure_model_file(&path).is_err());
        std::fs::write(&path, b"x").unwrap();
        assert!(ensure_model_file(&path).is_ok());
    }
}
