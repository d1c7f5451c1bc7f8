use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::{ModelLoadError, PredictError};
use crate::features::{FeatureVector, FEATURE_NAMES};

/// On-disk artifact: the training pipeline exports its fitted regressor as
/// JSON holding the feature-name list plus linear-in-features parameters.
#[derive(Deserialize)]
struct ArtifactJson {
    features: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
}

/// Opaque wrapper around the pre-trained regressor. From the pipeline's
/// perspective this is vector-in, scalar-out; the parameters inside are not
/// interpreted anywhere else.
pub struct Model {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl Model {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path).map_err(|source| ModelLoadError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&txt)
    }

    /// Parse and validate an artifact. The feature list must match
    /// [`FEATURE_NAMES`] exactly, names and order both; a drifted artifact is
    /// rejected here rather than silently mis-mapping columns at predict time.
    pub fn from_json(txt: &str) -> Result<Self, ModelLoadError> {
        let art: ArtifactJson = serde_json::from_str(txt)?;

        if art.features.len() != FEATURE_NAMES.len() {
            return Err(ModelLoadError::Schema(format!(
                "artifact has {} features, expected {}",
                art.features.len(),
                FEATURE_NAMES.len()
            )));
        }
        for (i, (got, want)) in art.features.iter().zip(FEATURE_NAMES).enumerate() {
            if got.as_str() != want {
                return Err(ModelLoadError::Schema(format!(
                    "feature {i} is {got:?}, expected {want:?}"
                )));
            }
        }
        if art.coefficients.len() != art.features.len() {
            return Err(ModelLoadError::Schema(format!(
                "{} coefficients for {} features",
                art.coefficients.len(),
                art.features.len()
            )));
        }

        Ok(Self {
            coefficients: art.coefficients,
            intercept: art.intercept,
        })
    }

    pub fn in_dim(&self) -> usize {
        self.coefficients.len()
    }

    /// Single deterministic forward pass. No retries: a local artifact has no
    /// transient failure modes, so any error is surfaced verbatim.
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, PredictError> {
        self.predict_raw(&features.to_ordered())
    }

    pub fn predict_raw(&self, x: &[f64]) -> Result<f64, PredictError> {
        if x.len() != self.coefficients.len() {
            return Err(PredictError::ModelInference(format!(
                "feature length mismatch: got {}, expected {}",
                x.len(),
                self.coefficients.len()
            )));
        }
        let y = self.intercept
            + x.iter()
                .zip(&self.coefficients)
                .map(|(xi, ci)| xi * ci)
                .sum::<f64>();
        if !y.is_finite() {
            return Err(PredictError::ModelInference(format!(
                "non-finite prediction {y}"
            )));
        }
        Ok(y)
    }
}
