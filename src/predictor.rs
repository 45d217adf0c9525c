//! Model loading and scoring
//!
//! Trained classifiers are opaque ONNX artifacts exposing per-row probability
//! scores for the positive class. The pipeline depends only on the `Scorer`
//! capability, so any backend (tree ensemble, logistic model, test stub) can
//! stand in for a session.

use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use std::path::Path;
use tracing::{info, warn};

use crate::combine::PROBABILITY_THRESHOLD;
use crate::data::FeatureMatrix;
use crate::error::PipelineError;

/// Model artifact file names expected in the models directory
pub const TOP10_MODEL_FILE: &str = "top10_classifier.onnx";
pub const DNF_MODEL_FILE: &str = "dnf_classifier.onnx";

/// Scoring capability of one trained binary classifier
pub trait Scorer: Send {
    /// Short name for logs ("top10", "dnf")
    fn name(&self) -> &str;

    /// Positive-class probability per row, in [0, 1]
    fn predict_probability(&mut self, features: &FeatureMatrix)
        -> Result<Vec<f64>, PipelineError>;

    /// Hard label per row, thresholded at 0.5
    fn predict(&mut self, features: &FeatureMatrix) -> Result<Vec<bool>, PipelineError> {
        Ok(self
            .predict_probability(features)?
            .into_iter()
            .map(|p| p > PROBABILITY_THRESHOLD)
            .collect())
    }
}

/// ONNX-backed classifier session
///
/// The model must expose one float tensor output of shape [rows, n_classes]
/// with per-class probabilities (exported with zipmap disabled).
pub struct OnnxScorer {
    name: String,
    session: Session,
}

impl OnnxScorer {
    /// Load a classifier from an ONNX file
    pub fn load<P: AsRef<Path>>(model_path: P, name: &str) -> Result<Self, PipelineError> {
        let path = model_path.as_ref();
        info!("Loading {} model: {:?}", name, path);

        let session = Session::builder()
            .and_then(|b| Ok(b.with_optimization_level(GraphOptimizationLevel::Level3)?))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| {
                PipelineError::Model(format!("failed to load {} from {:?}: {}", name, path, e))
            })?;

        Ok(Self {
            name: name.to_string(),
            session,
        })
    }
}

impl Scorer for OnnxScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_probability(
        &mut self,
        features: &FeatureMatrix,
    ) -> Result<Vec<f64>, PipelineError> {
        if features.rows == 0 {
            return Ok(Vec::new());
        }

        let input_vec: Vec<f32> = features.data.iter().map(|&x| x as f32).collect();
        let input_tensor = Tensor::from_array(([features.rows, features.cols], input_vec))
            .map_err(|e| PipelineError::Model(format!("{}: bad input tensor: {}", self.name, e)))?;

        let outputs = self
            .session
            .run(ort::inputs!["input" => input_tensor])
            .map_err(|e| PipelineError::Model(format!("{}: inference failed: {}", self.name, e)))?;

        let (_, output_data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| PipelineError::Model(format!("{}: bad output tensor: {}", self.name, e)))?;

        if output_data.len() % features.rows != 0 {
            return Err(PipelineError::Model(format!(
                "{}: output length {} does not divide {} rows",
                self.name,
                output_data.len(),
                features.rows
            )));
        }

        let classes = output_data.len() / features.rows;
        let positive_index = if classes == 1 {
            // Degenerate single-class training outcome: the sole available
            // column is the only probability we have
            warn!(
                "{} model emitted a single-class probability output",
                self.name
            );
            0
        } else {
            1
        };

        Ok((0..features.rows)
            .map(|r| output_data[r * classes + positive_index] as f64)
            .collect())
    }
}

/// The name -> model mapping for the two prediction axes
///
/// Either model may be absent; that axis is then simply skipped downstream.
/// Absence of both is fatal because there is nothing to predict with.
pub struct ModelSet {
    top10: Option<Box<dyn Scorer>>,
    dnf: Option<Box<dyn Scorer>>,
}

impl ModelSet {
    /// Load the top-10 and DNF classifiers from a models directory
    ///
    /// A missing file for one axis is a warning; both missing is an error.
    pub fn load<P: AsRef<Path>>(models_dir: P) -> Result<Self, PipelineError> {
        let dir = models_dir.as_ref();

        let top10 = Self::load_optional(&dir.join(TOP10_MODEL_FILE), "top10")?;
        let dnf = Self::load_optional(&dir.join(DNF_MODEL_FILE), "dnf")?;

        Self::from_scorers(top10, dnf)
    }

    fn load_optional(path: &Path, name: &str) -> Result<Option<Box<dyn Scorer>>, PipelineError> {
        if !path.exists() {
            warn!("{} model not found at {:?}", name, path);
            return Ok(None);
        }
        Ok(Some(Box::new(OnnxScorer::load(path, name)?)))
    }

    /// Assemble a model set from arbitrary scorers
    pub fn from_scorers(
        top10: Option<Box<dyn Scorer>>,
        dnf: Option<Box<dyn Scorer>>,
    ) -> Result<Self, PipelineError> {
        if top10.is_none() && dnf.is_none() {
            return Err(PipelineError::Model("no trained models found".to_string()));
        }
        Ok(Self { top10, dnf })
    }

    pub fn has_top10(&self) -> bool {
        self.top10.is_some()
    }

    pub fn has_dnf(&self) -> bool {
        self.dnf.is_some()
    }

    pub fn top10_mut(&mut self) -> Option<&mut (dyn Scorer + '_)> {
        self.top10.as_deref_mut()
    }

    pub fn dnf_mut(&mut self) -> Option<&mut (dyn Scorer + '_)> {
        self.dnf.as_deref_mut()
    }
}

/// Scorer returning a fixed probability vector (test backend)
#[cfg(test)]
pub(crate) struct StubScorer {
    pub name: String,
    pub probabilities: Vec<f64>,
}

#[cfg(test)]
impl Scorer for StubScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_probability(
        &mut self,
        _features: &FeatureMatrix,
    ) -> Result<Vec<f64>, PipelineError> {
        Ok(self.probabilities.clone())
    }
}
