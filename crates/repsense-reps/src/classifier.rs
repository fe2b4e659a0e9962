//! Exercise classification from averaged warm-up features.

use repsense_core::{Error, FeatureVector, LabelCentroid, Result};

/// Maps an averaged feature vector to an exercise label
pub trait ExerciseClassifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<String>;
}

impl<F> ExerciseClassifier for F
where
    F: Fn(&FeatureVector) -> String + Send + Sync,
{
    fn predict(&self, features: &FeatureVector) -> Result<String> {
        Ok(self(features))
    }
}

/// Nearest-centroid classifier over per-exercise mean feature vectors
#[derive(Debug, Clone)]
pub struct CentroidClassifier {
    centroids: Vec<LabelCentroid>,
}

impl CentroidClassifier {
    pub fn new(centroids: Vec<LabelCentroid>) -> Self {
        Self { centroids }
    }

    pub fn centroids(&self) -> &[LabelCentroid] {
        &self.centroids
    }
}

impl ExerciseClassifier for CentroidClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<String> {
        if !features.to_array().iter().all(|v| v.is_finite()) {
            return Err(Error::Classifier(format!(
                "non-finite features: {:?}",
                features.to_array()
            )));
        }

        self.centroids
            .iter()
            .map(|c| (c, c.features.distance_to(features)))
            .fold(None, |best: Option<(&LabelCentroid, f64)>, (c, d)| match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((c, d)),
            })
            .map(|(c, _)| c.label.clone())
            .ok_or_else(|| Error::Classifier("no centroids configured".to_string()))
    }
}
