use log::debug;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::featurizer::{SparseVector, TextFeaturizer};
use super::issue::{GithubIssue, IssuePrediction};
use super::labels::LabelMap;
use super::sdca::{MaximumEntropyModel, TrainingSummary};
use super::utils::argmax;

/// A fitted issue classification pipeline.
///
/// Holds everything needed to go from a raw [`GithubIssue`] to an area label:
/// one featurizer per text column, the label key mapping and the trained
/// maximum entropy model over the concatenated features.
///
/// # Thread Safety
///
/// Prediction only reads from the classifier, so it is `Send + Sync` and can be
/// shared through an `Arc` without a lock.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use issue_labeler::{GithubIssue, IssueClassifier};
///
/// let issues = vec![
///     GithubIssue::new("HttpClient timeout", "Requests hang on a slow proxy").with_area("area-System.Net"),
///     GithubIssue::new("File locked", "FileStream cannot open the file").with_area("area-System.IO"),
/// ];
/// let classifier = IssueClassifier::builder().fit(&issues)?;
///
/// let prediction = classifier.predict(&GithubIssue::new("Proxy timeout", "HttpClient hangs"))?;
/// assert_eq!(prediction.score.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueClassifier {
    pub(crate) labels: LabelMap,
    pub(crate) title_featurizer: TextFeaturizer,
    pub(crate) description_featurizer: TextFeaturizer,
    pub(crate) model: MaximumEntropyModel,
    pub(crate) training: TrainingSummary,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<IssueClassifier>();
    }
};

impl IssueClassifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the fitted pipeline
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            num_classes: self.labels.len(),
            class_labels: self.labels.labels().to_vec(),
            title_ngrams: self.title_featurizer.dimension(),
            description_ngrams: self.description_featurizer.dimension(),
            num_features: self.model.num_features(),
            training: self.training.clone(),
        }
    }

    /// Known area labels in score order
    pub fn labels(&self) -> &[String] {
        self.labels.labels()
    }

    /// Featurizes title and description and concatenates them.
    pub fn featurize(&self, issue: &GithubIssue) -> SparseVector {
        let title = self.title_featurizer.transform(&issue.title);
        let description = self.description_featurizer.transform(&issue.description);
        title.concat(&description, self.title_featurizer.dimension())
    }

    /// Predicts the area of an issue.
    ///
    /// Empty titles or descriptions are accepted; with no known n-grams the
    /// prediction falls back to the label prior learned in the bias.
    ///
    /// # Returns
    /// An [`IssuePrediction`] with the predicted area and one probability per
    /// label in [`IssueClassifier::labels`] order.
    pub fn predict(&self, issue: &GithubIssue) -> Result<IssuePrediction, ClassifierError> {
        let features = self.featurize(issue);
        let probabilities = self.model.probabilities(&features);

        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(ClassifierError::PredictionError(
                "Model produced non-finite scores".into(),
            ));
        }

        let score = probabilities.to_vec();
        let area = argmax(&score)
            .and_then(|key| self.labels.value(key))
            .ok_or_else(|| ClassifierError::PredictionError("Model has no classes".into()))?
            .to_string();

        debug!("Predicted '{}' from {} active features", area, features.nnz());
        Ok(IssuePrediction { area, score })
    }
}
