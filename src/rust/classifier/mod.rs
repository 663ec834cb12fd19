mod error;
mod utils;
mod issue;
mod dataset;
mod featurizer;
mod labels;
mod sdca;
mod model;
pub mod builder;

pub use error::ClassifierError;
pub use issue::{GithubIssue, IssuePrediction};
pub use dataset::{load_issues, read_issues};
pub use featurizer::{FeaturizerOptions, SparseVector, TextFeaturizer};
pub use labels::LabelMap;
pub use sdca::{MaximumEntropyModel, SdcaMaximumEntropyTrainer, TrainerOptions, TrainingSummary};
pub use model::IssueClassifier;
pub use builder::ClassifierBuilder;

pub(crate) use utils::{entropy, PROBABILITY_EPSILON};

/// Information about a fitted classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Number of area labels the classifier was trained on
    pub num_classes: usize,
    /// Area labels in score order
    pub class_labels: Vec<String>,
    /// Vocabulary size of the title featurizer
    pub title_ngrams: usize,
    /// Vocabulary size of the description featurizer
    pub description_ngrams: usize,
    /// Length of the concatenated feature vector
    pub num_features: usize,
    /// Outcome of the SDCA run
    pub training: TrainingSummary,
}
