use log::info;

use super::error::ClassifierError;
use super::featurizer::{FeaturizerOptions, SparseVector, TextFeaturizer};
use super::issue::GithubIssue;
use super::labels::LabelMap;
use super::model::IssueClassifier;
use super::sdca::{SdcaMaximumEntropyTrainer, TrainerOptions};

/// A builder for fitting an [`IssueClassifier`] with a fluent interface.
///
/// Fitting runs the fixed pipeline: map `Area` values to keys, featurize
/// `Title`, featurize `Description`, concatenate both into one feature vector
/// and train an SDCA maximum entropy model on it.
///
/// # Example
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use issue_labeler::{load_issues, ClassifierBuilder, TrainerOptions};
///
/// let issues = load_issues("Data/corefx-issues-train.tsv")?;
/// let classifier = ClassifierBuilder::new()
///     .with_trainer_options(TrainerOptions { max_epochs: 20, ..Default::default() })
///     .with_seed(42)
///     .fit(&issues)?;
/// println!("{:?}", classifier.info());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClassifierBuilder {
    featurizer_options: FeaturizerOptions,
    trainer_options: TrainerOptions,
}

impl ClassifierBuilder {
    /// Creates a builder with default featurizer and trainer settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the n-gram settings used for both text columns
    pub fn with_featurizer_options(mut self, options: FeaturizerOptions) -> Self {
        self.featurizer_options = options;
        self
    }

    pub fn with_trainer_options(mut self, options: TrainerOptions) -> Self {
        self.trainer_options = options;
        self
    }

    /// Sets the seed that drives example shuffling during training
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.trainer_options.seed = seed;
        self
    }

    pub fn featurizer_options(&self) -> &FeaturizerOptions {
        &self.featurizer_options
    }

    pub fn trainer_options(&self) -> &TrainerOptions {
        &self.trainer_options
    }

    fn validate(&self, issues: &[GithubIssue]) -> Result<(), ClassifierError> {
        if issues.is_empty() {
            return Err(ClassifierError::BuildError(
                "At least one labeled issue is required".into(),
            ));
        }
        if let Some(pos) = issues.iter().position(|issue| issue.area.trim().is_empty()) {
            return Err(ClassifierError::ValidationError(format!(
                "Issue {} has no area label",
                pos + 1
            )));
        }
        if self.featurizer_options.word_ngram_length == 0
            && self.featurizer_options.char_ngram_length == 0
        {
            return Err(ClassifierError::ValidationError(
                "Either word or character n-grams must be enabled".into(),
            ));
        }
        if self.featurizer_options.max_ngrams == 0 {
            return Err(ClassifierError::ValidationError(
                "The n-gram vocabulary must allow at least one entry".into(),
            ));
        }
        Ok(())
    }

    /// Fits the whole pipeline on labeled issues.
    ///
    /// # Returns
    /// * `Result<IssueClassifier, ClassifierError>` - The fitted classifier, or an error if:
    ///   - No issues are given
    ///   - An issue has an empty area label
    ///   - The featurizer is configured to produce no n-grams or has an
    ///     empty vocabulary limit
    ///   - The trainer options are invalid
    pub fn fit(&self, issues: &[GithubIssue]) -> Result<IssueClassifier, ClassifierError> {
        self.validate(issues)?;

        let labels = LabelMap::fit(issues.iter().map(|issue| issue.area.as_str()));
        info!("Mapped {} distinct areas to keys", labels.len());

        let title_featurizer = TextFeaturizer::fit(
            self.featurizer_options.clone(),
            issues.iter().map(|issue| issue.title.as_str()),
        );
        let description_featurizer = TextFeaturizer::fit(
            self.featurizer_options.clone(),
            issues.iter().map(|issue| issue.description.as_str()),
        );
        info!(
            "Featurized text: {} title n-grams, {} description n-grams",
            title_featurizer.dimension(),
            description_featurizer.dimension()
        );

        let offset = title_featurizer.dimension();
        let num_features = offset + description_featurizer.dimension();
        let examples: Vec<SparseVector> = issues
            .iter()
            .map(|issue| {
                title_featurizer
                    .transform(&issue.title)
                    .concat(&description_featurizer.transform(&issue.description), offset)
            })
            .collect();
        let keys = issues
            .iter()
            .map(|issue| {
                labels.key(&issue.area).ok_or_else(|| {
                    ClassifierError::BuildError(format!("Area '{}' has no key", issue.area))
                })
            })
            .collect::<Result<Vec<usize>, _>>()?;

        let trainer = SdcaMaximumEntropyTrainer::new(self.trainer_options.clone());
        let (model, training) = trainer.fit(&examples, &keys, num_features, labels.len())?;

        Ok(IssueClassifier {
            labels,
            title_featurizer,
            description_featurizer,
            model,
            training,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(area: &str, title: &str, description: &str) -> GithubIssue {
        GithubIssue::new(title, description).with_area(area)
    }

    fn corpus() -> Vec<GithubIssue> {
        vec![
            issue("net", "HttpClient timeout", "request hangs behind proxy"),
            issue("io", "FileStream locked", "cannot open file on disk"),
            issue("net", "Socket reset", "connection reset by peer over tcp"),
            issue("io", "Directory delete fails", "path not found on disk"),
        ]
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let result = ClassifierBuilder::new().fit(&[]);
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_missing_area_is_rejected() {
        let mut issues = corpus();
        issues[2].area.clear();
        match ClassifierBuilder::new().fit(&issues) {
            Err(ClassifierError::ValidationError(msg)) => assert!(msg.contains("Issue 3")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_featurizer_must_produce_ngrams() {
        let result = ClassifierBuilder::new()
            .with_featurizer_options(FeaturizerOptions {
                word_ngram_length: 0,
                char_ngram_length: 0,
                ..Default::default()
            })
            .fit(&corpus());
        assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_zero_vocabulary_is_rejected() {
        let result = ClassifierBuilder::new()
            .with_featurizer_options(FeaturizerOptions {
                max_ngrams: 0,
                ..Default::default()
            })
            .fit(&corpus());
        match result {
            Err(ClassifierError::ValidationError(msg)) => assert!(msg.contains("vocabulary")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_fit_builds_full_pipeline() {
        let classifier = ClassifierBuilder::new().with_seed(3).fit(&corpus()).unwrap();
        let info = classifier.info();
        assert_eq!(info.class_labels, vec!["net", "io"]);
        assert_eq!(
            info.num_features,
            info.title_ngrams + info.description_ngrams
        );
        assert!(info.training.epochs > 0);

        let prediction = classifier
            .predict(&GithubIssue::new("HttpClient proxy timeout", "request hangs"))
            .unwrap();
        assert_eq!(prediction.area, "net");
    }
}
