use std::path::Path;

use log::info;

use crate::classifier::{ClassifierError, ClassifierInfo, GithubIssue, IssueClassifier, IssuePrediction};
use crate::model_manager::ModelManager;

/// Loads a trained model once and answers single-issue predictions.
///
/// `predict_label` takes `&self` and never mutates, so one labeler can be
/// shared by every request handler behind an `Arc`.
#[derive(Debug, Clone)]
pub struct IssueLabeler {
    classifier: IssueClassifier,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<IssueLabeler>();
    }
};

impl IssueLabeler {
    /// Loads the model file at `model_path`.
    ///
    /// # Errors
    /// Fails if the file is missing, unreadable, from another format version
    /// or does not match its checksum.
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self, ClassifierError> {
        let classifier = ModelManager::new(model_path.as_ref()).load()?;
        info!(
            "Issue labeler ready with {} areas",
            classifier.labels().len()
        );
        Ok(Self { classifier })
    }

    pub fn from_classifier(classifier: IssueClassifier) -> Self {
        Self { classifier }
    }

    pub fn predict_label(&self, issue: &GithubIssue) -> Result<IssuePrediction, ClassifierError> {
        self.classifier.predict(issue)
    }

    pub fn labels(&self) -> &[String] {
        self.classifier.labels()
    }

    pub fn info(&self) -> ClassifierInfo {
        self.classifier.info()
    }
}
