use serde::{Deserialize, Serialize};

/// A single GitHub issue as it appears in the training corpus.
///
/// `area` is the label column; it is left empty when the issue is only being
/// classified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubIssue {
    pub id: Option<String>,
    pub area: String,
    pub title: String,
    pub description: String,
}

impl GithubIssue {
    /// Creates an unlabeled issue for prediction
    ///
    /// # Example
    /// ```
    /// use issue_labeler::GithubIssue;
    ///
    /// let issue = GithubIssue::new("Crash on startup", "App throws NullReferenceException on launch");
    /// assert!(issue.area.is_empty());
    /// ```
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            area: String::new(),
            title: title.into(),
            description: description.into(),
        }
    }

    /// Attaches the area label, for building training sets in code
    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = area.into();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// The output of a single prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuePrediction {
    /// The predicted area label
    pub area: String,
    /// One probability per known label, in the classifier's label order
    pub score: Vec<f32>,
}

impl IssuePrediction {
    /// Probability assigned to the predicted area
    pub fn confidence(&self) -> f32 {
        self.score.iter().cloned().fold(0.0, f32::max)
    }
}
