//! Trains a GitHub issue "area" classifier and serves its predictions.
//!
//! The training pipeline maps area labels to keys, featurizes the title and
//! description as word and character n-grams, concatenates both and fits an
//! SDCA maximum entropy (multinomial logistic regression) model.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use issue_labeler::{ClassifierBuilder, GithubIssue};
//!
//! let issues = vec![
//!     GithubIssue::new("HttpClient timeout", "Requests hang behind a proxy").with_area("area-System.Net"),
//!     GithubIssue::new("Socket reset", "Connection reset by peer").with_area("area-System.Net"),
//!     GithubIssue::new("FileStream locked", "Cannot open the file on disk").with_area("area-System.IO"),
//!     GithubIssue::new("Directory.Delete fails", "Path not found").with_area("area-System.IO"),
//! ];
//!
//! let classifier = ClassifierBuilder::new().fit(&issues)?;
//! let prediction = classifier.predict(&GithubIssue::new("Proxy timeout", "HttpClient hangs"))?;
//! println!("Predicted area: {}", prediction.area);
//! # Ok(())
//! # }
//! ```
//!
//! # Serving
//!
//! A saved model is loaded with [`IssueLabeler::load`] and shared by the web
//! form in [`web`]:
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use issue_labeler::{web, IssueLabeler};
//!
//! let labeler = IssueLabeler::load("Website/GithubClassifier.json")?;
//! let config = web::ServerConfig::default();
//! web::serve(web::AppState::new(labeler), config.bind_addr).await?;
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod evaluation;
pub mod labeler;
pub mod model_manager;
pub mod web;

pub use classifier::{
    load_issues, read_issues, ClassifierBuilder, ClassifierError, ClassifierInfo,
    FeaturizerOptions, GithubIssue, IssueClassifier, IssuePrediction, TrainerOptions,
    TrainingSummary,
};
pub use evaluation::{cross_validate, evaluate, AverageMetrics, ConfusionMatrix, CrossValidationResult, MulticlassMetrics};
pub use labeler::IssueLabeler;
pub use model_manager::{ModelError, ModelManager, DEFAULT_MODEL_PATH};

pub fn init_logger() {
    env_logger::init();
}
