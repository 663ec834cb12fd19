//! Multiclass metrics and k-fold cross-validation of the training pipeline.

use std::fmt::Write as _;

use log::info;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::classifier::{
    entropy, ClassifierBuilder, ClassifierError, GithubIssue, IssueClassifier, LabelMap,
    PROBABILITY_EPSILON,
};

/// Counts of (truth, predicted) label pairs over a fixed label set.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    labels: Vec<String>,
    counts: Array2<usize>,
}

impl ConfusionMatrix {
    pub fn new(labels: Vec<String>) -> Self {
        let n = labels.len();
        Self {
            labels,
            counts: Array2::zeros((n, n)),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of examples with the given truth and predicted keys
    pub fn count(&self, truth: usize, predicted: usize) -> usize {
        self.counts[[truth, predicted]]
    }

    pub fn total(&self) -> usize {
        self.counts.sum()
    }

    fn record(&mut self, truth: usize, predicted: usize) {
        self.counts[[truth, predicted]] += 1;
    }

    fn correct(&self) -> usize {
        self.counts.diag().sum()
    }

    /// Fraction of examples of class `key` that were predicted as `key`
    pub fn recall(&self, key: usize) -> f64 {
        let support = self.counts.row(key).sum();
        if support == 0 {
            0.0
        } else {
            self.counts[[key, key]] as f64 / support as f64
        }
    }

    /// Fraction of predictions of class `key` that were correct
    pub fn precision(&self, key: usize) -> f64 {
        let predicted = self.counts.column(key).sum();
        if predicted == 0 {
            0.0
        } else {
            self.counts[[key, key]] as f64 / predicted as f64
        }
    }

    /// Renders the matrix as a text table with recall per row and precision
    /// per column. Columns are numbered; the numbers refer to the row order.
    pub fn formatted_confusion_table(&self) -> String {
        const CELL: usize = 7;
        let n = self.labels.len();
        let label_width = self
            .labels
            .iter()
            .map(|label| label.chars().count() + 4)
            .max()
            .unwrap_or(0)
            .max("PREDICTED".len());
        let rule = format!("{}||{}", " ".repeat(label_width), "=".repeat((CELL + 2) * n + 7));

        let mut out = String::new();
        let _ = writeln!(out, "Confusion table");
        let _ = writeln!(out, "{}", rule);

        let _ = write!(out, "{:<width$}||", "PREDICTED", width = label_width);
        for key in 0..n {
            let _ = write!(out, "{:>width$} |", key, width = CELL);
        }
        let _ = writeln!(out, " Recall");
        let _ = writeln!(out, "{:<width$}||{}", "TRUTH", &rule[label_width + 2..], width = label_width);

        for (truth, label) in self.labels.iter().enumerate() {
            let name = format!("{}. {}", truth, label);
            let _ = write!(out, "{:>width$}||", name, width = label_width);
            for predicted in 0..n {
                let _ = write!(out, "{:>width$} |", self.count(truth, predicted), width = CELL);
            }
            let _ = writeln!(out, " {:.4}", self.recall(truth));
        }

        let _ = writeln!(out, "{}", rule);
        let _ = write!(out, "{:<width$}||", "Precision", width = label_width);
        for key in 0..n {
            let _ = write!(out, "{:>width$.4} |", self.precision(key), width = CELL);
        }
        out.push('\n');
        out
    }
}

/// Metrics of a multiclass classifier on a labeled test set.
#[derive(Debug, Clone, PartialEq)]
pub struct MulticlassMetrics {
    /// Fraction of all examples classified correctly
    pub micro_accuracy: f64,
    /// Mean of the per-class recall over classes present in the test set
    pub macro_accuracy: f64,
    /// Mean negative log probability of the true label
    pub log_loss: f64,
    /// Improvement of `log_loss` over always predicting the test set's label
    /// distribution; 1 is perfect, 0 is no better than the prior
    pub log_loss_reduction: f64,
    /// Mean log-loss of the examples of each class
    pub per_class_log_loss: Vec<f64>,
    pub confusion_matrix: ConfusionMatrix,
}

/// Scores `classifier` on `issues`, reporting over the keys of `labels`.
///
/// `labels` must cover every area in `issues`; the classifier may know only a
/// subset, in which case unknown truths get zero probability.
pub fn evaluate(
    classifier: &IssueClassifier,
    issues: &[GithubIssue],
    labels: &LabelMap,
) -> Result<MulticlassMetrics, ClassifierError> {
    if issues.is_empty() {
        return Err(ClassifierError::ValidationError(
            "Cannot evaluate on an empty test set".into(),
        ));
    }

    let n_classes = labels.len();
    let mut matrix = ConfusionMatrix::new(labels.labels().to_vec());
    let mut class_loss = vec![0.0f64; n_classes];
    let mut class_support = vec![0usize; n_classes];

    for issue in issues {
        let truth = labels.key(&issue.area).ok_or_else(|| {
            ClassifierError::ValidationError(format!("Unknown area '{}' in test set", issue.area))
        })?;
        let prediction = classifier.predict(issue)?;
        let predicted = labels.key(&prediction.area).ok_or_else(|| {
            ClassifierError::PredictionError(format!(
                "Predicted area '{}' is not in the label set",
                prediction.area
            ))
        })?;

        let probability = classifier
            .labels
            .key(&issue.area)
            .and_then(|key| prediction.score.get(key))
            .map(|&p| p as f64)
            .unwrap_or(0.0);

        matrix.record(truth, predicted);
        class_loss[truth] += -probability.max(PROBABILITY_EPSILON).ln();
        class_support[truth] += 1;
    }

    let total = issues.len() as f64;
    let log_loss = class_loss.iter().sum::<f64>() / total;
    let prior_log_loss = entropy(class_support.iter().map(|&s| s as f64 / total));
    let log_loss_reduction = if prior_log_loss > 0.0 {
        (prior_log_loss - log_loss) / prior_log_loss
    } else {
        0.0
    };

    let present: Vec<usize> = (0..n_classes).filter(|&k| class_support[k] > 0).collect();
    let macro_accuracy =
        present.iter().map(|&k| matrix.recall(k)).sum::<f64>() / present.len() as f64;

    let per_class_log_loss = class_loss
        .iter()
        .zip(&class_support)
        .map(|(&loss, &support)| if support > 0 { loss / support as f64 } else { 0.0 })
        .collect();

    Ok(MulticlassMetrics {
        micro_accuracy: matrix.correct() as f64 / total,
        macro_accuracy,
        log_loss,
        log_loss_reduction,
        per_class_log_loss,
        confusion_matrix: matrix,
    })
}

/// The outcome of one cross-validation fold.
#[derive(Debug, Clone)]
pub struct CrossValidationResult {
    pub fold: usize,
    pub metrics: MulticlassMetrics,
}

/// Mean of each headline metric over all folds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageMetrics {
    pub micro_accuracy: f64,
    pub macro_accuracy: f64,
    pub log_loss: f64,
    pub log_loss_reduction: f64,
}

impl AverageMetrics {
    pub fn from_results(results: &[CrossValidationResult]) -> Self {
        let n = results.len().max(1) as f64;
        let mean = |f: fn(&MulticlassMetrics) -> f64| {
            results.iter().map(|r| f(&r.metrics)).sum::<f64>() / n
        };
        Self {
            micro_accuracy: mean(|m| m.micro_accuracy),
            macro_accuracy: mean(|m| m.macro_accuracy),
            log_loss: mean(|m| m.log_loss),
            log_loss_reduction: mean(|m| m.log_loss_reduction),
        }
    }
}

/// Assigns every row to one of `folds` folds after a seeded shuffle.
fn assign_folds(n: usize, folds: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut assignment = vec![0; n];
    for (position, &row) in order.iter().enumerate() {
        assignment[row] = position % folds;
    }
    assignment
}

/// Runs k-fold cross-validation of the pipeline described by `builder`.
///
/// Each fold fits the whole pipeline, label mapping and featurizers included,
/// on the other folds and evaluates on itself. Folds are trained in parallel;
/// results come back in fold order.
pub fn cross_validate(
    builder: &ClassifierBuilder,
    issues: &[GithubIssue],
    folds: usize,
) -> Result<Vec<CrossValidationResult>, ClassifierError> {
    if folds < 2 {
        return Err(ClassifierError::ValidationError(
            "Cross-validation needs at least 2 folds".into(),
        ));
    }
    if issues.len() < folds {
        return Err(ClassifierError::BuildError(format!(
            "Cannot split {} issues into {} folds",
            issues.len(),
            folds
        )));
    }

    let labels = LabelMap::fit(issues.iter().map(|issue| issue.area.as_str()));
    let assignment = assign_folds(issues.len(), folds, builder.trainer_options().seed);
    info!("Cross-validating over {} folds", folds);

    (0..folds)
        .into_par_iter()
        .map(|fold| -> Result<CrossValidationResult, ClassifierError> {
            let (test, train): (Vec<_>, Vec<_>) = issues
                .iter()
                .zip(&assignment)
                .partition(|(_, f)| **f == fold);
            let train: Vec<GithubIssue> = train.into_iter().map(|(issue, _)| issue.clone()).collect();
            let test: Vec<GithubIssue> = test.into_iter().map(|(issue, _)| issue.clone()).collect();

            info!("Fold {}: training on {} issues, testing on {}", fold, train.len(), test.len());
            let model = builder.fit(&train)?;
            let metrics = evaluate(&model, &test, &labels)?;
            Ok(CrossValidationResult { fold, metrics })
        })
        .collect()
}
