//! Stochastic dual coordinate ascent for L2-regularized multinomial logistic
//! regression.
//!
//! The primal problem over weights `W` (features x classes) and bias `b` is
//!
//! ```text
//! P(W) = 1/n * sum_i [ lse(z_i) - z_i[y_i] ] + lambda/2 * (|W|^2 + |b|^2)
//! ```
//!
//! with `z_i = W^T x_i + b`. Each example owns a dual vector `alpha_i`, and the
//! weights are kept equal to `1/(lambda n) * sum_i x_i alpha_i^T` at all times.
//! An update moves `alpha_i` towards `e_y - softmax(z_i)` by a step chosen to
//! guarantee the dual objective does not decrease, so the duality gap is a
//! certificate of how far training is from the optimum.

use log::{debug, info, warn};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::featurizer::SparseVector;
use super::utils::{entropy, log_sum_exp, softmax};

/// Smoothness constant of the softmax cross-entropy loss.
const LOSS_SMOOTHNESS: f64 = 1.0;

fn indicator(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerOptions {
    /// L2 regularization strength (lambda)
    pub l2_regularization: f32,
    /// Training stops once the duality gap relative to the primal objective
    /// falls below this value
    pub convergence_tolerance: f32,
    pub max_epochs: usize,
    /// Visit examples in a fresh random order every epoch
    pub shuffle: bool,
    pub seed: u64,
    pub fit_bias: bool,
}

impl Default for TrainerOptions {
    fn default() -> Self {
        Self {
            l2_regularization: 1e-4,
            convergence_tolerance: 0.1,
            max_epochs: 50,
            shuffle: true,
            seed: 0,
            fit_bias: true,
        }
    }
}

/// How a training run ended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub epochs: usize,
    pub converged: bool,
    pub primal_objective: f64,
    pub dual_objective: f64,
}

impl TrainingSummary {
    pub fn relative_gap(&self) -> f64 {
        (self.primal_objective - self.dual_objective) / self.primal_objective.abs().max(1e-12)
    }
}

/// Linear multiclass model producing softmax probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaximumEntropyModel {
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl MaximumEntropyModel {
    /// Wraps a features x classes weight matrix and a per-class bias.
    pub(crate) fn from_parts(weights: Array2<f32>, bias: Array1<f32>) -> Self {
        debug_assert_eq!(weights.ncols(), bias.len());
        Self { weights, bias }
    }

    pub fn num_features(&self) -> usize {
        self.weights.nrows()
    }

    pub fn num_classes(&self) -> usize {
        self.weights.ncols()
    }

    /// Raw class scores `W^T x + b`; features beyond the trained dimension
    /// are ignored.
    pub fn scores(&self, features: &SparseVector) -> Array1<f32> {
        let mut scores = self.bias.clone();
        for (idx, value) in features.iter() {
            if idx < self.weights.nrows() {
                scores.scaled_add(value, &self.weights.row(idx));
            }
        }
        scores
    }

    pub fn probabilities(&self, features: &SparseVector) -> Array1<f32> {
        softmax(&self.scores(features))
    }

    fn squared_norm(&self) -> f64 {
        let w: f64 = self.weights.iter().map(|&v| (v as f64) * (v as f64)).sum();
        let b: f64 = self.bias.iter().map(|&v| (v as f64) * (v as f64)).sum();
        w + b
    }
}

/// Trains [`MaximumEntropyModel`]s with SDCA.
#[derive(Debug, Clone, Default)]
pub struct SdcaMaximumEntropyTrainer {
    options: TrainerOptions,
}

impl SdcaMaximumEntropyTrainer {
    pub fn new(options: TrainerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TrainerOptions {
        &self.options
    }

    /// Fits a model on `examples`, where `labels[i]` is the class key of
    /// `examples[i]` and every key is below `num_classes`.
    pub fn fit(
        &self,
        examples: &[SparseVector],
        labels: &[usize],
        num_features: usize,
        num_classes: usize,
    ) -> Result<(MaximumEntropyModel, TrainingSummary), ClassifierError> {
        self.validate(examples, labels, num_classes)?;

        let n = examples.len();
        let lambda = self.options.l2_regularization as f64;
        let lambda_n = lambda * n as f64;
        let scale = (1.0 / lambda_n) as f32;
        let bias_term = if self.options.fit_bias { 1.0 } else { 0.0 };

        let mut model = MaximumEntropyModel::from_parts(
            Array2::zeros((num_features, num_classes)),
            Array1::zeros(num_classes),
        );
        let mut duals: Array2<f32> = Array2::zeros((n, num_classes));
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let mut summary = TrainingSummary::default();

        info!(
            "Training SDCA maximum entropy: {} examples, {} features, {} classes, lambda={}",
            n, num_features, num_classes, self.options.l2_regularization
        );

        for epoch in 1..=self.options.max_epochs {
            if self.options.shuffle {
                order.shuffle(&mut rng);
            }

            for &i in &order {
                let x = &examples[i];
                let y = labels[i];
                let scores = model.scores(x);
                let probs = softmax(&scores);
                let mut alpha = duals.row_mut(i);

                // Target dual point e_y - p and the distance to it.
                let direction: Array1<f64> = (0..num_classes)
                    .map(|k| {
                        indicator(k == y) - probs[k] as f64 - alpha[k] as f64
                    })
                    .collect();
                let dist_sq = direction.dot(&direction);
                if dist_sq < 1e-20 {
                    continue;
                }

                // Per-example Fenchel-Young gap lets the step grow beyond the
                // conservative fixed step when the example is far from optimal.
                let loss = log_sum_exp(&scores) - scores[y] as f64;
                let conjugate = -entropy(
                    (0..num_classes).map(|k| indicator(k == y) - alpha[k] as f64),
                );
                let inner: f64 = (0..num_classes)
                    .map(|k| scores[k] as f64 * alpha[k] as f64)
                    .sum();
                let gap = (loss + conjugate + inner).max(0.0);

                let r_sq = x.norm_squared() as f64 + bias_term;
                let numerator = gap + 0.5 * LOSS_SMOOTHNESS * dist_sq;
                let denominator = dist_sq * (LOSS_SMOOTHNESS + r_sq / lambda_n);
                let step = (numerator / denominator).clamp(0.0, 1.0);

                let delta: Array1<f32> = direction.mapv(|d| (step * d) as f32);
                alpha += &delta;

                for (idx, value) in x.iter() {
                    model
                        .weights
                        .row_mut(idx)
                        .scaled_add(scale * value, &delta);
                }
                if self.options.fit_bias {
                    model.bias.scaled_add(scale, &delta);
                }
            }

            let (primal, dual) = Self::objectives(&model, &duals, examples, labels, lambda);
            summary = TrainingSummary {
                epochs: epoch,
                converged: false,
                primal_objective: primal,
                dual_objective: dual,
            };
            debug!(
                "Epoch {}: primal={:.6} dual={:.6} gap={:.6}",
                epoch,
                primal,
                dual,
                summary.relative_gap()
            );

            if summary.relative_gap() < self.options.convergence_tolerance as f64 {
                summary.converged = true;
                break;
            }
        }

        if summary.converged {
            info!(
                "SDCA converged after {} epochs (relative gap {:.4})",
                summary.epochs,
                summary.relative_gap()
            );
        } else {
            warn!(
                "SDCA stopped after {} epochs without converging (relative gap {:.4})",
                summary.epochs,
                summary.relative_gap()
            );
        }

        Ok((model, summary))
    }

    fn validate(
        &self,
        examples: &[SparseVector],
        labels: &[usize],
        num_classes: usize,
    ) -> Result<(), ClassifierError> {
        if examples.is_empty() {
            return Err(ClassifierError::BuildError("Cannot train on an empty dataset".into()));
        }
        if examples.len() != labels.len() {
            return Err(ClassifierError::BuildError(format!(
                "Got {} examples but {} labels",
                examples.len(),
                labels.len()
            )));
        }
        if num_classes == 0 {
            return Err(ClassifierError::BuildError("At least one class is required".into()));
        }
        if let Some(pos) = labels.iter().position(|&y| y >= num_classes) {
            return Err(ClassifierError::BuildError(format!(
                "Label key {} of example {} is out of range",
                labels[pos],
                pos + 1
            )));
        }
        if !(self.options.l2_regularization > 0.0) {
            return Err(ClassifierError::ValidationError(
                "L2 regularization must be positive".into(),
            ));
        }
        if self.options.max_epochs == 0 {
            return Err(ClassifierError::ValidationError(
                "At least one training epoch is required".into(),
            ));
        }
        Ok(())
    }

    fn objectives(
        model: &MaximumEntropyModel,
        duals: &Array2<f32>,
        examples: &[SparseVector],
        labels: &[usize],
        lambda: f64,
    ) -> (f64, f64) {
        let n = examples.len() as f64;
        let regularizer = 0.5 * lambda * model.squared_norm();

        let loss: f64 = examples
            .iter()
            .zip(labels)
            .map(|(x, &y)| {
                let scores = model.scores(x);
                log_sum_exp(&scores) - scores[y] as f64
            })
            .sum();

        let dual_entropy: f64 = duals
            .rows()
            .into_iter()
            .zip(labels)
            .map(|(alpha, &y)| {
                entropy(
                    alpha
                        .iter()
                        .enumerate()
                        .map(|(k, &a)| indicator(k == y) - a as f64),
                )
            })
            .sum();

        (loss / n + regularizer, dual_entropy / n - regularizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(idx: usize) -> SparseVector {
        SparseVector {
            indices: vec![idx],
            values: vec![1.0],
        }
    }

    fn toy_problem() -> (Vec<SparseVector>, Vec<usize>) {
        let mut examples = Vec::new();
        let mut labels = Vec::new();
        for _ in 0..10 {
            for class in 0..3 {
                examples.push(one_hot(class));
                labels.push(class);
            }
        }
        (examples, labels)
    }

    #[test]
    fn test_separable_problem_is_learned() {
        let (examples, labels) = toy_problem();
        let trainer = SdcaMaximumEntropyTrainer::new(TrainerOptions {
            l2_regularization: 1e-2,
            ..Default::default()
        });
        let (model, summary) = trainer.fit(&examples, &labels, 3, 3).unwrap();

        assert!(summary.epochs >= 1);
        assert!(summary.primal_objective >= summary.dual_objective - 1e-6);
        for class in 0..3 {
            let probs = model.probabilities(&one_hot(class));
            let best = crate::classifier::utils::argmax(probs.as_slice().unwrap()).unwrap();
            assert_eq!(best, class);
            assert!((probs.sum() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_training_is_deterministic() {
        let (examples, labels) = toy_problem();
        let trainer = SdcaMaximumEntropyTrainer::new(TrainerOptions {
            seed: 7,
            max_epochs: 3,
            ..Default::default()
        });
        let (a, _) = trainer.fit(&examples, &labels, 3, 3).unwrap();
        let (b, _) = trainer.fit(&examples, &labels, 3, 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tight_tolerance_stops_at_max_epochs() {
        let (examples, labels) = toy_problem();
        let trainer = SdcaMaximumEntropyTrainer::new(TrainerOptions {
            convergence_tolerance: 0.0,
            max_epochs: 2,
            ..Default::default()
        });
        let (_, summary) = trainer.fit(&examples, &labels, 3, 3).unwrap();
        assert_eq!(summary.epochs, 2);
        assert!(!summary.converged);
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let trainer = SdcaMaximumEntropyTrainer::default();
        assert!(trainer.fit(&[], &[], 1, 1).is_err());
        assert!(trainer.fit(&[one_hot(0)], &[2], 1, 2).is_err());

        let trainer = SdcaMaximumEntropyTrainer::new(TrainerOptions {
            l2_regularization: 0.0,
            ..Default::default()
        });
        assert!(trainer.fit(&[one_hot(0)], &[0], 1, 1).is_err());
    }
}
