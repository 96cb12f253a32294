//! Training loop, evaluation, and metrics.
//!
//! [`Trainer`] is the context object for one training run: it owns the
//! network, the optimizer state (including the Adam time step) and the
//! configuration, and drives the feedforward → inference → update loop.

use crate::core::{BatchState, OptimizerState, PCNError, PCNResult, PCN};
use crate::data::{self, make_batches};
use crate::Config;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-epoch metric history, one entry per epoch in each sequence.
///
/// Losses are root-mean-squared errors; accuracies are fractions in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub train_loss: Vec<f32>,
    pub train_accuracy: Vec<f32>,
    pub valid_loss: Vec<f32>,
    pub valid_accuracy: Vec<f32>,
}

impl History {
    pub fn epochs(&self) -> usize {
        self.train_loss.len()
    }
}

/// Loss and accuracy over a set of batches.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvalMetrics {
    /// Mean over batches of the per-batch RMSE
    pub loss: f32,
    /// Fraction of samples whose argmax matches the label's argmax
    pub accuracy: f32,
    pub samples: usize,
}

/// Mean squared error between two equally-shaped matrices.
///
/// # Errors
/// - `ShapeMismatch` if the shapes differ
pub fn mse(estimated: &Array2<f32>, truth: &Array2<f32>) -> PCNResult<f32> {
    check_same_shape(estimated, truth)?;
    let diff = estimated - truth;
    Ok(diff.mapv(|d| d * d).mean().unwrap_or(0.0))
}

/// Root of [`mse`]; the loss reported in [`History`].
pub fn rmse(estimated: &Array2<f32>, truth: &Array2<f32>) -> PCNResult<f32> {
    mse(estimated, truth).map(f32::sqrt)
}

/// Fraction of columns (samples) whose argmax agrees between `predicted` and `truth`.
///
/// # Errors
/// - `ShapeMismatch` if the shapes differ
pub fn accuracy(predicted: &Array2<f32>, truth: &Array2<f32>) -> PCNResult<f32> {
    let correct = count_correct(predicted, truth)?;
    if predicted.ncols() == 0 {
        return Ok(0.0);
    }
    Ok(correct as f32 / predicted.ncols() as f32)
}

fn count_correct(predicted: &Array2<f32>, truth: &Array2<f32>) -> PCNResult<usize> {
    check_same_shape(predicted, truth)?;
    Ok(predicted
        .columns()
        .into_iter()
        .zip(truth.columns())
        .filter(|(p, t)| argmax(p.iter()) == argmax(t.iter()))
        .count())
}

/// Index of the first maximum, `None` for an empty sequence.
///
/// Shared by the accuracy metric and the inference CLI so both break ties the
/// same way.
pub fn argmax<'a>(values: impl Iterator<Item = &'a f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

fn check_same_shape(a: &Array2<f32>, b: &Array2<f32>) -> PCNResult<()> {
    if a.dim() != b.dim() {
        return Err(PCNError::ShapeMismatch(format!(
            "{:?} vs {:?}",
            a.dim(),
            b.dim()
        )));
    }
    Ok(())
}

/// Owns everything mutated during a training run.
#[derive(Debug, Clone)]
pub struct Trainer {
    pub network: PCN,
    pub optimizer_state: OptimizerState,
    config: Config,
}

impl Trainer {
    /// Build a freshly initialized network of shape `dims` for `config`.
    pub fn new(dims: Vec<usize>, config: Config) -> PCNResult<Self> {
        config.validate()?;
        let network = PCN::new(dims, config.activation)?;
        Self::from_network(network, config)
    }

    /// Train an existing network; its activation is replaced by the configured one.
    pub fn from_network(mut network: PCN, config: Config) -> PCNResult<Self> {
        config.validate()?;
        network.activation = config.activation;
        let optimizer_state = OptimizerState::new(&network);
        Ok(Self {
            network,
            optimizer_state,
            config,
        })
    }

    /// Continue training a checkpointed network with its saved optimizer state.
    ///
    /// Unlike [`Trainer::from_network`] the activation is not replaced: the
    /// weights were learned under the network's own activation and
    /// preprocessing.
    ///
    /// # Errors
    /// - `InvalidConfig` if `config.activation` differs from the network's
    /// - `ShapeMismatch` if `optimizer_state` does not cover the network's layers
    pub fn resume(
        network: PCN,
        optimizer_state: OptimizerState,
        config: Config,
    ) -> PCNResult<Self> {
        if config.activation != network.activation {
            return Err(PCNError::InvalidConfig(format!(
                "network was trained with {} but config asks for {}",
                network.activation, config.activation
            )));
        }
        if optimizer_state.vdw.len() != network.w.len() {
            return Err(PCNError::ShapeMismatch(format!(
                "optimizer state has {} layers, network has {}",
                optimizer_state.vdw.len(),
                network.w.len()
            )));
        }
        let mut trainer = Self::from_network(network, config)?;
        trainer.optimizer_state = optimizer_state;
        Ok(trainer)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the training parameters between batches.
    ///
    /// Weights and optimizer state (including the Adam time step) are kept.
    pub fn configure(&mut self, config: Config) -> PCNResult<()> {
        config.validate()?;
        self.network.activation = config.activation;
        self.config = config;
        Ok(())
    }

    /// Compute gradients from a relaxed state and apply the configured optimizer.
    pub fn update_weights(&mut self, state: &BatchState) -> PCNResult<()> {
        let grads = self.network.gradients(state)?;
        self.optimizer_state.step(
            &mut self.network,
            &grads,
            self.config.optimizer,
            &self.config.optimizer_params(),
        )
    }

    /// One feedforward → inference → update pass on a prepared feature-major batch.
    ///
    /// Returns the output layer as predicted before the update.
    pub fn train_batch(
        &mut self,
        data: &Array2<f32>,
        labels: &Array2<f32>,
    ) -> PCNResult<Array2<f32>> {
        let x = self.network.feedforward(data)?;
        let predictions = x[self.network.output_layer()].clone();

        let state = self
            .network
            .relax(x, labels, &self.config.inference_params())?;
        log::debug!(
            "inference: {} steps, beta={}, converged={}, energy={:.6}",
            state.steps_taken,
            state.final_beta,
            state.converged,
            state.energy()
        );

        self.update_weights(&state)?;
        Ok(predictions)
    }

    /// Train on parallel sample/label lists for `config.epochs` epochs.
    ///
    /// Each epoch processes the first `floor(len * dataset_perc / batch_size)`
    /// batches, then evaluates loss and accuracy on those batches and on the
    /// full validation set without updating weights.
    ///
    /// # Errors
    /// - `EmptyDataset` if there are no training samples
    /// - `ShapeMismatch` if counts or vector lengths do not fit the network
    /// - `InvalidConfig` if the batch size exceeds either dataset or `dataset_perc` leaves no batches
    pub fn train(
        &mut self,
        train_samples: &[Array1<f32>],
        train_labels: &[Array1<f32>],
        valid_samples: &[Array1<f32>],
        valid_labels: &[Array1<f32>],
    ) -> PCNResult<History> {
        if train_samples.is_empty() {
            return Err(PCNError::EmptyDataset("no training samples".into()));
        }
        if valid_samples.len() != valid_labels.len() {
            return Err(PCNError::ShapeMismatch(format!(
                "{} validation samples but {} labels",
                valid_samples.len(),
                valid_labels.len()
            )));
        }
        self.check_sample_shapes(train_samples, train_labels)?;
        self.check_sample_shapes(valid_samples, valid_labels)?;

        let batch_size = self.config.batch_size;
        let activation = self.config.activation;
        let (train_x, train_y) = make_batches(train_samples, train_labels, batch_size, activation)?;
        let (valid_x, valid_y) = if valid_samples.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            make_batches(valid_samples, valid_labels, batch_size, activation)?
        };

        let process_count = ((train_samples.len() as f32 * self.config.dataset_perc
            / batch_size as f32)
            .floor() as usize)
            .min(train_x.len());
        if process_count == 0 {
            return Err(PCNError::InvalidConfig(format!(
                "dataset_perc {} leaves no full batch of {batch_size}",
                self.config.dataset_perc
            )));
        }

        log::info!(
            "training {:?} for {} epochs: {process_count} batches of {batch_size}, activation={}, optimizer={}",
            self.network.dims(),
            self.config.epochs,
            self.config.activation,
            self.config.optimizer
        );

        let mut history = History::default();
        for epoch in 0..self.config.epochs {
            let mut seen = 0usize;
            let mut correct = 0usize;
            for batch_index in 0..process_count {
                let predictions = self.train_batch(&train_x[batch_index], &train_y[batch_index])?;
                correct += count_correct(&predictions, &train_y[batch_index])?;
                seen += predictions.ncols();

                if batch_index % self.config.log_every == 0 {
                    log::info!(
                        "batch {}/{process_count}: running accuracy {:.4}",
                        batch_index + 1,
                        correct as f32 / seen as f32
                    );
                }
            }

            let train = self.evaluate(&train_x[..process_count], &train_y[..process_count])?;
            let valid = self.evaluate(&valid_x, &valid_y)?;
            log::info!(
                "epoch {}/{}: loss {:.6} acc {:.4} | valid loss {:.6} acc {:.4}",
                epoch + 1,
                self.config.epochs,
                train.loss,
                train.accuracy,
                valid.loss,
                valid.accuracy
            );

            history.train_loss.push(train.loss);
            history.train_accuracy.push(train.accuracy);
            history.valid_loss.push(valid.loss);
            history.valid_accuracy.push(valid.accuracy);
        }

        Ok(history)
    }

    /// Feedforward-only loss and accuracy over prepared feature-major batches.
    ///
    /// Batches are evaluated in parallel; the network is only read.
    /// An empty batch list yields zeroed metrics.
    pub fn evaluate(
        &self,
        data: &[Array2<f32>],
        labels: &[Array2<f32>],
    ) -> PCNResult<EvalMetrics> {
        if data.len() != labels.len() {
            return Err(PCNError::ShapeMismatch(format!(
                "{} data batches but {} label batches",
                data.len(),
                labels.len()
            )));
        }
        if data.is_empty() {
            return Ok(EvalMetrics::default());
        }

        let per_batch = data
            .par_iter()
            .zip(labels.par_iter())
            .map(|(x0, y)| -> PCNResult<(f32, usize, usize)> {
                let x = self.network.feedforward(x0)?;
                let out = &x[self.network.output_layer()];
                Ok((rmse(out, y)?, count_correct(out, y)?, y.ncols()))
            })
            .collect::<PCNResult<Vec<_>>>()?;

        let loss = per_batch.iter().map(|(l, _, _)| l).sum::<f32>() / per_batch.len() as f32;
        let correct: usize = per_batch.iter().map(|(_, c, _)| c).sum();
        let samples: usize = per_batch.iter().map(|(_, _, n)| n).sum();
        Ok(EvalMetrics {
            loss,
            accuracy: if samples == 0 { 0.0 } else { correct as f32 / samples as f32 },
            samples,
        })
    }

    /// Train on one externally managed batch.
    ///
    /// `data` is `(batch_size, n0)` and `labels` `(batch_size, nL)`, one sample
    /// per row. Raw data is normalized (if configured) and preprocessed here.
    /// Returns the pre-update predictions, one sample per row.
    pub fn single_batch_pass(
        &mut self,
        data: ArrayView2<f32>,
        labels: ArrayView2<f32>,
    ) -> PCNResult<Array2<f32>> {
        if data.nrows() != labels.nrows() {
            return Err(PCNError::ShapeMismatch(format!(
                "{} data rows but {} label rows",
                data.nrows(),
                labels.nrows()
            )));
        }
        let x0 = self.prepare_input(data);
        let targets = data::to_feature_major(labels);
        let predictions = self.train_batch(&x0, &targets)?;
        Ok(predictions.reversed_axes())
    }

    /// Raw feedforward output for `(batch_size, n0)` data, one sample per row.
    ///
    /// No inference and no weight update take place.
    pub fn batch_inference(&self, data: ArrayView2<f32>) -> PCNResult<Array2<f32>> {
        let x0 = self.prepare_input(data);
        let mut x = self.network.feedforward(&x0)?;
        let output = x.swap_remove(self.network.output_layer());
        Ok(output.reversed_axes())
    }

    /// Feedforward output for a single flat sample.
    pub fn predict_sample(&self, input: &Array1<f32>) -> PCNResult<Array1<f32>> {
        let output = self.batch_inference(input.view().insert_axis(Axis(0)))?;
        Ok(output.row(0).to_owned())
    }

    fn prepare_input(&self, data: ArrayView2<f32>) -> Array2<f32> {
        let mut x0 = data::to_feature_major(data);
        if self.config.normalize_input {
            x0 = data::normalize_input(&x0);
        }
        self.config.activation.preprocess(&x0)
    }

    fn check_sample_shapes(
        &self,
        samples: &[Array1<f32>],
        labels: &[Array1<f32>],
    ) -> PCNResult<()> {
        let dims = self.network.dims();
        let (n_in, n_out) = (dims[0], dims[dims.len() - 1]);
        if let Some(s) = samples.first() {
            if s.len() != n_in {
                return Err(PCNError::ShapeMismatch(format!(
                    "samples have length {}, input layer has {n_in}",
                    s.len()
                )));
            }
        }
        if let Some(l) = labels.first() {
            if l.len() != n_out {
                return Err(PCNError::ShapeMismatch(format!(
                    "labels have length {}, output layer has {n_out}",
                    l.len()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Activation, Optimizer};
    use ndarray::array;

    #[test]
    fn test_mse_properties() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let b = array![[0.0, 2.0], [3.0, 6.0]];
        assert_eq!(mse(&a, &a).unwrap(), 0.0);
        assert_eq!(mse(&a, &b).unwrap(), mse(&b, &a).unwrap());
        // (1 + 0 + 0 + 4) / 4
        assert_eq!(mse(&a, &b).unwrap(), 1.25);
        assert!(mse(&a, &array![[1.0]]).is_err());
    }

    #[test]
    fn test_accuracy_all_and_none() {
        let truth = array![[1.0, 0.0, 1.0], [0.0, 1.0, 0.0]];
        let right = array![[0.9, 0.2, 0.6], [0.1, 0.8, 0.4]];
        let wrong = array![[0.1, 0.8, 0.4], [0.9, 0.2, 0.6]];
        assert_eq!(accuracy(&right, &truth).unwrap(), 1.0);
        assert_eq!(accuracy(&wrong, &truth).unwrap(), 0.0);
    }

    #[test]
    fn test_argmax_takes_first_maximum() {
        assert_eq!(argmax([1.0, 3.0, 3.0].iter()), Some(1));
        assert_eq!(argmax([-2.0, -1.0, -1.0, -3.0].iter()), Some(1));
        assert_eq!(argmax(std::iter::empty()), None);
    }

    #[test]
    fn test_configure_keeps_adam_step() {
        let config = Config {
            optimizer: Optimizer::Adam,
            batch_size: 2,
            ..Default::default()
        };
        let mut trainer = Trainer::new(vec![2, 3, 2], config.clone()).unwrap();
        trainer
            .single_batch_pass(
                array![[0.1, 0.2], [0.3, 0.4]].view(),
                array![[1.0, 0.0], [0.0, 1.0]].view(),
            )
            .unwrap();
        assert_eq!(trainer.optimizer_state.t, 3);

        trainer
            .configure(Config {
                activation: Activation::Sigmoid,
                ..config
            })
            .unwrap();
        assert_eq!(trainer.optimizer_state.t, 3);
        assert_eq!(trainer.network.activation, Activation::Sigmoid);
    }

    #[test]
    fn test_resume_keeps_activation_and_optimizer() {
        let network = PCN::new(vec![2, 3, 2], Activation::Sigmoid).unwrap();
        let mut optimizer_state = OptimizerState::new(&network);
        optimizer_state.t = 12;

        let relu = Config::default();
        assert!(matches!(
            Trainer::resume(network.clone(), optimizer_state.clone(), relu),
            Err(PCNError::InvalidConfig(_))
        ));

        let sigmoid = Config {
            activation: Activation::Sigmoid,
            ..Config::default()
        };
        let trainer = Trainer::resume(network.clone(), optimizer_state, sigmoid.clone()).unwrap();
        assert_eq!(trainer.network.activation, Activation::Sigmoid);
        assert_eq!(trainer.optimizer_state.t, 12);

        let other = PCN::new(vec![2, 3, 3, 2], Activation::Sigmoid).unwrap();
        let mismatched = OptimizerState::new(&other);
        assert!(Trainer::resume(network, mismatched, sigmoid).is_err());
    }

    #[test]
    fn test_evaluate_empty_is_zero() {
        let trainer = Trainer::new(vec![2, 3, 2], Config::default()).unwrap();
        let metrics = trainer.evaluate(&[], &[]).unwrap();
        assert_eq!(metrics, EvalMetrics::default());
    }

    #[test]
    fn test_batch_inference_is_sample_major() {
        let trainer = Trainer::new(vec![3, 4, 2], Config::default()).unwrap();
        let out = trainer.batch_inference(Array2::zeros((5, 3)).view()).unwrap();
        assert_eq!(out.dim(), (5, 2));

        let single = trainer.predict_sample(&array![0.1, 0.2, 0.3]).unwrap();
        assert_eq!(single.len(), 2);
    }
}
