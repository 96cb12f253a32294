//! # pc-engine
//!
//! Predictive Coding (PC) training for layered, fully-connected networks.
//!
//! ## Overview
//!
//! PC replaces backpropagation with a three-phase loop per batch:
//! 1. **Feedforward** the input through every layer.
//! 2. **Inference**: clamp the output layer to the target and relax the hidden
//!    layers until their local prediction errors settle.
//! 3. **Weight update** from the settled errors, using only quantities local to
//!    each layer.
//!
//! ## Structure
//!
//! - [`core`]: Weight store, feedforward, inference, gradients, optimizers
//! - [`training`]: The [`Trainer`] context object, training loop, metrics
//! - [`data`]: Batching and dataset helpers
//! - [`checkpoint`]: JSON save/load of trained networks
//! - [`utils`]: Scalar activation kernels

pub mod checkpoint;
pub mod core;
pub mod data;
pub mod training;
pub mod utils;

pub use core::{
    Activation, AdamStep, BatchState, Gradients, InferenceParams, Optimizer, OptimizerParams,
    OptimizerState, PCNError, PCNResult, PCN,
};
pub use data::{make_batches, one_hot};
pub use training::{accuracy, argmax, mse, rmse, EvalMetrics, History, Trainer};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Training configuration.
///
/// Deserializes from JSON with every field optional. Unknown activation or
/// optimizer names fall back to `relu` / `none` with a warning.
///
/// ```json
/// { "batch_size": 32, "epochs": 5, "activation": "sigmoid", "optimizer": "adam" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub batch_size: usize,
    pub epochs: usize,
    /// Maximum inference iterations per batch
    pub max_it: usize,
    pub activation: Activation,
    pub optimizer: Optimizer,
    pub learning_rate: f32,
    /// Fraction of the training batches processed each epoch, in (0, 1]
    pub dataset_perc: f32,
    /// Inference rate β
    pub beta: f32,
    pub min_inference_error: f32,
    /// β1: Adam first-moment decay, also the SGD momentum
    pub momentum: f32,
    /// β2: Adam second-moment decay
    pub beta2: f32,
    pub epsilon: f32,
    pub adam_step: AdamStep,
    /// Squash raw inputs with `clamp(x^1.5 / 4, 0, 1)` in the batch-level entry points
    pub normalize_input: bool,
    /// Log running accuracy every this many batches
    pub log_every: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: 1,
            epochs: 1,
            max_it: 10,
            activation: Activation::Relu,
            optimizer: Optimizer::Plain,
            learning_rate: 0.001,
            dataset_perc: 1.0,
            beta: 0.1,
            min_inference_error: 1e-8,
            momentum: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            adam_step: AdamStep::PerLayer,
            normalize_input: false,
            log_every: 50,
        }
    }
}

impl Config {
    /// Check the numeric ranges of the configuration.
    ///
    /// # Errors
    /// - `InvalidConfig` naming the first offending field
    pub fn validate(&self) -> PCNResult<()> {
        let fail = |msg: &str| Err(PCNError::InvalidConfig(msg.to_string()));
        if self.batch_size == 0 {
            return fail("batch_size must be > 0");
        }
        if self.epochs == 0 {
            return fail("epochs must be >= 1");
        }
        if self.max_it == 0 {
            return fail("max_it must be >= 1");
        }
        if !(self.dataset_perc > 0.0 && self.dataset_perc <= 1.0) {
            return fail("dataset_perc must be in (0, 1]");
        }
        if self.log_every == 0 {
            return fail("log_every must be > 0");
        }
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> PCNResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PCNError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Config = serde_json::from_str(&contents).map_err(|e| {
            PCNError::InvalidConfig(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn inference_params(&self) -> InferenceParams {
        InferenceParams {
            beta: self.beta,
            min_inference_error: self.min_inference_error,
            max_it: self.max_it,
        }
    }

    pub fn optimizer_params(&self) -> OptimizerParams {
        OptimizerParams {
            learning_rate: self.learning_rate,
            beta1: self.momentum,
            beta2: self.beta2,
            epsilon: self.epsilon,
            adam_step: self.adam_step,
        }
    }
}
