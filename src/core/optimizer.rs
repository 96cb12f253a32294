//! Weight-update policies and their accumulator state.
//!
//! PC gradients point toward lower prediction error directly, so every policy
//! *adds* its step to the parameters:
//!
//! ```text
//! none : w += α dw
//! sgd  : v  = β1 v + α dw;                 w += v
//! adam : v  = β1 v + (1-β1) dw
//!        s  = β2 s + (1-β2) dw²
//!        w += α √(1-β2^t) / (1-β1^t) · v / (√s + ε)
//! ```

use super::{Gradients, PCNError, PCNResult, PCN};
use ndarray::{Array1, Array2, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Weight-update policy, resolved once from its name at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Optimizer {
    /// Plain gradient ascent, registered as `"none"`.
    #[default]
    Plain,
    /// Bias-corrected first/second moment update.
    Adam,
    /// Momentum SGD.
    Sgd,
}

impl Optimizer {
    pub const ALL: [Optimizer; 3] = [Optimizer::Plain, Optimizer::Adam, Optimizer::Sgd];

    /// Look up an optimizer by name, returning `None` if it is not registered.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Optimizer::Plain),
            "adam" => Some(Optimizer::Adam),
            "sgd" => Some(Optimizer::Sgd),
            _ => None,
        }
    }

    /// Look up an optimizer by name, falling back to `"none"` with a warning.
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            let fallback = Optimizer::default();
            log::warn!("optimizer '{name}' not found, using default '{fallback}'");
            fallback
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Optimizer::Plain => "none",
            Optimizer::Adam => "adam",
            Optimizer::Sgd => "sgd",
        }
    }
}

impl fmt::Display for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Optimizer {
    fn from(name: String) -> Self {
        Optimizer::from_name(&name)
    }
}

impl From<Optimizer> for String {
    fn from(optimizer: Optimizer) -> Self {
        optimizer.name().to_string()
    }
}

/// When the Adam time step `t` advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdamStep {
    /// Once per layer per update call, so `t` grows by `L` every batch.
    #[default]
    PerLayer,
    /// Once per update call.
    PerBatch,
}

/// Scalar hyperparameters shared by all policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerParams {
    /// Learning rate α
    pub learning_rate: f32,
    /// First-moment / momentum coefficient β1
    pub beta1: f32,
    /// Second-moment coefficient β2
    pub beta2: f32,
    /// Numerical-stability ε
    pub epsilon: f32,
    pub adam_step: AdamStep,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            adam_step: AdamStep::PerLayer,
        }
    }
}

/// Per-layer moment estimates plus the Adam time step.
///
/// Always allocated with the same shapes as the network parameters, even when
/// the selected policy never reads them.
#[derive(Debug, Clone)]
pub struct OptimizerState {
    /// First moment of weight gradients (momentum velocity for SGD)
    pub vdw: Vec<Array2<f32>>,
    /// First moment of bias gradients
    pub vdb: Vec<Array1<f32>>,
    /// Second moment of weight gradients
    pub sdw: Vec<Array2<f32>>,
    /// Second moment of bias gradients
    pub sdb: Vec<Array1<f32>>,
    /// Adam time step, starts at 1 and is never reset.
    pub t: u64,
}

impl OptimizerState {
    /// Zero-initialized state matching the shapes of `pcn`'s parameters.
    pub fn new(pcn: &PCN) -> Self {
        Self {
            vdw: pcn.w.iter().map(|w| Array2::zeros(w.dim())).collect(),
            vdb: pcn.b.iter().map(|b| Array1::zeros(b.len())).collect(),
            sdw: pcn.w.iter().map(|w| Array2::zeros(w.dim())).collect(),
            sdb: pcn.b.iter().map(|b| Array1::zeros(b.len())).collect(),
            t: 1,
        }
    }

    /// Apply one update of `optimizer` to every layer of `pcn`.
    ///
    /// # Errors
    /// - `ShapeMismatch` if the gradients or this state do not match the network
    pub fn step(
        &mut self,
        pcn: &mut PCN,
        grads: &Gradients,
        optimizer: Optimizer,
        params: &OptimizerParams,
    ) -> PCNResult<()> {
        pcn.check_gradients(grads)?;
        if self.vdw.len() != pcn.w.len() {
            return Err(PCNError::ShapeMismatch(format!(
                "optimizer state has {} layers, network has {}",
                self.vdw.len(),
                pcn.w.len()
            )));
        }

        let lr = params.learning_rate;
        let b1 = params.beta1;
        let b2 = params.beta2;

        for l in 0..pcn.w.len() {
            let dw = &grads.dw[l];
            let db = &grads.db[l];

            match optimizer {
                Optimizer::Plain => {
                    pcn.apply_update(l, &(lr * dw), &(lr * db))?;
                }
                Optimizer::Adam => {
                    self.vdw[l].zip_mut_with(dw, |v, &g| *v = b1 * *v + (1.0 - b1) * g);
                    self.vdb[l].zip_mut_with(db, |v, &g| *v = b1 * *v + (1.0 - b1) * g);
                    self.sdw[l].zip_mut_with(dw, |s, &g| *s = b2 * *s + (1.0 - b2) * g * g);
                    self.sdb[l].zip_mut_with(db, |s, &g| *s = b2 * *s + (1.0 - b2) * g * g);

                    let rate = lr * bias_correction(b2, self.t).sqrt() / bias_correction(b1, self.t);
                    let eps = params.epsilon;
                    let delta_w = Zip::from(&self.vdw[l])
                        .and(&self.sdw[l])
                        .map_collect(|&v, &s| rate * v / (s.sqrt() + eps));
                    let delta_b = Zip::from(&self.vdb[l])
                        .and(&self.sdb[l])
                        .map_collect(|&v, &s| rate * v / (s.sqrt() + eps));
                    pcn.apply_update(l, &delta_w, &delta_b)?;

                    if params.adam_step == AdamStep::PerLayer {
                        self.t += 1;
                    }
                }
                Optimizer::Sgd => {
                    self.vdw[l].zip_mut_with(dw, |v, &g| *v = b1 * *v + lr * g);
                    self.vdb[l].zip_mut_with(db, |v, &g| *v = b1 * *v + lr * g);
                    pcn.apply_update(l, &self.vdw[l], &self.vdb[l])?;
                }
            }
        }

        if optimizer == Optimizer::Adam && params.adam_step == AdamStep::PerBatch {
            self.t += 1;
        }

        Ok(())
    }

    /// Bias-corrected Adam moments for the weights of `layer` at the current step:
    /// `(vdw / (1 - β1^t), sdw / (1 - β2^t))`.
    pub fn corrected_weight_moments(
        &self,
        layer: usize,
        params: &OptimizerParams,
    ) -> (Array2<f32>, Array2<f32>) {
        let c1 = bias_correction(params.beta1, self.t);
        let c2 = bias_correction(params.beta2, self.t);
        (&self.vdw[layer] / c1, &self.sdw[layer] / c2)
    }
}

/// `1 - β^t`
fn bias_correction(beta: f32, t: u64) -> f32 {
    let exponent = i32::try_from(t).unwrap_or(i32::MAX);
    1.0 - beta.powi(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Activation;

    fn zero_grads(pcn: &PCN) -> Gradients {
        Gradients {
            dw: pcn.w.iter().map(|w| Array2::zeros(w.dim())).collect(),
            db: pcn.b.iter().map(|b| Array1::zeros(b.len())).collect(),
        }
    }

    #[test]
    fn test_optimizer_names() {
        for opt in Optimizer::ALL {
            assert_eq!(Optimizer::parse(opt.name()), Some(opt));
        }
        assert_eq!(Optimizer::from_name("rmsprop"), Optimizer::Plain);
    }

    #[test]
    fn test_state_shapes_match_network() {
        let pcn = PCN::new(vec![4, 6, 2], Activation::Relu).unwrap();
        let state = OptimizerState::new(&pcn);
        assert_eq!(state.vdw.len(), 2);
        assert_eq!(state.vdw[0].dim(), (6, 4));
        assert_eq!(state.sdb[1].len(), 2);
        assert_eq!(state.t, 1);
    }

    #[test]
    fn test_plain_adds_scaled_gradient() {
        let mut pcn = PCN::new(vec![2, 2, 1], Activation::Linear).unwrap();
        let before = pcn.w[1].clone();
        let mut state = OptimizerState::new(&pcn);
        let mut grads = zero_grads(&pcn);
        grads.dw[1].fill(1.0);
        grads.db[1].fill(2.0);

        let params = OptimizerParams {
            learning_rate: 0.5,
            ..Default::default()
        };
        state.step(&mut pcn, &grads, Optimizer::Plain, &params).unwrap();

        assert_eq!(pcn.w[1], before + 0.5);
        assert_eq!(pcn.b[1][0], 1.0);
        assert_eq!(state.t, 1);
    }

    #[test]
    fn test_sgd_accumulates_velocity() {
        let mut pcn = PCN::new(vec![2, 2, 1], Activation::Linear).unwrap();
        let before = pcn.b[0].clone();
        let mut state = OptimizerState::new(&pcn);
        let mut grads = zero_grads(&pcn);
        grads.db[0].fill(1.0);

        let params = OptimizerParams {
            learning_rate: 1.0,
            beta1: 0.5,
            ..Default::default()
        };
        state.step(&mut pcn, &grads, Optimizer::Sgd, &params).unwrap();
        state.step(&mut pcn, &grads, Optimizer::Sgd, &params).unwrap();

        // v1 = 1.0, v2 = 0.5 + 1.0
        assert_eq!(state.vdb[0][0], 1.5);
        assert_eq!(pcn.b[0], before + 2.5);
    }

    #[test]
    fn test_adam_step_counter_policies() {
        let mut pcn = PCN::new(vec![3, 4, 4, 2], Activation::Relu).unwrap();
        let grads = zero_grads(&pcn);

        let mut per_layer = OptimizerState::new(&pcn);
        per_layer
            .step(&mut pcn, &grads, Optimizer::Adam, &OptimizerParams::default())
            .unwrap();
        assert_eq!(per_layer.t, 4);

        let mut per_batch = OptimizerState::new(&pcn);
        let params = OptimizerParams {
            adam_step: AdamStep::PerBatch,
            ..Default::default()
        };
        per_batch.step(&mut pcn, &grads, Optimizer::Adam, &params).unwrap();
        assert_eq!(per_batch.t, 2);
    }

    #[test]
    fn test_adam_first_step_moves_by_learning_rate() {
        let mut pcn = PCN::new(vec![2, 2, 1], Activation::Linear).unwrap();
        let before = pcn.w[0].clone();
        let mut state = OptimizerState::new(&pcn);
        let mut grads = zero_grads(&pcn);
        grads.dw[0].fill(0.3);

        let params = OptimizerParams {
            learning_rate: 0.01,
            ..Default::default()
        };
        state.step(&mut pcn, &grads, Optimizer::Adam, &params).unwrap();

        let moved = &pcn.w[0] - &before;
        for d in moved.iter() {
            assert!((d - 0.01).abs() < 1e-5, "unexpected Adam step {d}");
        }
    }

    #[test]
    fn test_rejects_mismatched_gradients() {
        let mut pcn = PCN::new(vec![2, 2, 1], Activation::Linear).unwrap();
        let mut state = OptimizerState::new(&pcn);
        let mut grads = zero_grads(&pcn);
        grads.dw[0] = Array2::zeros((3, 3));
        let result = state.step(&mut pcn, &grads, Optimizer::Plain, &OptimizerParams::default());
        assert!(matches!(result, Err(PCNError::ShapeMismatch(_))));
    }
}
