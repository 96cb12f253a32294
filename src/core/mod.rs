//! Core predictive coding engine.
//!
//! This module provides the fundamental PC structures and operations:
//! - Weight store (weights, biases) with small symmetric initialization
//! - Batched feedforward pass
//! - Iterative inference: hidden-layer relaxation with adaptive step size
//! - Local (Hebbian-like) gradients from the settled error state
//!
//! ## Notation
//!
//! Layers are indexed `0` (input) to `L` (output). Weights run bottom-up:
//! ```text
//! x^l = W^{l-1} F(x^{l-1}) + b^{l-1}          (feedforward)
//! e^l = x^l - (W^{l-1} F(x^{l-1}) + b^{l-1})  (prediction error, unit variance)
//! ```
//!
//! Batches are feature-major: `x[l]` has shape `(neurons[l], batch_size)`.

pub mod activation;
pub mod optimizer;

pub use activation::Activation;
pub use optimizer::{AdamStep, Optimizer, OptimizerParams, OptimizerState};

use ndarray::{Array1, Array2, Axis};
use ndarray_rand::RandomExt;
use rand::distributions::Uniform;
use rand::Rng;
use std::error::Error;
use std::fmt;

/// Weights are drawn from `U(-0.5, 0.5) * INIT_SCALE`.
pub const INIT_SCALE: f32 = 1.0 / 11.0;

/// Error type for PC operations.
#[derive(Debug, Clone, PartialEq)]
pub enum PCNError {
    /// Shape mismatch in matrix operations
    ShapeMismatch(String),
    /// Invalid network or training configuration
    InvalidConfig(String),
    /// Dataset or batch with no samples
    EmptyDataset(String),
    /// Checkpoint could not be written or read back
    Checkpoint(String),
}

impl fmt::Display for PCNError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PCNError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            PCNError::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            PCNError::EmptyDataset(msg) => write!(f, "Empty dataset: {}", msg),
            PCNError::Checkpoint(msg) => write!(f, "Checkpoint error: {}", msg),
        }
    }
}

impl Error for PCNError {}

pub type PCNResult<T> = Result<T, PCNError>;

/// Hyperparameters of one inference (relaxation) run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceParams {
    /// Initial inference step size β; halved in place during a run, never persisted.
    pub beta: f32,
    /// Stop once `|mean(current_error - prev_error)|` falls below this.
    pub min_inference_error: f32,
    /// Hard iteration ceiling.
    pub max_it: usize,
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            beta: 0.1,
            min_inference_error: 1e-8,
            max_it: 10,
        }
    }
}

/// A layered, fully-connected predictive coding network.
///
/// # Architecture
///
/// - **Layers:** `dims = [n0, n1, ..., nL]`, at least three of them
/// - **Weights:** `w[l]` maps layer `l` to `l+1`, shape `(n_{l+1}, n_l)`
/// - **Biases:** `b[l]` has length `n_{l+1}` (a column vector broadcast over the batch)
/// - **Activation:** one function `F` for every layer
#[derive(Debug, Clone)]
pub struct PCN {
    /// Network layer dimensions: [n0, n1, ..., nL]
    pub dims: Vec<usize>,
    /// Weight matrices, one per layer transition
    pub w: Vec<Array2<f32>>,
    /// Bias vectors, one per layer transition
    pub b: Vec<Array1<f32>>,
    pub activation: Activation,
}

/// Activations and errors of one batch during inference.
///
/// `e[0]` belongs to the input layer, which is never predicted, and stays zero.
#[derive(Debug, Clone)]
pub struct BatchState {
    /// x[l]: activations at layer l, shape (n_l, batch_size)
    pub x: Vec<Array2<f32>>,
    /// e[l]: prediction error at layer l, shape (n_l, batch_size)
    pub e: Vec<Array2<f32>>,
    pub batch_size: usize,
    /// Number of inference iterations actually run
    pub steps_taken: usize,
    /// Step size after any halvings
    pub final_beta: f32,
    /// Whether the error-delta threshold stopped the loop before `max_it`
    pub converged: bool,
    /// Per-sample error measure from the last iteration
    pub final_error: Array1<f32>,
}

impl BatchState {
    /// Total prediction error energy: `E = (1/2) Σ_l ||e^l||²` summed over the batch.
    pub fn energy(&self) -> f32 {
        0.5 * self.e.iter().map(|e| e.iter().map(|v| v * v).sum::<f32>()).sum::<f32>()
    }
}

/// Weight and bias gradients, indexed like [`PCN::w`] and [`PCN::b`].
#[derive(Debug, Clone)]
pub struct Gradients {
    pub dw: Vec<Array2<f32>>,
    pub db: Vec<Array1<f32>>,
}

impl PCN {
    /// Create a new network with the given layer dimensions.
    ///
    /// Weights are drawn from `U(-0.5, 0.5) / 11` with the thread RNG; biases start at zero.
    ///
    /// # Errors
    /// - `InvalidConfig` if there are fewer than 3 layers or a layer is empty
    pub fn new(dims: Vec<usize>, activation: Activation) -> PCNResult<Self> {
        let mut rng = rand::thread_rng();
        Self::with_rng(dims, activation, &mut rng)
    }

    /// Create a new network drawing its initial weights from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(
        dims: Vec<usize>,
        activation: Activation,
        rng: &mut R,
    ) -> PCNResult<Self> {
        if dims.len() < 3 {
            return Err(PCNError::InvalidConfig(format!(
                "Must have at least 3 layers (input, hidden, output), got {}",
                dims.len()
            )));
        }
        if let Some(l) = dims.iter().position(|&n| n == 0) {
            return Err(PCNError::InvalidConfig(format!("Layer {l} has no neurons")));
        }

        let half = 0.5 * INIT_SCALE;
        let dist = Uniform::new(-half, half);
        let mut w = Vec::with_capacity(dims.len() - 1);
        let mut b = Vec::with_capacity(dims.len() - 1);
        for pair in dims.windows(2) {
            let (this_layer, next_layer) = (pair[0], pair[1]);
            w.push(Array2::random_using((next_layer, this_layer), &dist, rng));
            b.push(Array1::zeros(next_layer));
        }

        Ok(Self {
            dims,
            w,
            b,
            activation,
        })
    }

    /// Returns the network's layer dimensions.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Index of the output layer, `L`.
    pub fn output_layer(&self) -> usize {
        self.dims.len() - 1
    }

    /// Add `delta_w` / `delta_b` to the parameters of transition `layer`.
    ///
    /// # Errors
    /// - `ShapeMismatch` if `layer` is out of range or a delta has the wrong shape
    pub fn apply_update(
        &mut self,
        layer: usize,
        delta_w: &Array2<f32>,
        delta_b: &Array1<f32>,
    ) -> PCNResult<()> {
        let (w, b) = match (self.w.get_mut(layer), self.b.get_mut(layer)) {
            (Some(w), Some(b)) => (w, b),
            _ => {
                return Err(PCNError::ShapeMismatch(format!(
                    "layer {layer} out of range for {} transitions",
                    self.dims.len() - 1
                )))
            }
        };
        if w.dim() != delta_w.dim() || b.len() != delta_b.len() {
            return Err(PCNError::ShapeMismatch(format!(
                "update for layer {layer}: w {:?} vs delta {:?}, b {} vs delta {}",
                w.dim(),
                delta_w.dim(),
                b.len(),
                delta_b.len()
            )));
        }
        *w += delta_w;
        *b += delta_b;
        Ok(())
    }

    /// Verify that `grads` has one correctly-shaped entry per layer transition.
    pub fn check_gradients(&self, grads: &Gradients) -> PCNResult<()> {
        if grads.dw.len() != self.w.len() || grads.db.len() != self.b.len() {
            return Err(PCNError::ShapeMismatch(format!(
                "expected {} gradient layers, got {} / {}",
                self.w.len(),
                grads.dw.len(),
                grads.db.len()
            )));
        }
        for l in 0..self.w.len() {
            if grads.dw[l].dim() != self.w[l].dim() || grads.db[l].len() != self.b[l].len() {
                return Err(PCNError::ShapeMismatch(format!(
                    "gradient for layer {l}: dw {:?} vs w {:?}",
                    grads.dw[l].dim(),
                    self.w[l].dim()
                )));
            }
        }
        Ok(())
    }

    /// Prediction of layer `l` from the layer below: `W^{l-1} F(x^{l-1}) + b^{l-1}`.
    fn predict(&self, l: usize, below: &Array2<f32>) -> Array2<f32> {
        let mut mu = self.w[l - 1].dot(&self.activation.apply(below));
        mu += &self.b[l - 1].view().insert_axis(Axis(1));
        mu
    }

    /// Batched forward pass.
    ///
    /// Returns `[x0, x1, ..., xL]` where `x[l] = W^{l-1} F(x^{l-1}) + b^{l-1}`.
    /// `F` is only applied when a layer is consumed, never to `x0` itself.
    ///
    /// # Errors
    /// - `ShapeMismatch` if `x0` does not have `dims[0]` rows
    pub fn feedforward(&self, x0: &Array2<f32>) -> PCNResult<Vec<Array2<f32>>> {
        if x0.nrows() != self.dims[0] {
            return Err(PCNError::ShapeMismatch(format!(
                "input has {} rows, network expects {}",
                x0.nrows(),
                self.dims[0]
            )));
        }

        let mut x = Vec::with_capacity(self.dims.len());
        x.push(x0.clone());
        for l in 1..self.dims.len() {
            let next = self.predict(l, &x[l - 1]);
            x.push(next);
        }
        Ok(x)
    }

    /// Recompute `e[l] = x[l] - (W^{l-1} F(x^{l-1}) + b^{l-1})` for every `l ∈ [1, L]`.
    pub fn compute_batch_errors(&self, state: &mut BatchState) {
        for l in 1..self.dims.len() {
            let mu = self.predict(l, &state.x[l - 1]);
            state.e[l] = &state.x[l] - &mu;
        }
    }

    /// One relaxation step over the hidden layers.
    ///
    /// For `l ∈ [1, L-1]`:
    /// ```text
    /// g   = (W^l)ᵀ e^{l+1} ⊙ F'(x^l)
    /// x^l = x^l + β (g - e^l)
    /// ```
    ///
    /// Input and output layers are left untouched. Errors are not refreshed;
    /// call [`PCN::compute_batch_errors`] afterwards.
    pub fn relax_step(&self, state: &mut BatchState, beta: f32) {
        let out = self.output_layer();
        for l in 1..out {
            let feedback = self.w[l].t().dot(&state.e[l + 1]);
            let g = feedback * &self.activation.derivative(&state.x[l]);
            let delta = g - &state.e[l];
            state.x[l].scaled_add(beta, &delta);
        }
    }

    /// Relax hidden activations with the output clamped to `target`.
    ///
    /// # Algorithm
    ///
    /// 1. Clamp `x[L] = target` and compute all errors.
    /// 2. `prev[b] = Σ_l (Σ_n e^l[n, b])²`
    /// 3. Up to `max_it` times: relax the hidden layers, recompute errors,
    ///    `curr[b] = Σ_l Σ_n e^l[n, b]²`; halve β if more than one sample's
    ///    error grew; stop when `|mean(curr - prev)| < min_inference_error`.
    ///
    /// The two error measures differ (square of sums first, sum of squares
    /// afterwards) and are kept that way since the step-size heuristic is
    /// tuned against it.
    ///
    /// # Errors
    /// - `ShapeMismatch` if `x` or `target` do not fit the network
    /// - `EmptyDataset` if the batch has no samples
    pub fn relax(
        &self,
        x: Vec<Array2<f32>>,
        target: &Array2<f32>,
        params: &InferenceParams,
    ) -> PCNResult<BatchState> {
        let mut state = self.init_batch_state(x)?;
        let out = self.output_layer();
        if target.dim() != state.x[out].dim() {
            return Err(PCNError::ShapeMismatch(format!(
                "target {:?} does not match output layer {:?}",
                target.dim(),
                state.x[out].dim()
            )));
        }
        state.x[out].assign(target);

        self.compute_batch_errors(&mut state);
        let mut prev_error = square_of_sums(&state.e[1..]);
        let mut beta = params.beta;

        for it in 0..params.max_it {
            self.relax_step(&mut state, beta);
            self.compute_batch_errors(&mut state);
            let current_error = sum_of_squares(&state.e[1..]);
            state.steps_taken = it + 1;

            let increased = current_error
                .iter()
                .zip(prev_error.iter())
                .filter(|(c, p)| c > p)
                .count();
            if increased > 1 {
                beta /= 2.0;
            }

            let mean_delta = (&current_error - &prev_error).mean().unwrap_or(0.0);
            prev_error = current_error;
            if mean_delta.abs() < params.min_inference_error {
                state.converged = true;
                break;
            }
        }

        if prev_error.iter().any(|v| !v.is_finite()) {
            log::warn!(
                "inference error is not finite after {} iterations (beta={beta})",
                state.steps_taken
            );
        }

        state.final_beta = beta;
        state.final_error = prev_error;
        Ok(state)
    }

    /// Local gradients from a relaxed state.
    ///
    /// ```text
    /// db^l = mean_b e^{l+1}
    /// dw^l = e^{l+1} F(x^l)ᵀ / B
    /// ```
    ///
    /// # Errors
    /// - `EmptyDataset` if the state holds no samples
    pub fn gradients(&self, state: &BatchState) -> PCNResult<Gradients> {
        if state.batch_size == 0 {
            return Err(PCNError::EmptyDataset("cannot take gradients of an empty batch".into()));
        }
        let batch_size = state.batch_size as f32;
        let mut dw = Vec::with_capacity(self.w.len());
        let mut db = Vec::with_capacity(self.b.len());
        for l in 0..self.w.len() {
            let fx = self.activation.apply(&state.x[l]);
            db.push(state.e[l + 1].sum_axis(Axis(1)) / batch_size);
            dw.push(state.e[l + 1].dot(&fx.t()) / batch_size);
        }
        Ok(Gradients { dw, db })
    }

    /// Wrap per-layer activations in a fresh state with zeroed errors.
    fn init_batch_state(&self, x: Vec<Array2<f32>>) -> PCNResult<BatchState> {
        if x.len() != self.dims.len() {
            return Err(PCNError::ShapeMismatch(format!(
                "expected activations for {} layers, got {}",
                self.dims.len(),
                x.len()
            )));
        }
        let batch_size = x[0].ncols();
        if batch_size == 0 {
            return Err(PCNError::EmptyDataset("batch has no samples".into()));
        }
        for (l, (xl, &n)) in x.iter().zip(self.dims.iter()).enumerate() {
            if xl.dim() != (n, batch_size) {
                return Err(PCNError::ShapeMismatch(format!(
                    "layer {l} activations {:?}, expected {:?}",
                    xl.dim(),
                    (n, batch_size)
                )));
            }
        }

        let e = self
            .dims
            .iter()
            .map(|&n| Array2::zeros((n, batch_size)))
            .collect();
        Ok(BatchState {
            x,
            e,
            batch_size,
            steps_taken: 0,
            final_beta: 0.0,
            converged: false,
            final_error: Array1::zeros(batch_size),
        })
    }
}

/// Per-sample `Σ_l (Σ_n e^l[n, b])²`.
pub(crate) fn square_of_sums(errors: &[Array2<f32>]) -> Array1<f32> {
    let batch_size = errors.first().map_or(0, |e| e.ncols());
    errors.iter().fold(Array1::zeros(batch_size), |acc, e| {
        acc + e.sum_axis(Axis(0)).mapv(|s| s * s)
    })
}

/// Per-sample `Σ_l Σ_n e^l[n, b]²`.
pub(crate) fn sum_of_squares(errors: &[Array2<f32>]) -> Array1<f32> {
    let batch_size = errors.first().map_or(0, |e| e.ncols());
    errors.iter().fold(Array1::zeros(batch_size), |acc, e| {
        acc + e.mapv(|v| v * v).sum_axis(Axis(0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded(dims: Vec<usize>, activation: Activation) -> PCN {
        let mut rng = StdRng::seed_from_u64(7);
        PCN::with_rng(dims, activation, &mut rng).unwrap()
    }

    #[test]
    fn test_network_init() {
        let pcn = seeded(vec![4, 6, 2], Activation::Relu);
        assert_eq!(pcn.dims(), &[4, 6, 2]);
        assert_eq!(pcn.w.len(), 2);
        assert_eq!(pcn.w[0].dim(), (6, 4));
        assert_eq!(pcn.w[1].dim(), (2, 6));
        assert_eq!(pcn.b[0].len(), 6);
        assert!(pcn.b.iter().all(|b| b.iter().all(|&v| v == 0.0)));

        let bound = 0.5 * INIT_SCALE;
        for w in &pcn.w {
            assert!(w.iter().all(|&v| v >= -bound && v < bound));
        }
    }

    #[test]
    fn test_invalid_dims() {
        assert!(matches!(
            PCN::new(vec![4, 2], Activation::Relu),
            Err(PCNError::InvalidConfig(_))
        ));
        assert!(PCN::new(vec![4, 0, 2], Activation::Relu).is_err());
    }

    #[test]
    fn test_feedforward_known_values() {
        let mut pcn = seeded(vec![2, 2, 1], Activation::Linear);
        pcn.w[0] = array![[1.0, 0.0], [0.0, 2.0]];
        pcn.b[0] = array![0.5, 0.0];
        pcn.w[1] = array![[1.0, 1.0]];
        pcn.b[1] = array![-1.0];

        let x = pcn.feedforward(&array![[1.0, 0.0], [1.0, 3.0]]).unwrap();
        assert_eq!(x[1], array![[1.5, 0.5], [2.0, 6.0]]);
        assert_eq!(x[2], array![[2.5, 5.5]]);
    }

    #[test]
    fn test_feedforward_does_not_activate_raw_input() {
        let mut pcn = seeded(vec![1, 1, 1], Activation::Relu);
        pcn.w[0] = array![[1.0]];
        let x = pcn.feedforward(&array![[-2.0]]).unwrap();
        assert_eq!(x[0], array![[-2.0]]);
        // relu(-2) = 0 feeds the next layer
        assert_eq!(x[1], array![[0.0]]);
    }

    #[test]
    fn test_feedforward_rejects_wrong_input_size() {
        let pcn = seeded(vec![3, 2, 1], Activation::Relu);
        let result = pcn.feedforward(&Array2::zeros((2, 4)));
        assert!(matches!(result, Err(PCNError::ShapeMismatch(_))));
    }

    #[test]
    fn test_error_measures() {
        let e = vec![array![[1.0, -1.0], [2.0, 1.0]], array![[3.0, 0.0]]];
        // sample 0: (1+2)² + 3² = 18, sample 1: (-1+1)² + 0² = 0
        assert_eq!(square_of_sums(&e), array![18.0, 0.0]);
        // sample 0: 1+4+9 = 14, sample 1: 1+1+0 = 2
        assert_eq!(sum_of_squares(&e), array![14.0, 2.0]);
    }

    #[test]
    fn test_relax_clamps_output_and_keeps_input() {
        let pcn = seeded(vec![3, 4, 2], Activation::Relu);
        let x0 = array![[1.0, 0.0], [0.5, 0.2], [0.0, 1.0]];
        let target = array![[1.0, 0.0], [0.0, 1.0]];
        let x = pcn.feedforward(&x0).unwrap();

        let state = pcn.relax(x, &target, &InferenceParams::default()).unwrap();
        assert_eq!(state.x[0], x0);
        assert_eq!(state.x[2], target);
        assert_eq!(state.batch_size, 2);
        assert!(state.steps_taken >= 1 && state.steps_taken <= 10);
        assert!(state.e[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_relax_rejects_bad_target() {
        let pcn = seeded(vec![3, 4, 2], Activation::Relu);
        let x = pcn.feedforward(&Array2::zeros((3, 2))).unwrap();
        let result = pcn.relax(x, &Array2::zeros((2, 3)), &InferenceParams::default());
        assert!(matches!(result, Err(PCNError::ShapeMismatch(_))));
    }

    /// Linear network with all parameters zero: every prediction is 0, so
    /// `e = x` and one relaxation step scales each hidden activation by `1 - β`.
    fn zeroed(dims: Vec<usize>) -> PCN {
        let mut pcn = seeded(dims, Activation::Linear);
        for w in pcn.w.iter_mut() {
            w.fill(0.0);
        }
        pcn
    }

    fn single_step(beta: f32) -> InferenceParams {
        InferenceParams {
            beta,
            min_inference_error: 1e-8,
            max_it: 1,
        }
    }

    #[test]
    fn test_beta_kept_when_one_sample_error_grows() {
        let pcn = zeroed(vec![1, 1, 1]);
        // β = 3 maps x1 to -2 x1: sample 0 error goes 1 -> 4, sample 1 stays 0.
        let x = vec![array![[0.0, 0.0]], array![[1.0, 0.0]], array![[0.0, 0.0]]];
        let state = pcn.relax(x, &Array2::zeros((1, 2)), &single_step(3.0)).unwrap();

        assert_eq!(state.x[1], array![[-2.0, 0.0]]);
        assert_eq!(state.final_error, array![4.0, 0.0]);
        assert_eq!(state.final_beta, 3.0);
    }

    #[test]
    fn test_beta_halved_when_two_sample_errors_grow() {
        let pcn = zeroed(vec![1, 1, 1]);
        let x = vec![array![[0.0, 0.0]], array![[1.0, 0.5]], array![[0.0, 0.0]]];
        let state = pcn.relax(x, &Array2::zeros((1, 2)), &single_step(3.0)).unwrap();

        assert_eq!(state.final_error, array![4.0, 1.0]);
        assert_eq!(state.final_beta, 1.5);
        assert!(!state.converged);
    }

    #[test]
    fn test_first_comparison_uses_square_of_sums() {
        let pcn = zeroed(vec![1, 2, 1]);
        // Hidden errors [1, -1] per sample: square of sums is 0, sum of squares 2.
        // After a β = 0.5 step the sum of squares is 0.5, which only counts as an
        // increase against the square-of-sums baseline.
        let x = vec![
            array![[0.0, 0.0]],
            array![[1.0, 1.0], [-1.0, -1.0]],
            array![[0.0, 0.0]],
        ];
        let state = pcn.relax(x, &Array2::zeros((1, 2)), &single_step(0.5)).unwrap();

        assert_eq!(state.final_error, array![0.5, 0.5]);
        assert_eq!(state.final_beta, 0.25);
    }

    #[test]
    fn test_gradients_known_values() {
        let mut pcn = seeded(vec![1, 1, 1], Activation::Linear);
        pcn.w[0] = array![[1.0]];
        pcn.w[1] = array![[1.0]];
        let state = BatchState {
            x: vec![array![[1.0, 3.0]], array![[2.0, 2.0]], array![[0.0, 0.0]]],
            e: vec![
                Array2::zeros((1, 2)),
                array![[1.0, 3.0]],
                array![[-2.0, 4.0]],
            ],
            batch_size: 2,
            steps_taken: 0,
            final_beta: 0.1,
            converged: false,
            final_error: Array1::zeros(2),
        };

        let grads = pcn.gradients(&state).unwrap();
        assert_eq!(grads.db[0], array![2.0]);
        assert_eq!(grads.db[1], array![1.0]);
        // (1*1 + 3*3) / 2
        assert_eq!(grads.dw[0], array![[5.0]]);
        // (-2*2 + 4*2) / 2
        assert_eq!(grads.dw[1], array![[2.0]]);
    }

    #[test]
    fn test_apply_update_checks_shapes() {
        let mut pcn = seeded(vec![2, 3, 1], Activation::Relu);
        let before = pcn.w[0].clone();
        pcn.apply_update(0, &Array2::ones((3, 2)), &Array1::ones(3)).unwrap();
        assert_eq!(pcn.w[0], before + 1.0);
        assert_eq!(pcn.b[0], Array1::<f32>::ones(3));

        assert!(pcn.apply_update(0, &Array2::ones((2, 3)), &Array1::ones(3)).is_err());
        assert!(pcn.apply_update(5, &Array2::ones((3, 2)), &Array1::ones(3)).is_err());
    }

    #[test]
    fn test_energy() {
        let pcn = seeded(vec![2, 2, 2], Activation::Linear);
        let x = pcn.feedforward(&array![[1.0], [1.0]]).unwrap();
        let state = pcn
            .relax(x, &array![[1.0], [0.0]], &InferenceParams::default())
            .unwrap();
        assert!(state.energy() >= 0.0);
    }
}
