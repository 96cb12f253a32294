//! Activation registry.
//!
//! Each activation bundles three elementwise maps that must stay consistent
//! across feedforward and inference: the forward function `F`, its derivative
//! `F'`, and an input-preprocessing transform applied to data batches.

use crate::utils;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Layer nonlinearity, resolved once from its name at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Activation {
    /// f(x) = max(0, x), inputs passed through unchanged.
    #[default]
    Relu,
    /// f(x) = 1 / (1 + e^-x), inputs mapped through the logit.
    Sigmoid,
    /// f(x) = x, inputs passed through unchanged.
    Linear,
}

impl Activation {
    /// All registered activations.
    pub const ALL: [Activation; 3] = [Activation::Relu, Activation::Sigmoid, Activation::Linear];

    /// Look up an activation by name, returning `None` if it is not registered.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "relu" => Some(Activation::Relu),
            "sigmoid" => Some(Activation::Sigmoid),
            "linear" => Some(Activation::Linear),
            _ => None,
        }
    }

    /// Look up an activation by name, falling back to the default with a warning.
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            let fallback = Activation::default();
            log::warn!("activation '{name}' not found, using default '{fallback}'");
            fallback
        })
    }

    /// Name for debugging and serialization.
    pub fn name(&self) -> &'static str {
        match self {
            Activation::Relu => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Linear => "linear",
        }
    }

    /// Apply activation elementwise: F(X)
    pub fn apply(&self, x: &Array2<f32>) -> Array2<f32> {
        match self {
            Activation::Relu => x.mapv(utils::relu),
            Activation::Sigmoid => x.mapv(utils::sigmoid),
            Activation::Linear => x.clone(),
        }
    }

    /// Derivative of activation elementwise: F'(X)
    pub fn derivative(&self, x: &Array2<f32>) -> Array2<f32> {
        match self {
            Activation::Relu => x.mapv(utils::d_relu),
            Activation::Sigmoid => x.mapv(utils::d_sigmoid),
            Activation::Linear => x.mapv(utils::d_identity),
        }
    }

    /// Transform a raw data batch into the input domain this activation expects.
    ///
    /// Sigmoid networks consume logits of their `[0, 1]` inputs; the other
    /// activations use the data as-is. Labels are never preprocessed.
    pub fn preprocess(&self, x: &Array2<f32>) -> Array2<f32> {
        match self {
            Activation::Sigmoid => x.mapv(utils::logit),
            Activation::Relu | Activation::Linear => x.mapv(utils::identity),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Activation {
    fn from(name: String) -> Self {
        Activation::from_name(&name)
    }
}

impl From<Activation> for String {
    fn from(activation: Activation) -> Self {
        activation.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_parse_known_names() {
        for act in Activation::ALL {
            assert_eq!(Activation::parse(act.name()), Some(act));
        }
        assert_eq!(Activation::parse(" ReLU "), Some(Activation::Relu));
    }

    #[test]
    fn test_unknown_name_falls_back_to_relu() {
        assert_eq!(Activation::parse("tanh"), None);
        assert_eq!(Activation::from_name("tanh"), Activation::Relu);
    }

    #[test]
    fn test_relu_matrix() {
        let x = array![[-1.0, 2.0], [0.0, 3.0]];
        assert_eq!(Activation::Relu.apply(&x), array![[0.0, 2.0], [0.0, 3.0]]);
        assert_eq!(Activation::Relu.derivative(&x), array![[0.0, 1.0], [0.0, 1.0]]);
        assert_eq!(Activation::Relu.preprocess(&x), x);
    }

    #[test]
    fn test_linear_matrix() {
        let x = array![[-1.0, 2.0]];
        assert_eq!(Activation::Linear.apply(&x), x);
        assert_eq!(Activation::Linear.derivative(&x), array![[1.0, 1.0]]);
    }

    #[test]
    fn test_sigmoid_preprocess_round_trips_through_apply() {
        let x = array![[0.2, 0.5], [0.9, 0.01]];
        let recovered = Activation::Sigmoid.apply(&Activation::Sigmoid.preprocess(&x));
        for (a, b) in x.iter().zip(recovered.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_serde_is_permissive() {
        let act: Activation = serde_json::from_str("\"sigmoid\"").unwrap();
        assert_eq!(act, Activation::Sigmoid);
        let act: Activation = serde_json::from_str("\"softmax\"").unwrap();
        assert_eq!(act, Activation::Relu);
        assert_eq!(serde_json::to_string(&Activation::Linear).unwrap(), "\"linear\"");
    }
}
