//! Scalar activation kernels and their derivatives.
//!
//! These are the elementwise building blocks behind [`crate::Activation`].

/// Lower/upper bound applied before taking a logit, keeps `ln(x / (1 - x))` finite.
pub const LOGIT_CLAMP: f32 = 1e-6;

/// Activation function: identity (linear layers).
#[inline]
pub fn identity(x: f32) -> f32 {
    x
}

/// Derivative of identity activation.
#[inline]
pub fn d_identity(_x: f32) -> f32 {
    1.0
}

/// Activation function: ReLU.
#[inline]
pub fn relu(x: f32) -> f32 {
    x.max(0.0)
}

/// Derivative of ReLU, taken as 0 at the origin.
#[inline]
pub fn d_relu(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Activation function: logistic sigmoid.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Derivative of sigmoid: σ(x)(1 - σ(x)).
#[inline]
pub fn d_sigmoid(x: f32) -> f32 {
    let s = sigmoid(x);
    s * (1.0 - s)
}

/// Inverse of the sigmoid, `ln(x / (1 - x))`.
///
/// Inputs are clamped to `[LOGIT_CLAMP, 1 - LOGIT_CLAMP]`, so 0 and 1 map to
/// large finite values instead of infinities.
#[inline]
pub fn logit(x: f32) -> f32 {
    let p = x.clamp(LOGIT_CLAMP, 1.0 - LOGIT_CLAMP);
    (p / (1.0 - p)).ln()
}
