//! Batching and dataset helpers.
//!
//! Samples and labels arrive as flat vectors. [`make_batches`] stacks them
//! column-wise into feature-major matrices of shape `(dim, batch_size)`, the
//! layout the engine computes on.

use crate::core::{Activation, PCNError, PCNResult};
use ndarray::{Array1, Array2, ArrayView2};

/// Off-class value of a smoothed one-hot label.
pub const ONE_HOT_FLOOR: f32 = 0.03;
/// On-class value of a smoothed one-hot label.
pub const ONE_HOT_CEIL: f32 = 0.97;

/// Split samples into full batches, preprocessing the data for `activation`.
///
/// Produces `floor(len / batch_size)` batches; trailing samples that do not
/// fill a batch are dropped. Label batches are not preprocessed.
///
/// # Errors
/// - `InvalidConfig` if `batch_size` is zero or exceeds the number of samples
/// - `ShapeMismatch` if sample/label counts differ or vectors have differing lengths
pub fn make_batches(
    samples: &[Array1<f32>],
    labels: &[Array1<f32>],
    batch_size: usize,
    activation: Activation,
) -> PCNResult<(Vec<Array2<f32>>, Vec<Array2<f32>>)> {
    if samples.len() != labels.len() {
        return Err(PCNError::ShapeMismatch(format!(
            "{} samples but {} labels",
            samples.len(),
            labels.len()
        )));
    }
    if batch_size == 0 || batch_size > samples.len() {
        return Err(PCNError::InvalidConfig(format!(
            "batch size {batch_size} must be in 1..={}",
            samples.len()
        )));
    }

    let n_batches = samples.len() / batch_size;
    let mut data_batches = Vec::with_capacity(n_batches);
    let mut label_batches = Vec::with_capacity(n_batches);
    for i in 0..n_batches {
        let range = i * batch_size..(i + 1) * batch_size;
        let data = stack_columns(&samples[range.clone()])?;
        data_batches.push(activation.preprocess(&data));
        label_batches.push(stack_columns(&labels[range])?);
    }
    Ok((data_batches, label_batches))
}

/// Stack equally-sized vectors as the columns of a matrix.
pub fn stack_columns(vectors: &[Array1<f32>]) -> PCNResult<Array2<f32>> {
    let dim = vectors.first().map_or(0, |v| v.len());
    let mut out = Array2::zeros((dim, vectors.len()));
    for (j, v) in vectors.iter().enumerate() {
        if v.len() != dim {
            return Err(PCNError::ShapeMismatch(format!(
                "vector {j} has length {}, expected {dim}",
                v.len()
            )));
        }
        out.column_mut(j).assign(v);
    }
    Ok(out)
}

/// Convert sample-major rows into feature-major columns.
pub fn to_feature_major(batch: ArrayView2<f32>) -> Array2<f32> {
    batch.t().to_owned()
}

/// Smoothed one-hot encoding: the true class gets [`ONE_HOT_CEIL`], every other
/// class [`ONE_HOT_FLOOR`].
///
/// # Errors
/// - `InvalidConfig` if an index is not below `num_classes`
pub fn one_hot(indices: &[usize], num_classes: usize) -> PCNResult<Vec<Array1<f32>>> {
    indices
        .iter()
        .map(|&class| {
            if class >= num_classes {
                return Err(PCNError::InvalidConfig(format!(
                    "class {class} out of range for {num_classes} classes"
                )));
            }
            let mut label = Array1::from_elem(num_classes, ONE_HOT_FLOOR);
            label[class] = ONE_HOT_CEIL;
            Ok(label)
        })
        .collect()
}

/// Rescale a dataset to `[0, 1]` using its global minimum and range.
///
/// Returns the normalized samples with the `(min, range)` pair needed by
/// [`denormalize_sample`]. A constant dataset is only shifted.
pub fn normalize_dataset(data: &[Array1<f32>]) -> (Vec<Array1<f32>>, f32, f32) {
    let min = data
        .iter()
        .flat_map(|v| v.iter())
        .fold(f32::INFINITY, |a, &b| a.min(b));
    let max = data
        .iter()
        .flat_map(|v| v.iter())
        .fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    if data.iter().all(|v| v.is_empty()) {
        return (data.to_vec(), 0.0, 1.0);
    }

    let range = if max > min { max - min } else { 1.0 };
    let normalized = data.iter().map(|v| scale_sample(v, min, range)).collect();
    (normalized, min, range)
}

/// Apply a `(min, range)` scaling from [`normalize_dataset`] to another sample.
pub fn scale_sample(sample: &Array1<f32>, min: f32, range: f32) -> Array1<f32> {
    sample.mapv(|x| (x - min) / range)
}

/// Undo [`normalize_dataset`] for one sample.
pub fn denormalize_sample(sample: &Array1<f32>, min: f32, range: f32) -> Array1<f32> {
    sample.mapv(|x| x * range + min)
}

/// Squash non-negative raw inputs into `[0, 1]` with `clamp(x^1.5 / 4, 0, 1)`.
pub fn normalize_input(x: &Array2<f32>) -> Array2<f32> {
    x.mapv(|v| (v.powf(1.5) / 4.0).clamp(0.0, 1.0))
}
