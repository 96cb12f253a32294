//! Checkpoint save/load for PC networks.
//!
//! Serializes layer dimensions, activation name, weights, biases and the full
//! optimizer state (moments and Adam time step) to JSON, so a resumed run
//! continues exactly where the saved one stopped.

use crate::core::{Activation, OptimizerState, PCNError, PCNResult, PCN};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serializable checkpoint data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointData {
    /// Network layer dimensions.
    pub dims: Vec<usize>,
    pub activation: Activation,
    /// Weight matrices as nested Vec (row-major) for serialization.
    pub weights: Vec<Vec<Vec<f32>>>,
    pub biases: Vec<Vec<f32>>,
    /// Adam time step at save time.
    #[serde(default = "first_step")]
    pub optimizer_step: u64,
    /// First moments of the weight gradients (SGD velocity); empty in
    /// checkpoints written without optimizer state.
    #[serde(default)]
    pub vdw: Vec<Vec<Vec<f32>>>,
    #[serde(default)]
    pub vdb: Vec<Vec<f32>>,
    /// Second moments of the weight gradients.
    #[serde(default)]
    pub sdw: Vec<Vec<Vec<f32>>>,
    #[serde(default)]
    pub sdb: Vec<Vec<f32>>,
}

fn first_step() -> u64 {
    1
}

/// Convert an Array2 to Vec<Vec<f32>> for serialization.
fn array2_to_vecs(arr: &Array2<f32>) -> Vec<Vec<f32>> {
    arr.rows().into_iter().map(|row| row.to_vec()).collect()
}

/// Convert Vec<Vec<f32>> back to an Array2 of the expected shape.
fn vecs_to_array2(vecs: &[Vec<f32>], shape: (usize, usize)) -> PCNResult<Array2<f32>> {
    let flat: Vec<f32> = vecs.iter().flat_map(|r| r.iter().copied()).collect();
    if vecs.len() != shape.0 || vecs.iter().any(|r| r.len() != shape.1) {
        return Err(PCNError::Checkpoint(format!(
            "matrix does not have shape {shape:?}"
        )));
    }
    Array2::from_shape_vec(shape, flat)
        .map_err(|e| PCNError::Checkpoint(format!("Failed to reconstruct matrix: {e}")))
}

fn vec_to_array1(values: &[f32], len: usize, what: &str) -> PCNResult<Array1<f32>> {
    if values.len() != len {
        return Err(PCNError::Checkpoint(format!(
            "{what} has length {}, expected {len}",
            values.len()
        )));
    }
    Ok(Array1::from(values.to_vec()))
}

impl CheckpointData {
    pub fn from_network(pcn: &PCN, optimizer: &OptimizerState) -> Self {
        Self {
            dims: pcn.dims.clone(),
            activation: pcn.activation,
            weights: pcn.w.iter().map(array2_to_vecs).collect(),
            biases: pcn.b.iter().map(|b| b.to_vec()).collect(),
            optimizer_step: optimizer.t,
            vdw: optimizer.vdw.iter().map(array2_to_vecs).collect(),
            vdb: optimizer.vdb.iter().map(|v| v.to_vec()).collect(),
            sdw: optimizer.sdw.iter().map(array2_to_vecs).collect(),
            sdb: optimizer.sdb.iter().map(|v| v.to_vec()).collect(),
        }
    }

    /// Rebuild the network, checking every matrix against `dims`.
    pub fn to_network(&self) -> PCNResult<PCN> {
        let transitions = self.dims.len().saturating_sub(1);
        if self.dims.len() < 3
            || self.weights.len() != transitions
            || self.biases.len() != transitions
        {
            return Err(PCNError::Checkpoint(format!(
                "dims {:?} do not match {} weight / {} bias entries",
                self.dims,
                self.weights.len(),
                self.biases.len()
            )));
        }

        let mut w = Vec::with_capacity(transitions);
        let mut b = Vec::with_capacity(transitions);
        for l in 0..transitions {
            w.push(vecs_to_array2(&self.weights[l], (self.dims[l + 1], self.dims[l]))?);
            if self.biases[l].len() != self.dims[l + 1] {
                return Err(PCNError::Checkpoint(format!(
                    "bias {l} has length {}, expected {}",
                    self.biases[l].len(),
                    self.dims[l + 1]
                )));
            }
            b.push(Array1::from(self.biases[l].clone()));
        }

        Ok(PCN {
            dims: self.dims.clone(),
            w,
            b,
            activation: self.activation,
        })
    }

    /// Rebuild the optimizer state for `pcn` (as returned by [`Self::to_network`]).
    ///
    /// Checkpoints without stored moments restore zeroed moments together
    /// with a reset time step, which matches a fresh optimizer.
    pub fn to_optimizer_state(&self, pcn: &PCN) -> PCNResult<OptimizerState> {
        let mut state = OptimizerState::new(pcn);
        if self.vdw.is_empty() && self.vdb.is_empty() && self.sdw.is_empty() && self.sdb.is_empty()
        {
            if self.optimizer_step != 1 {
                log::warn!(
                    "checkpoint has no optimizer moments; resetting step {} to 1",
                    self.optimizer_step
                );
            }
            return Ok(state);
        }

        let transitions = pcn.w.len();
        if [self.vdw.len(), self.vdb.len(), self.sdw.len(), self.sdb.len()]
            .iter()
            .any(|&n| n != transitions)
        {
            return Err(PCNError::Checkpoint(format!(
                "optimizer moments do not cover {transitions} layers"
            )));
        }
        for l in 0..transitions {
            let shape = pcn.w[l].dim();
            state.vdw[l] = vecs_to_array2(&self.vdw[l], shape)?;
            state.sdw[l] = vecs_to_array2(&self.sdw[l], shape)?;
            state.vdb[l] = vec_to_array1(&self.vdb[l], shape.0, "bias first moment")?;
            state.sdb[l] = vec_to_array1(&self.sdb[l], shape.0, "bias second moment")?;
        }
        state.t = self.optimizer_step;
        Ok(state)
    }
}

/// Save a network and its optimizer state to a JSON file, creating parent directories.
///
/// # Errors
///
/// Returns `Checkpoint` if the file cannot be written or the data cannot be serialized.
pub fn save_checkpoint(pcn: &PCN, optimizer: &OptimizerState, path: &Path) -> PCNResult<()> {
    let data = CheckpointData::from_network(pcn, optimizer);
    let json = serde_json::to_string_pretty(&data)
        .map_err(|e| PCNError::Checkpoint(format!("Failed to serialize checkpoint: {e}")))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            PCNError::Checkpoint(format!("Failed to create checkpoint directory: {e}"))
        })?;
    }

    std::fs::write(path, json).map_err(|e| {
        PCNError::Checkpoint(format!("Failed to write checkpoint to {}: {e}", path.display()))
    })
}

/// Load a network checkpoint from a JSON file.
///
/// Returns the network and its restored optimizer state.
///
/// # Errors
///
/// Returns `Checkpoint` if the file cannot be read, parsed, or does not describe a valid network.
pub fn load_checkpoint(path: &Path) -> PCNResult<(PCN, OptimizerState)> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        PCNError::Checkpoint(format!("Failed to read checkpoint from {}: {e}", path.display()))
    })?;

    let data: CheckpointData = serde_json::from_str(&json)
        .map_err(|e| PCNError::Checkpoint(format!("Failed to parse checkpoint: {e}")))?;

    let pcn = data.to_network()?;
    let optimizer = data.to_optimizer_state(&pcn)?;
    Ok((pcn, optimizer))
}
