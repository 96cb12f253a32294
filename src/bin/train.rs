//! PC training binary.
//!
//! Trains a predictive coding network on a JSON dataset and writes the
//! per-epoch metric history as JSON.
//!
//! ## Dataset format
//!
//! ```json
//! {
//!   "train": { "samples": [[0.1, 0.2], ...], "classes": [0, 1, ...] },
//!   "valid": { "samples": [[0.3, 0.4], ...], "labels": [[0.03, 0.97], ...] }
//! }
//! ```
//!
//! Each split gives either explicit `labels` vectors or class indices in
//! `classes`, which are one-hot encoded against the output layer size.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info pc-train --data data/xor.json --layers 2,8,2 --config config.json
//! ```

use clap::Parser;
use ndarray::Array1;
use pc_engine::checkpoint::{load_checkpoint, save_checkpoint};
use pc_engine::data::{normalize_dataset, scale_sample};
use pc_engine::{one_hot, Config, PCNError, Trainer, PCN};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pc-train", about = "Train a fully-connected network with predictive coding")]
struct Args {
    /// JSON dataset with `train` and optional `valid` splits
    #[arg(long)]
    data: PathBuf,

    /// Layer sizes, input first, e.g. 784,128,10
    #[arg(long, value_delimiter = ',', required_unless_present = "resume")]
    layers: Vec<usize>,

    /// JSON training configuration (missing fields use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured number of epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// Seed for weight initialization
    #[arg(long)]
    seed: Option<u64>,

    /// Rescale all inputs to [0, 1] using the training set's min and range
    #[arg(long, default_value_t = false)]
    scale_inputs: bool,

    /// Where to write the metric history
    #[arg(long, default_value = "history.json")]
    history_out: PathBuf,

    /// Save the trained network here
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Continue from a saved checkpoint (weights and optimizer state) instead
    /// of initializing; a given --config must use the checkpoint's activation
    #[arg(long)]
    resume: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct Dataset {
    train: Split,
    #[serde(default)]
    valid: Option<Split>,
}

#[derive(Debug, Deserialize)]
struct Split {
    samples: Vec<Vec<f32>>,
    #[serde(default)]
    labels: Vec<Vec<f32>>,
    #[serde(default)]
    classes: Vec<usize>,
}

impl Split {
    fn into_arrays(
        self,
        num_classes: usize,
    ) -> Result<(Vec<Array1<f32>>, Vec<Array1<f32>>), PCNError> {
        let samples = self.samples.into_iter().map(Array1::from).collect();
        let labels = if self.classes.is_empty() {
            self.labels.into_iter().map(Array1::from).collect()
        } else {
            one_hot(&self.classes, num_classes)?
        };
        Ok((samples, labels))
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    if let Some(epochs) = args.epochs {
        config.epochs = epochs;
    }

    let (network, resumed_state) = match &args.resume {
        Some(path) => {
            log::info!("resuming from checkpoint {}", path.display());
            let (network, optimizer_state) = load_checkpoint(path)?;
            if !args.layers.is_empty() && args.layers != network.dims() {
                return Err(format!(
                    "--layers {:?} does not match checkpoint network {:?}",
                    args.layers,
                    network.dims()
                )
                .into());
            }
            if args.config.is_none() {
                config.activation = network.activation;
            }
            (network, Some(optimizer_state))
        }
        None => {
            let network = match args.seed {
                Some(seed) => {
                    let mut rng = StdRng::seed_from_u64(seed);
                    PCN::with_rng(args.layers.clone(), config.activation, &mut rng)?
                }
                None => PCN::new(args.layers.clone(), config.activation)?,
            };
            (network, None)
        }
    };
    let num_classes = network.dims()[network.output_layer()];

    let dataset: Dataset = serde_json::from_str(&fs::read_to_string(&args.data)?)?;
    let (mut train_x, train_y) = dataset.train.into_arrays(num_classes)?;
    let (mut valid_x, valid_y) = match dataset.valid {
        Some(split) => split.into_arrays(num_classes)?,
        None => (Vec::new(), Vec::new()),
    };

    if args.scale_inputs {
        let (scaled, min, range) = normalize_dataset(&train_x);
        log::info!("scaled inputs with min={min} range={range}");
        train_x = scaled;
        valid_x = valid_x
            .iter()
            .map(|v| scale_sample(v, min, range))
            .collect();
    }

    log::info!(
        "{} training / {} validation samples, network {:?}",
        train_x.len(),
        valid_x.len(),
        network.dims()
    );

    let mut trainer = match resumed_state {
        Some(optimizer_state) => Trainer::resume(network, optimizer_state, config)?,
        None => Trainer::from_network(network, config)?,
    };
    let history = trainer.train(&train_x, &train_y, &valid_x, &valid_y)?;

    if let Some(parent) = args.history_out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&args.history_out, serde_json::to_string_pretty(&history)?)?;
    log::info!("wrote history to {}", args.history_out.display());

    if let Some(path) = &args.checkpoint {
        save_checkpoint(&trainer.network, &trainer.optimizer_state, path)?;
        log::info!("saved checkpoint to {}", path.display());
    }

    Ok(())
}
