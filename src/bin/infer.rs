//! PC inference binary. Loads a checkpoint and prints feedforward predictions.
//!
//! Input is a JSON array of flat samples; output is one JSON object per line
//! with the predicted class (argmax) and the raw output layer.

use clap::Parser;
use ndarray::Array1;
use pc_engine::checkpoint::load_checkpoint;
use pc_engine::{argmax, Config, Trainer};
use serde::Serialize;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pc-infer", about = "Run a trained predictive coding network on samples")]
struct Args {
    /// Checkpoint written by pc-train
    #[arg(long)]
    checkpoint: PathBuf,

    /// JSON array of samples, e.g. [[0.0, 1.0], [1.0, 1.0]]
    #[arg(long)]
    samples: PathBuf,

    /// Apply the clamp(x^1.5 / 4, 0, 1) input normalization
    #[arg(long, default_value_t = false)]
    normalize_input: bool,
}

#[derive(Debug, Serialize)]
struct Prediction {
    index: usize,
    class: usize,
    output: Vec<f32>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(Args::parse()) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let (network, optimizer_state) = load_checkpoint(&args.checkpoint)?;
    log::info!(
        "loaded {:?} network at step {}",
        network.dims(),
        optimizer_state.t
    );

    let config = Config {
        activation: network.activation,
        normalize_input: args.normalize_input,
        ..Config::default()
    };
    let trainer = Trainer::from_network(network, config)?;

    let samples: Vec<Vec<f32>> = serde_json::from_str(&fs::read_to_string(&args.samples)?)?;
    for (index, sample) in samples.into_iter().enumerate() {
        let output = trainer.predict_sample(&Array1::from(sample))?;
        let class = argmax(output.iter()).unwrap_or(0);
        let prediction = Prediction {
            index,
            class,
            output: output.to_vec(),
        };
        println!("{}", serde_json::to_string(&prediction)?);
    }

    Ok(())
}
