use ann::config::Config;
use ann::trainer::{Logging, Trainer};
use ann::weights::RandomWeights;
use ann::Network;

use clap::Parser;
use env_logger::Env;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::process;

/// Trains a sigmoid network on the XOR truth table.
#[derive(Parser, Debug)]
#[clap(name = "train")]
struct Args {
    /// JSON file with training settings
    #[clap(long)]
    config: Option<PathBuf>,
    /// Comma separated layer sizes, input layer first
    #[clap(long, use_value_delimiter = true)]
    layers: Option<Vec<usize>>,
    #[clap(long)]
    rate: Option<f64>,
    #[clap(long)]
    iterations: Option<usize>,
    #[clap(long)]
    seed: Option<u64>,
}

fn init_logger() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();
}

fn build_config(args: Args) -> ann::Result<Config> {
    let mut config = match args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(layers) = args.layers {
        config.layers = layers;
    }
    if let Some(rate) = args.rate {
        config.learning_rate = rate;
    }
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    check_xor_shape(&config)?;
    Ok(config)
}

/// The XOR table has two inputs and one target per example.
fn check_xor_shape(config: &Config) -> ann::Result<()> {
    if config.layers.first() != Some(&2) || config.layers.last() != Some(&1) {
        return Err(ann::Error::Config(format!(
            "XOR needs 2 inputs and 1 output, got layers {:?}",
            config.layers
        )));
    }
    Ok(())
}

fn run(config: &Config) -> ann::Result<()> {
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let network =
        Network::with_weights(&config.layers, &mut RandomWeights::new(rng))?;

    let examples = vec![
        (vec![0.0, 0.0], vec![0.0]),
        (vec![0.0, 1.0], vec![1.0]),
        (vec![1.0, 0.0], vec![1.0]),
        (vec![1.0, 1.0], vec![0.0]),
    ];
    let mut network = Trainer::new(network)
        .learning_rate(config.learning_rate)
        .logging(Logging::Iterations(config.iterations / 10))
        .stop_condition(config.stop_condition())
        .train(&examples)?;

    for (input, expected) in &examples {
        let output = network.predict(input)?;
        println!("{:?} -> {:.4?} (expected {:?})", input, output, expected);
    }
    Ok(())
}

fn main() {
    init_logger();
    let config = match build_config(Args::parse()) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            process::exit(2);
        }
    };
    info!("training layers {:?}", config.layers);
    if let Err(err) = run(&config) {
        error!("training failed: {}", err);
        process::exit(1);
    }
}
