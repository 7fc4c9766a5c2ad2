use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{thread_rng, SeedableRng};
use taxi_fare_prediction::config::{
    DEFAULT_DATA_DIR, DEFAULT_MODEL_PATH, DEFAULT_TEST_FILE, DEFAULT_TRAIN_FILE,
};
use taxi_fare_prediction::{prepare_model, Config, InferenceRunner, Strategy, TrainerConfig};
use tracing_subscriber::EnvFilter;

/// Taxi fare regression: train once, then predict fares from the saved model
#[derive(Parser)]
#[command(name = "taxi-fare-prediction")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding the training and test CSV files
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_TRAIN_FILE)]
    train_file: String,

    #[arg(long, default_value = DEFAULT_TEST_FILE)]
    test_file: String,

    /// Where the trained model is saved and loaded from
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Seed for the booster's stochastic steps
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Number of boosting rounds
    #[arg(long, default_value = "100")]
    rounds: u32,

    #[arg(long, default_value = "0.2")]
    learning_rate: f32,

    #[arg(long, default_value = "6")]
    max_depth: u32,

    /// Booster threads (library default when omitted)
    #[arg(long)]
    threads: Option<u32>,

    /// How inference requests are built
    #[arg(short, long, value_enum, default_value_t = Strategy::File)]
    strategy: Strategy,

    /// Seed for sampling inference requests (random when omitted)
    #[arg(long)]
    sample_seed: Option<u64>,

    /// Train a new model even if one is already saved
    #[arg(long)]
    retrain: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            data_dir: self.data_dir,
            train_file: self.train_file,
            test_file: self.test_file,
            model_path: self.model,
            seed: self.seed,
            trainer: TrainerConfig {
                boost_rounds: self.rounds,
                learning_rate: self.learning_rate,
                max_depth: self.max_depth,
                threads: self.threads,
            },
            strategy: self.strategy,
            retrain: self.retrain,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let sample_seed = cli.sample_seed;
    let config = cli.into_config();

    println!("{}", std::env::current_dir()?.display());

    // 1. Train, save and evaluate unless a model is already on disk
    prepare_model(&config)?;

    // 2. Predict with the persisted model
    let runner = InferenceRunner::load(&config)?;
    let mut rng = match sample_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(thread_rng())?,
    };
    runner.run(config.strategy, &config.test_path(), &mut rng)?;

    Ok(())
}
