use std::path::{Path, PathBuf};

use clap::ValueEnum;

pub const DEFAULT_DATA_DIR: &str = "Data";
pub const DEFAULT_TRAIN_FILE: &str = "taxi-fare-train.csv";
pub const DEFAULT_TEST_FILE: &str = "taxi-fare-test.csv";
pub const DEFAULT_MODEL_PATH: &str = "Models/Model.ubj";

/// Booster hyperparameters. Defaults mirror a stock boosted-tree regressor:
/// 100 trees, learning rate 0.2.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    pub boost_rounds: u32,
    pub learning_rate: f32,
    pub max_depth: u32,
    /// `None` leaves the thread count to the library.
    pub threads: Option<u32>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            boost_rounds: 100,
            learning_rate: 0.2,
            max_depth: 6,
            threads: None,
        }
    }
}

/// Which request-construction strategy the inference runner uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Strategy {
    /// The two hardcoded sample trips.
    Literal,
    /// One random row of the test file.
    #[default]
    File,
    /// One synthetic trip with randomized fields.
    Random,
    /// Every strategy in turn.
    All,
}

/// Everything a run needs, built once at start-up and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub train_file: String,
    pub test_file: String,
    pub model_path: PathBuf,
    pub seed: u64,
    pub trainer: TrainerConfig,
    pub strategy: Strategy,
    pub retrain: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            train_file: DEFAULT_TRAIN_FILE.to_string(),
            test_file: DEFAULT_TEST_FILE.to_string(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            seed: 0,
            trainer: TrainerConfig::default(),
            strategy: Strategy::default(),
            retrain: false,
        }
    }
}

impl Config {
    /// Config rooted at `dir`: data under `dir/Data`, model under `dir/Models`.
    pub fn rooted_at(dir: &Path) -> Self {
        Self {
            data_dir: dir.join(DEFAULT_DATA_DIR),
            model_path: dir.join(DEFAULT_MODEL_PATH),
            ..Self::default()
        }
    }

    pub fn train_path(&self) -> PathBuf {
        self.data_dir.join(&self.train_file)
    }

    pub fn test_path(&self) -> PathBuf {
        self.data_dir.join(&self.test_file)
    }
}
