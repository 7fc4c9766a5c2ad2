//! Taxi fare regression: load trip CSVs, one-hot encode the categorical
//! columns, fit a boosted tree regressor, evaluate it, persist it and run
//! single-trip predictions against the saved model.

pub mod config;
pub mod data;
pub mod error;
pub mod evaluate;
pub mod inference;
pub mod model;
pub mod pipeline;
pub mod store;

pub use config::{Config, Strategy, TrainerConfig};
pub use data::{load_trip_table, load_trips, TaxiTrip, TaxiTripFarePrediction, TripTable};
pub use error::{Result, TaxiFareError};
pub use evaluate::{evaluate, RegressionMetrics};
pub use inference::InferenceRunner;
pub use model::{prepare_model, train, train_model, FarePredictor, TaxiFareModel};
pub use pipeline::{FeaturePipeline, OneHotEncoder};
pub use store::{load_model, model_exists, save_model};
