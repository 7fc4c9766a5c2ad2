use tracing::{info, warn};
use xgboost::parameters::learning::{LearningTaskParametersBuilder, Objective};
use xgboost::parameters::tree::TreeBoosterParametersBuilder;
use xgboost::parameters::{BoosterParametersBuilder, BoosterType, TrainingParametersBuilder};
use xgboost::{Booster, DMatrix};

use crate::config::{Config, TrainerConfig};
use crate::data::{load_trips, TaxiTrip, TaxiTripFarePrediction};
use crate::evaluate::evaluate;
use crate::error::{Result, TaxiFareError};
use crate::pipeline::FeaturePipeline;
use crate::store::{attach_pipeline, model_exists, save_model};

/// Anything that can price a trip.
pub trait FarePredictor {
    /// Regressor output, one score per trip, before any post-processing.
    fn raw_scores(&self, trips: &[TaxiTrip]) -> Result<Vec<f32>>;

    /// Predicted fares. Negative scores are clamped to zero.
    fn predict_batch(&self, trips: &[TaxiTrip]) -> Result<Vec<TaxiTripFarePrediction>> {
        Ok(self
            .raw_scores(trips)?
            .into_iter()
            .map(|score| TaxiTripFarePrediction {
                fare_amount: score.max(0.0),
            })
            .collect())
    }

    fn predict(&self, trip: &TaxiTrip) -> Result<TaxiTripFarePrediction> {
        let mut predictions = self.predict_batch(std::slice::from_ref(trip))?;
        predictions
            .pop()
            .ok_or_else(|| TaxiFareError::Schema("booster returned no prediction".to_string()))
    }
}

/// Fitted feature pipeline plus the booster trained on its output.
pub struct TaxiFareModel {
    pipeline: FeaturePipeline,
    booster: Booster,
}

impl TaxiFareModel {
    pub(crate) fn from_parts(pipeline: FeaturePipeline, booster: Booster) -> Self {
        Self { pipeline, booster }
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    pub(crate) fn booster(&self) -> &Booster {
        &self.booster
    }
}

impl FarePredictor for TaxiFareModel {
    fn raw_scores(&self, trips: &[TaxiTrip]) -> Result<Vec<f32>> {
        if trips.is_empty() {
            return Ok(Vec::new());
        }

        let features = self.pipeline.feature_matrix(trips);
        let dmatrix = DMatrix::from_dense(&features, trips.len())?;
        Ok(self.booster.predict(&dmatrix)?)
    }
}

/// Fits the feature pipeline on `trips` and trains a squared-error boosted
/// tree regressor on its output.
pub fn train_model(trips: &[TaxiTrip], params: &TrainerConfig, seed: u64) -> Result<TaxiFareModel> {
    let pipeline = FeaturePipeline::fit(trips)?;

    // Row-major matrix with the fare copied into the label column
    let features = pipeline.feature_matrix(trips);
    let labels = FeaturePipeline::labels(trips);

    let mut dtrain = DMatrix::from_dense(&features, trips.len())?;
    dtrain.set_labels(&labels)?;

    let tree_params = TreeBoosterParametersBuilder::default()
        .eta(params.learning_rate)
        .max_depth(params.max_depth)
        .build()
        .map_err(|e| TaxiFareError::Parameters(e.to_string()))?;

    let learning_params = LearningTaskParametersBuilder::default()
        .objective(Objective::RegLinear)
        .seed(seed)
        .build()
        .map_err(|e| TaxiFareError::Parameters(e.to_string()))?;

    let booster_params = BoosterParametersBuilder::default()
        .booster_type(BoosterType::Tree(tree_params))
        .learning_params(learning_params)
        .verbose(false)
        .threads(params.threads)
        .build()
        .map_err(|e| TaxiFareError::Parameters(e.to_string()))?;

    let training_params = TrainingParametersBuilder::default()
        .dtrain(&dtrain)
        .boost_rounds(params.boost_rounds)
        .booster_params(booster_params)
        .evaluation_sets(None)
        .build()
        .map_err(|e| TaxiFareError::Parameters(e.to_string()))?;

    info!(
        rows = trips.len(),
        features = pipeline.num_features(),
        rounds = params.boost_rounds,
        seed,
        "Training boosted tree regressor"
    );
    let mut booster = Booster::train(&training_params)?;
    attach_pipeline(&mut booster, &pipeline)?;

    Ok(TaxiFareModel::from_parts(pipeline, booster))
}

/// Loads the training file, trains and persists the model.
pub fn train(config: &Config) -> Result<TaxiFareModel> {
    let trips = load_trips(&config.train_path())?;

    println!("=============== Create and Train the Model ===============");
    let model = train_model(&trips, &config.trainer, config.seed)?;
    println!("=============== End of training ===============\n");

    save_model(&model, &config.model_path)?;
    println!("The model is saved to {}\n", config.model_path.display());

    Ok(model)
}

/// Start-up decision: train, save and evaluate when no model is saved or
/// `config.retrain` is set, otherwise keep the saved model untouched.
///
/// Returns whether a model was trained. A missing test file skips
/// evaluation with a notice instead of failing the run.
pub fn prepare_model(config: &Config) -> Result<bool> {
    if !config.retrain && model_exists(&config.model_path) {
        info!(path = %config.model_path.display(), "Using saved model");
        return Ok(false);
    }

    let model = train(config)?;

    let test_path = config.test_path();
    if test_path.exists() {
        evaluate(&model, &test_path)?;
    } else {
        warn!(path = %test_path.display(), "Skipping evaluation");
        println!("{} not found.", test_path.display());
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_trips(n: usize) -> Vec<TaxiTrip> {
        (0..n)
            .map(|i| {
                let distance = 0.5 + (i % 20) as f32 * 0.75;
                let time = 120.0 + (i % 13) as f32 * 90.0;
                let cash = i % 3 == 0;
                TaxiTrip {
                    vendor_id: if i % 2 == 0 { "VTS" } else { "CMT" }.to_string(),
                    rate_code: "1".to_string(),
                    passenger_count: (1 + i % 4) as f32,
                    trip_time: time,
                    trip_distance: distance,
                    payment_type: if cash { "CSH" } else { "CRD" }.to_string(),
                    fare_amount: 2.5 + distance * 2.5 + time / 120.0,
                }
            })
            .collect()
    }

    fn small_params() -> TrainerConfig {
        TrainerConfig {
            boost_rounds: 20,
            threads: Some(1),
            ..TrainerConfig::default()
        }
    }

    #[test]
    fn trained_model_predicts_close_to_training_fares() {
        let trips = synthetic_trips(200);
        let model = train_model(&trips, &small_params(), 0).unwrap();

        let predictions = model.predict_batch(&trips).unwrap();
        assert_eq!(predictions.len(), trips.len());

        let mean_abs: f32 = predictions
            .iter()
            .zip(&trips)
            .map(|(p, t)| (p.fare_amount - t.fare_amount).abs())
            .sum::<f32>()
            / trips.len() as f32;
        assert!(mean_abs < 2.0, "mean absolute error {mean_abs}");
    }

    #[test]
    fn single_prediction_matches_batch() {
        let trips = synthetic_trips(100);
        let model = train_model(&trips, &small_params(), 0).unwrap();

        let batch = model.predict_batch(&trips[..5]).unwrap();
        for (trip, expected) in trips[..5].iter().zip(batch) {
            assert_eq!(model.predict(trip).unwrap(), expected);
        }
    }

    #[test]
    fn empty_batch_predicts_nothing() {
        let trips = synthetic_trips(50);
        let model = train_model(&trips, &small_params(), 0).unwrap();
        assert!(model.predict_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn clamped_predictions_follow_raw_scores() {
        let trips = synthetic_trips(100);
        let model = train_model(&trips, &small_params(), 0).unwrap();

        let raw = model.raw_scores(&trips[..10]).unwrap();
        let predicted = model.predict_batch(&trips[..10]).unwrap();
        for (score, prediction) in raw.iter().zip(&predicted) {
            assert_eq!(prediction.fare_amount, score.max(0.0));
        }
    }

    #[test]
    fn out_of_range_learning_rate_is_rejected() {
        let params = TrainerConfig {
            learning_rate: -1.0,
            ..small_params()
        };
        assert!(train_model(&synthetic_trips(50), &params, 0).is_err());
    }

    #[test]
    fn training_on_no_rows_fails() {
        assert!(train_model(&[], &small_params(), 0).is_err());
    }
}
