use std::path::Path;

use tracing::info;

use crate::data::load_trips;
use crate::error::{Result, TaxiFareError};
use crate::model::FarePredictor;

/// Aggregate regression quality over a labeled dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionMetrics {
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Root mean squared error.
    pub rms: f64,
    pub mean_absolute_error: f64,
    pub mean_squared_error: f64,
}

impl RegressionMetrics {
    /// Computes metrics from paired predictions and observed values.
    ///
    /// R² is reported as 0.0 when the observed values have no variance.
    pub fn from_predictions(predicted: &[f32], actual: &[f32]) -> Result<Self> {
        if predicted.len() != actual.len() {
            return Err(TaxiFareError::Schema(format!(
                "{} predictions for {} labels",
                predicted.len(),
                actual.len()
            )));
        }
        if actual.is_empty() {
            return Err(TaxiFareError::Schema("cannot evaluate an empty dataset".to_string()));
        }

        let n = actual.len() as f64;
        let mean = actual.iter().map(|&y| f64::from(y)).sum::<f64>() / n;

        let mut sum_abs = 0.0;
        let mut sum_sq = 0.0;
        let mut total_sq = 0.0;
        for (&p, &y) in predicted.iter().zip(actual) {
            let residual = f64::from(p) - f64::from(y);
            sum_abs += residual.abs();
            sum_sq += residual * residual;
            total_sq += (f64::from(y) - mean).powi(2);
        }

        let mean_squared_error = sum_sq / n;
        let r_squared = if total_sq > 0.0 {
            1.0 - sum_sq / total_sq
        } else {
            0.0
        };

        Ok(Self {
            r_squared,
            rms: mean_squared_error.sqrt(),
            mean_absolute_error: sum_abs / n,
            mean_squared_error,
        })
    }

    pub fn report(&self) -> String {
        format!(
            "\n\
*************************************************\n\
*       Model quality metrics evaluation         \n\
*------------------------------------------------\n\
*       R2 Score:      {:.2}\n\
*       RMS loss:      {:.2}\n\
*************************************************\n",
            self.r_squared, self.rms
        )
    }
}

/// Scores `model` against the labeled file at `test_path` and prints the
/// metrics block. Metrics use the regressor's raw scores, not the clamped
/// fares served at inference time.
pub fn evaluate(model: &impl FarePredictor, test_path: &Path) -> Result<RegressionMetrics> {
    let trips = load_trips(test_path)?;
    let predicted = model.raw_scores(&trips)?;
    let actual: Vec<f32> = trips.iter().map(|t| t.fare_amount).collect();
    let metrics = RegressionMetrics::from_predictions(&predicted, &actual)?;

    info!(
        rows = trips.len(),
        r_squared = metrics.r_squared,
        rms = metrics.rms,
        mae = metrics.mean_absolute_error,
        "Evaluated model"
    );
    println!("{}", metrics.report());

    Ok(metrics)
}
