use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for loading trip data, training and persisting fare models.
#[derive(Debug, Error)]
pub enum TaxiFareError {
    #[error("input file {} not found", .0.display())]
    MissingInput(PathBuf),
    #[error("malformed row at {}:{line}: {reason}", .path.display())]
    MalformedRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("schema error: {0}")]
    Schema(String),
    #[error("model file {} not found", .0.display())]
    MissingModel(PathBuf),
    #[error("incompatible model: {0}")]
    IncompatibleModel(String),
    #[error("invalid training parameters: {0}")]
    Parameters(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
    #[error(transparent)]
    Booster(#[from] xgboost::XGBError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TaxiFareError>;
