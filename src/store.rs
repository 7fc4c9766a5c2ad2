//! Persists a fitted model as a single booster file.
//!
//! The fitted feature pipeline travels inside the booster as string
//! attributes, so one file carries everything needed to replay the
//! transform at inference time.

use std::fs;
use std::path::Path;

use tracing::info;
use xgboost::Booster;

use crate::error::{Result, TaxiFareError};
use crate::model::TaxiFareModel;
use crate::pipeline::FeaturePipeline;

pub const FORMAT_VERSION: &str = "1";

const FORMAT_VERSION_KEY: &str = "taxi_fare_format_version";
const PIPELINE_KEY: &str = "taxi_fare_feature_pipeline";

pub(crate) fn attach_pipeline(booster: &mut Booster, pipeline: &FeaturePipeline) -> Result<()> {
    booster.set_attribute(FORMAT_VERSION_KEY, FORMAT_VERSION)?;
    booster.set_attribute(PIPELINE_KEY, &serde_json::to_string(pipeline)?)?;
    Ok(())
}

fn read_pipeline(booster: &Booster) -> Result<FeaturePipeline> {
    let version = booster.get_attribute(FORMAT_VERSION_KEY)?.ok_or_else(|| {
        TaxiFareError::IncompatibleModel("model file carries no format version".to_string())
    })?;
    if version != FORMAT_VERSION {
        return Err(TaxiFareError::IncompatibleModel(format!(
            "format version {version} is not supported (expected {FORMAT_VERSION})"
        )));
    }

    let json = booster.get_attribute(PIPELINE_KEY)?.ok_or_else(|| {
        TaxiFareError::IncompatibleModel("model file carries no feature pipeline".to_string())
    })?;
    serde_json::from_str(&json)
        .map_err(|e| TaxiFareError::IncompatibleModel(format!("feature pipeline does not decode: {e}")))
}

pub fn model_exists(path: &Path) -> bool {
    path.is_file()
}

/// Writes the model to `path`, creating the parent directory when needed.
/// An existing file is overwritten in place.
pub fn save_model(model: &TaxiFareModel, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    model.booster().save(path)?;
    info!(path = %path.display(), "Saved model");
    Ok(())
}

pub fn load_model(path: &Path) -> Result<TaxiFareModel> {
    if !model_exists(path) {
        return Err(TaxiFareError::MissingModel(path.to_path_buf()));
    }

    let booster = Booster::load(path)?;
    let pipeline = read_pipeline(&booster)?;
    info!(path = %path.display(), features = pipeline.num_features(), "Loaded model");

    Ok(TaxiFareModel::from_parts(pipeline, booster))
}
