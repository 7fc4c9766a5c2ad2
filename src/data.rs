use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{Result, TaxiFareError};

/// Column names in file order. Headers in the file are ignored; columns are
/// bound by position.
pub const TRIP_COLUMNS: [&str; 7] = [
    "VendorId",
    "RateCode",
    "PassengerCount",
    "TripTime",
    "TripDistance",
    "PaymentType",
    "FareAmount",
];

/// One taxi trip as read from the CSV files.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxiTrip {
    pub vendor_id: String,
    pub rate_code: String,
    pub passenger_count: f32,
    /// Seconds.
    pub trip_time: f32,
    pub trip_distance: f32,
    pub payment_type: String,
    /// Label during training, observed fare during inference.
    pub fare_amount: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxiTripFarePrediction {
    pub fare_amount: f32,
}

impl TaxiTrip {
    /// Parses one data line, e.g. `VTS,1,1,1140,3.75,CRD,15.5`.
    pub fn from_csv_line(line: &str) -> Result<Self> {
        parse_csv_line(line).map_err(TaxiFareError::Schema)
    }

    fn from_fields(fields: [Option<&str>; 7]) -> std::result::Result<Self, String> {
        let [vendor_id, rate_code, passenger_count, trip_time, trip_distance, payment_type, fare_amount] =
            fields;

        Ok(Self {
            vendor_id: text_field(TRIP_COLUMNS[0], vendor_id)?,
            rate_code: text_field(TRIP_COLUMNS[1], rate_code)?,
            passenger_count: numeric_field(TRIP_COLUMNS[2], passenger_count)?,
            trip_time: numeric_field(TRIP_COLUMNS[3], trip_time)?,
            trip_distance: numeric_field(TRIP_COLUMNS[4], trip_distance)?,
            payment_type: text_field(TRIP_COLUMNS[5], payment_type)?,
            fare_amount: numeric_field(TRIP_COLUMNS[6], fare_amount)?,
        })
    }
}

/// Shared by the table reader and the raw-line reader so both produce the
/// same record for the same bytes.
pub(crate) fn parse_csv_line(line: &str) -> std::result::Result<TaxiTrip, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() != TRIP_COLUMNS.len() {
        return Err(format!(
            "expected {} fields, found {}",
            TRIP_COLUMNS.len(),
            parts.len()
        ));
    }

    let mut fields = [None; 7];
    for (slot, part) in fields.iter_mut().zip(parts) {
        *slot = Some(part);
    }
    TaxiTrip::from_fields(fields)
}

fn text_field(column: &str, value: Option<&str>) -> std::result::Result<String, String> {
    match value {
        Some(value) => Ok(value.trim().to_string()),
        None => Err(format!("missing value for {column}")),
    }
}

fn numeric_field(column: &str, value: Option<&str>) -> std::result::Result<f32, String> {
    let value = value.ok_or_else(|| format!("missing value for {column}"))?;
    value
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("{column} value '{value}' is not numeric: {e}"))
}

/// Trip data read from disk. Records are only materialized on `trips()`.
pub struct TripTable {
    path: PathBuf,
    df: DataFrame,
}

impl TripTable {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn trips(&self) -> Result<Vec<TaxiTrip>> {
        let columns = TRIP_COLUMNS
            .iter()
            .map(|name| Ok(self.df.column(name)?.str()?))
            .collect::<Result<Vec<&StringChunked>>>()?;

        (0..self.df.height())
            .map(|row| {
                let mut fields = [None; 7];
                for (slot, column) in fields.iter_mut().zip(&columns) {
                    *slot = column.get(row);
                }
                TaxiTrip::from_fields(fields).map_err(|reason| TaxiFareError::MalformedRow {
                    path: self.path.clone(),
                    // header is line 1
                    line: row + 2,
                    reason,
                })
            })
            .collect()
    }
}

/// Reads a comma separated trip file with a header row into a `TripTable`.
/// Every column is read as text; numeric columns are parsed in `trips()`.
pub fn load_trip_table(path: &Path) -> Result<TripTable> {
    if !path.exists() {
        return Err(TaxiFareError::MissingInput(path.to_path_buf()));
    }

    let mut df = CsvReader::from_path(path)?
        .has_header(true)
        .infer_schema(Some(0))
        .finish()?;

    if df.width() != TRIP_COLUMNS.len() {
        return Err(TaxiFareError::Schema(format!(
            "{} has {} columns, expected {}",
            path.display(),
            df.width(),
            TRIP_COLUMNS.len()
        )));
    }
    df.set_column_names(&TRIP_COLUMNS)?;

    info!(path = %path.display(), rows = df.height(), columns = df.width(), "Loaded trip data");
    debug!("{:?}", df.head(Some(5)));

    Ok(TripTable {
        path: path.to_path_buf(),
        df,
    })
}

/// Convenience wrapper: load and materialize in one step.
pub fn load_trips(path: &Path) -> Result<Vec<TaxiTrip>> {
    load_trip_table(path)?.trips()
}
