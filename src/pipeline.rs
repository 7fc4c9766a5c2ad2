//! Turns trips into the numeric rows fed to the booster.
//!
//! Layout of a feature row, in order: VendorId one-hot, RateCode one-hot,
//! PassengerCount, TripTime, TripDistance, PaymentType one-hot. The label is
//! a copy of FareAmount.

use serde::{Deserialize, Serialize};

use crate::data::TaxiTrip;
use crate::error::{Result, TaxiFareError};

/// One-hot encoder with a vocabulary frozen at fit time.
///
/// Categories get slots in order of first appearance. Values that were not
/// seen during fitting encode as all zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    column: String,
    vocabulary: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit<'a>(column: &str, values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut vocabulary: Vec<String> = Vec::new();
        for value in values {
            if !vocabulary.iter().any(|known| known == value) {
                vocabulary.push(value.to_string());
            }
        }
        Self {
            column: column.to_string(),
            vocabulary,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn width(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.vocabulary.iter().position(|known| known == value)
    }

    pub fn encode(&self, value: &str, out: &mut Vec<f32>) {
        let start = out.len();
        out.resize(start + self.width(), 0.0);
        if let Some(idx) = self.index_of(value) {
            out[start + idx] = 1.0;
        }
    }

    fn slot_names(&self) -> impl Iterator<Item = String> + '_ {
        self.vocabulary
            .iter()
            .map(move |value| format!("{}={}", self.column, value))
    }
}

/// Fitted feature transform: three categorical encoders plus the fixed
/// column order. Persisted alongside the booster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePipeline {
    vendor_id: OneHotEncoder,
    rate_code: OneHotEncoder,
    payment_type: OneHotEncoder,
}

impl FeaturePipeline {
    pub fn fit(trips: &[TaxiTrip]) -> Result<Self> {
        if trips.is_empty() {
            return Err(TaxiFareError::Schema(
                "cannot fit feature pipeline on an empty dataset".to_string(),
            ));
        }

        Ok(Self {
            vendor_id: OneHotEncoder::fit("VendorId", trips.iter().map(|t| t.vendor_id.as_str())),
            rate_code: OneHotEncoder::fit("RateCode", trips.iter().map(|t| t.rate_code.as_str())),
            payment_type: OneHotEncoder::fit(
                "PaymentType",
                trips.iter().map(|t| t.payment_type.as_str()),
            ),
        })
    }

    pub fn num_features(&self) -> usize {
        self.vendor_id.width() + self.rate_code.width() + 3 + self.payment_type.width()
    }

    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .vendor_id
            .slot_names()
            .chain(self.rate_code.slot_names())
            .collect();
        names.extend(["PassengerCount", "TripTime", "TripDistance"].map(String::from));
        names.extend(self.payment_type.slot_names());
        names
    }

    fn write_features(&self, trip: &TaxiTrip, out: &mut Vec<f32>) {
        self.vendor_id.encode(&trip.vendor_id, out);
        self.rate_code.encode(&trip.rate_code, out);
        out.push(trip.passenger_count);
        out.push(trip.trip_time);
        out.push(trip.trip_distance);
        self.payment_type.encode(&trip.payment_type, out);
    }

    pub fn features(&self, trip: &TaxiTrip) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.num_features());
        self.write_features(trip, &mut out);
        out
    }

    /// Row-major matrix, one row per trip.
    pub fn feature_matrix(&self, trips: &[TaxiTrip]) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.num_features() * trips.len());
        for trip in trips {
            self.write_features(trip, &mut out);
        }
        out
    }

    pub fn labels(trips: &[TaxiTrip]) -> Vec<f32> {
        trips.iter().map(|t| t.fare_amount).collect()
    }
}
