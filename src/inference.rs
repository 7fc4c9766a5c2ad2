//! Single-trip predictions against a persisted model.
//!
//! Three ways to build a request: the two literal sample trips, a random row
//! of the test file, or a synthetic trip. All of them go through
//! [`FarePredictor::predict`] and print a [`PredictionReport`].

use std::fmt;
use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::config::{Config, Strategy};
use crate::data::{parse_csv_line, TaxiTrip, TaxiTripFarePrediction};
use crate::error::{Result, TaxiFareError};
use crate::model::{FarePredictor, TaxiFareModel};
use crate::store::load_model;

const BANNER: &str = "**********************************************************************";

/// A trip with the fare it is known to have cost.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralSample {
    pub trip: TaxiTrip,
    pub expected_fare: f32,
}

/// The two reference trips. `fare_amount` is zeroed: it is what we predict.
pub fn literal_samples() -> [LiteralSample; 2] {
    let sample = |passenger_count: f32, trip_distance: f32, expected_fare: f32| LiteralSample {
        trip: TaxiTrip {
            vendor_id: "VTS".to_string(),
            rate_code: "1".to_string(),
            passenger_count,
            trip_time: 1140.0,
            trip_distance,
            payment_type: "CRD".to_string(),
            fare_amount: 0.0,
        },
        expected_fare,
    };

    [sample(4.0, 3.75, 15.5), sample(2.0, 6.29, 21.0)]
}

/// Picks one data row of the file at `path` uniformly at random.
///
/// Returns `Ok(None)` when the file does not exist or holds no data rows.
/// The header line and blank lines are never picked.
pub fn sample_row_from_file(path: &Path, rng: &mut impl Rng) -> Result<Option<TaxiTrip>> {
    if !path.exists() {
        println!("{} not found.", path.display());
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    let rows: Vec<(usize, &str)> = contents
        .lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();

    let Some(&(idx, line)) = rows.choose(rng) else {
        info!(path = %path.display(), "No data rows to sample");
        return Ok(None);
    };
    debug!(line = idx + 1, "Sampled test row");

    parse_csv_line(line)
        .map(Some)
        .map_err(|reason| TaxiFareError::MalformedRow {
            path: path.to_path_buf(),
            line: idx + 1,
            reason,
        })
}

/// A synthetic trip. The fare is unknown and left at zero.
pub fn random_trip(rng: &mut impl Rng) -> TaxiTrip {
    TaxiTrip {
        vendor_id: if rng.gen_bool(0.5) { "VTS" } else { "CMT" }.to_string(),
        // metered
        rate_code: "1".to_string(),
        passenger_count: rng.gen_range(1..6) as f32,
        // nearest 10 seconds
        trip_time: (rng.gen_range(6..1100) * 10) as f32,
        trip_distance: rng.gen::<f32>() * 100.0 + 0.1,
        payment_type: if rng.gen_bool(0.5) { "CSH" } else { "CRD" }.to_string(),
        fare_amount: 0.0,
    }
}

/// Formats a fare with at most four decimals, trailing zeros dropped.
pub fn format_fare(fare: f32) -> String {
    let text = format!("{fare:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// What one inference call printed: the request (optionally) and the fares.
pub struct PredictionReport<'a> {
    pub trip: Option<&'a TaxiTrip>,
    pub prediction: TaxiTripFarePrediction,
    pub actual: Option<f32>,
}

impl fmt::Display for PredictionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{BANNER}")?;
        if let Some(trip) = self.trip {
            writeln!(f, "VendorId:       {}", trip.vendor_id)?;
            writeln!(f, "RateCode:       {}", trip.rate_code)?;
            writeln!(f, "PassengerCount: {}", trip.passenger_count)?;
            writeln!(f, "TripTime:       {}", trip.trip_time)?;
            writeln!(f, "TripDistance:   {}", trip.trip_distance)?;
            writeln!(f, "PaymentType:    {}", trip.payment_type)?;
        }
        let actual = match self.actual {
            Some(actual) => actual.to_string(),
            None => "unknown".to_string(),
        };
        writeln!(
            f,
            "Predicted fare: {}, actual fare: {}",
            format_fare(self.prediction.fare_amount),
            actual
        )?;
        writeln!(f, "{BANNER}")
    }
}

/// Runs single-trip predictions against one model.
pub struct InferenceRunner<P = TaxiFareModel> {
    model: P,
}

impl InferenceRunner<TaxiFareModel> {
    /// Loads the persisted model named by `config`.
    pub fn load(config: &Config) -> Result<Self> {
        Ok(Self::new(load_model(&config.model_path)?))
    }
}

impl<P: FarePredictor> InferenceRunner<P> {
    pub fn new(model: P) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &P {
        &self.model
    }

    pub fn predict(&self, trip: &TaxiTrip) -> Result<TaxiTripFarePrediction> {
        self.model.predict(trip)
    }

    pub fn run_literal_samples(&self) -> Result<Vec<TaxiTripFarePrediction>> {
        literal_samples()
            .iter()
            .map(|sample| {
                let prediction = self.predict(&sample.trip)?;
                let report = PredictionReport {
                    trip: None,
                    prediction,
                    actual: Some(sample.expected_fare),
                };
                println!("{report}");
                Ok(prediction)
            })
            .collect()
    }

    /// Predicts a random row of `path`. Prints a notice and returns
    /// `Ok(None)` when the file is missing.
    pub fn run_file_sample(
        &self,
        path: &Path,
        rng: &mut impl Rng,
    ) -> Result<Option<(TaxiTrip, TaxiTripFarePrediction)>> {
        let Some(trip) = sample_row_from_file(path, rng)? else {
            return Ok(None);
        };

        let prediction = self.predict(&trip)?;
        let report = PredictionReport {
            trip: Some(&trip),
            prediction,
            actual: Some(trip.fare_amount),
        };
        println!("{report}");
        Ok(Some((trip, prediction)))
    }

    pub fn run_random_sample(&self, rng: &mut impl Rng) -> Result<(TaxiTrip, TaxiTripFarePrediction)> {
        let trip = random_trip(rng);
        let prediction = self.predict(&trip)?;
        let report = PredictionReport {
            trip: Some(&trip),
            prediction,
            actual: None,
        };
        println!("{report}");
        Ok((trip, prediction))
    }

    pub fn run(&self, strategy: Strategy, test_path: &Path, rng: &mut impl Rng) -> Result<()> {
        match strategy {
            Strategy::Literal => {
                self.run_literal_samples()?;
            }
            Strategy::File => {
                self.run_file_sample(test_path, rng)?;
            }
            Strategy::Random => {
                self.run_random_sample(rng)?;
            }
            Strategy::All => {
                self.run_literal_samples()?;
                self.run_file_sample(test_path, rng)?;
                self.run_random_sample(rng)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    /// Prices every trip at a fixed rate per unit of distance.
    struct PerMile(f32);

    impl FarePredictor for PerMile {
        fn raw_scores(&self, trips: &[TaxiTrip]) -> Result<Vec<f32>> {
            Ok(trips.iter().map(|t| t.trip_distance * self.0).collect())
        }
    }

    #[test]
    fn literal_samples_match_reference_trips() {
        let [first, second] = literal_samples();
        assert_eq!(first.trip.passenger_count, 4.0);
        assert_eq!(first.trip.trip_distance, 3.75);
        assert_eq!(first.expected_fare, 15.5);
        assert_eq!(second.trip.passenger_count, 2.0);
        assert_eq!(second.trip.trip_distance, 6.29);
        assert_eq!(second.expected_fare, 21.0);
        for sample in [&first, &second] {
            assert_eq!(sample.trip.vendor_id, "VTS");
            assert_eq!(sample.trip.rate_code, "1");
            assert_eq!(sample.trip.trip_time, 1140.0);
            assert_eq!(sample.trip.payment_type, "CRD");
        }
    }

    #[test]
    fn random_trips_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let trip = random_trip(&mut rng);
            assert!((1.0..=5.0).contains(&trip.passenger_count));
            assert!((60.0..=10990.0).contains(&trip.trip_time));
            assert_eq!(trip.trip_time % 10.0, 0.0);
            assert!(trip.trip_distance >= 0.1 && trip.trip_distance < 100.1);
            assert!(["VTS", "CMT"].contains(&trip.vendor_id.as_str()));
            assert!(["CSH", "CRD"].contains(&trip.payment_type.as_str()));
            assert_eq!(trip.rate_code, "1");
        }
    }

    #[test]
    fn file_sampling_skips_header_and_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.csv");
        fs::write(
            &path,
            "vendor_id,rate_code,passenger_count,trip_time_in_secs,trip_distance,payment_type,fare_amount\n\
VTS,1,1,1140,3.75,CRD,15.5\n\
\n\
CMT,1,2,480,1.1,CSH,7\n\n",
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let trip = sample_row_from_file(&path, &mut rng).unwrap().unwrap();
            assert!(trip.vendor_id == "VTS" || trip.vendor_id == "CMT");
        }
    }

    #[test]
    fn missing_test_file_is_skipped() {
        let dir = tempdir().unwrap();
        let runner = InferenceRunner::new(PerMile(2.0));
        let mut rng = StdRng::seed_from_u64(0);

        let outcome = runner
            .run_file_sample(&dir.path().join("absent.csv"), &mut rng)
            .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn header_only_file_has_nothing_to_sample() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "a,b,c,d,e,f,g\n").unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample_row_from_file(&path, &mut rng).unwrap().is_none());
    }

    #[test]
    fn malformed_sampled_row_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "a,b,c,d,e,f,g\nVTS,1,x,1140,3.75,CRD,15.5\n").unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        match sample_row_from_file(&path, &mut rng) {
            Err(TaxiFareError::MalformedRow { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed row, got {other:?}"),
        }
    }

    #[test]
    fn runner_funnels_every_strategy_through_predict() {
        let runner = InferenceRunner::new(PerMile(2.0));
        let mut rng = StdRng::seed_from_u64(3);

        let literal = runner.run_literal_samples().unwrap();
        assert_eq!(literal[0].fare_amount, 7.5);

        let (trip, prediction) = runner.run_random_sample(&mut rng).unwrap();
        assert_eq!(prediction.fare_amount, trip.trip_distance * 2.0);
    }

    #[test]
    fn fare_formatting_trims_zeros() {
        assert_eq!(format_fare(15.5), "15.5");
        assert_eq!(format_fare(21.0), "21");
        assert_eq!(format_fare(12.34567), "12.3457");
        assert_eq!(format_fare(0.0), "0");
    }

    #[test]
    fn report_layout() {
        let trip = TaxiTrip::from_csv_line("VTS,1,1,1140,3.75,CRD,15.5").unwrap();
        let report = PredictionReport {
            trip: Some(&trip),
            prediction: TaxiTripFarePrediction { fare_amount: 15.25 },
            actual: Some(trip.fare_amount),
        }
        .to_string();

        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.first(), Some(&BANNER));
        assert_eq!(lines[1], "VendorId:       VTS");
        assert_eq!(lines[5], "TripDistance:   3.75");
        assert_eq!(lines[7], "Predicted fare: 15.25, actual fare: 15.5");
        assert_eq!(lines.last(), Some(&BANNER));
    }
}
