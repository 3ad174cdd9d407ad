//! Day-of-year/year linear trend model over sales records.
//!
//! The model is ordinary least squares with an intercept:
//!
//! ```text
//! earnings = intercept + day_of_year_coef * day_of_year + year_coef * year
//! ```
//!
//! Features are centered and scaled to unit norm before solving the 2x2
//! normal equations through a pseudo-inverse, so day-of-year (spread in the
//! hundreds) and year (spread near one) are compared on the same footing.
//! A feature that never varies gets a zero coefficient, and exactly collinear
//! features resolve to the minimum-norm solution instead of blowing up. A
//! dataset where neither feature varies is rejected.

use crate::error::{Result, SalesReportError};
use crate::schema::{ForecastSettings, ForecastTarget, ProductRecord};
use crate::utils::{date_features, future_dates};
use chrono::NaiveDate;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

// Singular values of the scaled design below this share of the largest one
// are treated as zero.
const RANK_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitStrategy {
    /// Too few records to hold any out; every record was used for training.
    WholeDataset,
    /// Trained on a seeded random subset, the remainder kept as holdout.
    TrainTestSplit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    pub strategy: FitStrategy,
    pub target: ForecastTarget,
    pub training_records: usize,
    pub holdout_records: usize,
    /// Mean squared error on the holdout subset, when there is one
    pub holdout_mse: Option<f64>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastModel {
    pub intercept: f64,
    pub day_of_year_coef: f64,
    pub year_coef: f64,
    pub diagnostics: FitDiagnostics,
}

impl ForecastModel {
    pub fn predict(&self, date: NaiveDate) -> f64 {
        let (day_of_year, year) = date_features(date);
        self.predict_features(day_of_year, year)
    }

    fn predict_features(&self, day_of_year: f64, year: f64) -> f64 {
        self.intercept + self.day_of_year_coef * day_of_year + self.year_coef * year
    }

    /// Sum of daily predictions for the `horizon_days` days after `reference_date`.
    pub fn project(&self, horizon_days: u32, reference_date: NaiveDate) -> Result<f64> {
        future_dates(reference_date, horizon_days)
            .map(|date| date.map(|date| self.predict(date)))
            .sum()
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    day_of_year: f64,
    year: f64,
    target: f64,
}

pub struct TrendForecaster {
    settings: ForecastSettings,
}

impl TrendForecaster {
    pub fn new(settings: ForecastSettings) -> Self {
        Self { settings }
    }

    pub fn fit(&self, records: &[ProductRecord]) -> Result<ForecastModel> {
        if records.is_empty() {
            return Err(SalesReportError::InsufficientData(
                "no records to train on; add sales data first".to_string(),
            ));
        }

        let target = self.settings.target;
        let samples: Vec<Sample> = records
            .iter()
            .map(|record| {
                let (day_of_year, year) = date_features(record.date);
                Sample {
                    day_of_year,
                    year,
                    target: record.target_value(target),
                }
            })
            .collect();

        if samples.len() < self.settings.min_split_records.max(2) {
            let warning = format!(
                "Only {} records available (< {}); training on the entire dataset without a holdout",
                samples.len(),
                self.settings.min_split_records
            );
            warn!("{}", warning);

            let (intercept, day_of_year_coef, year_coef) = solve_least_squares(&samples)?;
            return Ok(ForecastModel {
                intercept,
                day_of_year_coef,
                year_coef,
                diagnostics: FitDiagnostics {
                    strategy: FitStrategy::WholeDataset,
                    target,
                    training_records: samples.len(),
                    holdout_records: 0,
                    holdout_mse: None,
                    warnings: vec![warning],
                },
            });
        }

        let (train, holdout) = self.split(&samples);
        debug!(
            "Split {} records into {} training / {} holdout (seed {})",
            samples.len(),
            train.len(),
            holdout.len(),
            self.settings.split_seed
        );

        let (intercept, day_of_year_coef, year_coef) = solve_least_squares(&train)?;
        let mut model = ForecastModel {
            intercept,
            day_of_year_coef,
            year_coef,
            diagnostics: FitDiagnostics {
                strategy: FitStrategy::TrainTestSplit,
                target,
                training_records: train.len(),
                holdout_records: holdout.len(),
                holdout_mse: None,
                warnings: Vec::new(),
            },
        };

        let squared_error: f64 = holdout
            .iter()
            .map(|s| {
                let residual = model.predict_features(s.day_of_year, s.year) - s.target;
                residual * residual
            })
            .sum();
        let mse = squared_error / holdout.len() as f64;
        model.diagnostics.holdout_mse = Some(mse);

        info!(
            "Fitted trend model: intercept {:.4}, day-of-year {:.6}, year {:.6}, holdout MSE {:.4}",
            model.intercept, model.day_of_year_coef, model.year_coef, mse
        );

        Ok(model)
    }

    fn split(&self, samples: &[Sample]) -> (Vec<Sample>, Vec<Sample>) {
        let n = samples.len();
        let holdout_len =
            ((n as f64 * self.settings.test_fraction).ceil() as usize).clamp(1, n - 1);

        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.settings.split_seed);
        order.shuffle(&mut rng);

        let holdout = order[..holdout_len].iter().map(|&i| samples[i]).collect();
        let train = order[holdout_len..].iter().map(|&i| samples[i]).collect();
        (train, holdout)
    }
}

pub fn fit(records: &[ProductRecord], settings: &ForecastSettings) -> Result<ForecastModel> {
    TrendForecaster::new(settings.clone()).fit(records)
}

pub fn project(model: &ForecastModel, horizon_days: u32, reference_date: NaiveDate) -> Result<f64> {
    model.project(horizon_days, reference_date)
}

/// Returns `(intercept, day_of_year_coef, year_coef)`.
fn solve_least_squares(samples: &[Sample]) -> Result<(f64, f64, f64)> {
    let n = samples.len() as f64;
    let mean_day = samples.iter().map(|s| s.day_of_year).sum::<f64>() / n;
    let mean_year = samples.iter().map(|s| s.year).sum::<f64>() / n;
    let mean_target = samples.iter().map(|s| s.target).sum::<f64>() / n;

    let (mut s_dd, mut s_dy, mut s_yy, mut s_dt, mut s_yt) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for s in samples {
        let d = s.day_of_year - mean_day;
        let y = s.year - mean_year;
        let t = s.target - mean_target;
        s_dd += d * d;
        s_dy += d * y;
        s_yy += y * y;
        s_dt += d * t;
        s_yt += y * t;
    }

    let (day_norm, year_norm) = (s_dd.sqrt(), s_yy.sqrt());
    let (day_coef, year_coef) = match (day_norm > 0.0, year_norm > 0.0) {
        (false, false) => {
            return Err(SalesReportError::InsufficientData(
                "records cover fewer than 2 distinct (day of year, year) combinations"
                    .to_string(),
            ));
        }
        (true, false) => (s_dt / s_dd, 0.0),
        (false, true) => (0.0, s_yt / s_yy),
        (true, true) => {
            let correlation = s_dy / (day_norm * year_norm);
            let (day_scaled, year_scaled) = pseudo_inverse_solve(
                1.0,
                correlation,
                1.0,
                (s_dt / day_norm, s_yt / year_norm),
            );
            (day_scaled / day_norm, year_scaled / year_norm)
        }
    };
    let intercept = mean_target - day_coef * mean_day - year_coef * mean_year;

    if !(intercept.is_finite() && day_coef.is_finite() && year_coef.is_finite()) {
        return Err(SalesReportError::InsufficientData(
            "regression produced non-finite coefficients".to_string(),
        ));
    }

    Ok((intercept, day_coef, year_coef))
}

/// Minimum-norm solution of `[[a, b], [b, c]] * x = rhs` for a symmetric
/// positive semi-definite matrix.
fn pseudo_inverse_solve(a: f64, b: f64, c: f64, rhs: (f64, f64)) -> (f64, f64) {
    let mid = (a + c) / 2.0;
    let radius = ((a - c) / 2.0).hypot(b);
    let eigen = [
        (mid + radius, eigenvector(a, b, c, mid + radius, (1.0, 0.0))),
        (mid - radius, eigenvector(a, b, c, mid - radius, (0.0, 1.0))),
    ];
    let cutoff = eigen[0].0.sqrt() * RANK_TOLERANCE;

    let mut x = (0.0, 0.0);
    for (lambda, v) in eigen {
        if lambda <= 0.0 || lambda.sqrt() <= cutoff {
            continue;
        }
        let weight = (v.0 * rhs.0 + v.1 * rhs.1) / lambda;
        x.0 += weight * v.0;
        x.1 += weight * v.1;
    }
    x
}

fn eigenvector(a: f64, b: f64, c: f64, lambda: f64, fallback: (f64, f64)) -> (f64, f64) {
    let first = (lambda - c, b);
    let second = (b, lambda - a);
    let candidate = if first.0.hypot(first.1) >= second.0.hypot(second.1) {
        first
    } else {
        second
    };

    let norm = candidate.0.hypot(candidate.1);
    if norm == 0.0 {
        fallback
    } else {
        (candidate.0 / norm, candidate.1 / norm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MeasurementUnit;
    use chrono::{Datelike, Days};

    fn earning_on(id: u64, date: NaiveDate, earnings: f64) -> ProductRecord {
        ProductRecord::new(id, "Widget", 0.0, earnings, 1.0, MeasurementUnit::Piece, date).unwrap()
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
    }

    #[test]
    fn test_empty_records_are_insufficient() {
        let result = fit(&[], &ForecastSettings::default());
        assert!(matches!(result, Err(SalesReportError::InsufficientData(_))));
    }

    #[test]
    fn test_single_date_is_rejected_not_degenerate() {
        let small: Vec<ProductRecord> = (1..=3).map(|i| earning_on(i, start(), i as f64)).collect();
        let result = fit(&small, &ForecastSettings::default());
        assert!(matches!(result, Err(SalesReportError::InsufficientData(_))));

        let large: Vec<ProductRecord> = (1..=8).map(|i| earning_on(i, start(), i as f64)).collect();
        let result = fit(&large, &ForecastSettings::default());
        assert!(matches!(result, Err(SalesReportError::InsufficientData(_))));
    }

    #[test]
    fn test_small_dataset_fits_whole_dataset() {
        let records: Vec<ProductRecord> = (0..4u64)
            .map(|i| {
                let date = start() + Days::new(i * 10);
                earning_on(i + 1, date, 2.0 * date.ordinal() as f64 + 5.0)
            })
            .collect();

        let model = fit(&records, &ForecastSettings::default()).unwrap();
        assert_eq!(model.diagnostics.strategy, FitStrategy::WholeDataset);
        assert_eq!(model.diagnostics.training_records, 4);
        assert_eq!(model.diagnostics.holdout_records, 0);
        assert!(model.diagnostics.holdout_mse.is_none());
        assert_eq!(model.diagnostics.warnings.len(), 1);
        assert!(model.diagnostics.warnings[0].contains("entire dataset"));

        assert!((model.day_of_year_coef - 2.0).abs() < 1e-9);
        assert_eq!(model.year_coef, 0.0);
        assert!((model.intercept - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_split_fit_recovers_plane_across_years() {
        let records: Vec<ProductRecord> = (0..10u64)
            .map(|i| {
                let date = start() + Days::new(i * 73);
                let value = 1.5 * date.ordinal() as f64 + 10.0 * (date.year() - 2020) as f64 + 20.0;
                earning_on(i + 1, date, value)
            })
            .collect();

        let model = fit(&records, &ForecastSettings::default()).unwrap();
        assert_eq!(model.diagnostics.strategy, FitStrategy::TrainTestSplit);
        assert_eq!(model.diagnostics.training_records, 8);
        assert_eq!(model.diagnostics.holdout_records, 2);
        assert!((model.day_of_year_coef - 1.5).abs() < 1e-6);
        assert!((model.year_coef - 10.0).abs() < 1e-6);
        assert!(model.diagnostics.holdout_mse.unwrap() < 1e-6);
        assert!(model.diagnostics.warnings.is_empty());

        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!((model.predict(date) - (1.5 * 32.0 + 40.0 + 20.0)).abs() < 1e-4);
    }

    #[test]
    fn test_split_is_reproducible() {
        let records: Vec<ProductRecord> = (0..12u64)
            .map(|i| {
                let date = start() + Days::new(i * 3);
                earning_on(i + 1, date, ((i * 7) % 5) as f64 + 1.0)
            })
            .collect();

        let settings = ForecastSettings::default();
        let first = fit(&records, &settings).unwrap();
        let second = fit(&records, &settings).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.diagnostics.holdout_records, 3);
    }

    #[test]
    fn test_collinear_features_use_minimum_norm_solution() {
        let records = vec![
            earning_on(1, NaiveDate::from_ymd_opt(2023, 1, 10).unwrap(), 4.0),
            earning_on(2, NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(), 8.0),
        ];

        let model = fit(&records, &ForecastSettings::default()).unwrap();
        assert!(model.day_of_year_coef.is_finite());
        assert!(model.year_coef.is_finite());
        assert!((model.predict(records[0].date) - 4.0).abs() < 1e-6);
        assert!((model.predict(records[1].date) - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_new_year_records_interpolate_exactly() {
        let records = vec![
            earning_on(1, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(), 10.0),
            earning_on(2, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 20.0),
            earning_on(3, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 30.0),
        ];

        // Three points, three parameters: least squares passes through all of them.
        let model = fit(&records, &ForecastSettings::default()).unwrap();
        assert!((model.day_of_year_coef - 10.0).abs() < 1e-6);
        assert!((model.year_coef - 3650.0).abs() < 1e-4);
        for record in &records {
            assert!((model.predict(record.date) - record.selling_price).abs() < 1e-6);
        }

        // Jan 3 through Feb 1 2024 follow 10 * day + 10
        let reference = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let expected: f64 = (3..=32).map(|day| 10.0 * day as f64 + 10.0).sum();
        assert!((model.project(30, reference).unwrap() - expected).abs() < 1e-4);
    }

    #[test]
    fn test_gross_revenue_target() {
        let records: Vec<ProductRecord> = (0..3u64)
            .map(|i| {
                ProductRecord::new(
                    i + 1,
                    "Rice",
                    4.0,
                    6.0,
                    2.0,
                    MeasurementUnit::Kilogram,
                    start() + Days::new(i),
                )
                .unwrap()
            })
            .collect();

        let settings = ForecastSettings {
            target: ForecastTarget::GrossRevenue,
            ..ForecastSettings::default()
        };
        let model = fit(&records, &settings).unwrap();
        assert_eq!(model.diagnostics.target, ForecastTarget::GrossRevenue);
        assert!((model.predict(start()) - 12.0).abs() < 1e-9);

        let net = fit(&records, &ForecastSettings::default()).unwrap();
        assert!((net.predict(start()) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_projection_sums_daily_predictions() {
        let records: Vec<ProductRecord> = (0..6u64)
            .map(|i| earning_on(i + 1, start() + Days::new(i), 5.0))
            .collect();
        let model = fit(&records, &ForecastSettings::default()).unwrap();

        let reference = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        assert_eq!(project(&model, 0, reference).unwrap(), 0.0);
        assert!((project(&model, 30, reference).unwrap() - 150.0).abs() < 1e-9);
        assert!((project(&model, 365, reference).unwrap() - 1825.0).abs() < 1e-9);
    }

    #[test]
    fn test_projection_follows_trend_across_new_year() {
        let model = ForecastModel {
            intercept: 0.0,
            day_of_year_coef: 1.0,
            year_coef: 0.0,
            diagnostics: FitDiagnostics {
                strategy: FitStrategy::WholeDataset,
                target: ForecastTarget::NetEarnings,
                training_records: 2,
                holdout_records: 0,
                holdout_mse: None,
                warnings: Vec::new(),
            },
        };

        let reference = NaiveDate::from_ymd_opt(2023, 12, 30).unwrap();
        // Dec 31 (365) + Jan 1 (1) + Jan 2 (2)
        assert_eq!(model.project(3, reference).unwrap(), 368.0);
    }

    #[test]
    fn test_pseudo_inverse_full_rank_matches_direct_solve() {
        // [[4, 1], [1, 3]] x = [1, 2] => x = [1/11, 7/11]
        let (x0, x1) = pseudo_inverse_solve(4.0, 1.0, 3.0, (1.0, 2.0));
        assert!((x0 - 1.0 / 11.0).abs() < 1e-12);
        assert!((x1 - 7.0 / 11.0).abs() < 1e-12);
    }
}
