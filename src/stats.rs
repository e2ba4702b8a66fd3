use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::RainfallObservation;

const Z_SCORES: [(f64, f64); 4] = [(0.80, 1.282), (0.90, 1.645), (0.95, 1.96), (0.99, 2.576)];

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;
pub const DEFAULT_BAND_WINDOW: usize = 7;
pub const DEFAULT_BAND_DAYS: usize = 30;

const Z_95: f64 = 1.96;
const Z_80: f64 = 1.282;

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor + 0.5).floor() / factor
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean(values);
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Z-score for a confidence level; unlisted levels fall back to 95%.
pub fn z_score(confidence_level: f64) -> f64 {
    Z_SCORES
        .iter()
        .find(|(level, _)| (level - confidence_level).abs() < 1e-9)
        .map(|(_, z)| *z)
        .unwrap_or(Z_95)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceInterval {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
    pub standard_error: f64,
    pub variance: f64,
    pub confidence_level: f64,
    pub sample_size: usize,
}

pub fn confidence_interval(values: &[f64], confidence_level: f64) -> ConfidenceInterval {
    let n = values.len();
    if n == 0 {
        return ConfidenceInterval {
            mean: 0.0,
            lower: 0.0,
            upper: 0.0,
            standard_error: 0.0,
            variance: 0.0,
            confidence_level,
            sample_size: 0,
        };
    }

    let mean = mean(values);
    let variance = variance(values);
    let standard_error = variance.sqrt() / (n as f64).sqrt();
    let z = z_score(confidence_level);

    ConfidenceInterval {
        mean: round_to(mean, 2),
        lower: round_to(mean - z * standard_error, 2),
        upper: round_to(mean + z * standard_error, 2),
        standard_error: round_to(standard_error, 2),
        variance: round_to(variance, 2),
        confidence_level,
        sample_size: n,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UncertaintyBand {
    pub date: NaiveDate,
    pub value: f64,
    #[serde(rename = "lower95")]
    pub lower_95: f64,
    #[serde(rename = "upper95")]
    pub upper_95: f64,
    #[serde(rename = "lower80")]
    pub lower_80: f64,
    #[serde(rename = "upper80")]
    pub upper_80: f64,
}

/// Per-point 80% and 95% bands from a trailing window of up to
/// `window_size` points. Lower bounds never drop below zero. A zero window
/// is empty, so every band is zero.
pub fn uncertainty_bands(series: &[SeriesPoint], window_size: usize) -> Vec<UncertaintyBand> {
    let values: Vec<f64> = series.iter().map(|point| point.value).collect();

    series
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let start = (i + 1).saturating_sub(window_size);
            let window = &values[start..i + 1];
            let mean = mean(window);
            let std_dev = std_dev(window);

            UncertaintyBand {
                date: point.date,
                value: point.value,
                lower_95: round_to(mean - Z_95 * std_dev, 2).max(0.0),
                upper_95: round_to(mean + Z_95 * std_dev, 2),
                lower_80: round_to(mean - Z_80 * std_dev, 2).max(0.0),
                upper_80: round_to(mean + Z_80 * std_dev, 2),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RainfallBands {
    pub bands: Vec<UncertaintyBand>,
    pub confidence: ConfidenceInterval,
}

pub fn daily_rainfall_totals(rainfall: &[RainfallObservation]) -> Vec<SeriesPoint> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in rainfall {
        *totals.entry(record.date).or_insert(0.0) += record.rainfall_mm;
    }
    totals
        .into_iter()
        .map(|(date, value)| SeriesPoint { date, value })
        .collect()
}

pub fn rainfall_bands(
    rainfall: &[RainfallObservation],
    days: usize,
    window_size: usize,
) -> RainfallBands {
    let totals = daily_rainfall_totals(rainfall);
    let recent = &totals[totals.len().saturating_sub(days)..];
    let values: Vec<f64> = recent.iter().map(|point| point.value).collect();

    RainfallBands {
        bands: uncertainty_bands(recent, window_size),
        confidence: confidence_interval(&values, DEFAULT_CONFIDENCE_LEVEL),
    }
}

pub fn rmse(predicted: &[f64], actual: &[f64]) -> f64 {
    let n = predicted.len().min(actual.len());
    if n == 0 {
        return 0.0;
    }
    let sum_squared_error: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum();
    round_to((sum_squared_error / n as f64).sqrt(), 2)
}

/// Coefficient of determination over the overlapping prefix. Zero when the
/// actual values have no variance.
pub fn r2(predicted: &[f64], actual: &[f64]) -> f64 {
    let n = predicted.len().min(actual.len());
    if n == 0 {
        return 0.0;
    }
    let actual = &actual[..n];
    let actual_mean = mean(actual);
    let ss_tot: f64 = actual.iter().map(|a| (a - actual_mean).powi(2)).sum();
    let ss_res: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum();
    if ss_tot == 0.0 {
        return 0.0;
    }
    round_to(1.0 - ss_res / ss_tot, 2)
}
