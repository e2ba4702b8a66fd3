use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use crate::generator::{within_window, ObservationSource};
use crate::models::{
    Alert, RainfallObservation, RiskCategory, RiskPrediction, RiverLevelObservation,
    StatusSummary, SystemStatus, Vulnerability, Zone,
};
use crate::stats::round_to;
use crate::trend::{moving_average, slope};

pub const PREDICTION_WINDOW_DAYS: i64 = 14;

pub const DANGER_RATIO_WEIGHT: f64 = 35.0;
pub const RAINFALL_INTENSITY_WEIGHT: f64 = 25.0;
pub const RAINFALL_TREND_WEIGHT: f64 = 15.0;
pub const RIVER_TREND_WEIGHT: f64 = 15.0;
pub const VULNERABILITY_WEIGHT: f64 = 10.0;

const RAINFALL_INTENSITY_SCALE_MM: f64 = 200.0;
const RAINFALL_SLOPE_SCALE: f64 = 10.0;
const LEVEL_SLOPE_SCALE: f64 = 0.5;
const ELEVATION_SCALE_M: f64 = 30.0;

pub const RAINFALL_SLOPE_TRIGGER: f64 = 2.0;
pub const HEAVY_RAINFALL_TRIGGER_MM: f64 = 100.0;
pub const DANGER_RATIO_TRIGGER: f64 = 0.85;
pub const LEVEL_SLOPE_TRIGGER: f64 = 0.1;
pub const PEAK_RAINFALL_TRIGGER_MM: f64 = 150.0;
pub const LOW_ELEVATION_TRIGGER_M: f64 = 12.0;

pub const NO_RISK_FACTORS: &str = "No significant risk factors detected";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneFeatures {
    pub rainfall_slope: f64,
    pub rainfall_3day_avg: f64,
    pub rainfall_7day_avg: f64,
    pub peak_rainfall: f64,
    pub level_slope: f64,
    pub current_danger_ratio: f64,
}

#[derive(Default)]
struct DailyLevel {
    sum: f64,
    count: usize,
    max_ratio: f64,
}

impl ZoneFeatures {
    pub fn extract(
        rainfall: &[RainfallObservation],
        river_levels: &[RiverLevelObservation],
        as_of: NaiveDate,
    ) -> Self {
        let mut daily_rainfall: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for record in rainfall
            .iter()
            .filter(|r| within_window(r.date, as_of, PREDICTION_WINDOW_DAYS))
        {
            *daily_rainfall.entry(record.date).or_insert(0.0) += record.rainfall_mm;
        }
        let rainfall_values: Vec<f64> = daily_rainfall.into_values().collect();

        let mut daily_level: BTreeMap<NaiveDate, DailyLevel> = BTreeMap::new();
        for record in river_levels
            .iter()
            .filter(|r| within_window(r.date, as_of, PREDICTION_WINDOW_DAYS))
        {
            let entry = daily_level.entry(record.date).or_default();
            entry.sum += record.level_m;
            entry.count += 1;
            entry.max_ratio = entry.max_ratio.max(record.danger_ratio());
        }
        let level_values: Vec<f64> = daily_level
            .values()
            .map(|day| day.sum / day.count as f64)
            .collect();
        let current_danger_ratio = daily_level
            .values()
            .next_back()
            .map(|day| day.max_ratio)
            .unwrap_or(0.0);

        Self {
            rainfall_slope: slope(&rainfall_values),
            rainfall_3day_avg: moving_average(&rainfall_values, 3),
            rainfall_7day_avg: moving_average(&rainfall_values, 7),
            peak_rainfall: rainfall_values.iter().copied().fold(0.0, f64::max),
            level_slope: slope(&level_values),
            current_danger_ratio,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub danger_ratio: f64,
    pub rainfall_intensity: f64,
    pub rainfall_trend: f64,
    pub river_trend: f64,
    pub vulnerability: f64,
}

impl ScoreBreakdown {
    pub fn compute(features: &ZoneFeatures, zone: &Zone) -> Self {
        let elevation_factor = (1.0 - zone.elevation_m / ELEVATION_SCALE_M).max(0.0);

        Self {
            danger_ratio: (features.current_danger_ratio * DANGER_RATIO_WEIGHT)
                .min(DANGER_RATIO_WEIGHT),
            rainfall_intensity: (features.rainfall_3day_avg / RAINFALL_INTENSITY_SCALE_MM
                * RAINFALL_INTENSITY_WEIGHT)
                .min(RAINFALL_INTENSITY_WEIGHT),
            rainfall_trend: (features.rainfall_slope.max(0.0) / RAINFALL_SLOPE_SCALE
                * RAINFALL_TREND_WEIGHT)
                .min(RAINFALL_TREND_WEIGHT),
            river_trend: (features.level_slope.max(0.0) / LEVEL_SLOPE_SCALE * RIVER_TREND_WEIGHT)
                .min(RIVER_TREND_WEIGHT),
            vulnerability: zone.vulnerability.base_points() * elevation_factor,
        }
    }

    pub fn total(&self) -> f64 {
        self.danger_ratio
            + self.rainfall_intensity
            + self.rainfall_trend
            + self.river_trend
            + self.vulnerability
    }

    /// Total rounded to the nearest integer and clamped to 0..=100.
    pub fn risk_score(&self) -> u8 {
        round_to(self.total(), 0).clamp(0.0, 100.0) as u8
    }
}

pub fn risk_factors(features: &ZoneFeatures, zone: &Zone) -> Vec<String> {
    let mut factors = Vec::new();
    if features.rainfall_slope > RAINFALL_SLOPE_TRIGGER {
        factors.push(format!(
            "rainfall trending upward ({:.0}mm 3-day avg)",
            features.rainfall_3day_avg
        ));
    }
    if features.rainfall_3day_avg > HEAVY_RAINFALL_TRIGGER_MM {
        factors.push(format!(
            "heavy rainfall: {:.0}mm 3-day avg",
            features.rainfall_3day_avg
        ));
    }
    if features.current_danger_ratio > DANGER_RATIO_TRIGGER {
        factors.push(format!(
            "river at {:.0}% of danger level",
            features.current_danger_ratio * 100.0
        ));
    }
    if features.level_slope > LEVEL_SLOPE_TRIGGER {
        factors.push("river level rising".to_string());
    }
    if features.peak_rainfall > PEAK_RAINFALL_TRIGGER_MM {
        factors.push(format!(
            "extreme rainfall peak: {:.0}mm",
            features.peak_rainfall
        ));
    }
    if zone.vulnerability == Vulnerability::High {
        factors.push("high-vulnerability zone".to_string());
    }
    if zone.elevation_m < LOW_ELEVATION_TRIGGER_M {
        factors.push(format!("low elevation ({}m)", zone.elevation_m));
    }
    factors
}

pub fn explanation(features: &ZoneFeatures, zone: &Zone) -> String {
    let factors = risk_factors(features, zone);
    if factors.is_empty() {
        NO_RISK_FACTORS.to_string()
    } else {
        format!("Risk factors: {}", factors.join("; "))
    }
}

pub fn compute_zone_risk(
    zone: &Zone,
    rainfall: &[RainfallObservation],
    river_levels: &[RiverLevelObservation],
    as_of: NaiveDate,
    timestamp: DateTime<Utc>,
) -> RiskPrediction {
    let features = ZoneFeatures::extract(rainfall, river_levels, as_of);
    let risk_score = ScoreBreakdown::compute(&features, zone).risk_score();

    RiskPrediction {
        zone_id: zone.id.clone(),
        zone_name: zone.name.clone(),
        risk_score,
        risk_category: RiskCategory::from_score(risk_score),
        explanation: explanation(&features, zone),
        rainfall_trend: round_to(features.rainfall_slope, 2),
        river_level_trend: round_to(features.level_slope, 2),
        timestamp,
    }
}

pub fn run_predictions<S: ObservationSource + ?Sized>(
    zones: &[Zone],
    source: &S,
    timestamp: DateTime<Utc>,
) -> Vec<RiskPrediction> {
    let rainfall = source.rainfall();
    let river_levels = source.river_levels();
    let as_of = source.as_of();

    zones
        .iter()
        .map(|zone| compute_zone_risk(zone, rainfall, river_levels, as_of, timestamp))
        .collect()
}

pub fn summarize(
    predictions: &[RiskPrediction],
    data_source: &str,
    last_updated: DateTime<Utc>,
) -> StatusSummary {
    let count = |category: RiskCategory| {
        predictions
            .iter()
            .filter(|p| p.risk_category == category)
            .count()
    };
    let severe_zones = count(RiskCategory::Severe);
    let warning_zones = count(RiskCategory::Warning);
    let watch_zones = count(RiskCategory::Watch);

    let max_risk = predictions.iter().map(|p| p.risk_score).max().unwrap_or(0);
    let avg_risk = if predictions.is_empty() {
        0
    } else {
        let total: f64 = predictions.iter().map(|p| f64::from(p.risk_score)).sum();
        round_to(total / predictions.len() as f64, 0) as u8
    };

    StatusSummary {
        max_risk,
        avg_risk,
        severe_zones,
        warning_zones,
        watch_zones,
        normal_zones: predictions.len() - severe_zones - warning_zones - watch_zones,
        total_zones: predictions.len(),
        last_updated,
        data_source: data_source.to_string(),
    }
}

pub fn system_status<S: ObservationSource + ?Sized>(
    zones: &[Zone],
    source: &S,
    timestamp: DateTime<Utc>,
) -> SystemStatus {
    let predictions = run_predictions(zones, source, timestamp);
    let summary = summarize(&predictions, source.description(), timestamp);
    info!(
        zones = summary.total_zones,
        max_risk = summary.max_risk,
        severe = summary.severe_zones,
        warning = summary.warning_zones,
        "computed system status"
    );
    SystemStatus {
        predictions,
        summary,
    }
}

pub fn alert_message(prediction: &RiskPrediction) -> String {
    format!(
        "[Meghdoot Alert] Flood risk {} in {} within next 12 hours (score: {}/100). {}. Stay alert. This is not an official government warning.",
        prediction.risk_category.as_str().to_uppercase(),
        prediction.zone_name,
        prediction.risk_score,
        prediction.explanation
    )
}

pub fn generate_alerts(predictions: &[RiskPrediction], threshold: u8) -> Vec<Alert> {
    predictions
        .iter()
        .filter(|p| p.risk_score >= threshold)
        .map(|p| Alert {
            zone: p.zone_name.clone(),
            message: alert_message(p),
            risk_score: p.risk_score,
            category: p.risk_category,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::SyntheticObservations;
    use crate::reference::sylhet_zones;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 20).unwrap()
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 20, 6, 0, 0).unwrap()
    }

    fn sample_zone(vulnerability: Vulnerability, elevation_m: f64) -> Zone {
        Zone {
            id: "z-test".to_string(),
            name: "Test Haor".to_string(),
            name_bn: "পরীক্ষা".to_string(),
            district: "Sylhet".to_string(),
            lat: 24.9,
            lng: 91.9,
            radius_km: 4.0,
            elevation_m,
            vulnerability,
            population: 100_000,
        }
    }

    fn rainfall_series(values: &[f64]) -> Vec<RainfallObservation> {
        let start = as_of() - Duration::days(values.len() as i64 - 1);
        values
            .iter()
            .enumerate()
            .map(|(i, v)| RainfallObservation {
                date: start + Duration::days(i as i64),
                station: "Sylhet".to_string(),
                rainfall_mm: *v,
            })
            .collect()
    }

    fn river_series(levels: &[f64], danger_level_m: f64) -> Vec<RiverLevelObservation> {
        let start = as_of() - Duration::days(levels.len() as i64 - 1);
        levels
            .iter()
            .enumerate()
            .map(|(i, level)| RiverLevelObservation {
                date: start + Duration::days(i as i64),
                river: "Surma".to_string(),
                station: "Sylhet (Kanairghat)".to_string(),
                level_m: *level,
                danger_level_m,
            })
            .collect()
    }

    #[test]
    fn rising_rain_on_high_river_scores_warning() {
        let zone = sample_zone(Vulnerability::High, 10.0);
        let rainfall: Vec<f64> = (0..14).map(|i| 84.0 + 3.0 * i as f64).collect();
        let rainfall = rainfall_series(&rainfall);
        let river = river_series(&[7.36; 14], 8.0);

        let features = ZoneFeatures::extract(&rainfall, &river, as_of());
        assert!((features.rainfall_3day_avg - 120.0).abs() < 1e-9);
        assert!((features.rainfall_slope - 3.0).abs() < 1e-9);
        assert!((features.current_danger_ratio - 0.92).abs() < 1e-9);

        let breakdown = ScoreBreakdown::compute(&features, &zone);
        assert!((breakdown.danger_ratio - 32.2).abs() < 1e-6);
        assert!((breakdown.rainfall_intensity - 15.0).abs() < 1e-9);
        assert!((breakdown.rainfall_trend - 4.5).abs() < 1e-9);
        assert!(breakdown.river_trend.abs() < 1e-9);
        assert!((breakdown.vulnerability - 20.0 / 3.0).abs() < 1e-9);

        let prediction = compute_zone_risk(&zone, &rainfall, &river, as_of(), stamp());
        assert_eq!(prediction.risk_score, 58);
        assert_eq!(prediction.risk_category, RiskCategory::Warning);
        assert_eq!(prediction.rainfall_trend, 3.0);
        assert_eq!(prediction.river_level_trend, 0.0);
        assert!(prediction.explanation.starts_with("Risk factors: "));
        assert!(prediction.explanation.contains("heavy rainfall: 120mm 3-day avg"));
        assert!(prediction.explanation.contains("river at 92% of danger level"));
        assert!(prediction.explanation.contains("low elevation (10m)"));
    }

    #[test]
    fn window_excludes_older_and_future_days() {
        let mut rainfall = rainfall_series(&[10.0; 14]);
        rainfall.push(RainfallObservation {
            date: as_of() - Duration::days(14),
            station: "Sylhet".to_string(),
            rainfall_mm: 900.0,
        });
        rainfall.push(RainfallObservation {
            date: as_of() + Duration::days(1),
            station: "Sylhet".to_string(),
            rainfall_mm: 900.0,
        });

        let features = ZoneFeatures::extract(&rainfall, &[], as_of());
        assert_eq!(features.peak_rainfall, 10.0);
        assert_eq!(features.rainfall_3day_avg, 10.0);
    }

    #[test]
    fn rainfall_is_summed_across_stations_per_day() {
        let mut rainfall = rainfall_series(&[20.0; 3]);
        rainfall.extend(rainfall_series(&[30.0; 3]).into_iter().map(|mut r| {
            r.station = "Sunamganj".to_string();
            r
        }));

        let features = ZoneFeatures::extract(&rainfall, &[], as_of());
        assert_eq!(features.rainfall_3day_avg, 50.0);
        assert_eq!(features.peak_rainfall, 50.0);
    }

    #[test]
    fn danger_ratio_takes_highest_gauge_on_latest_day() {
        let mut river = river_series(&[4.0, 4.0], 8.0);
        river.extend(river_series(&[3.0, 6.3], 7.0));
        let features = ZoneFeatures::extract(&[], &river, as_of());
        assert!((features.current_danger_ratio - 0.9).abs() < 1e-9);
    }

    #[test]
    fn empty_observations_leave_only_vulnerability() {
        let zone = sample_zone(Vulnerability::Medium, 15.0);
        let prediction = compute_zone_risk(&zone, &[], &[], as_of(), stamp());
        assert_eq!(prediction.risk_score, 3);
        assert_eq!(prediction.risk_category, RiskCategory::Normal);
        assert_eq!(prediction.explanation, NO_RISK_FACTORS);
    }

    #[test]
    fn falling_trends_do_not_add_points() {
        let zone = sample_zone(Vulnerability::Low, 40.0);
        let rainfall: Vec<f64> = (0..14).map(|i| 140.0 - 10.0 * i as f64).collect();
        let river: Vec<f64> = (0..14).map(|i| 6.0 - 0.2 * i as f64).collect();
        let features =
            ZoneFeatures::extract(&rainfall_series(&rainfall), &river_series(&river, 8.0), as_of());
        let breakdown = ScoreBreakdown::compute(&features, &zone);
        assert_eq!(breakdown.rainfall_trend, 0.0);
        assert_eq!(breakdown.river_trend, 0.0);
        assert_eq!(breakdown.vulnerability, 0.0);
    }

    #[test]
    fn terms_saturate_at_their_weights() {
        let zone = sample_zone(Vulnerability::High, 0.0);
        let rainfall: Vec<f64> = (0..14).map(|i| 100.0 * i as f64).collect();
        let river: Vec<f64> = (0..14).map(|i| 2.0 + i as f64).collect();
        let prediction = compute_zone_risk(
            &zone,
            &rainfall_series(&rainfall),
            &river_series(&river, 5.0),
            as_of(),
            stamp(),
        );
        assert_eq!(prediction.risk_score, 100);
        assert_eq!(prediction.risk_category, RiskCategory::Severe);
    }

    #[test]
    fn status_counts_every_zone() {
        let zones = sylhet_zones();
        let source = SyntheticObservations::new(as_of(), 90);
        let status = system_status(&zones, &source, stamp());

        let summary = &status.summary;
        assert_eq!(summary.total_zones, 15);
        assert_eq!(
            summary.severe_zones + summary.warning_zones + summary.watch_zones + summary.normal_zones,
            15
        );
        assert_eq!(
            summary.max_risk,
            status.predictions.iter().map(|p| p.risk_score).max().unwrap()
        );
        for prediction in &status.predictions {
            assert!(prediction.risk_score <= 100);
            assert_eq!(
                prediction.risk_category,
                RiskCategory::from_score(prediction.risk_score)
            );
        }
    }

    #[test]
    fn predictions_are_idempotent() {
        let zones = sylhet_zones();
        let source = SyntheticObservations::new(as_of(), 90);
        assert_eq!(
            run_predictions(&zones, &source, stamp()),
            run_predictions(&zones, &source, stamp())
        );
    }

    #[test]
    fn empty_zone_list_summarizes_to_zero() {
        let summary = summarize(&[], "test", stamp());
        assert_eq!(summary.max_risk, 0);
        assert_eq!(summary.avg_risk, 0);
        assert_eq!(summary.total_zones, 0);
    }

    #[test]
    fn alerts_filter_on_threshold() {
        let zone = sample_zone(Vulnerability::High, 10.0);
        let mut high = compute_zone_risk(&zone, &[], &[], as_of(), stamp());
        high.risk_score = 62;
        high.risk_category = RiskCategory::from_score(62);
        let mut low = high.clone();
        low.risk_score = 20;
        low.risk_category = RiskCategory::from_score(20);

        let alerts = generate_alerts(&[high, low], 50);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].risk_score, 62);
        assert_eq!(alerts[0].category, RiskCategory::Warning);
        assert!(alerts[0]
            .message
            .starts_with("[Meghdoot Alert] Flood risk WARNING in Test Haor"));
        assert!(alerts[0].message.contains("(score: 62/100)"));
    }

    #[test]
    fn alert_threshold_is_inclusive() {
        let zone = sample_zone(Vulnerability::High, 10.0);
        let scored = |score: u8| {
            let mut prediction = compute_zone_risk(&zone, &[], &[], as_of(), stamp());
            prediction.risk_score = score;
            prediction.risk_category = RiskCategory::from_score(score);
            prediction
        };

        let alerts = generate_alerts(&[scored(50), scored(49)], 50);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].risk_score, 50);

        assert!(generate_alerts(&[scored(74)], 75).is_empty());
        assert_eq!(generate_alerts(&[scored(0)], 0).len(), 1);
    }

    proptest! {
        #[test]
        fn score_is_bounded(
            rain in proptest::collection::vec(0.0f64..2000.0, 0..14),
            levels in proptest::collection::vec(0.0f64..15.0, 0..14),
            elevation in 0.0f64..60.0,
        ) {
            let zone = sample_zone(Vulnerability::High, elevation);
            let prediction = compute_zone_risk(
                &zone,
                &rainfall_series(&rain),
                &river_series(&levels, 8.0),
                as_of(),
                stamp(),
            );
            prop_assert!(prediction.risk_score <= 100);
            prop_assert_eq!(prediction.risk_category, RiskCategory::from_score(prediction.risk_score));
        }

        #[test]
        fn higher_danger_ratio_never_lowers_score(
            ratio in 0.0f64..1.5,
            bump in 0.0f64..1.0,
            rain_avg in 0.0f64..300.0,
            rain_slope in -20.0f64..20.0,
            level_slope in -1.0f64..1.0,
        ) {
            let zone = sample_zone(Vulnerability::Medium, 8.0);
            let features = ZoneFeatures {
                rainfall_slope: rain_slope,
                rainfall_3day_avg: rain_avg,
                rainfall_7day_avg: rain_avg,
                peak_rainfall: rain_avg,
                level_slope,
                current_danger_ratio: ratio,
            };
            let raised = ZoneFeatures { current_danger_ratio: ratio + bump, ..features };
            let before = ScoreBreakdown::compute(&features, &zone).risk_score();
            let after = ScoreBreakdown::compute(&raised, &zone).risk_score();
            prop_assert!(after >= before);
        }
    }
}
