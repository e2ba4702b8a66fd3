//! Transparency view of a risk prediction.
//!
//! Contributions are the scoring model's structural weights, not per
//! observation attributions: every zone reports the same percentages, and
//! only the qualitative value and impact annotations vary with the
//! prediction's trends and the zone's vulnerability.

use serde::Serialize;

use crate::models::{RiskPrediction, Vulnerability, Zone};
use crate::reference::find_zone;
use crate::risk::{
    DANGER_RATIO_WEIGHT, LEVEL_SLOPE_TRIGGER, LOW_ELEVATION_TRIGGER_M, RAINFALL_INTENSITY_WEIGHT,
    RAINFALL_SLOPE_TRIGGER, RAINFALL_TREND_WEIGHT, RIVER_TREND_WEIGHT, VULNERABILITY_WEIGHT,
};
use crate::stats::round_to;

pub const ZONE_UNAVAILABLE: &str = "Zone data unavailable.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureContribution {
    pub feature: String,
    pub contribution: u8,
    pub value: String,
    pub impact: Impact,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainableResult {
    pub zone_id: String,
    pub zone_name: String,
    pub risk_score: u8,
    pub features: Vec<FeatureContribution>,
    pub top_factor: String,
    pub human_explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: &'static str,
    pub importance: u8,
    pub description: &'static str,
}

const TOTAL_WEIGHT: f64 = DANGER_RATIO_WEIGHT
    + RAINFALL_INTENSITY_WEIGHT
    + RAINFALL_TREND_WEIGHT
    + RIVER_TREND_WEIGHT
    + VULNERABILITY_WEIGHT;

fn weight_percent(weight: f64) -> u8 {
    round_to(weight / TOTAL_WEIGHT * 100.0, 0) as u8
}

fn signed(value: f64) -> String {
    if value > 0.0 {
        format!("+{value}")
    } else {
        format!("{value}")
    }
}

fn contribution(
    feature: &str,
    weight: f64,
    value: String,
    impact: Impact,
    description: &str,
) -> FeatureContribution {
    FeatureContribution {
        feature: feature.to_string(),
        contribution: weight_percent(weight),
        value,
        impact,
        description: description.to_string(),
    }
}

pub fn feature_contributions(prediction: &RiskPrediction, zone: &Zone) -> Vec<FeatureContribution> {
    let rainfall_trend = prediction.rainfall_trend;
    let river_trend = prediction.river_level_trend;

    let mut features = vec![
        contribution(
            "River Danger Ratio",
            DANGER_RATIO_WEIGHT,
            if river_trend > 0.0 { "Rising" } else { "Stable" }.to_string(),
            if river_trend > LEVEL_SLOPE_TRIGGER {
                Impact::Positive
            } else {
                Impact::Neutral
            },
            "Current river level relative to danger threshold (35% weight)",
        ),
        contribution(
            "Rainfall Intensity",
            RAINFALL_INTENSITY_WEIGHT,
            format!("Trend: {}", signed(rainfall_trend)),
            if rainfall_trend > RAINFALL_SLOPE_TRIGGER {
                Impact::Positive
            } else if rainfall_trend < 0.0 {
                Impact::Negative
            } else {
                Impact::Neutral
            },
            "3-day average rainfall intensity across stations (25% weight)",
        ),
        contribution(
            "Rainfall Trend",
            RAINFALL_TREND_WEIGHT,
            if rainfall_trend > 0.0 { "Increasing" } else { "Decreasing" }.to_string(),
            if rainfall_trend > 0.0 {
                Impact::Positive
            } else {
                Impact::Negative
            },
            "Direction and rate of rainfall change over 14 days (15% weight)",
        ),
        contribution(
            "River Level Trend",
            RIVER_TREND_WEIGHT,
            if river_trend > 0.0 { "Rising" } else { "Falling" }.to_string(),
            if river_trend > 0.0 {
                Impact::Positive
            } else {
                Impact::Negative
            },
            "Direction and rate of river level change (15% weight)",
        ),
        contribution(
            "Zone Vulnerability",
            VULNERABILITY_WEIGHT,
            format!("{} ({}m)", zone.vulnerability, zone.elevation_m),
            if zone.vulnerability == Vulnerability::High {
                Impact::Positive
            } else {
                Impact::Neutral
            },
            "Historical vulnerability rating and elevation factor (10% weight)",
        ),
    ];

    // Stable: equal weights keep declaration order.
    features.sort_by(|a, b| b.contribution.cmp(&a.contribution));
    features
}

/// Risk drivers that can be read back from a scored prediction.
pub fn active_factors(prediction: &RiskPrediction, zone: &Zone) -> Vec<&'static str> {
    let mut factors = Vec::new();
    if prediction.rainfall_trend > RAINFALL_SLOPE_TRIGGER {
        factors.push("increasing rainfall");
    }
    if prediction.river_level_trend > LEVEL_SLOPE_TRIGGER {
        factors.push("rising river levels");
    }
    if zone.vulnerability == Vulnerability::High {
        factors.push("high zone vulnerability");
    }
    if zone.elevation_m < LOW_ELEVATION_TRIGGER_M {
        factors.push("low elevation");
    }
    factors
}

/// Decomposes a prediction for the zone it was made for. A prediction for
/// a zone not in `zones` gets an empty decomposition.
pub fn explain_prediction(prediction: &RiskPrediction, zones: &[Zone]) -> ExplainableResult {
    let Some(zone) = find_zone(zones, &prediction.zone_id) else {
        return ExplainableResult {
            zone_id: prediction.zone_id.clone(),
            zone_name: prediction.zone_name.clone(),
            risk_score: prediction.risk_score,
            features: Vec::new(),
            top_factor: "Unknown".to_string(),
            human_explanation: ZONE_UNAVAILABLE.to_string(),
        };
    };

    let features = feature_contributions(prediction, zone);
    let (top_factor, top_weight) = features
        .first()
        .map(|f| (f.feature.clone(), f.contribution))
        .unwrap_or_else(|| ("Unknown".to_string(), 0));

    let factors = active_factors(prediction, zone);
    let score = prediction.risk_score;
    let human_explanation = if factors.is_empty() {
        format!(
            "Risk score of {score}/100. No significant risk factors currently active. Zone conditions are stable."
        )
    } else {
        format!(
            "Risk score of {score}/100 driven primarily by {}. The dominant factor is {}, accounting for {top_weight}% of the model weight.",
            factors.join(", "),
            top_factor.to_lowercase()
        )
    };

    ExplainableResult {
        zone_id: prediction.zone_id.clone(),
        zone_name: prediction.zone_name.clone(),
        risk_score: score,
        features,
        top_factor,
        human_explanation,
    }
}

pub fn global_feature_importance() -> [FeatureImportance; 5] {
    [
        FeatureImportance {
            feature: "River Danger Ratio",
            importance: weight_percent(DANGER_RATIO_WEIGHT),
            description: "How close river levels are to danger thresholds",
        },
        FeatureImportance {
            feature: "Rainfall Intensity",
            importance: weight_percent(RAINFALL_INTENSITY_WEIGHT),
            description: "Recent rainfall amounts relative to historical norms",
        },
        FeatureImportance {
            feature: "Rainfall Trend",
            importance: weight_percent(RAINFALL_TREND_WEIGHT),
            description: "Whether rainfall is increasing or decreasing",
        },
        FeatureImportance {
            feature: "River Level Trend",
            importance: weight_percent(RIVER_TREND_WEIGHT),
            description: "Direction and rate of river level changes",
        },
        FeatureImportance {
            feature: "Zone Vulnerability",
            importance: weight_percent(VULNERABILITY_WEIGHT),
            description: "Historical vulnerability and elevation factors",
        },
    ]
}
