//! Offline evaluation results.
//!
//! Model metrics and historical detection outcomes are a recorded back-test
//! replayed from a fixture. They are not recomputed from the live risk
//! engine, so a change to the scoring model does not move these numbers.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::models::RiskCategory;
use crate::stats::round_to;

const BUILTIN_FIXTURE: &str = include_str!("../fixtures/evaluation.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfusionMatrix {
    pub true_positive: u32,
    pub false_positive: u32,
    pub true_negative: u32,
    pub false_negative: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetrics {
    pub name: String,
    pub short_name: String,
    pub accuracy: f64,
    pub rmse: f64,
    pub r2: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub description: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub confusion_matrix: ConfusionMatrix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalEventOutcome {
    pub event: String,
    pub predicted: bool,
    pub lead_time_hours: u32,
    pub actual_severity: RiskCategory,
    pub predicted_severity: RiskCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationFixture {
    pub test_events: u32,
    pub training_years: String,
    pub models: Vec<ModelMetrics>,
    pub historical_events: Vec<HistoricalEventOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelComparisonResult {
    pub models: Vec<ModelMetrics>,
    pub best_model: Option<String>,
    pub test_events: u32,
    pub training_years: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationData {
    pub events: Vec<HistoricalEventOutcome>,
    pub accuracy_percent: u32,
    pub detected: usize,
    pub missed: usize,
    pub total: usize,
    pub avg_lead_time_hours: u32,
}

impl EvaluationFixture {
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_FIXTURE)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let fixture = Self::from_json(&json)?;
        debug!(path = %path.display(), models = fixture.models.len(), "loaded evaluation fixture");
        Ok(fixture)
    }

    /// All models plus the one with the highest F1. Later models win ties.
    pub fn compare_models(&self) -> ModelComparisonResult {
        let best_model = self
            .models
            .iter()
            .reduce(|a, b| if a.f1_score > b.f1_score { a } else { b })
            .map(|best| best.name.clone());

        ModelComparisonResult {
            models: self.models.clone(),
            best_model,
            test_events: self.test_events,
            training_years: self.training_years.clone(),
        }
    }

    /// Detection rate and mean lead time over the recorded events. Lead
    /// time is averaged over detected events only.
    pub fn validate_predictions(&self) -> ValidationData {
        let total = self.historical_events.len();
        let detected_lead_times: Vec<f64> = self
            .historical_events
            .iter()
            .filter(|event| event.predicted)
            .map(|event| f64::from(event.lead_time_hours))
            .collect();
        let detected = detected_lead_times.len();

        let accuracy_percent = if total == 0 {
            0
        } else {
            round_to(detected as f64 / total as f64 * 100.0, 0) as u32
        };
        let avg_lead_time_hours = if detected == 0 {
            0
        } else {
            round_to(detected_lead_times.iter().sum::<f64>() / detected as f64, 0) as u32
        };

        ValidationData {
            events: self.historical_events.clone(),
            accuracy_percent,
            detected,
            missed: total - detected,
            total,
            avg_lead_time_hours,
        }
    }
}
