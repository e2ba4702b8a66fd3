use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

pub const SEVERE_THRESHOLD: u8 = 75;
pub const WARNING_THRESHOLD: u8 = 50;
pub const WATCH_THRESHOLD: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vulnerability {
    Low,
    Medium,
    High,
}

impl Vulnerability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vulnerability::Low => "low",
            Vulnerability::Medium => "medium",
            Vulnerability::High => "high",
        }
    }

    pub fn base_points(&self) -> f64 {
        match self {
            Vulnerability::High => 10.0,
            Vulnerability::Medium => 5.0,
            Vulnerability::Low => 2.0,
        }
    }
}

impl fmt::Display for Vulnerability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub name_bn: String,
    pub district: String,
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
    pub elevation_m: f64,
    pub vulnerability: Vulnerability,
    pub population: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainfallObservation {
    pub date: NaiveDate,
    pub station: String,
    pub rainfall_mm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiverLevelObservation {
    pub date: NaiveDate,
    pub river: String,
    pub station: String,
    pub level_m: f64,
    pub danger_level_m: f64,
}

impl RiverLevelObservation {
    pub fn danger_ratio(&self) -> f64 {
        if self.danger_level_m > 0.0 {
            self.level_m / self.danger_level_m
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    Normal,
    Watch,
    Warning,
    Severe,
}

impl RiskCategory {
    /// The one place score thresholds are applied.
    pub fn from_score(score: u8) -> Self {
        if score >= SEVERE_THRESHOLD {
            RiskCategory::Severe
        } else if score >= WARNING_THRESHOLD {
            RiskCategory::Warning
        } else if score >= WATCH_THRESHOLD {
            RiskCategory::Watch
        } else {
            RiskCategory::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Normal => "Normal",
            RiskCategory::Watch => "Watch",
            RiskCategory::Warning => "Warning",
            RiskCategory::Severe => "Severe",
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, RiskCategory::Warning | RiskCategory::Severe)
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPrediction {
    pub zone_id: String,
    pub zone_name: String,
    pub risk_score: u8,
    pub risk_category: RiskCategory,
    pub explanation: String,
    pub rainfall_trend: f64,
    pub river_level_trend: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSummary {
    pub max_risk: u8,
    pub avg_risk: u8,
    pub severe_zones: usize,
    pub warning_zones: usize,
    pub watch_zones: usize,
    pub normal_zones: usize,
    pub total_zones: usize,
    pub last_updated: DateTime<Utc>,
    pub data_source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStatus {
    pub predictions: Vec<RiskPrediction>,
    pub summary: StatusSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub zone: String,
    pub message: String,
    pub risk_score: u8,
    pub category: RiskCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Pending,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "sent" => DeliveryStatus::Sent,
            "failed" => DeliveryStatus::Failed,
            _ => DeliveryStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SmsLogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub zone: String,
    pub risk_category: String,
    pub risk_score: i16,
    pub message_en: String,
    pub recipients: i32,
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub area: String,
    pub language: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscriber {
    pub name: String,
    pub phone: String,
    pub area: String,
    pub language: Option<String>,
}

impl NewSubscriber {
    pub const DEFAULT_LANGUAGE: &'static str = "bn";

    pub fn normalized(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        let phone: String = self
            .phone
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        let area = self.area.trim().to_string();

        if name.is_empty() {
            return Err(Error::InvalidSubscriber { field: "name" });
        }
        if phone.is_empty() {
            return Err(Error::InvalidSubscriber { field: "phone" });
        }
        if area.is_empty() {
            return Err(Error::InvalidSubscriber { field: "area" });
        }

        let language = self
            .language
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_LANGUAGE.to_string());

        Ok(Self {
            name,
            phone,
            area,
            language: Some(language),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_fixed_breakpoints() {
        assert_eq!(RiskCategory::from_score(82), RiskCategory::Severe);
        assert_eq!(RiskCategory::from_score(75), RiskCategory::Severe);
        assert_eq!(RiskCategory::from_score(74), RiskCategory::Warning);
        assert_eq!(RiskCategory::from_score(61), RiskCategory::Warning);
        assert_eq!(RiskCategory::from_score(50), RiskCategory::Warning);
        assert_eq!(RiskCategory::from_score(35), RiskCategory::Watch);
        assert_eq!(RiskCategory::from_score(30), RiskCategory::Watch);
        assert_eq!(RiskCategory::from_score(29), RiskCategory::Normal);
        assert_eq!(RiskCategory::from_score(10), RiskCategory::Normal);
        assert_eq!(RiskCategory::from_score(0), RiskCategory::Normal);
        assert_eq!(RiskCategory::from_score(100), RiskCategory::Severe);
    }

    #[test]
    fn danger_ratio_guards_zero_threshold() {
        let gauge = RiverLevelObservation {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            river: "Surma".to_string(),
            station: "Sunamganj".to_string(),
            level_m: 5.2,
            danger_level_m: 0.0,
        };
        assert_eq!(gauge.danger_ratio(), 0.0);

        let gauge = RiverLevelObservation {
            danger_level_m: 6.5,
            ..gauge
        };
        assert!((gauge.danger_ratio() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn subscriber_normalization_strips_phone_and_defaults_language() {
        let subscriber = NewSubscriber {
            name: "  Rahima Begum ".to_string(),
            phone: "+880 1711-234 567".to_string(),
            area: "Sunamganj".to_string(),
            language: None,
        }
        .normalized()
        .unwrap();

        assert_eq!(subscriber.name, "Rahima Begum");
        assert_eq!(subscriber.phone, "+8801711234567");
        assert_eq!(subscriber.language.as_deref(), Some("bn"));
    }

    #[test]
    fn subscriber_requires_phone() {
        let result = NewSubscriber {
            name: "Rahima Begum".to_string(),
            phone: " - ".to_string(),
            area: "Sunamganj".to_string(),
            language: Some("en".to_string()),
        }
        .normalized();

        assert!(matches!(
            result,
            Err(Error::InvalidSubscriber { field: "phone" })
        ));
    }
}
