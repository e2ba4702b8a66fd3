use serde::{Deserialize, Serialize};

use crate::generator::is_monsoon_month;
use crate::models::RiskCategory;
use crate::reference::{ANNUAL_RAINFALL, HISTORICAL_FLOODS, MONTHLY_RAINFALL_DATA, MONTH_NAMES};
use crate::stats::{mean, round_to};

pub const BASE_YEAR: i32 = 2025;
const YEARLY_ESCALATION: f64 = 0.005;
const MONSOON_EXTREME_SHARE: f64 = 0.3;
const BASE_EXTREME_PROBABILITY: f64 = 0.05;
const MAX_EXTREME_PROBABILITY: f64 = 0.95;
const SEA_LEVEL_MM_PER_YEAR: f64 = 3.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateScenario {
    pub rainfall_increase_pct: f64,
    pub extreme_event_multiplier: f64,
    pub projection_year: i32,
}

impl ClimateScenario {
    pub const RAINFALL_INCREASE_RANGE: (f64, f64) = (0.0, 30.0);
    pub const EXTREME_MULTIPLIER_RANGE: (f64, f64) = (1.0, 3.0);
    pub const YEAR_RANGE: (i32, i32) = (BASE_YEAR, 2050);

    /// Pulls every parameter into its supported range. NaN inputs fall to
    /// the lower bound.
    pub fn clamped(self) -> Self {
        let clamp = |value: f64, (lo, hi): (f64, f64)| {
            if value.is_nan() {
                lo
            } else {
                value.clamp(lo, hi)
            }
        };
        Self {
            rainfall_increase_pct: clamp(self.rainfall_increase_pct, Self::RAINFALL_INCREASE_RANGE),
            extreme_event_multiplier: clamp(
                self.extreme_event_multiplier,
                Self::EXTREME_MULTIPLIER_RANGE,
            ),
            projection_year: self
                .projection_year
                .clamp(Self::YEAR_RANGE.0, Self::YEAR_RANGE.1),
        }
    }
}

impl Default for ClimateScenario {
    fn default() -> Self {
        PRESET_SCENARIOS[1].scenario
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PresetScenario {
    pub name: &'static str,
    pub description: &'static str,
    pub scenario: ClimateScenario,
}

pub const PRESET_SCENARIOS: [PresetScenario; 3] = [
    PresetScenario {
        name: "Optimistic (RCP 2.6)",
        description: "Strong emission cuts, limited warming",
        scenario: ClimateScenario {
            rainfall_increase_pct: 5.0,
            extreme_event_multiplier: 1.2,
            projection_year: 2035,
        },
    },
    PresetScenario {
        name: "Moderate (RCP 4.5)",
        description: "Some mitigation, moderate warming",
        scenario: ClimateScenario {
            rainfall_increase_pct: 12.0,
            extreme_event_multiplier: 1.5,
            projection_year: 2040,
        },
    },
    PresetScenario {
        name: "Pessimistic (RCP 8.5)",
        description: "Business as usual, severe warming",
        scenario: ClimateScenario {
            rainfall_increase_pct: 25.0,
            extreme_event_multiplier: 2.2,
            projection_year: 2050,
        },
    },
];

pub fn find_preset(name: &str) -> Option<&'static PresetScenario> {
    let wanted = name.trim().to_lowercase();
    PRESET_SCENARIOS.iter().find(|preset| {
        preset
            .name
            .split_whitespace()
            .next()
            .is_some_and(|word| word.to_lowercase() == wanted)
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineMetrics {
    pub avg_annual_rainfall: f64,
    pub floods_per_year: f64,
    pub monthly_avg: [f64; 12],
    pub baseline_risk: f64,
}

pub fn baseline_metrics() -> BaselineMetrics {
    let annual: Vec<f64> = ANNUAL_RAINFALL.iter().map(|(_, mm)| *mm).collect();
    let first_year = ANNUAL_RAINFALL.iter().map(|(y, _)| *y).min().unwrap_or(BASE_YEAR);
    let last_year = ANNUAL_RAINFALL.iter().map(|(y, _)| *y).max().unwrap_or(BASE_YEAR);
    let years_on_record = f64::from(last_year - first_year + 1);

    let mut monthly_avg = [0.0; 12];
    for (month, slot) in monthly_avg.iter_mut().enumerate() {
        let values: Vec<f64> = MONTHLY_RAINFALL_DATA
            .iter()
            .map(|(_, months)| months[month])
            .collect();
        *slot = mean(&values);
    }

    let severe = HISTORICAL_FLOODS
        .iter()
        .filter(|flood| flood.severity == RiskCategory::Severe)
        .count();
    let baseline_risk = if HISTORICAL_FLOODS.is_empty() {
        0.0
    } else {
        severe as f64 / HISTORICAL_FLOODS.len() as f64 * 100.0
    };

    BaselineMetrics {
        avg_annual_rainfall: mean(&annual),
        floods_per_year: HISTORICAL_FLOODS.len() as f64 / years_on_record,
        monthly_avg,
        baseline_risk,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyProjection {
    pub month: &'static str,
    pub baseline: i64,
    pub projected: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateProjection {
    pub scenario: ClimateScenario,
    pub baseline_risk: f64,
    pub projected_risk: f64,
    pub risk_escalation_pct: i64,
    pub projected_annual_rainfall: i64,
    pub projected_flood_frequency: f64,
    pub baseline_flood_frequency: f64,
    pub monthly_projections: Vec<MonthlyProjection>,
    pub extreme_event_probability: f64,
    pub sea_level_impact: i64,
}

pub fn run_climate_projection(scenario: ClimateScenario) -> ClimateProjection {
    project(&baseline_metrics(), scenario.clamped())
}

/// Projects the baseline under `scenario` exactly as given.
pub fn project(baseline: &BaselineMetrics, scenario: ClimateScenario) -> ClimateProjection {
    let years_ahead = (i64::from(scenario.projection_year) - i64::from(BASE_YEAR)).max(0) as f64;
    let year_factor = 1.0 + years_ahead * YEARLY_ESCALATION;
    let rainfall_multiplier = 1.0 + scenario.rainfall_increase_pct / 100.0;
    let extreme = scenario.extreme_event_multiplier;

    let projected_annual_rainfall =
        baseline.avg_annual_rainfall * rainfall_multiplier * year_factor;
    let projected_flood_frequency =
        baseline.floods_per_year * rainfall_multiplier * extreme * year_factor;
    let projected_risk =
        (baseline.baseline_risk * rainfall_multiplier * extreme * year_factor).min(100.0);
    let risk_escalation_pct = if baseline.baseline_risk > 0.0 {
        round_to(
            (projected_risk - baseline.baseline_risk) / baseline.baseline_risk * 100.0,
            0,
        ) as i64
    } else {
        0
    };

    let monthly_projections = baseline
        .monthly_avg
        .iter()
        .enumerate()
        .map(|(month, base)| {
            let month_multiplier = if is_monsoon_month(month) {
                rainfall_multiplier * (1.0 + (extreme - 1.0) * MONSOON_EXTREME_SHARE)
            } else {
                rainfall_multiplier
            };
            MonthlyProjection {
                month: MONTH_NAMES[month],
                baseline: round_to(*base, 0) as i64,
                projected: round_to(base * month_multiplier * year_factor, 0) as i64,
            }
        })
        .collect();

    let extreme_event_probability = (BASE_EXTREME_PROBABILITY
        * extreme
        * rainfall_multiplier
        * year_factor)
        .min(MAX_EXTREME_PROBABILITY);
    let sea_level_impact = round_to(
        years_ahead * SEA_LEVEL_MM_PER_YEAR * (scenario.rainfall_increase_pct / 10.0 + 1.0),
        0,
    ) as i64;

    ClimateProjection {
        scenario,
        baseline_risk: round_to(baseline.baseline_risk, 1),
        projected_risk: round_to(projected_risk, 1),
        risk_escalation_pct,
        projected_annual_rainfall: round_to(projected_annual_rainfall, 0) as i64,
        projected_flood_frequency: round_to(projected_flood_frequency, 1),
        baseline_flood_frequency: round_to(baseline.floods_per_year, 1),
        monthly_projections,
        extreme_event_probability: round_to(extreme_event_probability, 3),
        sea_level_impact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn baseline_follows_historical_record() {
        let baseline = baseline_metrics();
        assert!((baseline.avg_annual_rainfall - 47796.0 / 11.0).abs() < 1e-9);
        assert!((baseline.floods_per_year - 16.0 / 11.0).abs() < 1e-9);
        assert!((baseline.baseline_risk - 31.25).abs() < 1e-9);
        // June average across 2014-2024
        assert!((baseline.monthly_avg[5] - 9035.0 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn base_year_with_no_change_reproduces_baseline() {
        let projection = run_climate_projection(ClimateScenario {
            rainfall_increase_pct: 0.0,
            extreme_event_multiplier: 1.0,
            projection_year: 2025,
        });
        assert_eq!(projection.baseline_risk, 31.3);
        assert_eq!(projection.projected_risk, 31.3);
        assert_eq!(projection.risk_escalation_pct, 0);
        assert_eq!(projection.projected_annual_rainfall, 4345);
        assert_eq!(projection.baseline_flood_frequency, 1.5);
        assert_eq!(projection.extreme_event_probability, 0.05);
        assert_eq!(projection.sea_level_impact, 0);
        for month in &projection.monthly_projections {
            assert_eq!(month.baseline, month.projected);
        }
    }

    #[test]
    fn moderate_preset_projection() {
        let projection = run_climate_projection(PRESET_SCENARIOS[1].scenario);
        // year factor 1.075, rainfall x1.12, extremes x1.5
        assert_eq!(projection.projected_risk, 56.4);
        assert_eq!(projection.risk_escalation_pct, 81);
        assert_eq!(projection.projected_annual_rainfall, 5231);
        assert_eq!(projection.extreme_event_probability, 0.09);
        assert_eq!(projection.sea_level_impact, 106);
        assert_eq!(projection.monthly_projections.len(), 12);
        assert_eq!(projection.monthly_projections[0].month, "Jan");
    }

    #[test]
    fn monsoon_months_get_extra_amplification() {
        let projection = run_climate_projection(ClimateScenario {
            rainfall_increase_pct: 0.0,
            extreme_event_multiplier: 3.0,
            projection_year: 2025,
        });
        let april = &projection.monthly_projections[3];
        let june = &projection.monthly_projections[5];
        assert_eq!(april.baseline, april.projected);
        assert_eq!(june.projected, round_to(9035.0 / 11.0 * 1.6, 0) as i64);
    }

    #[test]
    fn out_of_range_scenarios_are_clamped() {
        let scenario = ClimateScenario {
            rainfall_increase_pct: 80.0,
            extreme_event_multiplier: 0.2,
            projection_year: 2100,
        }
        .clamped();
        assert_eq!(scenario.rainfall_increase_pct, 30.0);
        assert_eq!(scenario.extreme_event_multiplier, 1.0);
        assert_eq!(scenario.projection_year, 2050);

        let scenario = ClimateScenario {
            rainfall_increase_pct: f64::NAN,
            extreme_event_multiplier: 2.0,
            projection_year: 1990,
        }
        .clamped();
        assert_eq!(scenario.rainfall_increase_pct, 0.0);
        assert_eq!(scenario.projection_year, 2025);
    }

    #[test]
    fn worst_case_risk_caps_at_hundred() {
        let projection = run_climate_projection(ClimateScenario {
            rainfall_increase_pct: 30.0,
            extreme_event_multiplier: 3.0,
            projection_year: 2050,
        });
        assert_eq!(projection.projected_risk, 100.0);
        assert_eq!(projection.risk_escalation_pct, 220);
    }

    #[test]
    fn extreme_years_project_without_overflow() {
        let baseline = baseline_metrics();
        let past = project(
            &baseline,
            ClimateScenario {
                projection_year: i32::MIN,
                ..ClimateScenario::default()
            },
        );
        assert_eq!(past.sea_level_impact, 0);

        let far = project(
            &baseline,
            ClimateScenario {
                projection_year: i32::MAX,
                ..ClimateScenario::default()
            },
        );
        assert_eq!(far.projected_risk, 100.0);
        assert!(far.extreme_event_probability <= 0.95);
    }

    #[test]
    fn presets_are_found_by_first_word() {
        assert_eq!(find_preset("pessimistic").unwrap().scenario.projection_year, 2050);
        assert_eq!(find_preset("Optimistic").unwrap().scenario.rainfall_increase_pct, 5.0);
        assert!(find_preset("apocalyptic").is_none());
    }

    proptest! {
        #[test]
        fn projections_stay_bounded(
            rainfall in 0.0f64..=30.0,
            extreme in 1.0f64..=3.0,
            year in 2025i32..=2050,
        ) {
            let projection = run_climate_projection(ClimateScenario {
                rainfall_increase_pct: rainfall,
                extreme_event_multiplier: extreme,
                projection_year: year,
            });
            prop_assert!(projection.projected_risk <= 100.0);
            prop_assert!(projection.extreme_event_probability <= 0.95);
            prop_assert!(projection.projected_risk >= projection.baseline_risk - 0.1);
        }
    }
}
