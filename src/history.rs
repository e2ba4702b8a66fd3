use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::RiskCategory;
use crate::reference::{HistoricalFlood, ANNUAL_RAINFALL, HISTORICAL_FLOODS};
use crate::stats::round_to;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyStats {
    pub year: i32,
    pub annual_rainfall_mm: f64,
    pub flood_events: usize,
    pub total_affected: u64,
    pub total_deaths: u32,
    pub max_severity: Option<RiskCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecadeSummary {
    pub decade: String,
    pub avg_rainfall: i64,
    pub total_affected: u64,
    pub total_deaths: u32,
    pub severe_floods: usize,
    pub total_flood_events: usize,
    pub years_covered: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalTrend {
    pub split_year: i32,
    pub recent_avg_rainfall: i64,
    pub older_avg_rainfall: i64,
    pub rainfall_change_pct: i64,
    pub recent_avg_affected: i64,
    pub older_avg_affected: i64,
    pub affected_change_pct: i64,
}

pub fn yearly_stats(annual_rainfall: &[(i32, f64)], floods: &[HistoricalFlood]) -> Vec<YearlyStats> {
    annual_rainfall
        .iter()
        .map(|&(year, annual_rainfall_mm)| {
            let events: Vec<&HistoricalFlood> = floods.iter().filter(|f| f.year == year).collect();
            YearlyStats {
                year,
                annual_rainfall_mm,
                flood_events: events.len(),
                total_affected: events.iter().map(|f| f.affected_people).sum(),
                total_deaths: events.iter().map(|f| f.deaths).sum(),
                max_severity: events.iter().map(|f| f.severity).max(),
            }
        })
        .collect()
}

pub fn decade_analysis(years: &[YearlyStats]) -> Vec<DecadeSummary> {
    let mut decades: BTreeMap<i32, Vec<&YearlyStats>> = BTreeMap::new();
    for stats in years {
        decades
            .entry(stats.year.div_euclid(10) * 10)
            .or_default()
            .push(stats);
    }

    decades
        .into_iter()
        .map(|(decade, years)| {
            let total_rainfall: f64 = years.iter().map(|y| y.annual_rainfall_mm).sum();
            DecadeSummary {
                decade: format!("{decade}s"),
                avg_rainfall: round_to(total_rainfall / years.len() as f64, 0) as i64,
                total_affected: years.iter().map(|y| y.total_affected).sum(),
                total_deaths: years.iter().map(|y| y.total_deaths).sum(),
                severe_floods: years
                    .iter()
                    .filter(|y| y.max_severity == Some(RiskCategory::Severe))
                    .count(),
                total_flood_events: years.iter().map(|y| y.flood_events).sum(),
                years_covered: years.len(),
            }
        })
        .collect()
}

fn average(values: &[f64]) -> i64 {
    if values.is_empty() {
        0
    } else {
        round_to(values.iter().sum::<f64>() / values.len() as f64, 0) as i64
    }
}

fn change_pct(recent: i64, older: i64) -> i64 {
    if older > 0 {
        round_to((recent - older) as f64 / older as f64 * 100.0, 0) as i64
    } else {
        0
    }
}

/// Compares years from `split_year` on against the years before it.
pub fn historical_trend(years: &[YearlyStats], split_year: i32) -> HistoricalTrend {
    let (recent, older): (Vec<&YearlyStats>, Vec<&YearlyStats>) =
        years.iter().partition(|y| y.year >= split_year);

    let rainfall = |set: &[&YearlyStats]| {
        average(&set.iter().map(|y| y.annual_rainfall_mm).collect::<Vec<_>>())
    };
    let affected = |set: &[&YearlyStats]| {
        average(&set.iter().map(|y| y.total_affected as f64).collect::<Vec<_>>())
    };

    let recent_avg_rainfall = rainfall(&recent);
    let older_avg_rainfall = rainfall(&older);
    let recent_avg_affected = affected(&recent);
    let older_avg_affected = affected(&older);

    HistoricalTrend {
        split_year,
        recent_avg_rainfall,
        older_avg_rainfall,
        rainfall_change_pct: change_pct(recent_avg_rainfall, older_avg_rainfall),
        recent_avg_affected,
        older_avg_affected,
        affected_change_pct: change_pct(recent_avg_affected, older_avg_affected),
    }
}

pub const DEFAULT_FROM_YEAR: i32 = 1974;
pub const DEFAULT_TO_YEAR: i32 = 2025;
pub const DEFAULT_SPLIT_YEAR: i32 = 2020;

pub fn years_in_range(years: &[YearlyStats], from: i32, to: i32) -> Vec<YearlyStats> {
    years
        .iter()
        .filter(|y| (from..=to).contains(&y.year))
        .cloned()
        .collect()
}

pub fn recorded_years() -> Vec<YearlyStats> {
    yearly_stats(&ANNUAL_RAINFALL, &HISTORICAL_FLOODS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yearly_stats_roll_up_events() {
        let years = recorded_years();
        assert_eq!(years.len(), 11);
        let y2022 = years.iter().find(|y| y.year == 2022).unwrap();
        assert_eq!(y2022.flood_events, 2);
        assert_eq!(y2022.total_affected, 9_200_000);
        assert_eq!(y2022.total_deaths, 53);
        assert_eq!(y2022.max_severity, Some(RiskCategory::Severe));

        let y2023 = years.iter().find(|y| y.year == 2023).unwrap();
        assert_eq!(y2023.flood_events, 0);
        assert_eq!(y2023.max_severity, None);
    }

    #[test]
    fn decades_group_by_year() {
        let decades = decade_analysis(&recorded_years());
        assert_eq!(decades.len(), 2);
        assert_eq!(decades[0].decade, "2010s");
        assert_eq!(decades[0].years_covered, 6);
        assert_eq!(decades[1].decade, "2020s");
        assert_eq!(decades[1].years_covered, 5);
        assert_eq!(
            decades.iter().map(|d| d.total_flood_events).sum::<usize>(),
            HISTORICAL_FLOODS.len()
        );
        // 2014 and 2017 in the 2010s; 2022 and 2024 in the 2020s
        assert_eq!(decades[0].severe_floods, 2);
        assert_eq!(decades[1].severe_floods, 2);
    }

    #[test]
    fn trend_compares_recent_against_older() {
        let trend = historical_trend(&recorded_years(), 2020);
        // 2020-2024: (4284 + 3948 + 5460 + 4074 + 4830) / 5
        assert_eq!(trend.recent_avg_rainfall, 4519);
        // 2014-2019: 25200 / 6
        assert_eq!(trend.older_avg_rainfall, 4200);
        assert_eq!(trend.rainfall_change_pct, 8);
    }

    #[test]
    fn range_filter_is_inclusive() {
        let years = recorded_years();
        let picked = years_in_range(&years, 2017, 2019);
        assert_eq!(
            picked.iter().map(|y| y.year).collect::<Vec<_>>(),
            vec![2017, 2018, 2019]
        );
        assert!(years_in_range(&years, 2020, 2010).is_empty());
        assert_eq!(
            years_in_range(&years, DEFAULT_FROM_YEAR, DEFAULT_TO_YEAR).len(),
            years.len()
        );

        let decades = decade_analysis(&years_in_range(&years, 2020, 2024));
        assert_eq!(decades.len(), 1);
        assert_eq!(decades[0].decade, "2020s");
    }

    #[test]
    fn trend_without_older_years_reports_no_change() {
        let trend = historical_trend(&recorded_years(), 2000);
        assert_eq!(trend.older_avg_rainfall, 0);
        assert_eq!(trend.rainfall_change_pct, 0);
    }
}
