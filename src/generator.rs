use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{RainfallObservation, RiverLevelObservation};
use crate::reference::{
    year_modifier, MONTHLY_RAINFALL_AVG, PEAK_MONTHLY_RAINFALL_MM, RIVER_GAUGES,
    STATION_MULTIPLIERS,
};
use crate::stats::round_to;

pub const DEFAULT_WINDOW_DAYS: u32 = 90;

const RAIN_DAY_THRESHOLD: f64 = 0.35;
const EXTREME_EVENT_THRESHOLD: f64 = 0.95;
const EXTREME_EVENT_MULTIPLIER: f64 = 3.5;

/// Fractional part of a scaled sine. Reproducible, not random.
pub fn seeded_random(seed: f64) -> f64 {
    let x = (seed * 9301.0 + 49297.0).sin() * 233280.0;
    x - x.floor()
}

pub fn is_monsoon_month(month0: usize) -> bool {
    (4..=8).contains(&month0)
}

pub fn within_window(date: NaiveDate, as_of: NaiveDate, days: i64) -> bool {
    date > as_of - Duration::days(days) && date <= as_of
}

pub fn generate_rainfall_series(as_of: NaiveDate, window_days: u32) -> Vec<RainfallObservation> {
    let year = as_of.year();
    let year_mod = year_modifier(year);
    let mut data = Vec::with_capacity((window_days as usize + 1) * STATION_MULTIPLIERS.len());

    for offset in (0..=i64::from(window_days)).rev() {
        let date = as_of - Duration::days(offset);
        let month = date.month0() as usize;
        let day_of_year = f64::from(date.ordinal());
        let daily_base = MONTHLY_RAINFALL_AVG[month] / 30.0;

        for (index, (station, station_mod)) in STATION_MULTIPLIERS.iter().enumerate() {
            let seed = day_of_year * 1000.0 + index as f64 * 100.0 + f64::from(year);
            let r1 = seeded_random(seed);
            let r2 = seeded_random(seed + 1.0);

            let mut rainfall = 0.0;
            if r1 > RAIN_DAY_THRESHOLD {
                rainfall = daily_base * station_mod * year_mod * (0.3 + r2 * 2.5);
            }
            if is_monsoon_month(month) && r1 > EXTREME_EVENT_THRESHOLD {
                rainfall *= EXTREME_EVENT_MULTIPLIER;
            }

            data.push(RainfallObservation {
                date,
                station: station.to_string(),
                rainfall_mm: round_to(rainfall.max(0.0), 1),
            });
        }
    }

    data
}

/// Daily river levels for every gauge, oldest first. Levels follow the
/// seasonal rainfall profile and stay within `[0.9 x base, 1.15 x danger]`.
pub fn generate_river_level_series(
    as_of: NaiveDate,
    window_days: u32,
) -> Vec<RiverLevelObservation> {
    let year = as_of.year();
    let year_mod = year_modifier(year);
    let mut data = Vec::with_capacity((window_days as usize + 1) * RIVER_GAUGES.len());

    for offset in (0..=i64::from(window_days)).rev() {
        let date = as_of - Duration::days(offset);
        let month = date.month0() as usize;
        let day_of_year = f64::from(date.ordinal());
        let seasonal_ratio = MONTHLY_RAINFALL_AVG[month] / PEAK_MONTHLY_RAINFALL_MM;

        for (index, gauge) in RIVER_GAUGES.iter().enumerate() {
            let seed = day_of_year * 100.0 + index as f64 * 10.0 + f64::from(year);
            let r = seeded_random(seed);

            let range = gauge.danger_level_m - gauge.base_level_m;
            let level = gauge.base_level_m + range * seasonal_ratio * year_mod * (0.7 + r * 0.5);
            let level = level.clamp(gauge.base_level_m * 0.9, gauge.danger_level_m * 1.15);

            data.push(RiverLevelObservation {
                date,
                river: gauge.river.to_string(),
                station: gauge.station.to_string(),
                level_m: round_to(level, 2),
                danger_level_m: gauge.danger_level_m,
            });
        }
    }

    data
}

pub trait ObservationSource {
    fn as_of(&self) -> NaiveDate;
    fn rainfall(&self) -> &[RainfallObservation];
    fn river_levels(&self) -> &[RiverLevelObservation];
    fn description(&self) -> &str;

    fn recent_rainfall(&self, days: i64) -> Vec<RainfallObservation> {
        let as_of = self.as_of();
        self.rainfall()
            .iter()
            .filter(|r| within_window(r.date, as_of, days))
            .cloned()
            .collect()
    }

    fn recent_river_levels(&self, days: i64) -> Vec<RiverLevelObservation> {
        let as_of = self.as_of();
        self.river_levels()
            .iter()
            .filter(|r| within_window(r.date, as_of, days))
            .cloned()
            .collect()
    }
}

/// Generated series, computed on first use and kept until `reset`.
#[derive(Debug)]
pub struct SyntheticObservations {
    as_of: NaiveDate,
    window_days: u32,
    rainfall: OnceLock<Vec<RainfallObservation>>,
    river_levels: OnceLock<Vec<RiverLevelObservation>>,
}

impl SyntheticObservations {
    pub fn new(as_of: NaiveDate, window_days: u32) -> Self {
        Self {
            as_of,
            window_days,
            rainfall: OnceLock::new(),
            river_levels: OnceLock::new(),
        }
    }

    pub fn today(window_days: u32) -> Self {
        Self::new(Utc::now().date_naive(), window_days)
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    pub fn is_cached(&self) -> bool {
        self.rainfall.get().is_some() || self.river_levels.get().is_some()
    }

    pub fn reset(&mut self) {
        self.rainfall = OnceLock::new();
        self.river_levels = OnceLock::new();
    }

    pub fn reseed(&mut self, as_of: NaiveDate) {
        self.as_of = as_of;
        self.reset();
    }
}

impl ObservationSource for SyntheticObservations {
    fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    fn rainfall(&self) -> &[RainfallObservation] {
        self.rainfall.get_or_init(|| {
            let data = generate_rainfall_series(self.as_of, self.window_days);
            debug!(as_of = %self.as_of, records = data.len(), "generated rainfall series");
            data
        })
    }

    fn river_levels(&self) -> &[RiverLevelObservation] {
        self.river_levels.get_or_init(|| {
            let data = generate_river_level_series(self.as_of, self.window_days);
            debug!(as_of = %self.as_of, records = data.len(), "generated river level series");
            data
        })
    }

    fn description(&self) -> &str {
        "Simulated Real-Time (based on Sylhet historical patterns)"
    }
}

#[derive(Debug, Clone)]
pub struct CsvObservations {
    as_of: NaiveDate,
    rainfall: Vec<RainfallObservation>,
    river_levels: Vec<RiverLevelObservation>,
}

impl CsvObservations {
    pub fn new(
        rainfall: Vec<RainfallObservation>,
        river_levels: Vec<RiverLevelObservation>,
        as_of: Option<NaiveDate>,
    ) -> Result<Self> {
        for record in &rainfall {
            if !record.rainfall_mm.is_finite() || record.rainfall_mm < 0.0 {
                return Err(Error::InvalidObservation(format!(
                    "rainfall at {} on {} must be non-negative, got {}",
                    record.station, record.date, record.rainfall_mm
                )));
            }
        }
        for record in &river_levels {
            if !record.danger_level_m.is_finite() || record.danger_level_m <= 0.0 {
                return Err(Error::InvalidObservation(format!(
                    "danger level at {} must be positive, got {}",
                    record.station, record.danger_level_m
                )));
            }
            if !record.level_m.is_finite() || record.level_m < 0.0 {
                return Err(Error::InvalidObservation(format!(
                    "river level at {} on {} must be non-negative, got {}",
                    record.station, record.date, record.level_m
                )));
            }
        }

        let as_of = as_of
            .or_else(|| {
                let dates: BTreeSet<NaiveDate> = rainfall
                    .iter()
                    .map(|r| r.date)
                    .chain(river_levels.iter().map(|r| r.date))
                    .collect();
                dates.last().copied()
            })
            .unwrap_or_else(|| Utc::now().date_naive());

        Ok(Self {
            as_of,
            rainfall,
            river_levels,
        })
    }

    pub fn from_readers<R: io::Read, S: io::Read>(
        rainfall: R,
        river_levels: S,
        as_of: Option<NaiveDate>,
    ) -> Result<Self> {
        let rainfall = csv::Reader::from_reader(rainfall)
            .deserialize::<RainfallObservation>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let river_levels = csv::Reader::from_reader(river_levels)
            .deserialize::<RiverLevelObservation>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Self::new(rainfall, river_levels, as_of)
    }

    pub fn from_paths(
        rainfall_path: &Path,
        river_path: &Path,
        as_of: Option<NaiveDate>,
    ) -> Result<Self> {
        let rainfall = std::fs::File::open(rainfall_path)?;
        let river_levels = std::fs::File::open(river_path)?;
        let observations = Self::from_readers(rainfall, river_levels, as_of)?;
        debug!(
            rainfall = observations.rainfall.len(),
            river_levels = observations.river_levels.len(),
            as_of = %observations.as_of,
            "loaded observations from csv"
        );
        Ok(observations)
    }
}

impl ObservationSource for CsvObservations {
    fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    fn rainfall(&self) -> &[RainfallObservation] {
        &self.rainfall
    }

    fn river_levels(&self) -> &[RiverLevelObservation] {
        &self.river_levels
    }

    fn description(&self) -> &str {
        "Gauge export (CSV)"
    }
}

pub fn write_rainfall_csv<W: io::Write>(writer: W, records: &[RainfallObservation]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_river_level_csv<W: io::Write>(
    writer: W,
    records: &[RiverLevelObservation],
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
