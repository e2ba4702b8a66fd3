use serde::Serialize;

use crate::models::{RiskCategory, Vulnerability, Zone};

pub const PEAK_MONTHLY_RAINFALL_MM: f64 = 810.0;

pub const MONTHLY_RAINFALL_AVG: [f64; 12] = [
    12.0, 28.0, 85.0, 280.0, 450.0, 810.0, 780.0, 620.0, 440.0, 215.0, 45.0, 15.0,
];

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const STATION_MULTIPLIERS: [(&str, f64); 5] = [
    ("Sylhet", 1.0),
    ("Sunamganj", 0.85),
    ("Companiganj", 1.15),
    ("Kanaighat", 1.08),
    ("Moulvibazar", 0.78),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiverGauge {
    pub river: &'static str,
    pub station: &'static str,
    pub danger_level_m: f64,
    pub base_level_m: f64,
}

pub const RIVER_GAUGES: [RiverGauge; 5] = [
    RiverGauge {
        river: "Surma",
        station: "Sylhet (Kanairghat)",
        danger_level_m: 8.00,
        base_level_m: 3.80,
    },
    RiverGauge {
        river: "Surma",
        station: "Sunamganj",
        danger_level_m: 6.50,
        base_level_m: 3.20,
    },
    RiverGauge {
        river: "Kushiyara",
        station: "Sherpur",
        danger_level_m: 7.50,
        base_level_m: 3.50,
    },
    RiverGauge {
        river: "Kushiyara",
        station: "Fenchuganj",
        danger_level_m: 7.20,
        base_level_m: 3.30,
    },
    RiverGauge {
        river: "Manu",
        station: "Moulvibazar",
        danger_level_m: 8.50,
        base_level_m: 4.10,
    },
];

const YEAR_MODIFIERS: [(i32, f64); 13] = [
    (2014, 1.12),
    (2015, 0.82),
    (2016, 0.95),
    (2017, 1.18),
    (2018, 1.05),
    (2019, 0.88),
    (2020, 1.02),
    (2021, 0.94),
    (2022, 1.30),
    (2023, 0.97),
    (2024, 1.15),
    (2025, 1.0),
    (2026, 1.0),
];

/// Recorded deviation of a year's rainfall from the long-term average.
/// Years outside the record use 1.0.
pub fn year_modifier(year: i32) -> f64 {
    YEAR_MODIFIERS
        .iter()
        .find(|(y, _)| *y == year)
        .map(|(_, modifier)| *modifier)
        .unwrap_or(1.0)
}

pub const ANNUAL_RAINFALL: [(i32, f64); 11] = [
    (2014, 4704.0),
    (2015, 3444.0),
    (2016, 3990.0),
    (2017, 4956.0),
    (2018, 4410.0),
    (2019, 3696.0),
    (2020, 4284.0),
    (2021, 3948.0),
    (2022, 5460.0),
    (2023, 4074.0),
    (2024, 4830.0),
];

pub const MONTHLY_RAINFALL_DATA: [(i32, [f64; 12]); 11] = [
    (2014, [8.0, 22.0, 72.0, 245.0, 425.0, 890.0, 850.0, 720.0, 520.0, 230.0, 52.0, 18.0]),
    (2015, [5.0, 15.0, 48.0, 195.0, 340.0, 680.0, 620.0, 480.0, 350.0, 165.0, 30.0, 10.0]),
    (2016, [10.0, 25.0, 78.0, 260.0, 420.0, 750.0, 740.0, 580.0, 410.0, 195.0, 40.0, 14.0]),
    (2017, [15.0, 35.0, 120.0, 330.0, 510.0, 920.0, 890.0, 710.0, 480.0, 245.0, 55.0, 20.0]),
    (2018, [12.0, 30.0, 95.0, 295.0, 465.0, 845.0, 810.0, 650.0, 450.0, 220.0, 48.0, 16.0]),
    (2019, [6.0, 18.0, 55.0, 210.0, 360.0, 710.0, 680.0, 510.0, 370.0, 180.0, 35.0, 11.0]),
    (2020, [9.0, 24.0, 80.0, 270.0, 440.0, 790.0, 770.0, 610.0, 430.0, 210.0, 42.0, 15.0]),
    (2021, [8.0, 22.0, 70.0, 250.0, 410.0, 730.0, 720.0, 570.0, 400.0, 195.0, 38.0, 13.0]),
    (2022, [18.0, 42.0, 135.0, 385.0, 580.0, 1050.0, 1010.0, 810.0, 560.0, 280.0, 65.0, 24.0]),
    (2023, [9.0, 24.0, 75.0, 255.0, 425.0, 760.0, 740.0, 590.0, 415.0, 200.0, 40.0, 14.0]),
    (2024, [14.0, 32.0, 105.0, 315.0, 495.0, 910.0, 870.0, 695.0, 490.0, 240.0, 53.0, 19.0]),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnnualMaxRiverLevel {
    pub year: i32,
    pub surma_sylhet: f64,
    pub kushiyara_sherpur: f64,
    pub surma_sunamganj: f64,
}

const fn max_level(
    year: i32,
    surma_sylhet: f64,
    kushiyara_sherpur: f64,
    surma_sunamganj: f64,
) -> AnnualMaxRiverLevel {
    AnnualMaxRiverLevel {
        year,
        surma_sylhet,
        kushiyara_sherpur,
        surma_sunamganj,
    }
}

pub const ANNUAL_MAX_RIVER_LEVEL: [AnnualMaxRiverLevel; 11] = [
    max_level(2014, 9.95, 8.42, 7.65),
    max_level(2015, 8.22, 7.58, 6.78),
    max_level(2016, 8.55, 7.85, 6.95),
    max_level(2017, 10.32, 8.68, 7.82),
    max_level(2018, 8.82, 8.12, 7.15),
    max_level(2019, 8.15, 7.52, 6.72),
    max_level(2020, 8.72, 8.12, 7.08),
    max_level(2021, 8.45, 7.78, 6.88),
    max_level(2022, 10.68, 8.95, 8.12),
    max_level(2023, 8.35, 7.65, 6.82),
    max_level(2024, 10.24, 8.52, 7.55),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoricalFlood {
    pub year: i32,
    pub month: &'static str,
    pub start_date: &'static str,
    pub end_date: &'static str,
    pub severity: RiskCategory,
    pub max_rainfall_mm: f64,
    pub max_river_level_m: f64,
    pub river_above_danger_m: f64,
    pub affected_people: u64,
    pub deaths: u32,
    pub displaced: u64,
    pub crop_damage_hectares: u64,
    pub description: &'static str,
    pub source: &'static str,
}

pub const HISTORICAL_FLOODS: [HistoricalFlood; 16] = [
    HistoricalFlood {
        year: 2024,
        month: "August",
        start_date: "2024-08-19",
        end_date: "2024-09-05",
        severity: RiskCategory::Severe,
        max_rainfall_mm: 412.0,
        max_river_level_m: 10.24,
        river_above_danger_m: 2.24,
        affected_people: 4_500_000,
        deaths: 24,
        displaced: 1_800_000,
        crop_damage_hectares: 180_000,
        description: "Flash floods from heavy rainfall and upstream water from Meghalaya. Surma crossed danger level by 2.24m at Sylhet station.",
        source: "FFWC/ReliefWeb",
    },
    HistoricalFlood {
        year: 2024,
        month: "June",
        start_date: "2024-06-10",
        end_date: "2024-06-28",
        severity: RiskCategory::Severe,
        max_rainfall_mm: 385.0,
        max_river_level_m: 9.86,
        river_above_danger_m: 1.86,
        affected_people: 3_200_000,
        deaths: 16,
        displaced: 1_200_000,
        crop_damage_hectares: 142_000,
        description: "Early monsoon flooding submerged Sylhet city. Surma crossed danger level by 1.86m.",
        source: "FFWC/DDM",
    },
    HistoricalFlood {
        year: 2022,
        month: "June",
        start_date: "2022-06-12",
        end_date: "2022-07-10",
        severity: RiskCategory::Severe,
        max_rainfall_mm: 520.0,
        max_river_level_m: 10.68,
        river_above_danger_m: 2.68,
        affected_people: 7_200_000,
        deaths: 41,
        displaced: 3_500_000,
        crop_damage_hectares: 220_000,
        description: "Worst flood in 122 years. Sylhet airport submerged and most of Sunamganj underwater.",
        source: "FFWC/BDMD/ReliefWeb",
    },
    HistoricalFlood {
        year: 2022,
        month: "May",
        start_date: "2022-05-15",
        end_date: "2022-05-28",
        severity: RiskCategory::Warning,
        max_rainfall_mm: 340.0,
        max_river_level_m: 8.92,
        river_above_danger_m: 0.92,
        affected_people: 2_000_000,
        deaths: 12,
        displaced: 800_000,
        crop_damage_hectares: 95_000,
        description: "Pre-monsoon flash floods in the Haor areas destroyed the Boro rice crop.",
        source: "FFWC/FAO",
    },
    HistoricalFlood {
        year: 2021,
        month: "July",
        start_date: "2021-07-14",
        end_date: "2021-07-26",
        severity: RiskCategory::Warning,
        max_rainfall_mm: 295.0,
        max_river_level_m: 8.45,
        river_above_danger_m: 0.45,
        affected_people: 1_800_000,
        deaths: 8,
        displaced: 650_000,
        crop_damage_hectares: 72_000,
        description: "Monsoon flooding in the north-east. Surma crossed danger level at Sylhet.",
        source: "FFWC",
    },
    HistoricalFlood {
        year: 2020,
        month: "July",
        start_date: "2020-07-01",
        end_date: "2020-07-18",
        severity: RiskCategory::Warning,
        max_rainfall_mm: 310.0,
        max_river_level_m: 8.72,
        river_above_danger_m: 0.72,
        affected_people: 3_100_000,
        deaths: 15,
        displaced: 1_100_000,
        crop_damage_hectares: 115_000,
        description: "Several rivers crossed danger levels at the same time.",
        source: "FFWC/BWDB",
    },
    HistoricalFlood {
        year: 2019,
        month: "July",
        start_date: "2019-07-10",
        end_date: "2019-07-22",
        severity: RiskCategory::Watch,
        max_rainfall_mm: 245.0,
        max_river_level_m: 8.15,
        river_above_danger_m: 0.15,
        affected_people: 1_500_000,
        deaths: 5,
        displaced: 450_000,
        crop_damage_hectares: 48_000,
        description: "Moderate flooding in low-lying areas of Sunamganj and Sylhet Sadar.",
        source: "FFWC",
    },
    HistoricalFlood {
        year: 2019,
        month: "April",
        start_date: "2019-04-08",
        end_date: "2019-04-16",
        severity: RiskCategory::Watch,
        max_rainfall_mm: 220.0,
        max_river_level_m: 7.65,
        river_above_danger_m: 0.0,
        affected_people: 620_000,
        deaths: 2,
        displaced: 180_000,
        crop_damage_hectares: 35_000,
        description: "Pre-monsoon flash floods in the Haor region damaged Boro rice.",
        source: "BWDB",
    },
    HistoricalFlood {
        year: 2018,
        month: "July",
        start_date: "2018-07-08",
        end_date: "2018-07-24",
        severity: RiskCategory::Warning,
        max_rainfall_mm: 335.0,
        max_river_level_m: 8.82,
        river_above_danger_m: 0.82,
        affected_people: 2_800_000,
        deaths: 11,
        displaced: 950_000,
        crop_damage_hectares: 105_000,
        description: "Heavy monsoon rainfall submerged the Sylhet-Dhaka highway.",
        source: "FFWC/DDM",
    },
    HistoricalFlood {
        year: 2018,
        month: "April",
        start_date: "2018-04-12",
        end_date: "2018-04-22",
        severity: RiskCategory::Watch,
        max_rainfall_mm: 210.0,
        max_river_level_m: 7.52,
        river_above_danger_m: 0.0,
        affected_people: 550_000,
        deaths: 3,
        displaced: 150_000,
        crop_damage_hectares: 42_000,
        description: "Flash floods in Sylhet haor areas after sudden rain over the Meghalaya hills.",
        source: "BWDB",
    },
    HistoricalFlood {
        year: 2017,
        month: "August",
        start_date: "2017-08-10",
        end_date: "2017-09-02",
        severity: RiskCategory::Severe,
        max_rainfall_mm: 465.0,
        max_river_level_m: 10.32,
        river_above_danger_m: 2.32,
        affected_people: 6_900_000,
        deaths: 37,
        displaced: 2_800_000,
        crop_damage_hectares: 195_000,
        description: "Catastrophic floods across the division with Surma and Kushiyara at record levels.",
        source: "FFWC/BDMD",
    },
    HistoricalFlood {
        year: 2017,
        month: "March",
        start_date: "2017-03-28",
        end_date: "2017-04-10",
        severity: RiskCategory::Warning,
        max_rainfall_mm: 280.0,
        max_river_level_m: 8.28,
        river_above_danger_m: 0.28,
        affected_people: 850_000,
        deaths: 6,
        displaced: 320_000,
        crop_damage_hectares: 86_000,
        description: "Unusual pre-monsoon flash floods in the Haor region.",
        source: "BWDB/FAO",
    },
    HistoricalFlood {
        year: 2016,
        month: "July",
        start_date: "2016-07-20",
        end_date: "2016-08-05",
        severity: RiskCategory::Warning,
        max_rainfall_mm: 305.0,
        max_river_level_m: 8.55,
        river_above_danger_m: 0.55,
        affected_people: 2_200_000,
        deaths: 9,
        displaced: 780_000,
        crop_damage_hectares: 88_000,
        description: "Sustained heavy rainfall kept Surma above danger level for 12 days.",
        source: "FFWC",
    },
    HistoricalFlood {
        year: 2015,
        month: "June",
        start_date: "2015-06-25",
        end_date: "2015-07-08",
        severity: RiskCategory::Watch,
        max_rainfall_mm: 255.0,
        max_river_level_m: 8.22,
        river_above_danger_m: 0.22,
        affected_people: 1_400_000,
        deaths: 4,
        displaced: 420_000,
        crop_damage_hectares: 52_000,
        description: "Moderate monsoon flooding. Kushiyara crossed danger level at Sherpur.",
        source: "FFWC",
    },
    HistoricalFlood {
        year: 2014,
        month: "September",
        start_date: "2014-09-01",
        end_date: "2014-09-18",
        severity: RiskCategory::Severe,
        max_rainfall_mm: 395.0,
        max_river_level_m: 9.95,
        river_above_danger_m: 1.95,
        affected_people: 5_200_000,
        deaths: 28,
        displaced: 2_100_000,
        crop_damage_hectares: 165_000,
        description: "Late monsoon flooding kept all major rivers above danger level for 15+ days.",
        source: "FFWC/BDMD",
    },
    HistoricalFlood {
        year: 2014,
        month: "August",
        start_date: "2014-08-15",
        end_date: "2014-08-28",
        severity: RiskCategory::Warning,
        max_rainfall_mm: 320.0,
        max_river_level_m: 8.68,
        river_above_danger_m: 0.68,
        affected_people: 2_600_000,
        deaths: 10,
        displaced: 880_000,
        crop_damage_hectares: 92_000,
        description: "Rivers rose steadily ahead of the September flood.",
        source: "FFWC",
    },
];

#[allow(clippy::type_complexity)]
const ZONES: [(&str, &str, &str, f64, f64, f64, f64, Vulnerability, u64, &str); 15] = [
    ("z1", "Sylhet Sadar", "সিলেট সদর", 24.8949, 91.8687, 5.0, 15.0, Vulnerability::High, 531_663, "Sylhet"),
    ("z2", "Sunamganj", "সুনামগঞ্জ", 25.0658, 91.3950, 8.0, 8.0, Vulnerability::High, 264_238, "Sunamganj"),
    ("z3", "Companiganj", "কোম্পানীগঞ্জ", 25.0450, 91.7430, 4.0, 10.0, Vulnerability::High, 281_420, "Sylhet"),
    ("z4", "Gowainghat", "গোয়াইনঘাট", 25.1880, 91.9130, 5.0, 20.0, Vulnerability::Medium, 329_365, "Sylhet"),
    ("z5", "Jaintiapur", "জৈন্তাপুর", 25.1330, 92.0670, 4.0, 25.0, Vulnerability::Medium, 191_410, "Sylhet"),
    ("z6", "Kanaighat", "কানাইঘাট", 25.0130, 92.2410, 4.0, 12.0, Vulnerability::High, 290_457, "Sylhet"),
    ("z7", "Zakiganj", "জকিগঞ্জ", 24.7550, 92.1690, 4.0, 11.0, Vulnerability::High, 309_965, "Sylhet"),
    ("z8", "Beanibazar", "বিয়ানীবাজার", 24.7980, 92.1690, 4.0, 14.0, Vulnerability::Medium, 337_437, "Sylhet"),
    ("z9", "Bishwanath", "বিশ্বনাথ", 24.8310, 91.7070, 4.0, 13.0, Vulnerability::Medium, 321_180, "Sylhet"),
    ("z10", "Fenchuganj", "ফেঞ্চুগঞ্জ", 24.7150, 91.9580, 3.0, 9.0, Vulnerability::High, 160_880, "Sylhet"),
    ("z11", "Balaganj", "বালাগঞ্জ", 24.7060, 91.7510, 4.0, 10.0, Vulnerability::High, 399_840, "Sylhet"),
    ("z12", "Osmani Nagar", "ওসমানী নগর", 24.7600, 91.8750, 3.0, 12.0, Vulnerability::Medium, 252_340, "Sylhet"),
    ("z13", "South Surma", "দক্ষিণ সুরমা", 24.8500, 91.8900, 4.0, 11.0, Vulnerability::High, 310_220, "Sylhet"),
    ("z14", "Habiganj Sadar", "হবিগঞ্জ সদর", 24.3750, 91.4170, 5.0, 14.0, Vulnerability::Medium, 355_680, "Habiganj"),
    ("z15", "Moulvibazar Sadar", "মৌলভীবাজার সদর", 24.4820, 91.7720, 4.0, 18.0, Vulnerability::Medium, 245_370, "Moulvibazar"),
];

pub fn sylhet_zones() -> Vec<Zone> {
    ZONES
        .iter()
        .map(
            |&(id, name, name_bn, lat, lng, radius_km, elevation_m, vulnerability, population, district)| Zone {
                id: id.to_string(),
                name: name.to_string(),
                name_bn: name_bn.to_string(),
                district: district.to_string(),
                lat,
                lng,
                radius_km,
                elevation_m,
                vulnerability,
                population,
            },
        )
        .collect()
}

pub fn find_zone<'a>(zones: &'a [Zone], id: &str) -> Option<&'a Zone> {
    zones.iter().find(|zone| zone.id == id)
}
