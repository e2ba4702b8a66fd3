use std::fmt::Write;

use serde::Serialize;

use crate::evaluation::ValidationData;
use crate::history::DecadeSummary;
use crate::models::{RiskCategory, RiskPrediction, SystemStatus};
use crate::stats::ConfidenceInterval;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: RiskCategory,
    pub zones: usize,
    pub avg_score: f64,
}

pub fn category_mix(predictions: &[RiskPrediction]) -> Vec<CategoryCount> {
    let mut map: std::collections::BTreeMap<RiskCategory, (usize, u32)> =
        std::collections::BTreeMap::new();

    for prediction in predictions {
        let entry = map.entry(prediction.risk_category).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += u32::from(prediction.risk_score);
    }

    map.into_iter()
        .rev()
        .map(|(category, (zones, total_score))| CategoryCount {
            category,
            zones,
            avg_score: if zones == 0 {
                0.0
            } else {
                f64::from(total_score) / zones as f64
            },
        })
        .collect()
}

pub fn build_report(
    status: &SystemStatus,
    confidence: &ConfidenceInterval,
    validation: &ValidationData,
    decades: &[DecadeSummary],
) -> String {
    let summary = &status.summary;
    let mix = category_mix(&status.predictions);

    let mut output = String::new();

    let _ = writeln!(output, "# Sylhet Flood Early Warning Report");
    let _ = writeln!(
        output,
        "Generated {} from {}",
        summary.last_updated.format("%Y-%m-%d %H:%M UTC"),
        summary.data_source
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Summary");
    let _ = writeln!(
        output,
        "- Zones monitored: {} (max risk {}, average {})",
        summary.total_zones, summary.max_risk, summary.avg_risk
    );
    let _ = writeln!(
        output,
        "- {:.0}% interval on zone scores: {:.2} to {:.2} (mean {:.2}, n = {})",
        confidence.confidence_level * 100.0,
        confidence.lower,
        confidence.upper,
        confidence.mean,
        confidence.sample_size
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Category Mix");

    if mix.is_empty() {
        let _ = writeln!(output, "No zones scored.");
    } else {
        for count in mix.iter() {
            let _ = writeln!(
                output,
                "- {}: {} zones (avg score {:.1})",
                count.category, count.zones, count.avg_score
            );
        }
    }

    let mut ranked: Vec<&RiskPrediction> = status.predictions.iter().collect();
    ranked.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Zones");

    if ranked.is_empty() {
        let _ = writeln!(output, "No zones scored.");
    } else {
        for prediction in ranked.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}) score {}: {}",
                prediction.zone_name,
                prediction.risk_category,
                prediction.risk_score,
                prediction.explanation
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Historical Validation");
    let _ = writeln!(
        output,
        "- Detected {} of {} recorded floods ({}%), average lead time {} hours",
        validation.detected, validation.total, validation.accuracy_percent, validation.avg_lead_time_hours
    );
    for event in validation.events.iter().filter(|e| !e.predicted) {
        let _ = writeln!(output, "- Missed: {} ({})", event.event, event.actual_severity);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Decade Trends");

    if decades.is_empty() {
        let _ = writeln!(output, "No historical record available.");
    } else {
        for decade in decades.iter() {
            let _ = writeln!(
                output,
                "- {}: avg rainfall {} mm, {} flood events, {} severe years, {} people affected",
                decade.decade,
                decade.avg_rainfall,
                decade.total_flood_events,
                decade.severe_floods,
                decade.total_affected
            );
        }
    }

    output
}
