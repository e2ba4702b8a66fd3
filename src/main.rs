use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sylhet_flood_early_warning::climate::{self, ClimateScenario};
use sylhet_flood_early_warning::config::Settings;
use sylhet_flood_early_warning::db;
use sylhet_flood_early_warning::explain::{self, ExplainableResult};
use sylhet_flood_early_warning::generator::{
    self, CsvObservations, ObservationSource, SyntheticObservations,
};
use sylhet_flood_early_warning::history;
use sylhet_flood_early_warning::models::{NewSubscriber, SystemStatus};
use sylhet_flood_early_warning::reference::{find_zone, sylhet_zones};
use sylhet_flood_early_warning::report;
use sylhet_flood_early_warning::risk;
use sylhet_flood_early_warning::stats::{self, ConfidenceInterval};

#[derive(Parser)]
#[command(name = "flood-early-warning")]
#[command(about = "Flood risk scoring and alerting for the Sylhet region", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every zone and summarize
    Status {
        #[arg(long)]
        json: bool,
        /// Persist predictions when any zone is at Warning or above
        #[arg(long)]
        log_history: bool,
        #[arg(long, requires = "river_csv")]
        rainfall_csv: Option<PathBuf>,
        #[arg(long, requires = "rainfall_csv")]
        river_csv: Option<PathBuf>,
    },
    /// List alerts at or above a threshold
    Alerts {
        #[arg(long)]
        threshold: Option<u8>,
        /// Record the alerts in the SMS log
        #[arg(long)]
        send: bool,
    },
    /// Break a zone's score down into feature contributions
    Explain {
        #[arg(long)]
        zone: String,
    },
    /// Show the model's global feature weights
    Importance,
    /// Project flood risk under a climate scenario
    #[command(group(
        ArgGroup::new("custom")
            .args(["rainfall", "extreme", "year"])
            .multiple(true)
    ))]
    Climate {
        /// optimistic, moderate or pessimistic
        #[arg(long, conflicts_with = "custom")]
        preset: Option<String>,
        /// Rainfall increase in percent
        #[arg(long)]
        rainfall: Option<f64>,
        /// Extreme event multiplier
        #[arg(long)]
        extreme: Option<f64>,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Compare the recorded model back-tests
    Models,
    /// Replay detection of historical floods
    Validate,
    /// Confidence interval over a sample
    Confidence {
        #[arg(long, num_args = 1.., value_delimiter = ',', required = true)]
        values: Vec<f64>,
        #[arg(long, default_value_t = stats::DEFAULT_CONFIDENCE_LEVEL)]
        level: f64,
    },
    /// Uncertainty bands over daily rainfall summed across stations
    Bands {
        #[arg(long, default_value_t = stats::DEFAULT_BAND_DAYS)]
        days: usize,
        #[arg(long, default_value_t = stats::DEFAULT_BAND_WINDOW)]
        window: usize,
    },
    /// Decade and long-term trends over the flood record
    History {
        #[arg(long, default_value_t = history::DEFAULT_FROM_YEAR)]
        from: i32,
        #[arg(long, default_value_t = history::DEFAULT_TO_YEAR)]
        to: i32,
        /// First year counted as recent in the trend comparison
        #[arg(long, default_value_t = history::DEFAULT_SPLIT_YEAR)]
        split_year: i32,
    },
    /// Write the current observation series as CSV
    Export {
        #[arg(long)]
        dir: PathBuf,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Create or upgrade the database schema
    InitDb,
    /// Register an SMS subscriber
    Subscribe {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        area: String,
        #[arg(long)]
        language: Option<String>,
    },
    /// List registered subscribers
    Subscribers,
    /// Show sent alerts, newest first
    SmsLog {
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    #[serde(flatten)]
    status: &'a SystemStatus,
    confidence: ConfidenceInterval,
    explanations: Vec<ExplainableResult>,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn connect(settings: &Settings) -> anyhow::Result<PgPool> {
    let database_url = settings
        .database_url()
        .context("database.url or DATABASE_URL must be set to a Postgres instance")?;

    db::connect(&database_url, settings.database.max_connections)
        .await
        .context("failed to connect to Postgres")
}

fn score_confidence(status: &SystemStatus) -> ConfidenceInterval {
    let scores: Vec<f64> = status
        .predictions
        .iter()
        .map(|p| f64::from(p.risk_score))
        .collect();
    stats::confidence_interval(&scores, stats::DEFAULT_CONFIDENCE_LEVEL)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new().context("failed to load configuration")?;
    init_tracing(&settings.logging.level);

    let zones = sylhet_zones();
    let window_days = settings.engine.observation_window_days;

    match cli.command {
        Commands::Status {
            json,
            log_history,
            rainfall_csv,
            river_csv,
        } => {
            let source: Box<dyn ObservationSource> = match (rainfall_csv, river_csv) {
                (Some(rainfall), Some(river)) => Box::new(
                    CsvObservations::from_paths(&rainfall, &river, None)
                        .context("failed to load gauge exports")?,
                ),
                _ => Box::new(SyntheticObservations::today(window_days)),
            };
            let status = risk::system_status(&zones, source.as_ref(), Utc::now());

            if log_history {
                let dedupe = Duration::minutes(settings.engine.history_dedupe_minutes);
                match connect(&settings).await {
                    Ok(pool) => {
                        if let Err(err) = db::log_predictions(&pool, &status.predictions, dedupe).await {
                            warn!(error = %err, "failed to log prediction history");
                        }
                    }
                    Err(err) => warn!(error = %err, "skipping prediction history"),
                }
            }

            let confidence = score_confidence(&status);
            if json {
                let output = StatusOutput {
                    status: &status,
                    confidence,
                    explanations: status
                        .predictions
                        .iter()
                        .map(|p| explain::explain_prediction(p, &zones))
                        .collect(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Ok(());
            }

            let summary = &status.summary;
            println!("Data source: {}", summary.data_source);
            println!(
                "Max risk {} / avg {} across {} zones ({} severe, {} warning, {} watch, {} normal)",
                summary.max_risk,
                summary.avg_risk,
                summary.total_zones,
                summary.severe_zones,
                summary.warning_zones,
                summary.watch_zones,
                summary.normal_zones
            );
            println!(
                "95% interval on zone scores: {:.2} to {:.2}",
                confidence.lower, confidence.upper
            );
            for prediction in status.predictions.iter() {
                println!(
                    "- {} [{}] score {}: {}",
                    prediction.zone_name,
                    prediction.risk_category,
                    prediction.risk_score,
                    prediction.explanation
                );
            }
        }
        Commands::Alerts { threshold, send } => {
            let source = SyntheticObservations::today(window_days);
            let predictions = risk::run_predictions(&zones, &source, Utc::now());
            let threshold = threshold.unwrap_or(settings.engine.alert_threshold);
            let alerts = risk::generate_alerts(&predictions, threshold);

            if alerts.is_empty() {
                println!("No zones at or above {threshold}.");
                return Ok(());
            }

            for alert in alerts.iter() {
                println!("{}", alert.message);
            }

            if send {
                match connect(&settings).await {
                    Ok(pool) => match db::record_alerts(&pool, &alerts).await {
                        Ok(entries) => {
                            let recipients: i32 = entries.iter().map(|e| e.recipients).sum();
                            println!("Logged {} alerts to {recipients} recipients.", entries.len());
                        }
                        Err(err) => warn!(error = %err, "failed to record alerts"),
                    },
                    Err(err) => warn!(error = %err, "alerts not recorded"),
                }
            }
        }
        Commands::Explain { zone } => {
            let target = find_zone(&zones, &zone)
                .with_context(|| format!("unknown zone id {zone}"))?;
            let source = SyntheticObservations::today(window_days);
            let prediction = risk::compute_zone_risk(
                target,
                source.rainfall(),
                source.river_levels(),
                source.as_of(),
                Utc::now(),
            );
            let result = explain::explain_prediction(&prediction, &zones);

            println!("{} ({}): {}", result.zone_name, result.zone_id, result.human_explanation);
            for feature in result.features.iter() {
                println!(
                    "- {} {}% [{:?}] {}: {}",
                    feature.feature,
                    feature.contribution,
                    feature.impact,
                    feature.value,
                    feature.description
                );
            }
        }
        Commands::Importance => {
            for feature in explain::global_feature_importance().iter() {
                println!("- {} {}%: {}", feature.feature, feature.importance, feature.description);
            }
        }
        Commands::Climate {
            preset,
            rainfall,
            extreme,
            year,
        } => {
            let scenario = match preset {
                Some(name) => {
                    climate::find_preset(&name)
                        .with_context(|| format!("unknown preset {name}"))?
                        .scenario
                }
                None => {
                    let base = ClimateScenario::default();
                    ClimateScenario {
                        rainfall_increase_pct: rainfall.unwrap_or(base.rainfall_increase_pct),
                        extreme_event_multiplier: extreme.unwrap_or(base.extreme_event_multiplier),
                        projection_year: year.unwrap_or(base.projection_year),
                    }
                }
            };
            let projection = climate::run_climate_projection(scenario);

            println!(
                "Scenario: +{}% rainfall, x{} extremes, {}",
                projection.scenario.rainfall_increase_pct,
                projection.scenario.extreme_event_multiplier,
                projection.scenario.projection_year
            );
            println!(
                "Risk {:.1} -> {:.1} ({:+}%)",
                projection.baseline_risk, projection.projected_risk, projection.risk_escalation_pct
            );
            println!(
                "Annual rainfall {} mm, floods per year {:.2} -> {:.2}",
                projection.projected_annual_rainfall,
                projection.baseline_flood_frequency,
                projection.projected_flood_frequency
            );
            println!(
                "Extreme event probability {:.2}, sea level impact {} mm",
                projection.extreme_event_probability, projection.sea_level_impact
            );
            for month in projection.monthly_projections.iter() {
                println!("- {}: {} -> {} mm", month.month, month.baseline, month.projected);
            }
        }
        Commands::Models => {
            let fixture = settings.evaluation_fixture()?;
            let comparison = fixture.compare_models();
            println!(
                "Back-test over {} events ({})",
                comparison.test_events, comparison.training_years
            );
            for model in comparison.models.iter() {
                println!(
                    "- {} ({}) accuracy {:.1}% f1 {:.2} rmse {:.1} r2 {:.2}",
                    model.name, model.short_name, model.accuracy, model.f1_score, model.rmse, model.r2
                );
            }
            if let Some(best) = comparison.best_model {
                println!("Best model: {best}");
            }
        }
        Commands::Validate => {
            let validation = settings.evaluation_fixture()?.validate_predictions();
            println!(
                "Detected {} of {} floods ({}%), missed {}, average lead time {} hours",
                validation.detected,
                validation.total,
                validation.accuracy_percent,
                validation.missed,
                validation.avg_lead_time_hours
            );
            for event in validation.events.iter() {
                println!(
                    "- {}: {} ({}h lead, actual {}, predicted {})",
                    event.event,
                    if event.predicted { "detected" } else { "missed" },
                    event.lead_time_hours,
                    event.actual_severity,
                    event.predicted_severity
                );
            }
        }
        Commands::Confidence { values, level } => {
            let interval = stats::confidence_interval(&values, level);
            println!("{}", serde_json::to_string_pretty(&interval)?);
        }
        Commands::Bands { days, window } => {
            let source = SyntheticObservations::today(window_days);
            let result = stats::rainfall_bands(source.rainfall(), days, window);

            if result.bands.is_empty() {
                println!("No rainfall recorded.");
                return Ok(());
            }

            let ci = &result.confidence;
            println!(
                "Mean daily rainfall {:.1} mm, 95% CI {:.1} - {:.1}, SE {:.2}, variance {:.1}",
                ci.mean, ci.lower, ci.upper, ci.standard_error, ci.variance
            );
            for band in result.bands.iter() {
                println!(
                    "{} {:.1} mm  80% [{:.2}, {:.2}]  95% [{:.2}, {:.2}]",
                    band.date, band.value, band.lower_80, band.upper_80, band.lower_95, band.upper_95
                );
            }
        }
        Commands::History {
            from,
            to,
            split_year,
        } => {
            let years = history::years_in_range(&history::recorded_years(), from, to);
            if years.is_empty() {
                println!("No recorded years between {from} and {to}.");
                return Ok(());
            }
            println!("## Decades");
            for decade in history::decade_analysis(&years).iter() {
                println!(
                    "- {}: avg rainfall {} mm, {} events, {} severe years, {} affected, {} deaths",
                    decade.decade,
                    decade.avg_rainfall,
                    decade.total_flood_events,
                    decade.severe_floods,
                    decade.total_affected,
                    decade.total_deaths
                );
            }
            let trend = history::historical_trend(&years, split_year);
            println!(
                "Since {}: rainfall {} mm vs {} mm ({:+}%), affected {} vs {} ({:+}%)",
                trend.split_year,
                trend.recent_avg_rainfall,
                trend.older_avg_rainfall,
                trend.rainfall_change_pct,
                trend.recent_avg_affected,
                trend.older_avg_affected,
                trend.affected_change_pct
            );
        }
        Commands::Export { dir } => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            let source = SyntheticObservations::today(window_days);
            let rainfall_path = dir.join("rainfall.csv");
            let river_path = dir.join("river_levels.csv");
            generator::write_rainfall_csv(std::fs::File::create(&rainfall_path)?, source.rainfall())?;
            generator::write_river_level_csv(
                std::fs::File::create(&river_path)?,
                source.river_levels(),
            )?;
            info!(as_of = %source.as_of(), dir = %dir.display(), "exported observations");
            println!(
                "Wrote {} and {}.",
                rainfall_path.display(),
                river_path.display()
            );
        }
        Commands::Report { out } => {
            let source = SyntheticObservations::today(window_days);
            let status = risk::system_status(&zones, &source, Utc::now());
            let confidence = score_confidence(&status);
            let validation = settings.evaluation_fixture()?.validate_predictions();
            let decades = history::decade_analysis(&history::recorded_years());
            let report = report::build_report(&status, &confidence, &validation, &decades);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::InitDb => {
            let pool = connect(&settings).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Subscribe {
            name,
            phone,
            area,
            language,
        } => {
            let pool = connect(&settings).await?;
            let subscriber = db::add_subscriber(
                &pool,
                NewSubscriber {
                    name,
                    phone,
                    area,
                    language,
                },
            )
            .await?;
            println!(
                "Subscribed {} ({}) to alerts for {}.",
                subscriber.name, subscriber.phone, subscriber.area
            );
        }
        Commands::Subscribers => {
            let pool = connect(&settings).await?;
            let subscribers = db::list_subscribers(&pool).await?;
            if subscribers.is_empty() {
                println!("No subscribers registered.");
                return Ok(());
            }
            for subscriber in subscribers.iter() {
                println!(
                    "- {} ({}) {} [{}]{}",
                    subscriber.name,
                    subscriber.phone,
                    subscriber.area,
                    subscriber.language,
                    if subscriber.active { "" } else { " inactive" }
                );
            }
        }
        Commands::SmsLog { limit, offset } => {
            let pool = connect(&settings).await?;
            let entries = db::recent_sms_logs(&pool, limit, offset).await?;
            if entries.is_empty() {
                println!("No alerts sent yet.");
                return Ok(());
            }
            for entry in entries.iter() {
                println!(
                    "- {} {} {} ({}) {} recipients [{}]",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.zone,
                    entry.risk_category,
                    entry.risk_score,
                    entry.recipients,
                    entry.status.as_str()
                );
            }
        }
    }

    Ok(())
}
