use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    Alert, DeliveryStatus, NewSubscriber, RiskPrediction, SmsLogEntry, Subscriber,
};

pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub fn should_log_history(predictions: &[RiskPrediction]) -> bool {
    predictions.iter().any(|p| p.risk_category.is_critical())
}

/// Writes every prediction to the history table unless nothing is critical
/// or a batch was already written within `dedupe_window`. Returns the number
/// of rows written.
pub async fn log_predictions(
    pool: &PgPool,
    predictions: &[RiskPrediction],
    dedupe_window: Duration,
) -> Result<usize> {
    if !should_log_history(predictions) {
        debug!("no critical zones, skipping history log");
        return Ok(0);
    }

    let since: DateTime<Utc> = Utc::now() - dedupe_window;
    let recent = sqlx::query(
        "SELECT id FROM flood_early_warning.predictions_history WHERE created_at >= $1 LIMIT 1",
    )
    .bind(since)
    .fetch_optional(pool)
    .await?;

    if recent.is_some() {
        debug!(%since, "history already logged inside dedupe window");
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    for prediction in predictions {
        sqlx::query(
            r#"
            INSERT INTO flood_early_warning.predictions_history
            (id, zone_id, zone_name, risk_score, risk_category, explanation,
             rainfall_trend, river_level_trend)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&prediction.zone_id)
        .bind(&prediction.zone_name)
        .bind(i16::from(prediction.risk_score))
        .bind(prediction.risk_category.as_str())
        .bind(&prediction.explanation)
        .bind(prediction.rainfall_trend)
        .bind(prediction.river_level_trend)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(rows = predictions.len(), "logged prediction history");
    Ok(predictions.len())
}

/// Records each alert as sent to the active subscribers of its zone. The
/// batch is written in one transaction.
pub async fn record_alerts(pool: &PgPool, alerts: &[Alert]) -> Result<Vec<SmsLogEntry>> {
    let mut tx = pool.begin().await?;
    let mut written = Vec::with_capacity(alerts.len());

    for alert in alerts {
        let recipients: i64 = sqlx::query(
            "SELECT COUNT(*) AS recipients FROM flood_early_warning.subscribers \
             WHERE active AND area = $1",
        )
        .bind(&alert.zone)
        .fetch_one(&mut *tx)
        .await?
        .get("recipients");
        let recipients = i32::try_from(recipients).unwrap_or(i32::MAX);

        let row = sqlx::query(
            r#"
            INSERT INTO flood_early_warning.sms_logs
            (id, zone, risk_category, risk_score, message_en, recipients, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&alert.zone)
        .bind(alert.category.as_str())
        .bind(i16::from(alert.risk_score))
        .bind(&alert.message)
        .bind(recipients)
        .bind(DeliveryStatus::Sent.as_str())
        .fetch_one(&mut *tx)
        .await?;

        written.push((row.get::<Uuid, _>("id"), row.get::<DateTime<Utc>, _>("created_at"), recipients));
    }
    tx.commit().await?;

    let entries: Vec<SmsLogEntry> = alerts
        .iter()
        .zip(written)
        .map(|(alert, (id, timestamp, recipients))| sms_entry(alert, id, timestamp, recipients))
        .collect();

    info!(alerts = entries.len(), "recorded sms alerts");
    Ok(entries)
}

fn sms_entry(alert: &Alert, id: Uuid, timestamp: DateTime<Utc>, recipients: i32) -> SmsLogEntry {
    SmsLogEntry {
        id,
        timestamp,
        zone: alert.zone.clone(),
        risk_category: alert.category.as_str().to_string(),
        risk_score: i16::from(alert.risk_score),
        message_en: alert.message.clone(),
        recipients,
        status: DeliveryStatus::Sent,
    }
}

pub async fn recent_sms_logs(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<SmsLogEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT id, created_at, zone, risk_category, risk_score, message_en, recipients, status
        FROM flood_early_warning.sms_logs
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let status: String = row.get("status");
        entries.push(SmsLogEntry {
            id: row.get("id"),
            timestamp: row.get("created_at"),
            zone: row.get("zone"),
            risk_category: row.get("risk_category"),
            risk_score: row.get("risk_score"),
            message_en: row.get("message_en"),
            recipients: row.get("recipients"),
            status: DeliveryStatus::parse(&status),
        });
    }

    Ok(entries)
}

pub async fn add_subscriber(pool: &PgPool, subscriber: NewSubscriber) -> Result<Subscriber> {
    let subscriber = subscriber.normalized()?;

    let existing = sqlx::query("SELECT id FROM flood_early_warning.subscribers WHERE phone = $1")
        .bind(&subscriber.phone)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Err(Error::DuplicateSubscriber {
            phone: subscriber.phone,
        });
    }

    let row = sqlx::query(
        r#"
        INSERT INTO flood_early_warning.subscribers (id, name, phone, area, language, active)
        VALUES ($1, $2, $3, $4, $5, TRUE)
        RETURNING id, name, phone, area, language, active, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&subscriber.name)
    .bind(&subscriber.phone)
    .bind(&subscriber.area)
    .bind(subscriber.language.as_deref().unwrap_or(NewSubscriber::DEFAULT_LANGUAGE))
    .fetch_one(pool)
    .await
    .map_err(|err| subscriber_insert_error(err, &subscriber.phone))?;

    Ok(subscriber_from_row(&row))
}

const UNIQUE_VIOLATION: &str = "23505";

// A concurrent registration can pass the lookup and still hit the unique index.
fn subscriber_insert_error(err: sqlx::Error, phone: &str) -> Error {
    let code = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned());

    if code.as_deref() == Some(UNIQUE_VIOLATION) {
        Error::DuplicateSubscriber {
            phone: phone.to_string(),
        }
    } else {
        Error::Database(err)
    }
}

pub async fn list_subscribers(pool: &PgPool) -> Result<Vec<Subscriber>> {
    let rows = sqlx::query(
        "SELECT id, name, phone, area, language, active, created_at \
         FROM flood_early_warning.subscribers ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(subscriber_from_row).collect())
}

fn subscriber_from_row(row: &sqlx::postgres::PgRow) -> Subscriber {
    Subscriber {
        id: row.get("id"),
        name: row.get("name"),
        phone: row.get("phone"),
        area: row.get("area"),
        language: row.get("language"),
        active: row.get("active"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskCategory;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::fmt;

    #[derive(Debug)]
    struct PgError {
        code: &'static str,
    }

    impl fmt::Display for PgError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "postgres error {}", self.code)
        }
    }

    impl std::error::Error for PgError {}

    impl DatabaseError for PgError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    fn prediction(risk_score: u8) -> RiskPrediction {
        RiskPrediction {
            zone_id: "z1".to_string(),
            zone_name: "Sylhet Sadar".to_string(),
            risk_score,
            risk_category: RiskCategory::from_score(risk_score),
            explanation: "No significant risk factors detected".to_string(),
            rainfall_trend: 0.0,
            river_level_trend: 0.0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn history_is_logged_only_for_critical_zones() {
        assert!(!should_log_history(&[]));
        assert!(!should_log_history(&[prediction(10), prediction(45)]));
        assert!(should_log_history(&[prediction(10), prediction(50)]));
        assert!(should_log_history(&[prediction(90)]));
    }

    #[test]
    fn unique_violation_on_insert_is_a_duplicate_subscriber() {
        let err = sqlx::Error::Database(Box::new(PgError { code: "23505" }));
        match subscriber_insert_error(err, "01711000000") {
            Error::DuplicateSubscriber { phone } => assert_eq!(phone, "01711000000"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn other_insert_failures_stay_database_errors() {
        let err = sqlx::Error::Database(Box::new(PgError { code: "23502" }));
        assert!(matches!(
            subscriber_insert_error(err, "01711000000"),
            Error::Database(_)
        ));
        assert!(matches!(
            subscriber_insert_error(sqlx::Error::RowNotFound, "01711000000"),
            Error::Database(_)
        ));
    }

    #[test]
    fn sms_entries_carry_the_alert() {
        let alert = Alert {
            zone: "Companiganj".to_string(),
            message: "[Meghdoot Alert] Flood risk SEVERE".to_string(),
            risk_score: 81,
            category: RiskCategory::Severe,
        };
        let timestamp = Utc::now();
        let id = Uuid::new_v4();
        let entry = sms_entry(&alert, id, timestamp, 12);

        assert_eq!(entry.id, id);
        assert_eq!(entry.zone, "Companiganj");
        assert_eq!(entry.risk_category, "Severe");
        assert_eq!(entry.risk_score, 81);
        assert_eq!(entry.recipients, 12);
        assert_eq!(entry.status, DeliveryStatus::Sent);
    }
}
