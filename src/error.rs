use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid observation: {0}")]
    InvalidObservation(String),

    #[error("Invalid subscriber: {field} is required")]
    InvalidSubscriber { field: &'static str },

    #[error("Phone already registered: {phone}")]
    DuplicateSubscriber { phone: String },
}

pub type Result<T> = std::result::Result<T, Error>;
