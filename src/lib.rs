pub mod climate;
pub mod config;
pub mod db;
pub mod error;
pub mod evaluation;
pub mod explain;
pub mod generator;
pub mod history;
pub mod models;
pub mod reference;
pub mod report;
pub mod risk;
pub mod stats;
pub mod trend;

pub use error::{Error, Result};
