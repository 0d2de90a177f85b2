use std::path::PathBuf;

use async_trait::async_trait;
use hike_tracker_lib::trip::TripRecord;
use thiserror::Error;

pub mod database;
pub mod gpx_util;
mod data_manager;

pub use data_manager::*;

pub const DATA_DIR: &str = "data/";
pub const DATABASE_FILE: &str = "hikes.db";

#[derive(Debug, Error)]
pub enum DataManagerError {
    #[error("database: {0}")]
    Database(String),
    #[error("gpx: {0}")]
    Gpx(String),
    #[error("io: {0}")]
    Io(String),
    #[error("encoding: {0}")]
    Encoding(String),
}

/// Where finished hikes are handed off to.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Stores the record and returns its id.
    async fn save(&self, record: &TripRecord) -> Result<i64, DataManagerError>;
}

/// `data/` under the project root, or relative to the working directory
/// when there is no project root to be found.
pub fn default_data_dir() -> PathBuf {
    project_root::get_project_root()
        .map(|root| root.join(DATA_DIR))
        .unwrap_or_else(|_| PathBuf::from(DATA_DIR))
}
