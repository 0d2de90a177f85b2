use std::path::Path;

use async_trait::async_trait;
use hike_tracker_lib::trip::TripRecord;

use crate::{database::db::HikeDatabase, DataManagerError, Persistence, DATABASE_FILE};

#[derive(Clone)]
pub struct DataManager {
    pub(crate) database: HikeDatabase,
}

/// The public interface for all stored hikes.
impl DataManager {
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, DataManagerError> {
        // Create data dir if it doesn't exist
        let data_dir = data_dir.as_ref().to_path_buf();
        if !data_dir.exists() {
            tokio::fs::create_dir_all(&data_dir).await
                .map_err(|err| DataManagerError::Io(format!("Failed to create data directory {:?}: {}", data_dir, err)))?;
        }

        let database = HikeDatabase::connect(&data_dir.join(DATABASE_FILE)).await?;

        tracing::debug!("Opened hike storage in {:?}", data_dir);

        Ok(DataManager {
            database,
        })
    }

    pub async fn save_hike(&self, record: &TripRecord) -> Result<i64, DataManagerError> {
        let hike_id = self.database.insert_hike(record).await?;
        tracing::info!("Saved hike {} '{}'", hike_id, record.title);
        Ok(hike_id)
    }

    pub async fn get_hike(&self, hike_id: i64) -> Result<TripRecord, DataManagerError> {
        self.database.get_hike(hike_id).await
    }

    pub async fn get_hikes(&self) -> Result<Vec<TripRecord>, DataManagerError> {
        self.database.get_hikes().await
    }
}

#[async_trait]
impl Persistence for DataManager {
    async fn save(&self, record: &TripRecord) -> Result<i64, DataManagerError> {
        self.save_hike(record).await
    }
}
