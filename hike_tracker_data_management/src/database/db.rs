use std::path::Path;

use const_format::concatcp;
use hike_tracker_lib::trip::TripRecord;
use sqlx::{query_as, sqlite::SqliteConnectOptions, Executor, Pool, Sqlite, SqlitePool};

use crate::DataManagerError;

use super::constants::*;

#[derive(Clone)]
pub struct HikeDatabase {
    pool: Pool<Sqlite>,
}

impl HikeDatabase {
    pub async fn connect(path: &Path) -> Result<Self, DataManagerError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await
            .map_err(|err| DataManagerError::Database(format!("Failed to connect to database {:?}: {}", path, err)))?;

        let db = Self {
            pool
        };

        db.init().await?;

        Ok(db)
    }

    pub async fn init(&self) -> Result<(), DataManagerError> {
        self.pool.execute(concatcp!("
            CREATE TABLE IF NOT EXISTS ", HIKES_TABLE_NAME, "(",
                HIKE_ID,         " INTEGER PRIMARY KEY AUTOINCREMENT,",
                START_TIME,      " TIMESTAMP NOT NULL,",
                END_TIME,        " TIMESTAMP NOT NULL,",
                DISTANCE_KM,     " REAL NOT NULL,",
                ELAPSED_SECONDS, " INTEGER NOT NULL,",
                DURATION,        " TEXT NOT NULL,",
                TITLE,           " TEXT NOT NULL,",
                DESCRIPTION,     " TEXT NOT NULL,",
                DIFFICULTY,      " TEXT NOT NULL,",
                PHOTO_REF,       " TEXT,",
                PATH,            " BLOB NOT NULL
            )")).await
            .map_err(|err| DataManagerError::Database(format!("Failed to create tables: {}", err)))
            .map(|_| ())
    }

    pub async fn insert_hike(&self, record: &TripRecord) -> Result<i64, DataManagerError> {
        let path_blob = record.get_path_blob()
            .map_err(|err| DataManagerError::Encoding(format!("Failed to encode path: {}", err)))?;

        query_as::<_, (i64,)>(concatcp!("
            INSERT INTO ", HIKES_TABLE_NAME, "(",
            HIKE_ID, ", ", START_TIME, ", ", END_TIME, ", ", DISTANCE_KM, ", ", ELAPSED_SECONDS, ", ",
            DURATION, ", ", TITLE, ", ", DESCRIPTION, ", ", DIFFICULTY, ", ", PHOTO_REF, ", ", PATH, ")
            VALUES (NULL, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) RETURNING ", HIKE_ID))
                .bind(record.start_time)
                .bind(record.end_time)
                .bind(record.distance_km)
                .bind(record.elapsed_seconds as i64)
                .bind(&record.duration)
                .bind(&record.title)
                .bind(&record.description)
                .bind(record.difficulty.as_str())
                .bind(&record.photo_ref)
                .bind(path_blob)
                .fetch_one(&self.pool).await
                .map_err(|err| DataManagerError::Database(format!("Failed to insert hike: {}", err)))
                .map(|row| row.0)
    }

    pub async fn get_hike(&self, hike_id: i64) -> Result<TripRecord, DataManagerError> {
        query_as::<_, TripRecord>(concatcp!("SELECT * FROM ", HIKES_TABLE_NAME, " WHERE ", HIKE_ID, " = ?1"))
            .bind(hike_id)
            .fetch_one(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to get hike {}: {}", hike_id, err)))
    }

    /// Most recent first.
    pub async fn get_hikes(&self) -> Result<Vec<TripRecord>, DataManagerError> {
        query_as::<_, TripRecord>(concatcp!("SELECT * FROM ", HIKES_TABLE_NAME, " ORDER BY ", START_TIME, " DESC, ", HIKE_ID, " DESC"))
            .fetch_all(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to get hikes: {}", err)))
    }
}
