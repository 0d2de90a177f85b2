use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    error::FinalizeError,
    track_point::PositionSample,
    trip::{format_duration, round_to_hundredths, TripMetadata, TripRecord},
};

/// Frozen state of a session at the moment it was stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct StoppedSession {
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub path: Vec<PositionSample>,
    pub distance_km: f64,
    pub elapsed_seconds: u64,
}

/// Turns a stopped session plus form metadata into a trip record.
///
/// Only handed out by `TrackingSession::request_stop`, so the session it
/// wraps is always stopped. A failed validation can be retried; once a
/// record has been produced every later call fails.
#[derive(Debug)]
pub struct SessionFinalizer {
    session: StoppedSession,
    finalized: bool,
}

impl SessionFinalizer {
    pub(crate) fn new(session: StoppedSession) -> Self {
        Self {
            session,
            finalized: false,
        }
    }

    pub fn session(&self) -> &StoppedSession {
        &self.session
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn finalize(&mut self, metadata: TripMetadata) -> Result<TripRecord, FinalizeError> {
        if self.finalized {
            return Err(FinalizeError::AlreadyFinalized);
        }

        validate(&metadata)?;

        let TripMetadata {
            title,
            description,
            difficulty,
            photo_ref,
        } = metadata;

        let record = TripRecord {
            hike_id: None,
            start_time: self.session.started_at,
            end_time: self.session.stopped_at,
            distance_km: round_to_hundredths(self.session.distance_km),
            elapsed_seconds: self.session.elapsed_seconds,
            duration: format_duration(self.session.elapsed_seconds),
            path: self.session.path.clone(),
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            difficulty,
            photo_ref: photo_ref.filter(|photo| !photo.trim().is_empty()),
        };

        self.finalized = true;
        info!("Finalized hike '{}': {} km in {}", record.title, record.distance_km, record.duration);

        Ok(record)
    }
}

fn validate(metadata: &TripMetadata) -> Result<(), FinalizeError> {
    if metadata.title.trim().is_empty() {
        return Err(FinalizeError::Validation("title"));
    }

    if metadata.description.trim().is_empty() {
        return Err(FinalizeError::Validation("description"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::trip::Difficulty;

    fn stopped(distance_km: f64, elapsed_seconds: u64) -> SessionFinalizer {
        SessionFinalizer::new(StoppedSession {
            started_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
            stopped_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap(),
            path: vec![
                PositionSample::new(61.0, 8.0, 1_000).unwrap(),
                PositionSample::new(61.01, 8.0, 2_000).unwrap(),
            ],
            distance_km,
            elapsed_seconds,
        })
    }

    #[test]
    fn builds_the_record() {
        let mut finalizer = stopped(4.236_8, 3725);
        let metadata = TripMetadata::new("  Besseggen ", "Ridge hike")
            .with_difficulty(Difficulty::Hard)
            .with_photo_ref("photos/ridge.jpg");

        let record = finalizer.finalize(metadata).unwrap();

        assert_eq!(record.hike_id, None);
        assert_eq!(record.title, "Besseggen");
        assert_eq!(record.distance_km, 4.24);
        assert_eq!(record.duration, "01:02:05");
        assert_eq!(record.elapsed_seconds, 3725);
        assert_eq!(record.difficulty, Difficulty::Hard);
        assert_eq!(record.photo_ref.as_deref(), Some("photos/ridge.jpg"));
        assert_eq!(record.start_time, Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap());
        assert_eq!(record.end_time, Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap());
        assert_eq!(record.path.len(), 2);
    }

    #[test]
    fn empty_title_fails_even_with_valid_stats() {
        let mut finalizer = stopped(4.2, 3600);
        assert_eq!(finalizer.finalize(TripMetadata::new("", "desc")), Err(FinalizeError::Validation("title")));
        assert_eq!(finalizer.finalize(TripMetadata::new("   ", "desc")), Err(FinalizeError::Validation("title")));
        assert!(!finalizer.is_finalized());
    }

    #[test]
    fn empty_description_fails() {
        let mut finalizer = stopped(1., 60);
        assert_eq!(finalizer.finalize(TripMetadata::new("Title", "")), Err(FinalizeError::Validation("description")));
    }

    #[test]
    fn retry_after_validation_error_then_only_once() {
        let mut finalizer = stopped(1., 60);
        assert!(finalizer.finalize(TripMetadata::new("", "")).is_err());
        assert!(finalizer.finalize(TripMetadata::new("Loop", "Lake loop")).is_ok());
        assert!(finalizer.is_finalized());
        assert_eq!(finalizer.finalize(TripMetadata::new("Loop", "Lake loop")), Err(FinalizeError::AlreadyFinalized));
    }

    #[test]
    fn blank_photo_ref_is_dropped() {
        let mut finalizer = stopped(1., 60);
        let record = finalizer.finalize(TripMetadata::new("A", "B").with_photo_ref(" ")).unwrap();
        assert_eq!(record.photo_ref, None);
    }
}
