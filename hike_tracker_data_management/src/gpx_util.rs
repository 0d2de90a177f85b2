use std::{fs::File, io::{BufReader, BufWriter, Write}, path::Path, time::SystemTime};

use chrono::DateTime;
use geo_types::Point;
use gpx::{GpxVersion, Time, Track, TrackSegment, Waypoint};
use hike_tracker_lib::{track_point::PositionSample, trip::TripRecord};
use time::OffsetDateTime;

use crate::{DataManager, DataManagerError};

impl DataManager {
    pub async fn export_gpx(&self, hike_id: i64, path: &Path) -> Result<(), DataManagerError> {
        let hike = self.get_hike(hike_id).await?;

        // Create file at path
        let gpx_file = File::create(path)
            .map_err(|err| DataManagerError::Io(format!("Failed to create {:?}: {}", path, err)))?;

        write_gpx(&hike, BufWriter::new(gpx_file))
    }
}

pub fn write_gpx<W: Write>(hike: &TripRecord, writer: W) -> Result<(), DataManagerError> {
    let mut gpx = gpx::Gpx::default();
    gpx.version = GpxVersion::Gpx11;
    gpx.creator = Some("hike_tracker".into());

    let start_time: SystemTime = hike.start_time.into();
    let start_time: OffsetDateTime = start_time.into();
    gpx.metadata = Some(gpx::Metadata {
        name: Some(hike.title.clone()),
        description: Some(hike.description.clone()),
        time: Some(Time::from(start_time)),
        ..Default::default()
    });

    let mut track = Track::new();
    track.name = Some(hike.title.clone());
    let mut segment = TrackSegment::new();

    for sample in &hike.path {
        let mut wp = Waypoint::new(Point::from(*sample));
        if let Some(timestamp) = sample.timestamp() {
            let time: SystemTime = timestamp.into();
            let time: OffsetDateTime = time.into();
            wp.time = Some(Time::from(time));
        }
        segment.points.push(wp);
    }

    track.segments.push(segment);
    gpx.tracks.push(track);

    gpx::write(&gpx, writer).map_err(|err| DataManagerError::Gpx(format!("Failed to write gpx: {}", err)))
}

/// Every timed track point in file order. Points without a time or with
/// coordinates out of range are skipped.
pub fn read_gpx_samples(path: &Path) -> Result<Vec<PositionSample>, DataManagerError> {
    let file = File::open(path)
        .map_err(|err| DataManagerError::Io(format!("Failed to open {:?}: {}", path, err)))?;
    let gpx = gpx::read(BufReader::new(file))
        .map_err(|err| DataManagerError::Gpx(format!("Failed to read {:?}: {}", path, err)))?;

    let mut samples = Vec::new();
    let mut skipped = 0;
    for track in gpx.tracks {
        for segment in track.segments {
            for point in segment.points {
                let timestamp_ms = point.time
                    .and_then(|time| time.format().ok())
                    .and_then(|time| DateTime::parse_from_rfc3339(&time).ok())
                    .map(|time| time.timestamp_millis());

                let Some(timestamp_ms) = timestamp_ms else {
                    skipped += 1;
                    continue;
                };

                let position = point.point();
                match PositionSample::new(position.y(), position.x(), timestamp_ms) {
                    Ok(sample) => samples.push(sample),
                    Err(_) => skipped += 1,
                }
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} unusable points in {:?}", skipped, path);
    }

    Ok(samples)
}
