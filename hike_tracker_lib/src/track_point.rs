use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::error::SampleError;

/// One accepted fix from a location sensor. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    latitude: f64,
    longitude: f64,
    timestamp_ms: i64,
}

impl PositionSample {
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: i64) -> Result<Self, SampleError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(SampleError::Latitude(latitude));
        }

        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(SampleError::Longitude(longitude));
        }

        Ok(Self {
            latitude,
            longitude,
            timestamp_ms,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }

    pub fn same_coordinates(&self, other: &PositionSample) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }
}

// geo-types puts longitude on x
impl From<PositionSample> for Point {
    fn from(sample: PositionSample) -> Self {
        Point::new(sample.longitude, sample.latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(matches!(PositionSample::new(90.5, 0., 0), Err(SampleError::Latitude(_))));
        assert!(matches!(PositionSample::new(0., -180.1, 0), Err(SampleError::Longitude(_))));
        assert!(matches!(PositionSample::new(f64::NAN, 0., 0), Err(SampleError::Latitude(_))));
        assert!(PositionSample::new(-90., 180., 0).is_ok());
    }

    #[test]
    fn converts_to_point_with_longitude_as_x() {
        let sample = PositionSample::new(51.5007, -0.1246, 0).unwrap();
        let point: Point = sample.into();
        assert_eq!(point.x(), -0.1246);
        assert_eq!(point.y(), 51.5007);
    }
}
