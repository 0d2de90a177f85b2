use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "sqlx")]
use sqlx::{prelude::*, sqlite::SqliteRow};

use crate::track_point::PositionSample;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("Unknown difficulty: {other}")),
        }
    }
}

/// What the post-hike form collects.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripMetadata {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub photo_ref: Option<String>,
}

impl TripMetadata {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_photo_ref(mut self, photo_ref: impl Into<String>) -> Self {
        self.photo_ref = Some(photo_ref.into());
        self
    }
}

/// A finished hike. Built once by the finalizer and never changed after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    /// Assigned by storage, `None` until saved.
    pub hike_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Rounded to two decimals.
    pub distance_km: f64,
    pub elapsed_seconds: u64,
    /// `HH:MM:SS`
    pub duration: String,
    pub path: Vec<PositionSample>,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub photo_ref: Option<String>,
}

impl TripRecord {
    pub fn average_speed_kmh(&self) -> f64 {
        average_speed_kmh(self.distance_km, self.elapsed_seconds)
    }

    pub fn with_id(mut self, hike_id: i64) -> Self {
        self.hike_id = Some(hike_id);
        self
    }

    pub fn get_path_blob(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(&self.path)
    }
}

#[cfg(feature = "sqlx")]
impl FromRow<'_, SqliteRow> for TripRecord {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let path_blob: Vec<u8> = row.try_get(10)?;
        let path = if path_blob.is_empty() {
            Vec::new()
        } else {
            bincode::deserialize::<Vec<PositionSample>>(&path_blob).map_err(|err| sqlx::Error::Decode(Box::new(err)))?
        };

        let difficulty: String = row.try_get(8)?;
        let elapsed_seconds: i64 = row.try_get(4)?;

        Ok(Self {
            hike_id: Some(row.try_get(0)?),
            start_time: row.try_get(1)?,
            end_time: row.try_get(2)?,
            distance_km: row.try_get(3)?,
            elapsed_seconds: elapsed_seconds.max(0) as u64,
            duration: row.try_get(5)?,
            title: row.try_get(6)?,
            description: row.try_get(7)?,
            difficulty: difficulty.parse().map_err(|err: String| sqlx::Error::Decode(err.into()))?,
            photo_ref: row.try_get(9)?,
            path,
        })
    }
}

/// How many of the latest hikes the home view shows.
pub const RECENT_HIKES: usize = 3;

/// Summary over a list of hikes, as shown on the home and history views.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HikeTotals {
    pub hikes: usize,
    pub distance_km: f64,
}

impl HikeTotals {
    pub fn of(hikes: &[TripRecord]) -> Self {
        Self {
            hikes: hikes.len(),
            distance_km: hikes.iter().map(|hike| hike.distance_km).sum(),
        }
    }
}

/// The first `RECENT_HIKES` of a most-recent-first list.
pub fn recent_hikes(hikes: &[TripRecord]) -> &[TripRecord] {
    &hikes[..hikes.len().min(RECENT_HIKES)]
}

pub fn format_duration(seconds: u64) -> String {
    let hrs = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hrs:02}:{mins:02}:{secs:02}")
}

pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.).round() / 100.
}

/// Kilometres per hour over active time. Zero before the first second.
pub fn average_speed_kmh(distance_km: f64, elapsed_seconds: u64) -> f64 {
    if elapsed_seconds == 0 {
        return 0.;
    }

    distance_km / (elapsed_seconds as f64 / 3600.)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_zero_padded() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(3725), "01:02:05");
        assert_eq!(format_duration(59), "00:00:59");
        assert_eq!(format_duration(100 * 3600), "100:00:00");
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round_to_hundredths(0.012_97), 0.01);
        assert_eq!(round_to_hundredths(12.345_6), 12.35);
        assert_eq!(round_to_hundredths(0.), 0.);
    }

    #[test]
    fn speed_uses_elapsed_hours() {
        assert_eq!(average_speed_kmh(5., 3600), 5.);
        assert_eq!(average_speed_kmh(2.5, 1800), 5.);
        assert_eq!(average_speed_kmh(3., 0), 0.);
    }

    fn hike(title: &str, distance_km: f64) -> TripRecord {
        TripRecord {
            hike_id: None,
            start_time: DateTime::from_timestamp(1_720_944_000, 0).unwrap(),
            end_time: DateTime::from_timestamp(1_720_947_600, 0).unwrap(),
            distance_km,
            elapsed_seconds: 3600,
            duration: "01:00:00".into(),
            path: Vec::new(),
            title: title.into(),
            description: "Loop".into(),
            difficulty: Difficulty::Easy,
            photo_ref: None,
        }
    }

    #[test]
    fn totals_sum_every_hike() {
        let hikes = vec![hike("a", 4.25), hike("b", 1.5), hike("c", 0.25), hike("d", 10.)];
        let totals = HikeTotals::of(&hikes);
        assert_eq!(totals.hikes, 4);
        assert_eq!(totals.distance_km, 16.);

        assert_eq!(HikeTotals::of(&[]), HikeTotals { hikes: 0, distance_km: 0. });
    }

    #[test]
    fn recent_hikes_are_the_first_three() {
        let hikes = vec![hike("a", 1.), hike("b", 1.), hike("c", 1.), hike("d", 1.)];
        let titles: Vec<_> = recent_hikes(&hikes).iter().map(|hike| hike.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);

        assert_eq!(recent_hikes(&hikes[..2]).len(), 2);
        assert!(recent_hikes(&[]).is_empty());
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!(" medium ".parse::<Difficulty>(), Ok(Difficulty::Medium));
        assert!("extreme".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::default(), Difficulty::Easy);
    }
}
