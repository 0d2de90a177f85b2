use crate::track_point::PositionSample;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two fixes using the haversine formula.
///
/// No antimeridian or pole handling: a segment crossing ±180° longitude is
/// measured the long way round.
pub fn segment_distance_km(a: &PositionSample, b: &PositionSample) -> f64 {
    if a.same_coordinates(b) {
        return 0.;
    }

    let d_lat = (b.latitude() - a.latitude()).to_radians();
    let d_lon = (b.longitude() - a.longitude()).to_radians();
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();

    let h = f64::sin(d_lat / 2.).powi(2)
        + f64::cos(lat1) * f64::cos(lat2) * f64::sin(d_lon / 2.).powi(2);
    let c = 2. * f64::atan2(h.sqrt(), (1. - h).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn accumulate(total: f64, a: &PositionSample, b: &PositionSample) -> f64 {
    total + segment_distance_km(a, b)
}

/// Running total of distance between consecutive fixes.
///
/// The anchor is the previous point segments are measured from. Clearing it
/// makes the next fix a fresh baseline that contributes nothing.
#[derive(Debug, Default, Clone)]
pub struct DistanceAccumulator {
    total_km: f64,
    anchor: Option<PositionSample>,
}

impl DistanceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the distance credited for this fix.
    pub fn push(&mut self, sample: &PositionSample) -> f64 {
        let before = self.total_km;
        if let Some(previous) = &self.anchor {
            self.total_km = accumulate(self.total_km, previous, sample);
        }

        self.anchor = Some(*sample);
        self.total_km - before
    }

    pub fn reanchor(&mut self) {
        self.anchor = None;
    }

    pub fn total_km(&self) -> f64 {
        self.total_km
    }
}
