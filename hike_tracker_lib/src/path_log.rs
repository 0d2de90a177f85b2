use crate::track_point::PositionSample;

/// Append-only log of accepted fixes in arrival order.
///
/// Only fixes strictly newer than the last one are taken, so a fix can
/// never land in the log twice.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PathLog {
    samples: Vec<PositionSample>,
}

impl PathLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false and leaves the log untouched if the fix is not newer
    /// than the last accepted one.
    pub fn append(&mut self, sample: PositionSample) -> bool {
        if let Some(last) = self.samples.last() {
            if sample.timestamp_ms() <= last.timestamp_ms() {
                return false;
            }
        }

        self.samples.push(sample);
        true
    }

    pub fn last(&self) -> Option<&PositionSample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[PositionSample] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: i64) -> PositionSample {
        PositionSample::new(46.0, 7.0 + t as f64 * 1e-4, t).unwrap()
    }

    #[test]
    fn keeps_arrival_order() {
        let mut log = PathLog::new();
        assert!(log.append(sample(1)));
        assert!(log.append(sample(2)));
        assert!(log.append(sample(10)));
        let times: Vec<_> = log.samples().iter().map(|s| s.timestamp_ms()).collect();
        assert_eq!(times, vec![1, 2, 10]);
    }

    #[test]
    fn refuses_stale_and_duplicate_fixes() {
        let mut log = PathLog::new();
        log.append(sample(5));
        assert!(!log.append(sample(5)));
        assert!(!log.append(sample(3)));
        assert_eq!(log.len(), 1);
        assert_eq!(log.last().map(|s| s.timestamp_ms()), Some(5));
    }
}
