use std::time::Duration;

use crate::ports::{TickHandle, TickSource};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Counts whole seconds of active time. Only ticks from the live timer count.
#[derive(Debug, Default)]
pub struct ElapsedClock {
    seconds: u64,
    timer: Option<TickHandle>,
}

impl ElapsedClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, ticks: &mut dyn TickSource) {
        if self.timer.is_none() {
            self.timer = Some(ticks.every(TICK_PERIOD));
        }
    }

    pub fn stop(&mut self, ticks: &mut dyn TickSource) {
        if let Some(handle) = self.timer.take() {
            ticks.cancel(handle);
        }
    }

    /// Returns true if the tick was counted.
    pub fn tick(&mut self, handle: TickHandle) -> bool {
        if self.timer != Some(handle) {
            return false;
        }

        self.seconds += 1;
        true
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Ticks {
        next: u64,
        cancelled: Vec<TickHandle>,
    }

    impl TickSource for Ticks {
        fn every(&mut self, period: Duration) -> TickHandle {
            assert_eq!(period, TICK_PERIOD);
            self.next += 1;
            TickHandle(self.next)
        }

        fn cancel(&mut self, handle: TickHandle) {
            self.cancelled.push(handle);
        }
    }

    #[test]
    fn counts_only_live_ticks() {
        let mut ticks = Ticks::default();
        let mut clock = ElapsedClock::new();

        clock.start(&mut ticks);
        assert!(clock.tick(TickHandle(1)));
        assert!(clock.tick(TickHandle(1)));

        clock.stop(&mut ticks);
        assert!(!clock.tick(TickHandle(1)));
        assert_eq!(ticks.cancelled, vec![TickHandle(1)]);

        clock.start(&mut ticks);
        assert!(!clock.tick(TickHandle(1)));
        assert!(clock.tick(TickHandle(2)));
        assert_eq!(clock.seconds(), 3);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut ticks = Ticks::default();
        let mut clock = ElapsedClock::new();

        clock.start(&mut ticks);
        clock.start(&mut ticks);
        assert_eq!(ticks.next, 1);

        clock.stop(&mut ticks);
        clock.stop(&mut ticks);
        assert_eq!(ticks.cancelled.len(), 1);
        assert!(!clock.is_running());
    }
}
