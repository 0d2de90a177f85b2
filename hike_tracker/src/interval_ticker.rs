use std::{collections::HashMap, time::Duration};

use hike_tracker_lib::ports::{SessionEvent, TickHandle, TickSource};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::tracker_actor::EventSink;

/// Periodic ticks from `tokio::time::interval`.
pub struct IntervalTicker {
    sink: EventSink,
    next_handle: u64,
    running: HashMap<TickHandle, JoinHandle<()>>,
}

impl IntervalTicker {
    pub fn new(sink: EventSink) -> Self {
        Self {
            sink,
            next_handle: 0,
            running: HashMap::new(),
        }
    }
}

impl TickSource for IntervalTicker {
    fn every(&mut self, period: Duration) -> TickHandle {
        self.next_handle += 1;
        let handle = TickHandle(self.next_handle);
        let sink = self.sink.clone();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                if sink.send(SessionEvent::Tick { handle }).await.is_err() {
                    break;
                }
            }
        });
        self.running.insert(handle, task);

        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        if let Some(task) = self.running.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        for (_, task) in self.running.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_after_each_full_period() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut ticker = IntervalTicker::new(EventSink::new(tx));
        let handle = ticker.every(Duration::from_secs(1));

        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some(SessionEvent::Tick { handle }));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_goes_quiet() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut ticker = IntervalTicker::new(EventSink::new(tx));
        let first = ticker.every(Duration::from_secs(1));
        assert_eq!(rx.recv().await, Some(SessionEvent::Tick { handle: first }));

        ticker.cancel(first);
        ticker.cancel(first);
        assert!(tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.is_err());

        let second = ticker.every(Duration::from_secs(1));
        assert_ne!(first, second);
        assert_eq!(rx.recv().await, Some(SessionEvent::Tick { handle: second }));
    }
}
