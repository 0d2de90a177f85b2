use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use hike_tracker_lib::{
    error::PositionError,
    ports::{PositionSource, SessionEvent, SubscriptionHandle, WatchOptions},
    track_point::PositionSample,
};
use tokio::task::JoinHandle;

use crate::tracker_actor::EventSink;

/// Longest wait between two replayed fixes, whatever the recorded gap.
pub const MAX_REPLAY_GAP: Duration = Duration::from_secs(24 * 60 * 60);

/// Plays back a recorded track as if it came from a live sensor.
///
/// Fixes are delivered with the gaps between their timestamps, divided by
/// `speed`. Playback continues where it left off when a new subscription
/// is opened after a pause.
pub struct GpxReplaySource {
    samples: Arc<Vec<PositionSample>>,
    cursor: Arc<AtomicUsize>,
    speed: f64,
    sink: EventSink,
    next_handle: u64,
    running: HashMap<SubscriptionHandle, JoinHandle<()>>,
}

impl GpxReplaySource {
    pub fn new(samples: Vec<PositionSample>, speed: f64, sink: EventSink) -> Self {
        Self {
            samples: Arc::new(samples),
            cursor: Arc::new(AtomicUsize::new(0)),
            speed,
            sink,
            next_handle: 0,
            running: HashMap::new(),
        }
    }
}

impl PositionSource for GpxReplaySource {
    fn subscribe(&mut self, options: WatchOptions) -> SubscriptionHandle {
        self.next_handle += 1;
        let handle = SubscriptionHandle(self.next_handle);

        tracing::debug!("Replay subscription {:?} from fix {}", handle, self.cursor.load(Ordering::Relaxed));

        let task = tokio::spawn(replay(
            handle,
            self.samples.clone(),
            self.cursor.clone(),
            self.speed,
            options,
            self.sink.clone(),
        ));
        self.running.insert(handle, task);

        handle
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        if let Some(task) = self.running.remove(&handle) {
            task.abort();
            tracing::debug!("Replay subscription {:?} closed", handle);
        }
    }
}

impl Drop for GpxReplaySource {
    fn drop(&mut self) {
        for (_, task) in self.running.drain() {
            task.abort();
        }
    }
}

async fn replay(
    handle: SubscriptionHandle,
    samples: Arc<Vec<PositionSample>>,
    cursor: Arc<AtomicUsize>,
    speed: f64,
    options: WatchOptions,
    sink: EventSink,
) {
    let timeout = Duration::from_millis(options.timeout_ms);

    loop {
        let index = cursor.load(Ordering::Relaxed);
        let Some(sample) = samples.get(index).copied() else {
            let _ = sink.send(SessionEvent::Position {
                handle,
                result: Err(PositionError::Unavailable("end of recorded track".into())),
            }).await;
            return;
        };

        let gap_ms = match index.checked_sub(1).and_then(|previous| samples.get(previous)) {
            Some(previous) => sample.timestamp_ms().saturating_sub(previous.timestamp_ms()),
            None => 0,
        };
        let delay = replay_delay(gap_ms, speed);

        if options.timeout_ms > 0 && delay > timeout {
            tokio::time::sleep(timeout).await;
            let timed_out = SessionEvent::Position {
                handle,
                result: Err(PositionError::Timeout(options.timeout_ms)),
            };
            if sink.send(timed_out).await.is_err() {
                return;
            }
            tokio::time::sleep(delay - timeout).await;
        } else {
            tokio::time::sleep(delay).await;
        }

        if sink.send(SessionEvent::Position { handle, result: Ok(sample) }).await.is_err() {
            return;
        }
        cursor.store(index + 1, Ordering::Relaxed);
    }
}

/// Wall-clock wait for a recorded gap played at `speed`, capped at
/// `MAX_REPLAY_GAP`.
fn replay_delay(gap_ms: i64, speed: f64) -> Duration {
    Duration::try_from_secs_f64(gap_ms.max(0) as f64 / 1000. / speed)
        .map_or(MAX_REPLAY_GAP, |delay| delay.min(MAX_REPLAY_GAP))
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn track() -> Vec<PositionSample> {
        (0..3)
            .map(|i| PositionSample::new(60.0 + i as f64 * 1e-3, 10.0, 1_000 * i).unwrap())
            .collect()
    }

    async fn next(rx: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
        tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap()
    }

    #[test]
    fn replay_delay_scales_and_caps() {
        assert_eq!(replay_delay(5_000, 2.), Duration::from_millis(2_500));
        assert_eq!(replay_delay(-10, 1.), Duration::ZERO);
        assert_eq!(replay_delay(i64::MAX, 1e-300), MAX_REPLAY_GAP);
        assert_eq!(replay_delay(i64::MAX, f64::MIN_POSITIVE), MAX_REPLAY_GAP);
        assert_eq!(replay_delay(48 * 3_600_000, 1.), MAX_REPLAY_GAP);
    }

    #[tokio::test]
    async fn plays_every_fix_then_reports_unavailable() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut source = GpxReplaySource::new(track(), 1000., EventSink::new(tx));
        let handle = source.subscribe(WatchOptions::default());

        for expected in track() {
            assert_eq!(next(&mut rx).await, SessionEvent::Position { handle, result: Ok(expected) });
        }
        assert!(matches!(
            next(&mut rx).await,
            SessionEvent::Position { result: Err(PositionError::Unavailable(_)), .. }
        ));
    }

    #[tokio::test]
    async fn long_gaps_report_a_timeout_first() {
        let (tx, mut rx) = mpsc::channel(16);
        let samples = vec![
            PositionSample::new(60.0, 10.0, 0).unwrap(),
            PositionSample::new(60.1, 10.0, 60_000).unwrap(),
        ];
        let mut source = GpxReplaySource::new(samples.clone(), 1000., EventSink::new(tx));
        let options = WatchOptions { timeout_ms: 10, ..Default::default() };
        let handle = source.subscribe(options);

        assert_eq!(next(&mut rx).await, SessionEvent::Position { handle, result: Ok(samples[0]) });
        assert_eq!(next(&mut rx).await, SessionEvent::Position { handle, result: Err(PositionError::Timeout(10)) });
        assert_eq!(next(&mut rx).await, SessionEvent::Position { handle, result: Ok(samples[1]) });
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent_and_resumes_from_cursor() {
        let (tx, mut rx) = mpsc::channel(16);
        let samples = track();
        // Slow enough that nothing past the first fix arrives before we unsubscribe
        let mut source = GpxReplaySource::new(samples.clone(), 0.01, EventSink::new(tx));

        let first = source.subscribe(WatchOptions { timeout_ms: 0, ..Default::default() });
        assert_eq!(next(&mut rx).await, SessionEvent::Position { handle: first, result: Ok(samples[0]) });
        source.unsubscribe(first);
        source.unsubscribe(first);

        assert!(tokio::time::timeout(Duration::from_millis(50), rx.recv()).await.is_err());

        let second = source.subscribe(WatchOptions { timeout_ms: 0, ..Default::default() });
        assert_ne!(first, second);
        assert!(source.running.contains_key(&second));
        assert!(!source.running.contains_key(&first));
    }
}
