use chrono::{DateTime, Utc};
use tracing::{debug, info, trace, warn};

use crate::{
    distance::DistanceAccumulator,
    elapsed_clock::ElapsedClock,
    error::PositionError,
    finalizer::{SessionFinalizer, StoppedSession},
    path_log::PathLog,
    ports::{Confirmation, PositionSource, SessionEvent, SubscriptionHandle, TickHandle, TickSource, WatchOptions},
    track_point::PositionSample,
    trip::average_speed_kmh,
};

pub const STOP_PROMPT: &str = "End this hike?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// Appended to the path. `segment_km` is the distance credited for it.
    Accepted { segment_km: f64 },
    /// Not newer than the last accepted fix.
    Stale,
    NotActive,
}

pub enum StopOutcome {
    Stopped(SessionFinalizer),
    Declined,
    AlreadyStopped,
}

/// Live recording of one excursion.
///
/// Owns its position subscription and tick timer and releases both on
/// pause, on stop and on drop. All mutation goes through `&mut self`, so a
/// host that feeds events from a single queue never interleaves two of them.
pub struct TrackingSession {
    status: SessionStatus,
    path: PathLog,
    distance: DistanceAccumulator,
    clock: ElapsedClock,
    started_at: DateTime<Utc>,
    last_accepted_timestamp_ms: Option<i64>,

    options: WatchOptions,
    subscription: Option<SubscriptionHandle>,
    source: Box<dyn PositionSource + Send>,
    ticks: Box<dyn TickSource + Send>,
}

impl TrackingSession {
    pub fn start(
        started_at: DateTime<Utc>,
        options: WatchOptions,
        mut source: Box<dyn PositionSource + Send>,
        mut ticks: Box<dyn TickSource + Send>,
    ) -> Self {
        let subscription = source.subscribe(options);
        let mut clock = ElapsedClock::new();
        clock.start(ticks.as_mut());

        info!("Tracking session started at {}", started_at);

        Self {
            status: SessionStatus::Active,
            path: PathLog::new(),
            distance: DistanceAccumulator::new(),
            clock,
            started_at,
            last_accepted_timestamp_ms: None,
            options,
            subscription: Some(subscription),
            source,
            ticks,
        }
    }

    /// Single entry point for everything the sources push. Events from a
    /// subscription or timer that is no longer live are dropped here.
    pub fn dispatch(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Position { handle, result } => {
                if self.subscription != Some(handle) {
                    trace!("Ignoring position event from closed subscription {:?}", handle);
                    return;
                }

                match result {
                    Ok(sample) => {
                        self.on_position_sample(sample);
                    },
                    Err(err) => self.on_position_error(&err),
                }
            },
            SessionEvent::Tick { handle } => {
                self.on_clock_tick(handle);
            },
        }
    }

    pub fn on_position_sample(&mut self, sample: PositionSample) -> SampleOutcome {
        if self.status != SessionStatus::Active {
            return SampleOutcome::NotActive;
        }

        if let Some(last) = self.last_accepted_timestamp_ms {
            if sample.timestamp_ms() <= last {
                trace!("Dropping fix at {} ms, last accepted was {} ms", sample.timestamp_ms(), last);
                return SampleOutcome::Stale;
            }
        }

        if !self.path.append(sample) {
            return SampleOutcome::Stale;
        }

        let segment_km = self.distance.push(&sample);
        self.last_accepted_timestamp_ms = Some(sample.timestamp_ms());

        debug!("Accepted fix #{} (+{:.4} km, total {:.4} km)", self.path.len(), segment_km, self.distance.total_km());
        SampleOutcome::Accepted { segment_km }
    }

    /// Sensor errors never change the session. The last fix is kept and the
    /// subscription stays open.
    pub fn on_position_error(&mut self, err: &PositionError) {
        warn!("Position source error: {}", err);
    }

    /// Returns true if the tick was counted.
    pub fn on_clock_tick(&mut self, handle: TickHandle) -> bool {
        if self.status != SessionStatus::Active {
            return false;
        }

        self.clock.tick(handle)
    }

    pub fn pause(&mut self) -> bool {
        if self.status != SessionStatus::Active {
            return false;
        }

        self.release();
        // The first fix after resume is a new baseline
        self.distance.reanchor();
        self.status = SessionStatus::Paused;

        info!("Tracking session paused after {} s", self.clock.seconds());
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.status != SessionStatus::Paused {
            return false;
        }

        self.subscription = Some(self.source.subscribe(self.options));
        self.clock.start(self.ticks.as_mut());
        self.status = SessionStatus::Active;

        info!("Tracking session resumed");
        true
    }

    /// Stops the session if the user confirms. On decline nothing changes.
    ///
    /// The returned finalizer is the only way to a trip record, and it is
    /// handed out once.
    pub fn request_stop(&mut self, confirmation: &mut dyn Confirmation, now: DateTime<Utc>) -> StopOutcome {
        if self.status == SessionStatus::Stopped {
            return StopOutcome::AlreadyStopped;
        }

        if !confirmation.ask(STOP_PROMPT) {
            debug!("Stop declined, staying {:?}", self.status);
            return StopOutcome::Declined;
        }

        self.release();
        self.status = SessionStatus::Stopped;

        info!(
            "Tracking session stopped: {} fixes, {:.3} km, {} s",
            self.path.len(),
            self.distance.total_km(),
            self.clock.seconds()
        );

        StopOutcome::Stopped(SessionFinalizer::new(StoppedSession {
            started_at: self.started_at,
            stopped_at: now,
            path: self.path.samples().to_vec(),
            distance_km: self.distance.total_km(),
            elapsed_seconds: self.clock.seconds(),
        }))
    }

    fn release(&mut self) {
        if let Some(handle) = self.subscription.take() {
            self.source.unsubscribe(handle);
        }
        self.clock.stop(self.ticks.as_mut());
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn path(&self) -> &PathLog {
        &self.path
    }

    pub fn cumulative_distance_km(&self) -> f64 {
        self.distance.total_km()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.clock.seconds()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_accepted_timestamp_ms(&self) -> Option<i64> {
        self.last_accepted_timestamp_ms
    }

    pub fn last_position(&self) -> Option<&PositionSample> {
        self.path.last()
    }

    pub fn current_speed_kmh(&self) -> f64 {
        average_speed_kmh(self.distance.total_km(), self.clock.seconds())
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        if self.status != SessionStatus::Stopped {
            debug!("Tracking session dropped while {:?}, releasing sources", self.status);
            self.release();
        }
    }
}
