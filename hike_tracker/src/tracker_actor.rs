use chrono::Utc;
use hike_tracker_lib::{
    finalizer::SessionFinalizer,
    ports::{Confirmation, PositionSource, SessionEvent, TickSource, WatchOptions},
    track_point::PositionSample,
    track_session::{SessionStatus, StopOutcome, TrackingSession},
};
use tokio::sync::{mpsc, oneshot};

const MAILBOX_SIZE: usize = 64;

/// Where sources push their events. Cloned into every source task.
#[derive(Clone)]
pub struct EventSink(mpsc::Sender<SessionEvent>);

impl EventSink {
    pub fn new(sender: mpsc::Sender<SessionEvent>) -> Self {
        Self(sender)
    }

    pub async fn send(&self, event: SessionEvent) -> Result<(), mpsc::error::SendError<SessionEvent>> {
        self.0.send(event).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveStats {
    pub status: SessionStatus,
    pub distance_km: f64,
    pub elapsed_seconds: u64,
    pub speed_kmh: f64,
    pub fixes: usize,
    pub last_position: Option<PositionSample>,
}

enum Command {
    Pause(oneshot::Sender<bool>),
    Resume(oneshot::Sender<bool>),
    Stats(oneshot::Sender<LiveStats>),
    RequestStop(oneshot::Sender<Option<SessionFinalizer>>),
}

/// Handle to the task that owns the tracking session.
///
/// Dropping the handle before a confirmed stop tears the session down,
/// which releases the position subscription and the timer.
pub struct TrackerHandle {
    commands: mpsc::Sender<Command>,
}

impl TrackerHandle {
    pub fn start<S, T>(
        options: WatchOptions,
        make_source: S,
        make_ticks: T,
        confirmation: Box<dyn Confirmation + Send>,
    ) -> Self
    where
        S: FnOnce(EventSink) -> Box<dyn PositionSource + Send>,
        T: FnOnce(EventSink) -> Box<dyn TickSource + Send>,
    {
        let (event_tx, event_rx) = mpsc::channel(MAILBOX_SIZE);
        let (command_tx, command_rx) = mpsc::channel(MAILBOX_SIZE);

        let source = make_source(EventSink(event_tx.clone()));
        let ticks = make_ticks(EventSink(event_tx));

        let session = TrackingSession::start(Utc::now(), options, source, ticks);

        tokio::spawn(run(session, confirmation, command_rx, event_rx));

        Self {
            commands: command_tx,
        }
    }

    pub async fn pause(&self) -> anyhow::Result<bool> {
        self.ask(Command::Pause).await
    }

    pub async fn resume(&self) -> anyhow::Result<bool> {
        self.ask(Command::Resume).await
    }

    pub async fn stats(&self) -> anyhow::Result<LiveStats> {
        self.ask(Command::Stats).await
    }

    /// `None` if the user declined.
    pub async fn request_stop(&self) -> anyhow::Result<Option<SessionFinalizer>> {
        self.ask(Command::RequestStop).await
    }

    async fn ask<R>(&self, command: impl FnOnce(oneshot::Sender<R>) -> Command) -> anyhow::Result<R> {
        let (response_tx, response_rx) = oneshot::channel();
        self.commands
            .send(command(response_tx))
            .await
            .map_err(|_| anyhow::anyhow!("Tracker is no longer running"))?;
        response_rx.await.map_err(|_| anyhow::anyhow!("Tracker did not answer"))
    }
}

async fn run(
    mut session: TrackingSession,
    mut confirmation: Box<dyn Confirmation + Send>,
    mut commands: mpsc::Receiver<Command>,
    mut events: mpsc::Receiver<SessionEvent>,
) {
    loop {
        // Queued events go first so a command sees everything that arrived before it
        tokio::select! {
            biased;

            Some(event) = events.recv() => session.dispatch(event),

            command = commands.recv() => {
                let Some(command) = command else {
                    tracing::warn!("Tracker handle dropped while {:?}, tearing down", session.status());
                    break;
                };

                match command {
                    Command::Pause(respond_to) => {
                        let _ = respond_to.send(session.pause());
                    },
                    Command::Resume(respond_to) => {
                        let _ = respond_to.send(session.resume());
                    },
                    Command::Stats(respond_to) => {
                        let _ = respond_to.send(stats(&session));
                    },
                    Command::RequestStop(respond_to) => {
                        match session.request_stop(confirmation.as_mut(), Utc::now()) {
                            StopOutcome::Stopped(finalizer) => {
                                if respond_to.send(Some(finalizer)).is_err() {
                                    tracing::error!("Stopped session was not picked up");
                                }
                                break;
                            },
                            StopOutcome::Declined | StopOutcome::AlreadyStopped => {
                                let _ = respond_to.send(None);
                            },
                        }
                    },
                }
            },
        }
    }

    tracing::debug!("Tracker task finished");
}

fn stats(session: &TrackingSession) -> LiveStats {
    LiveStats {
        status: session.status(),
        distance_km: session.cumulative_distance_km(),
        elapsed_seconds: session.elapsed_seconds(),
        speed_kmh: session.current_speed_kmh(),
        fixes: session.path().len(),
        last_position: session.last_position().copied(),
    }
}
