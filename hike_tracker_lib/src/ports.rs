//! Contracts for everything the tracking core talks to but does not own.
//!
//! Sources do not call back into the session. They push `SessionEvent`s,
//! tagged with the handle of the subscription that produced them, into the
//! host's event queue, and the host feeds the queue to
//! `TrackingSession::dispatch` one event at a time.

use std::time::Duration;

use crate::{error::PositionError, track_point::PositionSample};

/// Options passed to a position source on subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    pub max_age_ms: u64,
    pub timeout_ms: u64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            max_age_ms: 0,
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Position {
        handle: SubscriptionHandle,
        result: Result<PositionSample, PositionError>,
    },
    Tick {
        handle: TickHandle,
    },
}

pub trait PositionSource {
    fn subscribe(&mut self, options: WatchOptions) -> SubscriptionHandle;

    /// Must be safe to call any number of times with the same handle.
    fn unsubscribe(&mut self, handle: SubscriptionHandle);
}

pub trait TickSource {
    fn every(&mut self, period: Duration) -> TickHandle;

    /// Must be safe to call any number of times with the same handle.
    fn cancel(&mut self, handle: TickHandle);
}

pub trait Confirmation {
    fn ask(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirmation for F {
    fn ask(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Screens the host UI can be asked to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Active,
    AddHike,
    History,
    Detail,
}

pub trait Navigator {
    fn navigate(&mut self, screen: Screen);
}
