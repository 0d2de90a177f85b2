pub mod distance;
pub mod elapsed_clock;
pub mod error;
pub mod finalizer;
pub mod path_log;
pub mod ports;
pub mod track_point;
pub mod track_session;
pub mod trip;
