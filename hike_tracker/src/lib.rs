pub mod config;
pub mod interval_ticker;
pub mod replay_source;
pub mod terminal;
pub mod tracker_actor;
