use std::fmt;

use hike_tracker_lib::{
    ports::{Confirmation, Navigator, Screen},
    trip::{format_duration, recent_hikes, Difficulty, HikeTotals, TripMetadata, TripRecord},
};
use inquire::{Confirm, InquireError, Select, Text};

use crate::tracker_actor::LiveStats;

/// Yes/no prompt on the terminal. Declines on any prompt failure.
///
/// Blocks the calling worker thread, so it must run on the multi-threaded
/// runtime.
pub struct TerminalConfirmation;

impl Confirmation for TerminalConfirmation {
    fn ask(&mut self, prompt: &str) -> bool {
        tokio::task::block_in_place(|| {
            match Confirm::new(prompt).with_default(false).prompt() {
                Ok(answer) => answer,
                Err(err) => {
                    tracing::warn!("Confirmation failed, treating as no: {}", err);
                    false
                },
            }
        })
    }
}

#[derive(Default)]
pub struct TerminalNavigator {
    pub current: Option<Screen>,
}

impl Navigator for TerminalNavigator {
    fn navigate(&mut self, screen: Screen) {
        tracing::debug!("Navigating to {:?}", screen);
        self.current = Some(screen);

        let title = match screen {
            Screen::Home => "Home",
            Screen::Active => "Active hike",
            Screen::AddHike => "Add hike",
            Screen::History => "History",
            Screen::Detail => "Hike details",
        };
        println!("\n== {} ==", title);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Refresh,
    Pause,
    Resume,
    Stop,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Refresh => "Refresh",
            Action::Pause => "Pause",
            Action::Resume => "Resume",
            Action::Stop => "Stop",
        })
    }
}

/// Menu of what can be done from the live view. `None` when the user
/// escaped the prompt.
pub async fn choose_action(paused: bool) -> anyhow::Result<Option<Action>> {
    let toggle = if paused { Action::Resume } else { Action::Pause };
    let options = vec![Action::Refresh, toggle, Action::Stop];

    let choice = tokio::task::spawn_blocking(move || Select::new("Action", options).prompt()).await?;
    match choice {
        Ok(action) => Ok(Some(action)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Asks for the hike metadata. `title` pre-fills the first field.
pub async fn metadata_form(title: Option<String>) -> anyhow::Result<TripMetadata> {
    let metadata = tokio::task::spawn_blocking(move || -> Result<TripMetadata, InquireError> {
        let mut title_prompt = Text::new("Title");
        if let Some(title) = title.as_deref() {
            title_prompt = title_prompt.with_initial_value(title);
        }
        let title = title_prompt.prompt()?;
        let description = Text::new("Description").prompt()?;
        let difficulty = Select::new("Difficulty", Difficulty::ALL.to_vec()).prompt()?;
        let photo_ref = Text::new("Photo (optional path)").prompt_skippable()?;

        let mut metadata = TripMetadata::new(title, description).with_difficulty(difficulty);
        if let Some(photo_ref) = photo_ref {
            metadata = metadata.with_photo_ref(photo_ref);
        }
        Ok(metadata)
    }).await??;

    Ok(metadata)
}

pub fn print_stats(stats: &LiveStats) {
    println!(
        "{:?} | {:.2} km | {} | {:.1} km/h | {} fixes",
        stats.status,
        stats.distance_km,
        format_duration(stats.elapsed_seconds),
        stats.speed_kmh,
        stats.fixes,
    );
    if let Some(position) = stats.last_position {
        println!("Last position {:.5}, {:.5}", position.latitude(), position.longitude());
    }
}

fn print_totals(hikes: &[TripRecord]) {
    let totals = HikeTotals::of(hikes);
    println!("Total hikes     {}", totals.hikes);
    println!("Total distance  {:.1} km", totals.distance_km);
}

fn print_rows(hikes: &[TripRecord]) {
    for hike in hikes {
        println!(
            "{:>4}  {}  {:<24} {:>7.2} km  {}",
            hike.hike_id.unwrap_or_default(),
            hike.start_time.format("%Y-%m-%d"),
            hike.title,
            hike.distance_km,
            hike.duration,
        );
    }
}

/// `hikes` most recent first.
pub fn print_home(hikes: &[TripRecord]) {
    print_totals(hikes);
    println!("\nRecent hikes");
    if hikes.is_empty() {
        println!("No hikes yet, record one to get started");
        return;
    }
    print_rows(recent_hikes(hikes));
}

pub fn print_history(hikes: &[TripRecord]) {
    print_totals(hikes);
    println!();
    if hikes.is_empty() {
        println!("No hikes yet");
        return;
    }
    print_rows(hikes);
}

pub fn print_detail(hike: &TripRecord) {
    println!("{} ({})", hike.title, hike.difficulty);
    println!("{}", hike.description);
    println!("Started   {}", hike.start_time.format("%Y-%m-%d %H:%M"));
    println!("Distance  {:.2} km", hike.distance_km);
    println!("Duration  {}", hike.duration);
    println!("Speed     {:.1} km/h", hike.average_speed_kmh());
    println!("Points    {}", hike.path.len());
    if let Some(photo_ref) = &hike.photo_ref {
        println!("Photo     {}", photo_ref);
    }
}
