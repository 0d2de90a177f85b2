use std::{fs::OpenOptions, path::PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use hike_tracker::{
    config::{Configuration, Overrides, LOG_FILE},
    interval_ticker::IntervalTicker,
    replay_source::GpxReplaySource,
    terminal::{self, Action, TerminalConfirmation, TerminalNavigator},
    tracker_actor::TrackerHandle,
};
use hike_tracker_data_management::{default_data_dir, gpx_util::read_gpx_samples, DataManager, Persistence};
use hike_tracker_lib::{
    error::FinalizeError,
    ports::{Confirmation, Navigator, PositionSource, Screen, TickSource},
    track_session::SessionStatus,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hike_tracker")]
#[command(about = "Record hikes and browse the ones you have done", long_about = None)]
struct Cli {
    /// Where the database, config and log live
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a hike, replaying a GPX track as the position sensor
    Record {
        #[arg(long)]
        gpx: PathBuf,
        /// Stop without asking for confirmation
        #[arg(long)]
        yes: bool,
        /// Pre-fill the title in the form
        #[arg(long)]
        title: Option<String>,
        /// Replay speed multiplier
        #[arg(long)]
        speed: Option<f64>,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Totals and the most recent hikes
    Home,
    /// List all hikes, most recent first
    List,
    /// Show the details of a hike
    Show { hike_id: i64 },
    /// Write the path of a hike to a GPX file
    ExportGpx { hike_id: i64, out: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create {:?}", config_dir))?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config_dir.join(LOG_FILE))
        .context("Failed to open log file")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "hike_tracker=info,hike_tracker_lib=info,hike_tracker_data_management=info".into())
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    let (timeout_ms, replay_speed) = match &cli.command {
        Commands::Record { timeout_ms, speed, .. } => (*timeout_ms, *speed),
        _ => (None, None),
    };
    let config = Configuration::load(config_dir, Overrides {
        data_dir: cli.data_dir,
        timeout_ms,
        replay_speed,
    })?;

    let data_manager = DataManager::open(&config.data_dir).await?;
    let mut navigator = TerminalNavigator::default();

    match cli.command {
        Commands::Record { gpx, yes, title, .. } => {
            record(&config, &data_manager, &mut navigator, gpx, yes, title).await?;
            terminal::print_home(&data_manager.get_hikes().await?);
        },
        Commands::Home => {
            navigator.navigate(Screen::Home);
            terminal::print_home(&data_manager.get_hikes().await?);
        },
        Commands::List => {
            navigator.navigate(Screen::History);
            terminal::print_history(&data_manager.get_hikes().await?);
        },
        Commands::Show { hike_id } => {
            navigator.navigate(Screen::Detail);
            terminal::print_detail(&data_manager.get_hike(hike_id).await?);
        },
        Commands::ExportGpx { hike_id, out } => {
            data_manager.export_gpx(hike_id, &out).await?;
            println!("Wrote hike {} to {:?}", hike_id, out);
        },
    }

    Ok(())
}

async fn record(
    config: &Configuration,
    persistence: &dyn Persistence,
    navigator: &mut dyn Navigator,
    gpx: PathBuf,
    yes: bool,
    title: Option<String>,
) -> anyhow::Result<()> {
    let samples = read_gpx_samples(&gpx)?;
    if samples.is_empty() {
        bail!("{:?} has no timed track points to replay", gpx);
    }
    tracing::info!("Replaying {} fixes from {:?} at {}x", samples.len(), gpx, config.replay_speed);

    let confirmation: Box<dyn Confirmation + Send> = if yes {
        Box::new(|_: &str| true)
    } else {
        Box::new(TerminalConfirmation)
    };

    let speed = config.replay_speed;
    let tracker = TrackerHandle::start(
        config.watch,
        move |sink| -> Box<dyn PositionSource + Send> { Box::new(GpxReplaySource::new(samples, speed, sink)) },
        |sink| -> Box<dyn TickSource + Send> { Box::new(IntervalTicker::new(sink)) },
        confirmation,
    );

    navigator.navigate(Screen::Active);
    let mut finalizer = loop {
        let stats = tracker.stats().await?;
        terminal::print_stats(&stats);

        match terminal::choose_action(stats.status == SessionStatus::Paused).await? {
            Some(Action::Pause) => {
                tracker.pause().await?;
            },
            Some(Action::Resume) => {
                tracker.resume().await?;
            },
            Some(Action::Stop) => {
                if let Some(finalizer) = tracker.request_stop().await? {
                    break finalizer;
                }
            },
            Some(Action::Refresh) | None => {},
        }
    };

    navigator.navigate(Screen::AddHike);
    let record = loop {
        let metadata = terminal::metadata_form(title.clone()).await?;
        match finalizer.finalize(metadata) {
            Ok(record) => break record,
            Err(err @ FinalizeError::Validation(_)) => {
                tracing::debug!("Hike form rejected: {}", err);
                println!("{}, try again", err);
            },
            Err(err) => return Err(err.into()),
        }
    };

    let hike_id = persistence.save(&record).await?;
    println!(
        "Saved hike {}: {:.2} km in {}",
        hike_id, record.distance_km, record.duration
    );

    navigator.navigate(Screen::Home);
    Ok(())
}
