use clap::Parser;
use show_harvester::{
    DEFAULT_CAPTURE_TOOL, DEFAULT_CONTAINER, DEFAULT_SITE, FetchOptions, HarvestConfig,
    ProgressEvent, harvest_show,
};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::debug;

/// Record every episode of a show into your media library.
///
/// Episodes are looked up on the show's page, their best quality stream is
/// resolved and recorded to `<path>/<show>/<show> - <title> - SxxEyy.<container>`.
/// Episodes that already exist are skipped.
#[derive(Parser, Debug)]
#[command(name = "show-harvester", author, version, about)]
struct Args {
    /// The website to scrape
    #[arg(long, default_value = DEFAULT_SITE)]
    site: String,

    /// The show slug taken from the website
    #[arg(long)]
    show: Option<String>,

    /// The directory where to store the files
    #[arg(long)]
    path: Option<PathBuf>,

    /// The path to the capture (rtmpdump) binary
    #[arg(long = "capture-tool-path", alias = "rtmp", default_value = DEFAULT_CAPTURE_TOOL)]
    capture_tool_path: PathBuf,

    /// File extension of recorded episodes
    #[arg(long, default_value = DEFAULT_CONTAINER)]
    container: String,

    /// Directory for in-progress recordings (defaults to the system temp directory)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Timeout in seconds for every HTTP request
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// User agent sent with HTTP requests
    #[arg(long)]
    user_agent: Option<String>,

    /// Resolve streams but do not record anything
    #[arg(long)]
    dry_run: bool,

    /// Command run with the show directory after new episodes were recorded
    #[arg(long)]
    rescan_command: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    /// Maps the command line onto the library configuration
    fn into_config(self) -> HarvestConfig {
        let mut config = HarvestConfig::new(
            self.show.unwrap_or_default(),
            self.path.unwrap_or_default(),
        );

        config.site = self.site;
        config.capture_tool = self.capture_tool_path;
        config.container = self.container;
        if let Some(scratch_dir) = self.scratch_dir {
            config.scratch_dir = scratch_dir;
        }
        config.dry_run = self.dry_run;
        config.rescan_command = self.rescan_command;
        config.fetch = FetchOptions {
            timeout: self.timeout.map(Duration::from_secs),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| FetchOptions::default().user_agent),
        };

        config
    }

    fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Handles progress events and prints formatted output to stdout
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::Started { show_url } => {
            println!("Scraping show {}...", show_url);
        }
        ProgressEvent::EpisodesFound { count } => {
            if count == 0 {
                println!("No episodes found.");
            } else {
                println!("Found {} episode(s)\n", count);
            }
        }
        ProgressEvent::ProcessingEpisode {
            index,
            total,
            show_name,
            title,
        } => {
            println!("[{}/{}] {} - {}", index + 1, total, show_name, title);
        }
        ProgressEvent::NumberingResolved { season, episode } => {
            println!("  Season {}, episode {}", season, episode);
        }
        ProgressEvent::DestinationComputed { destination } => {
            println!("  Will be saved to {}", destination.display());
        }
        ProgressEvent::SkippedExisting { .. } => {
            println!("  Already downloaded, skipping");
        }
        ProgressEvent::PlaylistResolved { .. } => {}
        ProgressEvent::StreamResolved { stream_url } => {
            println!("  Best stream: {}", stream_url);
        }
        ProgressEvent::Captured { bytes, .. } => {
            println!(
                "  Recorded {}",
                humansize::format_size(bytes, humansize::DECIMAL)
            );
        }
        ProgressEvent::EpisodeFailed { stage, message, .. } => {
            println!("  Failed during {}: {}", stage, message);
        }
        ProgressEvent::Rescanning { directory } => {
            println!("\nRescanning {}...", directory.display());
        }
        ProgressEvent::RescanFailed { message, .. } => {
            println!("  Rescan failed: {}", message);
        }
        ProgressEvent::Complete {
            captured,
            skipped,
            resolved,
            failed,
        } => {
            println!(
                "\nDone! {} recorded, {} already present, {} resolved only, {} failed.",
                captured, skipped, resolved, failed
            );
        }
    }
}

fn main() {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = args.into_config();

    if let Err(e) = harvest_show(&config, handle_progress_event) {
        eprintln!("\nError: {}", e);
        process::exit(1);
    }
}
