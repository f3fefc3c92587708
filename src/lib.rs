//! Show Harvester - record the episodes of a show into a media library
//!
//! This library discovers the episodes listed on a show's web page, resolves
//! the best quality stream of every episode through the chain of documents the
//! site publishes (episode page, media description, rendition manifest) and
//! records it to a deterministic location using an external capture tool.

mod capture;
mod config;
mod fetch;
mod file_operations;
mod listing;
mod media;
mod numbering;
mod temp;

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

// Re-export pipeline stages
pub use capture::{CaptureError, ExternalCaptureTool, StreamCapturer, run_rescan_hook};
pub use config::{
    ConfigError, DEFAULT_CAPTURE_TOOL, DEFAULT_CONTAINER, DEFAULT_SITE, HarvestConfig,
};
pub use fetch::{DocumentFetcher, FetchError, FetchOptions, HttpFetcher};
pub use file_operations::{DownloadTarget, format_filename, sanitize_filename};
pub use listing::{EpisodeReference, ListingError, extract_episodes};
pub use media::{
    MediaDescriptor, PlaylistError, Rendition, StreamSelectionError, decode_descriptor,
    decode_manifest, locate_descriptor_reference, resolve_playlist, select_best_rendition,
    select_best_stream,
};
pub use numbering::{
    EpisodeNumbering, LabelPatternExtractor, NumberComponent, NumberingError, NumberingExtractor,
};

/// Stage of the per-episode pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeStage {
    /// Fetching the episode's own page
    EpisodePage,
    /// Reading season and episode number from the page
    Numbering,
    /// Resolving the media description
    Playlist,
    /// Resolving the rendition manifest and picking the stream
    StreamSelection,
    /// Recording the stream
    Capture,
}

impl fmt::Display for EpisodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EpisodeStage::EpisodePage => "episode page",
            EpisodeStage::Numbering => "numbering",
            EpisodeStage::Playlist => "playlist",
            EpisodeStage::StreamSelection => "stream selection",
            EpisodeStage::Capture => "capture",
        };
        f.write_str(name)
    }
}

/// Coarse classification of what went wrong with an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A fetch failed or returned a non-success status
    Transport,
    /// A document could not be parsed as its expected format
    Parse,
    /// A parsed document lacked an expected element or value
    Extraction,
    /// A referenced document was empty or structurally incomplete
    Resolution,
    /// Recording or publishing the stream failed
    Capture,
}

/// Error that ends the processing of a single episode
#[derive(Debug, Error)]
pub enum EpisodeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Numbering(#[from] NumberingError),

    #[error(transparent)]
    Playlist(#[from] PlaylistError),

    #[error(transparent)]
    StreamSelection(#[from] StreamSelectionError),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

impl EpisodeError {
    /// Classifies the error
    pub fn category(&self) -> ErrorCategory {
        match self {
            EpisodeError::Fetch(_) => ErrorCategory::Transport,
            EpisodeError::Numbering(NumberingError::InvalidDocument(_)) => ErrorCategory::Parse,
            EpisodeError::Numbering(_) => ErrorCategory::Extraction,
            EpisodeError::Playlist(error) => match error {
                PlaylistError::InvalidDocument(_) | PlaylistError::Decode(_) => {
                    ErrorCategory::Parse
                }
                PlaylistError::MissingPlayerReference => ErrorCategory::Extraction,
                PlaylistError::Fetch(_) => ErrorCategory::Transport,
                PlaylistError::MissingManifestReference => ErrorCategory::Resolution,
            },
            EpisodeError::StreamSelection(error) => match error {
                StreamSelectionError::Fetch(_) => ErrorCategory::Transport,
                StreamSelectionError::Decode(_) => ErrorCategory::Parse,
                StreamSelectionError::MissingManifestReference
                | StreamSelectionError::NoRenditions
                | StreamSelectionError::EmptySourceUrl { .. } => ErrorCategory::Resolution,
            },
            EpisodeError::Capture(_) => ErrorCategory::Capture,
        }
    }
}

/// Terminal failure of an episode, tagged with the stage it happened in
#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct EpisodeFailure {
    pub stage: EpisodeStage,
    #[source]
    pub error: EpisodeError,
}

/// Successful end states of an episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpisodeOutcome {
    /// The stream was recorded to the target destination
    Captured {
        target: DownloadTarget,
        stream_url: String,
    },

    /// The destination already existed, nothing was fetched or recorded
    SkippedExisting { target: DownloadTarget },

    /// The stream was resolved but not recorded (dry run)
    Resolved {
        target: DownloadTarget,
        stream_url: String,
    },
}

impl EpisodeOutcome {
    /// Download target the outcome refers to
    pub fn target(&self) -> &DownloadTarget {
        match self {
            EpisodeOutcome::Captured { target, .. }
            | EpisodeOutcome::SkippedExisting { target }
            | EpisodeOutcome::Resolved { target, .. } => target,
        }
    }
}

/// What happened to one listed episode
#[derive(Debug)]
pub struct EpisodeReport {
    pub reference: EpisodeReference,
    pub result: Result<EpisodeOutcome, EpisodeFailure>,
}

/// Result of a complete run over a show's listing
#[derive(Debug)]
pub struct HarvestSummary {
    /// Listing page the episodes were taken from
    pub show_url: String,
    /// One report per listed episode, in listing order
    pub episodes: Vec<EpisodeReport>,
}

impl HarvestSummary {
    fn count(&self, predicate: impl Fn(&Result<EpisodeOutcome, EpisodeFailure>) -> bool) -> usize {
        self.episodes.iter().filter(|report| predicate(&report.result)).count()
    }

    pub fn captured_count(&self) -> usize {
        self.count(|result| matches!(result, Ok(EpisodeOutcome::Captured { .. })))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|result| matches!(result, Ok(EpisodeOutcome::SkippedExisting { .. })))
    }

    pub fn resolved_count(&self) -> usize {
        self.count(|result| matches!(result, Ok(EpisodeOutcome::Resolved { .. })))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|result| result.is_err())
    }
}

/// Progress event emitted during a harvest
///
/// These events allow library users to track progress and provide feedback
/// while episodes move through the pipeline.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Harvest started
    Started { show_url: String },

    /// Episode listing extracted
    EpisodesFound { count: usize },

    /// Processing of a listed episode begins
    ProcessingEpisode {
        index: usize,
        total: usize,
        show_name: String,
        title: String,
    },

    /// Season and episode number determined
    NumberingResolved { season: u32, episode: u32 },

    /// Destination path computed
    DestinationComputed { destination: PathBuf },

    /// Destination already exists, episode skipped
    SkippedExisting { destination: PathBuf },

    /// Media description resolved
    PlaylistResolved { manifest_url: String },

    /// Best stream selected
    StreamResolved { stream_url: String },

    /// Stream recorded to its destination
    Captured { destination: PathBuf, bytes: u64 },

    /// Episode abandoned
    EpisodeFailed {
        title: String,
        stage: EpisodeStage,
        category: ErrorCategory,
        message: String,
    },

    /// Library rescan started for a show directory
    Rescanning { directory: PathBuf },

    /// Library rescan failed
    RescanFailed { directory: PathBuf, message: String },

    /// Harvest complete
    Complete {
        captured: usize,
        skipped: usize,
        resolved: usize,
        failed: usize,
    },
}

/// Top-level error type ending a whole harvest run
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The show page could not be retrieved
    #[error("Transport error: {0}")]
    Fetch(#[from] FetchError),

    /// No episodes could be identified at all
    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),
}

/// Builds the mapper tagging an error with the stage it occurred in
fn failed_at<E: Into<EpisodeError>>(stage: EpisodeStage) -> impl FnOnce(E) -> EpisodeFailure {
    move |error| EpisodeFailure {
        stage,
        error: error.into(),
    }
}

/// Runs the resolution pipeline for every episode of a show.
///
/// Episodes are processed strictly one after another. A failing episode is
/// reported and skipped, only configuration problems and a listing that
/// cannot be fetched or parsed end the run.
pub struct Harvester<F, C> {
    fetcher: F,
    capturer: C,
    numbering: Box<dyn NumberingExtractor>,
}

impl<F, C> Harvester<F, C>
where
    F: DocumentFetcher,
    C: StreamCapturer,
{
    /// Creates a harvester reading Dutch season/episode labels.
    pub fn new(fetcher: F, capturer: C) -> Self {
        Self {
            fetcher,
            capturer,
            numbering: Box::new(LabelPatternExtractor::dutch()),
        }
    }

    /// Replaces the strategy used to read episode numbering.
    pub fn with_numbering_extractor(
        mut self,
        extractor: impl NumberingExtractor + 'static,
    ) -> Self {
        self.numbering = Box::new(extractor);
        self
    }

    /// Harvests all episodes listed on the configured show page.
    ///
    /// Progress events are emitted through the provided callback, allowing
    /// library users to display status or remain silent.
    pub fn run<P>(
        &self,
        config: &HarvestConfig,
        mut progress: P,
    ) -> Result<HarvestSummary, HarvestError>
    where
        P: FnMut(ProgressEvent),
    {
        config.validate()?;
        let show_url = config.show_url()?;

        info!(url = %show_url, "scraping show");
        progress(ProgressEvent::Started {
            show_url: show_url.clone(),
        });

        let listing = self.fetcher.fetch(&show_url)?;
        let references = extract_episodes(&listing, &show_url)?;

        info!(count = references.len(), show = %config.show, "found episodes");
        progress(ProgressEvent::EpisodesFound {
            count: references.len(),
        });

        let total = references.len();
        let mut episodes = Vec::with_capacity(total);

        for (index, reference) in references.into_iter().enumerate() {
            progress(ProgressEvent::ProcessingEpisode {
                index,
                total,
                show_name: reference.show_name.clone(),
                title: reference.title.clone(),
            });

            let result = self.process_episode(config, &reference, &mut progress);

            if let Err(failure) = &result {
                warn!(
                    show = %reference.show_name,
                    title = %reference.title,
                    url = %reference.source_url,
                    stage = %failure.stage,
                    error = %failure.error,
                    "episode failed"
                );
                progress(ProgressEvent::EpisodeFailed {
                    title: reference.title.clone(),
                    stage: failure.stage,
                    category: failure.error.category(),
                    message: failure.error.to_string(),
                });
            }

            episodes.push(EpisodeReport { reference, result });
        }

        let summary = HarvestSummary { show_url, episodes };

        if let Some(command) = &config.rescan_command {
            self.rescan(command, &summary, &mut progress);
        }

        progress(ProgressEvent::Complete {
            captured: summary.captured_count(),
            skipped: summary.skipped_count(),
            resolved: summary.resolved_count(),
            failed: summary.failed_count(),
        });

        Ok(summary)
    }

    /// Moves a single episode through the pipeline.
    ///
    /// Returns the terminal success state or the stage that failed. The
    /// playlist is only resolved when the destination does not exist yet.
    pub fn process_episode<P>(
        &self,
        config: &HarvestConfig,
        reference: &EpisodeReference,
        progress: &mut P,
    ) -> Result<EpisodeOutcome, EpisodeFailure>
    where
        P: FnMut(ProgressEvent),
    {
        let page = self
            .fetcher
            .fetch(&reference.source_url)
            .map_err(failed_at(EpisodeStage::EpisodePage))?;

        let numbering = self
            .numbering
            .extract_numbering(&page)
            .map_err(failed_at(EpisodeStage::Numbering))?;
        progress(ProgressEvent::NumberingResolved {
            season: numbering.season,
            episode: numbering.episode,
        });

        let target =
            DownloadTarget::new(&config.media_root, reference, numbering, &config.container);
        progress(ProgressEvent::DestinationComputed {
            destination: target.destination.clone(),
        });

        if target.exists() {
            info!(destination = %target.destination.display(), "file already exists");
            progress(ProgressEvent::SkippedExisting {
                destination: target.destination.clone(),
            });
            return Ok(EpisodeOutcome::SkippedExisting { target });
        }

        let descriptor = resolve_playlist(&self.fetcher, &reference.source_url, &page)
            .map_err(failed_at(EpisodeStage::Playlist))?;
        progress(ProgressEvent::PlaylistResolved {
            manifest_url: descriptor.manifest_url.clone(),
        });

        let stream_url = select_best_stream(&self.fetcher, &descriptor)
            .map_err(failed_at(EpisodeStage::StreamSelection))?;
        info!(stream = %stream_url, "best stream");
        progress(ProgressEvent::StreamResolved {
            stream_url: stream_url.clone(),
        });

        if config.dry_run {
            return Ok(EpisodeOutcome::Resolved { target, stream_url });
        }

        self.capturer
            .capture(&stream_url, &target.destination)
            .map_err(failed_at(EpisodeStage::Capture))?;

        let bytes = fs::metadata(&target.destination)
            .map(|metadata| metadata.len())
            .unwrap_or(0);
        progress(ProgressEvent::Captured {
            destination: target.destination.clone(),
            bytes,
        });

        Ok(EpisodeOutcome::Captured { target, stream_url })
    }

    /// Runs the rescan command once for every show directory that received a recording.
    fn rescan<P>(&self, command: &std::path::Path, summary: &HarvestSummary, progress: &mut P)
    where
        P: FnMut(ProgressEvent),
    {
        let directories: BTreeSet<PathBuf> = summary
            .episodes
            .iter()
            .filter_map(|report| match &report.result {
                Ok(outcome @ EpisodeOutcome::Captured { .. }) => {
                    outcome.target().show_directory().map(|dir| dir.to_path_buf())
                }
                _ => None,
            })
            .collect();

        for directory in directories {
            progress(ProgressEvent::Rescanning {
                directory: directory.clone(),
            });

            if let Err(e) = run_rescan_hook(command, &directory) {
                warn!(directory = %directory.display(), error = %e, "library rescan failed");
                progress(ProgressEvent::RescanFailed {
                    directory,
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Harvests a show using HTTP for fetching and the configured capture tool.
///
/// # Examples
///
/// ```no_run
/// use show_harvester::{harvest_show, HarvestConfig, ProgressEvent};
///
/// let config = HarvestConfig::new("spongebob", "/srv/media/kids");
/// let summary = harvest_show(&config, |event| {
///     if let ProgressEvent::StreamResolved { stream_url } = event {
///         println!("Recording {}", stream_url);
///     }
/// })
/// .unwrap();
///
/// println!("{} new episode(s)", summary.captured_count());
/// ```
pub fn harvest_show<P>(config: &HarvestConfig, progress: P) -> Result<HarvestSummary, HarvestError>
where
    P: FnMut(ProgressEvent),
{
    config.validate()?;

    let fetcher = HttpFetcher::new(&config.fetch)?;
    let capturer = ExternalCaptureTool::new(&config.capture_tool, &config.scratch_dir);

    Harvester::new(fetcher, capturer).run(config, progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let transport = EpisodeError::from(FetchError::Status {
            url: "http://x".to_string(),
            status: 500,
        });
        assert_eq!(transport.category(), ErrorCategory::Transport);

        let parse = EpisodeError::from(StreamSelectionError::Decode("bad".to_string()));
        assert_eq!(parse.category(), ErrorCategory::Parse);

        let extraction = EpisodeError::from(NumberingError::MissingLabel);
        assert_eq!(extraction.category(), ErrorCategory::Extraction);

        let extraction = EpisodeError::from(PlaylistError::MissingPlayerReference);
        assert_eq!(extraction.category(), ErrorCategory::Extraction);

        let resolution = EpisodeError::from(StreamSelectionError::NoRenditions);
        assert_eq!(resolution.category(), ErrorCategory::Resolution);

        let resolution = EpisodeError::from(StreamSelectionError::EmptySourceUrl {
            bitrate: "800".to_string(),
        });
        assert_eq!(resolution.category(), ErrorCategory::Resolution);
    }

    #[test]
    fn test_failure_message_names_stage() {
        let failure = failed_at(EpisodeStage::StreamSelection)(StreamSelectionError::NoRenditions);

        assert_eq!(failure.stage, EpisodeStage::StreamSelection);
        assert_eq!(
            failure.to_string(),
            "stream selection failed: No renditions found in manifest"
        );
    }

    #[test]
    fn test_summary_counts() {
        let reference = EpisodeReference {
            source_url: "http://x/e/1".to_string(),
            title: "Pilot".to_string(),
            show_name: "ShowX".to_string(),
        };
        let target = DownloadTarget::new(
            std::path::Path::new("/media"),
            &reference,
            EpisodeNumbering { season: 1, episode: 1 },
            "mp4",
        );

        let summary = HarvestSummary {
            show_url: "http://nickelodeon.be/showx".to_string(),
            episodes: vec![
                EpisodeReport {
                    reference: reference.clone(),
                    result: Ok(EpisodeOutcome::SkippedExisting {
                        target: target.clone(),
                    }),
                },
                EpisodeReport {
                    reference: reference.clone(),
                    result: Ok(EpisodeOutcome::Captured {
                        target,
                        stream_url: "http://x/high.flv".to_string(),
                    }),
                },
                EpisodeReport {
                    reference,
                    result: Err(failed_at(EpisodeStage::Numbering)(NumberingError::MissingLabel)),
                },
            ],
        };

        assert_eq!(summary.captured_count(), 1);
        assert_eq!(summary.skipped_count(), 1);
        assert_eq!(summary.resolved_count(), 0);
        assert_eq!(summary.failed_count(), 1);
    }
}
