use crate::listing::EpisodeReference;
use crate::numbering::EpisodeNumbering;
use std::path::{Path, PathBuf};

/// Where and under which name an episode is stored in the media library
///
/// The destination is derived once from the other fields and doubles as the
/// idempotence key: an existing file at `destination` means the episode has
/// been recorded before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub show: String,
    pub title: String,
    pub season: u32,
    pub episode: u32,
    /// Container extension without the dot
    pub container: String,
    /// `<media root>/<show>/<show> - <title> - SxxEyy.<container>`
    pub destination: PathBuf,
}

impl DownloadTarget {
    /// Computes the target of an episode below `media_root`.
    pub fn new(
        media_root: &Path,
        reference: &EpisodeReference,
        numbering: EpisodeNumbering,
        container: &str,
    ) -> Self {
        let filename =
            format_filename(&reference.show_name, &reference.title, numbering, container);

        let destination = media_root
            .join(sanitize_filename(&reference.show_name))
            .join(filename);

        Self {
            show: reference.show_name.clone(),
            title: reference.title.clone(),
            season: numbering.season,
            episode: numbering.episode,
            container: container.to_string(),
            destination,
        }
    }

    /// Whether a recording already exists at the destination
    pub fn exists(&self) -> bool {
        self.destination.exists()
    }

    /// Directory holding all recordings of the show
    pub fn show_directory(&self) -> Option<&Path> {
        self.destination.parent()
    }
}

/// Sanitizes a string for use in filenames by replacing problematic characters
///
/// Replaces characters that are invalid or problematic in filenames across platforms:
/// - Path separators: / \
/// - Reserved characters: : * ? " < > |
/// - Control characters
/// - Trim leading/trailing whitespace and dots
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();

    sanitized.trim_matches(|c: char| c.is_whitespace() || c == '.').to_string()
}

/// Formats the file name of a recorded episode
///
/// The layout is `<show> - <title> - S<season>E<episode>.<ext>` with season
/// and episode zero-padded to two digits. Show and title are sanitized and
/// otherwise taken verbatim.
///
/// # Examples
///
/// ```
/// use show_harvester::{EpisodeNumbering, format_filename};
///
/// let result = format_filename(
///     "SpongeBob",
///     "Pizza Delivery",
///     EpisodeNumbering { season: 1, episode: 3 },
///     "mp4",
/// );
/// assert_eq!(result, "SpongeBob - Pizza Delivery - S01E03.mp4");
/// ```
pub fn format_filename(
    show_name: &str,
    title: &str,
    numbering: EpisodeNumbering,
    extension: &str,
) -> String {
    format!(
        "{} - {} - S{:02}E{:02}.{}",
        sanitize_filename(show_name),
        sanitize_filename(title),
        numbering.season,
        numbering.episode,
        extension
    )
}
