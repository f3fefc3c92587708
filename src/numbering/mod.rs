//! Season and episode numbering extraction
//!
//! This module turns an episode page into its season/episode pair. The
//! matching strategy is hidden behind the `NumberingExtractor` trait so a
//! different label grammar can be plugged in without touching the pipeline.

mod label_pattern;

pub use label_pattern::LabelPatternExtractor;

use std::fmt;
use thiserror::Error;

/// Errors that can occur while extracting episode numbering
#[derive(Debug, Error)]
pub enum NumberingError {
    /// The episode document could not be parsed
    #[error("Could not parse episode page: {0}")]
    InvalidDocument(String),

    /// The page carries no (or an empty) numbering label
    #[error("Missing season/episode label")]
    MissingLabel,

    /// A numbering token was not found in the label
    #[error("Could not find {component} number in '{label}'")]
    PatternNotMatched {
        component: NumberComponent,
        label: String,
    },

    /// The matched number is not a valid positive integer
    #[error("Invalid {component} number: '{value}'")]
    InvalidNumber {
        component: NumberComponent,
        value: String,
    },
}

/// The two parts of an episode numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberComponent {
    Season,
    Episode,
}

impl fmt::Display for NumberComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberComponent::Season => f.write_str("season"),
            NumberComponent::Episode => f.write_str("episode"),
        }
    }
}

/// Season and episode number of a single episode. Both are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EpisodeNumbering {
    pub season: u32,
    pub episode: u32,
}

/// Trait for strategies that read the numbering from an episode page.
///
/// Extraction succeeds or fails as a unit: implementors never return a
/// numbering with only one of the two parts determined.
pub trait NumberingExtractor {
    /// Extracts the season/episode pair from the raw episode document.
    fn extract_numbering(&self, document: &[u8]) -> Result<EpisodeNumbering, NumberingError>;
}
