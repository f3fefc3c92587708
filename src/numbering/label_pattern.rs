//! Label pattern based numbering extraction
//!
//! Reads a text label from the episode page and applies two independent
//! regular expressions to it, one for the season and one for the episode.
//! Because the patterns are matched separately, the tokens may appear in
//! either order within the label.

use super::{EpisodeNumbering, NumberComponent, NumberingError, NumberingExtractor};
use crate::fetch::page_text;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static DUTCH_LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h6.season-episode").expect("valid selector"));
static DUTCH_SEASON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Seizoen (\d+)").expect("valid regex"));
static DUTCH_EPISODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Aflevering (\d+)").expect("valid regex"));

/// Numbering extractor matching fixed-format tokens inside a page label.
///
/// The label is the first element matched by the selector that carries any
/// text. Both patterns must contain one capture group holding the number.
#[derive(Debug, Clone)]
pub struct LabelPatternExtractor {
    label: Selector,
    season: Regex,
    episode: Regex,
}

impl LabelPatternExtractor {
    /// Creates an extractor from a label selector and the two number patterns.
    pub fn new(label: Selector, season: Regex, episode: Regex) -> Self {
        Self {
            label,
            season,
            episode,
        }
    }

    /// Extractor for Dutch labels such as `Seizoen 2 - Aflevering 13`.
    pub fn dutch() -> Self {
        Self::new(
            DUTCH_LABEL.clone(),
            DUTCH_SEASON.clone(),
            DUTCH_EPISODE.clone(),
        )
    }

    /// Extracts the numbering from an already isolated label text.
    pub fn numbering_from_label(&self, label: &str) -> Result<EpisodeNumbering, NumberingError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(NumberingError::MissingLabel);
        }

        let episode = capture_number(&self.episode, label, NumberComponent::Episode)?;
        let season = capture_number(&self.season, label, NumberComponent::Season)?;

        Ok(EpisodeNumbering { season, episode })
    }
}

impl Default for LabelPatternExtractor {
    fn default() -> Self {
        Self::dutch()
    }
}

impl NumberingExtractor for LabelPatternExtractor {
    fn extract_numbering(&self, document: &[u8]) -> Result<EpisodeNumbering, NumberingError> {
        let text = page_text(document).map_err(NumberingError::InvalidDocument)?;

        let html = Html::parse_document(&text);
        let label = html
            .select(&self.label)
            .map(|element| element.text().collect::<String>())
            .find(|label| !label.trim().is_empty())
            .unwrap_or_default();

        self.numbering_from_label(&label)
    }
}

/// Applies one pattern to the label and parses its captured number.
fn capture_number(
    pattern: &Regex,
    label: &str,
    component: NumberComponent,
) -> Result<u32, NumberingError> {
    let digits = pattern
        .captures(label)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| NumberingError::PatternNotMatched {
            component,
            label: label.to_string(),
        })?
        .as_str();

    match digits.parse::<u32>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(NumberingError::InvalidNumber {
            component,
            value: digits.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(label: &str) -> Vec<u8> {
        format!(
            r#"<html><body><div class="meta">
                <h6 class="season-episode">{label}</h6>
            </div></body></html>"#
        )
        .into_bytes()
    }

    #[test]
    fn test_season_before_episode() {
        let numbering = LabelPatternExtractor::dutch()
            .extract_numbering(&page("Seizoen 2 - Aflevering 13"))
            .unwrap();
        assert_eq!(numbering, EpisodeNumbering { season: 2, episode: 13 });
    }

    #[test]
    fn test_episode_before_season() {
        let numbering = LabelPatternExtractor::dutch()
            .extract_numbering(&page("Aflevering 7, Seizoen 4"))
            .unwrap();
        assert_eq!(numbering, EpisodeNumbering { season: 4, episode: 7 });
    }

    #[test]
    fn test_label_is_trimmed_and_surrounded_by_text() {
        let numbering = LabelPatternExtractor::dutch()
            .extract_numbering(&page("\n   Nu te zien: Seizoen 1 Aflevering 3 (herhaling)   \n"))
            .unwrap();
        assert_eq!(numbering, EpisodeNumbering { season: 1, episode: 3 });
    }

    #[test]
    fn test_missing_label_fails() {
        let other_page = br#"<html><body><h6 class="other">Seizoen 1 Aflevering 2</h6></body></html>"#;
        let result = LabelPatternExtractor::dutch().extract_numbering(other_page);
        assert!(matches!(result, Err(NumberingError::MissingLabel)));

        let result = LabelPatternExtractor::dutch().extract_numbering(&page("   "));
        assert!(matches!(result, Err(NumberingError::MissingLabel)));
    }

    #[test]
    fn test_missing_season_token_fails() {
        let result = LabelPatternExtractor::dutch().extract_numbering(&page("Aflevering 13"));
        assert!(matches!(
            result,
            Err(NumberingError::PatternNotMatched {
                component: NumberComponent::Season,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_episode_token_fails() {
        let result = LabelPatternExtractor::dutch().extract_numbering(&page("Seizoen 2"));
        assert!(matches!(
            result,
            Err(NumberingError::PatternNotMatched {
                component: NumberComponent::Episode,
                ..
            })
        ));
    }

    #[test]
    fn test_out_of_range_numbers_fail() {
        let result = LabelPatternExtractor::dutch()
            .extract_numbering(&page("Seizoen 99999999999 - Aflevering 1"));
        assert!(matches!(
            result,
            Err(NumberingError::InvalidNumber {
                component: NumberComponent::Season,
                ..
            })
        ));

        let result =
            LabelPatternExtractor::dutch().extract_numbering(&page("Seizoen 1 - Aflevering 0"));
        assert!(matches!(
            result,
            Err(NumberingError::InvalidNumber {
                component: NumberComponent::Episode,
                ..
            })
        ));
    }

    #[test]
    fn test_skips_empty_labels() {
        let page = br#"<html><body>
            <h6 class="season-episode"> </h6>
            <h6 class="season-episode">Seizoen 3 - Aflevering 8</h6>
        </body></html>"#;

        let numbering = LabelPatternExtractor::dutch().extract_numbering(page).unwrap();

        assert_eq!(numbering, EpisodeNumbering { season: 3, episode: 8 });
    }

    #[test]
    fn test_latin1_page() {
        let page = b"<html><head><title>\xc9pisode</title></head><body>\
            <h6 class=\"season-episode\">Seizoen 1 - Aflevering 4</h6></body></html>";

        let numbering = LabelPatternExtractor::dutch().extract_numbering(page).unwrap();

        assert_eq!(numbering, EpisodeNumbering { season: 1, episode: 4 });
    }

    #[test]
    fn test_binary_page_fails() {
        let result = LabelPatternExtractor::dutch().extract_numbering(&[0x00, 0x01, 0x02]);
        assert!(matches!(result, Err(NumberingError::InvalidDocument(_))));
    }

    #[test]
    fn test_custom_grammar() {
        let extractor = LabelPatternExtractor::new(
            Selector::parse("span.numbering").unwrap(),
            Regex::new(r"Season (\d+)").unwrap(),
            Regex::new(r"Episode (\d+)").unwrap(),
        );

        let numbering = extractor
            .extract_numbering(b"<span class=\"numbering\">Episode 5 of Season 3</span>")
            .unwrap();
        assert_eq!(numbering, EpisodeNumbering { season: 3, episode: 5 });
    }

    #[test]
    fn test_numbering_from_label() {
        let numbering = LabelPatternExtractor::default()
            .numbering_from_label("Seizoen 10 - Aflevering 02")
            .unwrap();
        assert_eq!(numbering, EpisodeNumbering { season: 10, episode: 2 });
    }
}
