//! Episode listing extraction
//!
//! Parses the HTML page of a show into the list of episodes it links to.
//! Entries that are structurally incomplete are skipped, only a document that
//! is not a page at all fails the extraction.

use crate::fetch::{page_text, resolve_reference};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

static ENTRY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.fullepisode.playlist-item").expect("valid selector"));
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid selector"));
static POSTER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid selector"));
static SHOW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.title").expect("valid selector"));

/// Errors that can occur while extracting the episode listing
#[derive(Debug, Error)]
pub enum ListingError {
    /// The listing document is not a readable page
    #[error("Could not parse episodes page: {0}")]
    InvalidDocument(String),
}

/// An episode as advertised on the show's listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeReference {
    /// Absolute URL of the episode's own page
    pub source_url: String,
    /// Display title of the episode
    pub title: String,
    /// Name of the show the episode belongs to
    pub show_name: String,
}

/// Extracts all complete episode entries from a listing document.
///
/// Each `li.fullepisode.playlist-item` must carry a link, a poster image with
/// a `title` attribute and a `p.title` label holding the show name. Entries
/// missing any of these are logged and skipped. Relative links are resolved
/// against `base_url`. The returned references keep document order.
///
/// Pages that are not valid UTF-8 are read as Latin-1. Only a binary body
/// fails with `ListingError::InvalidDocument`.
pub fn extract_episodes(
    document: &[u8],
    base_url: &str,
) -> Result<Vec<EpisodeReference>, ListingError> {
    let text = page_text(document).map_err(ListingError::InvalidDocument)?;

    let html = Html::parse_document(&text);

    let episodes: Vec<EpisodeReference> = html
        .select(&ENTRY_SELECTOR)
        .filter_map(|entry| parse_entry(entry, base_url))
        .collect();

    debug!(count = episodes.len(), "extracted episode references");
    Ok(episodes)
}

/// Turns one listing entry into a reference, or None if it is incomplete.
fn parse_entry(entry: ElementRef<'_>, base_url: &str) -> Option<EpisodeReference> {
    let link = entry.select(&LINK_SELECTOR).next();
    let Some(href) = link.and_then(|a| a.value().attr("href")) else {
        let label = link
            .map(|a| a.text().collect::<String>())
            .unwrap_or_default();
        warn!(entry = label.trim(), "no episode url found, skipping entry");
        return None;
    };

    let Some(title) = entry
        .select(&POSTER_SELECTOR)
        .next()
        .and_then(|img| img.value().attr("title"))
    else {
        warn!(href, "no episode title found, skipping entry");
        return None;
    };

    let show_name = entry
        .select(&SHOW_SELECTOR)
        .next()
        .map(|p| p.text().collect::<String>())
        .unwrap_or_default();
    let show_name = show_name.trim();
    if show_name.is_empty() {
        warn!(href, "could not extract show name, skipping entry");
        return None;
    }

    Some(EpisodeReference {
        source_url: resolve_reference(base_url, href),
        title: title.trim().to_string(),
        show_name: show_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://nickelodeon.be/spongebob";

    fn entry(href: Option<&str>, title: Option<&str>, show: Option<&str>) -> String {
        let link = match href {
            Some(href) => format!(r#"<a href="{href}">watch</a>"#),
            None => "<a>watch</a>".to_string(),
        };
        let poster = match title {
            Some(title) => format!(r#"<img src="poster.jpg" title="{title}">"#),
            None => r#"<img src="poster.jpg">"#.to_string(),
        };
        let label = match show {
            Some(show) => format!(r#"<p class="title">{show}</p>"#),
            None => String::new(),
        };
        format!(r#"<li class="fullepisode playlist-item">{link}{poster}{label}</li>"#)
    }

    fn listing(entries: &[String]) -> Vec<u8> {
        format!(
            r#"<html><body><ol class="playlist">{}</ol></body></html>"#,
            entries.concat()
        )
        .into_bytes()
    }

    #[test]
    fn test_extracts_complete_entries() {
        let page = listing(&[
            entry(Some("http://x/e/1"), Some("Pilot"), Some("ShowX")),
            entry(Some("http://x/e/2"), Some("Second"), Some(" ShowX \n")),
        ]);

        let episodes = extract_episodes(&page, BASE).unwrap();

        assert_eq!(
            episodes,
            vec![
                EpisodeReference {
                    source_url: "http://x/e/1".to_string(),
                    title: "Pilot".to_string(),
                    show_name: "ShowX".to_string(),
                },
                EpisodeReference {
                    source_url: "http://x/e/2".to_string(),
                    title: "Second".to_string(),
                    show_name: "ShowX".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_skips_malformed_entries_and_keeps_order() {
        let page = listing(&[
            entry(None, Some("No Link"), Some("ShowX")),
            entry(Some("http://x/e/1"), Some("First"), Some("ShowX")),
            entry(Some("http://x/e/bad"), None, Some("ShowX")),
            entry(Some("http://x/e/2"), Some("Second"), Some("ShowX")),
            entry(Some("http://x/e/nolabel"), Some("No Label"), None),
            entry(Some("http://x/e/empty"), Some("Empty Label"), Some("   ")),
            entry(Some("http://x/e/3"), Some("Third"), Some("ShowX")),
        ]);

        let episodes = extract_episodes(&page, BASE).unwrap();
        let titles: Vec<&str> = episodes.iter().map(|e| e.title.as_str()).collect();

        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_ignores_items_that_are_not_full_episodes() {
        let page = format!(
            r#"<ol>
                <li class="clip playlist-item">
                    <a href="/c/1">c</a><img title="Clip"><p class="title">ShowX</p>
                </li>
                {}
            </ol>"#,
            entry(Some("/e/1"), Some("Pilot"), Some("ShowX"))
        );

        let episodes = extract_episodes(page.as_bytes(), BASE).unwrap();

        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].title, "Pilot");
    }

    #[test]
    fn test_resolves_relative_links() {
        let page = listing(&[entry(Some("/episodes/pilot"), Some("Pilot"), Some("ShowX"))]);

        let episodes = extract_episodes(&page, BASE).unwrap();

        assert_eq!(episodes[0].source_url, "http://nickelodeon.be/episodes/pilot");
    }

    #[test]
    fn test_empty_listing_yields_no_episodes() {
        let episodes = extract_episodes(b"<html><body></body></html>", BASE).unwrap();
        assert!(episodes.is_empty());
    }

    #[test]
    fn test_latin1_document_is_read() {
        let mut page = b"<html><head><title>Caf\xe9</title></head><body>".to_vec();
        page.extend_from_slice(
            b"<li class=\"fullepisode playlist-item\"><a href=\"http://x/e/1\">watch</a>\
              <img src=\"poster.jpg\" title=\"Caf\xe9 Noir\"><p class=\"title\">ShowX</p></li>",
        );
        page.extend_from_slice(b"</body></html>");

        let episodes = extract_episodes(&page, BASE).unwrap();

        assert_eq!(
            episodes,
            vec![EpisodeReference {
                source_url: "http://x/e/1".to_string(),
                title: "Caf\u{e9} Noir".to_string(),
                show_name: "ShowX".to_string(),
            }]
        );
    }

    #[test]
    fn test_binary_document_fails() {
        let result = extract_episodes(&[0xff, 0xfe, 0x00, 0xc3], BASE);
        assert!(matches!(result, Err(ListingError::InvalidDocument(_))));
    }
}
