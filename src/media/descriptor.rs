//! Media description resolution
//!
//! Locates the media description reference on an episode page, fetches it and
//! decodes the XML into a `MediaDescriptor`.

use super::documents::RssDocument;
use super::{MediaDescriptor, root_element};
use crate::fetch::{DocumentFetcher, FetchError, page_text, resolve_reference};
use scraper::{Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

static PLAYER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.player-wrapper").expect("valid selector"));

/// Attribute of the player element holding the media description reference
const PLAYER_REFERENCE_ATTRIBUTE: &str = "data-mrss";

/// Errors that can occur while resolving the media description
#[derive(Debug, Error)]
pub enum PlaylistError {
    /// The episode page is not a readable page
    #[error("Could not parse episode page for playlist reference: {0}")]
    InvalidDocument(String),

    /// No player element with a media description reference was found
    #[error("Could not find a playlist reference on the episode page")]
    MissingPlayerReference,

    /// Fetching the media description failed
    #[error("Could not fetch playlist: {0}")]
    Fetch(#[from] FetchError),

    /// The media description is not a well-formed document of the expected shape
    #[error("Could not decode playlist: {0}")]
    Decode(String),

    /// The media description does not reference a rendition manifest
    #[error("Playlist does not reference a rendition manifest")]
    MissingManifestReference,
}

/// Finds the media description reference embedded in an episode page.
///
/// The reference is returned exactly as found on the page (trimmed).
pub fn locate_descriptor_reference(episode_document: &[u8]) -> Result<String, PlaylistError> {
    let text = page_text(episode_document).map_err(PlaylistError::InvalidDocument)?;

    let html = Html::parse_document(&text);

    html.select(&PLAYER_SELECTOR)
        .filter_map(|player| player.value().attr(PLAYER_REFERENCE_ATTRIBUTE))
        .map(str::trim)
        .find(|reference| !reference.is_empty())
        .map(str::to_string)
        .ok_or(PlaylistError::MissingPlayerReference)
}

/// Resolves the media description of an episode.
///
/// Locates the player reference on the episode page, fetches the referenced
/// document and decodes it. References are resolved relative to the document
/// they appear in. A failure at any step aborts resolution without retrying.
pub fn resolve_playlist<F>(
    fetcher: &F,
    episode_url: &str,
    episode_document: &[u8],
) -> Result<MediaDescriptor, PlaylistError>
where
    F: DocumentFetcher + ?Sized,
{
    let reference = locate_descriptor_reference(episode_document)?;
    let descriptor_url = resolve_reference(episode_url, &reference);
    debug!(url = %descriptor_url, "resolving playlist");

    let document = fetcher.fetch(&descriptor_url)?;
    let mut descriptor = decode_descriptor(&document)?;
    descriptor.manifest_url = resolve_reference(&descriptor_url, &descriptor.manifest_url);

    Ok(descriptor)
}

/// Decodes a media description document.
///
/// Expects an `rss` root whose channel carries a playable `item`. The item's
/// `group/content` element must carry a non-empty `url` attribute pointing at
/// the rendition manifest. Namespace prefixes are ignored. Only the first
/// item is considered.
pub fn decode_descriptor(document: &[u8]) -> Result<MediaDescriptor, PlaylistError> {
    let text = std::str::from_utf8(document).map_err(|e| PlaylistError::Decode(e.to_string()))?;

    let root = root_element(text).map_err(PlaylistError::Decode)?;
    if root != "rss" {
        return Err(PlaylistError::Decode(format!("unexpected root element <{root}>")));
    }

    let rss: RssDocument =
        quick_xml::de::from_str(text).map_err(|e| PlaylistError::Decode(e.to_string()))?;

    let item = rss
        .channel
        .and_then(|channel| channel.items.into_iter().next())
        .ok_or_else(|| PlaylistError::Decode("playlist contains no item".to_string()))?;

    let title = item
        .titles
        .into_iter()
        .map(|title| title.trim().to_string())
        .find(|title| !title.is_empty());

    let (content, player) = match item.group {
        Some(group) => (group.contents.into_iter().next(), group.player),
        None => (None, None),
    };
    let content = content.ok_or(PlaylistError::MissingManifestReference)?;

    let manifest_url = content
        .url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or(PlaylistError::MissingManifestReference)?;

    Ok(MediaDescriptor {
        title,
        manifest_url,
        duration: trimmed(content.duration),
        content_type: trimmed(content.content_type),
        player_url: trimmed(player.and_then(|player| player.url)),
    })
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string())
}
