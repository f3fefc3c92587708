/// XML document types for deserialization.
///
/// These structures mirror the media description (MRSS) and rendition
/// manifest formats. Element and attribute names are matched without their
/// namespace prefix, so `media:content` deserializes into `content`.
use serde::Deserialize;

/// Root of a media description document (`<rss>`).
#[derive(Debug, Deserialize)]
pub(super) struct RssDocument {
    pub channel: Option<RssChannel>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RssChannel {
    /// Playable items, only the first one describes the episode
    #[serde(default, rename = "item")]
    pub items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RssItem {
    /// Plain and `media:` titles share the local name `title`
    #[serde(default, rename = "title")]
    pub titles: Vec<String>,
    pub group: Option<MediaGroup>,
}

/// The `media:group` of an item.
#[derive(Debug, Deserialize)]
pub(super) struct MediaGroup {
    #[serde(default, rename = "content")]
    pub contents: Vec<MediaContent>,
    pub player: Option<MediaPlayer>,
}

/// A `media:content` element referencing the rendition manifest.
#[derive(Debug, Deserialize)]
pub(super) struct MediaContent {
    #[serde(rename = "@url")]
    pub url: Option<String>,
    #[serde(rename = "@duration")]
    pub duration: Option<String>,
    #[serde(rename = "@type")]
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MediaPlayer {
    #[serde(rename = "@url")]
    pub url: Option<String>,
}

/// Root of a rendition manifest (`<package>`).
#[derive(Debug, Deserialize)]
pub(super) struct ManifestPackage {
    pub video: Option<ManifestVideo>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ManifestVideo {
    #[serde(default, rename = "item")]
    pub items: Vec<ManifestItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ManifestItem {
    #[serde(default, rename = "rendition")]
    pub renditions: Vec<RenditionRecord>,
}

/// A single `rendition` element.
///
/// Numeric attributes are kept as text, a malformed value must not reject
/// the whole manifest.
#[derive(Debug, Deserialize)]
pub(super) struct RenditionRecord {
    #[serde(rename = "@bitrate")]
    pub bitrate: Option<String>,
    #[serde(rename = "@width")]
    pub width: Option<String>,
    #[serde(rename = "@height")]
    pub height: Option<String>,
    #[serde(rename = "@duration")]
    pub duration: Option<String>,
    #[serde(rename = "@type")]
    pub content_type: Option<String>,
    #[serde(rename = "@cdn")]
    pub cdn: Option<String>,
    /// Stream URL, as text or CDATA
    pub src: Option<String>,
}
