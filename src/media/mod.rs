//! Media description and rendition manifest handling
//!
//! An episode page embeds a reference to a media description document, which
//! in turn references a rendition manifest listing the available encodings of
//! the stream. This module resolves that chain down to a single stream URL.

mod descriptor;
mod documents;
mod manifest;

pub use descriptor::{
    PlaylistError, decode_descriptor, locate_descriptor_reference, resolve_playlist,
};
pub use manifest::{
    StreamSelectionError, decode_manifest, select_best_rendition, select_best_stream,
};

use quick_xml::Reader;
use quick_xml::events::Event;

/// Typed view of a media description document.
///
/// Only `manifest_url` is required; it is guaranteed non-empty for values
/// produced by `decode_descriptor`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaDescriptor {
    /// Title of the playable item
    pub title: Option<String>,
    /// Reference to the rendition manifest
    pub manifest_url: String,
    /// Duration as advertised by the descriptor
    pub duration: Option<String>,
    /// Content type of the referenced media
    pub content_type: Option<String>,
    /// Reference to the web player, if any
    pub player_url: Option<String>,
}

/// One encoded variant of a stream, as listed in the rendition manifest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rendition {
    /// Bitrate parsed to an integer, None when the manifest value is not numeric
    pub bitrate: Option<u64>,
    /// Bitrate as it appeared in the manifest, trimmed
    pub raw_bitrate: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Duration in seconds
    pub duration: Option<u64>,
    /// Container type, e.g. `video/x-flv`
    pub content_type: Option<String>,
    pub cdn: Option<String>,
    /// Stream URL of this rendition
    pub source_url: String,
}

/// Local (prefix free) name of a document's root element.
///
/// Fails on malformed markup before the root and on documents without any
/// element.
pub(crate) fn root_element(text: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(text);

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                return Ok(String::from_utf8_lossy(element.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => return Err("document has no root element".to_string()),
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "malformed XML at position {}: {}",
                    reader.error_position(),
                    e
                ));
            }
        }
    }
}

/// Parses a bitrate the way the manifest encodes it.
///
/// Surrounding whitespace and leading zeros are accepted, anything else that
/// is not a plain decimal integer yields None. Values beyond `u64` saturate,
/// they still outrank every smaller bitrate.
pub(crate) fn parse_bitrate(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(raw.parse().unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bitrate() {
        assert_eq!(parse_bitrate("1200"), Some(1200));
        assert_eq!(parse_bitrate(" 0800 "), Some(800));
        assert_eq!(parse_bitrate("0"), Some(0));
        assert_eq!(parse_bitrate(""), None);
        assert_eq!(parse_bitrate("1200kbps"), None);
        assert_eq!(parse_bitrate("-5"), None);
        assert_eq!(parse_bitrate("+5"), None);
        assert_eq!(parse_bitrate("12.5"), None);
    }

    #[test]
    fn test_parse_bitrate_saturates() {
        assert_eq!(parse_bitrate("99999999999999999999"), Some(u64::MAX));
        assert_eq!(parse_bitrate("18446744073709551615"), Some(u64::MAX));
    }

    #[test]
    fn test_root_element() {
        assert_eq!(
            root_element(r#"<?xml version="1.0"?><!-- feed --><media:rss><channel/></media:rss>"#),
            Ok("rss".to_string())
        );
        assert_eq!(root_element("<package/>"), Ok("package".to_string()));
        assert!(root_element("").is_err());
        assert!(root_element("just some text").is_err());
    }
}
