//! Rendition manifest decoding and stream selection

use super::documents::{ManifestPackage, RenditionRecord};
use super::{MediaDescriptor, Rendition, parse_bitrate, root_element};
use crate::fetch::{DocumentFetcher, FetchError};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while selecting the stream to capture
#[derive(Debug, Error)]
pub enum StreamSelectionError {
    /// The media descriptor carries no manifest reference
    #[error("Media descriptor does not reference a rendition manifest")]
    MissingManifestReference,

    /// Fetching the rendition manifest failed
    #[error("Could not fetch rendition manifest: {0}")]
    Fetch(#[from] FetchError),

    /// The manifest is not a well-formed document of the expected shape
    #[error("Could not decode rendition manifest: {0}")]
    Decode(String),

    /// The manifest lists no renditions at all
    #[error("No renditions found in manifest")]
    NoRenditions,

    /// The selected rendition has no stream URL
    #[error("Selected rendition (bitrate '{bitrate}') has an empty stream url")]
    EmptySourceUrl { bitrate: String },
}

/// Fetches the manifest referenced by `descriptor` and returns the stream URL
/// of its highest bitrate rendition.
pub fn select_best_stream<F>(
    fetcher: &F,
    descriptor: &MediaDescriptor,
) -> Result<String, StreamSelectionError>
where
    F: DocumentFetcher + ?Sized,
{
    let manifest_url = descriptor.manifest_url.trim();
    if manifest_url.is_empty() {
        return Err(StreamSelectionError::MissingManifestReference);
    }

    let document = fetcher.fetch(manifest_url)?;
    let renditions = decode_manifest(&document)?;

    let best = select_best_rendition(&renditions)
        .map(|index| &renditions[index])
        .ok_or(StreamSelectionError::NoRenditions)?;

    debug!(
        bitrate = %best.raw_bitrate,
        candidates = renditions.len(),
        "selected best rendition"
    );

    if best.source_url.is_empty() {
        return Err(StreamSelectionError::EmptySourceUrl {
            bitrate: best.raw_bitrate.clone(),
        });
    }

    Ok(best.source_url.clone())
}

/// Picks the index of the rendition with the highest bitrate.
///
/// A rendition replaces the running best only when its bitrate is strictly
/// greater, so the first one wins among equal bitrates. Renditions with a
/// non-numeric bitrate rank below all numeric ones. Returns None for an empty
/// slice.
pub fn select_best_rendition(renditions: &[Rendition]) -> Option<usize> {
    let mut best: Option<usize> = None;

    for (index, rendition) in renditions.iter().enumerate() {
        match best {
            None => best = Some(index),
            Some(current) if rendition.bitrate > renditions[current].bitrate => {
                best = Some(index)
            }
            Some(_) => {}
        }
    }

    best
}

/// Decodes a rendition manifest into its renditions, in document order.
///
/// Expects a `package` root holding `video/item/rendition` records. Each
/// rendition carries `bitrate`, `width`, `height`, `duration`, `type` and `cdn`
/// attributes and a nested `src` element with the stream URL.
pub fn decode_manifest(document: &[u8]) -> Result<Vec<Rendition>, StreamSelectionError> {
    let text =
        std::str::from_utf8(document).map_err(|e| StreamSelectionError::Decode(e.to_string()))?;

    let root = root_element(text).map_err(StreamSelectionError::Decode)?;
    if root != "package" {
        return Err(StreamSelectionError::Decode(format!(
            "unexpected root element <{root}>"
        )));
    }

    let package: ManifestPackage =
        quick_xml::de::from_str(text).map_err(|e| StreamSelectionError::Decode(e.to_string()))?;

    let renditions = package
        .video
        .into_iter()
        .flat_map(|video| video.items)
        .flat_map(|item| item.renditions)
        .map(rendition_from_record)
        .collect();

    Ok(renditions)
}

/// Converts a decoded rendition element into a `Rendition`.
///
/// Malformed numeric attributes become None instead of failing the manifest.
fn rendition_from_record(record: RenditionRecord) -> Rendition {
    let raw_bitrate = record.bitrate.unwrap_or_default().trim().to_string();
    let bitrate = parse_bitrate(&raw_bitrate);
    if bitrate.is_none() {
        warn!(bitrate = %raw_bitrate, "rendition has a non-numeric bitrate");
    }

    Rendition {
        bitrate,
        raw_bitrate,
        width: record.width.and_then(|v| v.trim().parse().ok()),
        height: record.height.and_then(|v| v.trim().parse().ok()),
        duration: record.duration.and_then(|v| v.trim().parse().ok()),
        content_type: record.content_type.map(|v| v.trim().to_string()),
        cdn: record.cdn.map(|v| v.trim().to_string()),
        source_url: record.src.unwrap_or_default().trim().to_string(),
    }
}
