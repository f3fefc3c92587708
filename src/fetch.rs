//! Document fetching module
//!
//! Every stage of the resolution pipeline retrieves its input through the
//! `DocumentFetcher` trait. The default implementation performs one blocking
//! GET per call using reqwest; there is no retry and no caching.

use reqwest::Url;
use std::borrow::Cow;
use std::io::Read;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Inclusive range of HTTP status codes accepted as success.
const SUCCESS_STATUS: std::ops::RangeInclusive<u16> = 200..=399;

/// Errors that can occur while fetching a document
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientSetup(#[source] reqwest::Error),

    /// The request could not be sent or no response was received
    #[error("Could not fetch {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    /// The server answered with a status outside the accepted range
    #[error("{url} returned status code {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read completely
    #[error("Could not read body of {url}: {source}")]
    Body {
        url: String,
        source: std::io::Error,
    },
}

/// Retrieves raw documents by URL.
///
/// Implementors return the complete body of the document or a descriptive
/// error. The pipeline never retries a failed fetch.
pub trait DocumentFetcher {
    /// Fetches the document located at `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<T: DocumentFetcher + ?Sized> DocumentFetcher for &T {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url)
    }
}

/// Settings applied to the HTTP client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Overall timeout for a single request (None waits indefinitely)
    pub timeout: Option<Duration>,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Document fetcher backed by a blocking reqwest client.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Creates a new fetcher using the given client options.
    pub fn new(options: &FetchOptions) -> Result<Self, FetchError> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(&options.user_agent);

        // The blocking client applies a 30s default unless told otherwise
        builder = builder.timeout(options.timeout);

        let client = builder.build().map_err(FetchError::ClientSetup)?;

        Ok(Self { client })
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url, "fetching document");

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status().as_u16();
        if !SUCCESS_STATUS.contains(&status) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let mut body = Vec::new();
        response
            .read_to_end(&mut body)
            .map_err(|e| FetchError::Body {
                url: url.to_string(),
                source: e,
            })?;

        debug!(url, bytes = body.len(), "document fetched");
        Ok(body)
    }
}

/// Resolves a reference found inside a document against that document's URL.
///
/// Absolute references are returned unchanged. If the base itself is not a
/// valid absolute URL the reference is returned as found.
pub(crate) fn resolve_reference(base_url: &str, reference: &str) -> String {
    let reference = reference.trim();

    match Url::parse(base_url).and_then(|base| base.join(reference)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => reference.to_string(),
    }
}

/// Decodes a fetched HTML page into text.
///
/// Pages are read as UTF-8 and fall back to Latin-1 when they are not valid
/// UTF-8, so a stray accented byte never makes a page unreadable. A body
/// holding NUL bytes is binary content, not a page, and is rejected.
pub(crate) fn page_text(document: &[u8]) -> Result<Cow<'_, str>, String> {
    if let Some(offset) = document.iter().position(|&byte| byte == 0) {
        return Err(format!("binary content (NUL byte at offset {offset})"));
    }

    match std::str::from_utf8(document) {
        Ok(text) => Ok(Cow::Borrowed(text)),
        Err(_) => Ok(Cow::Owned(document.iter().copied().map(char::from).collect())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_reference_keeps_absolute_urls() {
        assert_eq!(
            resolve_reference("http://nickelodeon.be/show", "http://x/episode/1"),
            "http://x/episode/1"
        );
    }

    #[test]
    fn test_resolve_reference_joins_relative_paths() {
        assert_eq!(
            resolve_reference("http://nickelodeon.be/spongebob", "/episodes/42"),
            "http://nickelodeon.be/episodes/42"
        );
        assert_eq!(
            resolve_reference("http://nickelodeon.be/shows/spongebob", "  pilot "),
            "http://nickelodeon.be/shows/pilot"
        );
    }

    #[test]
    fn test_resolve_reference_with_invalid_base() {
        assert_eq!(resolve_reference("not a url", "/episodes/42"), "/episodes/42");
    }

    #[test]
    fn test_default_options() {
        let options = FetchOptions::default();
        assert!(options.timeout.is_none());
        assert!(options.user_agent.starts_with("show_harvester/"));
    }

    #[test]
    fn test_http_fetcher_builds_with_timeout() {
        let options = FetchOptions {
            timeout: Some(Duration::from_secs(5)),
            ..FetchOptions::default()
        };
        assert!(HttpFetcher::new(&options).is_ok());
    }

    #[test]
    fn test_success_status_range() {
        assert!(SUCCESS_STATUS.contains(&200));
        assert!(SUCCESS_STATUS.contains(&399));
        assert!(!SUCCESS_STATUS.contains(&199));
        assert!(!SUCCESS_STATUS.contains(&404));
    }

    #[test]
    fn test_page_text_reads_utf8() {
        assert_eq!(page_text("Café".as_bytes()).unwrap(), "Café");
    }

    #[test]
    fn test_page_text_falls_back_to_latin1() {
        let text = page_text(b"<title>Caf\xe9</title>").unwrap();
        assert_eq!(text, "<title>Café</title>");
    }

    #[test]
    fn test_page_text_rejects_binary_content() {
        let result = page_text(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00]);
        assert!(result.unwrap_err().contains("offset 8"));
    }
}
