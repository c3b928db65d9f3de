//! Feed type sniffing.

use std::fmt;

use serde::Serialize;

use crate::util::sanitize_xml;
use crate::xml::TokenCursor;

/// The kinds of feed document the dispatcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedType {
    Rss,
    Atom,
    Json,
    Unknown,
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeedType::Rss => "rss",
            FeedType::Atom => "atom",
            FeedType::Json => "json",
            FeedType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Guesses the feed type from the first meaningful byte of `bytes`.
///
/// Leading whitespace and byte order mark bytes are skipped. Markup is
/// classified by its root element (`rss`/`rdf` or `feed`), a `{` by whether
/// the remainder is valid JSON. Anything else is [`FeedType::Unknown`].
///
/// # Examples
///
/// ```
/// use feedloom::detector::{detect_feed_type, FeedType};
///
/// assert_eq!(detect_feed_type(b"\xEF\xBB\xBF  <rss version=\"2.0\"/>"), FeedType::Rss);
/// assert_eq!(detect_feed_type(br#"{"version":"1"}"#), FeedType::Json);
/// assert_eq!(detect_feed_type(b"hello"), FeedType::Unknown);
/// ```
pub fn detect_feed_type(bytes: &[u8]) -> FeedType {
    let rest = skip_preamble(bytes);
    let detected = match rest.first() {
        Some(b'<') => detect_markup(rest),
        Some(b'{') if serde_json::from_slice::<serde::de::IgnoredAny>(rest).is_ok() => {
            FeedType::Json
        }
        _ => FeedType::Unknown,
    };
    tracing::debug!(feed_type = %detected, "detected feed type");
    detected
}

/// Strips leading whitespace and byte order mark bytes.
pub(crate) fn skip_preamble(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|&b| !b.is_ascii_whitespace() && !is_bom_byte(b))
        .unwrap_or(bytes.len());
    &bytes[start..]
}

/// Bytes that can start a UTF-8, UTF-16 or UTF-32 byte order mark.
fn is_bom_byte(b: u8) -> bool {
    matches!(b, 0xFE | 0xFF | 0x00 | 0xEF | 0xBB | 0xBF)
}

fn detect_markup(bytes: &[u8]) -> FeedType {
    let text = sanitize_xml(bytes);
    let mut cursor = TokenCursor::new(&text);
    if cursor.find_root().is_err() {
        return FeedType::Unknown;
    }

    match cursor.lower_name().as_str() {
        "rss" | "rdf" => FeedType::Rss,
        "feed" => FeedType::Atom,
        _ => FeedType::Unknown,
    }
}
