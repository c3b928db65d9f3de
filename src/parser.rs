//! The top-level dispatcher: charset decoding, detection and grammar
//! selection.
//!
//! Every call builds its own [`TokenCursor`], so one [`Parser`] can serve
//! any number of threads at once.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use quick_xml::events::Event;
use serde::Serialize;

use crate::atom;
use crate::config::ParseOptions;
use crate::detector::{detect_feed_type, skip_preamble, FeedType};
use crate::error::{ParseError, Result};
use crate::rss;
use crate::util::sanitize_xml;
use crate::xml::TokenCursor;

/// Converts documents in character sets the engine does not handle itself.
pub trait CharsetDecoder: Send + Sync {
    /// Decodes `bytes` labelled `label` (lower-cased) into UTF-8 text.
    ///
    /// Returns `None` when the label is not supported.
    fn decode(&self, label: &str, bytes: &[u8]) -> Option<String>;
}

/// A complete format-specific tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", content = "feed", rename_all = "lowercase")]
pub enum ParsedFeed {
    Rss(rss::Feed),
    Atom(atom::Feed),
    /// JSON feeds are only decoded, not interpreted.
    Json(serde_json::Value),
}

impl ParsedFeed {
    pub fn feed_type(&self) -> FeedType {
        match self {
            ParsedFeed::Rss(_) => FeedType::Rss,
            ParsedFeed::Atom(_) => FeedType::Atom,
            ParsedFeed::Json(_) => FeedType::Json,
        }
    }
}

/// Parses feed documents with a fixed set of options.
#[derive(Clone, Default)]
pub struct Parser {
    options: ParseOptions,
    decoder: Option<Arc<dyn CharsetDecoder>>,
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("options", &self.options)
            .field("decoder", &self.decoder.as_ref().map(|_| "<custom>"))
            .finish()
    }
}

impl Parser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            decoder: None,
        }
    }

    /// Installs a converter for labels other than UTF-8, US-ASCII and
    /// ISO-8859-1.
    pub fn with_charset_decoder(mut self, decoder: impl CharsetDecoder + 'static) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Detects the feed type and runs the matching grammar.
    ///
    /// The charset comes from the XML declaration, defaulting to UTF-8.
    ///
    /// # Errors
    ///
    /// [`ParseError::DetectionFailure`] when the input is neither RSS, Atom
    /// nor JSON; otherwise the first error the grammar recorded, wrapped with
    /// the grammar's name.
    pub fn parse(&self, bytes: &[u8]) -> Result<ParsedFeed> {
        self.parse_with_charset(bytes, None)
    }

    /// Like [`parse`](Self::parse), with a caller-supplied charset label that
    /// takes precedence over the XML declaration.
    pub fn parse_with_charset(&self, bytes: &[u8], charset: Option<&str>) -> Result<ParsedFeed> {
        match detect_feed_type(bytes) {
            FeedType::Rss => self.parse_rss(bytes, charset).map(ParsedFeed::Rss),
            FeedType::Atom => self.parse_atom(bytes, charset).map(ParsedFeed::Atom),
            FeedType::Json => serde_json::from_slice(skip_preamble(bytes))
                .map(ParsedFeed::Json)
                .map_err(|e| ParseError::InvalidJson(e.to_string())),
            FeedType::Unknown => Err(ParseError::DetectionFailure),
        }
    }

    /// Runs the RSS grammar without detection.
    pub fn parse_rss(&self, bytes: &[u8], charset: Option<&str>) -> Result<rss::Feed> {
        let text = self.decode(bytes, charset).map_err(|e| e.in_grammar("rss"))?;
        self.run(&text, "rss", rss::parse)
    }

    /// Runs the Atom grammar without detection.
    pub fn parse_atom(&self, bytes: &[u8], charset: Option<&str>) -> Result<atom::Feed> {
        let text = self.decode(bytes, charset).map_err(|e| e.in_grammar("atom"))?;
        self.run(&text, "atom", atom::parse)
    }

    fn run<T>(
        &self,
        text: &str,
        format: &'static str,
        grammar: fn(&mut TokenCursor<'_>, bool) -> Result<T>,
    ) -> Result<T> {
        let mut cursor = TokenCursor::new(text)
            .with_max_depth(self.options.max_depth)
            .with_uri_resolution(self.options.resolve_xml_base);

        let tree = grammar(&mut cursor, self.options.skip_unknown_elements)
            .map_err(|e| e.in_grammar(format))?;
        if let Some(err) = cursor.error() {
            return Err(err.clone().in_grammar(format));
        }
        Ok(tree)
    }

    /// Converts `bytes` to sanitized UTF-8 text.
    fn decode<'b>(&self, bytes: &'b [u8], charset: Option<&str>) -> Result<Cow<'b, str>> {
        let label = charset
            .map(|label| label.trim().to_ascii_lowercase())
            .or_else(|| declared_charset(bytes))
            .unwrap_or_default();

        match label.as_str() {
            "" | "utf-8" | "utf8" | "us-ascii" | "ascii" => Ok(sanitize_xml(bytes)),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "l1" => {
                let text: String = bytes.iter().map(|&b| char::from(b)).collect();
                Ok(Cow::Owned(sanitize_xml(text.as_bytes()).into_owned()))
            }
            other => {
                let decoded = self
                    .decoder
                    .as_ref()
                    .and_then(|decoder| decoder.decode(other, bytes));
                match decoded {
                    Some(text) => {
                        tracing::debug!(charset = %other, "decoded with custom charset decoder");
                        Ok(Cow::Owned(sanitize_xml(text.as_bytes()).into_owned()))
                    }
                    None => Err(ParseError::EncodingFailure(other.to_string())),
                }
            }
        }
    }
}

/// Parses `bytes` with default options.
///
/// # Examples
///
/// ```
/// use feedloom::parser::{parse, ParsedFeed};
///
/// let feed = parse(br#"<rss version="2.0"><channel><title>T</title></channel></rss>"#).unwrap();
/// let ParsedFeed::Rss(feed) = feed else { panic!("not RSS") };
/// assert_eq!(feed.title, "T");
/// assert!(feed.items.is_empty());
/// ```
pub fn parse(bytes: &[u8]) -> Result<ParsedFeed> {
    Parser::default().parse(bytes)
}

/// The lower-cased `encoding` of the XML declaration, if there is one.
fn declared_charset(bytes: &[u8]) -> Option<String> {
    let mut reader = quick_xml::Reader::from_reader(skip_preamble(bytes));
    match reader.read_event() {
        Ok(Event::Decl(decl)) => {
            let encoding = decl.encoding()?.ok()?;
            Some(String::from_utf8_lossy(&encoding).trim().to_ascii_lowercase())
        }
        _ => None,
    }
}
