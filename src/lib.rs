//! Permissive RSS and Atom parsing.
//!
//! Documents are parsed into format-specific trees ([`rss::Feed`],
//! [`atom::Feed`]) that keep every known field as written, route the iTunes,
//! Dublin Core, Media RSS and YouTube namespaces to typed records, and
//! capture everything else in an [`ext::Extensions`] tree. Malformed but
//! recoverable input is passed through rather than rejected.
//!
//! ```
//! use feedloom::{ParsedFeed, Parser};
//!
//! let doc = br#"<feed xmlns="http://www.w3.org/2005/Atom">
//!     <title>Example</title>
//!     <entry><title type="html">a &lt; b</title></entry>
//! </feed>"#;
//!
//! let ParsedFeed::Atom(feed) = Parser::default().parse(doc).unwrap() else {
//!     panic!("expected an Atom feed");
//! };
//! assert_eq!(feed.entries[0].title, "a < b");
//! ```

pub mod atom;
pub mod config;
pub mod detector;
pub mod error;
pub mod ext;
pub mod parser;
pub mod rss;
pub mod util;
pub mod xml;

pub use config::{ConfigError, ParseOptions};
pub use detector::{detect_feed_type, FeedType};
pub use error::{ParseError, Result};
pub use ext::{Extension, Extensions};
pub use parser::{parse, CharsetDecoder, ParsedFeed, Parser};
