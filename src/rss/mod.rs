//! RSS grammar: RSS 0.9x, RSS 1.0 (RDF) and RSS 2.0.
//!
//! Channel and item records are plain owned structs. Elements from other
//! namespaces are routed to the extension sub-grammars or captured
//! generically; unknown elements from RSS itself land under `_custom`.

mod feed;
mod parser;

pub use feed::{Category, Cloud, Enclosure, Feed, Guid, Image, Item, Source, TextInput};
pub use parser::parse;
