//! XML plumbing shared by the feed grammars.
//!
//! - [`TokenCursor`]: normalized pull-style view of the document
//! - combinators: `parsing_element`, `with_text`, `with_skip`, `children`
//! - [`BaseStack`]: `xml:base` scopes and relative URI resolution

pub mod base;
mod combinators;
mod cursor;

pub use base::{resolve_url, BaseStack};
pub use combinators::Children;
pub use cursor::{
    Attribute, EventKind, InnerMarkup, TokenCursor, DEFAULT_MAX_DEPTH, XML_NAMESPACE,
    XMLNS_NAMESPACE,
};
