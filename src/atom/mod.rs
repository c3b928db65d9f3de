//! Atom grammar: Atom 0.3 and Atom 1.0.
//!
//! Text constructs are decoded from their raw markup according to `type`
//! and `mode`, so XHTML content survives verbatim. `xml:base` applies to
//! link attributes and to URI-valued elements such as `id` and `icon`.

mod feed;
mod parser;
mod text;

pub use feed::{Category, Content, Entry, Feed, Generator, Link, Person, Source};
pub use parser::parse;
pub use text::decode_text_construct;
