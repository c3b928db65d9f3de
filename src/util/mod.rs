//! Utility functions shared by the grammars.
//!
//! This module provides reusable utilities for:
//!
//! - **Text decoding**: CDATA stripping, lenient HTML entity decoding,
//!   best-effort base64, input sanitizing
//! - **Dates**: best-effort parsing of feed timestamps
//! - **People**: `"name (email)"` author strings
//!
//! # Examples
//!
//! ```
//! use feedloom::util::{strip_cdata, unescape_html};
//!
//! assert_eq!(strip_cdata("<![CDATA[a < b]]> &amp; c"), "a < b & c");
//! assert_eq!(unescape_html("Tom &amp; Jerry"), "Tom & Jerry");
//! ```

mod date;
mod person;
mod text;

pub use date::parse_date;
pub use person::{parse_name_address, NameAddress};
pub use text::{
    decode_base64_lossless, decode_text, sanitize_xml, strip_cdata, unescape_html, CDATA_END,
    CDATA_START,
};
