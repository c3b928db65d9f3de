//! Decoding of Atom text constructs (`title`, `summary`, `content`, ...).

use url::Url;

use crate::util::{decode_base64_lossless, strip_cdata, unescape_html, CDATA_START};
use crate::xml::base::resolve_url;
use crate::xml::InnerMarkup;

/// Elements whose text content is a URI.
const URI_ELEMENTS: &[&str] = &["icon", "id", "logo", "uri", "url"];

/// Decodes the inner markup of a text construct according to its `type`
/// and `mode` attributes.
///
/// The rules, in order:
///
/// 1. XHTML content (`type` containing `xhtml`, or `html`) wrapped in a
///    `<div>` yields the div's inner markup; otherwise the whole inner
///    markup is used. Either way the result is trimmed.
/// 2. A literal CDATA section is unwrapped and the rest unescaped.
/// 3. Plain text (`text`, `text/*`, or no type and no mode) and `html` are
///    unescaped; XHTML is kept verbatim.
/// 4. Anything else is taken to be base64 and decoded when it decodes
///    cleanly; otherwise it is kept as is.
///
/// # Examples
///
/// ```
/// use feedloom::atom::decode_text_construct;
/// use feedloom::xml::InnerMarkup;
///
/// let inner = InnerMarkup {
///     markup: " Fish &amp;amp; Chips ".to_string(),
///     div: None,
/// };
/// assert_eq!(decode_text_construct("", "", &inner), "Fish &amp; Chips");
/// ```
pub fn decode_text_construct(kind: &str, mode: &str, inner: &InnerMarkup) -> String {
    let kind = kind.to_ascii_lowercase();
    let mode = mode.to_ascii_lowercase();

    let xhtml = kind.contains("xhtml") || kind == "html";
    let raw = match &inner.div {
        Some(div) if xhtml => div.trim(),
        _ => inner.markup.trim(),
    };

    if raw.contains(CDATA_START) {
        return strip_cdata(raw);
    }

    if kind == "text" || kind.starts_with("text/") || (kind.is_empty() && mode.is_empty()) {
        unescape_html(raw).into_owned()
    } else if kind.contains("xhtml") {
        raw.to_string()
    } else if kind == "html" {
        unescape_html(raw).into_owned()
    } else {
        decode_base64_lossless(raw).into_owned()
    }
}

/// Resolves the text of URI-valued elements against `base`.
///
/// Values that do not resolve are returned unchanged.
pub(crate) fn resolve_uri_element(name: &str, base: Option<&Url>, value: String) -> String {
    if base.is_none() || !URI_ELEMENTS.contains(&name) {
        return value;
    }
    match resolve_url(base, &value) {
        Some(url) => url.to_string(),
        None => value,
    }
}
