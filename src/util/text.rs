use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use quick_xml::escape::resolve_html5_entity;

/// Opening marker of a literal CDATA section.
pub const CDATA_START: &str = "<![CDATA[";
/// Closing marker of a literal CDATA section.
pub const CDATA_END: &str = "]]>";

/// Longest entity name worth looking up (`&CounterClockwiseContourIntegral;`).
const MAX_ENTITY_NAME: usize = 32;

/// Removes literal CDATA markers from `s`.
///
/// Text inside `<![CDATA[ ... ]]>` is copied verbatim, text outside is
/// HTML-unescaped. An opening marker without a matching `]]>` is copied
/// as-is together with the rest of the string.
///
/// # Examples
///
/// ```
/// use feedloom::util::strip_cdata;
///
/// assert_eq!(strip_cdata("<![CDATA[ test ]]>test"), " test test");
/// assert_eq!(strip_cdata("<![CDATA[test &]]> &lt;"), "test & <");
/// assert_eq!(strip_cdata("<![CDATA["), "<![CDATA[");
/// ```
pub fn strip_cdata(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut curr = 0;

    while curr < s.len() {
        let Some(start) = find_from(s, CDATA_START, curr) else {
            out.push_str(&unescape_html(&s[curr..]));
            return out;
        };

        let body = start + CDATA_START.len();
        let Some(end) = find_from(s, CDATA_END, body) else {
            out.push_str(&unescape_html(&s[curr..start]));
            out.push_str(&s[start..]);
            return out;
        };

        out.push_str(&unescape_html(&s[curr..start]));
        out.push_str(&s[body..end]);
        curr = end + CDATA_END.len();
    }

    out
}

/// Final decoding step for plain text fields.
///
/// The reader has already decoded one level of escaping. Feeds that escape
/// twice, or that put a literal CDATA section inside escaped text, are
/// decoded once more here.
///
/// # Examples
///
/// ```
/// use feedloom::util::decode_text;
///
/// assert_eq!(decode_text("  Tom &amp; Jerry "), "Tom & Jerry");
/// assert_eq!(decode_text("<![CDATA[a &amp; b]]>"), "a &amp; b");
/// ```
pub fn decode_text(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.contains(CDATA_START) {
        strip_cdata(trimmed)
    } else {
        unescape_html(trimmed).into_owned()
    }
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack[from..].find(needle).map(|idx| idx + from)
}

/// Decodes HTML character references the way browsers do, without ever
/// failing.
///
/// Resolves named references (the HTML5 table, which includes the five XML
/// builtins) and decimal/hex numeric references. Anything that does not form
/// a valid reference is left untouched, so `"AT&T"` stays `"AT&T"`.
///
/// Returns `Cow::Borrowed` when the input contains no `&` (common case).
pub fn unescape_html(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        match decode_reference(tail) {
            Some((decoded, consumed)) => {
                out.push_str(&decoded);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

/// Decodes the reference that starts right after a `&`.
///
/// Returns the replacement text and the number of bytes consumed from
/// `tail`, or `None` when `tail` does not start with a reference.
fn decode_reference(tail: &str) -> Option<(Cow<'static, str>, usize)> {
    if let Some(numeric) = tail.strip_prefix('#') {
        let (radix, digits_at) = match numeric.as_bytes().first() {
            Some(b'x' | b'X') => (16, 2),
            _ => (10, 1),
        };
        let digits = &tail[digits_at..];
        let len = digits
            .bytes()
            .take_while(|b| (*b as char).is_digit(radix))
            .count();
        if len == 0 {
            return None;
        }
        let ch = u32::from_str_radix(&digits[..len], radix)
            .ok()
            .and_then(char::from_u32)
            .filter(|c| *c != '\0')
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        let mut consumed = digits_at + len;
        if digits[len..].starts_with(';') {
            consumed += 1;
        }
        return Some((Cow::Owned(ch.to_string()), consumed));
    }

    let len = tail
        .bytes()
        .take(MAX_ENTITY_NAME + 1)
        .take_while(u8::is_ascii_alphanumeric)
        .count();
    if len == 0 || len > MAX_ENTITY_NAME || !tail[len..].starts_with(';') {
        return None;
    }
    resolve_html5_entity(&tail[..len]).map(|value| (Cow::Borrowed(value), len + 1))
}

/// Best-effort standard base64 decoding.
///
/// Whitespace inside the payload is ignored. When the input is not valid
/// base64, or does not decode to UTF-8 text, the original string is
/// returned unchanged.
pub fn decode_base64_lossless(s: &str) -> Cow<'_, str> {
    let compact: String = s.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    match STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(decoded) => Cow::Owned(decoded),
            Err(_) => {
                tracing::trace!("base64 payload is not UTF-8, keeping original text");
                Cow::Borrowed(s)
            }
        },
        Err(e) => {
            tracing::trace!(error = %e, "text is not base64, keeping original");
            Cow::Borrowed(s)
        }
    }
}

/// Returns true for characters allowed by the XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Turns raw feed bytes into text an XML reader will accept.
///
/// Invalid UTF-8 sequences and characters outside the XML character range
/// are dropped, and a leading byte order mark is removed. Real-world feeds
/// routinely contain stray control characters; dropping them beats failing
/// the whole document.
///
/// Returns `Cow::Borrowed` when the input is already clean (common case).
pub fn sanitize_xml(bytes: &[u8]) -> Cow<'_, str> {
    let text: Cow<'_, str> = match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            let mut out = String::with_capacity(bytes.len());
            for chunk in bytes.utf8_chunks() {
                out.push_str(chunk.valid());
            }
            Cow::Owned(out)
        }
    };

    let needs_filter = text.starts_with('\u{FEFF}') || !text.chars().all(is_xml_char);
    if !needs_filter {
        return text;
    }

    let body = text.strip_prefix('\u{FEFF}').unwrap_or(&text);
    Cow::Owned(body.chars().filter(|c| is_xml_char(*c)).collect())
}
