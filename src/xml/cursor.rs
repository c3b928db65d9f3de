use std::collections::HashMap;
use std::fmt;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{QName, ResolveResult};
use quick_xml::NsReader;

use super::base::{is_uri_attribute, BaseStack};
use crate::error::{ParseError, Result};
use crate::util::unescape_html;

/// SEC-003: Default maximum element nesting depth.
/// Prevents stack exhaustion from maliciously nested documents.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Namespace bound to the reserved `xml:` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace recorded for `xmlns:foo` declarations.
pub const XMLNS_NAMESPACE: &str = "xmlns";

/// Kind of the tag the cursor is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    StartTag,
    EndTag,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::StartTag => f.write_str("start tag"),
            EventKind::EndTag => f.write_str("end tag"),
        }
    }
}

/// An attribute of the current start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Local name, without prefix.
    pub name: String,
    /// Resolved namespace URI, `"xmlns"` for namespace declarations, or
    /// empty for unprefixed attributes.
    pub namespace: String,
    /// Value with entity references decoded.
    pub value: String,
}

/// Raw source of an element's content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InnerMarkup {
    /// Everything between the start and end tag, verbatim.
    pub markup: String,
    /// Inner source of the first `<div>` child, when there is one.
    pub div: Option<String>,
}

/// Pull-style cursor over a feed document.
///
/// Wraps a namespace-aware [`quick_xml::NsReader`] and exposes the current
/// tag, its attributes and namespace, plus the primitives the grammars are
/// built from. The first error is recorded and returned by every later
/// call, so a failed parse never produces further output.
///
/// Empty elements (`<a/>`) surface as a start tag followed by an end tag.
/// End tag names are not checked by the reader; [`TokenCursor::expect`]
/// compares them case-insensitively instead.
pub struct TokenCursor<'a> {
    input: &'a str,
    reader: NsReader<&'a [u8]>,
    kind: Option<EventKind>,
    name: String,
    namespace: String,
    attrs: Vec<Attribute>,
    /// The current start tag was self-closing; its end tag is synthesized.
    pending_end: bool,
    depth: usize,
    max_depth: usize,
    /// Byte offset just past each open start tag.
    content_starts: Vec<usize>,
    /// Content span of the element closed by the last end tag.
    closed_span: (usize, usize),
    declared: HashMap<String, String>,
    bases: BaseStack,
    resolve_uris: bool,
    error: Option<ParseError>,
}

impl<'a> TokenCursor<'a> {
    /// Creates a cursor over decoded document text.
    pub fn new(input: &'a str) -> Self {
        let mut reader = NsReader::from_str(input);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.expand_empty_elements = false;
        config.trim_text(false);

        Self {
            input,
            reader,
            kind: None,
            name: String::new(),
            namespace: String::new(),
            attrs: Vec::new(),
            pending_end: false,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            content_starts: Vec::new(),
            closed_span: (0, 0),
            declared: HashMap::new(),
            bases: BaseStack::new(),
            resolve_uris: true,
            error: None,
        }
    }

    /// Sets the maximum element nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enables or disables rewriting of URI attributes against `xml:base`.
    pub fn with_uri_resolution(mut self, enabled: bool) -> Self {
        self.resolve_uris = enabled;
        self
    }

    // ========================================================================
    // State accessors
    // ========================================================================

    /// The sticky error, if one was recorded.
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    pub fn kind(&self) -> Option<EventKind> {
        self.kind
    }

    /// Local name of the current tag, in source case.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local name of the current tag, lower-cased for dispatch.
    pub fn lower_name(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    /// Namespace URI of the current tag.
    ///
    /// Undeclared prefixes come back verbatim and unqualified names in no
    /// namespace come back empty.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Attributes of the current start tag, in document order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Case-sensitive lookup of an attribute by local name.
    ///
    /// Returns `""` when absent.
    pub fn attribute(&self, name: &str) -> &str {
        self.attrs
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
            .unwrap_or("")
    }

    /// Number of currently open elements.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Prefix the document declared for `namespace`, if any.
    pub fn declared_prefix(&self, namespace: &str) -> Option<&str> {
        self.declared.get(namespace).map(String::as_str)
    }

    /// Base URIs in effect at the current position.
    pub fn bases(&self) -> &BaseStack {
        &self.bases
    }

    /// Whether relative URIs are resolved against `xml:base`.
    pub fn resolves_uris(&self) -> bool {
        self.resolve_uris
    }

    // ========================================================================
    // Error handling
    // ========================================================================

    /// Records `err` unless an earlier error exists, and returns the
    /// recorded one.
    pub(crate) fn fail(&mut self, err: ParseError) -> ParseError {
        self.error.get_or_insert(err).clone()
    }

    /// Returns the sticky error, if any.
    pub(crate) fn check(&self) -> Result<()> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn describe_current(&self) -> String {
        match self.kind {
            Some(kind) => format!("{kind} {:?}", self.name),
            None => "start of document".to_string(),
        }
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Advances to the first start tag of the document.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::PrematureEnd`] when the document ends first.
    pub fn find_root(&mut self) -> Result<()> {
        self.check()?;
        loop {
            match self.read(None)? {
                Some(EventKind::StartTag) => return Ok(()),
                Some(EventKind::EndTag) => continue,
                None => {
                    return Err(self.fail(ParseError::premature_end("looking for the root element")))
                }
            }
        }
    }

    /// Advances to the next start or end tag, skipping text, comments and
    /// processing instructions.
    pub fn advance(&mut self) -> Result<EventKind> {
        self.check()?;
        self.next_tag(None)
    }

    /// Like [`advance`](Self::advance), but appends the skipped text to `text`.
    pub(crate) fn advance_collecting(&mut self, text: &mut String) -> Result<EventKind> {
        self.check()?;
        self.next_tag(Some(text))
    }

    fn next_tag(&mut self, sink: Option<&mut String>) -> Result<EventKind> {
        match self.read(sink)? {
            Some(kind) => Ok(kind),
            None => Err(self.fail(ParseError::premature_end("looking for the next tag"))),
        }
    }

    /// Verifies that the cursor is on a tag of `kind` named `name`.
    ///
    /// Names compare case-insensitively; `"*"` matches any name. A mismatch
    /// is recorded as the sticky error.
    pub fn expect(&mut self, kind: EventKind, name: &str) -> Result<()> {
        self.check()?;
        let matches =
            self.kind == Some(kind) && (name == "*" || self.name.eq_ignore_ascii_case(name));
        if matches {
            return Ok(());
        }

        let expected = format!("{kind} {name:?}");
        let found = self.describe_current();
        Err(self.fail(ParseError::mismatch(expected, found)))
    }

    /// Returns the text content of the current element and moves to its
    /// end tag.
    ///
    /// Text and CDATA runs are concatenated and trimmed. Text inside nested
    /// elements is flattened into the result.
    pub fn text(&mut self) -> Result<String> {
        self.expect(EventKind::StartTag, "*")?;
        let mut text = String::new();
        self.close_to(self.depth - 1, Some(&mut text))?;
        Ok(text.trim().to_string())
    }

    /// Discards the current element and moves to its end tag.
    pub fn skip(&mut self) -> Result<()> {
        self.expect(EventKind::StartTag, "*")?;
        self.close_to(self.depth - 1, None)
    }

    /// Returns the raw source of the current element's content and moves to
    /// its end tag.
    pub fn inner_markup(&mut self) -> Result<InnerMarkup> {
        self.expect(EventKind::StartTag, "*")?;
        let depth = self.depth;
        let mut div_depth = None;
        let mut div = None;
        let mut seen_child = false;

        while self.depth >= depth {
            match self.read(None)? {
                Some(EventKind::StartTag) if self.depth == depth + 1 => {
                    if !seen_child && self.name.eq_ignore_ascii_case("div") {
                        div_depth = Some(self.depth);
                    }
                    seen_child = true;
                }
                Some(EventKind::EndTag) if div_depth.is_some() && self.depth == depth => {
                    let (start, end) = self.closed_span;
                    div = Some(self.input[start..end].to_string());
                    div_depth = None;
                }
                Some(_) => {}
                None => {
                    return Err(self.fail(ParseError::premature_end("reading element content")))
                }
            }
        }

        let (start, end) = self.closed_span;
        Ok(InnerMarkup {
            markup: self.input[start..end].to_string(),
            div,
        })
    }

    /// Reads until fewer than `depth + 1` elements are open.
    pub(crate) fn close_to(&mut self, depth: usize, mut sink: Option<&mut String>) -> Result<()> {
        while self.depth > depth {
            if self.read(sink.as_deref_mut())?.is_none() {
                return Err(self.fail(ParseError::premature_end("reading element content")));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Event normalization
    // ========================================================================

    /// Reads events up to the next tag, appending text to `sink`.
    ///
    /// Returns `None` at the end of the document.
    fn read(&mut self, mut sink: Option<&mut String>) -> Result<Option<EventKind>> {
        self.check()?;

        if self.pending_end {
            self.pending_end = false;
            let start = self.content_starts.last().copied().unwrap_or(0);
            self.close_element(start, start);
            return Ok(Some(EventKind::EndTag));
        }

        loop {
            let next = self
                .reader
                .read_resolved_event()
                .map(|(resolved, event)| (namespace_of(resolved), event));
            let (namespace, event) = match next {
                Ok(pair) => pair,
                Err(e) => {
                    return Err(self.fail(ParseError::mismatch("well-formed XML", e.to_string())))
                }
            };

            match event {
                Event::Start(e) => {
                    self.open_element(&e, namespace)?;
                    return Ok(Some(EventKind::StartTag));
                }
                Event::Empty(e) => {
                    self.open_element(&e, namespace)?;
                    self.pending_end = true;
                    return Ok(Some(EventKind::StartTag));
                }
                Event::End(e) => {
                    self.name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    self.namespace = namespace;
                    let end_pos = self.reader.buffer_position() as usize;
                    let tag_start = self.input[..end_pos].rfind("</").unwrap_or(end_pos);
                    let start = self.content_starts.last().copied().unwrap_or(tag_start);
                    self.close_element(start, tag_start.max(start));
                    return Ok(Some(EventKind::EndTag));
                }
                Event::Text(t) => {
                    if let Some(out) = sink.as_deref_mut() {
                        out.push_str(&unescape_html(&String::from_utf8_lossy(&t)));
                    }
                }
                Event::CData(t) => {
                    if let Some(out) = sink.as_deref_mut() {
                        out.push_str(&String::from_utf8_lossy(&t));
                    }
                }
                Event::Eof => return Ok(None),
                // Comments, processing instructions, declarations, doctype
                _ => {}
            }
        }
    }

    fn open_element(&mut self, e: &BytesStart<'_>, namespace: String) -> Result<()> {
        self.depth += 1;
        // SEC-003: Reject excessively nested documents
        if self.depth > self.max_depth {
            return Err(self.fail(ParseError::MaxDepthExceeded(self.max_depth)));
        }

        self.kind = Some(EventKind::StartTag);
        self.name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        self.namespace = namespace;
        self.attrs = self.collect_attributes(e);
        self.content_starts
            .push(self.reader.buffer_position() as usize);

        let base = self
            .attrs
            .iter()
            .find(|attr| attr.name == "base" && attr.namespace == XML_NAMESPACE)
            .map(|attr| attr.value.clone());
        if let Some(base) = base {
            self.bases.push(self.depth, &base);
        }

        if self.resolve_uris && self.bases.current().is_some() {
            for i in 0..self.attrs.len() {
                if is_uri_attribute(&self.attrs[i].name) {
                    let resolved = self.bases.resolve(&self.attrs[i].value);
                    self.attrs[i].value = resolved;
                }
            }
        }
        Ok(())
    }

    fn close_element(&mut self, start: usize, end: usize) {
        self.kind = Some(EventKind::EndTag);
        self.closed_span = (start, end);
        self.bases.pop(self.depth);
        self.content_starts.pop();
        self.depth = self.depth.saturating_sub(1);
    }

    fn collect_attributes(&mut self, e: &BytesStart<'_>) -> Vec<Attribute> {
        let mut attrs = Vec::new();
        let mut iter = e.html_attributes();
        iter.with_checks(false);

        for attr_result in iter {
            let attr = match attr_result {
                Ok(attr) => attr,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed attribute");
                    continue;
                }
            };
            let value = unescape_html(&String::from_utf8_lossy(&attr.value)).into_owned();
            let key = attr.key;

            if key.as_ref() == b"xmlns" {
                self.declared.insert(value.clone(), String::new());
                attrs.push(Attribute {
                    name: "xmlns".to_string(),
                    namespace: String::new(),
                    value,
                });
                continue;
            }

            if let Some(prefix) = key.as_ref().strip_prefix(b"xmlns:") {
                let prefix = String::from_utf8_lossy(prefix).into_owned();
                self.declared.insert(value.clone(), prefix.clone());
                attrs.push(Attribute {
                    name: prefix,
                    namespace: XMLNS_NAMESPACE.to_string(),
                    value,
                });
                continue;
            }

            attrs.push(Attribute {
                name: String::from_utf8_lossy(key.local_name().as_ref()).into_owned(),
                namespace: self.attribute_namespace(key),
                value,
            });
        }
        attrs
    }

    fn attribute_namespace(&self, key: QName<'_>) -> String {
        match key.prefix() {
            None => String::new(),
            Some(prefix) if prefix.as_ref() == b"xml" => XML_NAMESPACE.to_string(),
            Some(_) => namespace_of(self.reader.resolve_attribute(key).0),
        }
    }
}

/// Converts a resolved namespace into an owned URI.
///
/// Unknown prefixes are kept verbatim so that they can still act as a
/// dispatch key.
fn namespace_of(resolved: ResolveResult<'_>) -> String {
    match resolved {
        ResolveResult::Bound(ns) => String::from_utf8_lossy(ns.as_ref()).into_owned(),
        ResolveResult::Unknown(prefix) => String::from_utf8_lossy(&prefix).into_owned(),
        ResolveResult::Unbound => String::new(),
    }
}
