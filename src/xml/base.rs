use url::Url;

/// Attribute names whose values are URIs subject to `xml:base` resolution.
pub const URI_ATTRIBUTES: [&str; 4] = ["href", "scheme", "src", "uri"];

/// Stack of `xml:base` URIs active at the cursor position.
///
/// An entry is pushed when an element carrying `xml:base` opens and popped
/// when that same element closes. A base that failed to resolve is kept as
/// `None` so that it still shadows the outer one.
#[derive(Debug, Default, Clone)]
pub struct BaseStack {
    entries: Vec<(usize, Option<Url>)>,
}

impl BaseStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the base URI in effect, if any.
    pub fn current(&self) -> Option<&Url> {
        self.entries.last().and_then(|(_, url)| url.as_ref())
    }

    /// Pushes `raw`, resolved against the current base, for the element at `depth`.
    pub fn push(&mut self, depth: usize, raw: &str) {
        let url = resolve_url(self.current(), raw);
        if url.is_none() {
            tracing::debug!(base = %raw, "unresolvable xml:base");
        }
        self.entries.push((depth, url));
    }

    /// Pops the entry owned by the element at `depth`, if it pushed one.
    pub fn pop(&mut self, depth: usize) {
        if matches!(self.entries.last(), Some((owner, _)) if *owner == depth) {
            self.entries.pop();
        }
    }

    /// Resolves `reference` against the current base.
    ///
    /// Without an active base, or when resolution fails, the reference is
    /// returned unchanged.
    pub fn resolve(&self, reference: &str) -> String {
        match self.current() {
            None => reference.to_string(),
            Some(base) => resolve_url(Some(base), reference)
                .map(String::from)
                .unwrap_or_else(|| reference.to_string()),
        }
    }
}

/// Resolves `reference` against `base` per RFC 3986.
///
/// A non-empty base path is always treated as a directory: `http://a/b`
/// resolves `c` to `http://a/b/c`. Without a base only absolute references
/// produce a URL.
pub fn resolve_url(base: Option<&Url>, reference: &str) -> Option<Url> {
    let Some(base) = base else {
        return Url::parse(reference).ok();
    };

    let mut base = base.clone();
    let path = base.path();
    if !path.is_empty() && !reference.is_empty() && !path.ends_with('/') {
        let directory = format!("{path}/");
        base.set_path(&directory);
    }

    match base.join(reference) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::trace!(reference = %reference, error = %e, "relative URI left unresolved");
            None
        }
    }
}

/// Returns true when `name` is one of [`URI_ATTRIBUTES`], ignoring case.
pub fn is_uri_attribute(name: &str) -> bool {
    URI_ATTRIBUTES
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_resolve_against_directory_base() {
        let base = url("http://a/b/");
        assert_eq!(
            resolve_url(Some(&base), "c").unwrap().as_str(),
            "http://a/b/c"
        );
    }

    #[test]
    fn test_base_path_treated_as_directory() {
        let base = url("http://example.org/feeds");
        assert_eq!(
            resolve_url(Some(&base), "entry/1").unwrap().as_str(),
            "http://example.org/feeds/entry/1"
        );
    }

    #[test]
    fn test_absolute_reference_wins() {
        let base = url("http://a/b/");
        assert_eq!(
            resolve_url(Some(&base), "https://other/x").unwrap().as_str(),
            "https://other/x"
        );
    }

    #[test]
    fn test_no_base_only_absolute() {
        assert!(resolve_url(None, "relative/path").is_none());
        assert_eq!(
            resolve_url(None, "http://a/").unwrap().as_str(),
            "http://a/"
        );
    }

    #[test]
    fn test_stack_push_pop_by_depth() {
        let mut stack = BaseStack::new();
        stack.push(1, "http://a/b/");
        stack.push(3, "c/");
        assert_eq!(stack.current().unwrap().as_str(), "http://a/b/c/");

        // depth 2 never pushed, so nothing is popped
        stack.pop(2);
        assert_eq!(stack.current().unwrap().as_str(), "http://a/b/c/");

        stack.pop(3);
        assert_eq!(stack.current().unwrap().as_str(), "http://a/b/");
        stack.pop(1);
        assert!(stack.current().is_none());
    }

    #[test]
    fn test_unresolvable_reference_passes_through() {
        let mut stack = BaseStack::new();
        stack.push(1, "http://a/b/");
        assert_eq!(
            stack.resolve("at://did:plc:abc/post"),
            "at://did:plc:abc/post"
        );
    }

    #[test]
    fn test_resolve_without_base_is_identity() {
        let stack = BaseStack::new();
        assert_eq!(stack.resolve("c"), "c");
    }

    #[test]
    fn test_uri_attribute_names() {
        assert!(is_uri_attribute("href"));
        assert!(is_uri_attribute("HREF"));
        assert!(is_uri_attribute("src"));
        assert!(!is_uri_attribute("rel"));
    }
}
