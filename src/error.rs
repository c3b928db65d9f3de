use thiserror::Error;

/// Result alias used throughout the parsing engine.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that abort a parse call.
///
/// The cursor records the first error it sees and hands back a clone of it
/// on every later call, so the type is `Clone`. Unknown elements, attributes
/// and namespaces are never errors, and best-effort steps (URI resolution,
/// base64 guessing, date parsing) keep the raw value instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// An expected tag or event was absent, or the markup is malformed.
    #[error("expected {expected}, found {found}")]
    StructuralMismatch { expected: String, found: String },

    /// The document ended while more content was expected.
    #[error("unexpected end of document while {context}")]
    PrematureEnd { context: String },

    /// No converter is available for the declared character set.
    #[error("no converter for charset {0:?}")]
    EncodingFailure(String),

    /// A typed attribute (e.g. a numeric media dimension) failed to parse.
    #[error("attribute {name}={value:?} is not a valid {expected}")]
    AttributeTypeFailure {
        name: String,
        value: String,
        expected: &'static str,
    },

    /// The feed type could not be sniffed from the input.
    #[error("failed to detect feed type")]
    DetectionFailure,

    /// SEC-003: Element nesting exceeds the configured limit.
    #[error("element nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),

    /// The input looked like JSON but could not be decoded.
    #[error("invalid JSON feed: {0}")]
    InvalidJson(String),

    /// An error raised while a specific grammar was running.
    #[error("{format}: {source}")]
    Grammar {
        format: &'static str,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn premature_end(context: impl Into<String>) -> Self {
        Self::PrematureEnd {
            context: context.into(),
        }
    }

    /// Wraps the error with the name of the grammar that produced it.
    ///
    /// Already-wrapped errors are returned unchanged so the innermost
    /// grammar wins.
    pub fn in_grammar(self, format: &'static str) -> Self {
        match self {
            wrapped @ Self::Grammar { .. } => wrapped,
            other => Self::Grammar {
                format,
                source: Box::new(other),
            },
        }
    }

    /// Returns the underlying error, looking through grammar context.
    pub fn root(&self) -> &ParseError {
        match self {
            Self::Grammar { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_context_in_message() {
        let err = ParseError::mismatch("end tag \"channel\"", "end tag \"rss\"").in_grammar("rss");
        assert_eq!(
            err.to_string(),
            "rss: expected end tag \"channel\", found end tag \"rss\""
        );
    }

    #[test]
    fn test_grammar_context_not_nested_twice() {
        let err = ParseError::DetectionFailure
            .in_grammar("atom")
            .in_grammar("rss");
        assert!(matches!(err, ParseError::Grammar { format: "atom", .. }));
        assert_eq!(err.root(), &ParseError::DetectionFailure);
    }

    #[test]
    fn test_depth_message_mentions_limit() {
        let msg = ParseError::MaxDepthExceeded(256).to_string();
        assert!(msg.contains("depth") && msg.contains("256"));
    }
}
