use crate::xml::TokenCursor;

/// Namespaces the RSS grammar treats as its own.
const RSS_NAMESPACES: &[&str] = &[
    "http://purl.org/rss/1.0/",
    "http://channel.netscape.com/rdf/simple/0.9/",
    "http://my.netscape.com/rdf/simple/0.9/",
    "http://backend.userland.com/rss2",
];

/// Namespaces the Atom grammar treats as its own.
const ATOM_NAMESPACES: &[&str] = &["http://www.w3.org/2005/Atom", "http://purl.org/atom/ns#"];

/// Prefixes whose elements always belong to the grammar.
const NATIVE_PREFIXES: &[&str] = &["", "rss", "rdf", "content"];

/// The grammar an element is being dispatched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Rss,
    Atom,
}

impl Dialect {
    fn owns_namespace(self, namespace: &str) -> bool {
        let own = match self {
            Dialect::Rss => RSS_NAMESPACES,
            Dialect::Atom => ATOM_NAMESPACES,
        };
        own.contains(&namespace)
    }
}

/// Who handles an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    /// The feed grammar itself.
    Grammar,
    DublinCore,
    ITunes,
    Media,
    YouTube,
    /// Generic capture under the given prefix.
    Generic(String),
}

/// Returns the canonical prefix for a well-known namespace URI.
///
/// Canonical prefixes override whatever prefix a document chose, so
/// `<foo:title xmlns:foo="http://purl.org/dc/elements/1.1/">` is still
/// keyed as `dc`. The table follows feedparser's list, plus YouTube.
pub fn canonical_prefix(namespace: &str) -> Option<&'static str> {
    let prefix = match namespace {
        "http://webns.net/mvcb/" => "admin",
        "http://purl.org/rss/1.0/modules/aggregation/" => "ag",
        "http://purl.org/rss/1.0/modules/annotate/" => "annotate",
        "http://media.tangent.org/rss/1.0/" => "audio",
        "http://backend.userland.com/blogChannelModule" => "blogChannel",
        "http://creativecommons.org/ns#license" | "http://web.resource.org/cc/" => "cc",
        "http://cyber.law.harvard.edu/rss/creativeCommonsRssModule.html"
        | "http://backend.userland.com/creativeCommonsRssModule" => "creativeCommons",
        "http://purl.org/rss/1.0/modules/company" => "co",
        "http://purl.org/rss/1.0/modules/content/" => "content",
        "http://my.theinfo.org/changed/1.0/rss/" => "cp",
        "http://purl.org/dc/elements/1.1/" => "dc",
        "http://purl.org/dc/terms/" => "dcterms",
        "http://purl.org/rss/1.0/modules/email/" => "email",
        "http://purl.org/rss/1.0/modules/event/" => "ev",
        "http://rssnamespace.org/feedburner/ext/1.0" => "feedburner",
        "http://freshmeat.net/rss/fm/" => "fm",
        "http://xmlns.com/foaf/0.1/" => "foaf",
        "http://www.w3.org/2003/01/geo/wgs84_pos#" => "geo",
        "http://www.georss.org/georss" => "georss",
        "http://www.opengis.net/gml" => "gml",
        "http://postneo.com/icbm/" => "icbm",
        "http://purl.org/rss/1.0/modules/image/" => "image",
        "http://www.itunes.com/DTDs/PodCast-1.0.dtd" | "http://example.com/DTDs/PodCast-1.0.dtd" => {
            "itunes"
        }
        "http://purl.org/rss/1.0/modules/link/" => "l",
        "http://search.yahoo.com/mrss" | "http://search.yahoo.com/mrss/" => "media",
        "http://madskills.com/public/xml/rss/module/pingback/" => "pingback",
        "http://prismstandard.org/namespaces/1.2/basic/" => "prism",
        "http://www.w3.org/1999/02/22-rdf-syntax-ns#" => "rdf",
        "http://www.w3.org/2000/01/rdf-schema#" => "rdfs",
        "http://purl.org/rss/1.0/modules/reference/" => "ref",
        "http://purl.org/rss/1.0/modules/richequiv/" => "reqv",
        "http://purl.org/rss/1.0/modules/search/" => "search",
        "http://purl.org/rss/1.0/modules/slash/" => "slash",
        "http://schemas.xmlsoap.org/soap/envelope/" => "soap",
        "http://purl.org/rss/1.0/modules/servicestatus/" => "ss",
        "http://hacks.benhammersley.com/rss/streaming/" => "str",
        "http://purl.org/rss/1.0/modules/subscription/" => "sub",
        "http://purl.org/rss/1.0/modules/syndication/" => "sy",
        "http://schemas.pocketsoap.com/rss/myDescModule/" => "szf",
        "http://purl.org/rss/1.0/modules/taxonomy/" => "taxo",
        "http://purl.org/rss/1.0/modules/threading/" => "thr",
        "http://purl.org/rss/1.0/modules/textinput/" => "ti",
        "http://madskills.com/public/xml/rss/module/trackback/" => "trackback",
        "http://wellformedweb.org/commentAPI/" => "wfw",
        "http://purl.org/rss/1.0/modules/wiki/" => "wiki",
        "http://www.w3.org/1999/xhtml" => "xhtml",
        "http://www.w3.org/1999/xlink" => "xlink",
        "http://www.w3.org/XML/1998/namespace" => "xml",
        "http://podlove.org/simple-chapters" => "psc",
        "http://www.youtube.com/xml/schemas/2015" => "yt",
        _ => return None,
    };
    Some(prefix)
}

/// Maps a namespace URI to the prefix used as the extension key.
///
/// Lookup order: canonical table, then the prefix the document declared,
/// then the namespace string itself.
pub fn classify<'c>(namespace: &'c str, cursor: &'c TokenCursor<'_>) -> &'c str {
    canonical_prefix(namespace)
        .or_else(|| cursor.declared_prefix(namespace))
        .unwrap_or(namespace)
}

/// Decides who handles the element under the cursor.
pub fn owner(cursor: &TokenCursor<'_>, dialect: Dialect) -> Owner {
    let namespace = cursor.namespace();
    if namespace.is_empty() || dialect.owns_namespace(namespace) {
        return Owner::Grammar;
    }

    match classify(namespace, cursor) {
        prefix if NATIVE_PREFIXES.contains(&prefix) => Owner::Grammar,
        "dc" => Owner::DublinCore,
        "itunes" => Owner::ITunes,
        "media" => Owner::Media,
        "yt" => Owner::YouTube,
        prefix => Owner::Generic(prefix.to_string()),
    }
}
