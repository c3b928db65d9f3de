//! Extension elements: generic capture and namespace-specific sub-grammars.
//!
//! Elements outside a grammar's own vocabulary end up here. Dublin Core,
//! iTunes, Media RSS and YouTube have dedicated sub-grammars producing typed
//! records; everything else is captured generically as an [`Extension`]
//! tree keyed by canonical prefix and local name.

pub mod dublincore;
pub mod itunes;
pub mod media;
pub mod namespaces;
pub mod youtube;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::util::decode_text;
use crate::xml::{EventKind, TokenCursor};

pub use dublincore::DublinCore;
pub use itunes::{ITunesCategory, ITunesFeed, ITunesItem, ITunesOwner};
pub use media::{
    Media, MediaCommon, MediaCommunity, MediaContent, MediaDescription, MediaGroup,
    MediaPeerLink, MediaStarRating, MediaStatistics, MediaThumbnail,
};
pub use namespaces::{canonical_prefix, classify, owner, Dialect, Owner};
pub use youtube::YouTube;

/// Reserved prefix for unrecognized elements in a grammar's own namespace.
pub const CUSTOM_PREFIX: &str = "_custom";

/// A single captured element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub children: BTreeMap<String, Vec<Extension>>,
}

/// Captured extension elements, keyed by prefix and then local name.
///
/// Elements sharing a key keep document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extensions(BTreeMap<String, BTreeMap<String, Vec<Extension>>>);

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends `ext` under `prefix` and its own name.
    pub fn push(&mut self, prefix: &str, ext: Extension) {
        self.0
            .entry(prefix.to_string())
            .or_default()
            .entry(ext.name.clone())
            .or_default()
            .push(ext);
    }

    /// All elements captured under `prefix`.
    pub fn get(&self, prefix: &str) -> Option<&BTreeMap<String, Vec<Extension>>> {
        self.0.get(prefix)
    }

    /// Elements named `name` under `prefix`, in document order.
    pub fn elements_named(&self, prefix: &str, name: &str) -> &[Extension] {
        self.0
            .get(prefix)
            .and_then(|names| names.get(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Text values of the elements named `name` under `prefix`.
    pub fn values<'s>(&'s self, prefix: &str, name: &str) -> impl Iterator<Item = &'s str> + 's {
        self.elements_named(prefix, name)
            .iter()
            .map(|ext| ext.value.as_str())
    }

    /// Text value of the first element named `name` under `prefix`.
    pub fn first_value(&self, prefix: &str, name: &str) -> Option<&str> {
        self.values(prefix, name).next()
    }

    /// The per-prefix maps for each of `prefixes` that is present, in the
    /// order given.
    pub fn elements<'s>(
        &'s self,
        prefixes: &'s [&'s str],
    ) -> impl Iterator<Item = &'s BTreeMap<String, Vec<Extension>>> + 's {
        prefixes.iter().filter_map(|prefix| self.0.get(*prefix))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, Vec<Extension>>)> {
        self.0.iter()
    }
}

/// Captures the element under the cursor, and its subtree, as an
/// [`Extension`].
///
/// Attributes are keyed by local name. The value is the trimmed
/// concatenation of the element's own text runs; child elements are
/// captured recursively and grouped by name.
pub fn capture(cursor: &mut TokenCursor<'_>) -> Result<Extension> {
    cursor.expect(EventKind::StartTag, "*")?;

    let mut ext = Extension {
        name: cursor.name().to_string(),
        attrs: attributes_by_name(cursor),
        ..Extension::default()
    };

    let mut text = String::new();
    loop {
        match cursor.advance_collecting(&mut text)? {
            EventKind::StartTag => {
                let child = capture(cursor)?;
                ext.children
                    .entry(child.name.clone())
                    .or_default()
                    .push(child);
            }
            EventKind::EndTag => break,
        }
    }
    ext.value = text.trim().to_string();

    cursor.expect(EventKind::EndTag, &ext.name)?;
    Ok(ext)
}

/// Captures the element under the cursor into `exts` under its classified
/// prefix, or skips it when `skip_unknown` is set.
pub fn capture_into(exts: &mut Extensions, cursor: &mut TokenCursor<'_>, skip_unknown: bool) -> Result<()> {
    if skip_unknown {
        return skip_element(cursor);
    }

    let prefix = classify(cursor.namespace(), cursor).to_string();
    let ext = capture(cursor)?;
    tracing::trace!(prefix = %prefix, name = %ext.name, "captured extension element");
    exts.push(&prefix, ext);
    Ok(())
}

/// Captures an unrecognized element from the grammar's own namespace under
/// [`CUSTOM_PREFIX`], or skips it when `skip_unknown` is set.
///
/// Only attributes and decoded text are kept; nested markup is flattened.
pub fn capture_custom(exts: &mut Extensions, cursor: &mut TokenCursor<'_>, skip_unknown: bool) -> Result<()> {
    if skip_unknown {
        return skip_element(cursor);
    }

    let name = cursor.name().to_string();
    let attrs = attributes_by_name(cursor);
    let value = decode_text(&cursor.text()?);
    cursor.expect(EventKind::EndTag, &name)?;

    tracing::debug!(name = %name, "captured unknown native element");
    exts.push(
        CUSTOM_PREFIX,
        Extension {
            name,
            value,
            attrs,
            children: BTreeMap::new(),
        },
    );
    Ok(())
}

/// A grammar record that carries the sub-grammar records and the generic
/// extension tree.
pub(crate) trait ExtensionHost {
    fn dublin_core_mut(&mut self) -> &mut Option<DublinCore>;
    fn media_mut(&mut self) -> &mut Option<Media>;
    fn youtube_mut(&mut self) -> &mut Option<YouTube>;
    fn extensions_mut(&mut self) -> &mut Extensions;

    /// Feeds and items carry different iTunes records.
    fn parse_itunes(&mut self, cursor: &mut TokenCursor<'_>) -> Result<()>;
}

/// Routes the element under the cursor to a sub-grammar or to generic
/// capture.
///
/// Returns `Ok(false)` without consuming anything when the element belongs
/// to `dialect` itself.
pub(crate) fn dispatch(
    host: &mut impl ExtensionHost,
    cursor: &mut TokenCursor<'_>,
    dialect: Dialect,
    skip_unknown: bool,
) -> Result<bool> {
    match owner(cursor, dialect) {
        Owner::Grammar => return Ok(false),
        Owner::DublinCore => {
            let slot = host.dublin_core_mut();
            *slot = Some(dublincore::parse(cursor, slot.take())?);
        }
        Owner::ITunes => host.parse_itunes(cursor)?,
        Owner::Media => {
            let slot = host.media_mut();
            *slot = Some(media::parse(cursor, slot.take())?);
        }
        Owner::YouTube => {
            let slot = host.youtube_mut();
            *slot = Some(youtube::parse(cursor, slot.take())?);
        }
        Owner::Generic(_) => capture_into(host.extensions_mut(), cursor, skip_unknown)?,
    }
    Ok(true)
}

/// Skips the element under the cursor, verifying its end tag.
pub(crate) fn skip_element(cursor: &mut TokenCursor<'_>) -> Result<()> {
    let name = cursor.name().to_string();
    cursor.skip()?;
    cursor.expect(EventKind::EndTag, &name)
}

fn attributes_by_name(cursor: &TokenCursor<'_>) -> BTreeMap<String, String> {
    cursor
        .attributes()
        .iter()
        .map(|attr| (attr.name.clone(), attr.value.clone()))
        .collect()
}
