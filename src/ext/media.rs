//! Media RSS (`http://search.yahoo.com/mrss/`).
//!
//! `media:content`, `media:group` and the top-level record share the same
//! set of descriptive children, kept in [`MediaCommon`]. Elements that
//! carry no usable URL (contents, thumbnails, peer links) are dropped.

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result};
use crate::xml::TokenCursor;

use super::skip_element;

/// Media RSS elements attached to a channel, feed, item or entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Media {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<MediaGroup>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<MediaContent>,
    #[serde(flatten)]
    pub common: MediaCommon,
}

/// Children allowed at the top level, inside groups and inside contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaCommon {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub thumbnails: Vec<MediaThumbnail>,
    /// URLs of `thumbnails`, in the same order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub thumbnail_urls: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub titles: Vec<MediaDescription>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub descriptions: Vec<MediaDescription>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub peer_links: Vec<MediaPeerLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaGroup {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<MediaContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community: Option<MediaCommunity>,
    #[serde(flatten)]
    pub common: MediaCommon,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaContent {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub file_size: String,
    pub medium: String,
    pub height: i64,
    pub width: i64,
    #[serde(flatten)]
    pub common: MediaCommon,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaThumbnail {
    pub url: String,
    pub height: i64,
    pub width: i64,
}

/// A `media:title` or `media:description`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaDescription {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaPeerLink {
    #[serde(rename = "href")]
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaCommunity {
    pub star_rating: MediaStarRating,
    pub statistics: MediaStatistics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaStarRating {
    pub average: f64,
    pub count: i64,
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaStatistics {
    pub views: i64,
    pub favorites: i64,
}

// ============================================================================
// Accessors
// ============================================================================

impl Media {
    /// Categories from the top level, then contents, then groups.
    pub fn all_categories(&self) -> impl Iterator<Item = &str> {
        let contents = self.contents.iter().flat_map(|c| &c.common.categories);
        let groups = self.groups.iter().flat_map(MediaGroup::all_categories);
        self.common
            .categories
            .iter()
            .chain(contents)
            .map(String::as_str)
            .chain(groups)
    }

    /// Top-level contents followed by the contents of every group.
    pub fn all_contents(&self) -> impl Iterator<Item = &MediaContent> {
        self.contents
            .iter()
            .chain(self.groups.iter().flat_map(|g| &g.contents))
    }

    pub fn all_thumbnails(&self) -> impl Iterator<Item = &str> {
        let contents = self.contents.iter().flat_map(|c| &c.common.thumbnail_urls);
        let groups = self.groups.iter().flat_map(MediaGroup::all_thumbnails);
        self.common
            .thumbnail_urls
            .iter()
            .chain(contents)
            .map(String::as_str)
            .chain(groups)
    }

    pub fn all_peer_links(&self) -> impl Iterator<Item = &MediaPeerLink> {
        let contents = self.contents.iter().flat_map(|c| &c.common.peer_links);
        let groups = self.groups.iter().flat_map(MediaGroup::all_peer_links);
        self.common.peer_links.iter().chain(contents).chain(groups)
    }

    /// The first description typed `html`, searching the top level, then
    /// contents, then groups.
    pub fn description(&self) -> Option<&str> {
        let top = self.common.descriptions.iter();
        let contents = self.contents.iter().flat_map(|c| &c.common.descriptions);
        let groups = self.groups.iter().flat_map(|g| {
            g.common
                .descriptions
                .iter()
                .chain(g.contents.iter().flat_map(|c| &c.common.descriptions))
        });
        top.chain(contents)
            .chain(groups)
            .find(|d| d.kind == "html")
            .map(|d| d.text.as_str())
    }
}

impl MediaGroup {
    pub fn all_categories(&self) -> impl Iterator<Item = &str> {
        self.common
            .categories
            .iter()
            .chain(self.contents.iter().flat_map(|c| &c.common.categories))
            .map(String::as_str)
    }

    pub fn all_thumbnails(&self) -> impl Iterator<Item = &str> {
        self.common
            .thumbnail_urls
            .iter()
            .chain(self.contents.iter().flat_map(|c| &c.common.thumbnail_urls))
            .map(String::as_str)
    }

    pub fn all_peer_links(&self) -> impl Iterator<Item = &MediaPeerLink> {
        self.common
            .peer_links
            .iter()
            .chain(self.contents.iter().flat_map(|c| &c.common.peer_links))
    }
}

// ============================================================================
// Grammar
// ============================================================================

/// Parses one `media:*` element into `existing` (or a fresh record).
///
/// # Errors
///
/// Returns [`ParseError::AttributeTypeFailure`] when a numeric attribute
/// (dimensions, ratings, statistics) is present but malformed.
pub fn parse(cursor: &mut TokenCursor<'_>, existing: Option<Media>) -> Result<Media> {
    let mut media = existing.unwrap_or_default();
    let name = cursor.lower_name();

    match name.as_str() {
        "group" => media.groups.push(group(cursor, &name)?),
        "content" => {
            if let Some(content) = content(cursor, &name)? {
                media.contents.push(content);
            }
        }
        other => {
            if !media.common.parse_child(cursor, other)? {
                skip_element(cursor)?;
            }
        }
    }
    Ok(media)
}

impl MediaCommon {
    /// Consumes the element under the cursor if it is one of the shared
    /// children; returns `false` and leaves it untouched otherwise.
    fn parse_child(&mut self, cursor: &mut TokenCursor<'_>, name: &str) -> Result<bool> {
        match name {
            "category" => {
                let label = cursor.with_skip(name, |c| Ok(c.attribute("label").to_string()))?;
                if !label.trim().is_empty() {
                    self.categories.push(label);
                }
            }
            "thumbnail" => {
                let thumbnail = thumbnail(cursor, name)?;
                if !thumbnail.url.is_empty() {
                    self.thumbnail_urls.push(thumbnail.url.clone());
                    self.thumbnails.push(thumbnail);
                }
            }
            "title" => self.titles.push(description(cursor, name)?),
            "description" => self.descriptions.push(description(cursor, name)?),
            "peerlink" => {
                let link = cursor.with_skip(name, |c| {
                    Ok(MediaPeerLink {
                        url: c.attribute("href").to_string(),
                        kind: c.attribute("type").to_string(),
                    })
                })?;
                if !link.url.is_empty() {
                    self.peer_links.push(link);
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

fn group(cursor: &mut TokenCursor<'_>, name: &str) -> Result<MediaGroup> {
    cursor.parsing_element(
        name,
        |_| Ok(MediaGroup::default()),
        |c, group: &mut MediaGroup| {
            let child = c.lower_name();
            match child.as_str() {
                "content" => {
                    if let Some(content) = content(c, &child)? {
                        group.contents.push(content);
                    }
                }
                "community" => group.community = Some(community(c, &child)?),
                other => {
                    group.common.parse_child(c, other)?;
                }
            }
            Ok(())
        },
    )
}

/// Returns `None` when the content has no `url`.
fn content(cursor: &mut TokenCursor<'_>, name: &str) -> Result<Option<MediaContent>> {
    let content = cursor.parsing_element(
        name,
        |c| {
            let mut content = MediaContent::default();
            for attr in c.attributes() {
                let value = attr.value.as_str();
                match attr.name.as_str() {
                    "url" => content.url = value.to_string(),
                    "type" => content.kind = value.to_string(),
                    "filesize" | "fileSize" => content.file_size = value.to_string(),
                    "medium" => content.medium = value.to_string(),
                    "height" => content.height = parse_int("height", value)?,
                    "width" => content.width = parse_int("width", value)?,
                    _ => {}
                }
            }
            Ok(content)
        },
        |c, content: &mut MediaContent| {
            let child = c.lower_name();
            content.common.parse_child(c, &child)?;
            Ok(())
        },
    )?;

    Ok(Some(content).filter(|c| !c.url.is_empty()))
}

fn thumbnail(cursor: &mut TokenCursor<'_>, name: &str) -> Result<MediaThumbnail> {
    cursor.with_skip(name, |c| {
        let mut thumbnail = MediaThumbnail::default();
        for attr in c.attributes() {
            let value = attr.value.as_str();
            match attr.name.as_str() {
                "url" => thumbnail.url = value.to_string(),
                "height" => thumbnail.height = parse_int("height", value)?,
                "width" => thumbnail.width = parse_int("width", value)?,
                _ => {}
            }
        }
        Ok(thumbnail)
    })
}

fn description(cursor: &mut TokenCursor<'_>, name: &str) -> Result<MediaDescription> {
    let kind = cursor.attribute("type").to_string();
    let text = cursor.with_text(name)?;
    Ok(MediaDescription { kind, text })
}

fn community(cursor: &mut TokenCursor<'_>, name: &str) -> Result<MediaCommunity> {
    cursor.parsing_element(
        name,
        |_| Ok(MediaCommunity::default()),
        |c, community: &mut MediaCommunity| {
            let child = c.lower_name();
            match child.as_str() {
                "starrating" => community.star_rating = c.with_skip(&child, star_rating)?,
                "statistics" => community.statistics = c.with_skip(&child, statistics)?,
                _ => {}
            }
            Ok(())
        },
    )
}

fn star_rating(cursor: &TokenCursor<'_>) -> Result<MediaStarRating> {
    let mut rating = MediaStarRating::default();
    for attr in cursor.attributes() {
        let value = attr.value.as_str();
        match attr.name.as_str() {
            "average" => rating.average = parse_float("average", value)?,
            "count" => rating.count = parse_int("count", value)?,
            "min" => rating.min = parse_int("min", value)?,
            "max" => rating.max = parse_int("max", value)?,
            _ => {}
        }
    }
    Ok(rating)
}

fn statistics(cursor: &TokenCursor<'_>) -> Result<MediaStatistics> {
    let mut stats = MediaStatistics::default();
    for attr in cursor.attributes() {
        let value = attr.value.as_str();
        match attr.name.as_str() {
            "views" => stats.views = parse_int("views", value)?,
            "favorites" => stats.favorites = parse_int("favorites", value)?,
            _ => {}
        }
    }
    Ok(stats)
}

/// Empty values read as zero.
fn parse_int(name: &str, value: &str) -> Result<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse()
        .map_err(|_| type_failure(name, value, "integer"))
}

fn parse_float(name: &str, value: &str) -> Result<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse()
        .map_err(|_| type_failure(name, value, "float"))
}

fn type_failure(name: &str, value: &str, expected: &'static str) -> ParseError {
    ParseError::AttributeTypeFailure {
        name: name.to_string(),
        value: value.to_string(),
        expected,
    }
}
