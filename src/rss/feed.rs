use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ext::{DublinCore, Extensions, ITunesFeed, ITunesItem, Media, YouTube};
use crate::util::{parse_date, parse_name_address, NameAddress};

/// Prefixes Atom elements embedded in RSS are commonly captured under.
const ATOM_PREFIXES: &[&str] = &["atom", "atom10", "atom03"];

/// An RSS channel (any of 0.9x, 1.0 RDF, 2.0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feed {
    pub title: String,
    /// Every `link` element in document order.
    pub links: Vec<String>,
    pub description: String,
    pub language: String,
    pub copyright: String,
    pub managing_editor: String,
    pub web_master: String,
    pub pub_date: String,
    pub pub_date_parsed: Option<DateTime<Utc>>,
    pub last_build_date: String,
    pub last_build_date_parsed: Option<DateTime<Utc>>,
    pub categories: Vec<Category>,
    pub generator: String,
    pub docs: String,
    pub ttl: String,
    pub image: Option<Image>,
    pub rating: String,
    pub skip_hours: Vec<String>,
    pub skip_days: Vec<String>,
    pub cloud: Option<Cloud>,
    pub text_input: Option<TextInput>,
    pub dublin_core: Option<DublinCore>,
    pub itunes: Option<ITunesFeed>,
    pub media: Option<Media>,
    pub youtube: Option<YouTube>,
    pub extensions: Extensions,
    pub items: Vec<Item>,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub url: String,
    pub link: String,
    pub title: String,
    pub width: String,
    pub height: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub domain: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextInput {
    pub title: String,
    pub description: String,
    pub name: String,
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cloud {
    pub domain: String,
    pub port: String,
    pub path: String,
    pub register_procedure: String,
    pub protocol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub title: String,
    pub links: Vec<String>,
    pub description: String,
    /// `content:encoded`, decoded.
    pub content: String,
    pub author: String,
    pub categories: Vec<Category>,
    pub comments: String,
    /// The first enclosure.
    pub enclosure: Option<Enclosure>,
    /// All enclosures, including the first.
    pub enclosures: Vec<Enclosure>,
    pub guid: Option<Guid>,
    pub pub_date: String,
    pub pub_date_parsed: Option<DateTime<Utc>>,
    pub source: Option<Source>,
    pub dublin_core: Option<DublinCore>,
    pub itunes: Option<ITunesItem>,
    pub media: Option<Media>,
    pub youtube: Option<YouTube>,
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Enclosure {
    pub url: String,
    pub length: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Guid {
    pub value: String,
    pub is_permalink: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
    pub title: String,
    pub url: String,
}

// ============================================================================
// Accessors
// ============================================================================
//
// Each accessor falls back from the native element to the extension
// records that commonly carry the same information. None of them parse
// anything beyond dates and author strings.

impl Feed {
    pub fn title(&self) -> &str {
        non_empty(&self.title).or_else(|| self.dc(|dc| &dc.title)).unwrap_or("")
    }

    pub fn description(&self) -> &str {
        non_empty(&self.description)
            .or_else(|| self.itunes.as_ref().and_then(|i| non_empty(&i.summary)))
            .unwrap_or("")
    }

    /// The first `link` element.
    pub fn link(&self) -> Option<&str> {
        self.links.first().map(String::as_str)
    }

    /// The `href` of an embedded `atom:link rel="self"`.
    pub fn feed_link(&self) -> Option<&str> {
        self.atom_links().find_map(|(rel, href)| (rel == "self").then_some(href))
    }

    /// Native links followed by alternate and self links from embedded Atom.
    pub fn all_links(&self) -> Vec<&str> {
        let atom = self
            .atom_links()
            .filter(|(rel, _)| matches!(*rel, "" | "alternate" | "self"))
            .map(|(_, href)| href);
        self.links.iter().map(String::as_str).chain(atom).collect()
    }

    pub fn updated(&self) -> &str {
        non_empty(&self.last_build_date)
            .or_else(|| self.dc(|dc| &dc.date))
            .unwrap_or("")
    }

    pub fn updated_parsed(&self) -> Option<DateTime<Utc>> {
        self.last_build_date_parsed
            .or_else(|| self.dc(|dc| &dc.date).and_then(parse_date))
    }

    /// Managing editor, web master, then Dublin Core and iTunes authors.
    pub fn author(&self) -> Option<NameAddress> {
        [
            non_empty(&self.managing_editor),
            non_empty(&self.web_master),
            self.dc(|dc| &dc.author),
            self.dc(|dc| &dc.creator),
            self.itunes.as_ref().and_then(|i| non_empty(&i.author)),
        ]
        .into_iter()
        .flatten()
        .next()
        .and_then(parse_name_address)
    }

    pub fn language(&self) -> &str {
        non_empty(&self.language).or_else(|| self.dc(|dc| &dc.language)).unwrap_or("")
    }

    pub fn copyright(&self) -> &str {
        non_empty(&self.copyright).or_else(|| self.dc(|dc| &dc.rights)).unwrap_or("")
    }

    /// The channel image, else the iTunes image, else the first image-typed
    /// media content.
    pub fn image(&self) -> Option<Image> {
        if let Some(image) = &self.image {
            return Some(image.clone());
        }
        let url = self
            .itunes
            .as_ref()
            .and_then(|i| non_empty(&i.image))
            .or_else(|| self.media.as_ref().and_then(image_content))?;
        Some(Image {
            url: url.to_string(),
            ..Image::default()
        })
    }

    /// Category values, iTunes keywords and categories, then `dc:subject`.
    pub fn all_categories(&self) -> Vec<&str> {
        let mut cats: Vec<&str> = self.categories.iter().map(|c| c.value.as_str()).collect();
        if let Some(itunes) = &self.itunes {
            if !itunes.keywords.is_empty() {
                cats.extend(itunes.keywords.split(','));
            }
            for category in &itunes.categories {
                cats.push(&category.text);
                if let Some(sub) = &category.subcategory {
                    cats.push(&sub.text);
                }
            }
        }
        cats.extend(self.dc(|dc| &dc.subject));
        cats
    }

    fn dc<'s>(&'s self, field: impl Fn(&'s DublinCore) -> &'s String) -> Option<&'s str> {
        self.dublin_core.as_ref().map(field).and_then(|s| non_empty(s))
    }

    fn atom_links(&self) -> impl Iterator<Item = (&str, &str)> {
        self.extensions
            .elements(ATOM_PREFIXES)
            .filter_map(|names| names.get("link"))
            .flatten()
            .map(|link| (attr(&link.attrs, "rel"), attr(&link.attrs, "href")))
    }
}

impl Item {
    pub fn title(&self) -> &str {
        non_empty(&self.title).or_else(|| self.dc(|dc| &dc.title)).unwrap_or("")
    }

    pub fn description(&self) -> &str {
        non_empty(&self.description)
            .or_else(|| self.dc(|dc| &dc.description))
            .or_else(|| self.itunes.as_ref().and_then(|i| non_empty(&i.summary)))
            .unwrap_or("")
    }

    pub fn link(&self) -> Option<&str> {
        self.links.first().map(String::as_str)
    }

    pub fn published(&self) -> &str {
        non_empty(&self.pub_date).or_else(|| self.dc(|dc| &dc.date)).unwrap_or("")
    }

    pub fn published_parsed(&self) -> Option<DateTime<Utc>> {
        self.pub_date_parsed
            .or_else(|| self.dc(|dc| &dc.date).and_then(parse_date))
    }

    /// The item author split into name and address, falling back to Dublin
    /// Core and iTunes authors.
    pub fn author_name_address(&self) -> Option<NameAddress> {
        [
            non_empty(&self.author),
            self.dc(|dc| &dc.author),
            self.dc(|dc| &dc.creator),
            self.itunes.as_ref().and_then(|i| non_empty(&i.author)),
        ]
        .into_iter()
        .flatten()
        .next()
        .and_then(parse_name_address)
    }

    pub fn guid_value(&self) -> Option<&str> {
        self.guid.as_ref().map(|g| g.value.as_str())
    }

    /// The iTunes image, else an image-typed media content, else an image
    /// enclosure.
    pub fn image_url(&self) -> Option<&str> {
        self.itunes
            .as_ref()
            .and_then(|i| non_empty(&i.image))
            .or_else(|| self.media.as_ref().and_then(image_content))
            .or_else(|| {
                self.enclosures
                    .iter()
                    .find(|e| e.kind.starts_with("image/"))
                    .map(|e| e.url.as_str())
            })
    }

    pub fn all_categories(&self) -> Vec<&str> {
        let mut cats: Vec<&str> = self.categories.iter().map(|c| c.value.as_str()).collect();
        if let Some(itunes) = self.itunes.as_ref().filter(|i| !i.keywords.is_empty()) {
            cats.extend(itunes.keywords.split(','));
        }
        cats.extend(self.dc(|dc| &dc.subject));
        cats
    }

    fn dc<'s>(&'s self, field: impl Fn(&'s DublinCore) -> &'s String) -> Option<&'s str> {
        self.dublin_core.as_ref().map(field).and_then(|s| non_empty(s))
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

fn attr<'a>(attrs: &'a std::collections::BTreeMap<String, String>, name: &str) -> &'a str {
    attrs.get(name).map(String::as_str).unwrap_or("")
}

fn image_content(media: &Media) -> Option<&str> {
    media
        .all_contents()
        .find(|c| c.kind.starts_with("image/") || c.medium == "image")
        .map(|c| c.url.as_str())
}
