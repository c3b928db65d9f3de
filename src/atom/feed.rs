use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ext::{DublinCore, Extensions, ITunesFeed, ITunesItem, Media, YouTube};

/// An Atom 0.3 or 1.0 feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feed {
    pub title: String,
    pub id: String,
    pub updated: String,
    pub updated_parsed: Option<DateTime<Utc>>,
    pub subtitle: String,
    pub links: Vec<Link>,
    /// From `xml:lang` on the root.
    pub language: String,
    pub generator: Option<Generator>,
    pub icon: String,
    pub logo: String,
    pub rights: String,
    pub contributors: Vec<Person>,
    pub authors: Vec<Person>,
    pub categories: Vec<Category>,
    pub entries: Vec<Entry>,
    pub dublin_core: Option<DublinCore>,
    pub itunes: Option<ITunesFeed>,
    pub media: Option<Media>,
    pub youtube: Option<YouTube>,
    pub extensions: Extensions,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    pub title: String,
    pub id: String,
    pub updated: String,
    pub updated_parsed: Option<DateTime<Utc>>,
    pub summary: String,
    pub authors: Vec<Person>,
    pub contributors: Vec<Person>,
    pub categories: Vec<Category>,
    pub links: Vec<Link>,
    pub rights: String,
    pub published: String,
    pub published_parsed: Option<DateTime<Utc>>,
    pub source: Option<Source>,
    pub content: Option<Content>,
    pub dublin_core: Option<DublinCore>,
    pub itunes: Option<ITunesItem>,
    pub media: Option<Media>,
    pub youtube: Option<YouTube>,
    pub extensions: Extensions,
}

/// Metadata of the feed an entry was copied from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
    pub title: String,
    pub id: String,
    pub updated: String,
    pub updated_parsed: Option<DateTime<Utc>>,
    pub subtitle: String,
    pub links: Vec<Link>,
    pub generator: Option<Generator>,
    pub icon: String,
    pub logo: String,
    pub rights: String,
    pub contributors: Vec<Person>,
    pub authors: Vec<Person>,
    pub categories: Vec<Category>,
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    pub name: String,
    pub email: String,
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub href: String,
    pub hreflang: String,
    pub rel: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub length: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub term: String,
    pub scheme: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Generator {
    pub value: String,
    pub uri: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Content {
    pub src: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Feed {
    /// The first `alternate` link.
    pub fn link(&self) -> Option<&str> {
        first_link_with_rel(&self.links, "alternate")
    }

    /// The first `self` link.
    pub fn feed_link(&self) -> Option<&str> {
        first_link_with_rel(&self.links, "self")
    }

    /// Hrefs of the alternate and self links.
    pub fn all_links(&self) -> Vec<&str> {
        public_links(&self.links)
    }

    pub fn author(&self) -> Option<&Person> {
        self.authors.first()
    }

    /// The logo, falling back to the icon.
    pub fn image_url(&self) -> Option<&str> {
        [self.logo.as_str(), self.icon.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
    }

    /// Generator name, version and URI as one string, e.g. `"Hugo v0.1 https://gohugo.io"`.
    pub fn generator_description(&self) -> Option<String> {
        let generator = self.generator.as_ref()?;
        let mut out = generator.value.clone();
        if !generator.version.is_empty() {
            out.push_str(" v");
            out.push_str(&generator.version);
        }
        if !generator.uri.is_empty() {
            out.push(' ');
            out.push_str(&generator.uri);
        }
        Some(out.trim().to_string())
    }

    pub fn all_categories(&self) -> Vec<&str> {
        self.categories.iter().map(Category::display).collect()
    }
}

impl Entry {
    /// The first `alternate` link.
    pub fn link(&self) -> Option<&str> {
        first_link_with_rel(&self.links, "alternate")
    }

    pub fn all_links(&self) -> Vec<&str> {
        public_links(&self.links)
    }

    pub fn author(&self) -> Option<&Person> {
        self.authors.first()
    }

    /// The content, else the summary, else an HTML media description.
    pub fn content_text(&self) -> Option<&str> {
        if let Some(content) = &self.content {
            return Some(&content.value);
        }
        if !self.summary.is_empty() {
            return Some(&self.summary);
        }
        self.media.as_ref().and_then(Media::description)
    }

    /// Published date, falling back to the update date.
    pub fn published_or_updated(&self) -> &str {
        if self.published.is_empty() {
            &self.updated
        } else {
            &self.published
        }
    }

    pub fn published_or_updated_parsed(&self) -> Option<DateTime<Utc>> {
        self.published_parsed.or(self.updated_parsed)
    }

    pub fn all_categories(&self) -> Vec<&str> {
        self.categories.iter().map(Category::display).collect()
    }
}

impl Category {
    /// The label when present, otherwise the term.
    pub fn display(&self) -> &str {
        if self.label.is_empty() {
            &self.term
        } else {
            &self.label
        }
    }
}

fn first_link_with_rel<'a>(links: &'a [Link], rel: &str) -> Option<&'a str> {
    links
        .iter()
        .find(|link| link.rel == rel)
        .map(|link| link.href.as_str())
}

fn public_links(links: &[Link]) -> Vec<&str> {
    links
        .iter()
        .filter(|link| matches!(link.rel.as_str(), "" | "alternate" | "self"))
        .map(|link| link.href.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn link(rel: &str, href: &str) -> Link {
        Link {
            rel: rel.into(),
            href: href.into(),
            ..Link::default()
        }
    }

    #[test]
    fn test_links_by_rel() {
        let feed = Feed {
            links: vec![
                link("hub", "http://hub/"),
                link("self", "http://example.com/atom"),
                link("alternate", "http://example.com/"),
            ],
            ..Feed::default()
        };
        assert_eq!(feed.link(), Some("http://example.com/"));
        assert_eq!(feed.feed_link(), Some("http://example.com/atom"));
        assert_eq!(
            feed.all_links(),
            vec!["http://example.com/atom", "http://example.com/"]
        );
    }

    #[test]
    fn test_generator_description() {
        let feed = Feed {
            generator: Some(Generator {
                value: "Hugo".into(),
                uri: "https://gohugo.io".into(),
                version: "0.1".into(),
            }),
            ..Feed::default()
        };
        assert_eq!(
            feed.generator_description().as_deref(),
            Some("Hugo v0.1 https://gohugo.io")
        );
    }

    #[test]
    fn test_entry_fallbacks() {
        let entry = Entry {
            summary: "short".into(),
            updated: "2024-01-01T00:00:00Z".into(),
            categories: vec![
                Category {
                    term: "t".into(),
                    ..Category::default()
                },
                Category {
                    term: "t2".into(),
                    label: "Label".into(),
                    ..Category::default()
                },
            ],
            ..Entry::default()
        };
        assert_eq!(entry.content_text(), Some("short"));
        assert_eq!(entry.published_or_updated(), "2024-01-01T00:00:00Z");
        assert_eq!(entry.all_categories(), vec!["t", "Label"]);
    }
}
