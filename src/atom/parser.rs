use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::ext::{
    self, capture_custom, capture_into, itunes, owner, Dialect, DublinCore, ExtensionHost,
    Extensions, Media, Owner, YouTube,
};
use crate::util::parse_date;
use crate::xml::{EventKind, TokenCursor};

use super::feed::{Category, Content, Entry, Feed, Generator, Link, Person, Source};
use super::text::{decode_text_construct, resolve_uri_element};

/// Parses an Atom 0.3 or 1.0 document.
///
/// The cursor must be fresh; the root element is located first and must be
/// `feed`. Unknown Atom elements in the feed and entries are captured under
/// `_custom` unless `skip_unknown` is set.
///
/// # Errors
///
/// Returns the first structural error recorded by the cursor.
pub fn parse(cursor: &mut TokenCursor<'_>, skip_unknown: bool) -> Result<Feed> {
    cursor.find_root()?;

    let feed = cursor.parsing_element(
        "feed",
        |c| {
            Ok(Feed {
                language: c.attribute("lang").to_string(),
                version: version(c),
                ..Feed::default()
            })
        },
        |c, feed: &mut Feed| {
            if ext::dispatch(feed, c, Dialect::Atom, skip_unknown)? {
                return Ok(());
            }

            let name = c.lower_name();
            match name.as_str() {
                "title" => feed.title = text(c)?,
                "id" => feed.id = text(c)?,
                "updated" | "modified" => (feed.updated, feed.updated_parsed) = date(c)?,
                "subtitle" | "tagline" => feed.subtitle = text(c)?,
                "link" => feed.links.push(link(c)?),
                "generator" => feed.generator = Some(generator(c)?),
                "icon" => feed.icon = text(c)?,
                "logo" => feed.logo = text(c)?,
                "rights" | "copyright" => feed.rights = text(c)?,
                "contributor" => feed.contributors.push(person(c, &name)?),
                "author" => feed.authors.push(person(c, &name)?),
                "category" => feed.categories.push(category(c)?),
                "entry" => feed.entries.push(entry(c, skip_unknown)?),
                _ => capture_custom(&mut feed.extensions, c, skip_unknown)?,
            }
            Ok(())
        },
    )?;

    tracing::debug!(version = %feed.version, entries = feed.entries.len(), "parsed Atom feed");
    Ok(feed)
}

fn version(cursor: &TokenCursor<'_>) -> String {
    match (cursor.attribute("version"), cursor.attribute("xmlns")) {
        ("", "http://purl.org/atom/ns#") => "0.3".to_string(),
        ("", "http://www.w3.org/2005/Atom") => "1.0".to_string(),
        (version, _) => version.to_string(),
    }
}

fn entry(cursor: &mut TokenCursor<'_>, skip_unknown: bool) -> Result<Entry> {
    cursor.parsing_element("entry", |_| Ok(Entry::default()), |c, entry: &mut Entry| {
        if ext::dispatch(entry, c, Dialect::Atom, skip_unknown)? {
            return Ok(());
        }

        let name = c.lower_name();
        match name.as_str() {
            "title" => entry.title = text(c)?,
            "id" => entry.id = text(c)?,
            "rights" | "copyright" => entry.rights = text(c)?,
            "summary" => entry.summary = text(c)?,
            "source" => entry.source = Some(source(c, skip_unknown)?),
            "updated" | "modified" => (entry.updated, entry.updated_parsed) = date(c)?,
            "published" | "issued" => (entry.published, entry.published_parsed) = date(c)?,
            "contributor" => entry.contributors.push(person(c, &name)?),
            "author" => entry.authors.push(person(c, &name)?),
            "category" => entry.categories.push(category(c)?),
            "link" => entry.links.push(link(c)?),
            "content" => entry.content = Some(content(c)?),
            _ => capture_custom(&mut entry.extensions, c, skip_unknown)?,
        }
        Ok(())
    })
}

/// A `source` is shaped like a feed without entries. Only generic
/// extension capture applies inside it; unknown Atom elements are dropped.
fn source(cursor: &mut TokenCursor<'_>, skip_unknown: bool) -> Result<Source> {
    cursor.parsing_element("source", |_| Ok(Source::default()), |c, source: &mut Source| {
        if owner(c, Dialect::Atom) != Owner::Grammar {
            return capture_into(&mut source.extensions, c, skip_unknown);
        }

        let name = c.lower_name();
        match name.as_str() {
            "title" => source.title = text(c)?,
            "id" => source.id = text(c)?,
            "updated" | "modified" => (source.updated, source.updated_parsed) = date(c)?,
            "subtitle" | "tagline" => source.subtitle = text(c)?,
            "link" => source.links.push(link(c)?),
            "generator" => source.generator = Some(generator(c)?),
            "icon" => source.icon = text(c)?,
            "logo" => source.logo = text(c)?,
            "rights" | "copyright" => source.rights = text(c)?,
            "contributor" => source.contributors.push(person(c, &name)?),
            "author" => source.authors.push(person(c, &name)?),
            "category" => source.categories.push(category(c)?),
            _ => {}
        }
        Ok(())
    })
}

// ============================================================================
// Constructs
// ============================================================================

/// Reads a text construct and decodes it per its `type`/`mode`.
///
/// URI-valued elements (`id`, `icon`, `logo`, `uri`, `url`) are resolved
/// against the base in effect on the element itself.
fn text(cursor: &mut TokenCursor<'_>) -> Result<String> {
    let name = cursor.lower_name();
    let base = cursor
        .bases()
        .current()
        .filter(|_| cursor.resolves_uris())
        .cloned();
    let kind = cursor.attribute("type").to_string();
    let mode = cursor.attribute("mode").to_string();

    let inner = cursor.inner_markup()?;
    cursor.expect(EventKind::EndTag, &name)?;

    let value = decode_text_construct(&kind, &mode, &inner);
    Ok(resolve_uri_element(&name, base.as_ref(), value))
}

/// A date construct. An unparseable date keeps its raw text and no parsed
/// value.
fn date(cursor: &mut TokenCursor<'_>) -> Result<(String, Option<DateTime<Utc>>)> {
    let raw = text(cursor)?;
    let parsed = parse_date(&raw);
    Ok((raw, parsed))
}

fn person(cursor: &mut TokenCursor<'_>, name: &str) -> Result<Person> {
    cursor.parsing_element(name, |_| Ok(Person::default()), |c, person: &mut Person| {
        match c.lower_name().as_str() {
            "name" => person.name = text(c)?,
            "email" => person.email = text(c)?,
            "uri" | "url" | "homepage" => person.uri = text(c)?,
            _ => {}
        }
        Ok(())
    })
}

fn link(cursor: &mut TokenCursor<'_>) -> Result<Link> {
    cursor.with_skip("link", |c| {
        let rel = match c.attribute("rel") {
            "" => "alternate",
            rel => rel,
        };
        Ok(Link {
            href: c.attribute("href").to_string(),
            hreflang: c.attribute("hreflang").to_string(),
            rel: rel.to_string(),
            kind: c.attribute("type").to_string(),
            title: c.attribute("title").to_string(),
            length: c.attribute("length").to_string(),
        })
    })
}

fn category(cursor: &mut TokenCursor<'_>) -> Result<Category> {
    cursor.with_skip("category", |c| {
        Ok(Category {
            term: c.attribute("term").to_string(),
            scheme: c.attribute("scheme").to_string(),
            label: c.attribute("label").to_string(),
        })
    })
}

fn generator(cursor: &mut TokenCursor<'_>) -> Result<Generator> {
    let version = cursor.attribute("version").to_string();
    // Atom 0.3 used `url`
    let uri = match cursor.attribute("uri") {
        "" => cursor.attribute("url"),
        uri => uri,
    }
    .to_string();
    let value = text(cursor)?;
    Ok(Generator {
        value,
        uri,
        version,
    })
}

fn content(cursor: &mut TokenCursor<'_>) -> Result<Content> {
    let kind = cursor.attribute("type").to_string();
    let src = cursor.attribute("src").to_string();
    let value = text(cursor)?;
    Ok(Content { src, kind, value })
}

// ============================================================================
// Extension routing
// ============================================================================

impl ExtensionHost for Feed {
    fn dublin_core_mut(&mut self) -> &mut Option<DublinCore> {
        &mut self.dublin_core
    }

    fn media_mut(&mut self) -> &mut Option<Media> {
        &mut self.media
    }

    fn youtube_mut(&mut self) -> &mut Option<YouTube> {
        &mut self.youtube
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    fn parse_itunes(&mut self, cursor: &mut TokenCursor<'_>) -> Result<()> {
        self.itunes = Some(itunes::parse_feed(cursor, self.itunes.take())?);
        Ok(())
    }
}

impl ExtensionHost for Entry {
    fn dublin_core_mut(&mut self) -> &mut Option<DublinCore> {
        &mut self.dublin_core
    }

    fn media_mut(&mut self) -> &mut Option<Media> {
        &mut self.media
    }

    fn youtube_mut(&mut self) -> &mut Option<YouTube> {
        &mut self.youtube
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    fn parse_itunes(&mut self, cursor: &mut TokenCursor<'_>) -> Result<()> {
        self.itunes = Some(itunes::parse_item(cursor, self.itunes.take())?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::ext::CUSTOM_PREFIX;
    use pretty_assertions::assert_eq;

    fn parse_str(doc: &str) -> Result<Feed> {
        let mut cursor = TokenCursor::new(doc);
        parse(&mut cursor, false)
    }

    #[test]
    fn test_feed_fields() {
        let feed = parse_str(
            r#"<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="en-US">
                <title type="text">Example &amp; Co</title>
                <subtitle type="html">&lt;em&gt;news&lt;/em&gt;</subtitle>
                <id>urn:uuid:60a76c80</id>
                <updated>2003-12-13T18:30:02Z</updated>
                <link href="http://example.org/"/>
                <link rel="self" href="http://example.org/feed.atom" type="application/atom+xml"/>
                <generator uri="http://gen/" version="1.0">Gen</generator>
                <author><name>John</name><email>j@example.org</email><uri>http://j/</uri></author>
                <category term="tech" scheme="http://s/" label="Technology"/>
                <rights>(c) 2003</rights>
            </feed>"#,
        )
        .unwrap();

        assert_eq!(feed.version, "1.0");
        assert_eq!(feed.language, "en-US");
        assert_eq!(feed.title, "Example & Co");
        assert_eq!(feed.subtitle, "<em>news</em>");
        assert_eq!(feed.id, "urn:uuid:60a76c80");
        assert_eq!(
            feed.updated_parsed.map(|d| d.to_rfc3339()).as_deref(),
            Some("2003-12-13T18:30:02+00:00")
        );
        assert_eq!(feed.link(), Some("http://example.org/"));
        assert_eq!(feed.feed_link(), Some("http://example.org/feed.atom"));
        assert_eq!(
            feed.generator,
            Some(Generator {
                value: "Gen".into(),
                uri: "http://gen/".into(),
                version: "1.0".into(),
            })
        );
        assert_eq!(
            feed.authors,
            vec![Person {
                name: "John".into(),
                email: "j@example.org".into(),
                uri: "http://j/".into(),
            }]
        );
        assert_eq!(feed.categories[0].label, "Technology");
        assert_eq!(feed.rights, "(c) 2003");
        assert!(feed.entries.is_empty());
    }

    #[test]
    fn test_atom_03() {
        let feed = parse_str(
            r#"<feed version="0.3" xmlns="http://purl.org/atom/ns#">
                <tagline>Old</tagline>
                <modified>2003-12-13T18:30:02Z</modified>
                <copyright>mine</copyright>
                <generator url="http://gen/">Gen</generator>
                <entry><issued>2003-12-13T08:29:29-04:00</issued><author><url>http://a/</url></author></entry>
            </feed>"#,
        )
        .unwrap();
        assert_eq!(feed.version, "0.3");
        assert_eq!(feed.subtitle, "Old");
        assert_eq!(feed.updated, "2003-12-13T18:30:02Z");
        assert_eq!(feed.rights, "mine");
        assert_eq!(feed.generator.unwrap().uri, "http://gen/");
        let entry = &feed.entries[0];
        assert_eq!(
            entry.published_parsed.map(|d| d.to_rfc3339()).as_deref(),
            Some("2003-12-13T12:29:29+00:00")
        );
        assert_eq!(entry.authors[0].uri, "http://a/");
    }

    #[test]
    fn test_version_from_namespace_when_attribute_missing() {
        let feed = parse_str(r#"<feed xmlns="http://purl.org/atom/ns#"/>"#).unwrap();
        assert_eq!(feed.version, "0.3");
        let feed = parse_str("<feed/>").unwrap();
        assert_eq!(feed.version, "");
    }

    #[test]
    fn test_entry_content_kinds() {
        let feed = parse_str(
            r#"<feed xmlns="http://www.w3.org/2005/Atom">
                <entry>
                  <title type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml">Hi <b>there</b></div></title>
                  <summary>a &amp; b</summary>
                  <content type="html" src="http://c/"><![CDATA[<p>x</p>]]></content>
                  <link href="http://e/1"/>
                </entry>
              </feed>"#,
        )
        .unwrap();
        let entry = &feed.entries[0];
        assert_eq!(entry.title, "Hi <b>there</b>");
        assert_eq!(entry.summary, "a & b");
        assert_eq!(
            entry.content,
            Some(Content {
                src: "http://c/".into(),
                kind: "html".into(),
                value: "<p>x</p>".into(),
            })
        );
        assert_eq!(entry.link(), Some("http://e/1"));
        assert_eq!(entry.links[0].rel, "alternate");
    }

    #[test]
    fn test_xml_base_applies_to_links_and_uri_elements() {
        let feed = parse_str(
            r#"<feed xmlns="http://www.w3.org/2005/Atom" xml:base="http://example.org/blog/">
                <icon>favicon.ico</icon>
                <entry xml:base="2024/">
                  <id>post-1</id>
                  <link href="post-1.html"/>
                </entry>
                <link href="at://did:plc:abc"/>
              </feed>"#,
        )
        .unwrap();

        assert_eq!(feed.icon, "http://example.org/blog/favicon.ico");
        let entry = &feed.entries[0];
        assert_eq!(entry.id, "http://example.org/blog/2024/post-1");
        assert_eq!(entry.links[0].href, "http://example.org/blog/2024/post-1.html");
        assert_eq!(feed.links[0].href, "at://did:plc:abc");
    }

    #[test]
    fn test_xml_base_resolution_disabled() {
        let doc = r#"<feed xml:base="http://example.org/"><icon>i.ico</icon><link href="x"/></feed>"#;
        let mut cursor = TokenCursor::new(doc).with_uri_resolution(false);
        let feed = parse(&mut cursor, false).unwrap();
        assert_eq!(feed.icon, "i.ico");
        assert_eq!(feed.links[0].href, "x");
    }

    #[test]
    fn test_source_and_extensions() {
        let feed = parse_str(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"
                     xmlns:yt="http://www.youtube.com/xml/schemas/2015"
                     xmlns:media="http://search.yahoo.com/mrss/"
                     xmlns:thr="http://purl.org/syndication/thread/1.0">
                <entry>
                  <yt:videoId>abc</yt:videoId>
                  <media:group><media:title>Video</media:title></media:group>
                  <thr:total>3</thr:total>
                  <source><title>Upstream</title><thr:in-reply-to ref="x"/><junk/></source>
                  <unknown kind="z">value</unknown>
                </entry>
              </feed>"#,
        )
        .unwrap();

        let entry = &feed.entries[0];
        assert_eq!(entry.youtube.as_ref().unwrap().video_id, "abc");
        assert_eq!(
            entry.media.as_ref().unwrap().groups[0].common.titles[0].text,
            "Video"
        );
        assert_eq!(entry.extensions.first_value("thr", "total"), Some("3"));
        let source = entry.source.as_ref().unwrap();
        assert_eq!(source.title, "Upstream");
        assert_eq!(source.extensions.elements_named("thr", "in-reply-to").len(), 1);
        assert_eq!(
            entry.extensions.first_value(CUSTOM_PREFIX, "unknown"),
            Some("value")
        );
    }

    #[test]
    fn test_bad_date_is_kept_raw() {
        let feed = parse_str("<feed><updated>yesterday-ish</updated></feed>").unwrap();
        assert_eq!(feed.updated, "yesterday-ish");
        assert!(feed.updated_parsed.is_none());
    }

    #[test]
    fn test_wrong_root() {
        let err = parse_str("<rss/>").unwrap_err();
        assert!(matches!(err, ParseError::StructuralMismatch { .. }));
    }
}
