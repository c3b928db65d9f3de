use crate::error::{ParseError, Result};
use crate::ext::{
    self, capture_custom, classify, itunes, owner, skip_element, Dialect, DublinCore,
    ExtensionHost, Extensions, Media, Owner, YouTube,
};
use crate::util::{decode_text, parse_date};
use crate::xml::{EventKind, TokenCursor};

use super::feed::{Category, Cloud, Enclosure, Feed, Guid, Image, Item, Source, TextInput};

/// Parses an RSS or RDF document.
///
/// The cursor must be fresh; the root element is located first. Unknown
/// elements in the channel and items are captured under `_custom` unless
/// `skip_unknown` is set, in which case they are discarded along with
/// generic extension elements.
///
/// # Errors
///
/// Returns the first structural error recorded by the cursor, including a
/// [`ParseError::StructuralMismatch`] when the root is neither `rss` nor
/// `rdf`.
pub fn parse(cursor: &mut TokenCursor<'_>, skip_unknown: bool) -> Result<Feed> {
    cursor.find_root()?;

    let root = cursor.lower_name();
    if root != "rss" && root != "rdf" {
        let found = format!("{} {:?}", EventKind::StartTag, cursor.name());
        return Err(cursor.fail(ParseError::mismatch("start tag \"rss\" or \"rdf\"", found)));
    }
    let version = version(cursor);

    let parts = cursor.parsing_element(
        &root,
        |_| Ok(RootParts::default()),
        |c, parts: &mut RootParts| {
            // Extensions at the root have nowhere to go.
            if owner(c, Dialect::Rss) != Owner::Grammar {
                return skip_element(c);
            }
            match c.lower_name().as_str() {
                "channel" => parts.channel = Some(channel(c, skip_unknown)?),
                "item" => parts.items.push(item(c, skip_unknown)?),
                "textinput" => parts.text_input = Some(text_input(c)?),
                "image" => parts.image = Some(image(c)?),
                _ => {}
            }
            Ok(())
        },
    )?;

    let mut feed = parts.channel.unwrap_or_default();
    feed.items.extend(parts.items);
    if parts.image.is_some() {
        feed.image = parts.image;
    }
    if parts.text_input.is_some() {
        feed.text_input = parts.text_input;
    }
    feed.version = version;

    tracing::debug!(version = %feed.version, items = feed.items.len(), "parsed RSS feed");
    Ok(feed)
}

/// Elements that RDF documents place beside the channel rather than in it.
#[derive(Default)]
struct RootParts {
    channel: Option<Feed>,
    items: Vec<Item>,
    image: Option<Image>,
    text_input: Option<TextInput>,
}

fn version(cursor: &TokenCursor<'_>) -> String {
    match cursor.lower_name().as_str() {
        "rss" => cursor.attribute("version").to_string(),
        "rdf" => match cursor.attribute("xmlns") {
            "http://channel.netscape.com/rdf/simple/0.9/"
            | "http://my.netscape.com/rdf/simple/0.9/" => "0.9".to_string(),
            "http://purl.org/rss/1.0/" => "1.0".to_string(),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

// ============================================================================
// Channel and item
// ============================================================================

fn channel(cursor: &mut TokenCursor<'_>, skip_unknown: bool) -> Result<Feed> {
    cursor.parsing_element("channel", |_| Ok(Feed::default()), |c, feed: &mut Feed| {
        if ext::dispatch(feed, c, Dialect::Rss, skip_unknown)? {
            return Ok(());
        }

        let name = c.lower_name();
        match name.as_str() {
            "title" => feed.title = text(c, &name)?,
            "description" => feed.description = text(c, &name)?,
            "link" => feed.links.push(link(c, &name)?),
            "language" => feed.language = text(c, &name)?,
            "copyright" => feed.copyright = text(c, &name)?,
            "managingeditor" => feed.managing_editor = text(c, &name)?,
            "webmaster" => feed.web_master = text(c, &name)?,
            "pubdate" => (feed.pub_date, feed.pub_date_parsed) = date(c, &name)?,
            "lastbuilddate" => {
                (feed.last_build_date, feed.last_build_date_parsed) = date(c, &name)?
            }
            "generator" => feed.generator = text(c, &name)?,
            "docs" => feed.docs = text(c, &name)?,
            "ttl" => feed.ttl = text(c, &name)?,
            "rating" => feed.rating = text(c, &name)?,
            "skiphours" => feed.skip_hours.extend(repeated(c, &name, "hour")?),
            "skipdays" => feed.skip_days.extend(repeated(c, &name, "day")?),
            "item" => feed.items.push(item(c, skip_unknown)?),
            "cloud" => feed.cloud = Some(cloud(c)?),
            "category" => feed.categories.push(category(c)?),
            "image" => feed.image = Some(image(c)?),
            "textinput" => feed.text_input = Some(text_input(c)?),
            // RDF table of contents, duplicated by the items themselves
            "items" => skip_element(c)?,
            _ => capture_custom(&mut feed.extensions, c, skip_unknown)?,
        }
        Ok(())
    })
}

fn item(cursor: &mut TokenCursor<'_>, skip_unknown: bool) -> Result<Item> {
    cursor.parsing_element("item", |_| Ok(Item::default()), |c, item: &mut Item| {
        if ext::dispatch(item, c, Dialect::Rss, skip_unknown)? {
            return Ok(());
        }

        let name = c.lower_name();
        match name.as_str() {
            "title" => item.title = text(c, &name)?,
            "description" => item.description = text(c, &name)?,
            "encoded" => {
                if classify(c.namespace(), c) == "content" {
                    item.content = text(c, &name)?;
                } else {
                    skip_element(c)?;
                }
            }
            "link" => item.links.push(link(c, &name)?),
            "author" => item.author = text(c, &name)?,
            "comments" => item.comments = text(c, &name)?,
            "pubdate" => (item.pub_date, item.pub_date_parsed) = date(c, &name)?,
            "source" => item.source = Some(source(c)?),
            "enclosure" => {
                let enclosure = enclosure(c)?;
                if item.enclosure.is_none() {
                    item.enclosure = Some(enclosure.clone());
                }
                item.enclosures.push(enclosure);
            }
            "guid" => item.guid = Some(guid(c)?),
            "category" => item.categories.push(category(c)?),
            _ => capture_custom(&mut item.extensions, c, skip_unknown)?,
        }
        Ok(())
    })
}

// ============================================================================
// Leaf elements
// ============================================================================

fn text(cursor: &mut TokenCursor<'_>, name: &str) -> Result<String> {
    Ok(decode_text(&cursor.with_text(name)?))
}

/// Link text, or the `href` attribute when the text is empty.
fn link(cursor: &mut TokenCursor<'_>, name: &str) -> Result<String> {
    let href = cursor.attribute("href").to_string();
    let url = text(cursor, name)?;
    Ok(if url.is_empty() { href } else { url })
}

/// The raw date string plus its parsed form; unparseable dates keep only
/// the raw string.
fn date(
    cursor: &mut TokenCursor<'_>,
    name: &str,
) -> Result<(String, Option<chrono::DateTime<chrono::Utc>>)> {
    let raw = text(cursor, name)?;
    let parsed = parse_date(&raw);
    Ok((raw, parsed))
}

fn source(cursor: &mut TokenCursor<'_>) -> Result<Source> {
    let url = cursor.attribute("url").to_string();
    let title = text(cursor, "source")?;
    Ok(Source { title, url })
}

fn guid(cursor: &mut TokenCursor<'_>) -> Result<Guid> {
    let is_permalink = match cursor.attribute("isPermaLink") {
        "" => cursor.attribute("isPermalink"),
        value => value,
    }
    .to_string();
    let value = text(cursor, "guid")?;
    Ok(Guid {
        value,
        is_permalink,
    })
}

fn category(cursor: &mut TokenCursor<'_>) -> Result<Category> {
    let domain = cursor.attribute("domain").to_string();
    let value = text(cursor, "category")?;
    Ok(Category { domain, value })
}

fn enclosure(cursor: &mut TokenCursor<'_>) -> Result<Enclosure> {
    cursor.with_skip("enclosure", |c| {
        Ok(Enclosure {
            url: c.attribute("url").to_string(),
            length: c.attribute("length").to_string(),
            kind: c.attribute("type").to_string(),
        })
    })
}

fn cloud(cursor: &mut TokenCursor<'_>) -> Result<Cloud> {
    cursor.with_skip("cloud", |c| {
        Ok(Cloud {
            domain: c.attribute("domain").to_string(),
            port: c.attribute("port").to_string(),
            path: c.attribute("path").to_string(),
            register_procedure: c.attribute("registerProcedure").to_string(),
            protocol: c.attribute("protocol").to_string(),
        })
    })
}

fn image(cursor: &mut TokenCursor<'_>) -> Result<Image> {
    cursor.parsing_element("image", |_| Ok(Image::default()), |c, image: &mut Image| {
        let name = c.lower_name();
        match name.as_str() {
            "url" => image.url = text(c, &name)?,
            "title" => image.title = text(c, &name)?,
            "link" => image.link = text(c, &name)?,
            "width" => image.width = text(c, &name)?,
            "height" => image.height = text(c, &name)?,
            "description" => image.description = text(c, &name)?,
            _ => {}
        }
        Ok(())
    })
}

fn text_input(cursor: &mut TokenCursor<'_>) -> Result<TextInput> {
    let name = cursor.lower_name();
    cursor.parsing_element(&name, |_| Ok(TextInput::default()), |c, input: &mut TextInput| {
        let child = c.lower_name();
        match child.as_str() {
            "title" => input.title = text(c, &child)?,
            "description" => input.description = text(c, &child)?,
            "name" => input.name = text(c, &child)?,
            "link" => input.link = text(c, &child)?,
            _ => {}
        }
        Ok(())
    })
}

/// Collects the text of every `unit` child, as in `skipHours/hour`.
fn repeated(cursor: &mut TokenCursor<'_>, name: &str, unit: &str) -> Result<Vec<String>> {
    let mut values = Vec::new();
    let mut children = cursor.children(name)?;
    while let Some(child) = children.next(cursor)? {
        if child == unit {
            values.push(text(cursor, &child)?);
        }
    }
    Ok(values)
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

impl ExtensionHost for Item {
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
    use crate::ext::CUSTOM_PREFIX;
    use pretty_assertions::assert_eq;

    fn parse_str(doc: &str) -> Result<Feed> {
        let mut cursor = TokenCursor::new(doc);
        parse(&mut cursor, false)
    }

    #[test]
    fn test_minimal_channel() {
        let feed =
            parse_str(r#"<rss version="2.0"><channel><title>T</title></channel></rss>"#).unwrap();
        assert_eq!(feed.title, "T");
        assert_eq!(feed.version, "2.0");
        assert!(feed.items.is_empty());
    }

    #[test]
    fn test_channel_fields() {
        let feed = parse_str(
            r#"<rss version="2.0"><channel>
                <title>News &amp; Views</title>
                <link>http://example.com/</link>
                <link href="http://example.com/alt"/>
                <description><![CDATA[<p>Hello</p>]]></description>
                <pubDate>Mon, 02 Jan 2006 15:04:05 GMT</pubDate>
                <lastBuildDate>not a date</lastBuildDate>
                <skipHours><hour>1</hour><hour>2</hour><minute>3</minute></skipHours>
                <skipDays><day>Monday</day></skipDays>
                <cloud domain="rpc.example.com" port="80" path="/RPC2" registerProcedure="ping" protocol="xml-rpc"/>
                <category domain="http://d/">tech</category>
                <image><url>http://img/</url><title>Logo</title><width>88</width></image>
                <textInput><title>Search</title><name>q</name></textInput>
                <ttl>60</ttl>
            </channel></rss>"#,
        )
        .unwrap();

        assert_eq!(feed.title, "News & Views");
        assert_eq!(feed.links, vec!["http://example.com/", "http://example.com/alt"]);
        assert_eq!(feed.description, "<p>Hello</p>");
        assert_eq!(
            feed.pub_date_parsed.map(|d| d.to_rfc3339()).as_deref(),
            Some("2006-01-02T15:04:05+00:00")
        );
        assert_eq!(feed.last_build_date, "not a date");
        assert!(feed.last_build_date_parsed.is_none());
        assert_eq!(feed.skip_hours, vec!["1", "2"]);
        assert_eq!(feed.skip_days, vec!["Monday"]);
        assert_eq!(feed.cloud.as_ref().unwrap().register_procedure, "ping");
        assert_eq!(
            feed.categories,
            vec![Category {
                domain: "http://d/".into(),
                value: "tech".into(),
            }]
        );
        let image = feed.image.unwrap();
        assert_eq!((image.url.as_str(), image.width.as_str()), ("http://img/", "88"));
        assert_eq!(feed.text_input.unwrap().name, "q");
        assert_eq!(feed.ttl, "60");
    }

    #[test]
    fn test_item_fields() {
        let feed = parse_str(
            r#"<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/"><channel><item>
                <title>One</title>
                <content:encoded><![CDATA[<b>full</b>]]></content:encoded>
                <guid isPermaLink="false">id-1</guid>
                <source url="http://src/">Origin</source>
                <enclosure url="http://a/1.mp3" length="10" type="audio/mpeg"/>
                <enclosure url="http://a/2.mp3" length="20" type="audio/mpeg"/>
                <author>jo@example.com (Jo)</author>
            </item></channel></rss>"#,
        )
        .unwrap();

        let item = &feed.items[0];
        assert_eq!(item.title, "One");
        assert_eq!(item.content, "<b>full</b>");
        assert_eq!(
            item.guid,
            Some(Guid {
                value: "id-1".into(),
                is_permalink: "false".into(),
            })
        );
        assert_eq!(
            item.source,
            Some(Source {
                title: "Origin".into(),
                url: "http://src/".into(),
            })
        );
        assert_eq!(item.enclosure.as_ref().unwrap().url, "http://a/1.mp3");
        assert_eq!(item.enclosures.len(), 2);
        assert_eq!(item.author_name_address().unwrap().name, "Jo");
    }

    #[test]
    fn test_encoded_outside_content_namespace_is_ignored() {
        let feed = parse_str(
            r#"<rss><channel><item><encoded>x</encoded><title>t</title></item></channel></rss>"#,
        )
        .unwrap();
        assert_eq!(feed.items[0].content, "");
        assert_eq!(feed.items[0].title, "t");
    }

    #[test]
    fn test_unknown_element_goes_to_custom() {
        let feed =
            parse_str(r#"<rss version="2.0"><channel><foo bar="1">x</foo></channel></rss>"#)
                .unwrap();
        let foo = feed.extensions.elements_named(CUSTOM_PREFIX, "foo");
        assert_eq!(foo.len(), 1);
        assert_eq!(foo[0].value, "x");
        assert_eq!(foo[0].attrs.get("bar").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_skip_unknown() {
        let doc = r#"<rss xmlns:sy="http://purl.org/rss/1.0/modules/syndication/"><channel><foo>x</foo><sy:updatePeriod>hourly</sy:updatePeriod><title>T</title></channel></rss>"#;
        let mut cursor = TokenCursor::new(doc);
        let feed = parse(&mut cursor, true).unwrap();
        assert!(feed.extensions.is_empty());
        assert_eq!(feed.title, "T");
    }

    #[test]
    fn test_sub_grammars_are_routed() {
        let feed = parse_str(
            r#"<rss version="2.0"
                 xmlns:dc="http://purl.org/dc/elements/1.1/"
                 xmlns:itunes="http://www.itunes.com/DTDs/PodCast-1.0.dtd"
                 xmlns:media="http://search.yahoo.com/mrss/"
                 xmlns:atom="http://www.w3.org/2005/Atom">
               <channel>
                 <dc:creator>Jane</dc:creator>
                 <itunes:author>Pod</itunes:author>
                 <atom:link rel="self" href="http://example.com/rss"/>
                 <item>
                   <itunes:duration>10:00</itunes:duration>
                   <media:thumbnail url="http://t/1.jpg"/>
                 </item>
               </channel></rss>"#,
        )
        .unwrap();

        assert_eq!(feed.dublin_core.as_ref().unwrap().creator, "Jane");
        assert_eq!(feed.itunes.as_ref().unwrap().author, "Pod");
        assert_eq!(feed.feed_link(), Some("http://example.com/rss"));
        let item = &feed.items[0];
        assert_eq!(item.itunes.as_ref().unwrap().duration, "10:00");
        assert_eq!(
            item.media.as_ref().unwrap().common.thumbnail_urls,
            vec!["http://t/1.jpg"]
        );
    }

    #[test]
    fn test_rdf_root_items_and_version() {
        let feed = parse_str(
            r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/">
                 <channel><title>R</title><items><rdf:Seq><rdf:li resource="x"/></rdf:Seq></items></channel>
                 <image><url>http://img/root</url></image>
                 <item><title>A</title></item>
                 <item><title>B</title></item>
               </rdf:RDF>"#,
        )
        .unwrap();

        assert_eq!(feed.version, "1.0");
        assert_eq!(feed.title, "R");
        let titles: Vec<_> = feed.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(feed.image.unwrap().url, "http://img/root");
    }

    #[test]
    fn test_netscape_rdf_version() {
        let feed = parse_str(
            r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://my.netscape.com/rdf/simple/0.9/"><channel><title>N</title></channel></rdf:RDF>"#,
        )
        .unwrap();
        assert_eq!(feed.version, "0.9");
    }

    #[test]
    fn test_rss_without_channel() {
        let feed =
            parse_str(r#"<rss version="0.91"><item><title>Lonely</title></item></rss>"#).unwrap();
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.version, "0.91");
    }

    #[test]
    fn test_wrong_root() {
        let err = parse_str("<feed/>").unwrap_err();
        assert!(matches!(err, ParseError::StructuralMismatch { .. }));
    }

    #[test]
    fn test_mismatched_end_tag_stops_parse() {
        let mut cursor = TokenCursor::new(
            r#"<rss><channel><title>T</titl><description>D</description></channel></rss>"#,
        );
        let err = parse(&mut cursor, false).unwrap_err();
        assert!(matches!(err, ParseError::StructuralMismatch { .. }));
        assert_eq!(cursor.error(), Some(&err));
    }
}
