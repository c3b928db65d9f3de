use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::xml::TokenCursor;

use super::skip_element;

/// iTunes podcast elements on a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ITunesFeed {
    pub author: String,
    pub block: String,
    pub categories: Vec<ITunesCategory>,
    pub explicit: String,
    pub keywords: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<ITunesOwner>,
    pub subtitle: String,
    pub summary: String,
    pub image: String,
    pub complete: String,
    pub new_feed_url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// iTunes podcast elements on an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ITunesItem {
    pub author: String,
    pub block: String,
    pub duration: String,
    pub explicit: String,
    pub keywords: String,
    pub subtitle: String,
    pub summary: String,
    pub image: String,
    pub is_closed_captioned: String,
    pub episode: String,
    pub season: String,
    pub order: String,
    pub episode_type: String,
}

/// An `itunes:category`, possibly nested one level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ITunesCategory {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<Box<ITunesCategory>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ITunesOwner {
    pub name: String,
    pub email: String,
}

/// Parses one channel-level `itunes:*` element.
pub fn parse_feed(cursor: &mut TokenCursor<'_>, existing: Option<ITunesFeed>) -> Result<ITunesFeed> {
    let mut itunes = existing.unwrap_or_default();
    let name = cursor.lower_name();

    match name.as_str() {
        "author" => itunes.author = cursor.with_text(&name)?,
        "block" => itunes.block = cursor.with_text(&name)?,
        "explicit" => itunes.explicit = cursor.with_text(&name)?,
        "keywords" => itunes.keywords = cursor.with_text(&name)?,
        "subtitle" => itunes.subtitle = cursor.with_text(&name)?,
        "summary" => itunes.summary = cursor.with_text(&name)?,
        "complete" => itunes.complete = cursor.with_text(&name)?,
        "new-feed-url" => itunes.new_feed_url = cursor.with_text(&name)?,
        "type" => itunes.kind = cursor.with_text(&name)?,
        "image" => itunes.image = image(cursor, &name)?,
        "category" => itunes.categories.push(category(cursor, &name)?),
        "owner" => itunes.owner = Some(owner(cursor, &name)?),
        _ => skip_element(cursor)?,
    }
    Ok(itunes)
}

/// Parses one item-level `itunes:*` element.
pub fn parse_item(cursor: &mut TokenCursor<'_>, existing: Option<ITunesItem>) -> Result<ITunesItem> {
    let mut itunes = existing.unwrap_or_default();
    let name = cursor.lower_name();

    match name.as_str() {
        "author" => itunes.author = cursor.with_text(&name)?,
        "block" => itunes.block = cursor.with_text(&name)?,
        "duration" => itunes.duration = cursor.with_text(&name)?,
        "explicit" => itunes.explicit = cursor.with_text(&name)?,
        "subtitle" => itunes.subtitle = cursor.with_text(&name)?,
        "summary" => itunes.summary = cursor.with_text(&name)?,
        "keywords" => itunes.keywords = cursor.with_text(&name)?,
        "isclosedcaptioned" => itunes.is_closed_captioned = cursor.with_text(&name)?,
        "episode" => itunes.episode = cursor.with_text(&name)?,
        "season" => itunes.season = cursor.with_text(&name)?,
        "order" => itunes.order = cursor.with_text(&name)?,
        "episodetype" => itunes.episode_type = cursor.with_text(&name)?,
        "image" => itunes.image = image(cursor, &name)?,
        _ => skip_element(cursor)?,
    }
    Ok(itunes)
}

fn image(cursor: &mut TokenCursor<'_>, name: &str) -> Result<String> {
    cursor.with_skip(name, |c| Ok(c.attribute("href").to_string()))
}

fn category(cursor: &mut TokenCursor<'_>, name: &str) -> Result<ITunesCategory> {
    let mut category = ITunesCategory {
        text: cursor.attribute("text").to_string(),
        subcategory: None,
    };

    let mut children = cursor.children(name)?;
    while let Some(child) = children.next(cursor)? {
        if child == "category" {
            category.subcategory = Some(Box::new(self::category(cursor, &child)?));
        }
    }
    Ok(category)
}

fn owner(cursor: &mut TokenCursor<'_>, name: &str) -> Result<ITunesOwner> {
    let mut owner = ITunesOwner::default();

    let mut children = cursor.children(name)?;
    while let Some(child) = children.next(cursor)? {
        match child.as_str() {
            "name" => owner.name = cursor.with_text(&child)?,
            "email" => owner.email = cursor.with_text(&child)?,
            _ => {}
        }
    }
    Ok(owner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::EventKind;
    use pretty_assertions::assert_eq;

    const NS: &str = r#"xmlns:itunes="http://www.itunes.com/DTDs/PodCast-1.0.dtd""#;

    fn feed(body: &str) -> ITunesFeed {
        let doc = format!("<channel {NS}>{body}</channel>");
        let mut cursor = TokenCursor::new(&doc);
        cursor.find_root().unwrap();
        let mut itunes = None;
        while cursor.advance().unwrap() == EventKind::StartTag {
            itunes = Some(parse_feed(&mut cursor, itunes).unwrap());
        }
        itunes.unwrap_or_default()
    }

    #[test]
    fn test_feed_scalars_and_image() {
        let itunes = feed(
            r#"<itunes:author>Pod Person</itunes:author>
               <itunes:explicit>no</itunes:explicit>
               <itunes:new-feed-url>http://new/</itunes:new-feed-url>
               <itunes:image href="http://img/cover.jpg"/>
               <itunes:type>episodic</itunes:type>"#,
        );
        assert_eq!(itunes.author, "Pod Person");
        assert_eq!(itunes.explicit, "no");
        assert_eq!(itunes.new_feed_url, "http://new/");
        assert_eq!(itunes.image, "http://img/cover.jpg");
        assert_eq!(itunes.kind, "episodic");
    }

    #[test]
    fn test_nested_categories() {
        let itunes = feed(
            r#"<itunes:category text="Technology">
                 <itunes:category text="Podcasting"/>
               </itunes:category>
               <itunes:category text="Arts"/>"#,
        );
        assert_eq!(
            itunes.categories,
            vec![
                ITunesCategory {
                    text: "Technology".into(),
                    subcategory: Some(Box::new(ITunesCategory {
                        text: "Podcasting".into(),
                        subcategory: None,
                    })),
                },
                ITunesCategory {
                    text: "Arts".into(),
                    subcategory: None,
                },
            ]
        );
    }

    #[test]
    fn test_owner() {
        let itunes = feed(
            r#"<itunes:owner><itunes:name>Jo</itunes:name><itunes:email>jo@example.com</itunes:email><itunes:extra>x</itunes:extra></itunes:owner>"#,
        );
        assert_eq!(
            itunes.owner,
            Some(ITunesOwner {
                name: "Jo".into(),
                email: "jo@example.com".into(),
            })
        );
    }

    #[test]
    fn test_item_fields_match_mixed_case_names() {
        let doc = format!(
            "<item {NS}><itunes:episodeType>full</itunes:episodeType><itunes:isClosedCaptioned>Yes</itunes:isClosedCaptioned><itunes:duration>1:02:03</itunes:duration></item>"
        );
        let mut cursor = TokenCursor::new(&doc);
        cursor.find_root().unwrap();
        let mut itunes = None;
        while cursor.advance().unwrap() == EventKind::StartTag {
            itunes = Some(parse_item(&mut cursor, itunes).unwrap());
        }
        let itunes = itunes.unwrap();
        assert_eq!(itunes.episode_type, "full");
        assert_eq!(itunes.is_closed_captioned, "Yes");
        assert_eq!(itunes.duration, "1:02:03");
    }
}
