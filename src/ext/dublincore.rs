use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::xml::TokenCursor;

use super::skip_element;

/// Dublin Core metadata elements (`http://purl.org/dc/elements/1.1/`).
///
/// When an element repeats, the last occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DublinCore {
    pub title: String,
    pub creator: String,
    pub author: String,
    pub subject: String,
    pub description: String,
    pub publisher: String,
    pub contributor: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub format: String,
    pub identifier: String,
    pub source: String,
    pub language: String,
    pub relation: String,
    pub coverage: String,
    pub rights: String,
}

impl DublinCore {
    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        let field = match name {
            "title" => &mut self.title,
            "creator" => &mut self.creator,
            "author" => &mut self.author,
            "subject" => &mut self.subject,
            "description" => &mut self.description,
            "publisher" => &mut self.publisher,
            "contributor" => &mut self.contributor,
            "date" => &mut self.date,
            "type" => &mut self.kind,
            "format" => &mut self.format,
            "identifier" => &mut self.identifier,
            "source" => &mut self.source,
            "language" => &mut self.language,
            "relation" => &mut self.relation,
            "coverage" => &mut self.coverage,
            "rights" => &mut self.rights,
            _ => return None,
        };
        Some(field)
    }
}

/// Parses one `dc:*` element into `existing` (or a fresh record).
pub fn parse(cursor: &mut TokenCursor<'_>, existing: Option<DublinCore>) -> Result<DublinCore> {
    let mut dc = existing.unwrap_or_default();
    let name = cursor.lower_name();

    match dc.field_mut(&name) {
        Some(field) => *field = cursor.with_text(&name)?,
        None => skip_element(cursor)?,
    }
    Ok(dc)
}
