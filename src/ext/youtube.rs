use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::xml::TokenCursor;

use super::skip_element;

/// YouTube feed elements (`http://www.youtube.com/xml/schemas/2015`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTube {
    pub channel_id: String,
    pub video_id: String,
}

/// Parses one `yt:*` element into `existing` (or a fresh record).
pub fn parse(cursor: &mut TokenCursor<'_>, existing: Option<YouTube>) -> Result<YouTube> {
    let mut yt = existing.unwrap_or_default();
    let name = cursor.lower_name();

    match name.as_str() {
        "channelid" => yt.channel_id = cursor.with_text(&name)?,
        "videoid" => yt.video_id = cursor.with_text(&name)?,
        _ => skip_element(cursor)?,
    }
    Ok(yt)
}
