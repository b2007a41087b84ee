//! Wire types for the news feed endpoint.
//!
//! `NewsItem` is the core data type shared across the application: the feed
//! store accumulates them, the list and preview panes render them, and the
//! image loader reads their thumbnail URLs. Every item is decoded once from
//! a page response and never mutated afterwards.
//!
//! ## Decoding
//!
//! The endpoint speaks camelCase JSON. `publishedDate` arrives as a plain
//! `yyyy-MM-ddTHH:mm:ss` string in UTC and is decoded into a
//! [`DateTime<Utc>`] up front so rendering code never re-parses it. A page
//! that does not match this schema is rejected wholesale; there is no
//! partial decode of individual items.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A single news entry from one page of the feed.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// Server-side identifier, unique within a feed.
    pub id: i64,

    /// Headline shown in the list.
    pub title: String,

    /// Optional summary text shown in the preview pane.
    #[serde(default)]
    pub description: Option<String>,

    /// Publication timestamp, decoded from the wire string.
    #[serde(rename = "publishedDate", with = "api_date")]
    pub published: DateTime<Utc>,

    /// Canonical URL of the item.
    pub url: String,

    /// URL of the full article page, used by the reader and the browser
    /// handoff.
    pub full_url: String,

    /// Thumbnail image URL; items without artwork simply have none.
    #[serde(default)]
    pub title_image_url: Option<String>,

    /// Category label, e.g. "Автомобильные новости".
    #[serde(default)]
    pub category_type: Option<String>,
}

impl NewsItem {
    /// Thumbnail URL, if this item has artwork.
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.title_image_url.as_deref()
    }
}

/// One fetched page: the items in server order plus the server-side total
/// across all pages. Not retained beyond extracting its fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPage {
    pub news: Vec<NewsItem>,
    pub total_count: u32,
}

// ---------------------------------------------------------------------------
// Date decoding
// ---------------------------------------------------------------------------

mod api_date {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    /// Wire format of `publishedDate`, e.g. `2024-03-07T09:30:00` (UTC).
    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
