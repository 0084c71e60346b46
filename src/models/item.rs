use chrono::{DateTime, Utc};

use super::{Annotation, Summary};

/// An item ready to be written by the ingestion pass.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub id: String,
    pub title: String,
    pub original_title: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
    pub snippet: String,
    pub source_name: String,
    pub image_url: String,
    pub summary: Summary,
}

/// An item as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub original_title: String,
    pub link: String,
    /// Kept as stored; older rows may hold non-RFC 3339 strings.
    pub published_at: Option<String>,
    pub snippet: String,
    pub source_name: String,
    pub image_url: String,
    pub summary: Summary,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredItem {
    pub item: Item,
    pub annotations: Vec<Annotation>,
}
