use serde::{Deserialize, Serialize};

/// A comment-like record to attach to an existing item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAnnotation {
    pub ordinal: i64,
    pub text: String,
    pub author_name: String,
    #[serde(default)]
    pub is_highlighted: bool,
    #[serde(default)]
    pub time_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub id: i64,
    pub item_id: String,
    pub ordinal: i64,
    pub text: String,
    pub author_name: String,
    pub is_highlighted: bool,
    pub time_label: String,
}
