use serde::{Deserialize, Serialize};

pub const SUMMARY_BULLETS: usize = 3;

const FALLBACK_HEADLINE: &str = "AI summary is turned off";
const FALLBACK_HINT: &str = "Set an API key to enable it";
const FALLBACK_EXCERPT_CHARS: usize = 20;

/// Short summary attached to every stored item.
///
/// `title` is only present when the summary came from the enrichment service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub bullets: [String; SUMMARY_BULLETS],
}

/// Rows written before the summary became structured hold a bare JSON array.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSummary {
    Structured(Summary),
    Bullets(Vec<String>),
}

impl Summary {
    pub fn generated(title: String, bullets: [String; SUMMARY_BULLETS]) -> Self {
        Self {
            title: Some(title),
            bullets,
        }
    }

    /// Deterministic summary used when enrichment is disabled or failed.
    pub fn fallback(snippet: &str) -> Self {
        let excerpt: String = snippet.chars().take(FALLBACK_EXCERPT_CHARS).collect();
        Self {
            title: None,
            bullets: [
                FALLBACK_HEADLINE.to_string(),
                FALLBACK_HINT.to_string(),
                format!("({}...)", excerpt),
            ],
        }
    }

    pub fn to_storage(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_storage(raw: &str) -> serde_json::Result<Self> {
        Ok(match serde_json::from_str::<StoredSummary>(raw)? {
            StoredSummary::Structured(summary) => summary,
            StoredSummary::Bullets(bullets) => {
                let mut bullets = bullets.into_iter();
                Self {
                    title: None,
                    bullets: std::array::from_fn(|_| bullets.next().unwrap_or_default()),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_truncates_by_chars() {
        let summary = Summary::fallback("日本語のスニペットはマルチバイトでも二十文字で切り詰められるべきです");
        assert_eq!(summary.title, None);
        assert_eq!(summary.bullets[2], "(日本語のスニペットはマルチバイトでも二十...)");
    }

    #[test]
    fn fallback_with_empty_snippet() {
        let summary = Summary::fallback("");
        assert_eq!(summary.bullets[0], FALLBACK_HEADLINE);
        assert_eq!(summary.bullets[2], "(...)");
    }

    #[test]
    fn storage_keeps_title() {
        let summary = Summary::generated(
            "Catchy".to_string(),
            ["a".to_string(), "b".to_string(), "c".to_string()],
        );
        let raw = summary.to_storage().unwrap();
        assert_eq!(Summary::from_storage(&raw).unwrap(), summary);
    }

    #[test]
    fn reads_legacy_bullet_arrays() {
        let summary = Summary::from_storage(r#"["one","two"]"#).unwrap();
        assert_eq!(summary.title, None);
        assert_eq!(summary.bullets, ["one", "two", ""]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Summary::from_storage("not json").is_err());
    }
}
