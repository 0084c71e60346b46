use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::model::Link;
use feed_rs::parser;
use reqwest::Client;
use scraper::Html;

use crate::error::Result;

/// A parsed feed, entries in document order.
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    pub title: String,
    pub entries: Vec<FeedEntry>,
}

#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub title: String,
    /// Empty when the entry carries no link.
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    /// Plain text of the body, empty when the entry has none.
    pub snippet: String,
}

pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }

    pub async fn fetch_feed(&self, url: &str) -> Result<FetchedFeed> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch feed: HTTP {}", response.status()).into());
        }

        let bytes = response.bytes().await?;
        parse_feed(&bytes, url)
    }
}

/// Parse RSS/Atom bytes. `fallback_title` names feeds without a title.
pub fn parse_feed(bytes: &[u8], fallback_title: &str) -> Result<FetchedFeed> {
    let feed = parser::parse(bytes)?;

    let title = feed
        .title
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| source_name_from_url(fallback_title));

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            // Try content first, then fall back to summary
            let body_html = entry
                .content
                .as_ref()
                .and_then(|c| c.body.as_ref())
                .or_else(|| entry.summary.as_ref().map(|s| &s.content));

            FeedEntry {
                title: entry
                    .title
                    .map(|t| t.content.trim().to_string())
                    .unwrap_or_else(|| "Untitled".to_string()),
                link: canonical_link(&entry.links),
                published: entry.published.or(entry.updated),
                snippet: body_html.map(|html| to_plain_text(html)).unwrap_or_default(),
            }
        })
        .collect();

    Ok(FetchedFeed { title, entries })
}

/// The `alternate` (or rel-less) link, else the first one. Atom feeds often
/// list `replies`/`self`/`edit` links ahead of the article itself.
fn canonical_link(links: &[Link]) -> String {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|l| l.href.trim().to_string())
        .unwrap_or_default()
}

/// Strip markup and collapse whitespace into single spaces.
pub fn to_plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn source_name_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
