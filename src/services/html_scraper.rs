use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::feed::collapse_whitespace;
use crate::models::NewAnnotation;

use super::AnnotationSource;

const USER_AGENT_STRING: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
const MIN_TEXT_CHARS: usize = 6;
const FIRST_AUTHOR: &str = "Original poster";
const OTHER_AUTHOR: &str = "Anonymous";

/// Scrapes the text of every element matching a CSS selector on one page.
pub struct HtmlScraper {
    client: Client,
    url: String,
    selector: String,
}

impl HtmlScraper {
    pub fn new(url: &str, selector: &str) -> Result<Self> {
        parse_selector(selector)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT_STRING)
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            selector: selector.to_string(),
        })
    }

    async fn scrape(&self) -> Result<Vec<NewAnnotation>> {
        tracing::info!("Scraping {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch page: HTTP {}", response.status()).into());
        }

        let html = response.text().await?;
        let time_label = Local::now().format("%H:%M").to_string();
        extract_annotations(&html, &self.selector, &time_label)
    }
}

#[async_trait]
impl AnnotationSource for HtmlScraper {
    fn name(&self) -> &str {
        "scrape"
    }

    async fn fetch(&self) -> Vec<NewAnnotation> {
        match self.scrape().await {
            Ok(annotations) => {
                tracing::info!("Extracted {} annotations from {}", annotations.len(), self.url);
                annotations
            }
            Err(e) => {
                tracing::warn!("Scraping failed for {}: {}", self.url, e);
                Vec::new()
            }
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| AppError::Config(format!("Invalid selector {:?}: {:?}", selector, e)))
}

/// Turn every element matching `selector` into an annotation. Ordinals follow
/// match position, so skipped short texts leave gaps.
pub fn extract_annotations(html: &str, selector: &str, time_label: &str) -> Result<Vec<NewAnnotation>> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);

    let annotations = document
        .select(&selector)
        .enumerate()
        .filter_map(|(index, element)| {
            let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
            if text.chars().count() < MIN_TEXT_CHARS {
                return None;
            }
            Some(NewAnnotation {
                ordinal: index as i64 + 1,
                text,
                author_name: (if index == 0 { FIRST_AUTHOR } else { OTHER_AUTHOR }).to_string(),
                is_highlighted: false,
                time_label: time_label.to_string(),
            })
        })
        .collect();

    Ok(annotations)
}
