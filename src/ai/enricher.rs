use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::EnrichmentConfig;
use crate::error::{AppError, Result};
use crate::models::SUMMARY_BULLETS;

const SYSTEM_PROMPT: &str = r#"You are the editor of a news roundup site.
From the article title and body the user sends, produce a JSON object with:
1. "title": a slightly punchier headline than the original, without exaggerating.
2. "summary": an array of exactly 3 short bullet points summarizing the article.
Respond with the JSON object only."#;

/// Characters of body text sent to the API.
const MAX_BODY_CHARS: usize = 10_000;

/// Rewritten headline and bullet summary for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub title: String,
    pub bullets: [String; SUMMARY_BULLETS],
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    response_format: ResponseFormat,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EnrichmentPayload {
    #[serde(default)]
    title: String,
    summary: Vec<String>,
}

pub struct Enricher {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    min_text_chars: usize,
}

impl Enricher {
    /// `None` when no API key is configured, which disables enrichment.
    pub fn from_config(config: &EnrichmentConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Some(Self {
            client,
            api_key,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            min_text_chars: config.min_text_chars,
        }))
    }

    /// Best-effort enrichment. Short bodies are skipped and any failure is
    /// logged and reported as `None`.
    pub async fn enrich(&self, original_title: &str, body_text: &str) -> Option<Enrichment> {
        if body_text.chars().count() < self.min_text_chars {
            tracing::debug!("Skipping enrichment for {:?}: body too short", original_title);
            return None;
        }

        match self.request_enrichment(original_title, body_text).await {
            Ok(enrichment) => Some(enrichment),
            Err(e) => {
                tracing::warn!("Enrichment failed for {:?}: {}", original_title, e);
                None
            }
        }
    }

    async fn request_enrichment(&self, original_title: &str, body_text: &str) -> Result<Enrichment> {
        let body: String = body_text.chars().take(MAX_BODY_CHARS).collect();

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: format!("Original title: {}\nBody: {}", original_title, body),
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(AppError::Enrichment(format!("HTTP {}: {}", status, error_text)));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Enrichment("No content in response".to_string()))?;

        parse_enrichment(&content)
    }
}

fn parse_enrichment(content: &str) -> Result<Enrichment> {
    let payload: EnrichmentPayload = serde_json::from_str(content)?;

    let bullets: Vec<String> = payload
        .summary
        .into_iter()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .take(SUMMARY_BULLETS)
        .collect();

    let bullets: [String; SUMMARY_BULLETS] = bullets.try_into().map_err(|_| {
        AppError::Enrichment(format!("Expected {} summary bullets", SUMMARY_BULLETS))
    })?;

    Ok(Enrichment {
        title: payload.title.trim().to_string(),
        bullets,
    })
}
