use std::path::Path;

use async_trait::async_trait;

use crate::config::{AnnotationConfig, AnnotationMode};
use crate::error::{AppError, Result};
use crate::models::NewAnnotation;

use super::{FixtureSource, HtmlScraper, SimulatedSource};

/// Produces comment-like annotations for an item.
///
/// Sources are best effort: a failure is logged and yields an empty list.
#[async_trait]
pub trait AnnotationSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Vec<NewAnnotation>;
}

/// Build the source selected by `config.mode`.
pub fn annotation_source(config: &AnnotationConfig) -> Result<Box<dyn AnnotationSource>> {
    let source: Box<dyn AnnotationSource> = match config.mode {
        AnnotationMode::Scrape => Box::new(scraper_from_config(config)?),
        AnnotationMode::Fixture => Box::new(fixture_from_config(config)?),
        AnnotationMode::Simulate => {
            // Simulate over the fixture when one is configured, else over live pages.
            let inner: Box<dyn AnnotationSource> = if config.fixture_path.is_some() {
                Box::new(fixture_from_config(config)?)
            } else {
                Box::new(scraper_from_config(config)?)
            };
            Box::new(SimulatedSource::new(inner, config.seed))
        }
    };
    Ok(source)
}

fn scraper_from_config(config: &AnnotationConfig) -> Result<HtmlScraper> {
    let (Some(url), Some(selector)) = (&config.url, &config.selector) else {
        return Err(AppError::Config(
            "annotations.url and annotations.selector are required for scraping".to_string(),
        ));
    };
    HtmlScraper::new(url, selector)
}

fn fixture_from_config(config: &AnnotationConfig) -> Result<FixtureSource> {
    let path = config.fixture_path.as_deref().ok_or_else(|| {
        AppError::Config("annotations.fixture_path is required for fixture mode".to_string())
    })?;
    FixtureSource::from_file(Path::new(path))
}
