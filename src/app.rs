use std::time::Duration;

use crate::ai::Enricher;
use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::export::SnapshotExporter;
use crate::feed::{image_url, item_id, FeedEntry, FeedFetcher};
use crate::models::{NewItem, Summary};
use crate::services::AnnotationSource;

/// Counters for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub feeds_ok: usize,
    pub feeds_failed: usize,
    pub entries_seen: usize,
    pub entries_skipped: usize,
    pub items_inserted: usize,
    pub items_exported: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotateReport {
    pub item_id: Option<String>,
    pub annotations_inserted: usize,
    pub items_exported: usize,
}

pub struct App {
    pub repository: Repository,
    fetcher: FeedFetcher,
    enricher: Option<Enricher>,
    exporter: SnapshotExporter,
    max_annotations: usize,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;
        let fetcher = FeedFetcher::new(
            Duration::from_secs(config.fetch_timeout_secs),
            &config.user_agent,
        )?;
        let enricher = Enricher::from_config(&config.enrichment)?;
        if enricher.is_none() {
            tracing::info!("No enrichment API key configured; using fallback summaries");
        }
        let exporter = SnapshotExporter::new(&config.snapshot_path, config.snapshot_limit);

        Ok(Self {
            repository,
            fetcher,
            enricher,
            exporter,
            max_annotations: config.annotations.max_comments,
        })
    }

    /// Ingest every feed in order, then export once. A failing feed is logged
    /// and skipped; store and snapshot failures abort the run.
    pub async fn run(&self, feed_urls: &[String]) -> Result<RunReport> {
        let mut report = RunReport::default();

        for url in feed_urls {
            match self.ingest_feed(url, &mut report).await {
                Ok(()) => report.feeds_ok += 1,
                Err(e) if is_feed_failure(&e) => {
                    tracing::warn!("Error fetching {}: {}", url, e);
                    report.feeds_failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        report.items_exported = self.export_snapshot().await?;
        tracing::info!(
            "Run finished: {} feeds ok, {} failed, {} new items",
            report.feeds_ok,
            report.feeds_failed,
            report.items_inserted
        );
        Ok(report)
    }

    async fn ingest_feed(&self, url: &str, report: &mut RunReport) -> Result<()> {
        let feed = self.fetcher.fetch_feed(url).await?;
        tracing::info!("Fetched {} ({} entries)", feed.title, feed.entries.len());

        for entry in feed.entries {
            report.entries_seen += 1;
            let Some(item) = self.build_item(entry, &feed.title).await else {
                report.entries_skipped += 1;
                continue;
            };

            let id = item.id.clone();
            if self.repository.insert_item_if_absent(item).await? {
                report.items_inserted += 1;
            } else {
                tracing::debug!("Item {} already stored", id);
            }
        }

        Ok(())
    }

    /// Derive identity, enrich and assemble. `None` for entries without a link.
    async fn build_item(&self, entry: FeedEntry, source_name: &str) -> Option<NewItem> {
        if entry.link.is_empty() {
            tracing::warn!("Skipping entry {:?} from {}: no link", entry.title, source_name);
            return None;
        }

        let id = item_id(&entry.link);

        let enrichment = match &self.enricher {
            Some(enricher) => enricher.enrich(&entry.title, &entry.snippet).await,
            None => None,
        };

        let (title, summary) = match enrichment {
            Some(enrichment) => {
                let title = if enrichment.title.is_empty() {
                    entry.title.clone()
                } else {
                    enrichment.title
                };
                (title.clone(), Summary::generated(title, enrichment.bullets))
            }
            None => (entry.title.clone(), Summary::fallback(&entry.snippet)),
        };

        Some(NewItem {
            image_url: image_url(&id),
            id,
            title,
            original_title: entry.title,
            link: entry.link,
            published_at: entry.published,
            snippet: entry.snippet,
            source_name: source_name.to_string(),
            summary,
        })
    }

    pub async fn export_snapshot(&self) -> Result<usize> {
        self.exporter.export(&self.repository).await
    }

    /// Attach annotations from `source` to `target_id` (or the newest stored
    /// item) and re-export. Does nothing when the store is empty.
    pub async fn annotate(
        &self,
        source: &dyn AnnotationSource,
        target_id: Option<&str>,
    ) -> Result<AnnotateReport> {
        let target = match target_id {
            Some(id) => {
                if self.repository.get_item(id).await?.is_none() {
                    return Err(AppError::ItemNotFound(id.to_string()));
                }
                Some(id.to_string())
            }
            None => self
                .repository
                .query_recent(1)
                .await?
                .into_iter()
                .next()
                .map(|stored| stored.item.id),
        };

        let Some(target) = target else {
            tracing::warn!("No stored items to annotate; run ingestion first");
            return Ok(AnnotateReport::default());
        };

        let mut annotations = source.fetch().await;
        annotations.truncate(self.max_annotations);

        let inserted = if annotations.is_empty() {
            tracing::info!("Source {} returned no annotations", source.name());
            0
        } else {
            self.repository
                .insert_annotations_if_absent(&target, annotations)
                .await?
        };

        let exported = self.export_snapshot().await?;
        tracing::info!("Attached {} annotations to {}", inserted, target);

        Ok(AnnotateReport {
            item_id: Some(target),
            annotations_inserted: inserted,
            items_exported: exported,
        })
    }
}

/// Errors that only affect the feed being fetched.
fn is_feed_failure(error: &AppError) -> bool {
    matches!(
        error,
        AppError::Http(_) | AppError::FeedParse(_) | AppError::Other(_)
    )
}
