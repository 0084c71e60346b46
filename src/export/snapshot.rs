//! JSON snapshot of the newest items, read by the static site build.
//!
//! Field names are the site's data contract and must not change.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{Annotation, StoredItem, SUMMARY_BULLETS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotItem {
    pub id: String,
    pub title: String,
    pub original_title: String,
    pub link: String,
    #[serde(default)]
    pub pub_date: Option<String>,
    pub content_snippet: String,
    pub source: String,
    pub image_url: String,
    pub ai_summary: [String; SUMMARY_BULLETS],
    pub scraped_comments: Vec<SnapshotComment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotComment {
    pub id: i64,
    pub text: String,
    pub name: String,
    #[serde(rename = "isVIP")]
    pub is_vip: bool,
    pub time: String,
}

impl From<StoredItem> for SnapshotItem {
    fn from(stored: StoredItem) -> Self {
        let StoredItem { item, annotations } = stored;
        Self {
            id: item.id,
            title: item.title,
            original_title: item.original_title,
            link: item.link,
            pub_date: item.published_at,
            content_snippet: item.snippet,
            source: item.source_name,
            image_url: item.image_url,
            ai_summary: item.summary.bullets,
            scraped_comments: annotations.into_iter().map(SnapshotComment::from).collect(),
        }
    }
}

impl From<Annotation> for SnapshotComment {
    fn from(annotation: Annotation) -> Self {
        Self {
            id: annotation.ordinal,
            text: annotation.text,
            name: annotation.author_name,
            is_vip: annotation.is_highlighted,
            time: annotation.time_label,
        }
    }
}

pub struct SnapshotExporter {
    path: PathBuf,
    limit: usize,
}

impl SnapshotExporter {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the snapshot with the newest items. Returns how many were written.
    pub async fn export(&self, repository: &Repository) -> Result<usize> {
        let items: Vec<SnapshotItem> = repository
            .query_recent(self.limit)
            .await?
            .into_iter()
            .map(SnapshotItem::from)
            .collect();

        let json = serde_json::to_vec_pretty(&items)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &json))
            .await
            .map_err(|e| anyhow::anyhow!("Snapshot writer task failed: {}", e))??;

        tracing::info!("Exported {} items to {}", items.len(), self.path.display());
        Ok(items.len())
    }
}

/// Write through a temp file in the target directory and rename it into
/// place, so readers see either the old or the new document.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| AppError::Io(e.error))?;
    Ok(())
}

/// Read a snapshot back, e.g. to inspect what the site will render.
pub fn read_snapshot(path: &Path) -> Result<Vec<SnapshotItem>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
