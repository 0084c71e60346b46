use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{Annotation, Item, NewAnnotation, NewItem, StoredItem, Summary};

use super::schema::SCHEMA;

/// `pubDate` values that sort chronologically as text.
const RFC3339_GLOB: &str = "[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]T*";

const ITEM_COLUMNS: &str = "id, title, originalTitle, link, pubDate, contentSnippet, source, imageUrl, aiSummary, createdAt";

/// Item columns as read, before the summary is decoded.
struct ItemRow {
    id: String,
    title: String,
    original_title: String,
    link: String,
    published_at: Option<String>,
    snippet: String,
    source_name: String,
    image_url: String,
    summary: Option<String>,
    created_at: Option<String>,
}

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        let normalized = conn
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(normalize_legacy_dates(conn)?)
            })
            .await?;

        if normalized > 0 {
            tracing::info!("Normalized {} legacy pubDate values to RFC 3339", normalized);
        }

        Ok(Self { conn })
    }

    // Item operations

    /// Insert the item unless its id is already stored. Returns whether a row
    /// was created; an existing row is left untouched.
    pub async fn insert_item_if_absent(&self, item: NewItem) -> Result<bool> {
        let summary = item.summary.to_storage()?;
        let published_at = item.published_at.map(|dt| dt.to_rfc3339());

        let inserted = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    r#"INSERT OR IGNORE INTO articles
                       (id, title, originalTitle, link, pubDate, contentSnippet, source, imageUrl, aiSummary)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
                    params![
                        item.id,
                        item.title,
                        item.original_title,
                        item.link,
                        published_at,
                        item.snippet,
                        item.source_name,
                        item.image_url,
                        summary,
                    ],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(inserted)
    }

    pub async fn get_item(&self, id: &str) -> Result<Option<Item>> {
        let id = id.to_string();
        let row = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM articles WHERE id = ?1",
                    ITEM_COLUMNS
                ))?;
                let row = stmt.query_row(params![id], item_row_from_row).optional()?;
                Ok(row)
            })
            .await?;
        row.map(item_from_row).transpose()
    }

    pub async fn count_items(&self) -> Result<i64> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    // Annotation operations

    /// Attach annotations to an existing item, skipping `(item, ordinal)`
    /// pairs that are already stored. Returns the number of rows created.
    pub async fn insert_annotations_if_absent(
        &self,
        item_id: &str,
        annotations: Vec<NewAnnotation>,
    ) -> Result<usize> {
        let item_id = item_id.to_string();
        let lookup_id = item_id.clone();

        let inserted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;

                let exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM articles WHERE id = ?1)",
                    params![item_id],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Ok(None);
                }

                let mut inserted = 0;
                {
                    let mut stmt = tx.prepare(
                        r#"INSERT OR IGNORE INTO comments (articleId, commentId, text, name, isVIP, time)
                           VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                    )?;
                    for annotation in &annotations {
                        inserted += stmt.execute(params![
                            item_id,
                            annotation.ordinal,
                            annotation.text,
                            annotation.author_name,
                            annotation.is_highlighted as i64,
                            annotation.time_label,
                        ])?;
                    }
                }

                tx.commit()?;
                Ok(Some(inserted))
            })
            .await?;

        inserted.ok_or(AppError::ItemNotFound(lookup_id))
    }

    pub async fn count_annotations(&self) -> Result<i64> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    // Snapshot reads

    /// The `limit` newest items by publication date (undated or unparsable
    /// dates last, ties in insertion order), each with its annotations by ordinal.
    pub async fn query_recent(&self, limit: usize) -> Result<Vec<StoredItem>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = self
            .conn
            .call(move |conn| {
                let mut item_stmt = conn.prepare(&format!(
                    r#"SELECT {} FROM articles
                       ORDER BY CASE WHEN pubDate GLOB '{}' THEN pubDate END DESC, rowid ASC
                       LIMIT ?1"#,
                    ITEM_COLUMNS, RFC3339_GLOB
                ))?;
                let items = item_stmt
                    .query_map(params![limit], item_row_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                let mut annotation_stmt = conn.prepare(
                    r#"SELECT id, articleId, commentId, text, name, isVIP, time
                       FROM comments WHERE articleId = ?1
                       ORDER BY commentId ASC, id ASC"#,
                )?;

                let mut rows = Vec::with_capacity(items.len());
                for item in items {
                    let annotations = annotation_stmt
                        .query_map(params![item.id], annotation_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    rows.push((item, annotations));
                }
                Ok(rows)
            })
            .await?;

        rows.into_iter()
            .map(|(item, annotations)| {
                Ok(StoredItem {
                    item: item_from_row(item)?,
                    annotations,
                })
            })
            .collect()
    }
}

/// Rewrite RFC 2822 `pubDate`s left by older writers as RFC 3339 UTC, so text
/// ordering stays chronological. Other unparsable values are kept as is.
fn normalize_legacy_dates(conn: &mut rusqlite::Connection) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    let mut normalized = 0;
    {
        let mut select = tx.prepare(&format!(
            "SELECT rowid, pubDate FROM articles WHERE pubDate IS NOT NULL AND pubDate NOT GLOB '{}'",
            RFC3339_GLOB
        ))?;
        let legacy = select
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut update = tx.prepare("UPDATE articles SET pubDate = ?1 WHERE rowid = ?2")?;
        for (rowid, raw) in legacy {
            if let Ok(dt) = DateTime::parse_from_rfc2822(raw.trim()) {
                normalized +=
                    update.execute(params![dt.with_timezone(&Utc).to_rfc3339(), rowid])?;
            }
        }
    }
    tx.commit()?;
    Ok(normalized)
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite CURRENT_TIMESTAMP format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn item_row_from_row(row: &Row) -> rusqlite::Result<ItemRow> {
    Ok(ItemRow {
        id: row.get(0)?,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        original_title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        link: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        published_at: row.get(4)?,
        snippet: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        source_name: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        image_url: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        summary: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn item_from_row(row: ItemRow) -> Result<Item> {
    // Never leave an item without a summary, even for hand-edited rows.
    let summary = match row.summary.as_deref() {
        Some(raw) => Summary::from_storage(raw)?,
        None => Summary::fallback(&row.snippet),
    };

    Ok(Item {
        id: row.id,
        title: row.title,
        original_title: row.original_title,
        link: row.link,
        published_at: row.published_at,
        snippet: row.snippet,
        source_name: row.source_name,
        image_url: row.image_url,
        summary,
        created_at: row.created_at.as_deref().and_then(parse_datetime),
    })
}

fn annotation_from_row(row: &Row) -> rusqlite::Result<Annotation> {
    Ok(Annotation {
        id: row.get(0)?,
        item_id: row.get(1)?,
        ordinal: row.get(2)?,
        text: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        author_name: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        is_highlighted: row.get::<_, Option<i64>>(5)?.unwrap_or(0) != 0,
        time_label: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::feed::{image_url, item_id};

    fn new_item(link: &str, title: &str, published: Option<DateTime<Utc>>) -> NewItem {
        let id = item_id(link);
        NewItem {
            image_url: image_url(&id),
            id,
            title: title.to_string(),
            original_title: title.to_string(),
            link: link.to_string(),
            published_at: published,
            snippet: format!("{} body", title),
            source_name: "Test Feed".to_string(),
            summary: Summary::fallback(title),
        }
    }

    fn annotation(ordinal: i64, text: &str) -> NewAnnotation {
        NewAnnotation {
            ordinal,
            text: text.to_string(),
            author_name: "Anonymous".to_string(),
            is_highlighted: ordinal == 2,
            time_label: "12:00".to_string(),
        }
    }

    fn day(d: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn insert_is_if_absent_not_upsert() {
        let repo = Repository::open_in_memory().await.unwrap();

        assert!(repo.insert_item_if_absent(new_item("http://x/1", "A", day(1))).await.unwrap());
        assert!(!repo.insert_item_if_absent(new_item("http://x/1", "Changed", day(2))).await.unwrap());

        assert_eq!(repo.count_items().await.unwrap(), 1);
        let stored = repo.get_item(&item_id("http://x/1")).await.unwrap().unwrap();
        assert_eq!(stored.title, "A");
        assert_eq!(stored.published_at.as_deref(), Some("2024-01-01T00:00:00+00:00"));
        assert_eq!(stored.summary, Summary::fallback("A"));
        assert!(stored.created_at.is_some());
    }

    #[tokio::test]
    async fn annotations_dedupe_by_ordinal() {
        let repo = Repository::open_in_memory().await.unwrap();
        repo.insert_item_if_absent(new_item("http://x/1", "A", day(1))).await.unwrap();
        let id = item_id("http://x/1");

        let first = repo
            .insert_annotations_if_absent(&id, vec![annotation(2, "b"), annotation(1, "a")])
            .await
            .unwrap();
        let second = repo
            .insert_annotations_if_absent(&id, vec![annotation(1, "a again"), annotation(3, "c")])
            .await
            .unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 1);
        assert_eq!(repo.count_annotations().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn annotations_require_existing_item() {
        let repo = Repository::open_in_memory().await.unwrap();
        let err = repo
            .insert_annotations_if_absent("missing", vec![annotation(1, "a")])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ItemNotFound(id) if id == "missing"));
        assert_eq!(repo.count_annotations().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn query_recent_orders_and_limits() {
        let repo = Repository::open_in_memory().await.unwrap();
        repo.insert_item_if_absent(new_item("http://x/old", "Old", day(1))).await.unwrap();
        repo.insert_item_if_absent(new_item("http://x/undated", "Undated", None)).await.unwrap();
        repo.insert_item_if_absent(new_item("http://x/new", "New", day(3))).await.unwrap();
        repo.insert_item_if_absent(new_item("http://x/mid-a", "MidA", day(2))).await.unwrap();
        repo.insert_item_if_absent(new_item("http://x/mid-b", "MidB", day(2))).await.unwrap();

        let titles = |items: Vec<StoredItem>| {
            items.into_iter().map(|s| s.item.title).collect::<Vec<_>>()
        };

        assert_eq!(
            titles(repo.query_recent(10).await.unwrap()),
            vec!["New", "MidA", "MidB", "Old", "Undated"]
        );
        assert_eq!(titles(repo.query_recent(2).await.unwrap()), vec!["New", "MidA"]);
    }

    #[tokio::test]
    async fn query_recent_joins_annotations_by_ordinal() {
        let repo = Repository::open_in_memory().await.unwrap();
        repo.insert_item_if_absent(new_item("http://x/1", "A", day(1))).await.unwrap();
        repo.insert_item_if_absent(new_item("http://x/2", "B", day(2))).await.unwrap();
        let id = item_id("http://x/1");
        repo.insert_annotations_if_absent(&id, vec![annotation(3, "c"), annotation(1, "a"), annotation(2, "b")])
            .await
            .unwrap();

        let recent = repo.query_recent(10).await.unwrap();
        assert!(recent[0].annotations.is_empty());

        let annotations = &recent[1].annotations;
        assert_eq!(
            annotations.iter().map(|a| a.ordinal).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(annotations[1].is_highlighted);
        assert!(!annotations[0].is_highlighted);
        assert!(annotations.iter().all(|a| a.item_id == id));
    }

    #[tokio::test]
    async fn legacy_rfc2822_dates_sort_with_new_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.db");

        // A store written by the previous scraper: same schema, RFC 2822 dates.
        {
            let conn = rusqlite::Connection::open(&path).unwrap();
            conn.execute_batch(SCHEMA).unwrap();
            for (id, title, date) in [
                ("legacy-2020", "Legacy2020", Some("Wed, 01 Jan 2020 00:00:00 GMT")),
                ("legacy-2024", "Legacy2024", Some("Mon, 01 Jan 2024 09:00:00 +0900")),
                ("legacy-bad", "LegacyBad", Some("sometime last week")),
                ("legacy-none", "LegacyNone", None),
            ] {
                conn.execute(
                    "INSERT INTO articles (id, title, originalTitle, pubDate, aiSummary) VALUES (?1, ?2, ?2, ?3, '[\"a\",\"b\",\"c\"]')",
                    params![id, title, date],
                )
                .unwrap();
            }
        }

        let repo = Repository::new(&path.to_string_lossy()).await.unwrap();
        repo.insert_item_if_absent(new_item(
            "http://x/new",
            "New2024",
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
        ))
        .await
        .unwrap();

        let titles: Vec<_> = repo
            .query_recent(10)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.item.title)
            .collect();
        assert_eq!(
            titles,
            vec!["New2024", "Legacy2024", "Legacy2020", "LegacyBad", "LegacyNone"]
        );

        let legacy = repo.get_item("legacy-2024").await.unwrap().unwrap();
        assert_eq!(legacy.published_at.as_deref(), Some("2024-01-01T00:00:00+00:00"));
        let bad = repo.get_item("legacy-bad").await.unwrap().unwrap();
        assert_eq!(bad.published_at.as_deref(), Some("sometime last week"));
    }

    #[tokio::test]
    async fn reopening_file_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.db");
        let path = path.to_string_lossy().to_string();

        {
            let repo = Repository::new(&path).await.unwrap();
            repo.insert_item_if_absent(new_item("http://x/1", "A", day(1))).await.unwrap();
        }

        let repo = Repository::new(&path).await.unwrap();
        assert_eq!(repo.count_items().await.unwrap(), 1);
        assert!(!repo.insert_item_if_absent(new_item("http://x/1", "A", day(1))).await.unwrap());
    }
}
