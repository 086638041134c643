//! Content items of the host site and their key/value fields

use super::{now_timestamp, MetaDb};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use tracing::{debug, info};

/// A page, post or product that schema records can be attached to
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: i64,
    pub url: String,
    pub kind: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for creating or replacing a content item
#[derive(Debug, Clone, Default)]
pub struct NewContentItem {
    pub url: String,
    pub kind: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub body: String,
}

/// A content item offered for bulk apply, with how many records it already has
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BulkCandidate {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub kind: String,
    pub schema_count: i64,
}

impl MetaDb {
    // ===== Content Operations =====

    /// Insert a content item, or replace the one with the same URL. Returns its id.
    pub async fn upsert_content_item(&self, item: &NewContentItem) -> Result<i64> {
        let now = now_timestamp();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO content_items (url, kind, title, excerpt, body, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                kind = excluded.kind,
                title = excluded.title,
                excerpt = excluded.excerpt,
                body = excluded.body,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(&item.url)
        .bind(&item.kind)
        .bind(&item.title)
        .bind(&item.excerpt)
        .bind(&item.body)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        info!("Upserted {} {} ({})", item.kind, id, item.url);
        Ok(id)
    }

    pub async fn get_content_item(&self, id: i64) -> Result<Option<ContentItem>> {
        let item = sqlx::query_as::<_, ContentItem>("SELECT * FROM content_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn get_content_item_by_url(&self, url: &str) -> Result<Option<ContentItem>> {
        let item = sqlx::query_as::<_, ContentItem>("SELECT * FROM content_items WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    /// List items of one kind, most recently created first
    pub async fn list_content_items(&self, kind: &str, limit: u32) -> Result<Vec<ContentItem>> {
        let items = sqlx::query_as::<_, ContentItem>(
            "SELECT * FROM content_items WHERE kind = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(kind)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Items of one kind with their schema record counts
    pub async fn list_bulk_candidates(&self, kind: &str, limit: u32) -> Result<Vec<BulkCandidate>> {
        let candidates = sqlx::query_as::<_, BulkCandidate>(
            r#"
            SELECT c.id, c.title, c.url, c.kind,
                   (SELECT COUNT(*) FROM schemas s WHERE s.url = c.url) AS schema_count
            FROM content_items c
            WHERE c.kind = ?
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT ?
            "#,
        )
        .bind(kind)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(candidates)
    }

    /// All key/value fields stored against an item
    pub async fn item_meta(&self, item_id: i64) -> Result<HashMap<String, String>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT meta_key, meta_value FROM content_meta WHERE item_id = ?")
                .bind(item_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn set_item_meta(&self, item_id: i64, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO content_meta (item_id, meta_key, meta_value) VALUES (?, ?, ?)
            ON CONFLICT(item_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value
            "#,
        )
        .bind(item_id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        debug!("Set {} on item {}", key, item_id);
        Ok(())
    }

    pub async fn delete_item_meta(&self, item_id: i64, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM content_meta WHERE item_id = ? AND meta_key = ?")
            .bind(item_id)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
