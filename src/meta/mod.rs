//! Metadata storage using SQLite
//!
//! This module handles all local storage including:
//! - Schema records (JSON-LD bodies and meta overrides per URL)
//! - Content items (the host site's pages/posts/products and their fields)

mod content;
mod schema;

pub use content::*;
pub use schema::*;

use crate::config::Config;
use crate::error::{Error, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::{debug, info};

/// Name given to records submitted without one
pub const DEFAULT_SCHEMA_NAME: &str = "Schema without name";

/// Current time as a fixed-width UTC RFC 3339 string.
///
/// Fixed microsecond precision keeps text order equal to time order.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// The fixed vocabulary of schema types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaType {
    #[default]
    WebPage,
    Article,
    Product,
    Organization,
    LocalBusiness,
    Person,
    Event,
    Recipe,
    Review,
    #[serde(rename = "FAQ")]
    Faq,
}

impl SchemaType {
    pub const ALL: [SchemaType; 10] = [
        SchemaType::WebPage,
        SchemaType::Article,
        SchemaType::Product,
        SchemaType::Organization,
        SchemaType::LocalBusiness,
        SchemaType::Person,
        SchemaType::Event,
        SchemaType::Recipe,
        SchemaType::Review,
        SchemaType::Faq,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::WebPage => "WebPage",
            SchemaType::Article => "Article",
            SchemaType::Product => "Product",
            SchemaType::Organization => "Organization",
            SchemaType::LocalBusiness => "LocalBusiness",
            SchemaType::Person => "Person",
            SchemaType::Event => "Event",
            SchemaType::Recipe => "Recipe",
            SchemaType::Review => "Review",
            SchemaType::Faq => "FAQ",
        }
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SchemaType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidSchemaType(s.to_string()))
    }
}

/// Validated field values for a schema record, ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDraft {
    pub url: String,
    pub schema_name: String,
    pub schema_type: SchemaType,
    pub schema_data: String,
    pub meta_title: String,
    pub meta_description: String,
    pub is_active: bool,
}

/// A stored schema record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub id: i64,
    pub url: String,
    pub schema_name: String,
    pub schema_data: String,
    pub schema_type: String,
    pub meta_title: String,
    pub meta_description: String,
    #[serde(serialize_with = "bool_as_int", deserialize_with = "bool_from_int")]
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl SchemaRecord {
    /// Build an unsaved record; `id` is assigned by the store on insert
    pub fn new(draft: SchemaDraft) -> Self {
        let now = now_timestamp();
        Self {
            id: 0,
            url: draft.url,
            schema_name: draft.schema_name,
            schema_data: draft.schema_data,
            schema_type: draft.schema_type.to_string(),
            meta_title: draft.meta_title,
            meta_description: draft.meta_description,
            is_active: draft.is_active,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn get_type(&self) -> Result<SchemaType> {
        self.schema_type.parse()
    }
}

fn bool_as_int<S: Serializer>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

fn bool_from_int<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

/// Listing filters; all present filters must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaFilter {
    /// Exact URL match
    pub url: Option<String>,
    /// Exact type match
    pub schema_type: Option<SchemaType>,
    /// Substring of url, name or data
    pub search: Option<String>,
}

impl SchemaFilter {
    fn where_clause(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            clauses.push("url = ?");
            params.push(url.to_string());
        }

        if let Some(schema_type) = self.schema_type {
            clauses.push("schema_type = ?");
            params.push(schema_type.to_string());
        }

        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            clauses.push(
                r"(url LIKE ? ESCAPE '\' OR schema_name LIKE ? ESCAPE '\' OR schema_data LIKE ? ESCAPE '\')",
            );
            let pattern = format!("%{}%", escape_like(search));
            params.extend(std::iter::repeat(pattern).take(3));
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), params)
        }
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Count of records of one type
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TypeCount {
    pub schema_type: String,
    pub count: i64,
}

/// Dashboard counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaStats {
    pub total: i64,
    pub active: i64,
    pub url_count: i64,
    pub top_types: Vec<TypeCount>,
}

/// Metadata database handle
#[derive(Clone)]
pub struct MetaDb {
    pool: SqlitePool,
}

impl MetaDb {
    /// Connect to the metadata database
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::open(&config.paths.db_file).await
    }

    async fn open(db_path: &std::path::Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create database with path directly, initializing the schema if needed
    pub async fn new(db_path: &std::path::Path) -> Result<Self> {
        let db = Self::open(db_path).await?;

        if !db.is_initialized().await? {
            db.init_schema().await?;
        }

        Ok(db)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if database is initialized
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schemas'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(result.is_some())
    }

    // ===== Schema Operations =====

    /// Insert a new schema record, returning its assigned id
    pub async fn insert_schema(&self, record: &SchemaRecord) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO schemas (url, schema_name, schema_data, schema_type, meta_title, meta_description, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.url)
        .bind(&record.schema_name)
        .bind(&record.schema_data)
        .bind(&record.schema_type)
        .bind(&record.meta_title)
        .bind(&record.meta_description)
        .bind(record.is_active)
        .bind(&record.created_at)
        .bind(&record.updated_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!("Inserted schema {} for {}", id, record.url);
        Ok(id)
    }

    /// Get schema by ID
    pub async fn get_schema(&self, id: i64) -> Result<Option<SchemaRecord>> {
        let record = sqlx::query_as::<_, SchemaRecord>("SELECT * FROM schemas WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// Get schema by ID, failing with `NotFound` when absent
    pub async fn require_schema(&self, id: i64) -> Result<SchemaRecord> {
        self.get_schema(id).await?.ok_or(Error::NotFound(id))
    }

    /// Replace every editable field of a record
    pub async fn update_schema(&self, id: i64, draft: &SchemaDraft) -> Result<SchemaRecord> {
        let result = sqlx::query(
            r#"
            UPDATE schemas SET
                url = ?,
                schema_name = ?,
                schema_data = ?,
                schema_type = ?,
                meta_title = ?,
                meta_description = ?,
                is_active = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&draft.url)
        .bind(&draft.schema_name)
        .bind(&draft.schema_data)
        .bind(draft.schema_type.as_str())
        .bind(&draft.meta_title)
        .bind(&draft.meta_description)
        .bind(draft.is_active)
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id));
        }

        info!("Updated schema {}", id);
        self.require_schema(id).await
    }

    /// Flip the active flag, returning the new value
    pub async fn toggle_schema(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE schemas SET
                is_active = CASE WHEN is_active = 0 THEN 1 ELSE 0 END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id));
        }

        let active: bool = sqlx::query_scalar("SELECT is_active FROM schemas WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        info!("Schema {} is now {}", id, if active { "active" } else { "inactive" });
        Ok(active)
    }

    /// Set the active flag to an explicit value
    pub async fn set_schema_active(&self, id: i64, active: bool) -> Result<()> {
        let result = sqlx::query("UPDATE schemas SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active)
            .bind(now_timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }

    /// Hard-delete a record
    pub async fn delete_schema(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM schemas WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id));
        }

        info!("Deleted schema {}", id);
        Ok(())
    }

    /// List records matching `filter`, most recently updated first
    pub async fn list_schemas(
        &self,
        filter: &SchemaFilter,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<SchemaRecord>> {
        let (where_sql, params) = filter.where_clause();
        let sql = format!(
            "SELECT * FROM schemas {} ORDER BY updated_at DESC, id DESC LIMIT ? OFFSET ?",
            where_sql
        );
        debug!("Listing schemas: {} ({} params)", sql, params.len());

        let mut query = sqlx::query_as::<_, SchemaRecord>(&sql);
        for param in &params {
            query = query.bind(param);
        }
        let records = query
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Count records matching `filter`
    pub async fn count_schemas(&self, filter: &SchemaFilter) -> Result<i64> {
        let (where_sql, params) = filter.where_clause();
        let sql = format!("SELECT COUNT(*) FROM schemas {}", where_sql);

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for param in &params {
            query = query.bind(param);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    /// Active records for a URL, oldest first
    pub async fn active_schemas_for_url(&self, url: &str) -> Result<Vec<SchemaRecord>> {
        let records = sqlx::query_as::<_, SchemaRecord>(
            "SELECT * FROM schemas WHERE url = ? AND is_active = 1 ORDER BY created_at ASC, id ASC",
        )
        .bind(url)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Meta title/description of the most recently updated active record for a URL
    pub async fn latest_active_meta_for_url(&self, url: &str) -> Result<Option<(String, String)>> {
        let meta = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT meta_title, meta_description FROM schemas
            WHERE url = ? AND is_active = 1
            ORDER BY updated_at DESC, id DESC LIMIT 1
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(meta)
    }

    /// Number of records (active or not) attached to a URL
    pub async fn count_schemas_for_url(&self, url: &str) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM schemas WHERE url = ?")
            .bind(url)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Copy meta title/description onto every record of a URL
    pub async fn sync_meta_for_url(
        &self,
        url: &str,
        meta_title: &str,
        meta_description: &str,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE schemas SET meta_title = ?, meta_description = ?, updated_at = ? WHERE url = ?",
        )
        .bind(meta_title)
        .bind(meta_description)
        .bind(now_timestamp())
        .bind(url)
        .execute(&self.pool)
        .await?;

        debug!("Synced meta onto {} schemas for {}", result.rows_affected(), url);
        Ok(result.rows_affected())
    }

    // ===== Statistics =====

    /// Dashboard counters
    pub async fn get_stats(&self) -> Result<SchemaStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schemas")
            .fetch_one(&self.pool)
            .await?;

        let active: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schemas WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        let url_count: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT url) FROM schemas")
            .fetch_one(&self.pool)
            .await?;

        let top_types = sqlx::query_as::<_, TypeCount>(
            r#"
            SELECT schema_type, COUNT(*) AS count FROM schemas
            GROUP BY schema_type
            ORDER BY count DESC, schema_type ASC
            LIMIT 2
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(SchemaStats {
            total,
            active,
            url_count,
            top_types,
        })
    }
}
