//! Admin operations on schema records
//!
//! Both the form channel and the JSON channel funnel into [`SchemaService`], so
//! every write passes the same validation pipeline before touching the store.

mod auth;
mod input;
mod pagination;

pub use auth::*;
pub use input::*;
pub use pagination::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::meta::{
    BulkCandidate, MetaDb, SchemaFilter, SchemaRecord, DEFAULT_SCHEMA_NAME,
};
use crate::resolve::{LOCAL_DESCRIPTION_KEY, LOCAL_TITLE_KEY};
use crate::validate::{
    check_meta_lengths, reject_if_contains_script_tag, sanitize_text_field,
    sanitize_textarea_field, validate_and_canonicalize, LengthWarning,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Name given to records created by bulk apply without one
pub const BULK_SCHEMA_NAME: &str = "Bulk Schema";

/// Most content items offered for bulk apply at once
pub const BULK_CANDIDATE_LIMIT: u32 = 500;

/// Result of a create or update
#[derive(Debug, Clone, Serialize)]
pub struct Saved {
    pub id: i64,
    pub name: String,
    pub warnings: Vec<LengthWarning>,
}

/// A URL that bulk apply could not attach a record to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub url: String,
    pub error: String,
}

/// Per-batch counters for bulk apply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<BulkFailure>,
}

/// Result of saving an item's local meta overrides
#[derive(Debug, Clone, Serialize)]
pub struct ItemMetaSaved {
    pub item_id: i64,
    pub synced_records: u64,
    pub warnings: Vec<LengthWarning>,
}

/// Map a bulk candidate selector (`page`, `all-pages`, ...) to a content kind
pub fn candidate_kind(selector: &str) -> &str {
    match selector {
        "all-pages" => "page",
        "all-posts" => "post",
        "all-products" => "product",
        other => other,
    }
}

/// Validated admin operations over the store
#[derive(Clone)]
pub struct SchemaService {
    db: MetaDb,
    site_base_url: String,
}

impl SchemaService {
    pub fn new(db: MetaDb, config: &Config) -> Self {
        Self {
            db,
            site_base_url: config.site.base_url.clone(),
        }
    }

    pub fn db(&self) -> &MetaDb {
        &self.db
    }

    /// Validate and insert a new record
    pub async fn create(&self, input: &SchemaInput) -> Result<Saved> {
        let prepared = input.prepare(&self.site_base_url, DEFAULT_SCHEMA_NAME)?;
        let draft = prepared.draft;
        let id = self.db.insert_schema(&SchemaRecord::new(draft.clone())).await?;

        // Mirror meta onto the content item at this URL; empty fields leave it alone
        if let Some(item) = self.db.get_content_item_by_url(&draft.url).await? {
            if !draft.meta_title.is_empty() {
                self.db.set_item_meta(item.id, LOCAL_TITLE_KEY, &draft.meta_title).await?;
            }
            if !draft.meta_description.is_empty() {
                self.db
                    .set_item_meta(item.id, LOCAL_DESCRIPTION_KEY, &draft.meta_description)
                    .await?;
            }
        }

        Ok(Saved {
            id,
            name: draft.schema_name,
            warnings: prepared.warnings,
        })
    }

    /// Validate and replace every field of an existing record.
    ///
    /// The active flag is kept unless the input sets it.
    pub async fn update(&self, id: i64, input: &SchemaInput) -> Result<Saved> {
        let existing = self.db.require_schema(id).await?;

        let prepared = input.prepare(&self.site_base_url, DEFAULT_SCHEMA_NAME)?;
        let mut draft = prepared.draft;
        draft.is_active = input.is_active.unwrap_or(existing.is_active);
        self.db.update_schema(id, &draft).await?;

        // Mirror meta onto the content item; empty fields clear the override
        if let Some(item) = self.db.get_content_item_by_url(&draft.url).await? {
            self.mirror_field(item.id, LOCAL_TITLE_KEY, &draft.meta_title).await?;
            self.mirror_field(item.id, LOCAL_DESCRIPTION_KEY, &draft.meta_description)
                .await?;
        }

        Ok(Saved {
            id,
            name: draft.schema_name,
            warnings: prepared.warnings,
        })
    }

    async fn mirror_field(&self, item_id: i64, key: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            self.db.delete_item_meta(item_id, key).await
        } else {
            self.db.set_item_meta(item_id, key, value).await
        }
    }

    pub async fn get(&self, id: i64) -> Result<SchemaRecord> {
        self.db.require_schema(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.db.delete_schema(id).await
    }

    /// Flip the active flag; returns the new value
    pub async fn toggle(&self, id: i64) -> Result<bool> {
        self.db.toggle_schema(id).await
    }

    pub async fn set_active(&self, id: i64, active: bool) -> Result<()> {
        self.db.set_schema_active(id, active).await
    }

    /// One page of records matching `filter`, most recently updated first
    pub async fn list(&self, filter: &SchemaFilter, request: PageRequest) -> Result<Page<SchemaRecord>> {
        let total = self.db.count_schemas(filter).await?;
        let info = PageInfo::compute(request, u64::try_from(total).unwrap_or(0));
        let items = self
            .db
            .list_schemas(filter, info.per_page, info.offset())
            .await?;

        debug!(
            "Listed page {}/{} ({} of {} records)",
            info.page,
            info.total_pages,
            items.len(),
            info.total_items
        );
        Ok(Page { items, info })
    }

    /// Every record, most recently updated first
    pub async fn list_all(&self) -> Result<Vec<SchemaRecord>> {
        self.db
            .list_schemas(&SchemaFilter::default(), u32::MAX, 0)
            .await
    }

    /// Attach one schema body to many URLs
    pub async fn bulk_apply(&self, input: &BulkApplyInput) -> Result<BulkOutcome> {
        self.bulk_apply_with(input, |_, _| {}).await
    }

    /// Like [`bulk_apply`](Self::bulk_apply), reporting each URL as it is handled.
    ///
    /// Shared fields are validated once up front and fail the whole batch. Per-URL
    /// failures are counted and reported without stopping the batch.
    pub async fn bulk_apply_with<F>(&self, input: &BulkApplyInput, mut on_url: F) -> Result<BulkOutcome>
    where
        F: FnMut(&str, bool),
    {
        input.require_urls()?;
        let template = input.schema.prepare_for_url(String::new(), BULK_SCHEMA_NAME)?;

        let mut outcome = BulkOutcome::default();
        for raw in input.urls.iter().filter(|u| !u.trim().is_empty()) {
            let url = match validate_and_canonicalize(raw, &self.site_base_url) {
                Ok(url) => url,
                Err(e) => {
                    debug!("Bulk apply skipped {}: {}", raw, e);
                    outcome.failed += 1;
                    outcome.errors.push(BulkFailure {
                        url: raw.clone(),
                        error: "Invalid URL".to_string(),
                    });
                    on_url(raw, false);
                    continue;
                }
            };

            let mut draft = template.draft.clone();
            draft.url = url.clone();
            draft.is_active = true;

            match self.db.insert_schema(&SchemaRecord::new(draft)).await {
                Ok(_) => {
                    outcome.success += 1;
                    on_url(&url, true);
                }
                Err(e) => {
                    warn!("Bulk apply failed for {}: {}", url, e);
                    outcome.failed += 1;
                    outcome.errors.push(BulkFailure {
                        url: url.clone(),
                        error: "Database error".to_string(),
                    });
                    on_url(&url, false);
                }
            }
        }

        info!(
            "Bulk apply finished: {} succeeded, {} failed",
            outcome.success, outcome.failed
        );
        Ok(outcome)
    }

    /// Content items of a kind, with their record counts
    pub async fn bulk_candidates(&self, selector: &str) -> Result<Vec<BulkCandidate>> {
        self.db
            .list_bulk_candidates(candidate_kind(selector), BULK_CANDIDATE_LIMIT)
            .await
    }

    /// Write an item's local meta overrides and copy them onto every record at its URL.
    ///
    /// Empty values clear the override.
    pub async fn save_item_meta(
        &self,
        item_id: i64,
        meta_title: &str,
        meta_description: &str,
    ) -> Result<ItemMetaSaved> {
        reject_if_contains_script_tag(meta_title)?;
        reject_if_contains_script_tag(meta_description)?;

        let item = self
            .db
            .get_content_item(item_id)
            .await?
            .ok_or(Error::ItemNotFound(item_id))?;

        let meta_title = sanitize_text_field(meta_title);
        let meta_description = sanitize_textarea_field(meta_description);
        let warnings = check_meta_lengths(&meta_title, &meta_description);

        self.mirror_field(item.id, LOCAL_TITLE_KEY, &meta_title).await?;
        self.mirror_field(item.id, LOCAL_DESCRIPTION_KEY, &meta_description)
            .await?;

        let synced_records = self
            .db
            .sync_meta_for_url(&item.url, &meta_title, &meta_description)
            .await?;

        info!(
            "Saved meta for item {} and synced {} records",
            item.id, synced_records
        );
        Ok(ItemMetaSaved {
            item_id: item.id,
            synced_records,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::tests::setup_test_db;
    use crate::meta::NewContentItem;
    use tempfile::TempDir;

    async fn setup() -> (SchemaService, TempDir) {
        let (db, tmp) = setup_test_db().await;
        let mut config = Config::default();
        config.site.base_url = "https://example.com".to_string();
        (SchemaService::new(db, &config), tmp)
    }

    fn input(url: &str) -> SchemaInput {
        SchemaInput {
            url: Some(url.to_string()),
            schema_data: Some(r#"{"@type": "WebPage", "name": "{{meta_title}}"}"#.to_string()),
            ..Default::default()
        }
    }

    async fn page(service: &SchemaService, url: &str) -> i64 {
        service
            .db()
            .upsert_content_item(&NewContentItem {
                url: url.to_string(),
                kind: "page".to_string(),
                title: "Page".to_string(),
                excerpt: None,
                body: String::new(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_before_writing() {
        let (service, _tmp) = setup().await;

        assert!(service.create(&input("https://evil.com/")).await.is_err());
        let mut bad = input("https://example.com/");
        bad.schema_data = Some("{bad json".to_string());
        assert!(service.create(&bad).await.is_err());

        assert_eq!(
            service.db().count_schemas(&SchemaFilter::default()).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_create_mirrors_meta_onto_item() {
        let (service, _tmp) = setup().await;
        let item_id = page(&service, "https://example.com/about").await;

        let mut i = input("http://example.com/about");
        i.meta_title = Some("About us".to_string());
        let saved = service.create(&i).await.unwrap();

        let record = service.get(saved.id).await.unwrap();
        assert_eq!(record.url, "https://example.com/about");

        let meta = service.db().item_meta(item_id).await.unwrap();
        assert_eq!(meta[LOCAL_TITLE_KEY], "About us");
        assert!(!meta.contains_key(LOCAL_DESCRIPTION_KEY));
    }

    #[tokio::test]
    async fn test_update_keeps_active_flag_and_clears_mirrored_meta() {
        let (service, _tmp) = setup().await;
        let item_id = page(&service, "https://example.com/about").await;

        let mut i = input("https://example.com/about");
        i.meta_title = Some("About us".to_string());
        let id = service.create(&i).await.unwrap().id;
        service.toggle(id).await.unwrap();

        let mut changed = input("https://example.com/about");
        changed.schema_name = Some("Renamed".to_string());
        service.update(id, &changed).await.unwrap();

        let record = service.get(id).await.unwrap();
        assert_eq!(record.schema_name, "Renamed");
        assert!(!record.is_active);
        assert!(service.db().item_meta(item_id).await.unwrap().is_empty());

        assert!(matches!(
            service.update(999, &changed).await,
            Err(Error::NotFound(999))
        ));
    }

    #[tokio::test]
    async fn test_list_pins_page() {
        let (service, _tmp) = setup().await;
        for n in 0..5 {
            service
                .create(&input(&format!("https://example.com/{}", n)))
                .await
                .unwrap();
        }

        let page = service
            .list(&SchemaFilter::default(), PageRequest { page: 10, per_page: 2 })
            .await
            .unwrap();
        assert_eq!(page.info.total_pages, 3);
        assert_eq!(page.info.page, 3);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_bulk_apply_counts_failures() {
        let (service, _tmp) = setup().await;

        let bulk = BulkApplyInput {
            urls: vec![
                "https://example.com/a".to_string(),
                "https://evil.com/b".to_string(),
                "http://shop.example.com/c".to_string(),
                "".to_string(),
            ],
            schema: SchemaInput {
                schema_type: Some("Article".to_string()),
                schema_data: Some("{}".to_string()),
                ..Default::default()
            },
        };

        let mut seen = Vec::new();
        let outcome = service
            .bulk_apply_with(&bulk, |url, ok| seen.push((url.to_string(), ok)))
            .await
            .unwrap();

        assert_eq!(outcome.success, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(
            outcome.errors,
            vec![BulkFailure {
                url: "https://evil.com/b".to_string(),
                error: "Invalid URL".to_string(),
            }]
        );
        assert_eq!(seen.len(), 3);

        let records = service
            .list(&SchemaFilter::default(), PageRequest { page: 1, per_page: 10 })
            .await
            .unwrap()
            .items;
        assert!(records.iter().all(|r| r.schema_name == BULK_SCHEMA_NAME));
        assert!(records.iter().any(|r| r.url == "https://shop.example.com/c"));
    }

    #[tokio::test]
    async fn test_bulk_apply_shared_fields_fail_batch() {
        let (service, _tmp) = setup().await;

        let no_urls = BulkApplyInput::default();
        assert!(matches!(service.bulk_apply(&no_urls).await, Err(Error::NoUrls)));

        let bad_json = BulkApplyInput {
            urls: vec!["https://example.com/a".to_string()],
            schema: SchemaInput {
                schema_data: Some("{bad".to_string()),
                ..Default::default()
            },
        };
        assert!(matches!(
            service.bulk_apply(&bad_json).await,
            Err(Error::InvalidJson(_))
        ));
    }

    #[tokio::test]
    async fn test_save_item_meta_syncs_records() {
        let (service, _tmp) = setup().await;
        let item_id = page(&service, "https://example.com/about").await;
        service.create(&input("https://example.com/about")).await.unwrap();
        service.create(&input("https://example.com/about")).await.unwrap();
        service.create(&input("https://example.com/other")).await.unwrap();

        let saved = service
            .save_item_meta(item_id, "New <b>title</b>", "New description")
            .await
            .unwrap();
        assert_eq!(saved.synced_records, 2);

        let meta = service
            .db()
            .latest_active_meta_for_url("https://example.com/about")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(meta, ("New title".to_string(), "New description".to_string()));
        assert_eq!(
            service.db().item_meta(item_id).await.unwrap()[LOCAL_TITLE_KEY],
            "New title"
        );

        assert!(matches!(
            service.save_item_meta(item_id, "<script>", "").await,
            Err(Error::ScriptTagDetected)
        ));
    }

    #[tokio::test]
    async fn test_bulk_candidates_selector() {
        let (service, _tmp) = setup().await;
        page(&service, "https://example.com/a").await;

        assert_eq!(service.bulk_candidates("all-pages").await.unwrap().len(), 1);
        assert_eq!(service.bulk_candidates("page").await.unwrap().len(), 1);
        assert!(service.bulk_candidates("all-posts").await.unwrap().is_empty());
    }
}
