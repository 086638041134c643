//! Content item commands: register pages, edit their local meta and raw fields,
//! list bulk candidates

use crate::admin::{ItemMetaSaved, SchemaService};
use crate::error::{Error, Result};
use crate::meta::{BulkCandidate, ContentItem, MetaDb, NewContentItem};
use crate::validate::{reject_if_contains_script_tag, validate_and_canonicalize};
use serde::Serialize;
use tracing::info;

/// Outcome of a raw field write; `value` is `None` when the field was removed
#[derive(Debug, Clone, Serialize)]
pub struct FieldSaved {
    pub item_id: i64,
    pub key: String,
    pub value: Option<String>,
}

/// Insert or replace a content item; its URL must belong to the site
pub async fn cmd_content_upsert(
    db: &MetaDb,
    site_base_url: &str,
    mut item: NewContentItem,
) -> Result<ContentItem> {
    item.url = validate_and_canonicalize(&item.url, site_base_url)?;
    let id = db.upsert_content_item(&item).await?;
    info!("Upserted content item {} ({})", id, item.url);

    db.get_content_item(id)
        .await?
        .ok_or(Error::ItemNotFound(id))
}

/// Set (or clear, with empty strings) an item's meta overrides
pub async fn cmd_content_meta(
    service: &SchemaService,
    item_id: i64,
    meta_title: &str,
    meta_description: &str,
) -> Result<ItemMetaSaved> {
    service
        .save_item_meta(item_id, meta_title, meta_description)
        .await
}

/// Set or remove one stored field on an item, such as an SEO plugin's title.
///
/// Values are stored as given; unlike `content meta` nothing is sanitized or synced
/// onto the item's schemas.
pub async fn cmd_content_field(
    db: &MetaDb,
    item_id: i64,
    key: &str,
    value: Option<&str>,
) -> Result<FieldSaved> {
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::Other("Field key is required".to_string()));
    }

    let item = db
        .get_content_item(item_id)
        .await?
        .ok_or(Error::ItemNotFound(item_id))?;

    match value {
        Some(value) => {
            reject_if_contains_script_tag(value)?;
            db.set_item_meta(item.id, key, value).await?;
            info!("Set {} on content item {}", key, item.id);
        }
        None => {
            db.delete_item_meta(item.id, key).await?;
            info!("Removed {} from content item {}", key, item.id);
        }
    }

    Ok(FieldSaved {
        item_id: item.id,
        key: key.to_string(),
        value: value.map(str::to_string),
    })
}

pub async fn cmd_candidates(service: &SchemaService, selector: &str) -> Result<Vec<BulkCandidate>> {
    service.bulk_candidates(selector).await
}

pub fn print_content_item(item: &ContentItem) {
    println!("✓ Content item #{} [{}] {}", item.id, item.kind, item.title);
    println!("  URL: {}", item.url);
}

pub fn print_item_meta_saved(saved: &ItemMetaSaved) {
    println!(
        "✓ Saved meta for item #{} ({} records synced)",
        saved.item_id, saved.synced_records
    );
    for warning in &saved.warnings {
        println!("  ⚠ {}", warning);
    }
}

pub fn print_field_saved(saved: &FieldSaved) {
    match &saved.value {
        Some(value) => println!("✓ Item #{}: {} = {}", saved.item_id, saved.key, value),
        None => println!("✓ Item #{}: removed {}", saved.item_id, saved.key),
    }
}

pub fn print_candidates(candidates: &[BulkCandidate]) {
    if candidates.is_empty() {
        println!("No content items of that kind. Use 'ldhead content upsert' to add some.");
        return;
    }

    for c in candidates {
        println!("#{:<5} {:<8} {:>3} schemas  {}  {}", c.id, c.kind, c.schema_count, c.title, c.url);
    }
}
