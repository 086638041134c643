//! Schema record commands: add, edit, toggle, remove, show, list

use crate::admin::{Page, PageRequest, Saved, SchemaInput, SchemaService};
use crate::error::Result;
use crate::meta::{SchemaFilter, SchemaRecord};
use crate::validate::validate_schema_type;
use std::path::Path;

/// Read a schema body given inline or as `@path`
pub fn read_schema_data(value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) => Ok(std::fs::read_to_string(Path::new(path))?),
        None => Ok(value.to_string()),
    }
}

/// Listing options from the command line
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub url: Option<String>,
    pub schema_type: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn cmd_add(service: &SchemaService, input: &SchemaInput) -> Result<Saved> {
    service.create(input).await
}

pub async fn cmd_edit(service: &SchemaService, id: i64, input: &SchemaInput) -> Result<Saved> {
    service.update(id, input).await
}

/// Toggle, or set explicitly when `active` is given; returns the new state
pub async fn cmd_toggle(service: &SchemaService, id: i64, active: Option<bool>) -> Result<bool> {
    match active {
        Some(active) => {
            service.set_active(id, active).await?;
            Ok(active)
        }
        None => service.toggle(id).await,
    }
}

pub async fn cmd_remove(service: &SchemaService, id: i64) -> Result<()> {
    service.delete(id).await
}

pub async fn cmd_show(service: &SchemaService, id: i64) -> Result<SchemaRecord> {
    service.get(id).await
}

pub async fn cmd_list(
    service: &SchemaService,
    options: ListOptions,
    default_per_page: u32,
    max_per_page: u32,
) -> Result<Page<SchemaRecord>> {
    let schema_type = match options.schema_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(t) => Some(validate_schema_type(t)?),
    };
    let filter = SchemaFilter {
        url: options.url,
        schema_type,
        search: options.search,
    };
    let request = PageRequest::new(options.page, options.per_page, default_per_page, max_per_page);
    service.list(&filter, request).await
}

pub fn print_saved(saved: &Saved, verb: &str) {
    println!("✓ Schema \"{}\" {} (id {})", saved.name, verb, saved.id);
    for warning in &saved.warnings {
        println!("  ⚠ {}", warning);
    }
}

pub fn print_record(record: &SchemaRecord) {
    let state = if record.is_active { "active" } else { "inactive" };
    println!("\n#{} {} [{}] ({})", record.id, record.schema_name, record.schema_type, state);
    println!("  URL: {}", record.url);
    if !record.meta_title.is_empty() {
        println!("  Meta title: {}", record.meta_title);
    }
    if !record.meta_description.is_empty() {
        println!("  Meta description: {}", record.meta_description);
    }
    println!("  Created: {}  Updated: {}", record.created_at, record.updated_at);
    println!("\n{}", record.schema_data);
}

pub fn print_page<T>(page: &Page<T>, line: impl Fn(&T) -> String) {
    if page.items.is_empty() {
        println!("No schemas found. Use 'ldhead add' to create one.");
        return;
    }

    for item in &page.items {
        println!("{}", line(item));
    }
    println!(
        "\nPage {}/{} ({} total)",
        page.info.page, page.info.total_pages, page.info.total_items
    );
}

/// One-line summary of a record for listings
pub fn record_line(record: &SchemaRecord) -> String {
    format!(
        "{} #{:<5} {:<16} {:<30} {}",
        if record.is_active { "●" } else { "○" },
        record.id,
        record.schema_type,
        record.schema_name,
        record.url
    )
}
