//! Head fragment rendering
//!
//! Active records for the request URL become `<script type="application/ld+json">`
//! blocks with the resolved meta values spliced into their placeholders. A record
//! whose body stops being valid JSON after substitution is skipped, never fatal.

mod html;

pub use html::*;

use crate::config::Config;
use crate::error::Result;
use crate::meta::SchemaRecord;
use crate::resolve::{ContentSource, RecordSource, RenderRequest, ResolvedMeta, Resolver};
use serde::Serialize;
use tracing::{debug, warn};

/// Placeholder replaced with the resolved meta title
pub const META_TITLE_TOKEN: &str = "{{meta_title}}";

/// Placeholder replaced with the resolved meta description
pub const META_DESCRIPTION_TOKEN: &str = "{{meta_description}}";

/// One record ready for embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedSchema {
    pub name: String,
    pub json: String,
}

/// Escape `value` for use inside a JSON string literal, without the quotes
fn json_string_contents(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

/// Replace both placeholders in a stored body. Empty values remove the token.
pub fn substitute_placeholders(data: &str, meta: &ResolvedMeta) -> String {
    data.replace(META_TITLE_TOKEN, &json_string_contents(&meta.title))
        .replace(META_DESCRIPTION_TOKEN, &json_string_contents(&meta.description))
}

/// Pretty JSON (four-space indent, slashes and unicode unescaped) safe inside a script element.
///
/// `<` only occurs inside JSON strings, so every one is written as `\u003c`; no markup
/// (`</script`, `<!--`) survives into the element.
pub fn serialize_for_script(value: &serde_json::Value) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).replace('<', r"\u003c"))
}

/// Substitute, re-validate and re-serialize each record, dropping the ones that fail.
///
/// Output order is input order.
pub fn render_schemas(records: &[SchemaRecord], meta: &ResolvedMeta) -> Vec<RenderedSchema> {
    records
        .iter()
        .filter_map(|record| {
            let substituted = substitute_placeholders(&record.schema_data, meta);
            let rendered = serde_json::from_str::<serde_json::Value>(&substituted)
                .map_err(crate::error::Error::from)
                .and_then(|value| serialize_for_script(&value));

            match rendered {
                Ok(json) => Some(RenderedSchema {
                    name: record.schema_name.clone(),
                    json,
                }),
                Err(e) => {
                    warn!(
                        "Skipping schema {} ({}): invalid JSON after variable replacement: {}",
                        record.id, record.schema_name, e
                    );
                    None
                }
            }
        })
        .collect()
}

/// Everything rendered for one request
#[derive(Debug, Clone)]
pub struct RenderedHead {
    pub meta: ResolvedMeta,
    pub schemas: Vec<RenderedSchema>,
    pub html: String,
}

/// Renders the head fragment for requests
#[derive(Debug, Clone)]
pub struct HeadRenderer {
    resolver: Resolver,
    brand_name: String,
}

impl HeadRenderer {
    pub fn new(config: &Config) -> Self {
        Self {
            resolver: Resolver::new(config),
            brand_name: config.render.brand_name.clone(),
        }
    }

    /// Resolve meta values, render the active records and assemble the fragment
    pub async fn render<S>(&self, store: &S, request: &RenderRequest) -> Result<RenderedHead>
    where
        S: RecordSource + ContentSource + ?Sized,
    {
        let meta = self.resolver.resolve_meta(store, request).await?;
        let records = store.active_records(&request.request_url).await?;
        let schemas = render_schemas(&records, &meta);

        debug!(
            "Rendered {}/{} schemas for {}",
            schemas.len(),
            records.len(),
            request.request_url
        );

        let mut html = meta_tags_block(&meta, &self.brand_name);
        html.push_str(&schema_block(&schemas, &self.brand_name));

        Ok(RenderedHead {
            meta,
            schemas,
            html,
        })
    }

    /// The head fragment as HTML
    pub async fn render_head<S>(&self, store: &S, request: &RenderRequest) -> Result<String>
    where
        S: RecordSource + ContentSource + ?Sized,
    {
        Ok(self.render(store, request).await?.html)
    }
}
