//! Raw schema fields from the form and JSON channels, and their validation

use crate::error::{Error, Result};
use crate::meta::{SchemaDraft, SchemaType};
use crate::validate::{
    check_meta_lengths, reject_if_contains_script_tag, sanitize_text_field,
    sanitize_textarea_field, validate_and_canonicalize, validate_json, validate_schema_type,
    LengthWarning,
};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Schema fields as submitted, before any validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SchemaInput {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "name")]
    pub schema_name: Option<String>,
    #[serde(default, alias = "type")]
    pub schema_type: Option<String>,
    #[serde(default, alias = "data")]
    pub schema_data: Option<String>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default, alias = "active", deserialize_with = "deserialize_flag")]
    pub is_active: Option<bool>,
}

/// A validated draft plus soft-limit guidance for the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSchema {
    pub draft: SchemaDraft,
    pub warnings: Vec<LengthWarning>,
}

/// Read a form-style flag: `1`/`0`, `true`/`false`, `on`/`off`, `yes`/`no`
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

fn deserialize_flag<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        None => None,
        Some(Flag::Bool(b)) => Some(b),
        Some(Flag::Int(i)) => Some(i != 0),
        Some(Flag::Text(s)) => parse_flag(&s),
    })
}

impl SchemaInput {
    /// Collect fields from a form key/value map
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let field = |keys: &[&str]| keys.iter().find_map(|k| form.get(*k).cloned());

        Self {
            url: field(&["url"]),
            schema_name: field(&["schema_name", "name"]),
            schema_type: field(&["schema_type", "type"]),
            schema_data: field(&["schema_data", "data"]),
            meta_title: field(&["meta_title"]),
            meta_description: field(&["meta_description"]),
            is_active: field(&["is_active", "active"]).and_then(|v| parse_flag(&v)),
        }
    }

    /// Validate every field and produce a draft for the store.
    ///
    /// Order: URL, type, script tags, JSON, then meta fields.
    pub fn prepare(&self, site_base_url: &str, default_name: &str) -> Result<PreparedSchema> {
        let url = validate_and_canonicalize(self.url.as_deref().unwrap_or(""), site_base_url)?;
        self.prepare_for_url(url, default_name)
    }

    /// Validate everything except the URL, which the caller has already checked
    pub(crate) fn prepare_for_url(&self, url: String, default_name: &str) -> Result<PreparedSchema> {
        let schema_type = match self.schema_type.as_deref().map(str::trim) {
            None | Some("") => SchemaType::default(),
            Some(candidate) => validate_schema_type(candidate)?,
        };

        let schema_data = self.schema_data.clone().unwrap_or_default();
        reject_if_contains_script_tag(&schema_data)?;
        validate_json(&schema_data)?;

        let raw_title = self.meta_title.as_deref().unwrap_or("");
        let raw_description = self.meta_description.as_deref().unwrap_or("");
        reject_if_contains_script_tag(raw_title)?;
        reject_if_contains_script_tag(raw_description)?;
        let meta_title = sanitize_text_field(raw_title);
        let meta_description = sanitize_textarea_field(raw_description);
        let warnings = check_meta_lengths(&meta_title, &meta_description);

        let schema_name = self
            .schema_name
            .as_deref()
            .map(sanitize_text_field)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default_name.to_string());

        Ok(PreparedSchema {
            draft: SchemaDraft {
                url,
                schema_name,
                schema_type,
                schema_data,
                meta_title,
                meta_description,
                is_active: self.is_active.unwrap_or(true),
            },
            warnings,
        })
    }
}

/// Bulk apply request: one schema body for many URLs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkApplyInput {
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(flatten)]
    pub schema: SchemaInput,
}

impl BulkApplyInput {
    pub(crate) fn require_urls(&self) -> Result<()> {
        if self.urls.iter().all(|u| u.trim().is_empty()) {
            return Err(Error::NoUrls);
        }
        Ok(())
    }
}
