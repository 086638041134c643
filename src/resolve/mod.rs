//! Meta value resolution at render time
//!
//! For one request, the title and description are each resolved independently:
//! 1. With a content item: the item's local override, then each active SEO plugin's
//!    field in fixed priority order, then the item's own title/excerpt.
//! 2. Anything still empty is taken from the most recently updated active record
//!    for the request URL.
//! 3. SEO template variables left in the winning value are expanded.

mod text;
mod variables;

pub use text::*;
pub use variables::*;

use crate::config::Config;
use crate::error::Result;
use crate::meta::{ContentItem, MetaDb, SchemaRecord};
use crate::validate::MetaField;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Item field holding the local title override
pub const LOCAL_TITLE_KEY: &str = "_baseo_meta_title";

/// Item field holding the local description override
pub const LOCAL_DESCRIPTION_KEY: &str = "_baseo_meta_description";

/// Third-party SEO plugins whose stored fields can supply meta values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeoPlugin {
    Yoast,
    RankMath,
    Aioseo,
    Seopress,
    SeoFramework,
}

impl SeoPlugin {
    /// Probe order, independent of configuration order
    pub const PRIORITY: [SeoPlugin; 5] = [
        SeoPlugin::Yoast,
        SeoPlugin::RankMath,
        SeoPlugin::Aioseo,
        SeoPlugin::Seopress,
        SeoPlugin::SeoFramework,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            SeoPlugin::Yoast => "Yoast SEO",
            SeoPlugin::RankMath => "Rank Math",
            SeoPlugin::Aioseo => "All in One SEO",
            SeoPlugin::Seopress => "SEOPress",
            SeoPlugin::SeoFramework => "The SEO Framework",
        }
    }

    /// Item field key this plugin stores `field` under
    pub fn field_key(&self, field: MetaField) -> &'static str {
        match (self, field) {
            (SeoPlugin::Yoast, MetaField::Title) => "_yoast_wpseo_title",
            (SeoPlugin::Yoast, MetaField::Description) => "_yoast_wpseo_metadesc",
            (SeoPlugin::RankMath, MetaField::Title) => "rank_math_title",
            (SeoPlugin::RankMath, MetaField::Description) => "rank_math_description",
            (SeoPlugin::Aioseo, MetaField::Title) => "_aioseo_title",
            (SeoPlugin::Aioseo, MetaField::Description) => "_aioseo_description",
            (SeoPlugin::Seopress, MetaField::Title) => "_seopress_titles_title",
            (SeoPlugin::Seopress, MetaField::Description) => "_seopress_titles_desc",
            (SeoPlugin::SeoFramework, MetaField::Title) => "_genesis_title",
            (SeoPlugin::SeoFramework, MetaField::Description) => "_genesis_description",
        }
    }
}

/// One candidate source for a meta value on a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaProbe {
    Local,
    Plugin(SeoPlugin),
    Defaults,
}

impl MetaProbe {
    /// The value this source offers for `field`, if any
    pub fn probe(
        &self,
        field: MetaField,
        item: &ContentItem,
        fields: &HashMap<String, String>,
        excerpt_words: usize,
    ) -> Option<String> {
        match self {
            MetaProbe::Local => {
                let key = match field {
                    MetaField::Title => LOCAL_TITLE_KEY,
                    MetaField::Description => LOCAL_DESCRIPTION_KEY,
                };
                non_empty(fields.get(key).map(String::as_str))
            }
            MetaProbe::Plugin(plugin) => {
                non_empty(fields.get(plugin.field_key(field)).map(String::as_str))
            }
            MetaProbe::Defaults => match field {
                MetaField::Title => non_empty(Some(item.title.as_str())),
                MetaField::Description => non_empty(item.excerpt.as_deref()).or_else(|| {
                    non_empty(Some(
                        trim_words(&html_to_text(&item.body), excerpt_words, "...").as_str(),
                    ))
                }),
            },
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaOrigin {
    Item(MetaProbe),
    Store,
}

impl MetaOrigin {
    /// Values this system owns, as opposed to ones the CMS or a plugin already emits
    pub fn is_own(&self) -> bool {
        matches!(self, MetaOrigin::Item(MetaProbe::Local) | MetaOrigin::Store)
    }
}

/// Winning title and description for a request; empty when nothing matched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMeta {
    pub title: String,
    pub description: String,
    pub title_origin: Option<MetaOrigin>,
    pub description_origin: Option<MetaOrigin>,
}

impl ResolvedMeta {
    fn own(value: &str, origin: Option<MetaOrigin>) -> Option<&str> {
        origin
            .filter(|o| o.is_own())
            .map(|_| value)
            .filter(|v| !v.is_empty())
    }

    pub fn own_title(&self) -> Option<&str> {
        Self::own(&self.title, self.title_origin)
    }

    pub fn own_description(&self) -> Option<&str> {
        Self::own(&self.description, self.description_origin)
    }
}

/// The page being rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub request_url: String,
    /// Content item for singular pages; `None` for listings and archives
    pub item_id: Option<i64>,
}

impl RenderRequest {
    pub fn new(request_url: impl Into<String>, item_id: Option<i64>) -> Self {
        Self {
            request_url: request_url.into(),
            item_id,
        }
    }
}

/// Read access to schema records
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Active records for a URL, oldest first
    async fn active_records(&self, url: &str) -> Result<Vec<SchemaRecord>>;

    /// Meta title/description of the most recently updated active record for a URL
    async fn latest_active_meta(&self, url: &str) -> Result<Option<(String, String)>>;
}

/// Read access to content items
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn content_item(&self, id: i64) -> Result<Option<ContentItem>>;

    async fn item_fields(&self, item_id: i64) -> Result<HashMap<String, String>>;
}

#[async_trait]
impl RecordSource for MetaDb {
    async fn active_records(&self, url: &str) -> Result<Vec<SchemaRecord>> {
        self.active_schemas_for_url(url).await
    }

    async fn latest_active_meta(&self, url: &str) -> Result<Option<(String, String)>> {
        self.latest_active_meta_for_url(url).await
    }
}

#[async_trait]
impl ContentSource for MetaDb {
    async fn content_item(&self, id: i64) -> Result<Option<ContentItem>> {
        self.get_content_item(id).await
    }

    async fn item_fields(&self, item_id: i64) -> Result<HashMap<String, String>> {
        self.item_meta(item_id).await
    }
}

/// Resolves meta values from configuration plus a store snapshot
#[derive(Debug, Clone)]
pub struct Resolver {
    plugins: Vec<SeoPlugin>,
    site_name: String,
    site_description: String,
    separator: String,
    excerpt_words: usize,
}

impl Resolver {
    pub fn new(config: &Config) -> Self {
        Self {
            plugins: config.seo.plugins.clone(),
            site_name: config.site.name.clone(),
            site_description: config.site.tagline.clone(),
            separator: config.seo.separator.clone(),
            excerpt_words: config.seo.excerpt_words,
        }
    }

    /// Candidate sources for an item, in the order they are tried
    pub fn probes(&self) -> Vec<MetaProbe> {
        let mut probes = vec![MetaProbe::Local];
        probes.extend(
            SeoPlugin::PRIORITY
                .iter()
                .filter(|p| self.plugins.contains(p))
                .map(|p| MetaProbe::Plugin(*p)),
        );
        probes.push(MetaProbe::Defaults);
        probes
    }

    /// Resolve the title and description for `request`
    pub async fn resolve_meta<S>(&self, store: &S, request: &RenderRequest) -> Result<ResolvedMeta>
    where
        S: RecordSource + ContentSource + ?Sized,
    {
        let item = match request.item_id {
            Some(id) => store.content_item(id).await?,
            None => None,
        };

        let mut title: Option<(String, MetaOrigin)> = None;
        let mut description: Option<(String, MetaOrigin)> = None;

        if let Some(item) = &item {
            let fields = store.item_fields(item.id).await?;
            for probe in self.probes() {
                if title.is_none() {
                    title = probe
                        .probe(MetaField::Title, item, &fields, self.excerpt_words)
                        .map(|v| (v, MetaOrigin::Item(probe)));
                }
                if description.is_none() {
                    description = probe
                        .probe(MetaField::Description, item, &fields, self.excerpt_words)
                        .map(|v| (v, MetaOrigin::Item(probe)));
                }
                if title.is_some() && description.is_some() {
                    break;
                }
            }
        }

        if title.is_none() || description.is_none() {
            if let Some((stored_title, stored_description)) =
                store.latest_active_meta(&request.request_url).await?
            {
                if title.is_none() {
                    title = non_empty(Some(stored_title.as_str())).map(|v| (v, MetaOrigin::Store));
                }
                if description.is_none() {
                    description =
                        non_empty(Some(stored_description.as_str())).map(|v| (v, MetaOrigin::Store));
                }
            }
        }

        let vars = SeoVariables::new(
            item.as_ref(),
            &self.site_name,
            &self.site_description,
            &self.separator,
            self.excerpt_words,
        );

        debug!(
            "Resolved meta for {}: title from {:?}, description from {:?}",
            request.request_url,
            title.as_ref().map(|(_, o)| o),
            description.as_ref().map(|(_, o)| o)
        );

        let (title, title_origin) = split(title, &vars);
        let (description, description_origin) = split(description, &vars);
        Ok(ResolvedMeta {
            title,
            description,
            title_origin,
            description_origin,
        })
    }
}

fn split(
    resolved: Option<(String, MetaOrigin)>,
    vars: &SeoVariables,
) -> (String, Option<MetaOrigin>) {
    match resolved {
        Some((value, origin)) => (vars.apply(&value), Some(origin)),
        None => (String::new(), None),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Error;

    /// In-memory store for resolver and render tests
    #[derive(Default)]
    pub(crate) struct FakeStore {
        pub records: Vec<SchemaRecord>,
        pub items: Vec<ContentItem>,
        pub fields: HashMap<i64, HashMap<String, String>>,
    }

    #[async_trait]
    impl RecordSource for FakeStore {
        async fn active_records(&self, url: &str) -> Result<Vec<SchemaRecord>> {
            let mut records: Vec<SchemaRecord> = self
                .records
                .iter()
                .filter(|r| r.url == url && r.is_active)
                .cloned()
                .collect();
            records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(records)
        }

        async fn latest_active_meta(&self, url: &str) -> Result<Option<(String, String)>> {
            Ok(self
                .records
                .iter()
                .filter(|r| r.url == url && r.is_active)
                .max_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)))
                .map(|r| (r.meta_title.clone(), r.meta_description.clone())))
        }
    }

    #[async_trait]
    impl ContentSource for FakeStore {
        async fn content_item(&self, id: i64) -> Result<Option<ContentItem>> {
            Ok(self.items.iter().find(|i| i.id == id).cloned())
        }

        async fn item_fields(&self, item_id: i64) -> Result<HashMap<String, String>> {
            Ok(self.fields.get(&item_id).cloned().unwrap_or_default())
        }
    }

    /// A store whose every read fails
    pub(crate) struct BrokenStore;

    #[async_trait]
    impl RecordSource for BrokenStore {
        async fn active_records(&self, _url: &str) -> Result<Vec<SchemaRecord>> {
            Err(Error::Other("store offline".to_string()))
        }

        async fn latest_active_meta(&self, _url: &str) -> Result<Option<(String, String)>> {
            Err(Error::Other("store offline".to_string()))
        }
    }

    #[async_trait]
    impl ContentSource for BrokenStore {
        async fn content_item(&self, _id: i64) -> Result<Option<ContentItem>> {
            Err(Error::Other("store offline".to_string()))
        }

        async fn item_fields(&self, _item_id: i64) -> Result<HashMap<String, String>> {
            Err(Error::Other("store offline".to_string()))
        }
    }

    pub(crate) fn record(id: i64, url: &str, name: &str, data: &str) -> SchemaRecord {
        let ts = format!("2024-01-{:02}T00:00:00.000000Z", id);
        SchemaRecord {
            id,
            url: url.to_string(),
            schema_name: name.to_string(),
            schema_data: data.to_string(),
            schema_type: "WebPage".to_string(),
            meta_title: String::new(),
            meta_description: String::new(),
            is_active: true,
            created_at: ts.clone(),
            updated_at: ts,
        }
    }

    pub(crate) fn content(id: i64, url: &str, title: &str, body: &str) -> ContentItem {
        ContentItem {
            id,
            url: url.to_string(),
            kind: "post".to_string(),
            title: title.to_string(),
            excerpt: None,
            body: body.to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resolver(plugins: Vec<SeoPlugin>) -> Resolver {
        let mut config = Config::default();
        config.site.name = "Shop".to_string();
        config.seo.plugins = plugins;
        Resolver::new(&config)
    }

    const URL: &str = "https://example.com/post";

    #[test]
    fn test_probe_order_is_fixed() {
        let r = resolver(vec![SeoPlugin::SeoFramework, SeoPlugin::Yoast]);
        assert_eq!(
            r.probes(),
            vec![
                MetaProbe::Local,
                MetaProbe::Plugin(SeoPlugin::Yoast),
                MetaProbe::Plugin(SeoPlugin::SeoFramework),
                MetaProbe::Defaults,
            ]
        );
    }

    #[tokio::test]
    async fn test_local_override_wins() {
        let mut store = FakeStore::default();
        store.items.push(content(7, URL, "Post title", "<p>Body</p>"));
        store.fields.insert(
            7,
            fields(&[
                (LOCAL_TITLE_KEY, "Local title"),
                ("_yoast_wpseo_title", "Yoast title"),
                ("_yoast_wpseo_metadesc", "Yoast description"),
            ]),
        );

        let meta = resolver(vec![SeoPlugin::Yoast])
            .resolve_meta(&store, &RenderRequest::new(URL, Some(7)))
            .await
            .unwrap();

        assert_eq!(meta.title, "Local title");
        assert_eq!(meta.title_origin, Some(MetaOrigin::Item(MetaProbe::Local)));
        assert_eq!(meta.description, "Yoast description");
        assert_eq!(
            meta.description_origin,
            Some(MetaOrigin::Item(MetaProbe::Plugin(SeoPlugin::Yoast)))
        );
        assert_eq!(meta.own_title(), Some("Local title"));
        assert_eq!(meta.own_description(), None);
    }

    #[tokio::test]
    async fn test_inactive_plugins_are_skipped() {
        let mut store = FakeStore::default();
        store.items.push(content(7, URL, "Post title", "<p>Body</p>"));
        store.fields.insert(
            7,
            fields(&[
                ("_yoast_wpseo_title", "Yoast title"),
                ("rank_math_title", "Rank Math title"),
            ]),
        );

        let meta = resolver(vec![SeoPlugin::RankMath])
            .resolve_meta(&store, &RenderRequest::new(URL, Some(7)))
            .await
            .unwrap();
        assert_eq!(meta.title, "Rank Math title");
    }

    #[tokio::test]
    async fn test_defaults_from_item() {
        let mut store = FakeStore::default();
        let body = format!("<p>{}</p>", "word ".repeat(40));
        store.items.push(content(7, URL, "Post title", &body));

        let meta = resolver(vec![])
            .resolve_meta(&store, &RenderRequest::new(URL, Some(7)))
            .await
            .unwrap();

        assert_eq!(meta.title, "Post title");
        assert_eq!(meta.title_origin, Some(MetaOrigin::Item(MetaProbe::Defaults)));
        assert!(meta.description.ends_with("word..."));
        assert_eq!(meta.description.split_whitespace().count(), 30);

        let mut with_excerpt = content(8, URL, "Other", &body);
        with_excerpt.excerpt = Some("Hand written".to_string());
        store.items.push(with_excerpt);
        let meta = resolver(vec![])
            .resolve_meta(&store, &RenderRequest::new(URL, Some(8)))
            .await
            .unwrap();
        assert_eq!(meta.description, "Hand written");
    }

    #[tokio::test]
    async fn test_store_fallback_without_item() {
        let mut store = FakeStore::default();
        let mut older = record(1, URL, "a", "{}");
        older.meta_title = "Old".to_string();
        let mut newer = record(2, URL, "b", "{}");
        newer.meta_title = "%%sitename%% %%sep%% Deals".to_string();
        newer.meta_description = "Cheap".to_string();
        store.records.extend([older, newer]);

        let meta = resolver(vec![])
            .resolve_meta(&store, &RenderRequest::new(URL, None))
            .await
            .unwrap();

        assert_eq!(meta.title, "Shop - Deals");
        assert_eq!(meta.description, "Cheap");
        assert_eq!(meta.title_origin, Some(MetaOrigin::Store));
        assert_eq!(meta.own_title(), Some("Shop - Deals"));
    }

    #[tokio::test]
    async fn test_store_fills_only_empty_fields() {
        let mut store = FakeStore::default();
        let mut rec = record(1, URL, "a", "{}");
        rec.meta_title = "Stored title".to_string();
        rec.meta_description = "Stored description".to_string();
        store.records.push(rec);

        // Item id that does not exist: no singular context
        let meta = resolver(vec![])
            .resolve_meta(&store, &RenderRequest::new(URL, Some(99)))
            .await
            .unwrap();
        assert_eq!(meta.title, "Stored title");

        // Item with only a blank body: title from item, description from store
        store.items.push(content(5, URL, "Item title", ""));
        let meta = resolver(vec![])
            .resolve_meta(&store, &RenderRequest::new(URL, Some(5)))
            .await
            .unwrap();
        assert_eq!(meta.title, "Item title");
        assert_eq!(meta.description, "Stored description");
        assert_eq!(meta.description_origin, Some(MetaOrigin::Store));
    }

    #[tokio::test]
    async fn test_nothing_resolves_to_empty() {
        let store = FakeStore::default();
        let meta = resolver(vec![])
            .resolve_meta(&store, &RenderRequest::new(URL, None))
            .await
            .unwrap();
        assert_eq!(meta, ResolvedMeta::default());
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let result = resolver(vec![])
            .resolve_meta(&BrokenStore, &RenderRequest::new(URL, None))
            .await;
        assert!(result.is_err());
    }
}
