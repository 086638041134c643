//! SQLite schema definition

/// SQL schema for the metadata database
pub const SCHEMA_SQL: &str = r#"
-- Schemas: JSON-LD bodies and meta overrides attached to URLs
CREATE TABLE IF NOT EXISTS schemas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    schema_name TEXT NOT NULL DEFAULT 'Schema without name',
    schema_data TEXT NOT NULL,
    schema_type TEXT NOT NULL DEFAULT 'WebPage',
    meta_title TEXT NOT NULL DEFAULT '',
    meta_description TEXT NOT NULL DEFAULT '',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Content items: pages, posts and products of the host site
CREATE TABLE IF NOT EXISTS content_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL DEFAULT 'page',
    title TEXT NOT NULL DEFAULT '',
    excerpt TEXT,
    body TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Content meta: per-item key/value fields (local overrides, SEO plugin fields)
CREATE TABLE IF NOT EXISTS content_meta (
    item_id INTEGER NOT NULL REFERENCES content_items(id),
    meta_key TEXT NOT NULL,
    meta_value TEXT NOT NULL,
    PRIMARY KEY (item_id, meta_key)
);

-- Indexes for performance
CREATE INDEX IF NOT EXISTS idx_schemas_url ON schemas(url);
CREATE INDEX IF NOT EXISTS idx_schemas_name ON schemas(schema_name);
CREATE INDEX IF NOT EXISTS idx_schemas_active ON schemas(is_active);
CREATE INDEX IF NOT EXISTS idx_schemas_type ON schemas(schema_type);
CREATE INDEX IF NOT EXISTS idx_content_kind ON content_items(kind);
"#;
