//! Default values for configuration

/// Default site base URL for local development
pub fn default_site_base_url() -> String {
    std::env::var("LDHEAD_SITE_URL").unwrap_or_else(|_| "http://localhost".to_string())
}

/// Default site name
pub fn default_site_name() -> String {
    "My Site".to_string()
}

/// Default site tagline
pub fn default_site_tagline() -> String {
    String::new()
}

/// Default separator substituted for %%sep%%
pub fn default_seo_separator() -> String {
    "-".to_string()
}

/// Default number of words kept in generated excerpts
pub fn default_seo_excerpt_words() -> usize {
    30
}

/// Default brand name used in the head marker comments
pub fn default_render_brand_name() -> String {
    "BASEO".to_string()
}

/// Default bind address for the admin server
pub fn default_api_bind() -> String {
    "127.0.0.1:8787".to_string()
}

/// Default public URL used in pagination Link headers
pub fn default_api_public_url() -> String {
    format!("http://{}", default_api_bind())
}

/// Default REST route prefix
pub fn default_api_rest_prefix() -> String {
    "/baseo/v1".to_string()
}

/// Default page size for listings
pub fn default_api_per_page() -> u32 {
    20
}

/// Hard upper bound on page size
pub fn default_api_max_per_page() -> u32 {
    100
}

/// Default capability an admin user must hold
pub fn default_admin_capability() -> String {
    "manage_options".to_string()
}

/// Default nonce secret (replaced with a random value by `ldhead init`)
pub fn default_admin_nonce_secret() -> String {
    std::env::var("LDHEAD_NONCE_SECRET").unwrap_or_default()
}
