//! Configuration management for ldhead
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use crate::resolve::SeoPlugin;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// The site whose URLs may carry schemas
    #[serde(default)]
    pub site: SiteConfig,

    /// Third-party SEO plugin integration
    #[serde(default)]
    pub seo: SeoConfig,

    /// Head rendering options
    #[serde(default)]
    pub render: RenderConfig,

    /// Admin HTTP server
    #[serde(default)]
    pub api: ApiConfig,

    /// Admin users and anti-forgery settings
    #[serde(default)]
    pub admin: AdminConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Site identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Root URL of the site; every stored URL must live on this host or a subdomain
    #[serde(default = "default_site_base_url")]
    pub base_url: String,

    /// Site title, substituted for %%sitename%%
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Site tagline, substituted for %%sitedesc%%
    #[serde(default = "default_site_tagline")]
    pub tagline: String,
}

/// SEO plugin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoConfig {
    /// Installed and active SEO plugins. Probe order is fixed regardless of list order.
    #[serde(default)]
    pub plugins: Vec<SeoPlugin>,

    /// Separator substituted for %%sep%%
    #[serde(default = "default_seo_separator")]
    pub separator: String,

    /// Words kept when generating excerpts from body text
    #[serde(default = "default_seo_excerpt_words")]
    pub excerpt_words: usize,
}

/// Head rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Name shown in the start/end marker comments
    #[serde(default = "default_render_brand_name")]
    pub brand_name: String,
}

/// Admin server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Socket address to listen on
    #[serde(default = "default_api_bind")]
    pub bind: String,

    /// Externally visible base URL of the server (for Link headers)
    #[serde(default = "default_api_public_url")]
    pub public_url: String,

    /// Prefix for REST routes
    #[serde(default = "default_api_rest_prefix")]
    pub rest_prefix: String,

    /// Page size when the caller gives none
    #[serde(default = "default_api_per_page")]
    pub default_per_page: u32,

    /// Largest page size a caller may request
    #[serde(default = "default_api_max_per_page")]
    pub max_per_page: u32,
}

/// Admin access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Capability required for every admin operation
    #[serde(default = "default_admin_capability")]
    pub required_capability: String,

    /// Secret keying the anti-forgery nonces
    #[serde(default = "default_admin_nonce_secret")]
    pub nonce_secret: String,

    /// Known admin users
    #[serde(default)]
    pub users: Vec<AdminUser>,
}

/// An admin user identified by a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub name: String,
    pub token: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for ldhead data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to SQLite database
    pub db_file: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_site_base_url(),
            name: default_site_name(),
            tagline: default_site_tagline(),
        }
    }
}

impl Default for SeoConfig {
    fn default() -> Self {
        Self {
            plugins: Vec::new(),
            separator: default_seo_separator(),
            excerpt_words: default_seo_excerpt_words(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            brand_name: default_render_brand_name(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_api_bind(),
            public_url: default_api_public_url(),
            rest_prefix: default_api_rest_prefix(),
            default_per_page: default_api_per_page(),
            max_per_page: default_api_max_per_page(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            required_capability: default_admin_capability(),
            nonce_secret: default_admin_nonce_secret(),
            users: Vec::new(),
        }
    }
}

impl Config {
    /// Get the default base directory for ldhead (~/.ldhead)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ldhead")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    pub(crate) fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            db_file: base.join("metadata.db"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            db_file: base.join("metadata.db"),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific base directory
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Parsed site base URL
    pub fn site_url(&self) -> Result<Url> {
        Url::parse(&self.site.base_url)
            .map_err(|e| Error::Config(format!("site.base_url is not a valid URL: {}", e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let site = self.site_url()?;
        if !matches!(site.scheme(), "http" | "https") {
            return Err(Error::Config(
                "site.base_url must use http or https".to_string(),
            ));
        }
        if site.host_str().is_none() {
            return Err(Error::Config("site.base_url must have a host".to_string()));
        }

        if self.api.max_per_page == 0 || self.api.max_per_page > 100 {
            return Err(Error::Config(
                "api.max_per_page must be between 1 and 100".to_string(),
            ));
        }

        if self.api.default_per_page == 0 || self.api.default_per_page > self.api.max_per_page {
            return Err(Error::Config(
                "api.default_per_page must be between 1 and api.max_per_page".to_string(),
            ));
        }

        if !self.api.rest_prefix.starts_with('/') {
            return Err(Error::Config(
                "api.rest_prefix must start with '/'".to_string(),
            ));
        }

        if self.seo.excerpt_words == 0 {
            return Err(Error::Config(
                "seo.excerpt_words must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
