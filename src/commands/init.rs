//! Init command implementation

use crate::config::{AdminUser, Config};
use crate::error::{Error, Result};
use crate::meta::MetaDb;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Data directory; defaults to `~/.ldhead`
    pub base_dir: Option<PathBuf>,
    /// Site whose URLs records may target
    pub site_url: Option<String>,
    pub force: bool,
}

/// What `init` created
#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub config_path: String,
    pub db_path: String,
    pub admin_user: String,
    pub admin_token: String,
}

/// Write a fresh config with a random nonce secret and one admin user, then create the database
pub async fn cmd_init(options: InitOptions) -> Result<InitReport> {
    let mut config = Config::default();
    config.init_paths(options.base_dir);

    if config.paths.config_file.exists() && !options.force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config.paths.config_file.display()
        )));
    }

    if let Some(site_url) = options.site_url {
        config.site.base_url = site_url;
    }

    let token = Uuid::new_v4().simple().to_string();
    config.admin.nonce_secret = Uuid::new_v4().simple().to_string();
    config.admin.users = vec![AdminUser {
        name: "admin".to_string(),
        token: token.clone(),
        capabilities: vec![config.admin.required_capability.clone()],
    }];

    config.validate()?;
    config.save()?;

    let db = MetaDb::connect(&config).await?;
    db.init_schema().await?;
    info!("Created database at {:?}", config.paths.db_file);

    Ok(InitReport {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        admin_user: "admin".to_string(),
        admin_token: token,
    })
}

pub fn print_init(report: &InitReport) {
    println!("✓ Initialized ldhead");
    println!("\nConfiguration: {}", report.config_path);
    println!("Database: {}", report.db_path);
    println!("\nAdmin user '{}' token:", report.admin_user);
    println!("  {}", report.admin_token);
    println!("\nNext steps:");
    println!("  Set site.base_url in the config file");
    println!("  ldhead add https://example.com/ --data '{{\"@type\": \"WebPage\"}}'");
    println!("  ldhead serve");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_config_and_db() {
        let tmp = TempDir::new().unwrap();
        let options = InitOptions {
            base_dir: Some(tmp.path().to_path_buf()),
            site_url: Some("https://shop.example.org".to_string()),
            force: false,
        };

        let report = cmd_init(options.clone()).await.unwrap();
        assert!(tmp.path().join("config.toml").exists());
        assert!(tmp.path().join("metadata.db").exists());

        let config = Config::load(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.site.base_url, "https://shop.example.org");
        assert_eq!(config.admin.users[0].token, report.admin_token);
        assert!(!config.admin.nonce_secret.is_empty());

        assert!(matches!(cmd_init(options.clone()).await, Err(Error::Config(_))));

        let forced = cmd_init(InitOptions { force: true, ..options }).await.unwrap();
        assert_ne!(forced.admin_token, report.admin_token);
    }
}
