//! Status and nonce commands

use crate::admin::Authorizer;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::meta::{MetaDb, SchemaStats};
use serde::Serialize;
use tracing::info;

/// Status information
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub db_path: String,
    pub site_base_url: String,
    pub admin_users: usize,
    pub stats: SchemaStats,
}

/// Get system status
pub async fn cmd_status(config: &Config, db: &MetaDb) -> Result<StatusInfo> {
    info!("Getting status");

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        site_base_url: config.site.base_url.clone(),
        admin_users: config.admin.users.len(),
        stats: db.get_stats().await?,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 ldhead Status\n");
    println!("Configuration: {}", status.config_path);
    println!("Database: {}", status.db_path);
    println!("Site: {}", status.site_base_url);
    println!("Admin users: {}", status.admin_users);
    println!("\nSchemas:");
    println!("  Total: {}", status.stats.total);
    println!("  Active: {}", status.stats.active);
    println!("  URLs configured: {}", status.stats.url_count);

    if !status.stats.top_types.is_empty() {
        let types: Vec<String> = status
            .stats
            .top_types
            .iter()
            .map(|t| format!("{} ({})", t.schema_type, t.count))
            .collect();
        println!("  Most used types: {}", types.join(", "));
    }
}

/// Mint a form-channel nonce for a configured admin user
pub fn cmd_nonce(config: &Config, user: &str, action: &str) -> Result<String> {
    if !config.admin.users.iter().any(|u| u.name == user) {
        return Err(Error::Config(format!("No admin user named '{}'", user)));
    }
    Ok(Authorizer::new(&config.admin).create_nonce(action, user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminUser;
    use crate::meta::tests::setup_test_db;

    #[tokio::test]
    async fn test_status_reports_stats() {
        let (db, _tmp) = setup_test_db().await;
        let config = Config::default();

        let status = cmd_status(&config, &db).await.unwrap();
        assert_eq!(status.stats.total, 0);
        assert_eq!(status.admin_users, 0);
    }

    #[test]
    fn test_nonce_requires_known_user() {
        let mut config = Config::default();
        config.admin.nonce_secret = "secret".to_string();
        config.admin.users.push(AdminUser {
            name: "admin".to_string(),
            token: "t".to_string(),
            capabilities: vec![],
        });

        let nonce = cmd_nonce(&config, "admin", "baseo_schema_nonce").unwrap();
        assert!(Authorizer::new(&config.admin).verify_nonce(&nonce, "baseo_schema_nonce", "admin"));
        assert!(cmd_nonce(&config, "ghost", "baseo_schema_nonce").is_err());
    }
}
