//! Admin authentication, capability checks and anti-forgery nonces

use crate::config::{AdminConfig, AdminUser};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Nonce lifetime window; a nonce stays valid for one to two windows
const NONCE_TICK_SECS: i64 = 12 * 60 * 60;

const NONCE_CONTEXT: &str = "ldhead 2024 admin nonce";

/// Hex characters kept from the keyed hash
const NONCE_LEN: usize = 20;

/// Resolves bearer tokens to admin users and guards admin actions
#[derive(Debug, Clone)]
pub struct Authorizer {
    users: Vec<AdminUser>,
    capability: String,
    nonce_key: [u8; 32],
}

impl Authorizer {
    pub fn new(config: &AdminConfig) -> Self {
        if config.nonce_secret.is_empty() {
            warn!("admin.nonce_secret is empty; nonces are predictable");
        }

        Self {
            users: config.users.clone(),
            capability: config.required_capability.clone(),
            nonce_key: blake3::derive_key(NONCE_CONTEXT, config.nonce_secret.as_bytes()),
        }
    }

    /// The user owning `token`
    pub fn authenticate(&self, token: Option<&str>) -> Result<&AdminUser> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::AuthenticationFailed("missing bearer token".to_string()))?;

        let presented = blake3::hash(token.as_bytes());
        self.users
            .iter()
            .find(|u| !u.token.is_empty() && blake3::hash(u.token.as_bytes()) == presented)
            .ok_or_else(|| Error::AuthenticationFailed("unknown token".to_string()))
    }

    /// The user owning `token`, provided they hold the required capability
    pub fn authorize(&self, token: Option<&str>) -> Result<&AdminUser> {
        let user = self.authenticate(token)?;
        if !user.capabilities.iter().any(|c| c == &self.capability) {
            warn!("{} lacks capability {}", user.name, self.capability);
            return Err(Error::PermissionDenied);
        }
        Ok(user)
    }

    fn tick(now: DateTime<Utc>) -> i64 {
        now.timestamp().div_euclid(NONCE_TICK_SECS)
    }

    fn nonce_for_tick(&self, action: &str, user: &str, tick: i64) -> String {
        let message = format!("{}|{}|{}", tick, action, user);
        let hash = blake3::keyed_hash(&self.nonce_key, message.as_bytes());
        hash.to_hex()[..NONCE_LEN].to_string()
    }

    /// Mint a nonce binding `action` to `user` for the current window
    pub fn create_nonce(&self, action: &str, user: &str) -> String {
        self.create_nonce_at(action, user, Utc::now())
    }

    pub fn create_nonce_at(&self, action: &str, user: &str, now: DateTime<Utc>) -> String {
        self.nonce_for_tick(action, user, Self::tick(now))
    }

    /// Accept nonces minted in the current or the previous window
    pub fn verify_nonce(&self, nonce: &str, action: &str, user: &str) -> bool {
        self.verify_nonce_at(nonce, action, user, Utc::now())
    }

    pub fn verify_nonce_at(&self, nonce: &str, action: &str, user: &str, now: DateTime<Utc>) -> bool {
        if nonce.len() != NONCE_LEN {
            return false;
        }
        let tick = Self::tick(now);
        [tick, tick - 1].into_iter().any(|t| {
            let expected = self.nonce_for_tick(action, user, t);
            constant_time_eq(expected.as_bytes(), nonce.as_bytes())
        })
    }

    /// Fails with `AuthenticationFailed` unless `nonce` is valid for `action`
    pub fn check_nonce(&self, nonce: Option<&str>, action: &str, user: &str) -> Result<()> {
        match nonce {
            Some(n) if self.verify_nonce(n, action, user) => Ok(()),
            _ => Err(Error::AuthenticationFailed(
                "nonce is missing or invalid".to_string(),
            )),
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
