//! ldhead - Per-URL JSON-LD structured data and meta tag overrides
//!
//! This crate provides:
//! - A SQLite store of schema records keyed by URL, plus the site's content items
//! - Validation shared by every write path (URL ownership, JSON, script tags)
//! - Meta title/description resolution across local overrides, SEO plugin fields
//!   and stored records
//! - Rendering of the `<head>` fragment with safely embedded JSON-LD
//! - An admin HTTP server with a JSON channel and a form channel

pub mod admin;
pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod meta;
pub mod progress;
pub mod render;
pub mod resolve;
pub mod validate;

pub use config::Config;
pub use error::{Error, Result};
