//! Render command implementation

use crate::error::Result;
use crate::meta::MetaDb;
use crate::render::{HeadRenderer, RenderedSchema};
use crate::resolve::RenderRequest;
use serde::Serialize;

/// Rendered head fragment with the values that produced it
#[derive(Debug, Clone, Serialize)]
pub struct RenderReport {
    pub url: String,
    pub item_id: Option<i64>,
    pub meta_title: String,
    pub meta_description: String,
    pub schemas: Vec<RenderedSchema>,
    pub html: String,
}

pub async fn cmd_render(
    renderer: &HeadRenderer,
    db: &MetaDb,
    url: &str,
    item_id: Option<i64>,
) -> Result<RenderReport> {
    let request = RenderRequest::new(url, item_id);
    let head = renderer.render(db, &request).await?;

    Ok(RenderReport {
        url: request.request_url,
        item_id,
        meta_title: head.meta.title,
        meta_description: head.meta.description,
        schemas: head.schemas,
        html: head.html,
    })
}

pub fn print_render(report: &RenderReport) {
    if report.html.is_empty() {
        eprintln!("Nothing to render for {}", report.url);
        return;
    }
    print!("{}", report.html);
}
