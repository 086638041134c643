//! HTML assembly for the head fragment

use super::RenderedSchema;
use crate::resolve::ResolvedMeta;

/// Escape text for element content and double-quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<title>` and social meta tags for the values this system owns.
///
/// Empty when neither title nor description is owned.
pub fn meta_tags_block(meta: &ResolvedMeta, brand_name: &str) -> String {
    let title = meta.own_title();
    let description = meta.own_description();
    if title.is_none() && description.is_none() {
        return String::new();
    }

    let mut out = format!("<!-- Custom Meta Tags by {} -->\n", brand_name);

    if let Some(title) = title {
        let title = escape_html(title);
        out.push_str(&format!("<title>{}</title>\n", title));
        out.push_str(&format!("<meta property=\"og:title\" content=\"{}\">\n", title));
        out.push_str(&format!("<meta name=\"twitter:title\" content=\"{}\">\n", title));
    }

    if let Some(description) = description {
        let description = escape_html(description);
        out.push_str(&format!("<meta name=\"description\" content=\"{}\">\n", description));
        out.push_str(&format!(
            "<meta property=\"og:description\" content=\"{}\">\n",
            description
        ));
        out.push_str(&format!(
            "<meta name=\"twitter:description\" content=\"{}\">\n",
            description
        ));
    }

    out.push_str(&format!("<!-- End Custom Meta Tags by {} -->\n", brand_name));
    out
}

/// Marker-wrapped `<script type="application/ld+json">` blocks, empty without schemas
pub fn schema_block(schemas: &[RenderedSchema], brand_name: &str) -> String {
    if schemas.is_empty() {
        return String::new();
    }

    let mut out = format!("<!-- Custom Schema by {} -->\n", brand_name);
    for schema in schemas {
        out.push_str(&format!("<!-- Schema: {} -->\n", escape_html(&schema.name)));
        out.push_str("<script type=\"application/ld+json\">\n");
        out.push_str(&schema.json);
        out.push_str("\n</script>\n");
    }
    out.push_str(&format!("<!-- End Custom Schema by {} -->\n", brand_name));
    out
}
