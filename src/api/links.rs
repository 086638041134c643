//! Pagination headers for record listings

use crate::admin::PageInfo;

/// Listing filters echoed back into relation links
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkFilters {
    pub schema_type: Option<String>,
    pub url: Option<String>,
    pub search: Option<String>,
}

/// Query string for one page: `page, per_page, schema_type, url, search`, empty values omitted
fn query_for(page: u32, per_page: u32, filters: &LinkFilters) -> String {
    let page = page.to_string();
    let per_page = per_page.to_string();
    let params = [
        ("page", Some(page.as_str())),
        ("per_page", Some(per_page.as_str())),
        ("schema_type", filters.schema_type.as_deref()),
        ("url", filters.url.as_deref()),
        ("search", filters.search.as_deref()),
    ];

    params
        .iter()
        .filter_map(|(key, value)| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}={}", key, urlencoding::encode(v)))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// RFC 5988 `Link` header value: `self` always, `first`/`prev` after page one,
/// `next`/`last` before the final page
pub fn link_header(collection_url: &str, info: &PageInfo, filters: &LinkFilters) -> String {
    let link = |page: u32, rel: &str| {
        format!(
            "<{}?{}>; rel=\"{}\"",
            collection_url,
            query_for(page, info.per_page, filters),
            rel
        )
    };

    let mut links = vec![link(info.page, "self")];
    if info.has_prev() {
        links.push(link(1, "first"));
        links.push(link(info.page - 1, "prev"));
    }
    if info.has_next() {
        links.push(link(info.page + 1, "next"));
        links.push(link(info.total_pages, "last"));
    }
    links.join(", ")
}
