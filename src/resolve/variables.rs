//! SEO plugin template variables left unexpanded in stored fields

use super::text::{html_to_text, trim_words};
use crate::meta::ContentItem;

/// Live values for the `%%name%%` / `%name%` variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeoVariables {
    pub title: String,
    pub site_name: String,
    pub site_description: String,
    pub separator: String,
    pub excerpt: String,
}

impl SeoVariables {
    /// Values for a request; item-derived variables are empty without an item
    pub fn new(
        item: Option<&ContentItem>,
        site_name: &str,
        site_description: &str,
        separator: &str,
        excerpt_words: usize,
    ) -> Self {
        Self {
            title: item.map(|i| i.title.clone()).unwrap_or_default(),
            site_name: site_name.to_string(),
            site_description: site_description.to_string(),
            separator: separator.to_string(),
            excerpt: item
                .map(|i| trim_words(&html_to_text(&i.body), excerpt_words, "\u{2026}"))
                .unwrap_or_default(),
        }
    }

    fn replacements(&self) -> [(&'static str, &str); 10] {
        [
            ("%%title%%", &self.title),
            ("%%sitename%%", &self.site_name),
            ("%%sitedesc%%", &self.site_description),
            ("%%sep%%", &self.separator),
            ("%%excerpt%%", &self.excerpt),
            ("%title%", &self.title),
            ("%sitename%", &self.site_name),
            ("%sitedesc%", &self.site_description),
            ("%sep%", &self.separator),
            ("%excerpt%", &self.excerpt),
        ]
    }

    /// Replace every known variable in `text`. Double-percent forms go first.
    pub fn apply(&self, text: &str) -> String {
        if text.is_empty() || !text.contains('%') {
            return text.to_string();
        }

        let mut out = text.to_string();
        for (token, value) in self.replacements() {
            out = out.replace(token, value);
        }
        out
    }
}
