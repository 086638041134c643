//! Text field sanitization and soft length guidance

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

/// Soft limit for meta titles (search result display width)
pub const META_TITLE_SOFT_LIMIT: usize = 70;

/// Soft limit for meta descriptions
pub const META_DESCRIPTION_SOFT_LIMIT: usize = 160;

static TAG: OnceLock<Regex> = OnceLock::new();

fn tag_regex() -> &'static Regex {
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Remove anything that looks like a markup tag
pub fn strip_tags(text: &str) -> String {
    tag_regex().replace_all(text, "").into_owned()
}

/// Single-line field: tags stripped, all whitespace collapsed, trimmed
pub fn sanitize_text_field(text: &str) -> String {
    strip_tags(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Multi-line field: tags stripped, line breaks kept, runs of spaces collapsed
pub fn sanitize_textarea_field(text: &str) -> String {
    strip_tags(text)
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Which meta field overran its soft limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaField {
    Title,
    Description,
}

/// A soft-limit overrun, reported for guidance only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LengthWarning {
    pub field: MetaField,
    pub length: usize,
    pub limit: usize,
}

impl std::fmt::Display for LengthWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.field {
            MetaField::Title => "meta title",
            MetaField::Description => "meta description",
        };
        write!(
            f,
            "{} is {} characters; search engines usually show about {}",
            name, self.length, self.limit
        )
    }
}

/// Compare meta field lengths (in grapheme clusters) against the soft limits
pub fn check_meta_lengths(title: &str, description: &str) -> Vec<LengthWarning> {
    let mut warnings = Vec::new();

    let title_len = title.graphemes(true).count();
    if title_len > META_TITLE_SOFT_LIMIT {
        warnings.push(LengthWarning {
            field: MetaField::Title,
            length: title_len,
            limit: META_TITLE_SOFT_LIMIT,
        });
    }

    let description_len = description.graphemes(true).count();
    if description_len > META_DESCRIPTION_SOFT_LIMIT {
        warnings.push(LengthWarning {
            field: MetaField::Description,
            length: description_len,
            limit: META_DESCRIPTION_SOFT_LIMIT,
        });
    }

    for warning in &warnings {
        warn!("{}", warning);
    }

    warnings
}
