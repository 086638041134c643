//! Input validation for schema records
//!
//! Every value written to the store passes through here first:
//! - URLs must belong to the site's host (or a subdomain) and are upgraded to HTTPS
//!   when the site itself is served over HTTPS
//! - Schema bodies must be valid JSON without an embedded `<script>` element
//! - Schema types must come from the fixed vocabulary

mod sanitize;

pub use sanitize::*;

use crate::error::{Error, Result};
use crate::meta::SchemaType;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

static SCRIPT_TAG: OnceLock<Regex> = OnceLock::new();

fn script_tag_regex() -> &'static Regex {
    SCRIPT_TAG.get_or_init(|| {
        Regex::new(r"(?i)<\s*/?\s*script\b").expect("script tag pattern is valid")
    })
}

/// Hosts that never get upgraded to HTTPS
pub fn is_dev_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "localhost"
        || host == "127.0.0.1"
        || host.ends_with(".test")
        || host.ends_with(".local")
}

/// Validate that `candidate` lives on the site's host and canonicalize its scheme.
///
/// The returned string is the candidate as given, except that an `http` scheme is
/// rewritten to `https` when the site base URL is HTTPS and the candidate host is
/// not a development host. Host, port, path, query and fragment are kept verbatim.
pub fn validate_and_canonicalize(candidate: &str, site_base_url: &str) -> Result<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return Err(Error::InvalidUrl("URL is required".to_string()));
    }
    // The parser drops tabs and newlines and reads `\` as `/`; the stored text must be
    // what was checked.
    if candidate
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || c == '\\')
    {
        return Err(Error::InvalidUrl(format!(
            "{:?}: whitespace, control characters and backslashes are not allowed",
            candidate
        )));
    }

    let site = Url::parse(site_base_url)
        .map_err(|e| Error::Config(format!("Site base URL is invalid: {}", e)))?;
    let site_host = site
        .host_str()
        .ok_or_else(|| Error::Config("Site base URL has no host".to_string()))?
        .to_ascii_lowercase();

    let parsed = Url::parse(candidate)
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", candidate, e)))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::InvalidUrl(format!(
            "{}: scheme must be http or https",
            candidate
        )));
    }

    // `Url` accepts "http:example.com"; require an explicit authority.
    let authority_start = scheme.len() + 3;
    if candidate.len() < authority_start || !candidate[scheme.len()..].starts_with("://") {
        return Err(Error::InvalidUrl(format!("{}: missing host", candidate)));
    }

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::InvalidUrl(format!("{}: missing host", candidate)))?
        .to_ascii_lowercase();

    // Percent-encoded or otherwise normalized hosts would be stored in a form other than
    // the one compared below.
    if literal_host(&candidate[authority_start..]).to_ascii_lowercase() != host {
        return Err(Error::InvalidUrl(format!(
            "{}: host must be written in plain form ({})",
            candidate, host
        )));
    }

    let same_host = host == site_host;
    let subdomain = host.ends_with(&format!(".{}", site_host));
    if !same_host && !subdomain {
        return Err(Error::InvalidUrl(format!(
            "{}: cross-domain URL rejected (site host is {})",
            candidate, site_host
        )));
    }

    if site.scheme() == "https" && scheme == "http" && !is_dev_host(&host) {
        return Ok(format!("https{}", &candidate[scheme.len()..]));
    }

    Ok(candidate.to_string())
}

/// Host as written in the text following `scheme://`, without userinfo or port
fn literal_host(rest: &str) -> &str {
    let authority = rest
        .split(|c| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    if host_port.starts_with('[') {
        match host_port.find(']') {
            Some(end) => &host_port[..=end],
            None => host_port,
        }
    } else {
        host_port.split(':').next().unwrap_or_default()
    }
}

/// Reject text containing an opening or closing `<script` tag, in any case
pub fn reject_if_contains_script_tag(text: &str) -> Result<()> {
    if script_tag_regex().is_match(text) {
        return Err(Error::ScriptTagDetected);
    }
    Ok(())
}

/// Parse `text` as JSON, surfacing the parser message on failure
pub fn validate_json(text: &str) -> Result<serde_json::Value> {
    serde_json::from_str(text).map_err(|e| Error::InvalidJson(e.to_string()))
}

/// Exact, case-sensitive match against the fixed schema type vocabulary
pub fn validate_schema_type(candidate: &str) -> Result<SchemaType> {
    candidate.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "https://example.com";

    #[test]
    fn test_same_host_and_subdomain_accepted() {
        assert_eq!(
            validate_and_canonicalize("https://example.com/about", SITE).unwrap(),
            "https://example.com/about"
        );
        assert_eq!(
            validate_and_canonicalize("http://blog.example.com/x", SITE).unwrap(),
            "https://blog.example.com/x"
        );
        assert_eq!(
            validate_and_canonicalize("https://EXAMPLE.com/Case", SITE).unwrap(),
            "https://EXAMPLE.com/Case"
        );
    }

    #[test]
    fn test_cross_domain_rejected() {
        for bad in [
            "http://evil.com/x",
            "https://notexample.com/",
            "https://example.com.evil.com/",
        ] {
            assert!(
                matches!(validate_and_canonicalize(bad, SITE), Err(Error::InvalidUrl(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_bad_scheme_or_unparsable_rejected() {
        for bad in [
            "",
            "   ",
            "ftp://example.com/file",
            "javascript:alert(1)",
            "/relative/path",
            "http:example.com",
            "not a url",
        ] {
            assert!(
                matches!(validate_and_canonicalize(bad, SITE), Err(Error::InvalidUrl(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_stored_url_is_exactly_what_was_checked() {
        for bad in [
            "http://exa%6Dple.com/p",
            "https://example.com/a\tb",
            "https://exam\nple.com/",
            "https://example.com\\evil.com/",
        ] {
            assert!(
                matches!(validate_and_canonicalize(bad, SITE), Err(Error::InvalidUrl(_))),
                "{:?} should be rejected",
                bad
            );
        }

        assert_eq!(
            validate_and_canonicalize("http://user@example.com:8080/p", SITE).unwrap(),
            "https://user@example.com:8080/p"
        );
        assert_eq!(
            validate_and_canonicalize("http://[::1]:8080/x", "http://[::1]").unwrap(),
            "http://[::1]:8080/x"
        );
    }

    #[test]
    fn test_https_upgrade_preserves_everything_else() {
        assert_eq!(
            validate_and_canonicalize("http://example.com/a/b?x=1&y=2#frag", SITE).unwrap(),
            "https://example.com/a/b?x=1&y=2#frag"
        );
        assert_eq!(
            validate_and_canonicalize("http://example.com", SITE).unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn test_dev_hosts_not_upgraded() {
        assert_eq!(
            validate_and_canonicalize("http://localhost/x", "https://localhost").unwrap(),
            "http://localhost/x"
        );
        assert_eq!(
            validate_and_canonicalize("http://shop.test/x", "https://shop.test").unwrap(),
            "http://shop.test/x"
        );
        assert_eq!(
            validate_and_canonicalize("http://wp.local/", "https://wp.local").unwrap(),
            "http://wp.local/"
        );
        assert_eq!(
            validate_and_canonicalize("http://example.com/x", SITE).unwrap(),
            "https://example.com/x"
        );
    }

    #[test]
    fn test_http_site_leaves_scheme_alone() {
        assert_eq!(
            validate_and_canonicalize("http://example.com/x", "http://example.com").unwrap(),
            "http://example.com/x"
        );
        assert_eq!(
            validate_and_canonicalize("https://example.com/x", "http://example.com").unwrap(),
            "https://example.com/x"
        );
    }

    #[test]
    fn test_script_tag_detection() {
        assert!(matches!(
            reject_if_contains_script_tag("<SCRIPT>alert(1)"),
            Err(Error::ScriptTagDetected)
        ));
        assert!(reject_if_contains_script_tag("<script src=x>").is_err());
        assert!(reject_if_contains_script_tag("< script type=\"application/ld+json\">{}").is_err());
        assert!(reject_if_contains_script_tag("{\"a\": \"</Script >\"}").is_err());
        assert!(reject_if_contains_script_tag(r#"{"@type": "WebPage"}"#).is_ok());
        assert!(reject_if_contains_script_tag(r#"{"name": "Description of scripts"}"#).is_ok());
        assert!(reject_if_contains_script_tag("<scripted>").is_ok());
    }

    #[test]
    fn test_validate_json() {
        assert!(validate_json(r#"{"@context": "https://schema.org"}"#).is_ok());
        assert!(validate_json("[1, 2, 3]").is_ok());
        assert!(validate_json("42").is_ok());
        assert!(matches!(validate_json("{bad json"), Err(Error::InvalidJson(_))));
        assert!(validate_json("").is_err());
    }

    #[test]
    fn test_validate_schema_type() {
        assert_eq!(validate_schema_type("Article").unwrap(), SchemaType::Article);
        assert_eq!(validate_schema_type("FAQ").unwrap(), SchemaType::Faq);
        assert!(matches!(
            validate_schema_type("Banana"),
            Err(Error::InvalidSchemaType(_))
        ));
        assert!(validate_schema_type("article").is_err());
        assert!(validate_schema_type("").is_err());
    }
}
