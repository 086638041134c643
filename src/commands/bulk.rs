//! Bulk apply command implementation

use crate::admin::{BulkApplyInput, BulkOutcome, SchemaService};
use crate::error::Result;
use crate::progress::add_progress_bar;
use std::path::Path;

/// URLs from a file, one per line; blank lines and `#` comments are skipped
pub fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Attach one schema body to every URL, with a progress bar unless `quiet`
pub async fn cmd_bulk_apply(
    service: &SchemaService,
    input: &BulkApplyInput,
    quiet: bool,
) -> Result<BulkOutcome> {
    if quiet {
        return service.bulk_apply(input).await;
    }

    let bar = add_progress_bar(input.urls.len() as u64);
    bar.set_message("applying");
    let outcome = service
        .bulk_apply_with(input, |url, _| {
            bar.set_message(url.to_string());
            bar.inc(1);
        })
        .await;
    bar.finish_and_clear();
    outcome
}

pub fn print_bulk_outcome(outcome: &BulkOutcome) {
    println!("\n✓ Bulk apply complete");
    println!("  Applied: {}", outcome.success);
    println!("  Failed: {}", outcome.failed);
    for failure in &outcome.errors {
        println!("  ✗ {} ({})", failure.url, failure.error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_url_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("urls.txt");
        std::fs::write(
            &path,
            "# landing pages\nhttps://example.com/a\n\n  https://example.com/b  \n",
        )
        .unwrap();

        assert_eq!(
            read_url_file(&path).unwrap(),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }
}
