//! Offline commands: validate a listings file, check a rules file.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use listguard_core::Listing;
use listguard_rules::{CategorySummary, JsonFileRules, RuleSnapshot, RuleSource};
use listguard_runtime::BatchReport;

use crate::state::AppState;

/// Accepted shapes of a listings file.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListingsFile {
    Bare(Vec<Listing>),
    Wrapped { listings: Vec<Listing> },
}

/// Parse a listings document: a JSON array or `{ "listings": [...] }`.
pub fn parse_listings(data: &str) -> anyhow::Result<Vec<Listing>> {
    let file: ListingsFile =
        serde_json::from_str(data).context("expected a JSON array of listings or {\"listings\": [...]}")?;
    Ok(match file {
        ListingsFile::Bare(listings) => listings,
        ListingsFile::Wrapped { listings } => listings,
    })
}

/// Validate every listing in `path` with the configured rules and adjudicator.
pub async fn validate_file(state: &AppState, path: &Path) -> anyhow::Result<BatchReport> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let listings = parse_listings(&data)?;
    Ok(state.validator.validate_batch(listings).await)
}

/// Load and prepare a rules file without installing it.
pub fn check_rules(path: &Path) -> anyhow::Result<Vec<CategorySummary>> {
    let source = JsonFileRules::new(path);
    let raw = source
        .load()
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let snapshot = RuleSnapshot::build(0, source.describe(), raw)?;
    Ok(snapshot
        .iter()
        .map(|r| CategorySummary::from(r.as_ref()))
        .collect())
}

pub fn print_categories(categories: &[CategorySummary]) {
    println!("{:<20} {:<24} {:>8} {:>7} {:>9} {:>11}", "KEY", "NAME", "ENABLED", "STRICT", "PATTERNS", "ACCESSORIES");
    for c in categories {
        println!(
            "{:<20} {:<24} {:>8} {:>7} {:>9} {:>11}",
            c.key, c.display_name, c.enabled, c.strict_mode, c.grammar_patterns, c.accessory_keywords
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_both_shapes() {
        let bare = r#"[{"title":"RTX 5070","price":60000,"category":"videocards","query":"5070"}]"#;
        assert_eq!(parse_listings(bare).unwrap().len(), 1);

        let wrapped = format!(r#"{{"listings": {}}}"#, bare);
        let listings = parse_listings(&wrapped).unwrap();
        assert_eq!(listings[0].category, "videocards");
    }

    #[test]
    fn test_parse_rejects_other_json() {
        assert!(parse_listings(r#"{"items": []}"#).is_err());
        assert!(parse_listings("nope").is_err());
    }

    #[test]
    fn test_check_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(
            &path,
            r#"{"includeBuiltin": true, "categories": [{"key": "cameras", "displayName": "Cameras"}]}"#,
        )
        .unwrap();
        let categories = check_rules(&path).unwrap();
        assert!(categories.iter().any(|c| c.key == "cameras"));
        assert!(categories.iter().any(|c| c.key == "videocards"));

        std::fs::write(&path, r#"{"categories": [{"key": ""}]}"#).unwrap();
        assert!(check_rules(&path).is_err());
    }
}
