//! Go imports: single-line and grouped `import (...)` blocks.

use super::ImportProfile;
use once_cell::sync::Lazy;
use regex::Regex;

static SINGLE_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:[\w.]+\s+)?"([^"]+)""#).expect("valid regex")
});
static IMPORT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)import\s*\((.*?)\)").expect("valid regex"));
static QUOTED_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("valid regex"));

pub struct GoProfile;

impl ImportProfile for GoProfile {
    fn language(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &[&'static str] {
        &["go"]
    }

    fn default_extension(&self) -> &'static str {
        "go"
    }

    fn extract_specifiers(&self, source: &str) -> Vec<String> {
        let mut specifiers: Vec<String> = SINGLE_IMPORT
            .captures_iter(source)
            .map(|caps| caps[1].to_string())
            .collect();
        for block in IMPORT_BLOCK.captures_iter(source) {
            for caps in QUOTED_PATH.captures_iter(&block[1]) {
                specifiers.push(caps[1].to_string());
            }
        }
        specifiers
    }
}
