//! Keyword extraction from free-text tasks.

use once_cell::sync::Lazy;
use regex::Regex;

/// Substrings that make a token worth searching for.
const DOMAIN_TERMS: &[&str] = &[
    "auth", "login", "logout", "signup", "session", "user", "account", "profile", "admin",
    "dashboard", "api", "route", "component", "button", "form", "modal", "page", "nav", "header",
    "footer", "layout", "sidebar", "menu", "search", "cart", "checkout", "payment", "order",
    "product", "setting", "config", "test", "util", "helper", "hook", "service", "store", "state",
    "model", "schema", "data", "database", "query", "cache", "error", "style", "theme", "upload",
    "notification", "message", "email",
];

static SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("valid regex"));

/// Identifier-like tokens that start with a common verb: `getuser`,
/// `handlesubmit`, `fetchorders`.
static LEADING_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:get|set|use|handle|fetch|load|save|create|update|delete|remove|render|validate|parse|format|is|has)[a-z0-9]{2,}")
        .expect("valid regex")
});

/// Lower-cased, deduplicated tokens longer than two characters that name
/// a domain concept or look like an identifier.
pub fn extract_keywords(task: &str) -> Vec<String> {
    let lower = task.to_lowercase();
    let mut keywords: Vec<String> = Vec::new();
    for token in SPLIT.split(&lower) {
        if token.chars().count() <= 2 || keywords.iter().any(|k| k == token) {
            continue;
        }
        let interesting =
            DOMAIN_TERMS.iter().any(|term| token.contains(term)) || LEADING_VERB.is_match(token);
        if interesting {
            keywords.push(token.to_string());
        }
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_task() {
        assert_eq!(
            extract_keywords("fix the bug in the login component"),
            vec!["login", "component"]
        );
    }

    #[test]
    fn test_identifiers_and_dedup() {
        assert_eq!(
            extract_keywords("Why does handleSubmit call getUser twice? getUser!"),
            vec!["handlesubmit", "getuser"]
        );
    }

    #[test]
    fn test_short_and_plain_words_dropped() {
        assert!(extract_keywords("do it now, ok?").is_empty());
        assert!(extract_keywords("make this faster").is_empty());
    }
}
