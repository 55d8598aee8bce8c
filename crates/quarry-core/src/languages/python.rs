//! Python relative imports.
//!
//! Only the dotted forms are interesting here. Absolute imports can't be
//! told apart from third-party packages without an interpreter.

use super::ImportProfile;
use once_cell::sync::Lazy;
use regex::Regex;

static FROM_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*from\s+(\.+)([\w.]*)\s+import\s+\(?\s*(\w+)").expect("valid regex")
});
static BARE_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*import\s+(\.+)([\w.]+)").expect("valid regex"));

pub struct PythonProfile;

/// Turns `..pkg.mod` into `../pkg/mod`.
fn dotted_to_path(dots: &str, module: &str) -> String {
    let prefix = if dots.len() <= 1 {
        "./".to_string()
    } else {
        "../".repeat(dots.len() - 1)
    };
    format!("{}{}", prefix, module.replace('.', "/"))
}

impl ImportProfile for PythonProfile {
    fn language(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &[&'static str] {
        &["py", "pyi"]
    }

    fn default_extension(&self) -> &'static str {
        "py"
    }

    fn extract_specifiers(&self, source: &str) -> Vec<String> {
        let mut specifiers = Vec::new();
        for caps in FROM_IMPORT.captures_iter(source) {
            let dots = &caps[1];
            let module = &caps[2];
            // `from . import utils` names the module in the import list.
            let module = if module.is_empty() { &caps[3] } else { module };
            specifiers.push(dotted_to_path(dots, module));
        }
        for caps in BARE_IMPORT.captures_iter(source) {
            specifiers.push(dotted_to_path(&caps[1], &caps[2]));
        }
        specifiers
    }
}
