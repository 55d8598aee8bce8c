//! TypeScript and JavaScript imports.
//!
//! Covers static `import ... from`, side-effect `import '...'`, dynamic
//! `import()`, CommonJS `require()` and `export ... from` re-exports.

use super::ImportProfile;
use once_cell::sync::Lazy;
use regex::Regex;

static STATIC_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"import\s+(?:[\w*{}\s,$]+\s+from\s+)?['"]([^'"]+)['"]"#).expect("valid regex")
});
static DYNAMIC_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid regex"));
static REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid regex"));
static RE_EXPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"export\s+(?:type\s+)?(?:\*(?:\s+as\s+\w+)?|\{[^}]*\})\s+from\s+['"]([^'"]+)['"]"#,
    )
    .expect("valid regex")
});

pub struct EcmaScriptProfile {
    typescript: bool,
}

impl EcmaScriptProfile {
    pub fn typescript() -> Self {
        Self { typescript: true }
    }

    pub fn javascript() -> Self {
        Self { typescript: false }
    }
}

impl ImportProfile for EcmaScriptProfile {
    fn language(&self) -> &'static str {
        if self.typescript {
            "typescript"
        } else {
            "javascript"
        }
    }

    fn extensions(&self) -> &[&'static str] {
        &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"]
    }

    fn default_extension(&self) -> &'static str {
        if self.typescript {
            "ts"
        } else {
            "js"
        }
    }

    fn extract_specifiers(&self, source: &str) -> Vec<String> {
        let mut specifiers = Vec::new();
        for pattern in [&*STATIC_IMPORT, &*DYNAMIC_IMPORT, &*REQUIRE, &*RE_EXPORT] {
            for caps in pattern.captures_iter(source) {
                if let Some(m) = caps.get(1) {
                    specifiers.push(m.as_str().to_string());
                }
            }
        }
        specifiers
    }
}
