//! Per-language import profiles.
//!
//! Import extraction is pattern matching, not parsing: each profile is a
//! set of source extensions plus a family of regexes that pull import
//! specifiers out of raw text. It will miss exotic forms and can match
//! inside comments or strings. Adding a language means adding a profile
//! here; nothing else changes.

mod ecmascript;
mod go;
mod python;

pub use ecmascript::EcmaScriptProfile;
pub use go::GoProfile;
pub use python::PythonProfile;

use crate::paths;

/// Language-specific import extraction.
pub trait ImportProfile: Send + Sync {
    /// Canonical language name.
    fn language(&self) -> &'static str;

    /// Source extensions (without the dot) this profile scans.
    fn extensions(&self) -> &[&'static str];

    /// Extension appended to specifiers that don't carry one.
    fn default_extension(&self) -> &'static str;

    /// Pulls import specifiers out of source text.
    ///
    /// Relative imports come back in `./x` / `../x` form regardless of how
    /// the language spells them. Package imports are returned as written.
    fn extract_specifiers(&self, source: &str) -> Vec<String>;

    /// Whether a file with this extension should be scanned.
    fn handles(&self, extension: &str) -> bool {
        let ext = extension.to_lowercase();
        self.extensions().iter().any(|e| *e == ext)
    }
}

/// Gets the profile for a fingerprint language.
///
/// Returns None if we don't know how to find imports in this language.
pub fn get_profile(language: &str, has_typescript: bool) -> Option<Box<dyn ImportProfile>> {
    match language.to_lowercase().as_str() {
        "typescript" | "ts" => Some(Box::new(EcmaScriptProfile::typescript())),
        "javascript" | "js" => Some(Box::new(if has_typescript {
            EcmaScriptProfile::typescript()
        } else {
            EcmaScriptProfile::javascript()
        })),
        "python" | "py" => Some(Box::new(PythonProfile)),
        "go" | "golang" => Some(Box::new(GoProfile)),
        _ => None,
    }
}

/// Whether a specifier points inside the project.
pub fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Resolves a relative specifier from `from` into a worktree-relative path.
///
/// A specifier without an extension takes the first handled extension
/// for which `exists` says yes, else the profile's default. Returns None
/// for package imports and for paths escaping the worktree.
pub fn resolve_import(
    profile: &dyn ImportProfile,
    from: &str,
    specifier: &str,
    exists: impl Fn(&str) -> bool,
) -> Option<String> {
    if !is_relative(specifier) {
        return None;
    }
    let resolved = paths::resolve_relative(from, specifier);
    if resolved.is_empty() || resolved.starts_with("..") {
        return None;
    }
    if !paths::extension(&resolved).is_empty() {
        return Some(resolved);
    }
    let existing = profile
        .extensions()
        .iter()
        .map(|ext| format!("{}.{}", resolved, ext))
        .find(|candidate| exists(candidate.as_str()));
    Some(existing.unwrap_or_else(|| format!("{}.{}", resolved, profile.default_extension())))
}

/// Extracts and resolves every intra-project import of one file.
pub fn relative_imports(
    profile: &dyn ImportProfile,
    from: &str,
    source: &str,
    exists: impl Fn(&str) -> bool,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for specifier in profile.extract_specifiers(source) {
        if let Some(path) = resolve_import(profile, from, &specifier, &exists) {
            if path != from && !out.contains(&path) {
                out.push(path);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_profile() {
        assert_eq!(get_profile("TypeScript", true).unwrap().language(), "typescript");
        assert_eq!(get_profile("javascript", false).unwrap().default_extension(), "js");
        assert_eq!(get_profile("javascript", true).unwrap().default_extension(), "ts");
        assert!(get_profile("python", false).is_some());
        assert!(get_profile("cobol", false).is_none());
    }

    #[test]
    fn test_resolve_import_adds_default_extension() {
        let profile = EcmaScriptProfile::typescript();
        let nothing = |_: &str| false;
        assert_eq!(
            resolve_import(&profile, "src/app/page.tsx", "./Button", nothing),
            Some("src/app/Button.ts".to_string())
        );
        assert_eq!(
            resolve_import(&profile, "src/app/page.tsx", "../lib/db.js", nothing),
            Some("src/lib/db.js".to_string())
        );
        assert_eq!(resolve_import(&profile, "src/a.ts", "react", nothing), None);
        assert_eq!(resolve_import(&profile, "a.ts", "../outside", nothing), None);
    }

    #[test]
    fn test_resolve_import_prefers_existing_file() {
        let profile = EcmaScriptProfile::typescript();
        let exists = |p: &str| p == "src/app/Button.tsx";
        assert_eq!(
            resolve_import(&profile, "src/app/page.tsx", "./Button", exists),
            Some("src/app/Button.tsx".to_string())
        );
    }

    #[test]
    fn test_relative_imports_dedupes() {
        let profile = EcmaScriptProfile::typescript();
        let source = r#"
            import { a } from './util';
            const b = require('./util');
            import React from 'react';
        "#;
        assert_eq!(
            relative_imports(&profile, "src/index.ts", source, |_| false),
            vec!["src/util.ts".to_string()]
        );
    }
}
