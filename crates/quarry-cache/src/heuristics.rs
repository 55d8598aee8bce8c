//! Filename and content heuristics for derived cache entries
//!
//! None of this is parsing. Component kinds come from file names, config
//! kinds from well-known tool names, and route methods from verb tokens
//! that happen to appear in the source.

use once_cell::sync::Lazy;
use quarry_core::{paths, ComponentKind, ConfigKind};
use regex::Regex;

/// Canonical HTTP verb order for method hints.
pub const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// Directory names whose files are helpers rather than UI.
const UTIL_DIRS: &[&str] = &["utils", "util", "lib", "helpers"];

static VERB_EXPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS)\b").expect("valid regex")
});

static ROUTER_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:app|router|api|bp|blueprint|r|g|group|e)\.(get|post|put|patch|delete|head|options)\s*\(")
        .expect("valid regex")
});

pub struct Heuristics;

impl Heuristics {
    /// Classifies a component file by its name.
    ///
    /// `index` files borrow the name of their directory.
    pub fn classify_component(relative: &str) -> ComponentKind {
        let name = Self::component_name(relative);
        let lower = name.to_lowercase();

        let is_hook = name
            .strip_prefix("use")
            .map_or(false, |rest| rest.chars().next().map_or(true, |c| c.is_uppercase() || c == '-'));
        if is_hook {
            return ComponentKind::Hook;
        }
        if lower.contains("layout") {
            return ComponentKind::Layout;
        }
        if lower.ends_with("page") || lower.ends_with("screen") || lower.ends_with("view") {
            return ComponentKind::Page;
        }
        if lower.contains("util") || lower.contains("helper") {
            return ComponentKind::Util;
        }
        let dir = paths::parent_dir(relative);
        if dir.split('/').any(|segment| UTIL_DIRS.contains(&segment)) {
            return ComponentKind::Util;
        }
        ComponentKind::Component
    }

    /// File stem, or the parent directory name for `index` files.
    pub fn component_name(relative: &str) -> &str {
        let stem = paths::file_stem(relative);
        if stem == "index" {
            let dir = paths::parent_dir(relative);
            let parent = paths::file_name(dir);
            if !parent.is_empty() {
                return parent;
            }
        }
        stem
    }

    /// Classifies a config file by its name.
    pub fn classify_config(name: &str) -> ConfigKind {
        let lower = name.to_lowercase();
        if lower == "package.json"
            || lower == "cargo.toml"
            || lower == "pyproject.toml"
            || lower == "go.mod"
            || lower == "requirements.txt"
            || lower == "setup.py"
            || lower == "setup.cfg"
        {
            ConfigKind::Package
        } else if lower.starts_with("tsconfig") || lower.starts_with("jsconfig") {
            ConfigKind::Typescript
        } else if lower.contains("lint") {
            ConfigKind::Lint
        } else if lower.contains("prettier") || lower.contains("editorconfig") {
            ConfigKind::Format
        } else if lower.contains("jest")
            || lower.contains("vitest")
            || lower.contains("playwright")
            || lower.contains("cypress")
            || lower.contains("pytest")
            || lower.starts_with("karma")
        {
            ConfigKind::Test
        } else if lower.starts_with(".env") {
            ConfigKind::Env
        } else if lower.starts_with("dockerfile")
            || lower.starts_with("docker-compose")
            || lower == ".dockerignore"
        {
            ConfigKind::Docker
        } else if lower.contains("vite")
            || lower.contains("webpack")
            || lower.contains("rollup")
            || lower.contains("babel")
            || lower.contains("next.config")
            || lower.contains("nuxt.config")
            || lower.contains("svelte.config")
            || lower.contains("astro.config")
            || lower.contains("tailwind")
            || lower.contains("postcss")
            || lower == "makefile"
        {
            ConfigKind::Build
        } else {
            ConfigKind::Other
        }
    }

    /// HTTP verbs mentioned in a route file, in canonical order.
    ///
    /// Picks up exported handlers (`export async function GET`) and
    /// router calls (`router.post(`). None when nothing matched.
    pub fn sniff_methods(source: &str) -> Option<Vec<String>> {
        let mut found = [false; 7];
        let mut mark = |verb: &str| {
            let upper = verb.to_uppercase();
            if let Some(i) = HTTP_METHODS.iter().position(|m| *m == upper) {
                found[i] = true;
            }
        };

        for cap in VERB_EXPORT.captures_iter(source) {
            mark(&cap[1]);
        }
        for cap in ROUTER_CALL.captures_iter(source) {
            mark(&cap[1]);
        }

        let methods: Vec<String> = HTTP_METHODS
            .iter()
            .zip(found)
            .filter(|(_, hit)| *hit)
            .map(|(m, _)| m.to_string())
            .collect();
        (!methods.is_empty()).then_some(methods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_kinds() {
        assert_eq!(Heuristics::classify_component("src/hooks/useAuth.ts"), ComponentKind::Hook);
        assert_eq!(Heuristics::classify_component("src/components/AppLayout.tsx"), ComponentKind::Layout);
        assert_eq!(Heuristics::classify_component("src/components/LoginPage.tsx"), ComponentKind::Page);
        assert_eq!(Heuristics::classify_component("src/components/ProfileView.vue"), ComponentKind::Page);
        assert_eq!(Heuristics::classify_component("src/utils/format.ts"), ComponentKind::Util);
        assert_eq!(Heuristics::classify_component("src/components/dateHelpers.ts"), ComponentKind::Util);
        assert_eq!(Heuristics::classify_component("src/components/Button.tsx"), ComponentKind::Component);
        // "user" is not a hook
        assert_eq!(Heuristics::classify_component("src/components/user.tsx"), ComponentKind::Component);
    }

    #[test]
    fn test_index_takes_directory_name() {
        assert_eq!(Heuristics::component_name("src/components/Modal/index.tsx"), "Modal");
        assert_eq!(Heuristics::component_name("index.ts"), "index");
        assert_eq!(Heuristics::classify_component("src/components/MainLayout/index.tsx"), ComponentKind::Layout);
    }

    #[test]
    fn test_config_kinds() {
        assert_eq!(Heuristics::classify_config("package.json"), ConfigKind::Package);
        assert_eq!(Heuristics::classify_config("tsconfig.build.json"), ConfigKind::Typescript);
        assert_eq!(Heuristics::classify_config(".eslintrc.js"), ConfigKind::Lint);
        assert_eq!(Heuristics::classify_config(".prettierrc"), ConfigKind::Format);
        assert_eq!(Heuristics::classify_config("vitest.config.ts"), ConfigKind::Test);
        assert_eq!(Heuristics::classify_config(".env.local"), ConfigKind::Env);
        assert_eq!(Heuristics::classify_config("Dockerfile"), ConfigKind::Docker);
        assert_eq!(Heuristics::classify_config("vite.config.ts"), ConfigKind::Build);
        assert_eq!(Heuristics::classify_config("settings.yaml"), ConfigKind::Other);
    }

    #[test]
    fn test_sniff_methods() {
        let next = "export async function POST(req) {}\nexport async function GET() {}";
        assert_eq!(Heuristics::sniff_methods(next), Some(vec!["GET".to_string(), "POST".to_string()]));

        let express = "router.delete('/users/:id', remove);\napp.get('/', index);";
        assert_eq!(Heuristics::sniff_methods(express), Some(vec!["GET".to_string(), "DELETE".to_string()]));

        assert_eq!(Heuristics::sniff_methods("export default function Page() {}"), None);
    }
}
