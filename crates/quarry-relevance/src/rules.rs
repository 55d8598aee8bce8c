//! Candidate-gathering rules.
//!
//! Each rule looks at the task and the loader/cache snapshots and proposes
//! paths with a reason and a priority. Rules don't see each other's
//! output except the test pairing, which runs last over everything
//! already proposed. Duplicates are resolved by the engine.

use crate::score::score;
use once_cell::sync::Lazy;
use quarry_cache::CacheQueries;
use quarry_core::naming::is_test_path;
use quarry_core::{paths, CacheInfo, ComponentKind, ProjectContext};
use regex::Regex;

pub const DIRECT_PRIORITY: i32 = 100;
pub const REFACTOR_PRIORITY: i32 = 100;
pub const TEST_PRIORITY: i32 = 80;
pub const IMPORT_PRIORITY: i32 = 75;
pub const IMPORTER_PRIORITY: i32 = 70;
pub const DEBUG_PRIORITY: i32 = 70;
pub const KEYWORD_PRIORITY: i32 = 60;
pub const TYPE_PRIORITY: i32 = 50;
pub const STYLE_PRIORITY: i32 = 40;

const NAME_THRESHOLD: f64 = 0.3;
const CONFIG_THRESHOLD: f64 = 0.2;
const ROUTE_WEIGHT: f64 = 95.0;

/// Configs that matter to almost any configuration task.
pub const ALWAYS_RELEVANT_CONFIGS: &[&str] = &[
    "package.json",
    "tsconfig.json",
    ".env",
    ".env.example",
    "pyproject.toml",
    "go.mod",
    "Cargo.toml",
];

const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less", "styl"];

static REFACTOR_TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"refactor(?:ing)?\s+(?:the\s+|a\s+|an\s+)?([a-z0-9_-]+)").expect("valid regex")
});

/// A proposed file before metadata and content are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: String,
    pub reason: String,
    pub priority: i32,
}

impl Candidate {
    pub fn new(path: impl Into<String>, reason: impl Into<String>, priority: i32) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
            priority,
        }
    }
}

/// What every rule gets to look at.
pub struct RuleInput<'a> {
    pub task: &'a str,
    pub keywords: &'a [String],
    pub context: &'a ProjectContext,
    pub cache: &'a CacheInfo,
}

fn weighted(score: f64, weight: f64) -> i32 {
    (score * weight).round() as i32
}

/// Components of the given kinds whose name scores at least 0.3.
pub fn components_by_name(
    input: &RuleInput<'_>,
    kinds: &[ComponentKind],
    weight: f64,
    label: &str,
) -> Vec<Candidate> {
    input
        .cache
        .components
        .iter()
        .filter(|c| kinds.contains(&c.kind))
        .filter_map(|c| {
            let s = score(&c.name, input.task);
            (s >= NAME_THRESHOLD).then(|| {
                Candidate::new(&c.path, format!("{} match: {} ({:.2})", label, c.name, s), weighted(s, weight))
            })
        })
        .collect()
}

/// Routes whose path scores at least 0.3 against the task.
pub fn routes(input: &RuleInput<'_>) -> Vec<Candidate> {
    input
        .cache
        .routes
        .iter()
        .filter_map(|r| {
            let s = score(&r.path, input.task);
            (s >= NAME_THRESHOLD).then(|| {
                Candidate::new(&r.path, format!("{} route ({:.2})", r.framework, s), weighted(s, ROUTE_WEIGHT))
            })
        })
        .collect()
}

/// Configs scoring at least 0.2, plus the always-relevant ones.
pub fn configs(input: &RuleInput<'_>) -> Vec<Candidate> {
    input
        .cache
        .configs
        .iter()
        .filter_map(|c| {
            let s = score(&c.name, input.task);
            let always = ALWAYS_RELEVANT_CONFIGS.contains(&c.name.as_str());
            (s >= CONFIG_THRESHOLD || always).then(|| {
                Candidate::new(&c.path, format!("{} config", c.kind), weighted(s, 60.0) + 20)
            })
        })
        .collect()
}

/// Tests for anything already proposed, paired by base name.
pub fn paired_tests(input: &RuleInput<'_>, selected: &[Candidate]) -> Vec<Candidate> {
    let mut tests: Vec<Candidate> = Vec::new();
    for candidate in selected.iter().filter(|c| !is_test_path(&c.path)) {
        if let Some(test) = input.cache.get_test_for_file(&candidate.path) {
            if !tests.iter().any(|t| t.path == test) {
                tests.push(Candidate::new(test, format!("test for {}", candidate.path), TEST_PRIORITY));
            }
        }
    }
    tests
}

/// Indexed paths matching `predicate`, all at one priority.
fn indexed_paths(
    input: &RuleInput<'_>,
    reason: &str,
    priority: i32,
    predicate: impl Fn(&str) -> bool,
) -> Vec<Candidate> {
    input
        .context
        .index
        .paths()
        .filter(|p| predicate(&p.to_lowercase()))
        .map(|p| Candidate::new(p, reason, priority))
        .collect()
}

pub fn type_definitions(input: &RuleInput<'_>) -> Vec<Candidate> {
    indexed_paths(input, "type definitions", TYPE_PRIORITY, |p| {
        p.contains("types") || p.contains("interfaces") || p.ends_with(".d.ts")
    })
}

pub fn error_handling(input: &RuleInput<'_>) -> Vec<Candidate> {
    indexed_paths(input, "error handling", DEBUG_PRIORITY, |p| {
        p.contains("error") || p.contains("exception")
    })
}

/// Paths containing the word after `refactor` in the task.
pub fn refactor_targets(input: &RuleInput<'_>) -> Vec<Candidate> {
    let lower = input.task.to_lowercase();
    let Some(target) = REFACTOR_TARGET.captures(&lower).map(|c| c[1].to_string()) else {
        return Vec::new();
    };
    let reason = format!("refactor target: {}", target);
    indexed_paths(input, &reason, REFACTOR_PRIORITY, |p| p.contains(&target))
}

/// Style sheets and theme files whose path mentions a keyword.
pub fn styles(input: &RuleInput<'_>) -> Vec<Candidate> {
    indexed_paths(input, "style", STYLE_PRIORITY, |p| {
        let styled = STYLE_EXTENSIONS.contains(&paths::extension(p).as_str())
            || p.contains("style")
            || p.contains("theme");
        styled && input.keywords.iter().any(|k| p.contains(k.as_str()))
    })
}

/// Components whose name contains an extracted keyword.
pub fn keyword_components(input: &RuleInput<'_>) -> Vec<Candidate> {
    let mut found = Vec::new();
    for keyword in input.keywords {
        for component in &input.cache.components {
            if component.name.to_lowercase().contains(keyword.as_str()) {
                found.push(Candidate::new(
                    &component.path,
                    format!("keyword: {}", keyword),
                    KEYWORD_PRIORITY,
                ));
            }
        }
    }
    found
}

/// Import neighbours of an explicitly named file.
pub fn dependencies_of(context: &ProjectContext, path: &str) -> Vec<Candidate> {
    let Some(deps) = &context.dependencies else {
        return Vec::new();
    };
    let imports = deps
        .imports_of(path)
        .iter()
        .map(|p| Candidate::new(p, format!("imported by {}", path), IMPORT_PRIORITY));
    let importers = deps
        .importers_of(path)
        .iter()
        .map(|p| Candidate::new(p, format!("imports {}", path), IMPORTER_PRIORITY));
    imports.chain(importers).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quarry_core::{ComponentCache, ConfigCache, ConfigKind, DependencyGraph, FileEntry, FileIndex, Fingerprint};
    use std::path::PathBuf;

    fn entry(path: &str) -> FileEntry {
        FileEntry {
            path: PathBuf::from("/repo").join(path),
            relative_path: path.to_string(),
            name: paths::file_name(path).to_string(),
            extension: paths::extension(path),
            is_directory: false,
            size: 10,
            mtime: 0,
        }
    }

    fn context(files: &[&str]) -> ProjectContext {
        let mut index = FileIndex::default();
        for f in files {
            index.insert(entry(f));
        }
        let mut deps = DependencyGraph::new();
        deps.add_edge("src/app.ts", "src/auth/session.ts");
        deps.add_edge("src/main.ts", "src/app.ts");
        ProjectContext {
            project_id: "p".into(),
            fingerprint: Fingerprint::default(),
            tree: None,
            index,
            dependencies: Some(deps),
            created: Utc::now(),
            updated: Utc::now(),
        }
    }

    fn component(path: &str, name: &str, kind: ComponentKind) -> ComponentCache {
        ComponentCache {
            path: path.into(),
            name: name.into(),
            kind,
            imports: vec![],
        }
    }

    #[test]
    fn test_component_threshold_and_weight() {
        let ctx = context(&[]);
        let mut cache = CacheInfo::new("p");
        cache.components = vec![
            component("src/components/Login.tsx", "Login", ComponentKind::Component),
            component("src/components/Header.tsx", "Header", ComponentKind::Component),
            component("src/hooks/useLogin.ts", "useLogin", ComponentKind::Hook),
        ];
        let input = RuleInput {
            task: "fix the bug in the login component",
            keywords: &[],
            context: &ctx,
            cache: &cache,
        };

        let found = components_by_name(&input, &[ComponentKind::Component], 100.0, "component");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "src/components/Login.tsx");
        assert_eq!(found[0].priority, 80);
    }

    #[test]
    fn test_configs_always_relevant() {
        let ctx = context(&[]);
        let mut cache = CacheInfo::new("p");
        cache.configs = vec![
            ConfigCache {
                path: "package.json".into(),
                name: "package.json".into(),
                kind: ConfigKind::Package,
                content: None,
                parsed: None,
            },
            ConfigCache {
                path: ".prettierrc".into(),
                name: ".prettierrc".into(),
                kind: ConfigKind::Format,
                content: None,
                parsed: None,
            },
        ];
        let input = RuleInput {
            task: "update the config",
            keywords: &[],
            context: &ctx,
            cache: &cache,
        };
        let found = configs(&input);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].priority, 20);
    }

    #[test]
    fn test_path_rules() {
        let ctx = context(&[
            "src/auth/session.ts",
            "src/auth/login.ts",
            "src/lib/errors.ts",
            "src/types/user.ts",
            "src/styles/auth.css",
            "src/app.ts",
        ]);
        let cache = CacheInfo::new("p");
        let keywords = vec!["auth".to_string()];
        let input = RuleInput {
            task: "Refactor the auth flow",
            keywords: &keywords,
            context: &ctx,
            cache: &cache,
        };

        let refactor: Vec<String> = refactor_targets(&input).into_iter().map(|c| c.path).collect();
        assert_eq!(refactor, vec!["src/auth/login.ts", "src/auth/session.ts", "src/styles/auth.css"]);
        assert_eq!(error_handling(&input)[0].path, "src/lib/errors.ts");
        assert_eq!(type_definitions(&input)[0].path, "src/types/user.ts");
        assert_eq!(styles(&input)[0].path, "src/styles/auth.css");
    }

    #[test]
    fn test_dependencies_of_both_directions() {
        let ctx = context(&[]);
        let found = dependencies_of(&ctx, "src/app.ts");
        assert_eq!(
            found,
            vec![
                Candidate::new("src/auth/session.ts", "imported by src/app.ts", IMPORT_PRIORITY),
                Candidate::new("src/main.ts", "imports src/app.ts", IMPORTER_PRIORITY),
            ]
        );
    }

    #[test]
    fn test_paired_tests_skip_tests() {
        let ctx = context(&[]);
        let mut cache = CacheInfo::new("p");
        cache.test_files = vec!["src/app.test.ts".into()];
        let input = RuleInput {
            task: "",
            keywords: &[],
            context: &ctx,
            cache: &cache,
        };
        let selected = vec![
            Candidate::new("src/app.ts", "x", 100),
            Candidate::new("src/app.test.ts", "y", 100),
        ];
        let tests = paired_tests(&input, &selected);
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].reason, "test for src/app.ts");
    }
}
