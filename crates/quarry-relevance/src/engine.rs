//! The relevance engine: task in, ranked and budgeted file list out.

use crate::budget::ContentBudget;
use crate::classify::{classify_task, TaskType};
use crate::keywords::extract_keywords;
use crate::rules::{self, Candidate, RuleInput, DIRECT_PRIORITY};
use crate::types::{RelevanceRequest, RelevantContext, RelevantFile};
use quarry_cache::{CacheQueries, ContextCache};
use quarry_core::languages::{resolve_import, EcmaScriptProfile};
use quarry_core::{
    paths, system_time_ms, CacheInfo, ComponentKind, FingerprintProvider, Project, ProjectContext,
    RelevanceConfig, Result,
};
use quarry_loader::{compute_centrality, find_related_files, CentralityScores, ContextLoader};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const CENTRALITY_ITERATIONS: usize = 20;
const CENTRALITY_DAMPING: f64 = 0.85;
/// Related files seeded alongside the file being edited.
const EDIT_CONTEXT_FILES: usize = 5;
const SUMMARY_TOP_FILES: usize = 5;

pub struct RelevanceEngine {
    project: Arc<Project>,
    loader: Arc<ContextLoader>,
    cache: Arc<ContextCache>,
    fingerprint: Arc<dyn FingerprintProvider>,
    config: RelevanceConfig,
}

impl RelevanceEngine {
    pub fn new(
        project: Arc<Project>,
        loader: Arc<ContextLoader>,
        cache: Arc<ContextCache>,
        fingerprint: Arc<dyn FingerprintProvider>,
        config: RelevanceConfig,
    ) -> Self {
        Self {
            project,
            loader,
            cache,
            fingerprint,
            config,
        }
    }

    fn chars_per_token(&self) -> usize {
        self.config.chars_per_token.max(1)
    }

    /// Ranks the files relevant to `request.task` and loads their content
    /// under the request's token budget.
    pub async fn get_relevant_context(&self, request: &RelevanceRequest) -> Result<RelevantContext> {
        let start = Instant::now();
        let task_types = classify_task(&request.task);
        let keywords = extract_keywords(&request.task);
        debug!("Task types {:?}, keywords {:?}", task_types, keywords);

        let context = self.loader.load(false).await?;
        let cache = self.cache.load(false).await?;

        let candidates = self.gather(request, &task_types, &keywords, &context, &cache);
        let centrality = context
            .dependencies
            .as_ref()
            .map(|deps| compute_centrality(deps, CENTRALITY_ITERATIONS, CENTRALITY_DAMPING))
            .unwrap_or_default();
        let ranked = rank(candidates, &centrality);

        let files = self.materialize(ranked, &context, request.max_tokens).await;

        let total_size: u64 = files.iter().map(|f| f.size).sum();
        let estimated_tokens = total_size / self.chars_per_token() as u64;
        let truncated = request
            .max_tokens
            .map_or(false, |max| estimated_tokens > max as u64);

        let frameworks = match self.fingerprint.get().await {
            Some(fingerprint) => fingerprint.framework_names(),
            None => context.fingerprint.framework_names(),
        };
        let summary = summarize(&task_types, &keywords, &frameworks, &files);

        info!(
            "Selected {} files (~{} tokens) for task in {:?}",
            files.len(),
            estimated_tokens,
            start.elapsed()
        );

        Ok(RelevantContext {
            files,
            summary,
            task_types,
            keywords,
            total_size,
            estimated_tokens,
            truncated,
        })
    }

    fn gather(
        &self,
        request: &RelevanceRequest,
        task_types: &[TaskType],
        keywords: &[String],
        context: &ProjectContext,
        cache: &CacheInfo,
    ) -> Vec<Candidate> {
        let input = RuleInput {
            task: &request.task,
            keywords,
            context,
            cache,
        };
        let mut candidates = Vec::new();

        for path in &request.file_paths {
            let Some(path) = self.project.relative_within(Path::new(path)) else {
                warn!("Dropping {}: outside the worktree", path);
                continue;
            };
            if request.include_dependencies {
                candidates.extend(rules::dependencies_of(context, &path));
            }
            candidates.push(Candidate::new(path, "directly_referenced", DIRECT_PRIORITY));
        }

        for task_type in task_types {
            let found = match task_type {
                TaskType::Component => rules::components_by_name(
                    &input,
                    &[ComponentKind::Component, ComponentKind::Layout, ComponentKind::Page],
                    100.0,
                    "component",
                ),
                TaskType::Hook => {
                    rules::components_by_name(&input, &[ComponentKind::Hook], 100.0, "hook")
                }
                TaskType::Util => {
                    rules::components_by_name(&input, &[ComponentKind::Util], 90.0, "util")
                }
                TaskType::Api => rules::routes(&input),
                TaskType::Config if request.include_configs => rules::configs(&input),
                TaskType::Type => rules::type_definitions(&input),
                TaskType::Style => rules::styles(&input),
                TaskType::Debug => rules::error_handling(&input),
                TaskType::Refactor => rules::refactor_targets(&input),
                _ => Vec::new(),
            };
            debug!("{} rule proposed {} files", task_type, found.len());
            candidates.extend(found);
        }

        candidates.extend(rules::keyword_components(&input));

        if request.include_tests {
            let tests = rules::paired_tests(&input, &candidates);
            candidates.extend(tests);
        }
        candidates
    }

    /// Size and mtime from the index, falling back to a stat.
    async fn metadata(&self, context: &ProjectContext, path: &str) -> Option<(u64, u64)> {
        if let Some(entry) = context.index.get(path) {
            return Some((entry.size, entry.mtime));
        }
        match tokio::fs::metadata(self.project.absolute(path)).await {
            Ok(meta) => Some((
                meta.len(),
                meta.modified().map(system_time_ms).unwrap_or(0),
            )),
            Err(e) => {
                warn!("Dropping {}: {}", path, e);
                None
            }
        }
    }

    async fn materialize(
        &self,
        ranked: Vec<Candidate>,
        context: &ProjectContext,
        max_tokens: Option<usize>,
    ) -> Vec<RelevantFile> {
        let mut budget = ContentBudget::new(max_tokens, self.chars_per_token());
        let mut files = Vec::with_capacity(ranked.len());

        for candidate in ranked {
            let Some((size, last_modified)) = self.metadata(context, &candidate.path).await else {
                continue;
            };
            let content = if budget.is_exhausted() {
                None
            } else {
                match tokio::fs::read_to_string(self.project.absolute(&candidate.path)).await {
                    Ok(text) => budget.admit(text),
                    Err(e) => {
                        warn!("Failed to read {}: {}", candidate.path, e);
                        None
                    }
                }
            };
            files.push(RelevantFile {
                path: candidate.path,
                reason: candidate.reason,
                priority: candidate.priority,
                content,
                size,
                last_modified,
            });
        }
        files
    }

    /// Test counterpart, import neighbours, same-directory siblings and
    /// component imports of `path`, deduplicated.
    pub async fn get_related_files(&self, path: &str) -> Result<Vec<String>> {
        let Some(path) = self.project.relative_within(Path::new(path)) else {
            warn!("No related files for {}: outside the worktree", path);
            return Ok(Vec::new());
        };
        let context = self.loader.load(false).await?;
        let cache = self.cache.load(false).await?;

        let mut related: Vec<String> = Vec::new();
        let mut push = |candidate: String| {
            if candidate != path && !related.contains(&candidate) {
                related.push(candidate);
            }
        };

        if let Some(test) = cache.get_test_for_file(&path) {
            push(test.to_string());
        }
        for candidate in find_related_files(&path, &context) {
            push(candidate);
        }
        if let Some(component) = cache.components.iter().find(|c| c.path == path) {
            let profile = EcmaScriptProfile::typescript();
            for spec in &component.imports {
                if let Some(resolved) =
                    resolve_import(&profile, &path, spec, |c| context.index.contains(c))
                {
                    push(resolved);
                }
            }
        }
        Ok(related)
    }

    /// Context for editing one file: the file itself plus its first few
    /// related files, all treated as directly referenced.
    pub async fn get_context_for_edit(
        &self,
        path: &str,
        max_tokens: Option<usize>,
    ) -> Result<RelevantContext> {
        let relative = self.project.relative(Path::new(path));
        let related = self.get_related_files(&relative).await?;
        let files = std::iter::once(relative.clone())
            .chain(related.into_iter().take(EDIT_CONTEXT_FILES));

        let mut request = RelevanceRequest::new(format!("edit {}", paths::file_name(&relative)))
            .with_files(files)
            .include_dependencies(false);
        request.max_tokens = max_tokens;
        self.get_relevant_context(&request).await
    }
}

/// Keeps the highest-priority candidate per path and sorts by priority,
/// then centrality, then path.
pub fn rank(candidates: Vec<Candidate>, centrality: &CentralityScores) -> Vec<Candidate> {
    let mut best: HashMap<String, Candidate> = HashMap::new();
    for candidate in candidates {
        match best.get(&candidate.path) {
            Some(existing) if existing.priority >= candidate.priority => {}
            _ => {
                best.insert(candidate.path.clone(), candidate);
            }
        }
    }

    let mut ranked: Vec<Candidate> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| centrality.get(&b.path).total_cmp(&centrality.get(&a.path)))
            .then_with(|| a.path.cmp(&b.path))
    });
    ranked
}

fn summarize(
    task_types: &[TaskType],
    keywords: &[String],
    frameworks: &[String],
    files: &[RelevantFile],
) -> String {
    let types: Vec<&str> = task_types.iter().map(TaskType::name).collect();
    let mut lines = vec![
        format!("Task types: {}", types.join(", ")),
        format!(
            "Keywords: {}",
            if keywords.is_empty() {
                "none".to_string()
            } else {
                keywords.join(", ")
            }
        ),
    ];
    if !frameworks.is_empty() {
        lines.push(format!("Frameworks: {}", frameworks.join(", ")));
    }
    lines.push(format!("Relevant files: {}", files.len()));
    if !files.is_empty() {
        lines.push("Top files:".to_string());
        for file in files.iter().take(SUMMARY_TOP_FILES) {
            lines.push(format!("  - {} ({}, priority {})", file.path, file.reason, file.priority));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{
        Fingerprint, KvStore, MemoryStore, ProjectDirectories, QuarryConfig, StaticFingerprint,
    };
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "src/components/Login.tsx",
            "import { api } from '../lib/api';\nexport function Login() { return api.login(); }\n",
        );
        write(
            root,
            "src/components/Login.test.tsx",
            "import { Login } from './Login';\ntest('renders', () => Login());\n",
        );
        write(root, "src/components/Header.tsx", "export function Header() {}\n");
        write(root, "src/lib/api.ts", "export const api = { login() {} };\n");
        write(root, "src/lib/errorHandler.ts", "export function handle(e: Error) { throw e; }\n");
        write(root, "src/lib/exceptions.ts", "export class LoginException extends Error {}\n");
        write(root, "package.json", r#"{ "name": "demo" }"#);
        dir
    }

    fn engine(root: &Path) -> RelevanceEngine {
        let fingerprint: Arc<dyn FingerprintProvider> = Arc::new(StaticFingerprint(Fingerprint {
            language: Some("typescript".into()),
            has_typescript: true,
            directories: ProjectDirectories {
                components: vec!["src/components".into()],
                ..ProjectDirectories::default()
            },
            ..Fingerprint::default()
        }));
        let project = Arc::new(Project::new("demo", root));
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let config = QuarryConfig::default();
        let loader = Arc::new(ContextLoader::new(
            project.clone(),
            fingerprint.clone(),
            store.clone(),
            config.clone(),
        ));
        let cache = Arc::new(ContextCache::new(
            project.clone(),
            fingerprint.clone(),
            store,
            config.clone(),
        ));
        RelevanceEngine::new(project, loader, cache, fingerprint, config.relevance)
    }

    fn assert_well_formed(result: &RelevantContext) {
        let mut seen: Vec<&str> = result.files.iter().map(|f| f.path.as_str()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), result.files.len(), "paths must be unique");
        assert!(result
            .files
            .windows(2)
            .all(|w| w[0].priority >= w[1].priority));
    }

    fn find<'a>(result: &'a RelevantContext, path: &str) -> Option<&'a RelevantFile> {
        result.files.iter().find(|f| f.path == path)
    }

    #[tokio::test]
    async fn test_login_bug_scenario() {
        let dir = fixture();
        let engine = engine(dir.path());

        let result = engine
            .get_relevant_context(&RelevanceRequest::new("fix the bug in the login component"))
            .await
            .unwrap();

        assert_well_formed(&result);
        assert_eq!(result.task_types, vec![TaskType::Component, TaskType::Debug]);
        let login = find(&result, "src/components/Login.tsx").unwrap();
        assert!(login.priority >= 30);
        assert!(login.content.as_ref().unwrap().contains("export function Login"));
        assert_eq!(find(&result, "src/lib/errorHandler.ts").unwrap().priority, 70);
        assert_eq!(find(&result, "src/lib/exceptions.ts").unwrap().priority, 70);
        assert!(find(&result, "src/components/Login.test.tsx").is_some());
        assert!(find(&result, "src/components/Header.tsx").is_none());
        assert!(!result.truncated);
        assert!(result.summary.contains("Task types: component, debug"));
        assert!(result.summary.contains("Keywords: login, component"));
    }

    #[tokio::test]
    async fn test_explicit_paths_pull_dependencies() {
        let dir = fixture();
        let engine = engine(dir.path());

        let request = RelevanceRequest::new("tidy up")
            .with_files(["src/components/Login.tsx"])
            .include_tests(false);
        let result = engine.get_relevant_context(&request).await.unwrap();

        assert_well_formed(&result);
        assert_eq!(result.files[0].path, "src/components/Login.tsx");
        assert_eq!(result.files[0].reason, "directly_referenced");
        assert_eq!(result.files[0].priority, 100);

        let api = find(&result, "src/lib/api.ts").unwrap();
        assert_eq!(api.priority, 75);
        assert_eq!(api.reason, "imported by src/components/Login.tsx");
        let test = find(&result, "src/components/Login.test.tsx").unwrap();
        assert_eq!(test.priority, 70);
    }

    #[tokio::test]
    async fn test_explicit_paths_outside_worktree_are_dropped() {
        let dir = fixture();
        let engine = engine(dir.path());

        let request = RelevanceRequest::new("tidy up")
            .with_files(["/etc/passwd", "../outside.ts", "src/lib/api.ts"])
            .include_tests(false)
            .include_dependencies(false);
        let result = engine.get_relevant_context(&request).await.unwrap();

        assert_well_formed(&result);
        let paths: Vec<&str> = result.files.iter().map(|f| f.path.as_str()).collect();
        assert!(!paths.iter().any(|p| p.contains("passwd") || p.contains("outside")));
        assert_eq!(find(&result, "src/lib/api.ts").unwrap().priority, 100);
        assert!(engine.get_related_files("/etc/passwd").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_budget_limits_content() {
        let dir = fixture();
        let engine = engine(dir.path());

        let request = RelevanceRequest::new("fix the bug in the login component").with_max_tokens(20);
        let result = engine.get_relevant_context(&request).await.unwrap();

        assert_well_formed(&result);
        let loaded: usize = result
            .files
            .iter()
            .filter_map(|f| f.content.as_ref())
            .map(|c| c.chars().count())
            .sum();
        assert!(loaded <= 80);
        assert!(result.files.last().unwrap().content.is_none());
        assert!(result.truncated);
        assert_eq!(result.estimated_tokens, result.total_size / 4);
    }

    #[tokio::test]
    async fn test_related_files_and_edit_context() {
        let dir = fixture();
        let engine = engine(dir.path());

        let related = engine.get_related_files("src/components/Login.tsx").await.unwrap();
        assert_eq!(related[0], "src/components/Login.test.tsx");
        assert!(related.contains(&"src/lib/api.ts".to_string()));
        assert!(related.contains(&"src/components/Header.tsx".to_string()));
        assert!(!related.contains(&"src/components/Login.tsx".to_string()));

        let absolute = dir.path().join("src/components/Login.tsx");
        let result = engine
            .get_context_for_edit(absolute.to_str().unwrap(), None)
            .await
            .unwrap();
        assert_well_formed(&result);
        assert!(result.files.len() <= 1 + EDIT_CONTEXT_FILES);
        assert!(find(&result, "src/components/Login.tsx").is_some());
        assert!(find(&result, "src/lib/api.ts").is_some());
    }

    #[test]
    fn test_rank_dedups_and_orders() {
        let candidates = vec![
            Candidate::new("b.ts", "keyword: b", 60),
            Candidate::new("a.ts", "x", 70),
            Candidate::new("b.ts", "component match", 80),
            Candidate::new("c.ts", "y", 70),
        ];
        let ranked = rank(candidates, &CentralityScores::default());
        let order: Vec<(&str, i32)> = ranked.iter().map(|c| (c.path.as_str(), c.priority)).collect();
        assert_eq!(order, vec![("b.ts", 80), ("a.ts", 70), ("c.ts", 70)]);
        assert_eq!(ranked[0].reason, "component match");
    }
}
