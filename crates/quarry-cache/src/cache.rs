//! The framework-aware cache service.
//!
//! `build` runs the four detectors and assembles a `CacheInfo`; `load`
//! returns the persisted one or builds and saves. The watcher keeps it
//! fresh through `update_entry` / `remove_entry` instead of rebuilding.

use crate::detectors::{
    component_from_source, config_from_bytes, content_hash, detect_components, detect_configs,
    detect_routes, detect_tests, ScanScope, COMPONENT_DIRS,
};
use crate::heuristics::Heuristics;
use crate::queries::CacheQueries;
use chrono::Utc;
use quarry_core::naming::{is_config_file_name, is_test_path};
use quarry_core::store::{read_json, write_json};
use quarry_core::{
    paths, CacheEntry, CacheInfo, ComponentCache, ComponentKind, ConfigCache, EntryType,
    Fingerprint, FingerprintProvider, IgnoreSet, KvStore, Project, QuarryConfig, Result,
    RouteCache, StoreKey,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const COMPONENT_EXTENSIONS: &[&str] = &["tsx", "jsx", "ts", "js", "vue", "svelte"];

pub struct ContextCache {
    project: Arc<Project>,
    fingerprint: Arc<dyn FingerprintProvider>,
    store: Arc<dyn KvStore>,
    config: QuarryConfig,
    ignore: IgnoreSet,
}

impl ContextCache {
    pub fn new(
        project: Arc<Project>,
        fingerprint: Arc<dyn FingerprintProvider>,
        store: Arc<dyn KvStore>,
        config: QuarryConfig,
    ) -> Self {
        let ignore = config.ignore_set();
        Self {
            project,
            fingerprint,
            store,
            config,
            ignore,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Whether a worktree-relative path may hold a cache entry.
    ///
    /// The worktree root itself and anything inside an ignored directory
    /// never do.
    pub fn admits(&self, path: &str, is_dir: bool) -> bool {
        let path = paths::normalize(path);
        if path.is_empty() || self.ignore.is_ignored_path(&path) {
            return false;
        }
        !(is_dir && self.ignore.is_ignored_dir(paths::file_name(&path)))
    }

    fn key(&self) -> StoreKey {
        StoreKey::cache(&self.project.id)
    }

    fn scope(&self) -> ScanScope {
        ScanScope {
            root: self.project.worktree.clone(),
            ignore: self.ignore.clone(),
            content_limit: self.config.cache.config_content_limit,
        }
    }

    /// Detects everything from scratch. Nothing is persisted.
    pub async fn build(&self) -> CacheInfo {
        let start = Instant::now();
        let fingerprint = match self.fingerprint.load().await {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                warn!("{}, detecting without framework conventions", e);
                Fingerprint::default()
            }
        };

        let scope = self.scope();
        let (routes, components, configs, tests) = tokio::join!(
            detect_routes(&scope, &fingerprint),
            detect_components(&scope, &fingerprint),
            detect_configs(&scope),
            detect_tests(&scope, &fingerprint),
        );

        let mut info = CacheInfo::new(&self.project.id);
        for entry in components
            .entries
            .into_iter()
            .chain(routes.entries)
            .chain(configs.entries)
            .chain(tests.entries)
        {
            info.entries.insert(entry.path.clone(), entry);
        }
        info.routes = routes.items;
        info.components = components.items;
        info.configs = configs.items;
        info.test_files = tests.items;

        info!(
            "Cache built: {} routes, {} components, {} configs, {} tests in {:?}",
            info.routes.len(),
            info.components.len(),
            info.configs.len(),
            info.test_files.len(),
            start.elapsed()
        );
        info
    }

    /// Returns the persisted cache, or builds and persists it.
    pub async fn load(&self, force: bool) -> Result<CacheInfo> {
        if !force {
            if let Some(info) = self.get().await {
                debug!("Using persisted cache for {}", self.project.id);
                return Ok(info);
            }
        }
        let info = self.build().await;
        self.save(info).await
    }

    /// Returns the persisted cache, if there is a readable one.
    pub async fn get(&self) -> Option<CacheInfo> {
        match read_json(self.store.as_ref(), &self.key()).await {
            Ok(info) => Some(info),
            Err(e) => {
                debug!("No persisted cache for {}: {}", self.project.id, e);
                None
            }
        }
    }

    /// Persists `info`, stamping its update time.
    pub async fn save(&self, mut info: CacheInfo) -> Result<CacheInfo> {
        info.updated = Utc::now();
        write_json(self.store.as_ref(), &self.key(), &info).await?;
        Ok(info)
    }

    pub async fn invalidate(&self) -> Result<()> {
        self.store.remove(&self.key()).await?;
        info!("Invalidated cache for {}", self.project.id);
        Ok(())
    }

    /// Upserts one path into the persisted cache.
    ///
    /// A plain `file` entry for a path the cache already knows keeps its
    /// known type, and a new file that looks like a test, component or
    /// config is promoted to that type. Typed lists follow the entry type.
    /// Does nothing when there is no persisted cache yet, or when the path
    /// is not [admitted](Self::admits).
    pub async fn update_entry(&self, mut entry: CacheEntry) -> Result<()> {
        entry.path = paths::normalize(&entry.path);
        if !self.admits(&entry.path, entry.kind == EntryType::Directory) {
            debug!("Not caching ignored path {:?}", entry.path);
            return Ok(());
        }
        let Some(mut info) = self.get().await else {
            debug!("No cache to update for {}", entry.path);
            return Ok(());
        };
        if entry.kind == EntryType::File {
            entry.kind = self.promote(&info, &entry.path);
        }

        match entry.kind {
            EntryType::Test => {
                if !info.test_files.contains(&entry.path) {
                    info.test_files.push(entry.path.clone());
                }
            }
            EntryType::Component => {
                let source = self.read(&entry.path).await;
                let source = source.as_deref().map(String::from_utf8_lossy);
                let component = component_from_source(&entry.path, source.as_deref());
                upsert_component(&mut info.components, component);
            }
            EntryType::Config => {
                let bytes = self.read(&entry.path).await;
                if let Some(bytes) = &bytes {
                    entry.hash = Some(content_hash(bytes));
                }
                let config = config_from_bytes(
                    &entry.path,
                    bytes.as_deref(),
                    self.config.cache.config_content_limit,
                );
                upsert_config(&mut info.configs, config);
            }
            EntryType::Route => {
                if let Some(route) = info.get_route(&entry.path).cloned() {
                    let methods = self
                        .read(&entry.path)
                        .await
                        .and_then(|b| Heuristics::sniff_methods(&String::from_utf8_lossy(&b)));
                    upsert_route(&mut info.routes, RouteCache { methods, ..route });
                }
            }
            EntryType::File | EntryType::Directory => {}
        }

        debug!("Cache entry {} ({})", entry.path, entry.kind);
        info.entries.insert(entry.path.clone(), entry);
        self.save(info).await?;
        Ok(())
    }

    /// Drops one path from the entry map and every typed list.
    pub async fn remove_entry(&self, path: &str) -> Result<()> {
        let Some(mut info) = self.get().await else {
            return Ok(());
        };
        let path = paths::normalize(path);
        info.entries.remove(&path);
        info.routes.retain(|r| r.path != path);
        info.components.retain(|c| c.path != path);
        info.configs.retain(|c| c.path != path);
        info.test_files.retain(|t| *t != path);
        debug!("Removed cache entry {}", path);
        self.save(info).await?;
        Ok(())
    }

    fn promote(&self, info: &CacheInfo, path: &str) -> EntryType {
        if let Some(existing) = info.entries.get(path) {
            if existing.kind != EntryType::Directory {
                return existing.kind;
            }
        }
        if is_test_path(path) {
            return EntryType::Test;
        }
        let dir = paths::parent_dir(path);
        if dir.is_empty() && is_config_file_name(paths::file_name(path)) {
            return EntryType::Config;
        }
        let in_component_dir = COMPONENT_DIRS
            .iter()
            .any(|d| dir == *d || dir.starts_with(&format!("{}/", d)));
        if in_component_dir && COMPONENT_EXTENSIONS.contains(&paths::extension(path).as_str()) {
            return EntryType::Component;
        }
        EntryType::File
    }

    async fn read(&self, relative: &str) -> Option<Vec<u8>> {
        match tokio::fs::read(self.project.absolute(relative)).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Failed to read {}: {}", relative, e);
                None
            }
        }
    }

    pub async fn get_route(&self, path: &str) -> Option<RouteCache> {
        self.get().await?.get_route(path).cloned()
    }

    pub async fn get_routes_by_pattern(&self, pattern: &str) -> Vec<RouteCache> {
        match self.get().await {
            Some(info) => info.get_routes_by_pattern(pattern).into_iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    pub async fn get_component(&self, name_or_path: &str) -> Option<ComponentCache> {
        self.get().await?.get_component(name_or_path).cloned()
    }

    pub async fn get_components_by_type(&self, kind: ComponentKind) -> Vec<ComponentCache> {
        match self.get().await {
            Some(info) => info.get_components_by_type(kind).into_iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    pub async fn get_config(&self, name_or_path: &str) -> Option<ConfigCache> {
        self.get().await?.get_config(name_or_path).cloned()
    }

    pub async fn get_test_for_file(&self, path: &str) -> Option<String> {
        self.get().await?.get_test_for_file(path).map(str::to_string)
    }
}

fn upsert_component(list: &mut Vec<ComponentCache>, component: ComponentCache) {
    match list.iter_mut().find(|c| c.path == component.path) {
        Some(existing) => *existing = component,
        None => list.push(component),
    }
}

fn upsert_config(list: &mut Vec<ConfigCache>, config: ConfigCache) {
    match list.iter_mut().find(|c| c.path == config.path) {
        Some(existing) => *existing = config,
        None => list.push(config),
    }
}

fn upsert_route(list: &mut Vec<RouteCache>, route: RouteCache) {
    match list.iter_mut().find(|r| r.path == route.path) {
        Some(existing) => *existing = route,
        None => list.push(route),
    }
}
