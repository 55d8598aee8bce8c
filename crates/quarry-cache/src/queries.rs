//! Pure lookups over a `CacheInfo`.

use quarry_core::naming::{is_test_path, test_base_name};
use quarry_core::{paths, CacheInfo, ComponentCache, ComponentKind, ConfigCache, RouteCache};
use regex::Regex;
use tracing::warn;

/// Compiles a route pattern where `*` matches anything and every other
/// character is literal. The result is not anchored.
pub fn route_pattern_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let escaped: Vec<String> = pattern.split('*').map(regex::escape).collect();
    Regex::new(&escaped.join(".*"))
}

pub trait CacheQueries {
    fn get_route(&self, path: &str) -> Option<&RouteCache>;
    fn get_routes_by_pattern(&self, pattern: &str) -> Vec<&RouteCache>;
    /// Looks a component up by path, then by name.
    fn get_component(&self, name_or_path: &str) -> Option<&ComponentCache>;
    fn get_components_by_type(&self, kind: ComponentKind) -> Vec<&ComponentCache>;
    /// Looks a config up by path, then by file name.
    fn get_config(&self, name_or_path: &str) -> Option<&ConfigCache>;
    /// The test file sharing `path`'s base name, preferring one in the
    /// same directory.
    fn get_test_for_file(&self, path: &str) -> Option<&str>;
}

impl CacheQueries for CacheInfo {
    fn get_route(&self, path: &str) -> Option<&RouteCache> {
        let path = paths::normalize(path);
        self.routes.iter().find(|r| r.path == path)
    }

    fn get_routes_by_pattern(&self, pattern: &str) -> Vec<&RouteCache> {
        match route_pattern_regex(pattern) {
            Ok(re) => self.routes.iter().filter(|r| re.is_match(&r.path)).collect(),
            Err(e) => {
                warn!("Unusable route pattern '{}': {}", pattern, e);
                Vec::new()
            }
        }
    }

    fn get_component(&self, name_or_path: &str) -> Option<&ComponentCache> {
        let path = paths::normalize(name_or_path);
        self.components
            .iter()
            .find(|c| c.path == path)
            .or_else(|| self.components.iter().find(|c| c.name == name_or_path))
    }

    fn get_components_by_type(&self, kind: ComponentKind) -> Vec<&ComponentCache> {
        self.components.iter().filter(|c| c.kind == kind).collect()
    }

    fn get_config(&self, name_or_path: &str) -> Option<&ConfigCache> {
        let path = paths::normalize(name_or_path);
        self.configs
            .iter()
            .find(|c| c.path == path)
            .or_else(|| self.configs.iter().find(|c| c.name == name_or_path))
    }

    fn get_test_for_file(&self, path: &str) -> Option<&str> {
        let path = paths::normalize(path);
        let base = test_base_name(&path);
        let dir = paths::parent_dir(&path);

        let mut candidates = self
            .test_files
            .iter()
            .filter(|t| **t != path && is_test_path(t) && test_base_name(t) == base);
        let first = candidates.next()?;
        if paths::parent_dir(first) == dir {
            return Some(first.as_str());
        }
        candidates
            .find(|t| paths::parent_dir(t) == dir)
            .map(String::as_str)
            .or(Some(first.as_str()))
    }
}
