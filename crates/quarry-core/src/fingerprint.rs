//! Project fingerprint: detected language, frameworks and directory
//! conventions.
//!
//! Fingerprinting itself happens outside Quarry. The loader, cache and
//! relevance engine only read it through [`FingerprintProvider`].

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framework {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Framework {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }
}

/// Conventional directories, worktree-relative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDirectories {
    #[serde(default)]
    pub tests: Vec<String>,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub routes: Vec<String>,
    #[serde(default)]
    pub pages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Primary language, lower-cased (`typescript`, `python`, `go`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub frameworks: Vec<Framework>,
    #[serde(default)]
    pub directories: ProjectDirectories,
    #[serde(default)]
    pub has_typescript: bool,
}

impl Fingerprint {
    /// Lower-cased framework names.
    pub fn framework_names(&self) -> Vec<String> {
        self.frameworks
            .iter()
            .map(|f| f.name.to_lowercase())
            .collect()
    }
}

/// Source of the project fingerprint.
#[async_trait]
pub trait FingerprintProvider: Send + Sync {
    /// Returns the fingerprint, computing it if necessary.
    async fn load(&self) -> Result<Fingerprint>;

    /// Returns the fingerprint only if it's already known.
    async fn get(&self) -> Option<Fingerprint>;
}

/// A provider that always hands out the same fingerprint.
#[derive(Debug, Clone, Default)]
pub struct StaticFingerprint(pub Fingerprint);

#[async_trait]
impl FingerprintProvider for StaticFingerprint {
    async fn load(&self) -> Result<Fingerprint> {
        Ok(self.0.clone())
    }

    async fn get(&self) -> Option<Fingerprint> {
        Some(self.0.clone())
    }
}
