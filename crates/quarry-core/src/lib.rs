//! Quarry Core - shared model and collaborator seams
//!
//! Everything the loader, cache, watcher and relevance crates agree on
//! lives here: the persisted data model, path conventions, the ignore set,
//! per-language import profiles, configuration, and the traits through
//! which Quarry talks to its host (fingerprint, store, event bus).
//!
//! # Example
//!
//! ```
//! use quarry_core::languages::{get_profile, relative_imports};
//!
//! let profile = get_profile("typescript", true).unwrap();
//! let imports = relative_imports(profile.as_ref(), "src/app.ts", "import x from './x';", |_| false);
//! assert_eq!(imports, vec!["src/x.ts".to_string()]);
//! ```

pub mod bus;
pub mod config;
pub mod entities;
pub mod error;
pub mod fingerprint;
pub mod index;
pub mod languages;
pub mod naming;
pub mod paths;
pub mod project;
pub mod store;

pub use bus::{BroadcastBus, ContextEvent, EventBus};
pub use config::{CacheConfig, QuarryConfig, RelevanceConfig, WatcherConfig};
pub use entities::{
    CacheEntry, CacheInfo, ChangeKind, ComponentCache, ComponentKind, ConfigCache, ConfigKind,
    EntryType, FileChange, RouteCache, RouteKind,
};
pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, FingerprintProvider, Framework, ProjectDirectories, StaticFingerprint};
pub use index::{DependencyGraph, DirectoryNode, FileEntry, FileIndex, ProjectContext};
pub use languages::ImportProfile;
pub use paths::IgnoreSet;
pub use project::Project;
pub use store::{KvStore, MemoryStore, SledStore, StoreError, StoreKey};

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch for a filesystem timestamp.
pub fn system_time_ms(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
