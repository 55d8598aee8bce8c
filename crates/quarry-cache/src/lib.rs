//! Quarry Cache - framework-shaped facts about a project
//!
//! Where the loader sees files, the cache sees routes, components,
//! configs and tests. Detection is glob and filename heuristics driven by
//! the project fingerprint. The result is persisted per project and kept
//! fresh one path at a time by the watcher.

pub mod cache;
pub mod detectors;
pub mod heuristics;
pub mod profiles;
pub mod queries;
pub mod scan;

pub use cache::ContextCache;
pub use detectors::{Detected, ScanScope};
pub use heuristics::Heuristics;
pub use profiles::{select_profile, RouteProfile};
pub use queries::CacheQueries;
