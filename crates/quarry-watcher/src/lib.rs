//! Quarry Watcher - keeps the cache in step with the filesystem
//!
//! A polling watcher with a debounce window. Changes are published on the
//! event bus and applied to the cache one path at a time, so a burst of
//! edits never triggers a full rebuild.

mod state;
mod watcher;

pub use state::WatchState;
pub use watcher::ContextWatcher;
