//! Polling change watcher.
//!
//! Stats every watched path on a fixed interval and compares against the
//! last snapshot. Detected changes pile up in one pending buffer; a
//! debounce deadline, pushed back whenever the buffer grows, flushes the
//! whole batch into the cache and onto the event bus.
//!
//! A watched directory is also diffed against its immediate listing, so
//! a file created, edited or removed directly inside it is reported under
//! its own path. The worktree root is never reported as a change itself.
//!
//! The poll loop runs as one spawned task that owns the snapshots, the
//! buffer and both timers. `ContextWatcher` talks to it over a command
//! channel.

use crate::state::{StateRecorder, WatchState};
use chrono::Utc;
use quarry_cache::ContextCache;
use quarry_core::{
    system_time_ms, CacheEntry, ChangeKind, ContextEvent, EntryType, Error, EventBus, FileChange,
    KvStore, Project, Result, WatcherConfig,
};
use std::collections::{BTreeSet, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

const COMMAND_BUFFER: usize = 16;

/// What a path looked like at the last poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    mtime: u64,
    size: u64,
}

impl Snapshot {
    fn of(metadata: &std::fs::Metadata) -> Self {
        Self {
            mtime: metadata.modified().map(system_time_ms).unwrap_or(0),
            size: metadata.len(),
        }
    }
}

enum Command {
    Add(PathBuf, oneshot::Sender<Vec<PathBuf>>),
    /// Replies with the remaining paths. Empty means the loop has exited.
    Remove(PathBuf, oneshot::Sender<Vec<PathBuf>>),
    Paths(oneshot::Sender<Vec<PathBuf>>),
    Stop(oneshot::Sender<()>),
}

struct WatchHandle {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

/// Keeps a project's cache in step with the filesystem.
///
/// Constructed once per project by the host and shared by reference.
/// Stopped until [`start`](Self::start) is called.
pub struct ContextWatcher {
    project: Arc<Project>,
    cache: Arc<ContextCache>,
    bus: Arc<dyn EventBus>,
    state: StateRecorder,
    config: WatcherConfig,
    handle: Mutex<Option<WatchHandle>>,
}

impl ContextWatcher {
    pub fn new(
        project: Arc<Project>,
        cache: Arc<ContextCache>,
        bus: Arc<dyn EventBus>,
        store: Arc<dyn KvStore>,
        config: WatcherConfig,
    ) -> Self {
        let state = StateRecorder::new(store, project.id.clone());
        Self {
            project,
            cache,
            bus,
            state,
            config,
            handle: Mutex::new(None),
        }
    }

    /// Starts polling `paths`, or the whole worktree root when None.
    ///
    /// Calling this while already running logs a warning and does nothing.
    pub async fn start(&self, paths: Option<Vec<PathBuf>>) -> Result<()> {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            warn!("Watcher for {} is already running", self.project.id);
            return Ok(());
        }

        let mut watch = WatchLoop {
            project: self.project.clone(),
            cache: self.cache.clone(),
            bus: self.bus.clone(),
            state: self.state.clone(),
            config: self.config.clone(),
            paths: Vec::new(),
            snapshots: HashMap::new(),
            listings: HashMap::new(),
            pending: Vec::new(),
            debounce_at: None,
        };
        let requested = paths.unwrap_or_else(|| vec![self.project.worktree.clone()]);
        for path in requested {
            watch.add(self.project.absolute(path));
        }
        let relative = watch.relative_paths();

        let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(watch.run(receiver));
        *handle = Some(WatchHandle { commands, task });

        info!(
            "Watching {} path(s) for {} every {:?}",
            relative.len(),
            self.project.id,
            self.config.poll_interval()
        );
        self.state
            .update(|s| {
                s.watching = true;
                s.paths = relative;
                s.started = Some(Utc::now());
            })
            .await?;
        Ok(())
    }

    /// Stops polling, dropping timers, snapshots and unflushed changes.
    pub async fn stop(&self) -> Result<()> {
        let Some(handle) = self.handle.lock().await.take() else {
            debug!("Watcher for {} is not running", self.project.id);
            return Ok(());
        };

        let (reply, done) = oneshot::channel();
        if handle.commands.send(Command::Stop(reply)).await.is_ok() {
            let _ = done.await;
        }
        self.finish(handle.task).await
    }

    /// Same as [`stop`](Self::stop).
    pub async fn dispose(&self) -> Result<()> {
        self.stop().await
    }

    async fn finish(&self, task: JoinHandle<()>) -> Result<()> {
        if let Err(e) = task.await {
            warn!("Watcher task for {} ended badly: {}", self.project.id, e);
        }
        info!("Stopped watching {}", self.project.id);
        self.state
            .update(|s| {
                s.watching = false;
                s.paths.clear();
            })
            .await?;
        Ok(())
    }

    /// Adds a path to a running watcher, or starts watching just that path.
    pub async fn add_watch(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = self.project.absolute(path);
        let Some(commands) = self.commands().await else {
            return self.start(Some(vec![path])).await;
        };

        let (reply, paths) = oneshot::channel();
        commands
            .send(Command::Add(path, reply))
            .await
            .map_err(|_| Error::WatcherClosed)?;
        let paths = paths.await.map_err(|_| Error::WatcherClosed)?;
        let relative = self.relative_all(&paths);
        self.state.update(|s| s.paths = relative).await?;
        Ok(())
    }

    /// Stops watching one path. Removing the last path stops the watcher.
    pub async fn remove_watch(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = self.project.absolute(path);
        let mut handle = self.handle.lock().await;
        let Some(commands) = handle.as_ref().map(|h| h.commands.clone()) else {
            return Ok(());
        };

        let (reply, remaining) = oneshot::channel();
        commands
            .send(Command::Remove(path, reply))
            .await
            .map_err(|_| Error::WatcherClosed)?;
        let remaining = remaining.await.map_err(|_| Error::WatcherClosed)?;

        if remaining.is_empty() {
            if let Some(handle) = handle.take() {
                drop(handle.commands);
                return self.finish(handle.task).await;
            }
            return Ok(());
        }
        let relative = self.relative_all(&remaining);
        self.state.update(|s| s.paths = relative).await?;
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.handle
            .lock()
            .await
            .as_ref()
            .map_or(false, |h| !h.task.is_finished())
    }

    /// Absolute paths currently polled.
    pub async fn watched_paths(&self) -> Vec<PathBuf> {
        let Some(commands) = self.commands().await else {
            return Vec::new();
        };
        let (reply, paths) = oneshot::channel();
        if commands.send(Command::Paths(reply)).await.is_err() {
            return Vec::new();
        }
        paths.await.unwrap_or_default()
    }

    /// The persisted watcher state, if any was ever recorded.
    pub async fn state(&self) -> Option<WatchState> {
        self.state.get().await
    }

    async fn commands(&self) -> Option<mpsc::Sender<Command>> {
        self.handle.lock().await.as_ref().map(|h| h.commands.clone())
    }

    fn relative_all(&self, paths: &[PathBuf]) -> Vec<String> {
        paths.iter().map(|p| self.project.relative(p)).collect()
    }
}

/// The state owned by the spawned poll task.
struct WatchLoop {
    project: Arc<Project>,
    cache: Arc<ContextCache>,
    bus: Arc<dyn EventBus>,
    state: StateRecorder,
    config: WatcherConfig,
    paths: Vec<PathBuf>,
    snapshots: HashMap<PathBuf, Snapshot>,
    /// Children seen at the last poll, per watched directory.
    listings: HashMap<PathBuf, BTreeSet<PathBuf>>,
    pending: Vec<FileChange>,
    debounce_at: Option<Instant>,
}

impl WatchLoop {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let period = self.config.poll_interval();
        let mut poll = interval_at(Instant::now() + period, period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = self.debounce_at.unwrap_or_else(Instant::now);
            tokio::select! {
                _ = poll.tick() => self.tick(),
                _ = sleep_until(deadline), if self.debounce_at.is_some() => {
                    self.debounce_at = None;
                    self.flush().await;
                }
                command = commands.recv() => match command {
                    Some(Command::Add(path, reply)) => {
                        self.add(path);
                        let _ = reply.send(self.paths.clone());
                    }
                    Some(Command::Remove(path, reply)) => {
                        self.remove(&path);
                        let _ = reply.send(self.paths.clone());
                        if self.paths.is_empty() {
                            break;
                        }
                    }
                    Some(Command::Paths(reply)) => {
                        let _ = reply.send(self.paths.clone());
                    }
                    Some(Command::Stop(reply)) => {
                        let _ = reply.send(());
                        break;
                    }
                    None => break,
                },
            }
        }

        self.snapshots.clear();
        self.listings.clear();
        self.pending.clear();
        debug!("Poll loop for {} exited", self.project.id);
    }

    fn relative_paths(&self) -> Vec<String> {
        self.paths.iter().map(|p| self.project.relative(p)).collect()
    }

    /// Starts tracking a path, seeding its snapshot if it exists.
    fn add(&mut self, path: PathBuf) {
        if self.paths.contains(&path) {
            return;
        }
        match std::fs::metadata(&path) {
            Ok(metadata) => {
                self.snapshots.insert(path.clone(), Snapshot::of(&metadata));
                if metadata.is_dir() {
                    let children = self.children(&path);
                    for child in &children {
                        if let Ok(metadata) = std::fs::metadata(child) {
                            self.snapshots.insert(child.clone(), Snapshot::of(&metadata));
                        }
                    }
                    self.listings.insert(path.clone(), children);
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to stat {}: {}", path.display(), e),
        }
        self.paths.push(path);
    }

    fn remove(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
        self.snapshots.remove(path);
        for child in self.listings.remove(path).unwrap_or_default() {
            if !self.paths.contains(&child) {
                self.snapshots.remove(&child);
            }
        }
    }

    /// One poll over every watched path.
    fn tick(&mut self) {
        let before = self.pending.len();
        for path in self.paths.clone() {
            if let Some(kind) = self.check(&path) {
                self.record(&path, kind);
            }
            for (child, kind) in self.diff_listing(&path) {
                self.record(&child, kind);
            }
        }
        if self.pending.len() > before {
            self.debounce_at = Some(Instant::now() + self.config.debounce());
        }
    }

    fn record(&mut self, path: &Path, kind: ChangeKind) {
        let relative = self.project.relative(path);
        if relative.is_empty() {
            debug!("Worktree root {} changed", kind);
            return;
        }
        debug!("Detected {} {}", kind, relative);
        self.pending.push(FileChange::new(relative, kind));
    }

    /// Immediate children of `dir` that the cache would hold, minus paths
    /// that are watched on their own.
    fn children(&self, dir: &Path) -> BTreeSet<PathBuf> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Failed to list {}: {}", dir.display(), e);
                }
                return BTreeSet::new();
            }
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                self.cache.admits(&self.project.relative(&entry.path()), is_dir)
            })
            .map(|entry| entry.path())
            .filter(|child| !self.paths.contains(child))
            .collect()
    }

    /// Changes among the direct children of a watched directory.
    fn diff_listing(&mut self, dir: &Path) -> Vec<(PathBuf, ChangeKind)> {
        let is_dir = dir.is_dir();
        let known = self.listings.remove(dir).unwrap_or_default();
        if !is_dir && known.is_empty() {
            return Vec::new();
        }

        let current = if is_dir {
            self.children(dir)
        } else {
            BTreeSet::new()
        };
        let mut found = Vec::new();
        for child in &current {
            if let Some(kind) = self.check(child) {
                found.push((child.clone(), kind));
            }
        }
        for gone in known.difference(&current) {
            if self.paths.contains(gone) {
                continue;
            }
            if self.snapshots.remove(gone).is_some() {
                found.push((gone.clone(), ChangeKind::Deleted));
            }
        }
        if is_dir {
            self.listings.insert(dir.to_path_buf(), current);
        }
        found
    }

    fn check(&mut self, path: &Path) -> Option<ChangeKind> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return self.snapshots.remove(path).map(|_| ChangeKind::Deleted);
            }
            Err(e) => {
                warn!("Failed to stat {}: {}", path.display(), e);
                return None;
            }
        };

        let current = Snapshot::of(&metadata);
        let previous = self.snapshots.insert(path.to_path_buf(), current);
        match previous {
            None => Some(ChangeKind::Created),
            Some(old) if current.mtime > old.mtime || current.size != old.size => {
                Some(ChangeKind::Updated)
            }
            Some(_) => None,
        }
    }

    /// Publishes and applies every buffered change in arrival order.
    async fn flush(&mut self) {
        let batch = std::mem::take(&mut self.pending);
        if batch.is_empty() {
            return;
        }
        debug!("Flushing {} change(s) for {}", batch.len(), self.project.id);

        for change in batch {
            self.bus.publish(ContextEvent::FileChanged {
                project_id: self.project.id.clone(),
                change: change.clone(),
            });
            if let Err(e) = self.apply(&change).await {
                warn!("Failed to apply {} {}: {}", change.kind, change.path, e);
            }
        }

        let now = Utc::now();
        self.bus.publish(ContextEvent::ContextUpdated {
            project_id: self.project.id.clone(),
            timestamp: now,
        });
        if let Err(e) = self.state.update(|s| s.last_update = Some(now)).await {
            error!("Failed to record watcher state for {}: {}", self.project.id, e);
        }
    }

    async fn apply(&self, change: &FileChange) -> Result<()> {
        if change.kind == ChangeKind::Deleted {
            return self.cache.remove_entry(&change.path).await;
        }

        let absolute = self.project.absolute(&change.path);
        let metadata = match std::fs::metadata(&absolute) {
            Ok(metadata) => metadata,
            Err(e) => {
                // Gone again before the flush; the next poll reports it.
                warn!("Failed to stat {}: {}", change.path, e);
                return Ok(());
            }
        };
        let kind = if metadata.is_dir() {
            EntryType::Directory
        } else {
            EntryType::File
        };
        let snapshot = Snapshot::of(&metadata);
        self.cache
            .update_entry(CacheEntry::new(
                change.path.clone(),
                kind,
                snapshot.mtime,
                snapshot.size,
            ))
            .await
    }
}
