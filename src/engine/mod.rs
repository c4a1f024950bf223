//! The index coordinator.
//!
//! [`PrefixIndex`] owns one published [`IndexSnapshot`] behind a single lock.
//! Full builds run on a dedicated background thread; incremental updates and
//! searches run on the caller's thread. Every publication swaps the whole
//! snapshot, so readers only ever see a fully built or fully merged index.

mod cancel;
mod state;

pub use cancel::CancellationToken;
pub use state::IndexState;

use crate::index::build::{build_snapshot, snapshot_base_path, snapshot_identity};
use crate::index::reader::load_snapshot;
use crate::index::stats::IndexStats;
use crate::index::types::{EntryIndex, IndexConfig, IndexSnapshot, Root, Score, SearchHit};
use crate::index::update::{ChangeBatch, MovedEntry, UpdateSummary, apply_changes};
use crate::index::writer::save_snapshot;
use crate::query::{QueryEvaluator, SearchOptions};
use crate::source::IndexSource;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type CacheKey = (String, Score, usize);

/// Query counters for one index instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueryStats {
    pub queries_served: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl QueryStats {
    pub fn cache_hit_rate(&self) -> f32 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f32 / total as f32
        }
    }
}

/// State guarded by the instance lock
struct Inner {
    state: IndexState,
    snapshot: Arc<IndexSnapshot>,
    cancel: CancellationToken,
    /// Identifies the build allowed to publish
    build_id: u64,
    /// Bumped at every publication
    generation: u64,
    query_cache: Option<LruCache<CacheKey, Vec<SearchHit>>>,
}

impl Inner {
    fn publish(&mut self, snapshot: Arc<IndexSnapshot>) {
        self.snapshot = snapshot;
        self.state = IndexState::Ready;
        self.generation += 1;
        if let Some(cache) = self.query_cache.as_mut() {
            cache.clear();
        }
    }
}

/// Everything shared with the build worker
struct Shared<S> {
    roots: Vec<Root>,
    source: S,
    config: IndexConfig,
    inner: Mutex<Inner>,
    /// Signalled whenever a build settles
    settled: Condvar,
    /// Serializes snapshot writes
    persist_lock: Mutex<()>,
    warm_start_pending: AtomicBool,
    disposed: AtomicBool,
    queries_served: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl<S: IndexSource> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The guarded snapshot is always a complete value
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn base_path(&self) -> String {
        snapshot_base_path(&self.roots)
    }

    fn index_paths(&self, base_path: &str) -> Option<(PathBuf, PathBuf)> {
        let target = self.source.resolve_index_path(base_path, false)?;
        let temp = self.source.resolve_index_path(base_path, true)?;
        Some((target, temp))
    }

    /// Worker body for one build request
    fn run_build(&self, build_id: u64, cancel: CancellationToken, warm_start: bool) {
        let started = Instant::now();

        if warm_start && let Some(snapshot) = self.load_persisted() {
            self.finish_build(build_id, &cancel, snapshot, false);
            tracing::info!("index warm-started from cache in {:?}", started.elapsed());
            return;
        }

        match build_snapshot(&self.roots, &self.source, &self.config, &cancel) {
            Some(snapshot) => self.finish_build(build_id, &cancel, snapshot, self.config.persist),
            None => self.abort_build(build_id),
        }
    }

    fn load_persisted(&self) -> Option<IndexSnapshot> {
        if !self.config.persist {
            return None;
        }
        let (target, _) = self.index_paths(&self.base_path())?;
        let identity = snapshot_identity(&self.roots, &self.config);
        let _guard = self.persist_lock.lock().unwrap_or_else(PoisonError::into_inner);
        load_snapshot(&target, &identity)
    }

    fn finish_build(
        &self,
        build_id: u64,
        cancel: &CancellationToken,
        snapshot: IndexSnapshot,
        persist: bool,
    ) {
        let snapshot = Arc::new(snapshot);
        {
            let mut inner = self.lock();
            if inner.build_id != build_id || cancel.cancelled() {
                tracing::debug!("dropping result of superseded build {}", build_id);
                return;
            }
            inner.publish(Arc::clone(&snapshot));
            self.settled.notify_all();
        }

        if persist {
            self.persist(&snapshot);
        }
    }

    fn abort_build(&self, build_id: u64) {
        let mut inner = self.lock();
        if inner.build_id == build_id {
            inner.state = inner.state.on_build_cancelled();
            tracing::info!("build {} cancelled, index is {}", build_id, inner.state);
        }
        self.settled.notify_all();
    }

    /// Write `snapshot` to its index file; failures are logged only.
    ///
    /// Skipped once a newer snapshot is published, which persists itself.
    fn persist(&self, snapshot: &Arc<IndexSnapshot>) {
        let Some((target, temp)) = self.index_paths(&self.base_path()) else {
            return;
        };

        let _guard = self.persist_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if !Arc::ptr_eq(&self.lock().snapshot, snapshot) {
            tracing::debug!("skipping persistence of a superseded snapshot");
            return;
        }
        let started = Instant::now();
        match save_snapshot(snapshot, &target, &temp) {
            Ok(()) => tracing::debug!(
                "persisted index to {} in {:?}",
                target.display(),
                started.elapsed()
            ),
            Err(err) => tracing::warn!("failed to persist index to {}: {:#}", target.display(), err),
        }
    }
}

/// A prefix index over the entries of one or more roots
pub struct PrefixIndex<S: IndexSource> {
    shared: Arc<Shared<S>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: IndexSource> PrefixIndex<S> {
    /// Create an index over `roots`; nothing is built until [`build`](Self::build)
    pub fn new(roots: Vec<Root>, source: S, config: IndexConfig) -> Self {
        let config = config.normalized();
        let query_cache = NonZeroUsize::new(config.query_cache_size).map(LruCache::new);

        Self {
            shared: Arc::new(Shared {
                roots,
                source,
                config,
                inner: Mutex::new(Inner {
                    state: IndexState::NotBuilt,
                    snapshot: Arc::new(IndexSnapshot::default()),
                    cancel: CancellationToken::new(),
                    build_id: 0,
                    generation: 0,
                    query_cache,
                }),
                settled: Condvar::new(),
                persist_lock: Mutex::new(()),
                warm_start_pending: AtomicBool::new(true),
                disposed: AtomicBool::new(false),
                queries_served: AtomicU64::new(0),
                cache_hits: AtomicU64::new(0),
                cache_misses: AtomicU64::new(0),
            }),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Skip loading the persisted snapshot on the first build
    pub fn without_warm_start(self) -> Self {
        self.shared.warm_start_pending.store(false, Ordering::SeqCst);
        self
    }

    pub fn roots(&self) -> &[Root] {
        &self.shared.roots
    }

    pub fn config(&self) -> &IndexConfig {
        &self.shared.config
    }

    pub fn source(&self) -> &S {
        &self.shared.source
    }

    /// Start a build on the background worker.
    ///
    /// Returns immediately. The first call per instance tries the persisted
    /// snapshot before enumerating. A build already in progress is left
    /// running and this call does nothing.
    pub fn build(&self) {
        if self.shared.disposed.load(Ordering::SeqCst) {
            tracing::warn!("build requested on a disposed index");
            return;
        }

        let (build_id, cancel, previous) = {
            let mut inner = self.shared.lock();
            if inner.state.is_building() {
                tracing::debug!("build already running ({})", inner.state);
                return;
            }
            let previous = inner.state;
            inner.state = inner.state.on_build_started();
            inner.build_id += 1;
            inner.cancel = CancellationToken::new();
            (inner.build_id, inner.cancel.clone(), previous)
        };

        let warm_start = self.shared.warm_start_pending.swap(false, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("pfx-build".to_string())
            .spawn(move || shared.run_build(build_id, cancel, warm_start));

        match spawned {
            Ok(handle) => {
                let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
                workers.retain(|w| !w.is_finished());
                workers.push(handle);
                tracing::debug!("build {} started", build_id);
            }
            Err(err) => {
                tracing::warn!("failed to spawn build worker: {}", err);
                let mut inner = self.shared.lock();
                if inner.build_id == build_id {
                    inner.state = previous;
                }
                self.shared.settled.notify_all();
            }
        }
    }

    /// Cancel the running build, if any.
    ///
    /// A cancelled first build leaves the index `Aborted`; a cancelled rebuild
    /// keeps the previous snapshot published.
    pub fn cancel_build(&self) {
        let mut inner = self.shared.lock();
        if inner.state.is_building() {
            inner.cancel.cancel();
            inner.state = inner.state.on_build_cancelled();
            tracing::info!("build {} cancelled, index is {}", inner.build_id, inner.state);
            self.shared.settled.notify_all();
        }
    }

    pub fn state(&self) -> IndexState {
        self.shared.lock().state
    }

    /// Whether a snapshot is published and searchable
    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Block until no build is running, returning the settled state
    pub fn wait(&self) -> IndexState {
        let mut inner = self.shared.lock();
        while inner.state.is_building() {
            inner = self
                .shared
                .settled
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
        inner.state
    }

    /// Like [`wait`](Self::wait) with an upper bound
    pub fn wait_timeout(&self, timeout: Duration) -> IndexState {
        let deadline = Instant::now() + timeout;
        let mut inner = self.shared.lock();
        while inner.state.is_building() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            inner = self
                .shared
                .settled
                .wait_timeout(inner, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        inner.state
    }

    /// Search with default options
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        self.search_with(query, SearchOptions::default())
    }

    /// Ranked hits for `query`; empty while the index is not ready
    pub fn search_with(&self, query: &str, options: SearchOptions) -> Vec<SearchHit> {
        let shared = &self.shared;
        let key: CacheKey = (query.to_string(), options.max_score, options.limit);

        let (snapshot, generation) = {
            let mut inner = shared.lock();
            if !inner.state.is_ready() {
                return Vec::new();
            }
            shared.queries_served.fetch_add(1, Ordering::Relaxed);
            if let Some(hits) = inner.query_cache.as_mut().and_then(|c| c.get(&key)) {
                shared.cache_hits.fetch_add(1, Ordering::Relaxed);
                return hits.clone();
            }
            (Arc::clone(&inner.snapshot), inner.generation)
        };

        if shared.config.query_cache_size > 0 {
            shared.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
        let hits = QueryEvaluator::new(&snapshot, &shared.config).search(query, &options);

        let mut inner = shared.lock();
        if inner.generation == generation
            && let Some(cache) = inner.query_cache.as_mut()
        {
            cache.put(key, hits.clone());
        }
        hits
    }

    /// Merge a batch of entry changes without a full rebuild.
    ///
    /// Does nothing unless the index is `Ready`. The merged snapshot is
    /// published atomically and, when configured, persisted afterwards.
    pub fn incremental_update(&self, batch: &ChangeBatch) -> UpdateSummary {
        let shared = &self.shared;
        let published = {
            let mut inner = shared.lock();
            if inner.state != IndexState::Ready {
                tracing::debug!("ignoring update while index is {}", inner.state);
                return UpdateSummary::default();
            }
            if batch.is_empty() {
                return UpdateSummary::default();
            }

            let mut next = (*inner.snapshot).clone();
            let summary = apply_changes(&mut next, &shared.roots, &shared.source, &shared.config, batch);
            if summary.is_empty() {
                return summary;
            }

            let next = Arc::new(next);
            inner.publish(Arc::clone(&next));
            (next, summary)
        };

        let (snapshot, summary) = published;
        if shared.config.persist && shared.config.persist_on_update {
            shared.persist(&snapshot);
        }
        summary
    }

    /// Three-list form of [`incremental_update`](Self::incremental_update)
    pub fn on_content_changed(
        &self,
        updated: Vec<String>,
        removed: Vec<String>,
        moved: Vec<MovedEntry>,
    ) -> UpdateSummary {
        self.incremental_update(&ChangeBatch {
            updated,
            removed,
            moved,
        })
    }

    /// The currently published snapshot
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.shared.lock().snapshot)
    }

    /// Number of live entries in the published snapshot
    pub fn entry_count(&self) -> usize {
        self.shared.lock().snapshot.entries.live_count()
    }

    /// Entry stored at `index` in the published snapshot
    pub fn entry_at(&self, index: EntryIndex) -> Option<String> {
        self.shared.lock().snapshot.entries.get(index).map(str::to_string)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats::from_snapshot(&self.snapshot())
    }

    pub fn query_stats(&self) -> QueryStats {
        let shared = &self.shared;
        QueryStats {
            queries_served: shared.queries_served.load(Ordering::Relaxed),
            cache_hits: shared.cache_hits.load(Ordering::Relaxed),
            cache_misses: shared.cache_misses.load(Ordering::Relaxed),
        }
    }

    /// Path of the persisted snapshot, if persistence is available
    pub fn index_path(&self) -> Option<PathBuf> {
        self.shared
            .index_paths(&self.shared.base_path())
            .map(|(target, _)| target)
    }

    /// Cancel any running build and join the worker threads.
    ///
    /// Further [`build`](Self::build) calls are ignored. Idempotent.
    pub fn dispose(&self) {
        self.shared.disposed.store(true, Ordering::SeqCst);
        self.cancel_build();

        let workers: Vec<_> = {
            let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
            workers.drain(..).collect()
        };
        for worker in workers {
            if worker.join().is_err() {
                tracing::warn!("build worker panicked");
            }
        }
    }
}

impl<S: IndexSource> Drop for PrefixIndex<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
