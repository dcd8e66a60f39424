//! Scan orchestrator
//!
//! One background worker drains a queue of scan jobs, so scans for any
//! number of servers run strictly one at a time. Each job walks the
//! server's enabled library folders through the phase machine and records
//! progress on the task row that `start_scan` returned.

use crate::error::{Result, SyncError};
use crate::pagination::PageWalker;
use crate::reconcile::{
    reconcile_album_chunk, reconcile_artist_chunk, reconcile_song_chunk, ScanContext,
};
use crate::store::LibraryStore;
use crate::sweeper::sweep;
use crate::task::{PhaseTracker, ScanPhase};
use core_library::models::{now_ms, ServerFolder, Task};
use provider_traits::provider::{MusicProvider, RemoteServer, ServerKind};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info, instrument};

/// Tuning knobs for the scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Page size used for every remote listing
    pub chunk_size: u64,
    /// Scan jobs that may wait in the queue before `start_scan` fails
    pub queue_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5000,
            queue_capacity: 16,
        }
    }
}

struct ScanJob {
    task_id: i64,
    server_id: i64,
}

struct ScannerInner {
    providers: RwLock<HashMap<ServerKind, Arc<dyn MusicProvider>>>,
    store: LibraryStore,
    config: ScanConfig,
}

/// Entry point for running and observing library scans
#[derive(Clone)]
pub struct LibraryScanner {
    inner: Arc<ScannerInner>,
    sender: mpsc::Sender<ScanJob>,
}

impl LibraryScanner {
    /// Create the scanner and spawn its worker
    pub fn new(pool: SqlitePool, config: ScanConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let inner = Arc::new(ScannerInner {
            providers: RwLock::new(HashMap::new()),
            store: LibraryStore::new(pool),
            config,
        });

        tokio::spawn(run_worker(Arc::clone(&inner), receiver));

        Self { inner, sender }
    }

    /// Register the adapter for a backend family, replacing any previous one
    pub async fn register_provider(&self, provider: Arc<dyn MusicProvider>) {
        let kind = provider.kind();
        self.inner.providers.write().await.insert(kind, provider);
        info!(kind = %kind, "Registered provider");
    }

    /// Queue a full scan of the server's enabled library folders.
    ///
    /// Returns the task row tracking the scan. The scan itself runs on the
    /// worker; poll [`LibraryScanner::task`] for progress.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ServerNotFound`] for an unknown server,
    /// [`SyncError::ProviderNotRegistered`] when no adapter covers the
    /// server's backend family, and [`SyncError::QueueClosed`] when the
    /// worker is gone.
    #[instrument(skip(self))]
    pub async fn start_scan(&self, server_id: i64) -> Result<Task> {
        let server = self
            .inner
            .store
            .servers
            .find_by_id(server_id)
            .await?
            .ok_or(SyncError::ServerNotFound(server_id))?;

        let kind: ServerKind = server
            .server_type
            .parse()
            .map_err(|_| SyncError::ProviderNotRegistered(server.server_type.clone()))?;
        if !self.inner.providers.read().await.contains_key(&kind) {
            return Err(SyncError::ProviderNotRegistered(kind.to_string()));
        }

        let task = self
            .inner
            .store
            .tasks
            .create(server_id, "Full scan", now_ms())
            .await?;

        self.sender
            .send(ScanJob {
                task_id: task.id,
                server_id,
            })
            .await
            .map_err(|_| SyncError::QueueClosed)?;

        info!(task_id = task.id, "Queued scan");
        Ok(task)
    }

    /// Current state of a scan task
    pub async fn task(&self, task_id: i64) -> Result<Task> {
        self.inner
            .store
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(SyncError::TaskNotFound(task_id))
    }

    /// Tasks for a server that are neither completed nor failed
    pub async fn active_tasks(&self, server_id: i64) -> Result<Vec<Task>> {
        Ok(self.inner.store.tasks.active(server_id).await?)
    }
}

async fn run_worker(inner: Arc<ScannerInner>, mut receiver: mpsc::Receiver<ScanJob>) {
    while let Some(job) = receiver.recv().await {
        let task_id = job.task_id;
        if let Err(err) = run_scan(&inner, job).await {
            error!(task_id, error = %err, "Scan failed");
            if let Err(mark_err) = inner
                .store
                .tasks
                .fail(task_id, &err.to_string(), now_ms())
                .await
            {
                error!(task_id, error = %mark_err, "Could not mark task as failed");
            }
        }
    }
}

#[instrument(skip(inner, job), fields(task_id = job.task_id, server_id = job.server_id))]
async fn run_scan(inner: &ScannerInner, job: ScanJob) -> Result<()> {
    let store = &inner.store;
    let task = store
        .tasks
        .find_by_id(job.task_id)
        .await?
        .ok_or(SyncError::TaskNotFound(job.task_id))?;
    let server = store
        .servers
        .find_by_id(job.server_id)
        .await?
        .ok_or(SyncError::ServerNotFound(job.server_id))?;

    let kind: ServerKind = server.server_type.parse()?;
    let provider = inner
        .providers
        .read()
        .await
        .get(&kind)
        .cloned()
        .ok_or_else(|| SyncError::ProviderNotRegistered(kind.to_string()))?;

    let remote = RemoteServer {
        url: server.url.clone(),
        token: server.token.clone(),
        remote_user_id: server.remote_user_id.clone(),
    };

    let folders = store.servers.folders_for_server(server.id).await?;
    let mut tracker = PhaseTracker::new();

    for folder in &folders {
        // The cutoff never moves; every folder pass sweeps against the
        // moment the task was created
        let ctx = ScanContext::new(server.id, folder.id, task.created_at);
        scan_folder(
            inner,
            provider.as_ref(),
            &remote,
            &ctx,
            folder,
            task.id,
            &mut tracker,
        )
        .await?;
    }

    tracker.advance(ScanPhase::Completed)?;
    store
        .tasks
        .complete(task.id, ScanPhase::Completed.message(), now_ms())
        .await?;

    info!(folders = folders.len(), "Scan completed");
    Ok(())
}

/// Move the tracker forward and mirror the phase onto the task row
async fn enter_phase(
    store: &LibraryStore,
    tracker: &mut PhaseTracker,
    task_id: i64,
    phase: ScanPhase,
) -> Result<()> {
    tracker.advance(phase)?;
    store
        .tasks
        .set_message(task_id, phase.message(), now_ms())
        .await?;
    Ok(())
}

async fn scan_folder(
    inner: &ScannerInner,
    provider: &dyn MusicProvider,
    remote: &RemoteServer,
    ctx: &ScanContext,
    folder: &ServerFolder,
    task_id: i64,
    tracker: &mut PhaseTracker,
) -> Result<()> {
    let store = &inner.store;
    let chunk = inner.config.chunk_size;

    enter_phase(store, tracker, task_id, ScanPhase::Genres).await?;
    let mut walker = PageWalker::new(chunk);
    while let Some(query) = walker.next_query() {
        let query = query.with_parent(folder.remote_id.clone());
        let page = provider.list_genres(remote, &query).await?;
        let names: Vec<String> = page.items.into_iter().map(|g| g.name).collect();
        store.references.insert_genres(&names).await?;
        walker.record_page(names.len());
    }

    enter_phase(store, tracker, task_id, ScanPhase::Artists).await?;
    let mut walker = PageWalker::new(chunk);
    while let Some(query) = walker.next_query() {
        let query = query.with_parent(folder.remote_id.clone());
        let page = provider.list_artists(remote, &query).await?;
        reconcile_artist_chunk(store, ctx, &page.items).await?;
        walker.record_page(page.items.len());
    }

    enter_phase(store, tracker, task_id, ScanPhase::Albums).await?;
    let mut walker = PageWalker::new(chunk);
    while let Some(query) = walker.next_query() {
        let query = query.with_parent(folder.remote_id.clone());
        let page = provider.list_albums(remote, &query).await?;
        reconcile_album_chunk(store, ctx, &page.items).await?;
        walker.record_page(page.items.len());
    }

    enter_phase(store, tracker, task_id, ScanPhase::Songs).await?;
    let mut walker = PageWalker::new(chunk);
    while let Some(query) = walker.next_query() {
        let query = query.with_parent(folder.remote_id.clone());
        let page = provider.list_songs(remote, &query).await?;
        reconcile_song_chunk(store, ctx, &page.items).await?;
        walker.record_page(page.items.len());
    }

    enter_phase(store, tracker, task_id, ScanPhase::Sweeping).await?;
    let stats = sweep(store, ctx).await?;
    store.servers.set_last_scanned(folder.id, now_ms()).await?;

    info!(
        folder = %folder.remote_id,
        swept = stats.total(),
        "Folder pass finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::db::create_test_pool;

    #[tokio::test]
    async fn test_start_scan_unknown_server() {
        let pool = create_test_pool().await.unwrap();
        let scanner = LibraryScanner::new(pool, ScanConfig::default());

        let result = scanner.start_scan(999).await;
        assert!(matches!(result, Err(SyncError::ServerNotFound(999))));
    }

    #[tokio::test]
    async fn test_start_scan_without_provider() {
        let pool = create_test_pool().await.unwrap();
        let (server_id, _) = core_library::db::insert_test_server(&pool).await;
        let scanner = LibraryScanner::new(pool, ScanConfig::default());

        let result = scanner.start_scan(server_id).await;
        assert!(matches!(result, Err(SyncError::ProviderNotRegistered(_))));
    }

    #[tokio::test]
    async fn test_task_lookup_unknown_id() {
        let pool = create_test_pool().await.unwrap();
        let scanner = LibraryScanner::new(pool, ScanConfig::default());

        let result = scanner.task(42).await;
        assert!(matches!(result, Err(SyncError::TaskNotFound(42))));
    }
}
