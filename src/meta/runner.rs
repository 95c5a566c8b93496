//! Bounded-concurrency executor for listener-produced follow-up tasks.

use crate::meta::registry::{apply_without_notify, PackageTask};
use crate::meta::store::PackageStore;
use crate::purl::PackageId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinError;
use tokio::time::timeout;
use tracing::{debug, warn};

const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs harvest tasks with bounded parallelism.
///
/// A fixed-size semaphore bounds how many task bodies run at once; excess
/// submissions queue on it, so a slow provider cannot exhaust the pool beyond
/// its permit. Each task execution re-fetches the package by coordinate
/// (silently skipping a deleted package), opens a fresh
/// [`PackageModifier`](crate::meta::package::PackageModifier) and invokes the
/// task on it — via [`apply_without_notify`], never through
/// `MetaRegistry::edit`, so task mutations do not re-trigger listeners.
///
/// Task bodies may perform blocking provider I/O; they run on the blocking
/// thread pool and are wrapped in a per-task timeout. A failing or timed-out
/// task is logged and isolated; it is not retried and does not affect other
/// queued tasks.
pub struct QueuedTaskRunner {
    store: Arc<dyn PackageStore>,
    semaphore: Arc<Semaphore>,
    task_timeout: Duration,
    handle: tokio::runtime::Handle,
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl QueuedTaskRunner {
    /// Creates a runner executing at most `concurrency_limit` tasks at once.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; the runner captures the
    /// current runtime handle to spawn onto.
    pub fn new(store: Arc<dyn PackageStore>, concurrency_limit: usize) -> Self {
        Self {
            store,
            semaphore: Arc::new(Semaphore::new(concurrency_limit.max(1))),
            task_timeout: DEFAULT_TASK_TIMEOUT,
            handle: tokio::runtime::Handle::current(),
            in_flight: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        }
    }

    /// Sets the per-task timeout (default: 5 minutes).
    pub fn with_task_timeout(mut self, task_timeout: Duration) -> Self {
        self.task_timeout = task_timeout;
        self
    }

    /// Queues one task for execution against `purl`.
    ///
    /// Returns immediately; the task runs once a permit is available.
    pub fn execute(&self, purl: PackageId, task: PackageTask) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        let store = Arc::clone(&self.store);
        let semaphore = Arc::clone(&self.semaphore);
        let in_flight = Arc::clone(&self.in_flight);
        let idle = Arc::clone(&self.idle);
        let task_timeout = self.task_timeout;

        self.handle.spawn(async move {
            // The semaphore is never closed while the runner lives.
            if let Ok(_permit) = semaphore.acquire_owned().await {
                let target = purl.clone();
                let outcome = timeout(
                    task_timeout,
                    tokio::task::spawn_blocking(move || {
                        apply_without_notify(store.as_ref(), &purl, task)
                    }),
                )
                .await;
                log_outcome(&target, task_timeout, outcome);
            }
            in_flight.fetch_sub(1, Ordering::SeqCst);
            idle.notify_waiters();
        });
    }

    /// Number of submitted tasks that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Waits until every submitted task has finished.
    pub async fn drain(&self) {
        loop {
            let notified = self.idle.notified();
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

fn log_outcome(
    purl: &PackageId,
    task_timeout: Duration,
    outcome: Result<Result<Result<(), crate::meta::MetaError>, JoinError>, tokio::time::error::Elapsed>,
) {
    match outcome {
        Ok(Ok(Ok(()))) => debug!(%purl, "harvest task completed"),
        Ok(Ok(Err(error))) => warn!(%purl, %error, "harvest task failed"),
        Ok(Err(join_error)) => warn!(%purl, %join_error, "harvest task panicked"),
        Err(_) => warn!(
            %purl,
            timeout_secs = task_timeout.as_secs(),
            "harvest task timed out"
        ),
    }
}
