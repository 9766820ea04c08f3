mod report;
mod state;

pub use report::{FetchFailure, FetchReport, FetchedPackage};
pub use state::FetchState;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};

use depot_error::{DepotError, Result};
use depot_registry::ArchiveSource;
use depot_resolver::DependencyMap;
use depot_store::{ArchiveReader, InstallTarget, unpack_into};
use depot_utils::{extract_version, package_install_path};

use state::FetchTracker;

/// Downloads and unpacks resolved packages, one task per package.
pub struct Fetcher<A, T> {
    source: Arc<A>,
    target: Arc<T>,
    limiter: Arc<Semaphore>,
    force: bool,
}

/// Live view of a running fetch.
///
/// `next` yields each package as soon as it is unpacked and returns `None`
/// once every task has finished. `finish` then hands back the report.
pub struct FetchHandle {
    events: mpsc::UnboundedReceiver<FetchedPackage>,
    driver: JoinHandle<FetchReport>,
}

impl FetchHandle {
    pub async fn next(&mut self) -> Option<FetchedPackage> {
        self.events.recv().await
    }

    pub async fn finish(self) -> Result<FetchReport> {
        self.driver
            .await
            .map_err(|e| DepotError::Task(format!("fetch driver stopped: {e}")))
    }
}

struct FetchContext<A, T> {
    source: Arc<A>,
    target: Arc<T>,
    limiter: Arc<Semaphore>,
    force: bool,
    install_root: PathBuf,
}

impl<A, T> Fetcher<A, T>
where
    A: ArchiveSource,
    T: InstallTarget,
{
    pub fn new(source: Arc<A>, target: Arc<T>, concurrency: usize) -> Self {
        Self {
            source,
            target,
            limiter: Arc::new(Semaphore::new(concurrency.clamp(1, Semaphore::MAX_PERMITS))),
            force: false,
        }
    }

    #[must_use]
    pub const fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Schedules exactly one task per entry of `map`. Must be called from
    /// within a tokio runtime.
    pub fn fetch_all(&self, map: &DependencyMap, install_root: &Path) -> FetchHandle {
        let (tx, events) = mpsc::unbounded_channel();
        let jobs: Vec<(String, String)> = map
            .iter()
            .map(|(name, selector)| (name.clone(), selector.clone()))
            .collect();
        let context = Arc::new(FetchContext {
            source: Arc::clone(&self.source),
            target: Arc::clone(&self.target),
            limiter: Arc::clone(&self.limiter),
            force: self.force,
            install_root: install_root.to_path_buf(),
        });

        let driver = tokio::spawn(async move {
            let mut pending: HashSet<String> = HashSet::with_capacity(jobs.len());
            let mut tasks = JoinSet::new();
            for (name, selector) in jobs {
                pending.insert(name.clone());
                let context = Arc::clone(&context);
                tasks.spawn(async move { context.fetch_one(name, selector).await });
            }

            let mut report = FetchReport::default();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Ok(package)) => {
                        pending.remove(&package.name);
                        report.succeeded.push(package.name.clone());
                        // The consumer may have stopped listening; the report
                        // still records the success.
                        let _ = tx.send(package);
                    }
                    Ok(Err(failure)) => {
                        depot_logger::warn(&failure.to_string());
                        pending.remove(&failure.name);
                        report.failed.push(failure);
                    }
                    Err(e) => {
                        depot_logger::error(&format!("Fetch task aborted: {e}"));
                    }
                }
            }

            // Whatever is still pending belongs to a task that panicked.
            for name in pending {
                report.failed.push(FetchFailure {
                    error: DepotError::Task(format!("fetch task for {name} aborted")),
                    name,
                    stage: FetchState::Pending,
                });
            }

            drop(tx);
            report
        });

        FetchHandle { events, driver }
    }
}

impl<A, T> FetchContext<A, T>
where
    A: ArchiveSource,
    T: InstallTarget,
{
    async fn fetch_one(
        &self,
        name: String,
        selector: String,
    ) -> std::result::Result<FetchedPackage, FetchFailure> {
        let mut tracker = FetchTracker::new(&name);
        let version = extract_version(&selector);
        let package_dir =
            package_install_path(&self.install_root, &name).map_err(|e| tracker.fail(e))?;

        let target = Arc::clone(&self.target);
        let dir = package_dir.clone();
        let force = self.force;
        blocking(move || {
            if force {
                target.remove_package_dir(&dir)?;
            }
            target.create_package_dir(&dir)
        })
        .await
        .map_err(|e| tracker.fail(e))?;
        tracker.advance();

        let bytes = {
            let _permit = self.limiter.acquire().await.map_err(|e| {
                tracker.fail(DepotError::Task(format!("download limiter closed: {e}")))
            })?;
            self.source
                .download_archive(&name, &version)
                .await
                .map_err(|e| tracker.fail(e))?
        };
        tracker.advance();

        tracker.advance();
        let target = Arc::clone(&self.target);
        let package = name.clone();
        let files = blocking(move || {
            let mut reader = ArchiveReader::new(&package, bytes.as_slice());
            unpack_into(target.as_ref(), &mut reader, &package_dir)
        })
        .await
        .map_err(|e| tracker.fail(e))?;
        tracker.advance();

        Ok(FetchedPackage {
            name,
            version,
            files,
        })
    }
}

async fn blocking<F, R>(work: F) -> Result<R>
where
    F: FnOnce() -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DepotError::Task(format!("blocking task failed: {e}")))?
}
