use std::io;
use std::sync::Arc;

use pager_core::{Task, TaskExecutor};
use tokio::runtime::{Handle, Runtime};

use crate::{FeedRepository, FeedStore, FetchError, FetchSettings, ReqwestFetcher};

/// Submits tracker tasks to the blocking pool of a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl TaskExecutor for TokioExecutor {
    fn execute(&self, task: Task) {
        // Detached; the task settles its own completion.
        drop(self.handle.spawn_blocking(task));
    }
}

/// Owns the runtime that every fetch of the app runs on.
pub struct EngineHandle {
    runtime: Runtime,
}

impl EngineHandle {
    pub fn new() -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("feedpager-io")
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }

    pub fn handle(&self) -> Handle {
        self.runtime.handle().clone()
    }

    pub fn executor(&self) -> Arc<dyn TaskExecutor> {
        Arc::new(TokioExecutor::new(self.handle()))
    }

    /// Wires an HTTP fetcher for `settings` and `store` onto this runtime.
    pub fn repository(
        &self,
        settings: FetchSettings,
        store: Arc<dyn FeedStore>,
    ) -> Result<FeedRepository, FetchError> {
        let fetcher = Arc::new(ReqwestFetcher::new(settings)?);
        Ok(FeedRepository::new(
            fetcher,
            store,
            self.handle(),
            self.executor(),
        ))
    }
}
