use std::fmt;
use std::sync::Arc;

use pager_core::{Category, RequestCoalescer, StatusSubscription, TaskExecutor};
use pager_logging::{pager_debug, pager_info, pager_warn};
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::{BoundaryCallback, FeedFetcher, FeedItem, FeedStore};

/// Progress of a user-requested refresh, tracked apart from paging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RefreshState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error { message: String },
}

impl fmt::Display for RefreshState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshState::Idle => write!(f, "idle"),
            RefreshState::Loading => write!(f, "refreshing"),
            RefreshState::Loaded => write!(f, "refreshed"),
            RefreshState::Error { message } => write!(f, "refresh failed: {message}"),
        }
    }
}

/// Builds one [`Listing`] per feed session over shared collaborators.
#[derive(Clone)]
pub struct FeedRepository {
    fetcher: Arc<dyn FeedFetcher>,
    store: Arc<dyn FeedStore>,
    runtime: Handle,
    executor: Arc<dyn TaskExecutor>,
}

impl FeedRepository {
    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        store: Arc<dyn FeedStore>,
        runtime: Handle,
        executor: Arc<dyn TaskExecutor>,
    ) -> Self {
        Self {
            fetcher,
            store,
            runtime,
            executor,
        }
    }

    /// Starts a new session with its own request tracker.
    pub fn listing(&self) -> Listing {
        let coalescer = Arc::new(RequestCoalescer::new(Arc::clone(&self.executor)));
        let boundary = BoundaryCallback::new(
            coalescer,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.store),
            self.runtime.clone(),
        );
        let (refresh_tx, _) = watch::channel(RefreshState::Idle);
        Listing {
            boundary,
            fetcher: Arc::clone(&self.fetcher),
            store: Arc::clone(&self.store),
            runtime: self.runtime.clone(),
            refresh_tx: Arc::new(refresh_tx),
        }
    }
}

/// Everything a feed view needs: items, paging triggers, status and actions.
pub struct Listing {
    boundary: BoundaryCallback,
    fetcher: Arc<dyn FeedFetcher>,
    store: Arc<dyn FeedStore>,
    runtime: Handle,
    refresh_tx: Arc<watch::Sender<RefreshState>>,
}

impl Listing {
    pub fn items(&self) -> Vec<FeedItem> {
        self.store.items()
    }

    pub fn network_state(&self) -> StatusSubscription {
        self.boundary.coalescer().status_stream()
    }

    pub fn refresh_state(&self) -> watch::Receiver<RefreshState> {
        self.refresh_tx.subscribe()
    }

    pub fn coalescer(&self) -> &Arc<RequestCoalescer> {
        self.boundary.coalescer()
    }

    /// Fetches the first page if the store is empty.
    pub fn load_initial(&self) -> bool {
        if self.store.is_empty() {
            self.boundary.on_zero_items_loaded()
        } else {
            false
        }
    }

    /// Fetches the page after the last stored item, or the first page if empty.
    pub fn load_next(&self) -> bool {
        match self.store.last() {
            Some(item) => self.boundary.on_item_at_end_loaded(&item),
            None => self.boundary.on_zero_items_loaded(),
        }
    }

    /// Fetches the page before the first stored item.
    pub fn load_previous(&self) -> bool {
        match self.store.first() {
            Some(item) => self.boundary.on_item_at_front_loaded(&item),
            None => self.boundary.on_zero_items_loaded(),
        }
    }

    /// Replays every failed paging request.
    pub fn retry(&self) -> usize {
        self.boundary.coalescer().retry_all_failed()
    }

    /// Re-fetches the first page and replaces the store contents with it.
    ///
    /// Returns `false` if a refresh is already in progress. The new request is
    /// dropped, not restarted: the in-flight fetch keeps running and its result
    /// is what the store ends up with.
    pub fn refresh(&self) -> bool {
        let started = self.refresh_tx.send_if_modified(|state| {
            if *state == RefreshState::Loading {
                false
            } else {
                *state = RefreshState::Loading;
                true
            }
        });
        if !started {
            pager_debug!("refresh already in progress");
            return false;
        }

        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let refresh_tx = Arc::clone(&self.refresh_tx);
        self.runtime.spawn(async move {
            let next = match fetcher.fetch(Category::Initial, None).await {
                Ok(page) => {
                    let count = page.items.len();
                    store.replace_all(page.items);
                    pager_info!("refresh replaced feed with {} items", count);
                    RefreshState::Loaded
                }
                Err(err) => {
                    pager_warn!("refresh failed: {}", err);
                    RefreshState::Error {
                        message: err.to_string(),
                    }
                }
            };
            refresh_tx.send_replace(next);
        });
        true
    }
}
