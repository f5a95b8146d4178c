use std::sync::Arc;

use pager_core::{Category, Completion, RequestCoalescer};
use pager_logging::{pager_info, pager_warn};
use tokio::runtime::Handle;

use crate::{FeedFetcher, FeedItem, FeedStore};

/// Reacts to the list reaching its edges by fetching the adjacent page into
/// the store, with at most one request per edge in flight.
pub struct BoundaryCallback {
    coalescer: Arc<RequestCoalescer>,
    fetcher: Arc<dyn FeedFetcher>,
    store: Arc<dyn FeedStore>,
    runtime: Handle,
}

impl BoundaryCallback {
    pub fn new(
        coalescer: Arc<RequestCoalescer>,
        fetcher: Arc<dyn FeedFetcher>,
        store: Arc<dyn FeedStore>,
        runtime: Handle,
    ) -> Self {
        Self {
            coalescer,
            fetcher,
            store,
            runtime,
        }
    }

    pub fn coalescer(&self) -> &Arc<RequestCoalescer> {
        &self.coalescer
    }

    /// The store has nothing to show: fetch the first page.
    pub fn on_zero_items_loaded(&self) -> bool {
        self.request(Category::Initial, None)
    }

    /// The last stored item was displayed: fetch the page after it.
    pub fn on_item_at_end_loaded(&self, item_at_end: &FeedItem) -> bool {
        self.request(Category::After, Some(item_at_end.key.clone()))
    }

    /// The first stored item was displayed: fetch the page before it.
    pub fn on_item_at_front_loaded(&self, item_at_front: &FeedItem) -> bool {
        self.request(Category::Before, Some(item_at_front.key.clone()))
    }

    fn request(&self, category: Category, key: Option<String>) -> bool {
        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let runtime = self.runtime.clone();

        self.coalescer
            .run_if_not_running(category, move |completion: Completion| {
                let fetcher = Arc::clone(&fetcher);
                let store = Arc::clone(&store);
                let key = key.clone();
                runtime.spawn(async move {
                    match fetcher.fetch(category, key.as_deref()).await {
                        Ok(page) => {
                            let received = page.items.len();
                            let stored = match category {
                                Category::Before => store.prepend(page.items),
                                Category::Initial | Category::After => store.append(page.items),
                            };
                            pager_info!(
                                "{} page loaded: {} received, {} stored",
                                category,
                                received,
                                stored
                            );
                            completion.record_success();
                        }
                        Err(err) => {
                            pager_warn!("{} page failed: {}", category, err);
                            completion.record_failure(err.to_string());
                        }
                    }
                });
            })
    }
}
