use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pager_core::{AggregatedStatus, Category, InlineExecutor, StatusSubscription};
use pager_engine::{
    FailureKind, FeedFetcher, FeedItem, FeedPage, FeedRepository, FeedStore, FetchError,
    Listing, MemoryFeedStore, RefreshState, TokioExecutor,
};
use pretty_assertions::assert_eq;
use tokio::runtime::Handle;
use tokio::sync::Notify;

type Call = (Category, Option<String>);

/// Fetcher that replays scripted results and records what was asked of it.
#[derive(Default)]
struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<FeedPage, FetchError>>>,
    calls: Mutex<Vec<Call>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedFetcher {
    fn with_responses(responses: Vec<Result<FeedPage, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FeedFetcher for ScriptedFetcher {
    async fn fetch(&self, category: Category, key: Option<&str>) -> Result<FeedPage, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((category, key.map(str::to_string)));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(FeedPage::default()))
    }
}

fn item(key: &str) -> FeedItem {
    FeedItem {
        key: key.to_string(),
        title: format!("post {key}"),
        author: "ferris".to_string(),
        score: 1,
        num_comments: 0,
        permalink: format!("/r/rust/comments/{key}/"),
        url: None,
        created_utc: 0.0,
        index_in_response: 0,
    }
}

fn page(keys: &[&str]) -> FeedPage {
    FeedPage {
        items: keys.iter().map(|key| item(key)).collect(),
        after: keys.last().map(|key| key.to_string()),
        before: None,
    }
}

fn keys(listing: &Listing) -> Vec<String> {
    listing.items().into_iter().map(|item| item.key).collect()
}

fn listing_over(fetcher: Arc<ScriptedFetcher>, store: Arc<MemoryFeedStore>) -> Listing {
    FeedRepository::new(fetcher, store, Handle::current(), Arc::new(InlineExecutor)).listing()
}

async fn settle(stream: &mut StatusSubscription) -> AggregatedStatus {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let status = stream.next().await.expect("status feed alive");
            if matches!(
                status,
                AggregatedStatus::Loaded | AggregatedStatus::Error { .. }
            ) {
                return status;
            }
        }
    })
    .await
    .expect("requests settled")
}

fn init_logging() {
    pager_logging::initialize_for_tests();
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_items_loads_first_page_into_store() {
    init_logging();
    let fetcher = Arc::new(ScriptedFetcher::with_responses(vec![Ok(page(&["a", "b"]))]));
    let store = Arc::new(MemoryFeedStore::new());
    let listing = listing_over(fetcher.clone(), store.clone());
    let mut status = listing.network_state();

    assert!(listing.load_initial());
    assert_eq!(settle(&mut status).await, AggregatedStatus::Loaded);

    assert_eq!(keys(&listing), vec!["a", "b"]);
    assert_eq!(fetcher.calls(), vec![(Category::Initial, None)]);
    // Nothing to do once the store has items.
    assert!(!listing.load_initial());
}

#[tokio::test(flavor = "multi_thread")]
async fn paging_uses_edge_item_keys() {
    init_logging();
    let fetcher = Arc::new(ScriptedFetcher::with_responses(vec![
        Ok(page(&["c", "d"])),
        Ok(page(&["a"])),
    ]));
    let store = Arc::new(MemoryFeedStore::new());
    store.append(vec![item("b")]);
    let listing = listing_over(fetcher.clone(), store.clone());
    let mut status = listing.network_state();

    assert!(listing.load_next());
    assert_eq!(settle(&mut status).await, AggregatedStatus::Loaded);
    assert!(listing.load_previous());
    assert_eq!(settle(&mut status).await, AggregatedStatus::Loaded);

    assert_eq!(keys(&listing), vec!["a", "b", "c", "d"]);
    assert_eq!(
        fetcher.calls(),
        vec![
            (Category::After, Some("b".to_string())),
            (Category::Before, Some("b".to_string())),
        ]
    );
    let indices: Vec<_> = store.items().iter().map(|i| i.index_in_response).collect();
    assert_eq!(indices, vec![-1, 0, 1, 2]);
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_end_triggers_share_one_request() {
    init_logging();
    let gate = Arc::new(Notify::new());
    let fetcher = Arc::new(
        ScriptedFetcher::with_responses(vec![Ok(page(&["b"]))]).gated(gate.clone()),
    );
    let store = Arc::new(MemoryFeedStore::new());
    store.append(vec![item("a")]);
    let listing = listing_over(fetcher.clone(), store.clone());
    let mut status = listing.network_state();

    assert!(listing.load_next());
    assert!(!listing.load_next());
    assert!(!listing.load_next());
    assert_eq!(
        listing.coalescer().status(Category::After),
        pager_core::RequestStatus::Running
    );

    gate.notify_one();
    assert_eq!(settle(&mut status).await, AggregatedStatus::Loaded);
    assert_eq!(fetcher.calls().len(), 1);
    assert_eq!(keys(&listing), vec!["a", "b"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_page_is_retried_on_request() {
    init_logging();
    let fetcher = Arc::new(ScriptedFetcher::with_responses(vec![
        Err(FetchError::new(FailureKind::Timeout, "operation timed out")),
        Ok(page(&["a", "b"])),
    ]));
    let store = Arc::new(MemoryFeedStore::new());
    let repository = FeedRepository::new(
        fetcher.clone(),
        store.clone(),
        Handle::current(),
        Arc::new(TokioExecutor::new(Handle::current())),
    );
    let listing = repository.listing();
    let mut status = listing.network_state();

    assert!(listing.load_initial());
    let failed = settle(&mut status).await;
    assert_eq!(failed.error_message(), Some("timeout: operation timed out"));
    assert!(store.is_empty());

    assert_eq!(listing.retry(), 1);
    assert_eq!(settle(&mut status).await, AggregatedStatus::Loaded);
    assert_eq!(keys(&listing), vec!["a", "b"]);
    assert_eq!(
        fetcher.calls(),
        vec![(Category::Initial, None), (Category::Initial, None)]
    );
    assert_eq!(listing.retry(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn refresh_replaces_store_contents() {
    init_logging();
    let fetcher = Arc::new(ScriptedFetcher::with_responses(vec![Ok(page(&["x", "y"]))]));
    let store = Arc::new(MemoryFeedStore::new());
    store.append(vec![item("old1"), item("old2"), item("old3")]);
    let listing = listing_over(fetcher.clone(), store.clone());
    let mut refresh = listing.refresh_state();

    assert!(listing.refresh());
    let state = tokio::time::timeout(
        Duration::from_secs(5),
        refresh.wait_for(|state| *state != RefreshState::Loading),
    )
    .await
    .expect("refresh finished")
    .expect("listing alive")
    .clone();

    assert_eq!(state, RefreshState::Loaded);
    assert_eq!(keys(&listing), vec!["x", "y"]);
    assert_eq!(fetcher.calls(), vec![(Category::Initial, None)]);
    // Paging status is untouched by a refresh.
    assert_eq!(listing.coalescer().aggregated_status(), AggregatedStatus::Idle);
}

#[tokio::test(flavor = "multi_thread")]
async fn refresh_failure_keeps_items_and_reports_error() {
    init_logging();
    let gate = Arc::new(Notify::new());
    let fetcher = Arc::new(
        ScriptedFetcher::with_responses(vec![Err(FetchError::new(
            FailureKind::HttpStatus(500),
            "500 Internal Server Error",
        ))])
        .gated(gate.clone()),
    );
    let store = Arc::new(MemoryFeedStore::new());
    store.append(vec![item("keep")]);
    let listing = listing_over(fetcher.clone(), store.clone());
    let mut refresh = listing.refresh_state();

    assert!(listing.refresh());
    assert!(!listing.refresh());
    gate.notify_one();

    let state = tokio::time::timeout(
        Duration::from_secs(5),
        refresh.wait_for(|state| *state != RefreshState::Loading),
    )
    .await
    .expect("refresh finished")
    .expect("listing alive")
    .clone();

    assert_eq!(
        state,
        RefreshState::Error {
            message: "http status 500: 500 Internal Server Error".to_string()
        }
    );
    assert_eq!(keys(&listing), vec!["keep"]);
    assert_eq!(fetcher.calls().len(), 1);
}
