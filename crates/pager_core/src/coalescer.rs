use std::fmt;
use std::sync::Arc;

use pager_logging::{pager_debug, pager_trace, pager_warn};
use parking_lot::Mutex;

use crate::{
    AggregatedStatus, Category, RequestStatus, StatusFeed, StatusSubscription, TaskExecutor,
};

/// Replayable unit of work for one category.
///
/// It receives the attempt's [`Completion`] and must eventually settle it,
/// typically from an asynchronous context.
pub type Work = Arc<dyn Fn(Completion) + Send + Sync>;

#[derive(Default)]
struct Slot {
    status: RequestStatus,
    generation: u64,
    /// Kept while running or failed so a retry can replay it.
    work: Option<Work>,
}

struct Shared {
    slots: [Mutex<Slot>; Category::COUNT],
    feed: StatusFeed,
}

impl Shared {
    fn slot(&self, category: Category) -> &Mutex<Slot> {
        &self.slots[category.index()]
    }

    /// Moves `slot` to RUNNING for a fresh attempt. Caller holds the slot lock.
    fn begin_attempt(
        self: &Arc<Self>,
        category: Category,
        slot: &mut Slot,
        work: Work,
    ) -> Completion {
        slot.generation += 1;
        slot.status = RequestStatus::Running;
        slot.work = Some(work);
        let aggregated = self.feed.publish(category, RequestStatus::Running);
        pager_debug!(
            "request {} attempt {} running (aggregate {})",
            category,
            slot.generation,
            aggregated
        );
        Completion {
            shared: Arc::clone(self),
            category,
            generation: slot.generation,
        }
    }
}

/// Tracks boundary requests so that each category has at most one attempt in
/// flight, and replays failed categories on demand.
///
/// Every category has its own lock; work never runs while one is held, so a
/// work closure may settle its completion synchronously.
pub struct RequestCoalescer {
    shared: Arc<Shared>,
    executor: Arc<dyn TaskExecutor>,
}

impl RequestCoalescer {
    /// `executor` runs the replays issued by [`RequestCoalescer::retry_all_failed`].
    pub fn new(executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            shared: Arc::new(Shared {
                slots: std::array::from_fn(|_| Mutex::new(Slot::default())),
                feed: StatusFeed::new(),
            }),
            executor,
        }
    }

    /// Starts `work` for `category` unless an attempt is already running.
    ///
    /// Returns `false` without invoking `work` when the category is running;
    /// that is the expected collapse of a duplicate trigger, not a failure.
    /// Otherwise `work` is invoked on the calling thread with a fresh
    /// [`Completion`] and `true` is returned.
    pub fn run_if_not_running<F>(&self, category: Category, work: F) -> bool
    where
        F: Fn(Completion) + Send + Sync + 'static,
    {
        let work: Work = Arc::new(work);
        let completion = {
            let mut slot = self.shared.slot(category).lock();
            if slot.status.is_running() {
                pager_trace!(
                    "request {} already running (attempt {}), coalesced",
                    category,
                    slot.generation
                );
                return false;
            }
            self.shared
                .begin_attempt(category, &mut slot, Arc::clone(&work))
        };
        work(completion);
        true
    }

    /// Replays the stored work of every failed category through the executor.
    ///
    /// Categories that are idle, running or succeeded are left alone. Returns
    /// the number of categories restarted.
    pub fn retry_all_failed(&self) -> usize {
        let mut replays = Vec::new();
        for category in Category::ALL {
            let mut slot = self.shared.slot(category).lock();
            if !slot.status.is_failed() {
                continue;
            }
            let Some(work) = slot.work.clone() else {
                pager_warn!("request {} failed without retryable work", category);
                continue;
            };
            let completion = self
                .shared
                .begin_attempt(category, &mut slot, Arc::clone(&work));
            replays.push((work, completion));
        }

        let restarted = replays.len();
        if restarted > 0 {
            pager_debug!("retrying {} failed request(s)", restarted);
        }
        for (work, completion) in replays {
            self.executor.execute(Box::new(move || work(completion)));
        }
        restarted
    }

    pub fn status(&self, category: Category) -> RequestStatus {
        self.shared.slot(category).lock().status.clone()
    }

    pub fn aggregated_status(&self) -> AggregatedStatus {
        self.shared.feed.current()
    }

    /// Feed of aggregated statuses, starting with the current one.
    pub fn status_stream(&self) -> StatusSubscription {
        self.shared.feed.subscribe()
    }

    pub fn has_failures(&self) -> bool {
        Category::ALL
            .into_iter()
            .any(|category| self.shared.slot(category).lock().status.is_failed())
    }
}

impl fmt::Debug for RequestCoalescer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCoalescer")
            .field("statuses", &self.shared.feed.snapshot())
            .finish_non_exhaustive()
    }
}

/// Handle that settles exactly one attempt of one category.
///
/// Clones share the same attempt. Only the first settlement of a still
/// running attempt has an effect; anything later, or anything arriving after
/// a newer attempt started, is ignored.
#[derive(Clone)]
pub struct Completion {
    shared: Arc<Shared>,
    category: Category,
    generation: u64,
}

impl Completion {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Marks the attempt successful and drops its stored work.
    ///
    /// Returns `false` if the attempt was already settled or superseded.
    pub fn record_success(&self) -> bool {
        self.settle(RequestStatus::Success)
    }

    /// Marks the attempt failed, keeping its work for a later retry.
    ///
    /// Returns `false` if the attempt was already settled or superseded.
    pub fn record_failure(&self, message: impl Into<String>) -> bool {
        self.settle(RequestStatus::failed(message))
    }

    fn settle(&self, outcome: RequestStatus) -> bool {
        let mut slot = self.shared.slot(self.category).lock();
        if slot.generation != self.generation || !slot.status.is_running() {
            pager_warn!(
                "ignoring stale completion for request {} attempt {} (current attempt {}, {:?})",
                self.category,
                self.generation,
                slot.generation,
                slot.status
            );
            return false;
        }

        if outcome == RequestStatus::Success {
            slot.work = None;
        }
        slot.status = outcome.clone();
        let aggregated = self.shared.feed.publish(self.category, outcome);
        pager_debug!(
            "request {} attempt {} settled as {:?} (aggregate {})",
            self.category,
            self.generation,
            slot.status,
            aggregated
        );
        true
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("category", &self.category)
            .field("generation", &self.generation)
            .finish()
    }
}
