use parking_lot::Mutex;
use tokio::sync::watch;

use crate::{aggregate, AggregatedStatus, Category, RequestStatus, StatusSnapshot};

/// Latest-value broadcast of the aggregated status.
///
/// Producers may call [`StatusFeed::publish`] from any thread; each call
/// recomputes the aggregate under a short lock so consumers observe
/// transitions in the order they were published.
pub struct StatusFeed {
    snapshot: Mutex<StatusSnapshot>,
    tx: watch::Sender<AggregatedStatus>,
}

impl StatusFeed {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AggregatedStatus::Idle);
        Self {
            snapshot: Mutex::new(StatusSnapshot::new()),
            tx,
        }
    }

    /// Records a category transition and republishes the aggregate.
    pub fn publish(&self, category: Category, status: RequestStatus) -> AggregatedStatus {
        let mut snapshot = self.snapshot.lock();
        snapshot.set(category, status);
        let aggregated = aggregate(&snapshot);
        // Sent while still holding the snapshot lock to keep publication order.
        self.tx.send_replace(aggregated.clone());
        aggregated
    }

    pub fn current(&self) -> AggregatedStatus {
        self.tx.borrow().clone()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.snapshot.lock().clone()
    }

    /// Attaches a subscriber whose first observation is the current value.
    pub fn subscribe(&self) -> StatusSubscription {
        let mut rx = self.tx.subscribe();
        rx.mark_changed();
        StatusSubscription { rx }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for StatusFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// One independent consumer of a [`StatusFeed`].
///
/// Only the latest value is retained; a consumer that falls behind sees the
/// newest aggregate, never a backlog.
#[derive(Debug, Clone)]
pub struct StatusSubscription {
    rx: watch::Receiver<AggregatedStatus>,
}

impl StatusSubscription {
    /// Latest published value, marking it as seen.
    pub fn current(&mut self) -> AggregatedStatus {
        self.rx.borrow_and_update().clone()
    }

    /// Returns the latest value if it was published since the last observation.
    pub fn try_next(&mut self) -> Option<AggregatedStatus> {
        match self.rx.has_changed() {
            Ok(true) => Some(self.current()),
            Ok(false) | Err(_) => None,
        }
    }

    /// Waits for the next unseen value. Yields `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<AggregatedStatus> {
        self.rx.changed().await.ok()?;
        Some(self.current())
    }
}
