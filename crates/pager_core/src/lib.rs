//! Pager core: request-coalescing retry tracker for boundary fetches.
mod category;
mod coalescer;
mod executor;
mod feed;
mod status;

pub use category::{Category, UnknownCategory};
pub use coalescer::{Completion, RequestCoalescer, Work};
pub use executor::{InlineExecutor, Task, TaskExecutor, ThreadExecutor};
pub use feed::{StatusFeed, StatusSubscription};
pub use status::{aggregate, AggregatedStatus, RequestStatus, StatusSnapshot};
