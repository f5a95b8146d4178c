//! Pager engine: feed fetching, local ordered store and boundary paging.
mod boundary;
mod engine;
mod fetch;
mod listing;
mod persist;
mod store;
mod types;

pub use boundary::BoundaryCallback;
pub use engine::{EngineHandle, TokioExecutor};
pub use fetch::{FeedFetcher, FetchSettings, ReqwestFetcher};
pub use listing::{FeedRepository, Listing, RefreshState};
pub use persist::{ensure_output_dir, load_snapshot, save_snapshot, AtomicFileWriter, PersistError};
pub use store::{FeedStore, MemoryFeedStore};
pub use types::{FailureKind, FeedItem, FeedPage, FetchError};
