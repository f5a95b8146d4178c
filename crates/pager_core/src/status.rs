use std::fmt;

use crate::Category;

/// Outcome of one category's most recent attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestStatus {
    /// Never attempted.
    #[default]
    Idle,
    /// Attempt in flight.
    Running,
    /// Last attempt completed without error.
    Success,
    /// Last attempt completed with an error.
    Failed { message: String },
}

impl RequestStatus {
    pub fn failed(message: impl Into<String>) -> Self {
        RequestStatus::Failed {
            message: message.into(),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, RequestStatus::Running)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RequestStatus::Failed { .. })
    }

    // RUNNING > FAILED > SUCCESS > IDLE
    fn rank(&self) -> u8 {
        match self {
            RequestStatus::Idle => 0,
            RequestStatus::Success => 1,
            RequestStatus::Failed { .. } => 2,
            RequestStatus::Running => 3,
        }
    }
}

/// The single busy/error/idle signal derived from every category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AggregatedStatus {
    /// No category has been attempted.
    #[default]
    Idle,
    /// At least one category is running.
    Loading,
    /// Nothing running or failed, and at least one category succeeded.
    Loaded,
    /// Nothing running and at least one category failed.
    Error { message: String },
}

impl AggregatedStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, AggregatedStatus::Loading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            AggregatedStatus::Error { message } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for AggregatedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregatedStatus::Idle => write!(f, "idle"),
            AggregatedStatus::Loading => write!(f, "loading"),
            AggregatedStatus::Loaded => write!(f, "loaded"),
            AggregatedStatus::Error { message } => write!(f, "error: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct StatusEntry {
    status: RequestStatus,
    /// Transition order; larger means more recent.
    sequence: u64,
}

/// Per-category statuses together with the order in which they were set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    entries: [StatusEntry; Category::COUNT],
}

impl StatusSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: Category) -> &RequestStatus {
        &self.entries[category.index()].status
    }

    /// Records `status` for `category` as the most recent transition.
    pub fn set(&mut self, category: Category, status: RequestStatus) {
        let sequence = self.latest_sequence() + 1;
        self.entries[category.index()] = StatusEntry { status, sequence };
    }

    /// Builder form of [`StatusSnapshot::set`].
    pub fn with(mut self, category: Category, status: RequestStatus) -> Self {
        self.set(category, status);
        self
    }

    fn latest_sequence(&self) -> u64 {
        self.entries
            .iter()
            .map(|entry| entry.sequence)
            .max()
            .unwrap_or(0)
    }
}

/// Folds every category status into the externally visible signal.
///
/// RUNNING beats FAILED beats SUCCESS beats IDLE. When several categories
/// have failed, the message of the most recent failure is surfaced.
pub fn aggregate(snapshot: &StatusSnapshot) -> AggregatedStatus {
    let dominant = snapshot
        .entries
        .iter()
        .max_by(|a, b| {
            a.status
                .rank()
                .cmp(&b.status.rank())
                .then(a.sequence.cmp(&b.sequence))
        })
        .map(|entry| &entry.status);

    match dominant {
        Some(RequestStatus::Running) => AggregatedStatus::Loading,
        Some(RequestStatus::Failed { message }) => AggregatedStatus::Error {
            message: message.clone(),
        },
        Some(RequestStatus::Success) => AggregatedStatus::Loaded,
        Some(RequestStatus::Idle) | None => AggregatedStatus::Idle,
    }
}
