use std::collections::HashSet;

use parking_lot::Mutex;

use crate::FeedItem;

/// Ordered local cache of feed items.
///
/// Items are kept sorted by `index_in_response`. Inserting assigns indices so
/// that pages stay in server order; items whose key is already stored are
/// skipped.
pub trait FeedStore: Send + Sync {
    /// Adds `items` after the current last item. Returns how many were stored.
    fn append(&self, items: Vec<FeedItem>) -> usize;
    /// Adds `items` before the current first item. Returns how many were stored.
    fn prepend(&self, items: Vec<FeedItem>) -> usize;
    /// Drops everything and stores `items` from index 0.
    fn replace_all(&self, items: Vec<FeedItem>);
    fn items(&self) -> Vec<FeedItem>;
    fn first(&self) -> Option<FeedItem>;
    fn last(&self) -> Option<FeedItem>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct MemoryFeedStore {
    items: Mutex<Vec<FeedItem>>,
}

impl MemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with previously persisted items, keeping their indices.
    pub fn with_items(mut items: Vec<FeedItem>) -> Self {
        items.sort_by_key(|item| item.index_in_response);
        let mut seen = HashSet::new();
        items.retain(|item| seen.insert(item.key.clone()));
        Self {
            items: Mutex::new(items),
        }
    }
}

fn fresh_items(existing: &[FeedItem], items: Vec<FeedItem>) -> Vec<FeedItem> {
    let mut seen: HashSet<String> = existing.iter().map(|item| item.key.clone()).collect();
    items
        .into_iter()
        .filter(|item| seen.insert(item.key.clone()))
        .collect()
}

impl FeedStore for MemoryFeedStore {
    fn append(&self, items: Vec<FeedItem>) -> usize {
        let mut stored = self.items.lock();
        let fresh = fresh_items(&stored, items);
        let start = stored.last().map_or(0, |item| item.index_in_response + 1);
        let count = fresh.len();
        stored.extend(fresh.into_iter().zip(start..).map(|(mut item, index)| {
            item.index_in_response = index;
            item
        }));
        count
    }

    fn prepend(&self, items: Vec<FeedItem>) -> usize {
        let mut stored = self.items.lock();
        let mut fresh = fresh_items(&stored, items);
        let count = fresh.len() as i64;
        let start = stored.first().map_or(0, |item| item.index_in_response) - count;
        for (item, index) in fresh.iter_mut().zip(start..) {
            item.index_in_response = index;
        }
        stored.splice(0..0, fresh);
        count as usize
    }

    fn replace_all(&self, items: Vec<FeedItem>) {
        let fresh = fresh_items(&[], items);
        let mut stored = self.items.lock();
        *stored = fresh
            .into_iter()
            .zip(0..)
            .map(|(mut item, index)| {
                item.index_in_response = index;
                item
            })
            .collect();
    }

    fn items(&self) -> Vec<FeedItem> {
        self.items.lock().clone()
    }

    fn first(&self) -> Option<FeedItem> {
        self.items.lock().first().cloned()
    }

    fn last(&self) -> Option<FeedItem> {
        self.items.lock().last().cloned()
    }

    fn len(&self) -> usize {
        self.items.lock().len()
    }
}
