//! Bounded response cache keyed by [`ResponseId`].
//!
//! Entries are evicted oldest-first once the capacity is reached. A capacity of
//! zero disables caching.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::RawResponse;

use super::envelope::ResponseId;

pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<ResponseId, Arc<RawResponse>>,
    order: VecDeque<ResponseId>,
}

#[derive(Debug)]
pub struct ResponseCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn insert(&self, id: ResponseId, response: Arc<RawResponse>) {
        if self.capacity == 0 {
            return;
        }

        let mut inner = self.lock();
        if inner.entries.insert(id, response).is_none() {
            inner.order.push_back(id);
        }
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
    }

    pub fn get(&self, id: ResponseId) -> Option<Arc<RawResponse>> {
        self.lock().entries.get(&id).cloned()
    }

    pub fn contains(&self, id: ResponseId) -> bool {
        self.lock().entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn response(status: u16) -> Arc<RawResponse> {
        Arc::new(RawResponse::new(status, Url::parse("https://example.com").unwrap()))
    }

    #[test]
    fn evicts_oldest_first() {
        let cache = ResponseCache::new(2);
        cache.insert(ResponseId(1), response(200));
        cache.insert(ResponseId(2), response(201));
        cache.insert(ResponseId(3), response(202));

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(ResponseId(1)));
        assert_eq!(cache.get(ResponseId(3)).unwrap().status, 202);
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let cache = ResponseCache::new(0);
        cache.insert(ResponseId(1), response(200));
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_empties_cache() {
        let cache = ResponseCache::default();
        cache.insert(ResponseId(1), response(200));
        cache.clear();
        assert!(cache.get(ResponseId(1)).is_none());
        assert_eq!(cache.capacity(), DEFAULT_CACHE_CAPACITY);
    }
}
