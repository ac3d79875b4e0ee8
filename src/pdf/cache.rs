//! LRU cache for extracted pages

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::types::PageText;

/// LRU cache of page text keyed by page number
pub struct PageCache {
    cache: LruCache<usize, Arc<PageText>>,
}

impl PageCache {
    /// Create a new cache with the given capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Get a cached page, promoting it in the LRU order
    #[must_use]
    pub fn get(&mut self, page: usize) -> Option<Arc<PageText>> {
        self.cache.get(&page).cloned()
    }

    #[must_use]
    pub fn contains(&self, page: usize) -> bool {
        self.cache.contains(&page)
    }

    /// Insert a page into the cache
    pub fn insert(&mut self, page: usize, data: Arc<PageText>) {
        self.cache.put(page, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: usize) -> Arc<PageText> {
        Arc::new(PageText::from_lines(n, &["text"]))
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = PageCache::new(2);
        cache.insert(1, page(1));
        cache.insert(2, page(2));
        let _ = cache.get(1);
        cache.insert(3, page(3));

        assert!(cache.contains(1));
        assert!(!cache.contains(2));
        assert!(cache.contains(3));
    }

    #[test]
    fn zero_capacity_still_holds_one_page() {
        let mut cache = PageCache::new(0);
        cache.insert(1, page(1));
        assert_eq!(cache.get(1).map(|p| p.page_num), Some(1));
        assert!(cache.contains(1));
    }
}
