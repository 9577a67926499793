// SPDX-License-Identifier: GPL-3.0-only

//! Bounded cache of filtered photos
//!
//! Filtering a full-resolution shot is the slowest step of compositing,
//! and the selection screen re-renders the same photos with the same
//! filter on every visit. Keys are content-addressed (source path plus
//! filter id); eviction is least-recently-used, so flipping between two
//! filters never thrashes.

use crate::compositing::filters::FilterType;
use image::RgbImage;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use tracing::trace;

type CacheKey = (PathBuf, FilterType);

/// LRU cache of filter results. Hits return independent copies; mutating
/// a returned image never corrupts the cache.
pub struct FilterCache {
    entries: HashMap<CacheKey, RgbImage>,
    /// Recency order, least recent at the front
    order: VecDeque<CacheKey>,
    capacity: usize,
}

impl FilterCache {
    /// Cache holding at most `capacity` filtered images
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Copy of the cached result, bumping its recency
    pub fn get(&mut self, path: &PathBuf, filter: FilterType) -> Option<RgbImage> {
        let key = (path.clone(), filter);
        if let Some(image) = self.entries.get(&key) {
            let image = image.clone();
            self.touch(&key);
            trace!(path = %path.display(), filter = filter.id(), "Filter cache hit");
            Some(image)
        } else {
            None
        }
    }

    /// Store a result, evicting the least recently used entry at capacity
    pub fn insert(&mut self, path: PathBuf, filter: FilterType, image: RgbImage) {
        let key = (path, filter);

        if self.entries.contains_key(&key) {
            self.entries.insert(key.clone(), image);
            self.touch(&key);
            return;
        }

        while self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                trace!(path = %oldest.0.display(), filter = oldest.1.id(), "Evicting filter cache entry");
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, image);
    }

    /// Number of cached results
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything (session teardown)
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
            self.order.push_back(key.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn marked(mark: u8) -> RgbImage {
        RgbImage::from_pixel(2, 2, Rgb([mark, 0, 0]))
    }

    fn path(name: &str) -> PathBuf {
        PathBuf::from(format!("photos/{}.jpg", name))
    }

    #[test]
    fn test_miss_then_hit() {
        let mut cache = FilterCache::new(4);
        assert!(cache.get(&path("a"), FilterType::Sepia).is_none());

        cache.insert(path("a"), FilterType::Sepia, marked(1));
        let hit = cache.get(&path("a"), FilterType::Sepia).unwrap();
        assert_eq!(hit.get_pixel(0, 0)[0], 1);
    }

    #[test]
    fn test_key_includes_filter() {
        let mut cache = FilterCache::new(4);
        cache.insert(path("a"), FilterType::Sepia, marked(1));
        assert!(cache.get(&path("a"), FilterType::Warm).is_none());
    }

    #[test]
    fn test_hit_returns_independent_copy() {
        let mut cache = FilterCache::new(4);
        cache.insert(path("a"), FilterType::None, marked(5));

        let mut copy = cache.get(&path("a"), FilterType::None).unwrap();
        copy.put_pixel(0, 0, Rgb([99, 99, 99]));

        assert_eq!(
            cache.get(&path("a"), FilterType::None).unwrap().get_pixel(0, 0)[0],
            5
        );
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut cache = FilterCache::new(2);
        cache.insert(path("a"), FilterType::None, marked(1));
        cache.insert(path("b"), FilterType::None, marked(2));

        // Touch "a" so "b" is now least recent
        cache.get(&path("a"), FilterType::None);
        cache.insert(path("c"), FilterType::None, marked(3));

        assert!(cache.get(&path("a"), FilterType::None).is_some());
        assert!(cache.get(&path("b"), FilterType::None).is_none());
        assert!(cache.get(&path("c"), FilterType::None).is_some());
    }

    #[test]
    fn test_reinsert_updates_value() {
        let mut cache = FilterCache::new(2);
        cache.insert(path("a"), FilterType::None, marked(1));
        cache.insert(path("a"), FilterType::None, marked(9));
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get(&path("a"), FilterType::None).unwrap().get_pixel(0, 0)[0],
            9
        );
    }

    #[test]
    fn test_clear() {
        let mut cache = FilterCache::new(2);
        cache.insert(path("a"), FilterType::None, marked(1));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&path("a"), FilterType::None).is_none());
    }
}
