use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Whole-page TTL cache for rendered feed bodies, keyed by route.
///
/// Entries are dropped lazily on the first read past their deadline; a
/// freshly published post therefore stays invisible on the index until
/// the window lapses or `clear` is called.
pub struct PageCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
    body: String,
    stored_at: Instant,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let Ok(mut entries) = self.entries.lock() else {
            return None;
        };
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.body.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn store(&self, key: &str, body: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.to_string(),
                CacheEntry {
                    body,
                    stored_at: Instant::now(),
                },
            );
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn hit_within_ttl_miss_after() {
        let cache = PageCache::new(Duration::from_millis(40));
        cache.store("index:1", "first".into());
        assert_eq!(cache.get("index:1").as_deref(), Some("first"));

        sleep(Duration::from_millis(60));
        assert_eq!(cache.get("index:1"), None);
    }

    #[test]
    fn clear_drops_everything() {
        let cache = PageCache::new(Duration::from_secs(60));
        cache.store("index:1", "first".into());
        cache.store("index:2", "second".into());
        cache.clear();
        assert_eq!(cache.get("index:1"), None);
        assert_eq!(cache.get("index:2"), None);
    }

    #[test]
    fn store_overwrites_previous_body() {
        let cache = PageCache::new(Duration::from_secs(60));
        cache.store("index:1", "first".into());
        cache.store("index:1", "second".into());
        assert_eq!(cache.get("index:1").as_deref(), Some("second"));
    }
}
