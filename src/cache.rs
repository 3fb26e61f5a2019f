//! Response cache for tool-free turns
//!
//! Memoizes purely conversational answers keyed by (user, normalized
//! question, page context). Turns that executed tools are never cached:
//! replaying a cached answer for a turn that performed a write would
//! silently skip the write on a repeat of the same question, so cache
//! writes are gated on `used_tools == false` at the call site.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A cached tool-free response
#[derive(Debug, Clone)]
pub struct CachedResponse {
    /// The response text
    pub response: String,
    /// Model that produced it
    pub model: String,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
}

struct CacheEntry {
    value: CachedResponse,
    stored_at: Instant,
}

/// TTL-bounded in-memory response cache
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    /// Creates a cache with the given entry time-to-live
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Looks up a cached response
    ///
    /// The question is normalized (trimmed, lowercased) before key
    /// construction so trivially-different phrasings of the same question
    /// about the same page still hit. Expired entries read as misses.
    pub fn get(&self, user_id: &str, question: &str, page_path: &str) -> Option<CachedResponse> {
        let key = cache_key(user_id, question, page_path);
        let mut entries = self.entries.lock().unwrap();

        match entries.get(&key) {
            Some(entry) if entry.stored_at.elapsed() <= self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Stores a tool-free response
    ///
    /// Entries are only ever created, never mutated; an existing entry for
    /// the same key is simply replaced by the newer identical answer.
    pub fn put(&self, user_id: &str, question: &str, page_path: &str, response: &str, model: &str) {
        let key = cache_key(user_id, question, page_path);
        let mut entries = self.entries.lock().unwrap();

        // Opportunistic cleanup to keep the map bounded
        if entries.len() > 4096 {
            let ttl = self.ttl;
            entries.retain(|_, entry| entry.stored_at.elapsed() <= ttl);
        }

        entries.insert(
            key,
            CacheEntry {
                value: CachedResponse {
                    response: response.to_string(),
                    model: model.to_string(),
                    created_at: Utc::now(),
                },
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of live entries (expired entries may still be counted)
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Returns true when the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

/// Builds the composite cache key digest
fn cache_key(user_id: &str, question: &str, page_path: &str) -> String {
    let normalized = question.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(b"|");
    hasher.update(normalized.as_bytes());
    hasher.update(b"|");
    hasher.update(page_path.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> ResponseCache {
        ResponseCache::new(Duration::from_secs(600))
    }

    #[test]
    fn test_miss_on_empty_cache() {
        let cache = cache();
        assert!(cache.get("u-1", "what is this?", "/").is_none());
    }

    #[test]
    fn test_put_then_get() {
        let cache = cache();
        cache.put("u-1", "What is the CRM about?", "/", "It's your CRM.", "gpt-4o-mini");

        let hit = cache.get("u-1", "What is the CRM about?", "/").unwrap();
        assert_eq!(hit.response, "It's your CRM.");
        assert_eq!(hit.model, "gpt-4o-mini");
    }

    #[test]
    fn test_question_normalization_hits() {
        let cache = cache();
        cache.put("u-1", "What is the CRM about?", "/", "It's your CRM.", "m");

        // Different case and surrounding whitespace, same key
        assert!(cache.get("u-1", "  WHAT IS THE CRM ABOUT?  ", "/").is_some());
    }

    #[test]
    fn test_keys_are_user_scoped() {
        let cache = cache();
        cache.put("u-1", "question", "/", "answer", "m");
        assert!(cache.get("u-2", "question", "/").is_none());
    }

    #[test]
    fn test_keys_are_page_scoped() {
        let cache = cache();
        cache.put("u-1", "what am I looking at?", "/pipeline", "The pipeline.", "m");
        assert!(cache.get("u-1", "what am I looking at?", "/contacts").is_none());
    }

    #[test]
    fn test_expired_entries_miss() {
        let cache = ResponseCache::new(Duration::from_millis(0));
        cache.put("u-1", "question", "/", "answer", "m");
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("u-1", "question", "/").is_none());
        // The expired entry is dropped on read
        assert!(cache.is_empty());
    }

    #[test]
    fn test_replacement_keeps_latest() {
        let cache = cache();
        cache.put("u-1", "question", "/", "first", "m");
        cache.put("u-1", "question", "/", "second", "m");
        assert_eq!(cache.get("u-1", "question", "/").unwrap().response, "second");
        assert_eq!(cache.len(), 1);
    }
}
