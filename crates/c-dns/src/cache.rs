use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use c_dns_lib::{QueryType, ResourceRecord};
use tokio::time::Instant;

/// Names are compared case-insensitively and without the root label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    qname: String,
    query_type: QueryType,
}

impl CacheKey {
    fn new(qname: &str, query_type: QueryType) -> Self {
        CacheKey {
            qname: qname.trim_end_matches('.').to_ascii_lowercase(),
            query_type: query_type.normalize(),
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    record: ResourceRecord<'static>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Entries held before pruning
    pub total: usize,
    /// Entries that haven't expired
    pub active: usize,
}

/// TTL-bounded answer cache keyed by (name, type).
///
/// Every entry holds one record, so a later record for the same key replaces the earlier one.
/// Expired entries are never returned. They're dropped lazily on lookup or in bulk by
/// [`AnswerCache::sweep`] and [`AnswerCache::stats`].
#[derive(Debug, Default)]
pub struct AnswerCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl AnswerCache {
    pub fn new() -> Self {
        AnswerCache::default()
    }

    pub fn get(&self, qname: &str, query_type: QueryType) -> Option<ResourceRecord<'static>> {
        let key = CacheKey::new(qname, query_type);
        let now = Instant::now();

        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(&key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.record.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Another writer may have refreshed the entry between the two locks
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.get(&key).is_some_and(|entry| entry.is_expired(now)) {
            tracing::trace!(qname, ?query_type, "Evicting an expired cache entry");
            entries.remove(&key);
        }

        None
    }

    pub fn put(&self, record: ResourceRecord<'static>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Self::insert(&mut entries, record, Instant::now());
    }

    /// Stores a batch of records under a single write lock
    pub fn put_all(&self, records: impl IntoIterator<Item = ResourceRecord<'static>>) {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for record in records {
            Self::insert(&mut entries, record, now);
        }
    }

    fn insert(entries: &mut HashMap<CacheKey, CacheEntry>, record: ResourceRecord<'static>, now: Instant) {
        let key = CacheKey::new(&record.name, record.query_type());
        let expires_at = now + Duration::from_secs(record.ttl as u64);
        entries.insert(key, CacheEntry { record, expires_at });
    }

    /// Prunes expired entries, reporting the counts before and after
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let total = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        CacheStats {
            total,
            active: entries.len(),
        }
    }

    /// Removes every expired entry, returning how many were dropped
    pub fn sweep(&self) -> usize {
        let stats = self.stats();
        stats.total - stats.active
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
