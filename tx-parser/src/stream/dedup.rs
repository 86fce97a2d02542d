//! FIFO-bounded signature deduplication.
//!
//! Ledger log streams can replay a signature at commitment boundaries. The
//! deduplicator remembers the most recent `capacity` signatures and evicts the
//! oldest one once the bound is exceeded, so an evicted signature is treated as
//! new if it ever shows up again.

use std::collections::{HashSet, VecDeque};

use parking_lot::Mutex;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeduplicationStats {
    pub total_checked: u64,
    pub duplicates_dropped: u64,
    pub unique_signatures: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct SeenSignatures {
    set: HashSet<String>,
    order: VecDeque<String>,
}

pub struct SignatureDeduplicator {
    seen: Mutex<SeenSignatures>,
    capacity: usize,
    stats: Mutex<DeduplicationStats>,
}

impl SignatureDeduplicator {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: Mutex::new(SeenSignatures::default()),
            capacity: capacity.max(1),
            stats: Mutex::new(DeduplicationStats::default()),
        }
    }

    /// Returns true if the signature is new (and records it), false for a duplicate.
    pub fn remember(&self, signature: &str) -> bool {
        let mut seen = self.seen.lock();
        let mut stats = self.stats.lock();
        stats.total_checked += 1;

        if seen.set.contains(signature) {
            stats.duplicates_dropped += 1;
            return false;
        }

        seen.set.insert(signature.to_string());
        seen.order.push_back(signature.to_string());
        stats.unique_signatures += 1;

        while seen.order.len() > self.capacity {
            if let Some(oldest) = seen.order.pop_front() {
                seen.set.remove(&oldest);
                stats.evictions += 1;
            }
        }

        true
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.seen.lock().set.contains(signature)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        let mut seen = self.seen.lock();
        seen.set.clear();
        seen.order.clear();
    }

    pub fn stats(&self) -> DeduplicationStats {
        self.stats.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_detection() {
        let dedup = SignatureDeduplicator::new(10);

        assert!(dedup.remember("sig-a"));
        assert!(!dedup.remember("sig-a"));
        assert!(dedup.remember("sig-b"));

        let stats = dedup.stats();
        assert_eq!(stats.total_checked, 3);
        assert_eq!(stats.duplicates_dropped, 1);
        assert_eq!(stats.unique_signatures, 2);
    }

    #[test]
    fn test_fifo_eviction_respects_capacity() {
        let dedup = SignatureDeduplicator::new(3);

        for i in 0..5 {
            assert!(dedup.remember(&format!("sig-{}", i)));
            assert!(dedup.len() <= 3);
        }

        // sig-0 and sig-1 were evicted, in that order
        assert!(!dedup.contains("sig-0"));
        assert!(!dedup.contains("sig-1"));
        assert!(dedup.contains("sig-2"));
        assert!(dedup.contains("sig-4"));
        assert_eq!(dedup.stats().evictions, 2);

        // Evicted signatures are new again
        assert!(dedup.remember("sig-0"));
        assert!(!dedup.contains("sig-2"));
        assert!(!dedup.remember("sig-4"));
    }

    #[test]
    fn test_clear() {
        let dedup = SignatureDeduplicator::new(3);
        dedup.remember("sig-a");
        dedup.clear();

        assert!(dedup.is_empty());
        assert!(dedup.remember("sig-a"));
    }
}
