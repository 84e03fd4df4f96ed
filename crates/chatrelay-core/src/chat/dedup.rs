//! Request deduplication.
//!
//! Identical requests (same session label, same trimmed input) that arrive
//! within the same aligned time bucket share one fingerprint. The first one
//! generates; every other one is served the stored reply verbatim.
//!
//! The cache is a strict FIFO: once it holds more than `capacity` entries the
//! oldest-inserted one is evicted, regardless of how recently it was read.
//! There is no age-based expiry. A fingerprint from a past bucket can never
//! match again, but it keeps its slot until FIFO pushes it out.
//!
//! Each entry is a slot (`Arc<OnceCell<ChatReply>>`). `claim` creates the slot
//! under the lock, so two concurrent arrivals for one fingerprint always get
//! the same slot and only one of them runs the generation.
//!
//! Eviction skips slots a caller is still filling, so the cache may run over
//! capacity while generations are in flight. A pending slot nobody holds any
//! more (its generation was cancelled or panicked) is evictable again.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

use chatrelay_types::chat::ChatReply;

/// Default number of fingerprints kept before FIFO eviction.
pub const DEFAULT_CAPACITY: usize = 100;

/// Default bucket width in seconds.
pub const DEFAULT_BUCKET_SECS: u64 = 10;

/// Key identifying a request for deduplication.
///
/// Rendered as `"{session_id}:{user_input}:{bucket}"` with an empty session
/// segment when no session label was sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared slot for one fingerprint. Filled exactly once.
pub type ReplySlot = Arc<OnceCell<ChatReply>>;

#[derive(Default)]
struct Entries {
    slots: HashMap<Fingerprint, ReplySlot>,
    /// Insertion order; holds each key at most once.
    order: VecDeque<Fingerprint>,
}

impl Entries {
    fn insert_new(&mut self, key: Fingerprint, slot: ReplySlot, capacity: usize) {
        self.order.push_back(key.clone());
        self.slots.insert(key, slot);

        while self.slots.len() > capacity {
            // The entry just inserted is never the victim.
            let candidates = self.order.len().saturating_sub(1);
            let Some(index) = self
                .order
                .iter()
                .take(candidates)
                .position(|key| self.slots.get(key).is_none_or(is_settled))
            else {
                break;
            };
            if let Some(oldest) = self.order.remove(index) {
                self.slots.remove(&oldest);
                tracing::debug!(fingerprint = %oldest, "Evicted oldest dedup entry");
            }
        }
    }
}

/// Filled, or abandoned by the caller that claimed it.
fn is_settled(slot: &ReplySlot) -> bool {
    slot.initialized() || Arc::strong_count(slot) == 1
}

/// Bounded FIFO cache of replies keyed by request fingerprint.
pub struct RequestDeduplicator {
    entries: Mutex<Entries>,
    capacity: usize,
    bucket_secs: i64,
}

impl RequestDeduplicator {
    /// Create a deduplicator holding at most `capacity` fingerprints, with
    /// time buckets `bucket_secs` wide.
    pub fn new(capacity: usize, bucket_secs: u64) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            capacity: capacity.max(1),
            bucket_secs: i64::try_from(bucket_secs.max(1)).unwrap_or(i64::MAX),
        }
    }

    /// Compute the fingerprint for a request arriving at `now`.
    ///
    /// The bucket is `floor(unix_seconds / bucket_secs)`, so requests in the
    /// same aligned window collide on purpose.
    pub fn fingerprint(
        &self,
        session_id: Option<&str>,
        user_input: &str,
        now: DateTime<Utc>,
    ) -> Fingerprint {
        let bucket = now.timestamp().div_euclid(self.bucket_secs);
        Fingerprint(format!(
            "{}:{}:{}",
            session_id.unwrap_or_default(),
            user_input,
            bucket
        ))
    }

    /// Return the stored reply for `key`, if one has been produced.
    ///
    /// A slot that is still being generated reads as a miss here; use
    /// [`claim`](Self::claim) to wait on it.
    pub fn lookup(&self, key: &Fingerprint) -> Option<ChatReply> {
        self.lock().slots.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Store `reply` under `key`.
    ///
    /// A new key is appended at the back of the FIFO and may evict the oldest
    /// entry. An existing key has its value replaced but keeps its position.
    pub fn store(&self, key: &Fingerprint, reply: ChatReply) {
        let slot = Arc::new(OnceCell::new_with(Some(reply)));
        let mut entries = self.lock();
        if let Some(existing) = entries.slots.get_mut(key) {
            *existing = slot;
            return;
        }
        entries.insert_new(key.clone(), slot, self.capacity);
    }

    /// Get the slot for `key`, creating an empty one if absent.
    ///
    /// A created slot counts against capacity immediately. Callers fill it
    /// with `OnceCell::get_or_init`; concurrent callers on the same slot wait
    /// for that single initialization.
    pub fn claim(&self, key: &Fingerprint) -> ReplySlot {
        let mut entries = self.lock();
        if let Some(slot) = entries.slots.get(key) {
            return Arc::clone(slot);
        }
        let slot: ReplySlot = Arc::new(OnceCell::new());
        entries.insert_new(key.clone(), Arc::clone(&slot), self.capacity);
        slot
    }

    /// Number of fingerprints currently held.
    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RequestDeduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_BUCKET_SECS)
    }
}
