//! Expiring key dictionary

use super::clock::{Clock, SystemClock};
use super::object::Object;
use crate::config::{DictConfig, DEFAULT_DICT_CAPACITY};
use bytes::Bytes;
use serde::Serialize;
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use tracing::{debug, trace};

type Hasher = BuildHasherDefault<SipHasher13>;

/// Key -> stored object
type ObjectMap<V> = HashMap<Bytes, Object<V>, Hasher>;

/// Key -> absolute expiry in milliseconds since the UNIX epoch
///
/// A key present here is TTL-bearing; an absent key never expires.
pub type ExpireMap = HashMap<Bytes, u64, Hasher>;

/// Key/value dictionary with optional absolute expiry per key
///
/// Expiration is lazy: an expired key stays resident until the next `get`
/// on it or an explicit `purge_expired` call. Every key in the expiry map is
/// also in the value map.
///
/// Single-writer: callers serialize access themselves.
#[derive(Debug)]
pub struct Dictionary<V, C = SystemClock> {
    objects: ObjectMap<V>,
    expires: ExpireMap,
    clock: C,
}

impl<V> Dictionary<V, SystemClock> {
    /// Create an empty dictionary on the system clock
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_DICT_CAPACITY)
    }

    /// Create an empty dictionary with the given initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_clock(capacity, SystemClock)
    }

    /// Create an empty dictionary from its configuration
    pub fn from_config(config: &DictConfig) -> Self {
        Self::with_capacity(config.initial_capacity)
    }
}

impl<V, C: Clock> Dictionary<V, C> {
    /// Create an empty dictionary reading time from `clock`
    pub fn with_clock(clock: C) -> Self {
        Self::with_capacity_and_clock(DEFAULT_DICT_CAPACITY, clock)
    }

    pub fn with_capacity_and_clock(capacity: usize, clock: C) -> Self {
        Dictionary {
            objects: HashMap::with_capacity_and_hasher(capacity, Hasher::default()),
            expires: ExpireMap::default(),
            clock,
        }
    }

    /// Store `value` under `key`, replacing any previous value
    ///
    /// `expire_at > 0` records an absolute expiry in milliseconds since the
    /// epoch; `expire_at == 0` clears any previous expiry.
    pub fn set(&mut self, key: impl Into<Bytes>, value: V, expire_at: u64) {
        let key = key.into();

        if expire_at > 0 {
            self.expires.insert(key.clone(), expire_at);
        } else {
            self.expires.remove(&key);
        }
        self.objects.insert(key, Object::new(value));
    }

    /// Get the value for `key`, evicting it first if it has expired
    pub fn get(&mut self, key: &[u8]) -> Option<&V> {
        if self.evict_if_expired(key) {
            return None;
        }
        self.objects.get(key).map(|object| &object.value)
    }

    /// Get a mutable reference to the value for `key`, evicting it first if it has expired
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        if self.evict_if_expired(key) {
            return None;
        }
        self.objects.get_mut(key).map(|object| &mut object.value)
    }

    /// Remove `key` and its expiry, returns true if a value was removed
    pub fn delete(&mut self, key: &[u8]) -> bool {
        self.expires.remove(key);
        self.objects.remove(key).is_some()
    }

    /// Whether `key` carries an expiry at or before the current time
    pub fn has_expired(&self, key: &[u8]) -> bool {
        match self.expires.get(key) {
            Some(&expire_at) => expire_at <= self.clock.now_millis(),
            None => false,
        }
    }

    /// Absolute expiry of `key`, if it has one
    pub fn expire_at(&self, key: &[u8]) -> Option<u64> {
        self.expires.get(key).copied()
    }

    /// Milliseconds left before `key` expires (0 once past due)
    ///
    /// None if the key has no expiry. Does not evict.
    pub fn ttl_millis(&self, key: &[u8]) -> Option<u64> {
        self.expire_at(key)
            .map(|expire_at| expire_at.saturating_sub(self.clock.now_millis()))
    }

    /// Drop the expiry of `key`, returns true if it had one
    pub fn persist(&mut self, key: &[u8]) -> bool {
        self.expires.remove(key).is_some()
    }

    /// Read-only view of the expiry map
    pub fn expires(&self) -> &ExpireMap {
        &self.expires
    }

    /// Whether `key` is resident in the value map, expired or not
    pub fn contains_raw(&self, key: &[u8]) -> bool {
        self.objects.contains_key(key)
    }

    /// Remove every expired key, returns the number removed
    ///
    /// Never called internally; a store-wide sweeper may call it.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_millis();
        let expired: Vec<Bytes> = self
            .expires
            .iter()
            .filter(|(_, expire_at)| **expire_at <= now)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.delete(key);
        }

        if !expired.is_empty() {
            debug!("Purged {} expired keys", expired.len());
        }
        expired.len()
    }

    /// Number of resident keys, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Remove all keys
    pub fn clear(&mut self) {
        self.objects.clear();
        self.expires.clear();
    }

    /// Key counts
    pub fn stats(&self) -> DictStats {
        let now = self.clock.now_millis();

        DictStats {
            total_keys: self.objects.len(),
            volatile_keys: self.expires.len(),
            expired_keys: self
                .expires
                .values()
                .filter(|&&expire_at| expire_at <= now)
                .count(),
        }
    }

    /// Evict `key` if it has expired, returns true if it was evicted
    fn evict_if_expired(&mut self, key: &[u8]) -> bool {
        if !self.has_expired(key) {
            return false;
        }

        trace!("Evicting expired key {}", String::from_utf8_lossy(key));
        self.delete(key);
        true
    }
}

impl<V> Default for Dictionary<V, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about a dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DictStats {
    /// Resident keys, including expired ones not yet evicted
    pub total_keys: usize,

    /// Keys carrying an expiry
    pub volatile_keys: usize,

    /// Keys past their expiry but still resident
    pub expired_keys: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::ManualClock;
    use crate::init_test_tracing;

    const NOW: u64 = 1_700_000_000_000;

    fn manual_dict() -> (Dictionary<&'static str, ManualClock>, ManualClock) {
        let clock = ManualClock::new(NOW);
        (Dictionary::with_clock(clock.clone()), clock)
    }

    #[test]
    fn test_basic_set_get() {
        let mut dict = Dictionary::new();
        dict.set("key1", "value1", 0);

        assert_eq!(dict.get(b"key1"), Some(&"value1"));
        assert_eq!(dict.get(b"key2"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let mut dict = Dictionary::new();
        dict.set("key1", 1, 0);
        dict.set("key1", 2, 0);

        assert_eq!(dict.get(b"key1"), Some(&2));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_ttl_expiration() {
        init_test_tracing();
        let (mut dict, clock) = manual_dict();
        dict.set("k", "v", NOW + 1000);

        assert_eq!(dict.get(b"k"), Some(&"v"));
        assert!(!dict.has_expired(b"k"));

        clock.advance(1001);

        // Lazy: still resident until read
        assert!(dict.has_expired(b"k"));
        assert!(dict.contains_raw(b"k"));

        assert_eq!(dict.get(b"k"), None);
        assert!(!dict.contains_raw(b"k"));
        assert!(!dict.expires().contains_key(&b"k"[..]));
    }

    #[test]
    fn test_expiry_at_current_time_is_expired() {
        let (mut dict, clock) = manual_dict();
        dict.set("k", "v", NOW + 10);

        clock.set(NOW + 9);
        assert!(!dict.has_expired(b"k"));

        clock.set(NOW + 10);
        assert!(dict.has_expired(b"k"));
        assert_eq!(dict.get(b"k"), None);
    }

    #[test]
    fn test_persistent_key_never_expires() {
        let (mut dict, clock) = manual_dict();
        dict.set("k", "v", 0);

        clock.advance(u64::MAX / 2);

        assert!(!dict.has_expired(b"k"));
        assert_eq!(dict.get(b"k"), Some(&"v"));
        assert_eq!(dict.expire_at(b"k"), None);
    }

    #[test]
    fn test_set_without_expiry_clears_previous() {
        let (mut dict, clock) = manual_dict();
        dict.set("k", "v1", NOW + 100);
        dict.set("k", "v2", 0);

        clock.advance(1_000);

        assert_eq!(dict.get(b"k"), Some(&"v2"));
        assert!(dict.expires().is_empty());
    }

    #[test]
    fn test_set_replaces_expiry() {
        let (mut dict, clock) = manual_dict();
        dict.set("k", "v1", NOW + 100);
        dict.set("k", "v2", NOW + 5_000);

        clock.advance(1_000);

        assert_eq!(dict.get(b"k"), Some(&"v2"));
        assert_eq!(dict.expire_at(b"k"), Some(NOW + 5_000));
    }

    #[test]
    fn test_delete() {
        let (mut dict, _clock) = manual_dict();
        dict.set("k", "v", NOW + 100);

        assert!(dict.delete(b"k"));
        assert_eq!(dict.get(b"k"), None);
        assert!(dict.expires().is_empty());

        // Absent key is a no-op
        assert!(!dict.delete(b"k"));
        assert!(!dict.delete(b"never"));
    }

    #[test]
    fn test_has_expired_without_record() {
        let (dict, _clock) = manual_dict();
        assert!(!dict.has_expired(b"missing"));
    }

    #[test]
    fn test_get_mut() {
        let mut dict: Dictionary<Vec<u8>, ManualClock> =
            Dictionary::with_clock(ManualClock::new(NOW));
        dict.set("list", vec![1], NOW + 10);

        dict.get_mut(b"list").unwrap().push(2);
        assert_eq!(dict.get(b"list"), Some(&vec![1, 2]));
    }

    #[test]
    fn test_ttl_and_persist() {
        let (mut dict, clock) = manual_dict();
        dict.set("k", "v", NOW + 1_000);

        assert_eq!(dict.ttl_millis(b"k"), Some(1_000));
        clock.advance(400);
        assert_eq!(dict.ttl_millis(b"k"), Some(600));

        assert!(dict.persist(b"k"));
        assert!(!dict.persist(b"k"));
        assert_eq!(dict.ttl_millis(b"k"), None);

        clock.advance(10_000);
        assert_eq!(dict.get(b"k"), Some(&"v"));
    }

    #[test]
    fn test_ttl_past_due_is_zero() {
        let (mut dict, clock) = manual_dict();
        dict.set("k", "v", NOW + 5);
        clock.advance(50);

        assert_eq!(dict.ttl_millis(b"k"), Some(0));
        // Reading the ttl does not evict
        assert!(dict.contains_raw(b"k"));
    }

    #[test]
    fn test_purge_expired() {
        let (mut dict, clock) = manual_dict();
        dict.set("a", "1", NOW + 10);
        dict.set("b", "2", NOW + 20);
        dict.set("c", "3", NOW + 1_000);
        dict.set("d", "4", 0);

        clock.advance(20);

        let stats = dict.stats();
        assert_eq!(stats.total_keys, 4);
        assert_eq!(stats.volatile_keys, 3);
        assert_eq!(stats.expired_keys, 2);

        assert_eq!(dict.purge_expired(), 2);
        assert_eq!(dict.len(), 2);
        assert!(!dict.contains_raw(b"a"));
        assert!(!dict.contains_raw(b"b"));
        assert_eq!(dict.expires().len(), 1);

        assert_eq!(dict.purge_expired(), 0);
    }

    #[test]
    fn test_clear() {
        let (mut dict, _clock) = manual_dict();
        dict.set("a", "1", NOW + 10);
        dict.set("b", "2", 0);

        dict.clear();
        assert!(dict.is_empty());
        assert!(dict.expires().is_empty());
    }

    #[test]
    fn test_from_config() {
        let mut dict = Dictionary::from_config(&DictConfig { initial_capacity: 4 });
        dict.set(Bytes::from_static(b"key"), 7u32, 0);
        assert_eq!(dict.get(b"key"), Some(&7));
    }

    #[test]
    fn test_system_clock_expiration() {
        let mut dict = Dictionary::new();
        let expire_at = SystemClock.now_millis() + 50;
        dict.set("key2", "value2", expire_at);

        assert_eq!(dict.get(b"key2"), Some(&"value2"));

        // Wait for expiration
        std::thread::sleep(std::time::Duration::from_millis(120));

        assert!(dict.has_expired(b"key2"));
        assert_eq!(dict.get(b"key2"), None);
    }
}
