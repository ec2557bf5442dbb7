//! Timestamp keys with microsecond precision.
//!
//! A point in time maps to its microseconds since the Unix epoch, stored as
//! a big-endian `u64` key, so tree order is chronological. Pre-epoch times
//! have no unsigned encoding and are rejected like zero-bit keys.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::arena::NodeRef;
use crate::tree::RadixTree;

const TIME_BITS: u16 = 64;

/// Key bytes for a timestamp; `None` before the epoch or past the `u64`
/// microsecond range.
fn time_key(t: SystemTime) -> Option<[u8; 8]> {
    let micros = t.duration_since(UNIX_EPOCH).ok()?.as_micros();
    u64::try_from(micros).ok().map(u64::to_be_bytes)
}

impl<V> RadixTree<V> {
    /// Insert under a timestamp, truncated to microsecond precision.
    pub fn time_insert(&mut self, t: SystemTime, value: V) -> (Option<NodeRef>, bool) {
        match time_key(t) {
            Some(key) => self.insert(&key, TIME_BITS, value),
            None => (None, false),
        }
    }

    /// Exact-match lookup of a timestamp, at microsecond precision.
    pub fn time_get(&self, t: SystemTime) -> Option<NodeRef> {
        self.get(&time_key(t)?, TIME_BITS)
    }

    /// Remove a timestamp entry, returning its value.
    pub fn time_remove(&mut self, t: SystemTime) -> Option<V> {
        let node = self.time_get(t)?;
        self.remove(node)
    }

    /// First entry at or after `t`. A pre-epoch `t` precedes every entry.
    pub fn time_lookup_ge(&self, t: SystemTime) -> Option<NodeRef> {
        match time_key(t) {
            Some(key) => self.lookup_ge(&key, TIME_BITS),
            None => self.first(),
        }
    }

    /// The timestamp stored at `node`.
    pub fn time_value(&self, node: NodeRef) -> SystemTime {
        UNIX_EPOCH + Duration::from_micros(self.u64_key(node))
    }
}
