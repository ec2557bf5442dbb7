//! # bitradix
//!
//! A memory-efficient radix (PATRICIA) trie indexing keys with bit
//! granularity.
//!
//! Keys are (byte buffer, bit count) pairs compared MSB-first, which makes
//! the tree an ordered index: big-endian encodings iterate in numeric or
//! lexicographic order, and a shorter prefix sorts before its extensions.
//! Besides exact match the tree answers longest-prefix match (the classic
//! route-table query), prefix-path enumeration, ordered neighbor lookups,
//! and prefix-scoped iteration. Front-ends are provided for IPv4 networks,
//! strings, `u64` keys and timestamps.
//!
//! Nodes live in chunked pool storage and link to each other through 32-bit
//! packed references instead of native pointers, roughly halving the
//! per-entry link overhead at multi-million-entry scale.
//!
//! ## Example
//!
//! ```rust
//! use bitradix::RadixTree;
//! use std::net::Ipv4Addr;
//!
//! let mut tree: RadixTree<&str> = RadixTree::new();
//! tree.ipv4_insert(Ipv4Addr::new(10, 0, 0, 0), 8, "10/8");
//! tree.ipv4_insert(Ipv4Addr::new(10, 4, 0, 0), 16, "10.4/16");
//!
//! // Longest-prefix match finds the most specific covering network.
//! let hit = tree.ipv4_lookup_longest(Ipv4Addr::new(10, 4, 7, 33), 32).unwrap();
//! assert_eq!(tree.value(hit), Some(&"10.4/16"));
//!
//! // Entries iterate in key order: a prefix sorts before its extensions.
//! let nets: Vec<_> = tree.iter().map(|n| tree.ipv4_network(n)).collect();
//! assert_eq!(nets, vec![
//!     (Ipv4Addr::new(10, 0, 0, 0), 8),
//!     (Ipv4Addr::new(10, 4, 0, 0), 16),
//! ]);
//! ```
//!
//! ## Concurrency
//!
//! The structure is single-threaded by design: no operation blocks, every
//! operation is bounded by the key bit count, and callers needing shared
//! access must serialize externally.

mod arena;
mod bits;
mod ipv4;
mod scan;
mod string;
mod time;
mod tree;
mod uint64;

pub use arena::NodeRef;
pub use scan::Iter;
pub use tree::RadixTree;

#[cfg(test)]
mod proptests;
